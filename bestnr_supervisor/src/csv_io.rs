//! Delimited-text trigger source and result sink.
//!
//! Input columns (case-insensitive), for each IFO in the layout:
//! `end_time, coherent_snr, <IFO>_snr, <IFO>_chisq, <IFO>_bank_chisq, <IFO>_cont_chisq`
//! plus `chisq_dof, bank_chisq_dof, cont_chisq_dof`. The dof columns may be
//! blank (or absent) after the first row; the last seen value is reused.

use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::Path;

use csv::StringRecord;
use tracing::debug;

use crate::adapter::{DetectorLayout, RecordSink, ScoredTrigger, TriggerRecord, TriggerSource};
use crate::error::{SupervisorError, SupervisorResult};

const END_TIME: &str = "end_time";
const COHERENT_SNR: &str = "coherent_snr";
const POWER_DOF: &str = "chisq_dof";
const BANK_DOF: &str = "bank_chisq_dof";
const AUTO_DOF: &str = "cont_chisq_dof";

/// Column positions resolved once from the header row.
#[derive(Debug)]
struct Columns {
    end_time: usize,
    coherent_snr: usize,
    // one entry per IFO, in layout order
    snr: Vec<(String, usize)>,
    power: Vec<(String, usize)>,
    bank: Vec<(String, usize)>,
    auto: Vec<(String, usize)>,
    power_dof: Option<usize>,
    bank_dof: Option<usize>,
    auto_dof: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord, layout: &DetectorLayout) -> SupervisorResult<Self> {
        let index: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_ascii_lowercase(), i))
            .collect();

        let required = |name: String| -> SupervisorResult<(String, usize)> {
            match index.get(&name.to_ascii_lowercase()) {
                Some(&i) => Ok((name, i)),
                None => Err(SupervisorError::MissingColumn(name)),
            }
        };
        let per_ifo = |suffix: &str| -> SupervisorResult<Vec<(String, usize)>> {
            layout
                .ifos()
                .iter()
                .map(|ifo| required(format!("{ifo}_{suffix}")))
                .collect()
        };

        Ok(Columns {
            end_time: required(END_TIME.to_string())?.1,
            coherent_snr: required(COHERENT_SNR.to_string())?.1,
            snr: per_ifo("snr")?,
            power: per_ifo("chisq")?,
            bank: per_ifo("bank_chisq")?,
            auto: per_ifo("cont_chisq")?,
            power_dof: index.get(POWER_DOF).copied(),
            bank_dof: index.get(BANK_DOF).copied(),
            auto_dof: index.get(AUTO_DOF).copied(),
        })
    }
}

fn parse_field(record: &StringRecord, row: usize, column: &str, idx: usize) -> SupervisorResult<f64> {
    let raw = record.get(idx).unwrap_or("").trim();
    raw.parse::<f64>().map_err(|_| SupervisorError::BadValue {
        row,
        column: column.to_string(),
        value: raw.to_string(),
    })
}

/// Reads `TriggerRecord`s from delimited text.
pub struct CsvTriggerSource<R: io::Read> {
    reader: csv::Reader<R>,
    columns: Columns,
    record: StringRecord,
    row: usize,
    // last seen (power, bank, auto) dof
    dof: [Option<f64>; 3],
}

impl CsvTriggerSource<File> {
    pub fn from_path(path: impl AsRef<Path>, layout: &DetectorLayout) -> SupervisorResult<Self> {
        let file = File::open(path)?;
        Self::from_reader(file, layout)
    }
}

impl<R: io::Read> CsvTriggerSource<R> {
    pub fn from_reader(rdr: R, layout: &DetectorLayout) -> SupervisorResult<Self> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
        let columns = Columns::resolve(reader.headers()?, layout)?;
        debug!(?columns, "resolved trigger columns");

        Ok(Self {
            reader,
            columns,
            record: StringRecord::new(),
            row: 0,
            dof: [None; 3],
        })
    }

    fn dof(&mut self, slot: usize, idx: Option<usize>, column: &'static str) -> SupervisorResult<f64> {
        if let Some(i) = idx {
            if !self.record.get(i).unwrap_or("").trim().is_empty() {
                self.dof[slot] = Some(parse_field(&self.record, self.row, column, i)?);
            }
        }
        self.dof[slot].ok_or(SupervisorError::MissingDof { row: self.row, column })
    }

    fn parse_current(&mut self) -> SupervisorResult<TriggerRecord> {
        let row = self.row;
        let rec = &self.record;
        let cols = &self.columns;
        let vector = |cols: &[(String, usize)]| -> SupervisorResult<Vec<f64>> {
            cols.iter().map(|(name, i)| parse_field(rec, row, name, *i)).collect()
        };

        let mut out = TriggerRecord {
            end_time: parse_field(rec, row, END_TIME, cols.end_time)?,
            coherent_snr: parse_field(rec, row, COHERENT_SNR, cols.coherent_snr)?,
            snr: vector(&cols.snr)?,
            power_chisq: vector(&cols.power)?,
            bank_chisq: vector(&cols.bank)?,
            auto_chisq: vector(&cols.auto)?,
            ..Default::default()
        };

        let (p, b, a) = (cols.power_dof, cols.bank_dof, cols.auto_dof);
        out.power_dof = self.dof(0, p, POWER_DOF)?;
        out.bank_dof = self.dof(1, b, BANK_DOF)?;
        out.auto_dof = self.dof(2, a, AUTO_DOF)?;
        Ok(out)
    }
}

impl<R: io::Read> TriggerSource for CsvTriggerSource<R> {
    fn next_trigger(&mut self) -> Option<SupervisorResult<TriggerRecord>> {
        match self.reader.read_record(&mut self.record) {
            Ok(false) => None,
            Ok(true) => {
                self.row += 1;
                Some(self.parse_current())
            }
            Err(e) => Some(Err(e.into())),
        }
    }
}

/// Header row for a given layout, in output column order.
pub fn output_header(layout: &DetectorLayout) -> Vec<String> {
    let ifos = layout.ifos();
    let mut h = vec!["End time".to_string(), "Coherent SNR".to_string()];
    h.extend(ifos.iter().map(|ifo| format!("{ifo} SNR")));
    h.extend(ifos.iter().map(|ifo| format!("Power chisq {ifo}")));
    h.extend(ifos.iter().map(|ifo| format!("Bank chisq {ifo}")));
    h.extend(ifos.iter().map(|ifo| format!("Auto chisq {ifo}")));
    h.extend(ifos.iter().map(|ifo| format!("BestNR {ifo}")));
    h
}

/// Writes scored rows as delimited text, one header row then one row per trigger.
pub struct CsvRecordSink<W: io::Write> {
    writer: csv::Writer<W>,
    width: Option<usize>,
}

impl CsvRecordSink<File> {
    pub fn create(path: impl AsRef<Path>) -> SupervisorResult<Self> {
        Ok(Self::from_writer(File::create(path)?))
    }
}

impl<W: io::Write> CsvRecordSink<W> {
    pub fn from_writer(w: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(w),
            width: None,
        }
    }

    /// Flush and hand back the underlying writer.
    pub fn into_inner(self) -> SupervisorResult<W> {
        self.writer
            .into_inner()
            .map_err(|e| SupervisorError::Io(e.into_error()))
    }
}

impl<W: io::Write> RecordSink for CsvRecordSink<W> {
    fn write_header(&mut self, layout: &DetectorLayout) -> SupervisorResult<()> {
        self.writer.write_record(output_header(layout))?;
        self.width = Some(layout.len());
        Ok(())
    }

    fn write_row(&mut self, row: &ScoredTrigger) -> SupervisorResult<()> {
        let r = &row.record;
        let expected = self.width.unwrap_or(r.detectors());
        for v in [&r.snr, &r.power_chisq, &r.bank_chisq, &r.auto_chisq] {
            if v.len() != expected {
                return Err(SupervisorError::RowWidth {
                    expected,
                    actual: v.len(),
                });
            }
        }

        let bestnr = row.bestnr();
        let fields = [r.end_time, r.coherent_snr]
            .into_iter()
            .chain(r.snr.iter().copied())
            .chain(r.power_chisq.iter().copied())
            .chain(r.bank_chisq.iter().copied())
            .chain(r.auto_chisq.iter().copied())
            .chain(bestnr)
            .map(|v| v.to_string());
        self.writer.write_record(fields)?;
        Ok(())
    }

    fn finish(&mut self) -> SupervisorResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}
