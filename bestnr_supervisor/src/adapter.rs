//! Boundary adapter layer: typed trigger records in, scored rows out.
//!
//! This module is intentionally small:
//! - No file handling (see `csv_io`)
//! - No statistic logic (lives in core)
//!
//! Products provide a `TriggerSource` and a `RecordSink`, or use the CSV ones.

use std::fmt;
use std::str::FromStr;

use bestnr_core::{CandidateEvent, Verdict};
use serde::{Deserialize, Serialize};

use crate::error::{SupervisorError, SupervisorResult};

/// Detector (IFO) names in the order the per-detector vectors use.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorLayout {
    ifos: Vec<String>,
}

impl Default for DetectorLayout {
    fn default() -> Self {
        Self {
            ifos: vec!["H1".to_string(), "L1".to_string()],
        }
    }
}

impl DetectorLayout {
    pub fn new<I, S>(ifos: I) -> SupervisorResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ifos: Vec<String> = ifos.into_iter().map(Into::into).collect();
        if ifos.is_empty() {
            return Err(SupervisorError::EmptyLayout);
        }
        Ok(Self { ifos })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ifos.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ifos.is_empty()
    }

    pub fn ifos(&self) -> &[String] {
        &self.ifos
    }
}

impl FromStr for DetectorLayout {
    type Err = SupervisorError;

    /// Parse a comma separated list such as `H1,L1,V1`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DetectorLayout::new(s.split(',').map(str::trim).filter(|t| !t.is_empty()))
    }
}

impl fmt::Display for DetectorLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.ifos.join(","))
    }
}

/// One row of trigger data as read from the outside world.
///
/// Per-detector vectors follow the `DetectorLayout` the record was read with.
/// The dof values are per record, but in practice constant for a whole file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerRecord {
    pub end_time: f64,
    pub coherent_snr: f64,
    pub snr: Vec<f64>,
    pub power_chisq: Vec<f64>,
    pub bank_chisq: Vec<f64>,
    pub auto_chisq: Vec<f64>,
    pub power_dof: f64,
    pub bank_dof: f64,
    pub auto_dof: f64,
}

impl TriggerRecord {
    /// Convenience constructor; chi-squared vectors start empty.
    pub fn new(end_time: f64, coherent_snr: f64, snr: impl Into<Vec<f64>>) -> Self {
        Self {
            end_time,
            coherent_snr,
            snr: snr.into(),
            ..Default::default()
        }
    }

    pub fn with_power(mut self, chisq: impl Into<Vec<f64>>, dof: f64) -> Self {
        self.power_chisq = chisq.into();
        self.power_dof = dof;
        self
    }

    pub fn with_bank(mut self, chisq: impl Into<Vec<f64>>, dof: f64) -> Self {
        self.bank_chisq = chisq.into();
        self.bank_dof = dof;
        self
    }

    pub fn with_auto(mut self, chisq: impl Into<Vec<f64>>, dof: f64) -> Self {
        self.auto_chisq = chisq.into();
        self.auto_dof = dof;
        self
    }

    #[inline]
    pub fn detectors(&self) -> usize {
        self.snr.len()
    }

    /// Build the core's view of this trigger.
    pub fn to_event(&self) -> CandidateEvent {
        CandidateEvent::new(self.coherent_snr, self.snr.clone())
            .with_bank(self.bank_chisq.clone(), self.bank_dof)
            .with_auto(self.auto_chisq.clone(), self.auto_dof)
            .with_power(self.power_chisq.clone(), self.power_dof)
    }
}

/// A trigger together with its score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredTrigger {
    pub record: TriggerRecord,
    pub verdict: Verdict,
}

impl ScoredTrigger {
    /// BestNR per detector, zeros when rejected.
    pub fn bestnr(&self) -> Vec<f64> {
        self.verdict.bestnr()
    }
}

/// Trait: a pull-based supply of trigger records.
///
/// `None` means the source is exhausted. An `Err` aborts the run.
pub trait TriggerSource {
    fn next_trigger(&mut self) -> Option<SupervisorResult<TriggerRecord>>;
}

/// In-memory records (tests, callers that already hold the data).
impl TriggerSource for std::vec::IntoIter<TriggerRecord> {
    fn next_trigger(&mut self) -> Option<SupervisorResult<TriggerRecord>> {
        self.next().map(Ok)
    }
}

/// Trait: where scored rows go.
pub trait RecordSink {
    /// Called once before any row.
    fn write_header(&mut self, layout: &DetectorLayout) -> SupervisorResult<()>;
    fn write_row(&mut self, row: &ScoredTrigger) -> SupervisorResult<()>;
    /// Flush; called once after the last row.
    fn finish(&mut self) -> SupervisorResult<()>;
}

/// Collects rows in memory.
impl RecordSink for Vec<ScoredTrigger> {
    fn write_header(&mut self, _layout: &DetectorLayout) -> SupervisorResult<()> {
        Ok(())
    }

    fn write_row(&mut self, row: &ScoredTrigger) -> SupervisorResult<()> {
        self.push(row.clone());
        Ok(())
    }

    fn finish(&mut self) -> SupervisorResult<()> {
        Ok(())
    }
}
