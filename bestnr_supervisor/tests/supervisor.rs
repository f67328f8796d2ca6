use std::fs;

use bestnr_core::{BestNrCfg, Cut, Verdict};
use bestnr_supervisor::*;

const TRIGGERS: &str = "\
end_time,coherent_snr,H1_snr,L1_snr,H1_chisq,L1_chisq,H1_bank_chisq,L1_bank_chisq,H1_cont_chisq,L1_cont_chisq,chisq_dof,bank_chisq_dof,cont_chisq_dof
1000000000.5,10,8,7,30,90,10,12,20,25,30,10,20
1000000001.5,5,8,7,30,90,10,12,20,25,,,
1000000002.5,9,8,3,30,90,10,12,20,25,,,
";

fn record(end_time: f64, coherent_snr: f64, snr: [f64; 2]) -> TriggerRecord {
    TriggerRecord::new(end_time, coherent_snr, snr)
        .with_power([1.0, 1.0], 1.0)
        .with_bank([1.0, 1.0], 1.0)
        .with_auto([1.0, 1.0], 1.0)
}

#[test]
fn csv_source_reads_and_inherits_dof() {
    let mut src = CsvTriggerSource::from_reader(TRIGGERS.as_bytes(), &DetectorLayout::default()).unwrap();

    let first = src.next_trigger().unwrap().unwrap();
    assert_eq!(first.end_time, 1000000000.5);
    assert_eq!(first.snr, vec![8.0, 7.0]);
    assert_eq!(first.power_chisq, vec![30.0, 90.0]);
    assert_eq!(first.bank_chisq, vec![10.0, 12.0]);
    assert_eq!(first.auto_chisq, vec![20.0, 25.0]);
    assert_eq!((first.power_dof, first.bank_dof, first.auto_dof), (30.0, 10.0, 20.0));

    let second = src.next_trigger().unwrap().unwrap();
    assert_eq!((second.power_dof, second.bank_dof, second.auto_dof), (30.0, 10.0, 20.0));

    assert!(src.next_trigger().unwrap().is_ok());
    assert!(src.next_trigger().is_none());
}

#[test]
fn missing_first_dof_is_an_error() {
    let data = "end_time,coherent_snr,H1_snr,H1_chisq,H1_bank_chisq,H1_cont_chisq,chisq_dof\n1,10,8,1,1,1,\n";
    let layout: DetectorLayout = "H1".parse().unwrap();
    let mut src = CsvTriggerSource::from_reader(data.as_bytes(), &layout).unwrap();
    let err = src.next_trigger().unwrap().unwrap_err();
    assert!(matches!(err, SupervisorError::MissingDof { row: 1, column: "chisq_dof" }));
}

#[test]
fn non_numeric_field_is_an_error() {
    let data = "end_time,coherent_snr,H1_snr,H1_chisq,H1_bank_chisq,H1_cont_chisq,chisq_dof,bank_chisq_dof,cont_chisq_dof\n1,ten,8,1,1,1,1,1,1\n";
    let layout: DetectorLayout = "H1".parse().unwrap();
    let mut src = CsvTriggerSource::from_reader(data.as_bytes(), &layout).unwrap();
    match src.next_trigger() {
        Some(Err(SupervisorError::BadValue { row, column, value })) => {
            assert_eq!(row, 1);
            assert_eq!(column, "coherent_snr");
            assert_eq!(value, "ten");
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn end_to_end_csv() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("triggers.csv");
    let output = dir.path().join("BestNR_output.csv");
    fs::write(&input, TRIGGERS).unwrap();

    let layout = DetectorLayout::default();
    let mut src = CsvTriggerSource::from_path(&input, &layout).unwrap();
    let mut sink = CsvRecordSink::create(&output).unwrap();
    let cfg = BestNrCfg::default().with_chisq_threshold(5.0);
    let stats = BestNrSupervisor::new(cfg).run(&mut src, &mut sink, &layout).unwrap();

    assert_eq!(stats.read, 3);
    assert_eq!(stats.accepted, 1);
    assert_eq!(stats.cut_coherent, 1);
    // L1 SNR of 3 is already below the bank threshold once re-weighted.
    assert_eq!(stats.cut_bank, 1);
    assert_eq!(stats.skipped, 0);

    let text = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], output_header(&layout).join(","));

    // Row 1: H1 power reduced = 1 (identity), L1 reduced = 3 (suppressed).
    let row: Vec<f64> = lines[1].split(',').map(|f| f.parse().unwrap()).collect();
    assert_eq!(row.len(), 12);
    assert_eq!(row[0], 1000000000.5);
    assert_eq!(row[10], 8.0);
    assert!(row[11] < 7.0 && row[11] > 0.0);

    // Rejected rows keep their inputs and zero the BestNR columns.
    let row: Vec<&str> = lines[2].split(',').collect();
    assert_eq!(row[1], "5");
    assert_eq!(&row[10..], &["0", "0"]);
}

#[test]
fn invalid_events_are_skipped_not_fatal() {
    let mut bad = record(2.0, 10.0, [8.0, 8.0]);
    bad.auto_chisq = vec![1.0];
    let mut zero_dof = record(3.0, 10.0, [8.0, 8.0]);
    zero_dof.bank_dof = 0.0;

    let records = vec![record(1.0, 10.0, [8.0, 8.0]), bad, zero_dof, record(4.0, 10.0, [9.0, 9.0])];
    let mut sink: Vec<ScoredTrigger> = Vec::new();
    let stats = BestNrSupervisor::new(BestNrCfg::default())
        .run(&mut records.into_iter(), &mut sink, &DetectorLayout::default())
        .unwrap();

    assert_eq!(stats.read, 4);
    assert_eq!(stats.skipped, 2);
    assert_eq!(stats.accepted, 2);
    let times: Vec<f64> = sink.iter().map(|s| s.record.end_time).collect();
    assert_eq!(times, vec![1.0, 4.0]);
    assert_eq!(sink[1].verdict, Verdict::Accepted(vec![9.0, 9.0]));
}

#[test]
fn parallel_matches_sequential_across_chunks() {
    let records: Vec<TriggerRecord> = (0..257)
        .map(|i| {
            let snr = 3.0 + (i % 11) as f64;
            record(i as f64, 4.0 + (i % 7) as f64, [snr, snr + 1.0])
                .with_power([(i % 5) as f64 * 10.0, 5.0], 5.0)
        })
        .collect();

    let cfg = BestNrCfg::default();
    let seq = BestNrSupervisor::new(cfg.clone()).chunk_size(16);
    let par = BestNrSupervisor::new(cfg).chunk_size(16).parallel(true);

    let mut a: Vec<ScoredTrigger> = Vec::new();
    let mut b: Vec<ScoredTrigger> = Vec::new();
    let layout = DetectorLayout::default();
    let sa = seq.run(&mut records.clone().into_iter(), &mut a, &layout).unwrap();
    let sb = par.run(&mut records.into_iter(), &mut b, &layout).unwrap();

    assert_eq!(sa, sb);
    assert_eq!(a, b);
    assert_eq!(sa.read, 257);
    assert_eq!(sa.accepted + sa.rejected, 257);
}

#[test]
fn score_reports_cut() {
    let sup = BestNrSupervisor::new(BestNrCfg::default());
    let v = sup.score(&record(0.0, 5.0, [9.0, 9.0])).unwrap();
    assert_eq!(v.cut(), Some(Cut::CoherentSnr));
}

#[test]
fn sink_rejects_width_mismatch() {
    let layout: DetectorLayout = "H1,L1,V1".parse().unwrap();
    let mut sink = CsvRecordSink::from_writer(Vec::new());
    sink.write_header(&layout).unwrap();
    let row = ScoredTrigger {
        record: record(0.0, 10.0, [8.0, 8.0]),
        verdict: Verdict::Accepted(vec![8.0, 8.0]),
    };
    assert!(matches!(
        sink.write_row(&row),
        Err(SupervisorError::RowWidth { expected: 3, actual: 2 })
    ));
}

#[test]
fn three_detector_layout() {
    let layout: DetectorLayout = "H1, L1, V1".parse().unwrap();
    assert_eq!(layout.ifos(), &["H1", "L1", "V1"]);
    assert_eq!(layout.to_string(), "H1,L1,V1");
    assert!("".parse::<DetectorLayout>().is_err());
}

#[test]
fn csv_sink_into_inner_returns_rows() {
    let layout = DetectorLayout::default();
    let mut sink = CsvRecordSink::from_writer(Vec::new());
    sink.write_header(&layout).unwrap();
    sink.write_row(&ScoredTrigger {
        record: record(12.5, 10.0, [8.0, 7.0]),
        verdict: Verdict::Accepted(vec![8.0, 7.0]),
    })
    .unwrap();
    sink.finish().unwrap();

    let text = String::from_utf8(sink.into_inner().unwrap()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], output_header(&layout).join(","));
    assert_eq!(lines[1], "12.5,10,8,7,1,1,1,1,1,1,8,7");
}

#[test]
fn supervisor_keeps_cfg_and_skips_on_bad_threshold() {
    let cfg = BestNrCfg::default().with_chisq_threshold(f64::NAN);
    let sup = BestNrSupervisor::new(cfg);
    assert!(sup.cfg().chisq_threshold().is_nan());

    let (scored, stats) = sup.score_batch(vec![record(0.0, 10.0, [9.0, 9.0])]);
    assert!(scored.is_empty());
    assert_eq!(stats.skipped, 1);
}

#[test]
fn nan_trigger_is_skipped() {
    let mut bad = record(1.0, 10.0, [9.0, 9.0]);
    bad.power_chisq = vec![f64::NAN, 1.0];
    let sup = BestNrSupervisor::new(BestNrCfg::default());
    let (scored, stats) = sup.score_batch(vec![bad, record(2.0, 10.0, [9.0, 9.0])]);
    assert_eq!(stats.skipped, 1);
    assert_eq!(scored.len(), 1);
    assert_eq!(scored[0].record.end_time, 2.0);
}
