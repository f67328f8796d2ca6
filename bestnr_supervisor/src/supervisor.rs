//! Batch BestNR supervisor.
//!
//! This is the outside-world facing loop around `bestnr_core`:
//! - pulls `TriggerRecord`s from a `TriggerSource` in chunks
//! - scores each chunk, optionally on the rayon pool
//! - pushes `ScoredTrigger`s into a `RecordSink` in input order
//! - skips (and counts) events the core refuses to score
//!
//! The core is stateless, so parallel scoring needs no locking.

use bestnr_core::{evaluate, BestNrCfg, BestNrResult, Cut, Verdict};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::adapter::{DetectorLayout, RecordSink, ScoredTrigger, TriggerRecord, TriggerSource};
use crate::error::SupervisorResult;

pub const DEFAULT_CHUNK: usize = 4096;

/// Counters for one run. Useful for logging without re-reading the output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    /// Records pulled from the source.
    pub read: usize,
    pub accepted: usize,
    pub rejected: usize,
    /// Records the core refused (bad shape, dof or non-finite input); not written.
    pub skipped: usize,

    pub cut_coherent: usize,
    pub cut_bank: usize,
    pub cut_auto: usize,
    pub cut_single: usize,
}

impl BatchStats {
    fn record(&mut self, verdict: &Verdict) {
        match verdict.cut() {
            None => self.accepted += 1,
            Some(cut) => {
                self.rejected += 1;
                match cut {
                    Cut::CoherentSnr => self.cut_coherent += 1,
                    Cut::BankChisq { .. } => self.cut_bank += 1,
                    Cut::AutoChisq { .. } => self.cut_auto += 1,
                    Cut::SingleSnr { .. } => self.cut_single += 1,
                }
            }
        }
    }

    fn merge(&mut self, other: BatchStats) {
        self.read += other.read;
        self.accepted += other.accepted;
        self.rejected += other.rejected;
        self.skipped += other.skipped;
        self.cut_coherent += other.cut_coherent;
        self.cut_bank += other.cut_bank;
        self.cut_auto += other.cut_auto;
        self.cut_single += other.cut_single;
    }
}

/// Drives the evaluator over a stream of triggers.
///
/// - `parallel == false` (default) scores on the calling thread.
/// - `parallel == true` scores each chunk on the global rayon pool. Output
///   order is still input order.
#[derive(Clone, Debug)]
pub struct BestNrSupervisor {
    cfg: BestNrCfg,
    parallel: bool,
    chunk: usize,
}

impl BestNrSupervisor {
    pub fn new(cfg: BestNrCfg) -> Self {
        Self {
            cfg,
            parallel: false,
            chunk: DEFAULT_CHUNK,
        }
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Records scored per chunk. Clamped to at least 1.
    pub fn chunk_size(mut self, chunk: usize) -> Self {
        self.chunk = chunk.max(1);
        self
    }

    pub fn cfg(&self) -> &BestNrCfg {
        &self.cfg
    }

    /// Score a single record.
    pub fn score(&self, record: &TriggerRecord) -> BestNrResult<Verdict> {
        evaluate(&record.to_event(), &self.cfg)
    }

    /// Score a batch in memory.
    ///
    /// Records the core rejects as invalid are logged and left out; the rest
    /// come back in input order.
    pub fn score_batch(&self, records: Vec<TriggerRecord>) -> (Vec<ScoredTrigger>, BatchStats) {
        let verdicts: Vec<BestNrResult<Verdict>> = if self.parallel {
            records.par_iter().map(|r| self.score(r)).collect()
        } else {
            records.iter().map(|r| self.score(r)).collect()
        };

        let mut stats = BatchStats {
            read: records.len(),
            ..Default::default()
        };
        let mut out = Vec::with_capacity(records.len());
        for (record, verdict) in records.into_iter().zip(verdicts) {
            match verdict {
                Ok(verdict) => {
                    stats.record(&verdict);
                    out.push(ScoredTrigger { record, verdict });
                }
                Err(e) => {
                    warn!(end_time = record.end_time, error = %e, "skipping trigger");
                    stats.skipped += 1;
                }
            }
        }
        (out, stats)
    }

    fn flush_chunk<K: RecordSink + ?Sized>(
        &self,
        chunk: &mut Vec<TriggerRecord>,
        sink: &mut K,
        stats: &mut BatchStats,
    ) -> SupervisorResult<()> {
        if chunk.is_empty() {
            return Ok(());
        }
        let (scored, chunk_stats) = self.score_batch(std::mem::take(chunk));
        for row in &scored {
            sink.write_row(row)?;
        }
        debug!(rows = scored.len(), skipped = chunk_stats.skipped, "chunk written");
        stats.merge(chunk_stats);
        Ok(())
    }

    /// Pull every record from `source`, score it and write it to `sink`.
    ///
    /// Source or sink failures abort the run; invalid events do not.
    pub fn run<S, K>(&self, source: &mut S, sink: &mut K, layout: &DetectorLayout) -> SupervisorResult<BatchStats>
    where
        S: TriggerSource + ?Sized,
        K: RecordSink + ?Sized,
    {
        sink.write_header(layout)?;

        let mut stats = BatchStats::default();
        let mut chunk: Vec<TriggerRecord> = Vec::with_capacity(self.chunk);
        while let Some(record) = source.next_trigger() {
            chunk.push(record?);
            if chunk.len() >= self.chunk {
                self.flush_chunk(&mut chunk, sink, &mut stats)?;
            }
        }
        self.flush_chunk(&mut chunk, sink, &mut stats)?;
        sink.finish()?;

        info!(
            read = stats.read,
            accepted = stats.accepted,
            rejected = stats.rejected,
            skipped = stats.skipped,
            "bestnr run complete"
        );
        Ok(stats)
    }
}
