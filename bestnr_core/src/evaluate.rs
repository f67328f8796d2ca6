//bestnr_core/evaluate.rs

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    cfg::BestNrCfg,
    error::BestNrResult,
    event::{CandidateEvent, ChisqFamily},
    reweight::{reduced_chisq, reweight_family},
};

/// The cut that vetoed an event. `detector` is the index into the event's vectors.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "cut", rename_all = "snake_case")]
pub enum Cut {
    CoherentSnr,
    BankChisq { detector: usize },
    AutoChisq { detector: usize },
    SingleSnr { detector: usize },
}

/// Outcome of scoring one event.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Rejected { cut: Cut, detectors: usize },
    /// Power-chisq re-weighted SNR per detector.
    Accepted(Vec<f64>),
}

impl Verdict {
    #[inline]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Verdict::Rejected { .. })
    }

    pub fn cut(&self) -> Option<Cut> {
        match self {
            Verdict::Rejected { cut, .. } => Some(*cut),
            Verdict::Accepted(_) => None,
        }
    }

    /// BestNR per detector; a rejection is a vector of zeros of the event's width.
    pub fn bestnr(&self) -> Vec<f64> {
        match self {
            Verdict::Rejected { detectors, .. } => vec![0.0; *detectors],
            Verdict::Accepted(v) => v.clone(),
        }
    }
}

/// Re-weighted SNR vectors for each chi-squared family.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Reweighted {
    pub bank: Vec<f64>,
    pub auto: Vec<f64>,
    pub power: Vec<f64>,
}

/// Verdict plus the intermediate vectors. `reweighted` is `None` when the
/// coherent cut fired before anything was computed.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Evaluation {
    pub verdict: Verdict,
    pub reweighted: Option<Reweighted>,
}

fn reweight(sngl_snr: &[f64], family: &ChisqFamily, cfg: &BestNrCfg) -> Vec<f64> {
    let reduced = reduced_chisq(&family.values, family.dof);
    reweight_family(sngl_snr, &reduced, &cfg.reweight)
}

/// Score one event and keep the per-family re-weighted vectors.
pub fn evaluate_detailed(event: &CandidateEvent, cfg: &BestNrCfg) -> BestNrResult<Evaluation> {
    cfg.validate()?;
    event.validate()?;

    let detectors = event.detectors();
    let reject = |cut: Cut, reweighted: Option<Reweighted>| {
        debug!(?cut, coherent_snr = event.coherent_snr, "event rejected");
        Evaluation {
            verdict: Verdict::Rejected { cut, detectors },
            reweighted,
        }
    };

    if event.coherent_snr < cfg.snr_threshold {
        return Ok(reject(Cut::CoherentSnr, None));
    }

    let chisq_threshold = cfg.chisq_threshold();

    let rw = Reweighted {
        bank: reweight(&event.sngl_snr, &event.bank, cfg),
        auto: reweight(&event.sngl_snr, &event.auto, cfg),
        power: reweight(&event.sngl_snr, &event.power, cfg),
    };

    for detector in 0..detectors {
        if rw.bank[detector] < chisq_threshold {
            return Ok(reject(Cut::BankChisq { detector }, Some(rw)));
        }
        if rw.auto[detector] < chisq_threshold {
            return Ok(reject(Cut::AutoChisq { detector }, Some(rw)));
        }
    }

    if let Some(detector) = event.sngl_snr.iter().position(|&snr| snr < cfg.sngl_thresh) {
        return Ok(reject(Cut::SingleSnr { detector }, Some(rw)));
    }

    // No null-SNR veto and no coherent chisq: the power-reweighted single
    // detector SNRs are the final statistic.
    Ok(Evaluation {
        verdict: Verdict::Accepted(rw.power.clone()),
        reweighted: Some(rw),
    })
}

/// Score one event.
pub fn evaluate(event: &CandidateEvent, cfg: &BestNrCfg) -> BestNrResult<Verdict> {
    evaluate_detailed(event, cfg).map(|e| e.verdict)
}

/// Positional form for callers holding raw per-detector slices.
///
/// Returns the BestNR vector directly (zeros on rejection).
#[allow(clippy::too_many_arguments)]
pub fn bestnr(
    coherent_snr: f64,
    sngl_snr: &[f64],
    bank_chisq: &[f64],
    bank_dof: f64,
    auto_chisq: &[f64],
    auto_dof: f64,
    power_chisq: &[f64],
    power_dof: f64,
    cfg: &BestNrCfg,
) -> BestNrResult<Vec<f64>> {
    let event = CandidateEvent::new(coherent_snr, sngl_snr)
        .with_bank(bank_chisq, bank_dof)
        .with_auto(auto_chisq, auto_dof)
        .with_power(power_chisq, power_dof);
    evaluate(&event, cfg).map(|v| v.bestnr())
}
