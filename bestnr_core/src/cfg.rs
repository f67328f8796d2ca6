//bestnr_core/cfg.rs

use serde::{Deserialize, Serialize};

use crate::error::{BestNrError, BestNrResult};

/// Shape of the re-weighting curve.
///
/// `index` sets how hard the SNR is suppressed once the reduced chi-squared
/// exceeds 1; `nhigh` sets where the suppression flattens out.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReweightParams {
    pub index: f64,
    pub nhigh: f64,
}

impl Default for ReweightParams {
    fn default() -> Self {
        Self {
            index: 4.0,
            nhigh: 3.0,
        }
    }
}

impl ReweightParams {
    pub fn validate(&self) -> BestNrResult<()> {
        for (name, value) in [("index", self.index), ("nhigh", self.nhigh)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(BestNrError::InvalidParam { name, value });
            }
        }
        Ok(())
    }
}

/// Thresholds and curve parameters for one BestNR evaluation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BestNrCfg {
    /// Coherent SNR gate.
    pub snr_threshold: f64,
    /// Minimum single-detector SNR.
    pub sngl_thresh: f64,
    /// Bank/auto veto threshold. `None` means "same as `snr_threshold`".
    pub chisq_threshold: Option<f64>,
    pub reweight: ReweightParams,
}

impl Default for BestNrCfg {
    fn default() -> Self {
        Self {
            snr_threshold: 6.0,
            sngl_thresh: 4.0,
            chisq_threshold: None,
            reweight: ReweightParams::default(),
        }
    }
}

impl BestNrCfg {
    #[inline]
    pub fn chisq_threshold(&self) -> f64 {
        self.chisq_threshold.unwrap_or(self.snr_threshold)
    }

    /// Thresholds must be finite; a NaN would silently disable its cut.
    pub fn validate(&self) -> BestNrResult<()> {
        let mut thresholds = vec![("snr_threshold", self.snr_threshold), ("sngl_thresh", self.sngl_thresh)];
        if let Some(v) = self.chisq_threshold {
            thresholds.push(("chisq_threshold", v));
        }
        for (name, value) in thresholds {
            if !value.is_finite() {
                return Err(BestNrError::InvalidThreshold { name, value });
            }
        }
        self.reweight.validate()
    }

    pub fn with_chisq_threshold(mut self, threshold: f64) -> Self {
        self.chisq_threshold = Some(threshold);
        self
    }

    pub fn with_snr_threshold(mut self, threshold: f64) -> Self {
        self.snr_threshold = threshold;
        self
    }

    pub fn with_sngl_thresh(mut self, threshold: f64) -> Self {
        self.sngl_thresh = threshold;
        self
    }

    pub fn with_reweight(mut self, reweight: ReweightParams) -> Self {
        self.reweight = reweight;
        self
    }
}
