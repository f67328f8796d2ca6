//bestnr_core/event.rs

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{BestNrError, BestNrResult};

/// Which chi-squared test a vector belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Bank,
    /// Autocorrelation ("continuous") chi-squared.
    Auto,
    Power,
}

impl Family {
    pub const CHISQ: [Family; 3] = [Family::Bank, Family::Auto, Family::Power];

    pub fn column(&self) -> &'static str {
        match self {
            Family::Bank => "bank_chisq",
            Family::Auto => "auto_chisq",
            Family::Power => "power_chisq",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Family::Bank => "bank chisq",
            Family::Auto => "auto chisq",
            Family::Power => "power chisq",
        };
        f.write_str(s)
    }
}

/// One chi-squared family: a value per detector and a shared dof.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChisqFamily {
    pub values: Vec<f64>,
    pub dof: f64,
}

impl ChisqFamily {
    pub fn new(values: impl Into<Vec<f64>>, dof: f64) -> Self {
        Self {
            values: values.into(),
            dof,
        }
    }
}

/// A single trigger to be scored. Detector order is the same in every vector.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateEvent {
    pub coherent_snr: f64,
    pub sngl_snr: Vec<f64>,
    pub bank: ChisqFamily,
    pub auto: ChisqFamily,
    pub power: ChisqFamily,
}

impl CandidateEvent {
    pub fn new(coherent_snr: f64, sngl_snr: impl Into<Vec<f64>>) -> Self {
        CandidateEvent {
            coherent_snr,
            sngl_snr: sngl_snr.into(),
            ..Default::default()
        }
    }

    pub fn with_bank(mut self, values: impl Into<Vec<f64>>, dof: f64) -> Self {
        self.bank = ChisqFamily::new(values, dof);
        self
    }

    pub fn with_auto(mut self, values: impl Into<Vec<f64>>, dof: f64) -> Self {
        self.auto = ChisqFamily::new(values, dof);
        self
    }

    pub fn with_power(mut self, values: impl Into<Vec<f64>>, dof: f64) -> Self {
        self.power = ChisqFamily::new(values, dof);
        self
    }

    /// Number of detectors, taken from the SNR vector.
    #[inline]
    pub fn detectors(&self) -> usize {
        self.sngl_snr.len()
    }

    pub fn family(&self, family: Family) -> &ChisqFamily {
        match family {
            Family::Bank => &self.bank,
            Family::Auto => &self.auto,
            Family::Power => &self.power,
        }
    }

    /// Shape and dof checks. Runs before any cut is applied.
    pub fn validate(&self) -> BestNrResult<()> {
        let n = self.detectors();
        if n == 0 {
            return Err(BestNrError::NoDetectors);
        }

        if !self.coherent_snr.is_finite() {
            return Err(BestNrError::NonFinite {
                input: "coherent_snr",
                detector: None,
            });
        }
        if let Some(d) = self.sngl_snr.iter().position(|v| !v.is_finite()) {
            return Err(BestNrError::NonFinite {
                input: "sngl_snr",
                detector: Some(d),
            });
        }

        for family in Family::CHISQ {
            let chisq = self.family(family);
            if chisq.values.len() != n {
                return Err(BestNrError::DimensionMismatch {
                    family,
                    expected: n,
                    actual: chisq.values.len(),
                });
            }
            if !chisq.dof.is_finite() || chisq.dof <= 0.0 {
                return Err(BestNrError::InvalidDof {
                    family,
                    dof: chisq.dof,
                });
            }
            if let Some(d) = chisq.values.iter().position(|v| !v.is_finite()) {
                return Err(BestNrError::NonFinite {
                    input: family.column(),
                    detector: Some(d),
                });
            }
        }
        Ok(())
    }
}
