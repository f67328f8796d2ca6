#![allow(clippy::missing_safety_doc)]

use std::slice;

use bestnr_core::{evaluate, BestNrCfg, BestNrError, CandidateEvent, Cut, ReweightParams, Verdict};

/// FFI ABI version for bestnr_ffi.
///
/// Bump this when any `#[repr(C)]` struct layout or exported function signature changes.
pub const BESTNR_FFI_VERSION: u32 = 1;

#[no_mangle]
pub extern "C" fn bestnr_ffi_version() -> u32 {
    BESTNR_FFI_VERSION
}

// Return codes. Non-negative means `out` was written.
pub const BESTNR_OK: i32 = 0;
pub const BESTNR_REJECTED: i32 = 1;
pub const BESTNR_ERR_NULL: i32 = -1;
pub const BESTNR_ERR_NO_DETECTORS: i32 = -2;
pub const BESTNR_ERR_INVALID_DOF: i32 = -3;
pub const BESTNR_ERR_INVALID_PARAM: i32 = -4;
pub const BESTNR_ERR_BUFFER: i32 = -5;
pub const BESTNR_ERR_DIMENSION: i32 = -6;
pub const BESTNR_ERR_NON_FINITE: i32 = -7;

/// Evaluator cfg for FFI.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct BestNrFfiCfg {
    pub snr_threshold: f64,
    pub sngl_thresh: f64,
    /// Negative or NaN means unset (use `snr_threshold`).
    pub chisq_threshold: f64,
    pub index: f64,
    pub nhigh: f64,
}

/// One candidate event. Every array holds `detectors` values.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct BestNrFfiEvent {
    pub coherent_snr: f64,
    pub detectors: usize,
    pub sngl_snr: *const f64,
    pub bank_chisq: *const f64,
    pub bank_dof: f64,
    pub auto_chisq: *const f64,
    pub auto_dof: f64,
    pub power_chisq: *const f64,
    pub power_dof: f64,
}

/// Which cut fired, as a C-friendly enum.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BestNrFfiCut {
    None = 0,
    CoherentSnr = 1,
    BankChisq = 2,
    AutoChisq = 3,
    SingleSnr = 4,
}

/// Optional rejection detail. `detector` is -1 when not detector-specific.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct BestNrFfiCutInfo {
    pub cut: BestNrFfiCut,
    pub detector: i32,
}

#[no_mangle]
pub extern "C" fn bestnr_cfg_default() -> BestNrFfiCfg {
    let d = BestNrCfg::default();
    BestNrFfiCfg {
        snr_threshold: d.snr_threshold,
        sngl_thresh: d.sngl_thresh,
        chisq_threshold: d.chisq_threshold.unwrap_or(-1.0),
        index: d.reweight.index,
        nhigh: d.reweight.nhigh,
    }
}

fn cfg_from_ffi(c: BestNrFfiCfg) -> BestNrCfg {
    BestNrCfg {
        snr_threshold: c.snr_threshold,
        sngl_thresh: c.sngl_thresh,
        chisq_threshold: if c.chisq_threshold.is_nan() || c.chisq_threshold < 0.0 {
            None
        } else {
            Some(c.chisq_threshold)
        },
        reweight: ReweightParams {
            index: c.index,
            nhigh: c.nhigh,
        },
    }
}

fn cut_to_ffi(cut: Option<Cut>) -> BestNrFfiCutInfo {
    let (cut, detector) = match cut {
        None => (BestNrFfiCut::None, -1),
        Some(Cut::CoherentSnr) => (BestNrFfiCut::CoherentSnr, -1),
        Some(Cut::BankChisq { detector }) => (BestNrFfiCut::BankChisq, i32::try_from(detector).unwrap_or(-1)),
        Some(Cut::AutoChisq { detector }) => (BestNrFfiCut::AutoChisq, i32::try_from(detector).unwrap_or(-1)),
        Some(Cut::SingleSnr { detector }) => (BestNrFfiCut::SingleSnr, i32::try_from(detector).unwrap_or(-1)),
    };
    BestNrFfiCutInfo { cut, detector }
}

fn err_to_rc(e: &BestNrError) -> i32 {
    match e {
        BestNrError::NoDetectors => BESTNR_ERR_NO_DETECTORS,
        BestNrError::DimensionMismatch { .. } => BESTNR_ERR_DIMENSION,
        BestNrError::InvalidDof { .. } => BESTNR_ERR_INVALID_DOF,
        BestNrError::NonFinite { .. } => BESTNR_ERR_NON_FINITE,
        BestNrError::InvalidThreshold { .. } | BestNrError::InvalidParam { .. } => BESTNR_ERR_INVALID_PARAM,
    }
}

unsafe fn read_vec(p: *const f64, n: usize) -> Option<Vec<f64>> {
    if p.is_null() {
        return None;
    }
    Some(slice::from_raw_parts(p, n).to_vec())
}

unsafe fn event_from_ffi(e: &BestNrFfiEvent) -> Option<CandidateEvent> {
    let n = e.detectors;
    Some(
        CandidateEvent::new(e.coherent_snr, read_vec(e.sngl_snr, n)?)
            .with_bank(read_vec(e.bank_chisq, n)?, e.bank_dof)
            .with_auto(read_vec(e.auto_chisq, n)?, e.auto_dof)
            .with_power(read_vec(e.power_chisq, n)?, e.power_dof),
    )
}

/// Score one event into `out` (at least `ev.detectors` slots).
///
/// Returns `BESTNR_OK` with the BestNR values, or `BESTNR_REJECTED` with `out`
/// zero-filled. Negative codes leave `out` untouched. `out_cut` may be null.
#[no_mangle]
pub unsafe extern "C" fn bestnr_evaluate(
    cfg: BestNrFfiCfg,
    ev: *const BestNrFfiEvent,
    out: *mut f64,
    out_len: usize,
    out_cut: *mut BestNrFfiCutInfo,
) -> i32 {
    if ev.is_null() || out.is_null() {
        return BESTNR_ERR_NULL;
    }
    let ev = &*ev;
    if ev.detectors == 0 {
        return BESTNR_ERR_NO_DETECTORS;
    }
    if out_len < ev.detectors {
        return BESTNR_ERR_BUFFER;
    }
    let event = match event_from_ffi(ev) {
        Some(e) => e,
        None => return BESTNR_ERR_NULL,
    };

    let verdict = match evaluate(&event, &cfg_from_ffi(cfg)) {
        Ok(v) => v,
        Err(e) => return err_to_rc(&e),
    };

    let dst = slice::from_raw_parts_mut(out, ev.detectors);
    dst.copy_from_slice(&verdict.bestnr());
    if !out_cut.is_null() {
        *out_cut = cut_to_ffi(verdict.cut());
    }

    match verdict {
        Verdict::Accepted(_) => BESTNR_OK,
        Verdict::Rejected { .. } => BESTNR_REJECTED,
    }
}

/// Re-weighted SNR for one detector. NaN if `index`/`nhigh` are not positive and finite.
#[no_mangle]
pub extern "C" fn bestnr_reweighted_snr(snr: f64, reduced: f64, index: f64, nhigh: f64) -> f64 {
    let params = ReweightParams { index, nhigh };
    if params.validate().is_err() {
        return f64::NAN;
    }
    bestnr_core::reweighted_snr(snr, reduced, &params)
}
