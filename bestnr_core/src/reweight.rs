//bestnr_core/reweight.rs

use crate::cfg::ReweightParams;

// ---------------------------------------------------------------------
// Chi-squared re-weighting curve
// ---------------------------------------------------------------------

/// Divide each chi-squared by the family's shared dof.
///
/// The caller is expected to have validated `dof` (see `CandidateEvent::validate`).
pub fn reduced_chisq(values: &[f64], dof: f64) -> Vec<f64> {
    values.iter().map(|chisq| chisq / dof).collect()
}

/// Re-weighted SNR for a single detector.
///
/// ```text
///                 snr
/// ----------------------------------------   if reduced > 1
/// ((1 + reduced^(index/nhigh)) / 2)^(1/index)
///
/// snr                                        otherwise
/// ```
///
/// The curve is continuous at `reduced == 1` and non-increasing above it.
/// A reduced chi-squared of exactly 1 takes the identity branch.
#[inline]
pub fn reweighted_snr(snr: f64, reduced: f64, params: &ReweightParams) -> f64 {
    if reduced > 1.0 {
        let denom = (1.0 + reduced.powf(params.index / params.nhigh)) / 2.0;
        snr / denom.powf(1.0 / params.index)
    } else {
        snr
    }
}

/// Apply `reweighted_snr` detector by detector.
///
/// `sngl_snr` and `reduced` are zipped, so a length mismatch silently
/// truncates; `evaluate` checks shapes before getting here.
pub fn reweight_family(sngl_snr: &[f64], reduced: &[f64], params: &ReweightParams) -> Vec<f64> {
    sngl_snr
        .iter()
        .zip(reduced)
        .map(|(&snr, &r)| reweighted_snr(snr, r, params))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_at_and_below_one() {
        let p = ReweightParams::default();
        assert_eq!(reweighted_snr(7.5, 1.0, &p), 7.5);
        assert_eq!(reweighted_snr(7.5, 0.2, &p), 7.5);
        assert_eq!(reweighted_snr(7.5, 0.0, &p), 7.5);
    }

    #[test]
    fn suppression_matches_hand_value() {
        let p = ReweightParams::default();
        // reduced = 4: 4^(4/3) = 6.349604..., (1 + 6.3496)/2 = 3.674802..., ^(1/4) = 1.384554...
        let got = reweighted_snr(5.0, 4.0, &p);
        let want = 5.0 / ((1.0 + 4.0_f64.powf(4.0 / 3.0)) / 2.0).powf(0.25);
        assert!((got - want).abs() < 1e-12);
        assert!((got - 3.611270).abs() < 1e-5);
    }

    #[test]
    fn monotone_above_one() {
        let p = ReweightParams::default();
        let mut prev = reweighted_snr(10.0, 1.0, &p);
        for step in 1..200 {
            let r = 1.0 + step as f64 * 0.25;
            let cur = reweighted_snr(10.0, r, &p);
            assert!(cur <= prev, "r={r}: {cur} > {prev}");
            prev = cur;
        }
    }

    #[test]
    fn alternate_curve() {
        let p = ReweightParams { index: 6.0, nhigh: 2.0 };
        // 4^3 = 64, (1 + 64)/2 = 32.5
        let want = 8.0 / 32.5_f64.powf(1.0 / 6.0);
        assert!((reweighted_snr(8.0, 4.0, &p) - want).abs() < 1e-12);
        assert!(reweighted_snr(8.0, 4.0, &p) < reweighted_snr(8.0, 4.0, &ReweightParams::default()));
    }

    #[test]
    fn reduced_divides_by_dof() {
        assert_eq!(reduced_chisq(&[8.0, 3.0], 2.0), vec![4.0, 1.5]);
    }
}
