//! Log-domain arithmetic.
//! Probability zero is represented by [`LOG_ZERO`] and is never used as a divisor.

/// log(0).
pub const LOG_ZERO: f64 = f64::NEG_INFINITY;

/// Natural log of a probability. Zero maps to `LOG_ZERO` explicitly.
pub fn log(x: f64) -> f64 {
    if x == 0f64 {
        LOG_ZERO
    } else {
        x.ln()
    }
}

/// log(sum exp(x)) over the slice. `LOG_ZERO` entries contribute nothing,
/// and an empty slice, or a slice of `LOG_ZERO` only, sums to `LOG_ZERO`.
pub fn logsumexp(xs: &[f64]) -> f64 {
    logsumexp_iter(xs.iter().copied())
}

/// Same as [`logsumexp`], over an iterator. It makes two passes, so the iterator should be cheap to clone.
pub fn logsumexp_iter<I: Iterator<Item = f64> + Clone>(xs: I) -> f64 {
    let max = xs.clone().fold(LOG_ZERO, f64::max);
    if max == LOG_ZERO {
        return LOG_ZERO;
    }
    let sum: f64 = xs.map(|x| (x - max).exp()).sum();
    max + sum.ln()
}

/// Index and value of the maximum. The first maximum wins on ties,
/// and an all-`LOG_ZERO` input returns index 0.
pub fn argmax<I: IntoIterator<Item = f64>>(xs: I) -> (usize, f64) {
    let mut best = (0, LOG_ZERO);
    for (idx, x) in xs.into_iter().enumerate() {
        if best.1 < x {
            best = (idx, x);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn log_zero_is_sentinel() {
        assert_eq!(log(0f64), LOG_ZERO);
        assert_eq!(log(1f64), 0f64);
        assert!((log(0.5) - 0.5f64.ln()).abs() < 1e-15);
    }
    #[test]
    fn logsumexp_stable() {
        let lse = logsumexp(&[-1000f64, -1000f64]);
        assert!((lse - (-1000f64 + 2f64.ln())).abs() < 1e-10);
        let lse = logsumexp(&[700f64, 700f64]);
        assert!(lse.is_finite());
        assert!((lse - (700f64 + 2f64.ln())).abs() < 1e-10);
        let lse = logsumexp(&[-1000f64, -1001f64]);
        assert!(-1000f64 < lse && lse < -999f64);
    }
    #[test]
    fn logsumexp_neg_infinity() {
        assert_eq!(logsumexp(&[]), LOG_ZERO);
        assert_eq!(logsumexp(&[LOG_ZERO, LOG_ZERO]), LOG_ZERO);
        assert_eq!(logsumexp(&[LOG_ZERO, -3f64]), -3f64);
        assert_eq!(logsumexp(&[5f64, LOG_ZERO]), 5f64);
        assert!(!logsumexp(&[LOG_ZERO, LOG_ZERO]).is_nan());
    }
    #[test]
    fn logsumexp_matches_naive() {
        let xs = [0.1f64, 0.2, 0.3, 0.4];
        let logs: Vec<_> = xs.iter().map(|&x| log(x)).collect();
        assert!(logsumexp(&logs).abs() < 1e-12);
        assert!((logsumexp(&logs[..2]) - 0.3f64.ln()).abs() < 1e-12);
    }
    #[test]
    fn argmax_first_wins() {
        assert_eq!(argmax(vec![1f64, 3f64, 3f64, 2f64]), (1, 3f64));
        assert_eq!(argmax(vec![LOG_ZERO, LOG_ZERO]), (0, LOG_ZERO));
        assert_eq!(argmax(vec![LOG_ZERO, -1f64]), (1, -1f64));
        assert_eq!(argmax(Vec::new()), (0, LOG_ZERO));
    }
}
