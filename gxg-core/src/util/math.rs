//! Mathematical utility functions.

/// Inverse golden ratio, (sqrt(5) - 1) / 2.
const INV_PHI: f64 = 0.618_033_988_749_894_8;

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance (divisor n, not n - 1).
pub fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64
}

/// Whether every value equals the first one exactly.
pub fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

/// Maximise a unimodal function on [lo, hi] by golden-section search.
///
/// Returns the abscissa of the best point visited, endpoints included.
/// Non-finite function values are treated as -inf.
pub fn golden_section_max<F>(f: F, lo: f64, hi: f64, tol: f64, max_iter: usize) -> f64
where
    F: Fn(f64) -> f64,
{
    let eval = |x: f64| {
        let v = f(x);
        if v.is_finite() {
            v
        } else {
            f64::NEG_INFINITY
        }
    };

    let mut best = (lo, eval(lo));
    let f_hi = eval(hi);
    if f_hi > best.1 {
        best = (hi, f_hi);
    }

    let (mut a, mut b) = (lo, hi);
    let mut c = b - INV_PHI * (b - a);
    let mut d = a + INV_PHI * (b - a);
    let mut fc = eval(c);
    let mut fd = eval(d);

    for _ in 0..max_iter {
        if (b - a).abs() < tol {
            break;
        }
        if fc > fd {
            b = d;
            d = c;
            fd = fc;
            c = b - INV_PHI * (b - a);
            fc = eval(c);
        } else {
            a = c;
            c = d;
            fc = fd;
            d = a + INV_PHI * (b - a);
            fd = eval(d);
        }
    }

    for (x, v) in [(c, fc), (d, fd)] {
        if v > best.1 {
            best = (x, v);
        }
    }
    best.0
}
