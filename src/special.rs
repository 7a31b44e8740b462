//! Special functions for variational inference: log-gamma, digamma, trigamma.
//!
//! Each uses the recurrence to shift the argument by 6, then an asymptotic series.
//! Accurate to ~1e-10 for x > 0, which is all the model ever asks for.

const HALF_LN_2PI: f64 = 0.918_938_533_204_673;

pub fn log_gamma(x: f64) -> f64 {
    let y = x + 6.0;
    let z = 1.0 / (y * y);
    let series = (((-0.000_595_238_095_238 * z + 0.000_793_650_793_651) * z - 0.002_777_777_777_778) * z
        + 0.083_333_333_333_333)
        / y;
    let mut r = (y - 0.5) * y.ln() - y + HALF_LN_2PI + series;
    for i in 1..=6 {
        r -= (y - i as f64).ln();
    }
    r
}

pub fn digamma(x: f64) -> f64 {
    let y = x + 6.0;
    let p = 1.0 / (y * y);
    let mut r = (((0.004_166_666_666_667 * p - 0.003_968_253_986_254) * p + 0.008_333_333_333_333) * p
        - 0.083_333_333_333_333)
        * p;
    r += y.ln() - 0.5 / y;
    for i in 1..=6 {
        r -= 1.0 / (y - i as f64);
    }
    r
}

pub fn trigamma(x: f64) -> f64 {
    let mut y = x + 6.0;
    let p = 1.0 / (y * y);
    let mut r = (((((0.075_757_575_757_576 * p - 0.033_333_333_333_333) * p + 0.023_809_523_809_523_8) * p
        - 0.033_333_333_333_333)
        * p
        + 0.166_666_666_666_667)
        * p
        + 1.0)
        / y
        + 0.5 * p;
    for _ in 0..6 {
        y -= 1.0;
        r += 1.0 / (y * y);
    }
    r
}

/// log(exp(a) + exp(b)) without overflow.
#[inline]
pub fn log_sum(log_a: f64, log_b: f64) -> f64 {
    if log_a < log_b {
        log_b + (1.0 + (log_a - log_b).exp()).ln()
    } else {
        log_a + (1.0 + (log_b - log_a).exp()).ln()
    }
}
