//! Currency rounding
//!
//! Every accumulation step rounds to cents, so intermediate rounding is part of
//! the observable result and not just a presentation detail.

/// Round a currency amount to 2 decimal places (infinite values pass through)
pub fn round_cents(amount: f64) -> f64 {
    if !amount.is_finite() {
        return amount;
    }
    (amount * 100.0).round() / 100.0
}

/// Add two currency amounts and round the sum to cents
pub fn add_cents(a: f64, b: f64) -> f64 {
    round_cents(a + b)
}

/// Subtract `b` from `a` and round the difference to cents
pub fn sub_cents(a: f64, b: f64) -> f64 {
    round_cents(a - b)
}
