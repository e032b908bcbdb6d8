//! Input boundary: text-to-number coercion
//!
//! Every numeric field a user edits passes through [`parse_or_default`].
//! Empty, malformed or non-finite text becomes `0.0`, so an input record
//! only ever holds finite numbers and the formula layer never sees NaN.

/// Parse user-entered text into a finite number, defaulting to `0.0`
///
/// Surrounding whitespace and digit-group separators (`,` and `_`) are ignored.
/// `"inf"`, `"NaN"` and overflowing literals all coerce to zero.
pub fn parse_or_default(raw: &str) -> f64 {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '_')
        .collect();

    match cleaned.parse::<f64>() {
        Ok(value) => finite_or_zero(value),
        Err(_) => 0.0,
    }
}

/// Replace NaN and infinities with zero
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Coerce a percentage into the stored [0, 100] range
pub fn clamp_percent(value: f64) -> f64 {
    finite_or_zero(value).clamp(0.0, 100.0)
}
