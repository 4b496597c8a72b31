//! Numeric formatting shared by the differ and the renderer.

/// Format a signed score delta for display.
///
/// Positive deltas gain a `+` prefix, negative deltas keep the minus sign of
/// the number itself, and zero renders as `"0"`. No rounding is applied
/// beyond what the caller already did.
///
/// # Examples
///
/// ```
/// use lhimpact_report::format::format_numeric_diff;
///
/// assert_eq!(format_numeric_diff(1.5), "+1.5");
/// assert_eq!(format_numeric_diff(-1.5), "-1.5");
/// assert_eq!(format_numeric_diff(0.0), "0");
/// ```
pub fn format_numeric_diff(delta: f64) -> String {
    if delta > 0.0 {
        format!("+{delta}")
    } else if delta < 0.0 {
        format!("{delta}")
    } else {
        "0".to_string()
    }
}

/// Round a score to two decimal places.
///
/// Applied identically to both reports' scores before comparison or display
/// so neither side gains spurious precision.
///
/// # Examples
///
/// ```
/// use lhimpact_report::format::round_two;
///
/// assert_eq!(round_two(0.004999), 0.0);
/// assert_eq!(round_two(0.955), 0.96);
/// ```
pub fn round_two(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
