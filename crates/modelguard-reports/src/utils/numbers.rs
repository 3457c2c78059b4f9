const UNITS: [(usize, &str); 3] = [(1_000_000_000, "B"), (1_000_000, "M"), (1_000, "K")];

/// Abbreviate a count for display: `4536` becomes `4.5K`.
pub fn format_numbers(n: usize) -> String {
    UNITS
        .iter()
        .find(|(scale, _)| n > *scale)
        .map(|(scale, suffix)| format!("{:.1}{suffix}", n as f64 / *scale as f64))
        .unwrap_or_else(|| n.to_string())
}
