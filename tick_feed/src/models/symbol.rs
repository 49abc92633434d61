//! Instrument symbols.

/// Symbols offered by the chart's instrument picker.
pub const FEATURED_SYMBOLS: [&str; 5] = ["HBL", "UBL", "MCB", "HUBC", "FFC"];

/// Canonical form of a user- or config-supplied symbol: trimmed and upper-cased.
///
/// Returns `None` for blank input.
pub fn normalize_symbol(raw: &str) -> Option<String> {
    let s = raw.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_uppercase())
    }
}
