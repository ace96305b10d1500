//! Project-specific utilities live here.

/// Returns `value` unless it is absent, empty, or only whitespace.
///
/// The value is passed through untrimmed.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
