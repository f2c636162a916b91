//! Table formatting utilities for CLI output.

/// Truncates a string to at most `max_len` characters, adding "..." if
/// needed.
///
/// ```rust
/// use mcpvisor_cli::presentation::truncate_string;
///
/// assert_eq!(truncate_string("Hello", 10), "Hello");
/// assert_eq!(truncate_string("Hello World", 8), "Hello...");
/// ```
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Print a horizontal separator line.
pub fn print_separator(width: usize) {
    println!("{}", "-".repeat(width));
}

/// Format an optional value for table display, returning a default if None.
pub fn format_optional<T: std::fmt::Display>(value: Option<&T>, default: &str) -> String {
    value.map_or_else(|| default.to_string(), ToString::to_string)
}

pub const fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_string_exact_length() {
        assert_eq!(truncate_string("exactly10c", 10), "exactly10c");
    }

    #[test]
    fn test_truncate_string_needs_truncation() {
        assert_eq!(truncate_string("this is a very long string", 10), "this is...");
    }

    #[test]
    fn test_truncate_string_multibyte() {
        assert_eq!(truncate_string("ééééééé", 5), "éé...");
    }

    #[test]
    fn test_format_optional() {
        assert_eq!(format_optional(Some(&3), "--"), "3");
        assert_eq!(format_optional::<u32>(None, "--"), "--");
    }
}
