//! Shared CLI presentation utilities.
//!
//! Format-only helpers; no domain logic.

pub mod provider_display;
pub mod tables;

pub use provider_display::{command_line, event_line, print_test_result};
pub use tables::{format_optional, print_separator, truncate_string, yes_no};
