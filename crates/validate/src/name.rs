//! The artifact naming grammar shared by every kind.

use regex::Regex;
use std::sync::LazyLock;

/// Longest accepted artifact name.
pub const MAX_NAME_LENGTH: usize = 64;

static NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9]*(-[a-z0-9]+)*$").expect("valid regex"));

/// Returns true if `name` is a valid artifact name.
pub fn is_valid_name(name: &str) -> bool {
    name_problem(name).is_none()
}

/// Describes why `name` is invalid, or `None` if it is fine.
pub fn name_problem(name: &str) -> Option<String> {
    if name.is_empty() {
        return Some("name is required".to_string());
    }
    if name.len() > MAX_NAME_LENGTH {
        return Some(format!(
            "name is {} characters; the maximum is {MAX_NAME_LENGTH}",
            name.len()
        ));
    }
    if !NAME_REGEX.is_match(name) {
        return Some(
            "name must be lowercase letters and digits separated by single hyphens, starting with a letter"
                .to_string(),
        );
    }
    None
}
