//! Keyspace path helpers.

/// Separator between keyspace path segments.
pub const SEPARATOR: char = '/';

/// Strip leading and trailing separators from a listing key.
///
/// Vault marks sub-collections with a trailing `/` (`"app/"`); the
/// canonical path never carries it.
///
/// # Example
///
/// ```
/// use vaultviz::string_utils::trim_separators;
///
/// assert_eq!(trim_separators("app/"), "app");
/// assert_eq!(trim_separators("/app/db/"), "app/db");
/// assert_eq!(trim_separators("token"), "token");
/// ```
pub fn trim_separators(key: &str) -> &str {
    key.trim_matches(SEPARATOR)
}

/// Join two path fragments with exactly one separator.
///
/// Empty fragments are dropped, so joining onto an empty base yields the
/// relative part unchanged.
///
/// # Example
///
/// ```
/// use vaultviz::string_utils::join_path;
///
/// assert_eq!(join_path("secret", "app/"), "secret/app");
/// assert_eq!(join_path("secret/", "/app"), "secret/app");
/// assert_eq!(join_path("", "app"), "app");
/// ```
pub fn join_path(base: &str, relative: &str) -> String {
    let base = base.trim_end_matches(SEPARATOR);
    let relative = trim_separators(relative);
    match (base.is_empty(), relative.is_empty()) {
        (true, _) => relative.to_string(),
        (false, true) => base.to_string(),
        (false, false) => format!("{}{}{}", base, SEPARATOR, relative),
    }
}

/// Last non-empty segment of a path.
///
/// # Example
///
/// ```
/// use vaultviz::string_utils::last_segment;
///
/// assert_eq!(last_segment("secret/app/db-password"), "db-password");
/// assert_eq!(last_segment("secret/app/"), "app");
/// assert_eq!(last_segment("secret"), "secret");
/// ```
pub fn last_segment(path: &str) -> &str {
    let trimmed = path.trim_end_matches(SEPARATOR);
    trimmed.rsplit(SEPARATOR).next().unwrap_or(trimmed)
}
