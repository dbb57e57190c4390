//! Utility functions for path manipulation.

/// Expands a leading `~/` prefix to the user's home directory.
///
/// If the `HOME` environment variable is not set, the function returns the
/// input string unchanged.
///
/// # Examples
///
/// ```
/// # use fleetprov::session::expand_tilde;
/// assert_eq!(expand_tilde("/etc/ssh/id_ed25519"), "/etc/ssh/id_ed25519");
/// ```
#[must_use]
pub fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = std::env::var_os("HOME")
    {
        return format!("{}/{rest}", home.to_string_lossy());
    }
    path.to_owned()
}
