//! Home-relative path resolution.
//!
//! User-supplied paths may begin with a home placeholder (`~` or
//! `%HOME%`). Every component resolves them to absolute form before
//! use; placeholder forms are never stored internally.

use std::path::{Path, PathBuf};

/// Placeholder used for shortened display paths.
const HOME_TOKEN: &str = "~";
/// Environment-style placeholder accepted on input.
const HOME_ENV_TOKEN: &str = "%HOME%";

/// Expand a leading home placeholder to the user's home directory.
///
/// Both `~` and `%HOME%` prefixes are substituted; paths without a
/// placeholder pass through unchanged. If the home directory cannot be
/// determined the input is returned as-is.
pub fn resolve_home(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let Some(home) = dirs::home_dir() else {
        return path.to_path_buf();
    };

    let raw = path.to_string_lossy();
    for token in [HOME_TOKEN, HOME_ENV_TOKEN] {
        // The token must be the whole first segment: `~foo` is a
        // sibling-style name, not a home reference.
        if let Some(rest) = raw.strip_prefix(token) {
            if rest.is_empty() || rest.starts_with(['/', '\\']) {
                let rest = rest.trim_start_matches(['/', '\\']);
                return if rest.is_empty() { home } else { home.join(rest) };
            }
        }
    }
    path.to_path_buf()
}

/// Replace a home-directory prefix with the `~` placeholder.
///
/// The left inverse of [`resolve_home`] for paths inside the home
/// directory; paths outside it pass through unchanged.
pub fn shorten_home(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let Some(home) = dirs::home_dir() else {
        return path.to_path_buf();
    };

    match path.strip_prefix(&home) {
        Ok(rest) if rest.as_os_str().is_empty() => PathBuf::from(HOME_TOKEN),
        Ok(rest) => PathBuf::from(HOME_TOKEN).join(rest),
        Err(_) => path.to_path_buf(),
    }
}
