//! Request path normalization.
//!
//! Archive keys are relative paths without a leading separator. Directory
//! requests resolve to their `index.html`:
//!
//! | Request | Key |
//! |---|---|
//! | `/` | `index.html` |
//! | `/docs/` | `docs/index.html` |
//! | `/css/site.css` | `css/site.css` |
//!
//! Percent-decoding happens before this step, at the HTTP layer.

/// File served for directory requests
pub const DIRECTORY_INDEX: &str = "index.html";

/// Extension assumed when a path has none
pub const DEFAULT_EXTENSION: &str = "html";

/// Normalize a request path into an archive key.
///
/// Strips one leading `/` and appends [`DIRECTORY_INDEX`] to empty paths and
/// paths ending in `/`.
pub fn normalize(path: &str) -> String {
    let relative = path.strip_prefix('/').unwrap_or(path);
    if relative.is_empty() || relative.ends_with('/') {
        format!("{relative}{DIRECTORY_INDEX}")
    } else {
        relative.to_string()
    }
}

/// Extension of a normalized key, used for MIME typing.
///
/// The extension is whatever follows the last `.` of the final path segment.
/// A segment that only starts with a dot (`.htaccess`) has no extension, and
/// neither does one ending in a dot. Both fall back to [`DEFAULT_EXTENSION`].
pub fn extension(key: &str) -> &str {
    let name = key.rsplit('/').next().unwrap_or(key);
    match name.rfind('.') {
        Some(0) | None => DEFAULT_EXTENSION,
        Some(dot) if dot + 1 == name.len() => DEFAULT_EXTENSION,
        Some(dot) => &name[dot + 1..],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_root() {
        assert_eq!(normalize("/"), "index.html");
        assert_eq!(normalize(""), "index.html");
    }

    #[test]
    fn test_normalize_directory() {
        assert_eq!(normalize("/docs/"), "docs/index.html");
        assert_eq!(normalize("/a/b/c/"), "a/b/c/index.html");
    }

    #[test]
    fn test_normalize_file() {
        assert_eq!(normalize("/css/site.css"), "css/site.css");
        assert_eq!(normalize("robots.txt"), "robots.txt");
    }

    #[test]
    fn test_normalize_strips_one_separator() {
        assert_eq!(normalize("//x"), "/x");
    }

    #[test]
    fn test_extension() {
        assert_eq!(extension("css/site.css"), "css");
        assert_eq!(extension("archive.tar.gz"), "gz");
        assert_eq!(extension("index.html"), "html");
        assert_eq!(extension("README"), "html");
        assert_eq!(extension("conf/.htaccess"), "html");
        assert_eq!(extension("v1.2/LICENSE"), "html");
        assert_eq!(extension("trailing."), "html");
    }
}
