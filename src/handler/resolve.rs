//! Request path resolution
//!
//! Turns the raw URL path into a filesystem path confined to the output root.
//! Decoding happens first, then joining, then the safety checks, and only
//! then is anything on disk touched.

use percent_encoding::percent_decode_str;
use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

/// Request path that must not reach the filesystem (answered with 400)
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathSecurityViolation {
    #[error("request path is not valid UTF-8 once decoded")]
    InvalidEncoding,
    #[error("request path contains a null byte")]
    NullByte,
    #[error("request path contains a parent directory segment")]
    ParentSegment,
    #[error("request path resolves outside the output root")]
    OutsideRoot,
}

/// The parts of a stat result the responders need
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub size: u64,
    pub modified: SystemTime,
    pub is_dir: bool,
}

impl From<&Metadata> for FileStat {
    fn from(meta: &Metadata) -> Self {
        Self {
            size: meta.len(),
            modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            is_dir: meta.is_dir(),
        }
    }
}

/// Outcome of resolving a safe request path
#[derive(Debug)]
pub enum ResolvedTarget {
    /// Nothing at that path; the stat error is kept for the next handler
    NotFound(io::Error),
    Directory {
        path: PathBuf,
        /// Whether the request path ended in `/`
        trailing_slash: bool,
    },
    File {
        path: PathBuf,
        stat: FileStat,
    },
}

/// Resolve a raw (still percent-encoded, query-free) URL path under `root`
pub async fn resolve(root: &Path, raw_path: &str) -> Result<ResolvedTarget, PathSecurityViolation> {
    let (path, trailing_slash) = confine(root, raw_path)?;

    let meta = match tokio::fs::metadata(&path).await {
        Ok(meta) => meta,
        Err(e) => return Ok(ResolvedTarget::NotFound(e)),
    };

    if meta.is_dir() {
        Ok(ResolvedTarget::Directory {
            path,
            trailing_slash,
        })
    } else {
        Ok(ResolvedTarget::File {
            stat: FileStat::from(&meta),
            path,
        })
    }
}

/// Decode and join `raw_path` onto `root`, rejecting anything unsafe
///
/// Returns the joined path and whether the decoded path ended in `/`.
pub fn confine(root: &Path, raw_path: &str) -> Result<(PathBuf, bool), PathSecurityViolation> {
    let decoded = percent_decode_str(raw_path)
        .decode_utf8()
        .map_err(|_| PathSecurityViolation::InvalidEncoding)?;

    if decoded.contains('\0') {
        return Err(PathSecurityViolation::NullByte);
    }

    let mut path = root.to_path_buf();
    for segment in decoded.split(|c: char| c == '/' || std::path::is_separator(c)) {
        match segment {
            "" | "." => {}
            ".." => return Err(PathSecurityViolation::ParentSegment),
            segment => path.push(segment),
        }
    }

    // Catches segments the platform treats as roots or prefixes (e.g. `C:`)
    if !path.starts_with(root) {
        return Err(PathSecurityViolation::OutsideRoot);
    }

    Ok((path, decoded.ends_with('/')))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> PathBuf {
        if cfg!(windows) {
            PathBuf::from(r"C:\srv\dist")
        } else {
            PathBuf::from("/srv/dist")
        }
    }

    #[test]
    fn test_plain_paths_join_under_root() {
        let (path, slash) = confine(&root(), "/assets/app.js").unwrap();
        assert_eq!(path, root().join("assets").join("app.js"));
        assert!(!slash);

        let (path, slash) = confine(&root(), "/").unwrap();
        assert_eq!(path, root());
        assert!(slash);

        let (_, slash) = confine(&root(), "/assets/").unwrap();
        assert!(slash);
    }

    #[test]
    fn test_percent_decoding() {
        let (path, _) = confine(&root(), "/my%20file.txt").unwrap();
        assert_eq!(path, root().join("my file.txt"));
    }

    #[test]
    fn test_traversal_is_rejected() {
        for raw in [
            "/../etc/passwd",
            "/assets/../../etc/passwd",
            "/%2e%2e/etc/passwd",
            "/assets/%2E%2E/%2E%2E/secret",
            "/..%2fetc%2fpasswd",
            "/a/../b",
        ] {
            assert_eq!(
                confine(&root(), raw),
                Err(PathSecurityViolation::ParentSegment),
                "{raw}"
            );
        }
    }

    #[test]
    fn test_null_byte_is_rejected() {
        assert_eq!(
            confine(&root(), "/index.html%00.png"),
            Err(PathSecurityViolation::NullByte)
        );
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        assert_eq!(
            confine(&root(), "/%ff%fe"),
            Err(PathSecurityViolation::InvalidEncoding)
        );
    }

    #[test]
    fn test_dot_segments_are_dropped() {
        let (path, _) = confine(&root(), "/./assets//./app.js").unwrap();
        assert_eq!(path, root().join("assets").join("app.js"));
    }

    #[tokio::test]
    async fn test_resolve_kinds() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir(tmp.path().join("docs")).unwrap();
        std::fs::write(tmp.path().join("a.txt"), b"hello").unwrap();

        match resolve(tmp.path(), "/a.txt").await.unwrap() {
            ResolvedTarget::File { stat, .. } => {
                assert_eq!(stat.size, 5);
                assert!(!stat.is_dir);
            }
            other => panic!("expected file, got {other:?}"),
        }

        assert!(matches!(
            resolve(tmp.path(), "/docs").await.unwrap(),
            ResolvedTarget::Directory { trailing_slash: false, .. }
        ));

        match resolve(tmp.path(), "/missing.txt").await.unwrap() {
            ResolvedTarget::NotFound(e) => assert_eq!(e.kind(), io::ErrorKind::NotFound),
            other => panic!("expected not found, got {other:?}"),
        }
    }
}
