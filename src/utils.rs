//! Path helpers shared by discovery and impact resolution
//!
//! Module paths and changed files are compared as repository-relative strings
//! with forward slashes, the same shape `git diff --name-only` prints.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// How path containment is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathMatching {
  /// Compare whole `/`-separated segments: `modules/ab` is not under `modules/a`
  #[default]
  Segment,
  /// Raw string prefix and substring tests
  Prefix,
}

impl PathMatching {
  /// Whether `path` lies under (or is) `base`.
  pub fn is_under(self, path: &str, base: &str) -> bool {
    match self {
      PathMatching::Prefix => path.starts_with(base),
      PathMatching::Segment => {
        if base.is_empty() {
          return true;
        }
        match path.strip_prefix(base) {
          Some(rest) => rest.is_empty() || rest.starts_with('/'),
          None => false,
        }
      }
    }
  }

  /// Whether `needle` occurs inside `haystack`.
  ///
  /// In segment mode the needle's segments must appear as a contiguous run of
  /// the haystack's segments.
  pub fn contains(self, haystack: &str, needle: &str) -> bool {
    match self {
      PathMatching::Prefix => haystack.contains(needle),
      PathMatching::Segment => {
        let needle: Vec<&str> = segments(needle).collect();
        if needle.is_empty() {
          return false;
        }
        let hay: Vec<&str> = segments(haystack).collect();
        hay.windows(needle.len()).any(|w| w == needle.as_slice())
      }
    }
  }

  /// Whether `path` names a file called `file_name`.
  pub fn names_file(self, path: &str, file_name: &str) -> bool {
    match self {
      PathMatching::Prefix => path.ends_with(file_name),
      PathMatching::Segment => base_name(path) == file_name,
    }
  }
}

/// Non-empty, non-`.` segments of a slash path.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
  path.split('/').filter(|s| !s.is_empty() && *s != ".")
}

/// Last segment of a slash path (empty for the root).
pub fn base_name(path: &str) -> &str {
  path.rsplit('/').next().unwrap_or("")
}

/// Parent of a slash path (empty for top-level entries).
pub fn parent_dir(path: &str) -> &str {
  match path.rsplit_once('/') {
    Some((parent, _)) => parent,
    None => "",
  }
}

/// Normalize a repository-relative path: forward slashes, no `./`, no
/// duplicate or trailing separators.
pub fn normalize_rel(path: &str) -> String {
  let unified = path.replace('\\', "/");
  segments(&unified).collect::<Vec<_>>().join("/")
}

/// Join `fragment` onto directory `base` and fold `.`/`..` lexically.
///
/// Returns `None` when the result would climb above the repository root.
pub fn join_normalized(base: &str, fragment: &str) -> Option<String> {
  let fragment = fragment.replace('\\', "/");
  let mut stack: Vec<&str> = if fragment.starts_with('/') {
    Vec::new()
  } else {
    segments(base).collect()
  };

  for part in fragment.split('/') {
    match part {
      "" | "." => {}
      ".." => {
        stack.pop()?;
      }
      other => stack.push(other),
    }
  }

  Some(stack.join("/"))
}

/// Convert a filesystem path to slash form
///
/// Git prints paths with forward slashes, even on Windows.
pub fn path_to_slash(path: &Path) -> String {
  #[cfg(target_os = "windows")]
  {
    path.to_string_lossy().replace('\\', "/")
  }
  #[cfg(not(target_os = "windows"))]
  {
    path.to_string_lossy().to_string()
  }
}
