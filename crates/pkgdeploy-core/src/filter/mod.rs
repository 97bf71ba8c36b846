//! Filter validation: the change-control gate a package must pass before
//! any install.
//!
//! A declared root is covered when it *contains* at least one non-empty
//! reference line as a substring. The declared root is the haystack and the
//! reference line the needle, so `/content/site` approves
//! `/content/site/en` but not the other way round.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::DeployError;

/// Approved filter prefixes for one (group, project) pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceFilterSet {
    source: Option<PathBuf>,
    lines: Vec<String>,
}

impl ReferenceFilterSet {
    /// Build from in-memory lines; blank lines are dropped.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            source: None,
            lines: lines
                .into_iter()
                .map(|l| l.as_ref().trim().to_string())
                .filter(|l| !l.is_empty())
                .collect(),
        }
    }

    /// Read a reference list, one prefix per line.
    pub fn load(path: &Path) -> Result<Self, DeployError> {
        let content = std::fs::read_to_string(path).map_err(|e| DeployError::io(path, e))?;
        let mut set = Self::from_lines(content.lines());
        set.source = Some(path.to_path_buf());
        Ok(set)
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// First reference line contained in `root`, if any.
    pub fn matching_line(&self, root: &str) -> Option<&str> {
        self.lines
            .iter()
            .map(String::as_str)
            .find(|line| !line.is_empty() && root.contains(line))
    }
}

/// Outcome for one declared root
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RootMatch {
    pub root: String,
    /// Reference line that covered the root
    pub matched_by: Option<String>,
}

/// Per-root validation result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterReport {
    pub roots: Vec<RootMatch>,
}

impl FilterReport {
    /// Valid iff every declared root is covered. No declared roots is valid.
    pub fn is_valid(&self) -> bool {
        self.roots.iter().all(|r| r.matched_by.is_some())
    }

    pub fn unmatched(&self) -> Vec<&str> {
        self.roots
            .iter()
            .filter(|r| r.matched_by.is_none())
            .map(|r| r.root.as_str())
            .collect()
    }
}

/// Check every declared root against the reference set.
pub fn check<S: AsRef<str>>(declared: &[S], reference: &ReferenceFilterSet) -> FilterReport {
    FilterReport {
        roots: declared
            .iter()
            .map(|root| {
                let root = root.as_ref();
                RootMatch {
                    root: root.to_string(),
                    matched_by: reference.matching_line(root).map(str::to_string),
                }
            })
            .collect(),
    }
}

/// True iff every declared root contains at least one reference line.
///
/// An empty `declared` slice validates: zero roots need matching.
pub fn validate<S: AsRef<str>>(declared: &[S], reference: &ReferenceFilterSet) -> bool {
    check(declared, reference).is_valid()
}

/// Validate against the reference list at `reference_path`, failing closed
/// when the list cannot be read.
pub fn validate_against_file<S: AsRef<str>>(
    declared: &[S],
    reference_path: &Path,
    group: &str,
    project: &str,
) -> Result<FilterReport, DeployError> {
    let reference =
        ReferenceFilterSet::load(reference_path).map_err(|e| DeployError::FilterMismatch {
            group: group.to_string(),
            project: project.to_string(),
            detail: format!("reference list unavailable ({e})"),
        })?;

    let report = check(declared, &reference);
    if !report.is_valid() {
        return Err(DeployError::FilterMismatch {
            group: group.to_string(),
            project: project.to_string(),
            detail: format!(
                "roots not covered by {}: {}",
                reference_path.display(),
                report.unmatched().join(", ")
            ),
        });
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(lines: &[&str]) -> ReferenceFilterSet {
        ReferenceFilterSet::from_lines(lines)
    }

    #[test]
    fn prefix_line_covers_deeper_root() {
        assert!(validate(&["/content/site/en"], &reference(&["/content/site"])));
    }

    #[test]
    fn unrelated_root_fails() {
        assert!(!validate(&["/content/other"], &reference(&["/content/site"])));
    }

    #[test]
    fn containment_is_one_directional() {
        assert!(!validate(&["/content/site"], &reference(&["/content/site/en"])));
    }

    #[test]
    fn every_root_must_match() {
        let refs = reference(&["/content/site", "/apps/site"]);
        assert!(validate(&["/content/site/en", "/apps/site/components"], &refs));
        assert!(!validate(&["/content/site/en", "/etc/designs/site"], &refs));
    }

    #[test]
    fn empty_declared_roots_validate() {
        let none: [&str; 0] = [];
        assert!(validate(&none, &reference(&["/content/site"])));
        assert!(validate(&none, &reference(&[])));
    }

    #[test]
    fn blank_reference_lines_never_match() {
        let refs = reference(&["", "   ", "\t"]);
        assert!(refs.lines().is_empty());
        assert!(!validate(&["/content/site"], &refs));
    }

    #[test]
    fn duplicate_roots_each_count() {
        let refs = reference(&["/content/site"]);
        let report = check(&["/content/site/en", "/content/site/en"], &refs);
        assert_eq!(report.roots.len(), 2);
        assert!(report.is_valid());
    }

    #[test]
    fn report_lists_unmatched_roots() {
        let report = check(&["/content/site/en", "/content/other"], &reference(&["/content/site"]));
        assert_eq!(report.unmatched(), vec!["/content/other"]);
        assert_eq!(
            report.roots[0].matched_by.as_deref(),
            Some("/content/site")
        );
    }
}
