use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::record::Record;

/// Classification of a single diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffMode {
    Unchanged,
    Created,
    Updated,
    Deleted,
}

impl DiffMode {
    /// Returns the lower-case name of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            DiffMode::Unchanged => "unchanged",
            DiffMode::Created => "created",
            DiffMode::Updated => "updated",
            DiffMode::Deleted => "deleted",
        }
    }
}

impl fmt::Display for DiffMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DiffMode::Unchanged => "Unchanged",
            DiffMode::Created => "Created",
            DiffMode::Updated => "Updated",
            DiffMode::Deleted => "Deleted",
        };

        f.write_str(label)
    }
}

/// Outcome of comparing one record id across the source and the destination.
///
/// Each variant carries exactly the records its classification allows.
#[derive(Debug, Clone, PartialEq)]
pub enum Diff {
    /// The record exists only in the destination.
    Created { dst: Record },
    /// The record exists only in the source.
    Deleted { src: Record },
    /// The record exists on both sides with equal content.
    Unchanged { src: Record, dst: Record },
    /// The record exists on both sides with different content.
    Updated { src: Record, dst: Record },
}

impl Diff {
    /// Compares two records sharing the same id.
    pub fn compare(src: Record, dst: Record) -> Self {
        if src.content == dst.content {
            Diff::Unchanged { src, dst }
        } else {
            Diff::Updated { src, dst }
        }
    }

    pub fn mode(&self) -> DiffMode {
        match self {
            Diff::Created { .. } => DiffMode::Created,
            Diff::Deleted { .. } => DiffMode::Deleted,
            Diff::Unchanged { .. } => DiffMode::Unchanged,
            Diff::Updated { .. } => DiffMode::Updated,
        }
    }

    /// Returns the source record, absent for [`Diff::Created`].
    pub fn src(&self) -> Option<&Record> {
        match self {
            Diff::Created { .. } => None,
            Diff::Deleted { src } | Diff::Unchanged { src, .. } | Diff::Updated { src, .. } => {
                Some(src)
            }
        }
    }

    /// Returns the destination record, absent for [`Diff::Deleted`].
    pub fn dst(&self) -> Option<&Record> {
        match self {
            Diff::Deleted { .. } => None,
            Diff::Created { dst } | Diff::Unchanged { dst, .. } | Diff::Updated { dst, .. } => {
                Some(dst)
            }
        }
    }

    /// Returns the relevant id: the source id when present, otherwise the destination id.
    pub fn id(&self) -> &str {
        match self {
            Diff::Created { dst } => &dst.id,
            Diff::Deleted { src } | Diff::Unchanged { src, .. } | Diff::Updated { src, .. } => {
                &src.id
            }
        }
    }
}

/// One of the two inputs of a diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Source,
    Destination,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Source => "source",
            Side::Destination => "destination",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Number of diffs emitted per classification during a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    pub unchanged: u64,
    pub created: u64,
    pub updated: u64,
    pub deleted: u64,
}

impl DiffSummary {
    /// Counts one diff of the given mode.
    pub fn record(&mut self, mode: DiffMode) {
        match mode {
            DiffMode::Unchanged => self.unchanged += 1,
            DiffMode::Created => self.created += 1,
            DiffMode::Updated => self.updated += 1,
            DiffMode::Deleted => self.deleted += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.unchanged + self.created + self.updated + self.deleted
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn compare_classifies_by_content() {
        let unchanged = Diff::compare(
            Record::new("1", json!({"X": 599})),
            Record::new("1", json!({"X": 599})),
        );
        assert_eq!(unchanged.mode(), DiffMode::Unchanged);

        let updated = Diff::compare(
            Record::new("1", json!({"X": 599})),
            Record::new("1", json!({"X": 600})),
        );
        assert_eq!(updated.mode(), DiffMode::Updated);
        assert_eq!(updated.id(), "1");
    }

    #[test]
    fn accessors_follow_variant_shape() {
        let created = Diff::Created {
            dst: Record::new("2", json!(null)),
        };
        assert!(created.src().is_none());
        assert_eq!(created.dst().map(|r| r.id.as_str()), Some("2"));
        assert_eq!(created.id(), "2");

        let deleted = Diff::Deleted {
            src: Record::new("3", json!(null)),
        };
        assert!(deleted.dst().is_none());
        assert_eq!(deleted.id(), "3");
    }

    #[test]
    fn mode_labels() {
        assert_eq!(DiffMode::Updated.to_string(), "Updated");
        assert_eq!(DiffMode::Updated.as_str(), "updated");
        assert_eq!(Side::Destination.to_string(), "destination");
    }

    #[test]
    fn summary_counts_per_mode() {
        let mut summary = DiffSummary::default();
        summary.record(DiffMode::Created);
        summary.record(DiffMode::Created);
        summary.record(DiffMode::Deleted);

        assert_eq!(summary.created, 2);
        assert_eq!(summary.deleted, 1);
        assert_eq!(summary.total(), 3);
    }
}
