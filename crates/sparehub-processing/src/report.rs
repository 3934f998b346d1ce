//! Ingestion report: counts plus row-ordered error messages.

use sparehub_core::models::IngestionProgress;
use std::fmt::Display;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
enum RowOutcome {
    Inserted { row: usize, id: Uuid },
    /// Passed every check but was not written (dry run)
    Accepted { row: usize },
    Rejected { row: usize, reason: String },
}

impl RowOutcome {
    fn row(&self) -> usize {
        match self {
            RowOutcome::Inserted { row, .. }
            | RowOutcome::Accepted { row }
            | RowOutcome::Rejected { row, .. } => *row,
        }
    }
}

/// Final summary returned to the seller
#[derive(Debug, Clone, PartialEq)]
pub struct IngestionReport {
    pub progress: IngestionProgress,
    /// Ids of inserted products, in row order
    pub product_ids: Vec<Uuid>,
}

/// Collects one outcome per row in any order and emits them sorted by row.
#[derive(Debug)]
pub struct ReportBuilder {
    total: usize,
    outcomes: Vec<RowOutcome>,
}

impl ReportBuilder {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            outcomes: Vec::with_capacity(total),
        }
    }

    pub fn record_inserted(&mut self, row: usize, id: Uuid) {
        self.outcomes.push(RowOutcome::Inserted { row, id });
    }

    pub fn record_accepted(&mut self, row: usize) {
        self.outcomes.push(RowOutcome::Accepted { row });
    }

    pub fn record_failure(&mut self, row: usize, reason: impl Display) {
        self.outcomes.push(RowOutcome::Rejected {
            row,
            reason: reason.to_string(),
        });
    }

    pub fn build(mut self) -> IngestionReport {
        self.outcomes.sort_by_key(RowOutcome::row);
        debug_assert_eq!(self.outcomes.len(), self.total, "one outcome per row");

        let mut progress = IngestionProgress {
            total: self.total,
            ..Default::default()
        };
        let mut product_ids = Vec::new();

        for outcome in self.outcomes {
            match outcome {
                RowOutcome::Inserted { id, .. } => {
                    progress.success += 1;
                    product_ids.push(id);
                }
                RowOutcome::Accepted { .. } => progress.success += 1,
                RowOutcome::Rejected { row, reason } => {
                    progress.failed += 1;
                    progress.errors.push(format!("Row {row}: {reason}"));
                }
            }
        }

        IngestionReport {
            progress,
            product_ids,
        }
    }

    /// Report for an all-or-nothing batch that was rolled back: every row counts
    /// as failed and `reason` is the only error.
    pub fn aborted(total: usize, reason: impl Display) -> IngestionReport {
        IngestionReport {
            progress: IngestionProgress {
                total,
                success: 0,
                failed: total,
                errors: vec![reason.to_string()],
            },
            product_ids: Vec::new(),
        }
    }
}
