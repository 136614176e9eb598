//! Batch definitions: several products processed under one configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::backend::BackendKind;

/// Unique identifier for a batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(pub String);

impl BatchId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of one item within a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BatchItemStatus {
    #[default]
    Pending,
    Processing,
    Success,
    Failed,
}

impl BatchItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchItemStatus::Pending => "pending",
            BatchItemStatus::Processing => "processing",
            BatchItemStatus::Success => "success",
            BatchItemStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchItemStatus::Success | BatchItemStatus::Failed)
    }
}

/// Overall batch status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    #[default]
    Pending,
    Processing,
    Done,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Pending => "pending",
            BatchStatus::Processing => "processing",
            BatchStatus::Done => "done",
        }
    }
}

/// One product within a batch. Owned by its parent `Batch`; mirrored into
/// the job store only once it reaches a terminal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItem {
    /// Item ID; doubles as the mirrored job ID in history
    pub item_id: String,
    /// Product name
    pub product_name: String,
    /// Selling points, trimmed and non-empty
    pub selling_points: Vec<String>,
    /// Item status
    #[serde(default)]
    pub status: BatchItemStatus,
    /// Error text (failed items only)
    #[serde(default)]
    pub error: String,
    /// Output video path (successful items only)
    #[serde(default)]
    pub video_path: String,
}

impl BatchItem {
    pub fn new(product_name: impl Into<String>, selling_points: Vec<String>) -> Self {
        Self {
            item_id: Uuid::new_v4().to_string(),
            product_name: product_name.into(),
            selling_points,
            status: BatchItemStatus::Pending,
            error: String::new(),
            video_path: String::new(),
        }
    }
}

/// A client-submitted group of products processed sequentially under a
/// shared configuration. Lives only in process memory while running.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    /// Unique batch ID
    pub batch_id: BatchId,
    /// Items in processing order
    pub items: Vec<BatchItem>,
    /// Generation backend shared by all items
    #[serde(default)]
    pub backend: BackendKind,
    /// Burn subtitles into every output
    #[serde(default)]
    pub add_subtitle: bool,
    /// Mix background music into every output
    #[serde(default)]
    pub add_bgm: bool,
    /// Optional reference image shared by all items
    #[serde(default)]
    pub reference_image_path: String,
    /// Batch status
    #[serde(default)]
    pub status: BatchStatus,
    /// Number of items that reached `success`
    #[serde(default)]
    pub completed: u32,
    /// Number of items that reached `failed`
    #[serde(default)]
    pub failed: u32,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Batch {
    pub fn new(
        items: Vec<BatchItem>,
        backend: BackendKind,
        add_subtitle: bool,
        add_bgm: bool,
        reference_image_path: impl Into<String>,
    ) -> Self {
        Self {
            batch_id: BatchId::new(),
            items,
            backend,
            add_subtitle,
            add_bgm,
            reference_image_path: reference_image_path.into(),
            status: BatchStatus::Pending,
            completed: 0,
            failed: 0,
            created_at: Utc::now(),
        }
    }

    /// Total item count (derived, not stored).
    pub fn total(&self) -> u32 {
        self.items.len() as u32
    }

    /// Invariant check: counters never exceed the item count, and a done
    /// batch has fully accounted for every item.
    pub fn counters_consistent(&self) -> bool {
        let sum = self.completed + self.failed;
        match self.status {
            BatchStatus::Done => sum == self.total(),
            _ => sum <= self.total(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch_of(n: usize) -> Batch {
        let items = (0..n)
            .map(|i| BatchItem::new(format!("Product {i}"), vec!["point".to_string()]))
            .collect();
        Batch::new(items, BackendKind::Seedance, false, false, "")
    }

    #[test]
    fn test_batch_starts_pending() {
        let batch = batch_of(3);
        assert_eq!(batch.status, BatchStatus::Pending);
        assert_eq!(batch.total(), 3);
        assert!(batch.counters_consistent());
    }

    #[test]
    fn test_counters_consistency() {
        let mut batch = batch_of(2);
        batch.status = BatchStatus::Processing;
        batch.completed = 1;
        assert!(batch.counters_consistent());

        batch.status = BatchStatus::Done;
        assert!(!batch.counters_consistent());
        batch.failed = 1;
        assert!(batch.counters_consistent());
    }
}
