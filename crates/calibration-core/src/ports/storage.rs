use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Mount, Point};

/// Flat record handed to persistence once a session completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TipLengthRecord {
    pub mount: Mount,
    pub tip_rack: String,
    pub pipette_id: Option<String>,
    pub nozzle_offset: Point,
    pub tip_offset: Point,
    pub tip_length: f64,
    pub recorded_at: DateTime<Utc>,
}

#[async_trait]
pub trait CalibrationStore: Send + Sync {
    /// Insert or replace the record for `(record.mount, record.tip_rack)`.
    async fn save_tip_length(&self, record: &TipLengthRecord) -> Result<()>;

    async fn load_tip_length(&self, mount: Mount, tip_rack: &str) -> Result<Option<TipLengthRecord>>;

    async fn list_tip_lengths(&self) -> Result<Vec<TipLengthRecord>>;

    /// Returns whether a record was removed.
    async fn delete_tip_length(&self, mount: Mount, tip_rack: &str) -> Result<bool>;
}
