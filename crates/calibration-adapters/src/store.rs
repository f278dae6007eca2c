use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use calibration_core::ports::{CalibrationStore, TipLengthRecord};
use calibration_core::Mount;

/// Stores each tip length as `<root>/<mount>_<tip_rack>.json`.
#[derive(Debug, Clone)]
pub struct FileCalibrationStore {
    root: PathBuf,
}

impl FileCalibrationStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, mount: Mount, tip_rack: &str) -> PathBuf {
        let rack: String = tip_rack
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.root.join(format!("{}_{}.json", mount, rack))
    }
}

#[async_trait]
impl CalibrationStore for FileCalibrationStore {
    async fn save_tip_length(&self, record: &TipLengthRecord) -> Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("creating calibration directory {}", self.root.display()))?;

        let path = self.path_for(record.mount, &record.tip_rack);
        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_string_pretty(record)?;
        tokio::fs::write(&tmp, body)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("replacing {}", path.display()))?;

        debug!(mount = %record.mount, tip_rack = %record.tip_rack, path = %path.display(), "tip length saved");
        Ok(())
    }

    async fn load_tip_length(&self, mount: Mount, tip_rack: &str) -> Result<Option<TipLengthRecord>> {
        let path = self.path_for(mount, tip_rack);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
        };
        let record = serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        Ok(Some(record))
    }

    async fn list_tip_lengths(&self) -> Result<Vec<TipLengthRecord>> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).with_context(|| format!("listing {}", self.root.display())),
        };

        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let parsed = tokio::fs::read_to_string(&path)
                .await
                .map_err(anyhow::Error::from)
                .and_then(|content| Ok(serde_json::from_str::<TipLengthRecord>(&content)?));
            match parsed {
                Ok(record) => records.push(record),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable calibration file"),
            }
        }
        records.sort_by(|a, b| (a.mount, &a.tip_rack).cmp(&(b.mount, &b.tip_rack)));
        Ok(records)
    }

    async fn delete_tip_length(&self, mount: Mount, tip_rack: &str) -> Result<bool> {
        let path = self.path_for(mount, tip_rack);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("removing {}", path.display())),
        }
    }
}
