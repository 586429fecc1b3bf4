//! Metrics replay service
//!
//! Feeds a JSON-lines metrics log through an [`AverageMeterGroup`].

use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{AverageMeterGroup, MeterFormat};
use crate::infrastructure::traits::FileSystem;

/// Service for replaying recorded training metrics.
pub struct MetricsService {
    fs: Arc<dyn FileSystem>,
}

impl MetricsService {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Replay every step in `path`.
    ///
    /// Each non-blank line must be a JSON object mapping metric names to
    /// values. `on_step` sees the group after each line is applied, with the
    /// 1-based step number.
    pub fn replay<F>(
        &self,
        path: &Path,
        format: MeterFormat,
        mut on_step: F,
    ) -> ApplicationResult<AverageMeterGroup>
    where
        F: FnMut(usize, &AverageMeterGroup),
    {
        debug!("replay: path={}", path.display());
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read metrics log", path)?;

        let mut group = AverageMeterGroup::with_format(format);
        let mut step = 0;
        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let record: Map<String, Value> =
                serde_json::from_str(line).map_err(|e| ApplicationError::Parse {
                    path: path.to_path_buf(),
                    message: format!("line {}: {}", line_no + 1, e),
                })?;
            group.update(record.iter().map(|(k, v)| (k.as_str(), v)));
            step += 1;
            on_step(step, &group);
        }

        debug!("replay: {} steps, {} meters", step, group.len());
        Ok(group)
    }
}
