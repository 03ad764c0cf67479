//! Feed backed by two JSON files on disk, re-read when their mtime changes.

use super::{Feed, FeedUpdate};
use crate::graph::types::{parse_entities, parse_health};
use anyhow::Context;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub struct FileFeed {
    entities_path: PathBuf,
    health_path: Option<PathBuf>,
    entities_mtime: Option<SystemTime>,
    health_mtime: Option<SystemTime>,
}

impl FileFeed {
    pub fn new(entities_path: PathBuf, health_path: Option<PathBuf>) -> Self {
        Self {
            entities_path,
            health_path,
            entities_mtime: None,
            health_mtime: None,
        }
    }
}

/// Modification time of `path` if it differs from `last`
fn changed_mtime(path: &Path, last: Option<SystemTime>) -> anyhow::Result<Option<SystemTime>> {
    let mtime = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .with_context(|| format!("Failed to stat {}", path.display()))?;
    Ok((last != Some(mtime)).then_some(mtime))
}

impl Feed for FileFeed {
    fn poll(&mut self) -> anyhow::Result<FeedUpdate> {
        let mut update = FeedUpdate::default();

        if let Some(mtime) = changed_mtime(&self.entities_path, self.entities_mtime)? {
            let contents = std::fs::read_to_string(&self.entities_path)
                .with_context(|| format!("Failed to read {}", self.entities_path.display()))?;
            let entities = parse_entities(&contents)
                .with_context(|| format!("Invalid entity list in {}", self.entities_path.display()))?;
            tracing::debug!("Loaded {} entities from {:?}", entities.len(), self.entities_path);
            // Only remember the mtime once the contents parsed, so a half-written file is retried
            self.entities_mtime = Some(mtime);
            update.entities = Some(entities);
        }

        if let Some(path) = &self.health_path {
            if let Some(mtime) = changed_mtime(path, self.health_mtime)? {
                let contents = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                let health = parse_health(&contents)
                    .with_context(|| format!("Invalid health map in {}", path.display()))?;
                self.health_mtime = Some(mtime);
                update.health = Some(health);
            }
        }

        Ok(update)
    }

    fn describe(&self) -> String {
        match &self.health_path {
            Some(health) => format!(
                "{} + {}",
                self.entities_path.display(),
                health.display()
            ),
            None => self.entities_path.display().to_string(),
        }
    }
}
