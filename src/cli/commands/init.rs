use anyhow::{bail, Result};
use std::path::PathBuf;
use std::sync::Arc;

use super::Command;
use crate::config::{StoryReelConfig, DEFAULT_CONFIG_FILE};
use crate::fs::FileSystemOperations;

/// Writes a configuration file with every default spelled out. An existing
/// file is only replaced with `--force`.
pub struct InitCommand {
    pub force: bool,
    path: PathBuf,
    fs_ops: Arc<dyn FileSystemOperations>,
}

impl InitCommand {
    pub fn new(force: bool, fs_ops: Arc<dyn FileSystemOperations>) -> Self {
        Self {
            force,
            path: PathBuf::from(DEFAULT_CONFIG_FILE),
            fs_ops,
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }
}

impl Command for InitCommand {
    async fn execute(&self) -> Result<()> {
        if self.fs_ops.exists(&self.path).await && !self.force {
            bail!(
                "{} already exists; use --force to overwrite it",
                self.path.display()
            );
        }

        let body = toml::to_string_pretty(&StoryReelConfig::default())?;
        self.fs_ops.write(&self.path, body.as_bytes()).await?;

        println!("✅ Wrote {}", self.path.display());
        println!("   💡 Next: storyreel run <photo-folder>");
        Ok(())
    }
}
