use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use lmerge_merge::LineOrder;
use lmerge_reader::ReaderConfig;

use crate::cli::Cli;

/// Settings for one merge run: file values first, then flag overrides.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    pub order: LineOrder,
    pub reader: ReaderConfig,
}

impl MergeConfig {
    /// Load a TOML config file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Resolve the effective settings for a command line.
    pub fn resolve(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        if let Some(order) = cli.order {
            config.order = order;
        }
        if let Some(chunk_size) = cli.chunk_size {
            config.reader.chunk_size = chunk_size;
        }
        config.reader.validate()?;
        Ok(config)
    }
}
