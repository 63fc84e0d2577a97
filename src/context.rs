use anyhow::Result;
use std::path::PathBuf;

use crate::backend::Backend;
use crate::cli::Cli;
use crate::config::DigimallConfig;
use crate::store::FileStore;

pub struct DigimallContext {
    pub invocation: Cli,
    pub config: DigimallConfig,
}

impl DigimallContext {
    pub fn new(invocation: Cli, config: DigimallConfig) -> Self {
        Self { invocation, config }
    }

    pub fn digimall_dir(&self) -> Result<PathBuf> {
        Ok(FileStore::new()?.data_dir())
    }

    pub fn backend(&self) -> Result<Backend> {
        Backend::from_config(&self.config)
    }
}
