use anyhow::{bail, Result};
use std::path::PathBuf;

use crate::config::FastLeaseConfig;

pub struct ConfigShowCommand;

impl ConfigShowCommand {
    pub fn execute(&self, config: &FastLeaseConfig) -> Result<()> {
        print!("{}", toml::to_string_pretty(config)?);
        Ok(())
    }
}

pub struct ConfigInitCommand {
    pub path: PathBuf,
    pub force: bool,
}

impl ConfigInitCommand {
    pub fn execute(&self) -> Result<()> {
        if self.path.exists() && !self.force {
            bail!(
                "{} already exists; pass --force to overwrite it",
                self.path.display()
            );
        }

        FastLeaseConfig::default().save_to_file(&self.path)?;
        println!("✅ Wrote default configuration to {}", self.path.display());
        Ok(())
    }
}
