//! `gridsim init`: scaffold a gridsim.toml.

use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::info;

use gridsim_core::config::DEFAULT_SERVERS;
use gridsim_core::{Policy, SimConfig};

pub fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    let config = SimConfig::scaffold(DEFAULT_SERVERS, Policy::RoundRobin);
    let content = config.to_toml_string()?;
    std::fs::write(path, content)
        .with_context(|| format!("failed to write {}", path.display()))?;

    info!(path = %path.display(), "wrote simulation config");
    Ok(())
}
