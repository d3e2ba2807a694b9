//! Clean command

use anyhow::{Context, Result};

use crate::Cli;

/// Remove every extracted library set
pub fn clean(cli: &Cli, dry_run: bool) -> Result<()> {
    let loader = cli.loader()?;
    let root = loader.root();

    if !root.exists() {
        println!("Nothing to clean at {}", root.display());
        return Ok(());
    }

    if dry_run {
        println!("Would remove {}", root.display());
    } else {
        std::fs::remove_dir_all(root)
            .with_context(|| format!("Failed to remove {}", root.display()))?;
        println!("Removed {}", root.display());
    }
    Ok(())
}
