//! Extract command

use anyhow::{Context, Result};

use crate::{Cli, LibrarySet};

/// Extract a library set and print where the main library landed
pub fn extract(cli: &Cli, set: &LibrarySet) -> Result<()> {
    let loader = cli.loader()?;
    let entry = set.entry(cli.platform()?);
    let record = loader
        .extract_entry(&set.package, &entry)
        .with_context(|| format!("Failed to extract {}", entry.library))?;

    println!("{}", record.library().display());
    for dependency in record.dependencies() {
        tracing::info!("dependency: {}", dependency.display());
    }
    Ok(())
}
