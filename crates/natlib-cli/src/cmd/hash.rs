//! Hash command

use anyhow::{Context, Result};

use crate::{Cli, LibrarySet};

/// Print the digest a library set is extracted under
pub fn hash(cli: &Cli, set: &LibrarySet) -> Result<()> {
    let loader = cli.loader()?;
    let entry = set.entry(cli.platform()?);
    let digest = loader
        .digest(&set.package, &entry)
        .with_context(|| format!("Failed to hash {}", entry.library))?;
    println!("{digest} {}", loader.package_dir(&set.package).join(digest.as_str()).display());
    Ok(())
}
