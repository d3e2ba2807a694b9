//! Load command

use std::path::Path;

use anyhow::{Context, Result, bail};
use natlib_schema::{DefaultLibraryDescriptor, LibraryDescriptor, LibraryManifest};

use crate::Cli;

/// Extract and load libraries into this process, reporting what happened
pub fn load(
    cli: &Cli,
    package: Option<&str>,
    library: Option<&str>,
    manifest: Option<&Path>,
) -> Result<()> {
    let descriptor: Box<dyn LibraryDescriptor> = match (manifest, package, library) {
        (Some(path), _, _) => Box::new(
            LibraryManifest::load(path)
                .with_context(|| format!("Failed to read manifest {}", path.display()))?,
        ),
        (None, Some(package), Some(library)) => {
            Box::new(DefaultLibraryDescriptor::new(package, library))
        }
        _ => bail!("Pass a package and library, or --manifest"),
    };

    let loader = cli.loader()?;
    let report = loader
        .try_load(descriptor.as_ref())
        .with_context(|| format!("Cannot load {}", descriptor.package()))?;

    for identity in &report.loaded {
        println!("loaded   {identity}");
    }
    for identity in &report.already_loaded {
        println!("skipped  {identity}");
    }
    Ok(())
}
