//! natlib - bundled native library tooling
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
//!
//! Packaging and diagnostics front end for `natlib-core`: print the
//! filenames a build must produce, hash and extract library sets from a
//! resource directory, and try loading them on this machine.

pub mod cmd;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use natlib_core::{DirResourceStore, NativeLoader};
use natlib_schema::{Arch, LibraryEntry, Os, PlatformId};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "natlib")]
#[command(author, version, about = "natlib - bundled native library tooling")]
pub struct Cli {
    /// Directory holding library resources (laid out by package path)
    #[arg(long, global = true, env = "NATLIB_RESOURCES", default_value = ".")]
    pub resources: PathBuf,

    /// Extraction root (defaults to $NATLIB_HOME/lib or ~/.natlib/lib)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Select libraries for this operating system instead of the host's
    #[arg(long, global = true)]
    pub os: Option<Os>,

    /// Select libraries for this architecture instead of the host's
    #[arg(long, global = true)]
    pub arch: Option<Arch>,

    /// Show debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the detected platform
    Platform,
    /// Print the platform filename of a logical library name
    Name {
        /// Logical library name (e.g. physics)
        name: String,
        /// Print the filename for every supported platform
        #[arg(long, short = 'a')]
        all: bool,
    },
    /// Print the content digest of a library set
    Hash {
        #[command(flatten)]
        set: LibrarySet,
    },
    /// Extract a library set and print the main library's path
    Extract {
        #[command(flatten)]
        set: LibrarySet,
    },
    /// Extract and load libraries into this process
    Load {
        /// Package identifier (e.g. us.ihmc.physics)
        #[arg(required_unless_present = "manifest")]
        package: Option<String>,
        /// Logical library name
        #[arg(required_unless_present = "manifest")]
        library: Option<String>,
        /// Load every library a TOML manifest declares for this platform
        #[arg(long, short = 'm', conflicts_with_all = ["package", "library"])]
        manifest: Option<PathBuf>,
    },
    /// Remove the extraction cache
    Clean {
        /// Show what would be removed without removing it
        #[arg(long)]
        dry_run: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

/// A main library and its dependencies, as given on the command line.
#[derive(Debug, clap::Args)]
pub struct LibrarySet {
    /// Package identifier (e.g. us.ihmc.physics)
    pub package: String,
    /// Main library
    pub library: String,
    /// Dependencies, in load order
    pub dependencies: Vec<String>,
    /// Treat names as literal filenames instead of logical names
    #[arg(long)]
    pub raw: bool,
}

impl LibrarySet {
    /// The entry these names describe on `platform`.
    pub fn entry(&self, platform: PlatformId) -> LibraryEntry {
        if self.raw {
            LibraryEntry::from_filenames(self.library.clone(), self.dependencies.clone())
        } else {
            LibraryEntry::for_platform(platform, &self.library, &self.dependencies)
        }
    }
}

impl Cli {
    /// The platform selected by `--os`/`--arch`, filling gaps from the host.
    pub fn platform(&self) -> Result<PlatformId> {
        let platform = match (self.os, self.arch) {
            (Some(os), Some(arch)) => PlatformId::new(os, arch),
            (os, arch) => {
                let host = PlatformId::current()
                    .context("Host platform is unsupported; pass both --os and --arch")?;
                PlatformId::new(os.unwrap_or(host.os), arch.unwrap_or(host.arch))
            }
        };
        Ok(platform)
    }

    /// A loader reading from `--resources` and extracting into `--root`.
    pub fn loader(&self) -> Result<NativeLoader> {
        let mut builder = NativeLoader::builder(DirResourceStore::new(&self.resources))
            .platform(self.platform()?);
        if let Some(root) = &self.root {
            builder = builder.root(root);
        }
        builder.build().context("Failed to set up extraction root")
    }
}
