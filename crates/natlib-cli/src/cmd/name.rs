//! Name command

use anyhow::Result;
use natlib_schema::{Arch, Os, PlatformId, platform_filename};

use crate::Cli;

/// Print the filename a logical library has on the selected platform, or on
/// every platform with `all`
pub fn name(cli: &Cli, name: &str, all: bool) -> Result<()> {
    if all {
        for os in Os::ALL {
            for arch in Arch::ALL {
                let platform = PlatformId::new(os, arch);
                println!("{platform:<14} {}", platform_filename(os, arch, name));
            }
        }
    } else {
        println!("{}", cli.platform()?.library_filename(name));
    }
    Ok(())
}
