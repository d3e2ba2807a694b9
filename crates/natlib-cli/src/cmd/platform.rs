//! Platform command

use anyhow::Result;
use natlib_schema::PlatformId;

use crate::Cli;

/// Show the host platform and, if overridden, the selected one
pub fn platform(cli: &Cli) -> Result<()> {
    match PlatformId::current() {
        Ok(host) => println!("host:     {host}"),
        Err(e) => println!("host:     unsupported ({e})"),
    }
    let selected = cli.platform()?;
    println!("selected: {selected}");
    println!(
        "preload:  {}",
        if selected.preloads_dependencies() {
            "dependencies loaded explicitly, in order"
        } else {
            "dependencies resolved by the dynamic linker"
        }
    );
    Ok(())
}
