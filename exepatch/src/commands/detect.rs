//! Install architecture detection command

use anyhow::{Result, bail};

use exepatch_engine::{ArchitectureResolver, ResolverConfig};

use crate::cli::DetectArgs;

pub fn execute(args: DetectArgs) -> Result<()> {
    let resolver = ArchitectureResolver::new(args.root.clone(), ResolverConfig::default());
    match resolver.classify() {
        Some(arch) => {
            println!("{arch}");
            Ok(())
        }
        None => bail!(
            "no known marker executable found under {}; cannot classify the install",
            args.root.display()
        ),
    }
}
