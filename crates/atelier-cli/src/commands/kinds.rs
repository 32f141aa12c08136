//! Kinds command
//!
//! Usage: atelier kinds [--json]

use atelier_engine::TransactionManager;
use clap::Args;

#[derive(Debug, Args)]
pub struct KindsArgs {
    /// Print as a JSON array
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: KindsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let kinds = TransactionManager::default().registered_kinds();

    if args.json {
        println!("{}", serde_json::to_string(&kinds)?);
    } else {
        for kind in kinds {
            println!("{}", kind);
        }
    }
    Ok(())
}
