//! Atelier CLI
//!
//! Command-line driver for the edit engine

use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "atelier")]
#[command(about = "Atelier - transactional edit engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Replay a script of commits, sessions and undo/redo steps
    Replay(commands::replay::ReplayArgs),
    /// List the registered request kinds
    Kinds(commands::kinds::KindsArgs),
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Replay(args) => commands::replay::execute(args),
        Commands::Kinds(args) => commands::kinds::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
