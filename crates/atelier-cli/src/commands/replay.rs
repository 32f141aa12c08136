//! Replay command
//!
//! Usage: atelier replay <SCRIPT> [--config <TOML>] [--json-logs] [--output <FILE>]
//!
//! A script is a seed document plus a list of steps:
//!
//! ```json
//! {
//!   "document": { "entities": { ... } },
//!   "steps": [
//!     { "op": "begin_session", "description": "Resize" },
//!     { "op": "commit", "kind": "SetParameter",
//!       "params": { "entity_id": "c1", "name": "width", "value": 900 } },
//!     { "op": "commit_session" },
//!     { "op": "undo" }
//!   ]
//! }
//! ```

use std::path::PathBuf;

use atelier_core::logging_facility::{self, Profile};
use atelier_core::{Document, EngineConfig};
use atelier_engine::{SessionHandle, SessionOptions, TransactionManager};
use clap::Args;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// Replay script (JSON)
    pub script: PathBuf,

    /// Engine configuration (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Emit JSON logs on stderr
    #[arg(long)]
    pub json_logs: bool,

    /// Write the final document to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct Script {
    #[serde(default)]
    document: Document,
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Step {
    Commit {
        kind: String,
        #[serde(default)]
        params: Value,
    },
    Undo,
    Redo,
    BeginSession {
        #[serde(default = "default_session_description")]
        description: String,
    },
    CommitSession,
    AbortSession,
}

fn default_session_description() -> String {
    "Session".to_string()
}

/// Execute replay command
pub fn execute(args: ReplayArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_toml_file(path)?,
        None => EngineConfig::default(),
    };
    if args.json_logs {
        config.logging.profile = Profile::Production;
    }
    logging_facility::init(config.logging.profile);

    let script: Script = serde_json::from_str(&std::fs::read_to_string(&args.script)?)?;
    let tm = TransactionManager::builder()
        .config(config)
        .document(script.document)
        .build();

    let mut session = None;
    for (index, step) in script.steps.into_iter().enumerate() {
        run_step(&tm, &mut session, step).map_err(|e| format!("step {}: {}", index + 1, e))?;
    }
    // dropping an unfinished handle rolls the session back
    if session.take().is_some() {
        println!("! open session rolled back");
    }

    print_history(&tm);

    if let Some(output_path) = args.output {
        let doc = tm.document()?;
        std::fs::write(&output_path, serde_json::to_string_pretty(&*doc)?)?;
        println!("✓ Document written to {}", output_path.display());
    }

    Ok(())
}

fn run_step(
    tm: &TransactionManager,
    session: &mut Option<SessionHandle>,
    step: Step,
) -> Result<(), Box<dyn std::error::Error>> {
    match step {
        Step::Commit { kind, params } => {
            let request = tm.create_request_by_name(&kind, params)?;
            tm.commit(request)?;
        }
        Step::Undo => {
            tm.undo()?;
        }
        Step::Redo => {
            tm.redo()?;
        }
        Step::BeginSession { description } => {
            *session = Some(tm.start_session(SessionOptions::new(description))?);
        }
        Step::CommitSession => {
            let open = session.take().ok_or("commit_session without begin_session")?;
            open.commit()?;
        }
        Step::AbortSession => {
            let open = session.take().ok_or("abort_session without begin_session")?;
            open.abort()?;
        }
    }
    Ok(())
}

fn print_history(tm: &TransactionManager) {
    let cursor = tm.cursor();
    for (index, entry) in tm.history().iter().enumerate() {
        let marker = if index < cursor { "*" } else { " " };
        println!(
            "{} {:>2}. [{}] {}",
            marker,
            index + 1,
            entry.category,
            entry.description
        );
    }
    println!("cursor: {}/{}", cursor, tm.history_len());
}
