//! Atelier Engine - transaction layer
//!
//! Every model mutation passes through here:
//! - `Request` / `CompositeRequest`: reversible units of change
//! - `TransactionManager`: creates, commits, undoes and redoes them
//! - `HistoryStack`: cursor-addressed undo history
//! - Sessions: fold many commits into one history entry
//! - Commands: user-action controllers built on top

pub mod command;
pub mod composite;
pub mod events;
pub mod history;
pub mod manager;
pub mod registry;
pub mod request;
pub mod reversible;
pub mod session;

pub use command::{Command, CommandContext, CommandFlow, CommandManager};
pub use composite::{ActiveTracker, CompositeRequest};
pub use events::{ListenerId, Recorded, TransactionEvent};
pub use history::{
    HistoryEntry, HistoryEntryInfo, HistoryStack, HistoryUnit, Transaction, UnitType,
};
pub use manager::{TransactionManager, TransactionManagerBuilder};
pub use registry::{RequestFactory, RequestRegistry};
pub use request::{Request, RequestState};
pub use reversible::Reversible;
pub use session::{SessionHandle, SessionOptions, SessionRecord};
