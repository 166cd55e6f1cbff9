#![deny(warnings)]

//! Session runtime for Warfront: parses player commands, dispatches them to
//! the engines, reports outcomes and keeps the save up to date.

pub mod command;
pub mod notify;
pub mod session;

pub use command::{Command, ParseCommandError};
pub use notify::{Notification, NotificationSink, NullSink, Severity};
pub use session::{BattleKind, BattleRecord, GameData, Outcome, Session};
