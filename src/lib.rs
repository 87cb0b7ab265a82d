//! husk - A sandboxed shell emulator with an audit trail
//!
//! This library provides a restricted shell over a read-only virtual
//! filesystem staged from an archive. Every command outcome is appended
//! to a durable XML audit log.

pub mod archive;
pub mod audit;
pub mod config;
pub mod dispatch;
pub mod emulator;
pub mod errors;
pub mod resolver;
pub mod session;
pub mod vpath;

pub use audit::{LogEntry, LogWriter};
pub use config::ShellConfig;
pub use dispatch::{dispatch, CommandOutcome};
pub use emulator::Emulator;
pub use errors::{HuskError, ResolveError};
pub use resolver::Resolver;
pub use session::Session;
pub use vpath::VirtualPath;
