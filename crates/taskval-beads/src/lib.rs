//! Turns validated task graphs into beads (`bd`) issues.
//!
//! [`CommandBuilder`] produces the ordered command list with symbolic issue
//! references; [`Executor`] runs it against a [`TrackerBackend`], binding each
//! created issue id before any later command needs it.

pub mod builder;
pub mod command;
pub mod config;
pub mod errors;
pub mod executor;
pub mod mapping;

pub use builder::*;
pub use command::*;
pub use config::*;
pub use errors::*;
pub use executor::*;
pub use mapping::*;
