//! pyshim Core Library
//!
//! Bootstrap for applications shipped as a Python virtual environment:
//! - Isolated interpreter configuration pointing at the venv
//! - Entry script loading and execution as `__main__`
//! - Typed launch errors with process exit codes

pub mod config;
pub mod error;
pub mod launcher;
pub mod runtime;
pub mod script;

pub use config::LaunchConfig;
pub use error::LaunchError;
pub use launcher::launch;
pub use runtime::Runtime;
pub use script::EntryScript;
