//! Launch error types

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Exit code used for every failure that does not carry its own status.
pub const FAILURE_EXIT_CODE: i32 = 1;

#[derive(Error, Debug)]
pub enum LaunchError {
    // Runtime setup
    #[error("Failed to configure embedded Python: {message}")]
    Configuration { message: String },

    // Entry script
    #[error("Failed to open {}: {source}", path.display())]
    ScriptNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to run {} (exit status {status})", path.display())]
    ScriptExecution { path: PathBuf, status: i32 },
}

impl LaunchError {
    pub fn configuration(message: impl Into<String>) -> Self {
        LaunchError::Configuration {
            message: message.into(),
        }
    }

    pub fn script_not_found(path: impl Into<PathBuf>, source: io::Error) -> Self {
        LaunchError::ScriptNotFound {
            path: path.into(),
            source,
        }
    }

    pub fn script_execution(path: impl Into<PathBuf>, status: i32) -> Self {
        LaunchError::ScriptExecution {
            path: path.into(),
            status,
        }
    }

    /// Process exit code for this failure.
    ///
    /// A script that asked for a specific non-zero status keeps it; everything
    /// else exits with [`FAILURE_EXIT_CODE`].
    pub fn exit_code(&self) -> i32 {
        match self {
            LaunchError::ScriptExecution { status, .. } if *status != 0 => *status,
            _ => FAILURE_EXIT_CODE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_message() {
        let err = LaunchError::configuration("runtime home 'venv' is not a directory");
        assert_eq!(
            err.to_string(),
            "Failed to configure embedded Python: runtime home 'venv' is not a directory"
        );
        assert_eq!(err.exit_code(), FAILURE_EXIT_CODE);
    }

    #[test]
    fn test_script_not_found_message() {
        let err = LaunchError::script_not_found(
            "main.py",
            io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
        );
        let msg = err.to_string();
        assert!(msg.starts_with("Failed to open main.py"), "Got: {}", msg);
        assert!(msg.contains("No such file or directory"));
        assert_eq!(err.exit_code(), FAILURE_EXIT_CODE);
    }

    #[test]
    fn test_script_execution_keeps_status() {
        let err = LaunchError::script_execution("main.py", 3);
        assert_eq!(err.to_string(), "Failed to run main.py (exit status 3)");
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_script_execution_zero_status_still_fails() {
        let err = LaunchError::script_execution("main.py", 0);
        assert_eq!(err.exit_code(), FAILURE_EXIT_CODE);
    }
}
