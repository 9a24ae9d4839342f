//! Two-phase launch: configure the runtime, then run the entry script.

use log::debug;

use crate::config::LaunchConfig;
use crate::error::LaunchError;
use crate::runtime::Runtime;
use crate::script::EntryScript;

/// Bring up the venv interpreter and run the entry script to completion.
///
/// The interpreter is finalized before this returns, on success and on every
/// error path. A configuration failure returns before the script is opened.
pub fn launch(config: &LaunchConfig) -> Result<(), LaunchError> {
    let runtime = Runtime::configure(config)?;
    let result = run_entry_script(&runtime, config);
    drop(runtime);

    if result.is_ok() {
        debug!("{} completed", config.script.display());
    }
    result
}

fn run_entry_script(runtime: &Runtime, config: &LaunchConfig) -> Result<(), LaunchError> {
    let script = EntryScript::open(config.script_path())?;
    let argv = config.argv();
    runtime.run(|py| script.execute(py, &argv))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_home_never_opens_script() {
        let temp = TempDir::new().unwrap();
        // Script path points at a directory: opening it would fail with
        // ScriptNotFound, so only a Configuration error proves it was skipped.
        let config = LaunchConfig::default()
            .with_home(temp.path().join("venv"))
            .with_script(temp.path());

        let err = launch(&config).unwrap_err();
        assert!(
            matches!(err, LaunchError::Configuration { .. }),
            "Got: {}",
            err
        );
    }
}
