//! Entry script loading and execution

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use pyo3::exceptions::PySystemExit;
use pyo3::prelude::*;
use pyo3::types::{PyBytes, PyList};

use crate::error::{LaunchError, FAILURE_EXIT_CODE};

/// Script contents read from disk. The file is closed as soon as it is read.
#[derive(Debug)]
pub struct EntryScript {
    path: PathBuf,
    source: Vec<u8>,
}

impl EntryScript {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LaunchError> {
        let path = path.as_ref();
        let source = fs::read(path).map_err(|e| LaunchError::script_not_found(path, e))?;
        debug!("Loaded {} ({} bytes)", path.display(), source.len());

        Ok(Self {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Run the script as `__main__` with `sys.argv` set to `argv`.
    ///
    /// An unhandled exception is printed with the interpreter's own traceback
    /// before being turned into [`LaunchError::ScriptExecution`]. `SystemExit`
    /// is a completion status: `None` or `0` means success.
    pub fn execute(&self, py: Python<'_>, argv: &[OsString]) -> Result<(), LaunchError> {
        let err = match self.run_as_main(py, argv) {
            Ok(()) => return Ok(()),
            Err(err) => err,
        };

        let status = if err.is_instance_of::<PySystemExit>(py) {
            system_exit_status(py, &err)
        } else {
            err.print(py);
            FAILURE_EXIT_CODE
        };

        if status == 0 {
            Ok(())
        } else {
            Err(LaunchError::script_execution(&self.path, status))
        }
    }

    fn run_as_main(&self, py: Python<'_>, argv: &[OsString]) -> PyResult<()> {
        let filename = self.path.to_string_lossy();

        let sys = py.import_bound("sys")?;
        sys.setattr("argv", PyList::new_bound(py, argv))?;

        let globals = py.import_bound("__main__")?.dict();
        globals.set_item("__file__", &*filename)?;
        globals.set_item("__cached__", py.None())?;

        // compile() on bytes honours PEP 263 coding declarations.
        let builtins = py.import_bound("builtins")?;
        let code = builtins.getattr("compile")?.call1((
            PyBytes::new_bound(py, &self.source),
            &*filename,
            "exec",
        ))?;
        builtins.getattr("exec")?.call1((code, &globals, &globals))?;
        Ok(())
    }
}

/// Exit status carried by a `SystemExit`, following the interpreter's rules.
fn system_exit_status(py: Python<'_>, err: &PyErr) -> i32 {
    let code = match err.value_bound(py).getattr("code") {
        Ok(code) => code,
        Err(_) => return FAILURE_EXIT_CODE,
    };

    if code.is_none() {
        return 0;
    }
    if let Ok(status) = code.extract::<i32>() {
        return status;
    }

    // sys.exit("message") prints the message and exits with 1.
    let text = match code.str() {
        Ok(text) => text.to_string(),
        Err(_) => "<unprintable SystemExit code>".to_string(),
    };
    if let Err(e) = write_sys_stderr(py, &text) {
        debug!("sys.stderr unavailable ({}), writing to process stderr", e);
        eprintln!("{}", text);
    }
    FAILURE_EXIT_CODE
}

/// Write a line through the interpreter's `sys.stderr`, which the script may
/// have replaced.
fn write_sys_stderr(py: Python<'_>, text: &str) -> PyResult<()> {
    let stderr = py.import_bound("sys")?.getattr("stderr")?;
    stderr.call_method1("write", (format!("{}\n", text),))?;
    if let Err(e) = stderr.call_method0("flush") {
        debug!("sys.stderr.flush() failed: {}", e);
    }
    Ok(())
}
