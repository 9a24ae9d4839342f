//! Embedded interpreter lifecycle
//!
//! Builds an isolated `PyConfig` pointing at the venv, initializes CPython
//! from it, and hands back a [`Runtime`] guard that finalizes the interpreter
//! when dropped. The interpreter can be brought up at most once per process.

use std::ffi::{CStr, CString};
use std::fs;
use std::mem::MaybeUninit;
use std::path::Path;
use std::ptr::addr_of_mut;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, warn};
use pyo3::ffi;
use pyo3::Python;

use crate::config::LaunchConfig;
use crate::error::LaunchError;

static RUNTIME_CLAIMED: AtomicBool = AtomicBool::new(false);

/// Owned `PyConfig`, cleared on drop whether or not initialization succeeded.
struct IsolatedConfig {
    raw: Box<MaybeUninit<ffi::PyConfig>>,
}

impl IsolatedConfig {
    fn new() -> Self {
        let mut raw = Box::new(MaybeUninit::<ffi::PyConfig>::uninit());
        // Isolated: ignore PYTHON* env vars, user site-packages and the cwd on sys.path.
        unsafe { ffi::PyConfig_InitIsolatedConfig(raw.as_mut_ptr()) };
        Self { raw }
    }

    fn as_mut_ptr(&mut self) -> *mut ffi::PyConfig {
        self.raw.as_mut_ptr()
    }

    fn set_executable(&mut self, value: &CStr) -> Result<(), LaunchError> {
        let config = self.as_mut_ptr();
        let status = unsafe {
            ffi::PyConfig_SetBytesString(config, addr_of_mut!((*config).executable), value.as_ptr())
        };
        check_status(status, "Failed to set executable venv")
    }

    fn set_home(&mut self, value: &CStr) -> Result<(), LaunchError> {
        let config = self.as_mut_ptr();
        let status = unsafe {
            ffi::PyConfig_SetBytesString(config, addr_of_mut!((*config).home), value.as_ptr())
        };
        check_status(status, "Failed to set home venv")
    }
}

impl Drop for IsolatedConfig {
    fn drop(&mut self) {
        unsafe { ffi::PyConfig_Clear(self.as_mut_ptr()) };
    }
}

/// A live embedded interpreter. Dropping it finalizes CPython.
pub struct Runtime {
    _not_send: std::marker::PhantomData<*mut ()>,
}

impl Runtime {
    /// Initialize the interpreter for `config`.
    ///
    /// The home must be an existing directory; both paths must be encodable
    /// for the runtime. Any failure leaves the interpreter uninitialized.
    pub fn configure(config: &LaunchConfig) -> Result<Self, LaunchError> {
        check_home(&config.home)?;
        let executable = path_to_cstring(&config.executable, "executable")?;
        let home = path_to_cstring(&config.home, "home")?;

        if RUNTIME_CLAIMED.swap(true, Ordering::SeqCst) || unsafe { ffi::Py_IsInitialized() } != 0
        {
            return Err(LaunchError::configuration(
                "an embedded Python interpreter was already started in this process",
            ));
        }

        let mut py_config = IsolatedConfig::new();
        py_config.set_executable(&executable)?;
        py_config.set_home(&home)?;

        debug!(
            "Initializing Python (home={}, executable={})",
            config.home.display(),
            config.executable.display()
        );
        let status = unsafe { ffi::Py_InitializeFromConfig(py_config.as_mut_ptr()) };
        check_status(status, "Failed to initialize python")?;

        Ok(Self {
            _not_send: std::marker::PhantomData,
        })
    }

    /// Run `f` with the GIL held.
    pub fn run<F, R>(&self, f: F) -> R
    where
        F: for<'py> FnOnce(Python<'py>) -> R,
    {
        Python::with_gil(f)
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        debug!("Finalizing Python");
        // The main thread still holds the GIL taken by Py_InitializeFromConfig.
        let ret = unsafe { ffi::Py_FinalizeEx() };
        if ret != 0 {
            warn!("Python finalization reported an error (code {})", ret);
        }
    }
}

fn check_home(home: &Path) -> Result<(), LaunchError> {
    match fs::metadata(home) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(LaunchError::configuration(format!(
            "runtime home '{}' is not a directory",
            home.display()
        ))),
        Err(e) => Err(LaunchError::configuration(format!(
            "runtime home '{}' is not accessible: {}",
            home.display(),
            e
        ))),
    }
}

fn path_to_cstring(path: &Path, what: &str) -> Result<CString, LaunchError> {
    CString::new(path.as_os_str().as_encoded_bytes()).map_err(|_| {
        LaunchError::configuration(format!(
            "{} path '{}' contains a NUL byte",
            what,
            path.display()
        ))
    })
}

fn check_status(status: ffi::PyStatus, context: &str) -> Result<(), LaunchError> {
    let err_msg = status.err_msg;
    if unsafe { ffi::PyStatus_Exception(status) } == 0 {
        return Ok(());
    }

    if err_msg.is_null() {
        Err(LaunchError::configuration(context))
    } else {
        let detail = unsafe { CStr::from_ptr(err_msg) }.to_string_lossy();
        Err(LaunchError::configuration(format!("{}: {}", context, detail)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_home_is_configuration_error() {
        let temp = TempDir::new().unwrap();
        let config = LaunchConfig::default().with_home(temp.path().join("venv"));

        match Runtime::configure(&config) {
            Err(LaunchError::Configuration { message }) => {
                assert!(message.contains("venv"), "Got: {}", message);
                assert!(message.contains("not accessible"), "Got: {}", message);
            }
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("configured a runtime without a home"),
        }
    }

    #[test]
    fn test_home_must_be_directory() {
        let temp = TempDir::new().unwrap();
        let home = temp.path().join("venv");
        fs::write(&home, "not a directory").unwrap();

        let err = check_home(&home).unwrap_err();
        assert!(err.to_string().contains("is not a directory"));
    }

    #[test]
    fn test_nul_in_path_is_rejected() {
        let err = path_to_cstring(Path::new("venv\0/bin/python"), "executable").unwrap_err();
        match err {
            LaunchError::Configuration { message } => {
                assert!(message.starts_with("executable path"), "Got: {}", message);
                assert!(message.contains("NUL"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_plain_path_encodes() {
        let c = path_to_cstring(Path::new("venv/bin/python"), "executable").unwrap();
        assert_eq!(c.as_bytes(), b"venv/bin/python");
    }
}
