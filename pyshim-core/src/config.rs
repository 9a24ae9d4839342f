//! Launch configuration
//!
//! The three launch paths are fixed when the binary is built. They default to
//! a `venv` directory and a `main.py` next to the working directory, and can be
//! overridden at compile time through `PYSHIM_HOME`, `PYSHIM_EXECUTABLE` and
//! `PYSHIM_SCRIPT`. Nothing is read from the environment at run time.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Runtime home: the virtual environment supplying the stdlib and site paths.
pub const DEFAULT_HOME: &str = match option_env!("PYSHIM_HOME") {
    Some(home) => home,
    None => "venv",
};

/// Interpreter binary reported as `sys.executable`.
pub const DEFAULT_EXECUTABLE: &str = match option_env!("PYSHIM_EXECUTABLE") {
    Some(executable) => executable,
    None => "venv/bin/python",
};

/// Entry script executed as `__main__`.
pub const DEFAULT_SCRIPT: &str = match option_env!("PYSHIM_SCRIPT") {
    Some(script) => script,
    None => "main.py",
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchConfig {
    /// Runtime home directory (becomes `sys.prefix`)
    pub home: PathBuf,
    /// Interpreter path inside the home
    pub executable: PathBuf,
    /// Script to run, relative to the working directory
    pub script: PathBuf,
    /// Forwarded to the script as `sys.argv[1:]`
    pub script_args: Vec<OsString>,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            home: PathBuf::from(DEFAULT_HOME),
            executable: PathBuf::from(DEFAULT_EXECUTABLE),
            script: PathBuf::from(DEFAULT_SCRIPT),
            script_args: Vec::new(),
        }
    }
}

impl LaunchConfig {
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = home.into();
        self
    }

    pub fn with_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.executable = executable.into();
        self
    }

    pub fn with_script(mut self, script: impl Into<PathBuf>) -> Self {
        self.script = script.into();
        self
    }

    pub fn with_script_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.script_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Full argv handed to the runtime: the script path followed by its args.
    pub fn argv(&self) -> Vec<OsString> {
        let mut argv = Vec::with_capacity(self.script_args.len() + 1);
        argv.push(self.script.as_os_str().to_owned());
        argv.extend(self.script_args.iter().cloned());
        argv
    }

    pub fn script_path(&self) -> &Path {
        &self.script
    }
}
