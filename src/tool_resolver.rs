//! # Tool Path Resolver
//!
//! This module handles finding external tools (Ghostscript) in different environments:
//! - Bundled next to the executable or in `TOOLS_DIR`
//! - System-installed tools on `PATH`

use std::env;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Executable names tried for Ghostscript, in order
pub fn ghostscript_names() -> &'static [&'static str] {
    if cfg!(windows) {
        &["gswin64c", "gswin32c", "gs"]
    } else {
        &["gs"]
    }
}

/// Tool path resolver for different deployment environments
#[derive(Debug, Clone)]
pub struct ToolPathResolver {
    /// Directory where tools are bundled, if any
    tools_dir: Option<PathBuf>,
    /// Value of PATH used for system lookups
    search_path: Option<std::ffi::OsString>,
}

impl ToolPathResolver {
    /// Create a new path resolver
    pub fn new() -> Self {
        Self {
            tools_dir: Self::detect_bundled_tools_dir(),
            search_path: env::var_os("PATH"),
        }
    }

    /// Resolver with explicit locations, mostly for tests
    pub fn with_locations(tools_dir: Option<PathBuf>, search_path: Option<std::ffi::OsString>) -> Self {
        Self { tools_dir, search_path }
    }

    fn detect_bundled_tools_dir() -> Option<PathBuf> {
        // Strategy 1: TOOLS_DIR environment variable (direct override)
        if let Ok(tools_dir) = env::var("TOOLS_DIR") {
            let tools_path = PathBuf::from(tools_dir);
            debug!("Checking TOOLS_DIR environment variable: {:?}", tools_path);
            if tools_path.exists() {
                return Some(tools_path);
            }
        }

        // Strategy 2: tools/ next to the executable
        if let Ok(exe_path) = env::current_exe() {
            if let Some(app_dir) = exe_path.parent() {
                let tools_path = app_dir.join("tools");
                debug!("Checking bundled path: {:?}", tools_path);
                if tools_path.exists() {
                    return Some(tools_path);
                }
            }
        }

        debug!("No bundled tools directory found");
        None
    }

    /// Resolve the path to a specific tool, bundled first, then PATH
    pub fn resolve_tool(&self, tool_name: &str) -> Option<PathBuf> {
        if let Some(ref tools_dir) = self.tools_dir {
            let bundled_path = tools_dir.join(Self::executable_name(tool_name));
            if bundled_path.is_file() {
                debug!("Using bundled tool: {} -> {:?}", tool_name, bundled_path);
                return Some(bundled_path);
            }
        }

        if let Some(system_path) = self.find_in_system_path(tool_name) {
            debug!("Using system tool: {} -> {:?}", tool_name, system_path);
            return Some(system_path);
        }

        None
    }

    fn executable_name(tool_name: &str) -> String {
        let extension = if cfg!(windows) { ".exe" } else { "" };
        format!("{}{}", tool_name, extension)
    }

    /// Find tool in system PATH
    fn find_in_system_path(&self, tool_name: &str) -> Option<PathBuf> {
        let tool_with_ext = Self::executable_name(tool_name);

        env::split_paths(self.search_path.as_ref()?)
            .map(|dir| dir.join(&tool_with_ext))
            .find(|path| path.is_file())
    }

    /// First Ghostscript executable found
    pub fn ghostscript(&self) -> Option<PathBuf> {
        let found = ghostscript_names().iter().find_map(|name| self.resolve_tool(name));
        if found.is_none() {
            warn!("Ghostscript not found (tried: {})", ghostscript_names().join(", "));
        }
        found
    }

    /// Ghostscript path, or a message telling the user how to get it
    pub fn check_ghostscript(&self) -> Result<PathBuf, String> {
        self.ghostscript().ok_or_else(|| {
            if cfg!(target_os = "linux") {
                "Ghostscript not found in system PATH.\nTo install on Linux, run:\n  sudo apt-get install ghostscript"
                    .to_string()
            } else if cfg!(target_os = "macos") {
                "Ghostscript not found in system PATH.\nTo install on macOS, run:\n  brew install ghostscript"
                    .to_string()
            } else {
                "Ghostscript not found. Install it from https://ghostscript.com or place gswin64c.exe in TOOLS_DIR."
                    .to_string()
            }
        })
    }
}

impl Default for ToolPathResolver {
    fn default() -> Self {
        Self::new()
    }
}
