//! Hand-off to the external archive packager.
//!
//! The packager is a script (for KiriKiri games, an XP3 packer) run once the
//! translated tree and the cache are fully written.

use crate::config::PackagingConfig;
use crate::error::PackagingError;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Runs `<interpreter> <script> --pack <archive> <output dir>`.
#[derive(Debug, Clone)]
pub struct Packager {
    interpreter: PathBuf,
    script: PathBuf,
    archive: String,
}

impl Packager {
    /// Returns a packager if the configured script exists, `Ok(None)` otherwise.
    pub fn from_config(config: &PackagingConfig) -> Result<Option<Self>, PackagingError> {
        if !config.script.is_file() {
            return Ok(None);
        }

        let interpreter = which::which(&config.interpreter).map_err(|source| {
            PackagingError::InterpreterNotFound {
                name: config.interpreter.clone(),
                source,
            }
        })?;

        Ok(Some(Self {
            interpreter,
            script: config.script.clone(),
            archive: config.archive.clone(),
        }))
    }

    /// Name of the archive this packager produces.
    pub fn archive(&self) -> &str {
        &self.archive
    }

    /// Builds the packager invocation for `output_dir`.
    pub fn command(&self, output_dir: &Path) -> Command {
        let mut command = Command::new(&self.interpreter);
        command
            .arg(&self.script)
            .arg("--pack")
            .arg(&self.archive)
            .arg(output_dir);
        command
    }

    /// Packs `output_dir`, waiting for the packager to exit.
    pub fn package(&self, output_dir: &Path) -> Result<(), PackagingError> {
        let status = self.command(output_dir).status()?;
        if !status.success() {
            return Err(PackagingError::Failed(status));
        }
        Ok(())
    }
}
