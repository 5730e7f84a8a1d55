use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

pub struct Config {
    pub data_dir: PathBuf,
}

impl Config {
    /// Use `override_dir` when given, otherwise the per-user data directory.
    pub fn load(override_dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = match override_dir {
            Some(dir) => dir,
            None => ProjectDirs::from("", "", "recipebox")
                .context("Could not determine home directory")?
                .data_dir()
                .to_path_buf(),
        };

        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        Ok(Config {
            data_dir: absolute_dir(&data_dir)?,
        })
    }
}

/// Image paths are stored as found under the data directory, so it must not
/// depend on the working directory.
fn absolute_dir(dir: &Path) -> Result<PathBuf> {
    std::path::absolute(dir)
        .with_context(|| format!("Failed to resolve data directory: {}", dir.display()))
}
