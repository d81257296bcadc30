use crate::error::Result;
use crate::format::EncodedOutput;
use std::fs;
use std::path::{Path, PathBuf};

/// Where the encoded batch goes: back to the caller or into a file.
#[derive(Debug, Clone, PartialEq)]
pub enum Sink {
    Return,
    File(PathBuf),
}

impl Sink {
    pub fn from_path(path: Option<PathBuf>) -> Self {
        path.map_or(Sink::Return, Sink::File)
    }

    /// Returns the output for `Sink::Return`, `None` once it is persisted.
    pub fn deliver(&self, output: EncodedOutput) -> Result<Option<EncodedOutput>> {
        match self {
            Sink::Return => Ok(Some(output)),
            Sink::File(path) => {
                persist(&output.to_text()?, path)?;
                log::info!("Saved {} entries to {}", output.len(), path.display());
                Ok(None)
            }
        }
    }
}

pub fn persist(content: &str, destination: &Path) -> Result<()> {
    fs::write(destination, content.as_bytes())
        .map_err(|e| ("Failed to write output file", e))?;
    Ok(())
}
