//! Service ticket acquisition through the platform Kerberos client.

use crate::kerberos::ccache::{self, locator::KRB5CCNAME, CcacheError};
use log::{debug, info};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

pub const DEFAULT_KVNO: &str = "kvno";

/// Obtains the raw ticket message for an SPN.
pub trait TicketAcquirer {
    fn acquire(&self, spn: &str) -> Result<Vec<u8>, AcquireError>;
}

#[derive(Debug)]
pub enum AcquireError {
    Spawn { program: String, source: io::Error },
    Denied { status: Option<i32>, stderr: String },
    Ccache(CcacheError),
    NoTicket(String),
}

impl fmt::Display for AcquireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcquireError::Spawn { program, source } => {
                write!(f, "Failed to run {}: {}", program, source)
            }
            AcquireError::Denied { status, stderr } => {
                match status {
                    Some(code) => write!(f, "kvno exited with status {}", code)?,
                    None => write!(f, "kvno was terminated by a signal")?,
                }
                if !stderr.is_empty() {
                    write!(f, ": {}", stderr)?;
                }
                Ok(())
            }
            AcquireError::Ccache(e) => write!(f, "{}", e),
            AcquireError::NoTicket(spn) => {
                write!(f, "No service ticket for {} in credential cache", spn)
            }
        }
    }
}

impl std::error::Error for AcquireError {}

impl From<CcacheError> for AcquireError {
    fn from(err: CcacheError) -> Self {
        AcquireError::Ccache(err)
    }
}

/// Reads tickets that are already present in a credential cache.
pub struct CachedTicketAcquirer {
    ccache: PathBuf,
}

impl CachedTicketAcquirer {
    pub fn new(ccache: PathBuf) -> Self {
        Self { ccache }
    }

    pub fn ccache(&self) -> &Path {
        &self.ccache
    }
}

impl TicketAcquirer for CachedTicketAcquirer {
    fn acquire(&self, spn: &str) -> Result<Vec<u8>, AcquireError> {
        let cache = ccache::parse_ccache_file(&self.ccache)?;
        let cred = cache
            .find_service_ticket(spn)
            .ok_or_else(|| AcquireError::NoTicket(spn.to_string()))?;

        debug!(
            "Found {} byte ticket for {} (keytype {})",
            cred.ticket.len(),
            cred.server,
            cred.keytype
        );
        Ok(cred.ticket.clone())
    }
}

/// Requests each ticket with `kvno`, which stores it in the credential
/// cache, then reads it back from there.
pub struct KvnoAcquirer {
    program: String,
    cached: CachedTicketAcquirer,
}

impl KvnoAcquirer {
    pub fn with_program(program: &str, ccache: PathBuf) -> Self {
        Self {
            program: program.to_string(),
            cached: CachedTicketAcquirer::new(ccache),
        }
    }
}

impl TicketAcquirer for KvnoAcquirer {
    fn acquire(&self, spn: &str) -> Result<Vec<u8>, AcquireError> {
        info!("Requesting service ticket for {}", spn);

        let ccname = format!("FILE:{}", self.cached.ccache().display());
        let output = Command::new(&self.program)
            .arg(spn)
            .env(KRB5CCNAME, &ccname)
            .output()
            .map_err(|source| AcquireError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(AcquireError::Denied {
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        debug!(
            "{}: {}",
            self.program,
            String::from_utf8_lossy(&output.stdout).trim()
        );
        self.cached.acquire(spn)
    }
}
