use crate::kerberos::ccache::CcacheError;
use ldap3::LdapError;
use std::fmt;
use std::io;
use std::result;

pub type Result<T> = result::Result<T, Error>;

/// Failures that end a whole invocation. Per-SPN problems never end up here.
#[derive(Debug)]
pub enum Error {
    /// The batch finished without a single record.
    EmptyBatch,

    /// Could not open or bind the directory connection.
    Directory(LdapError),

    /// The credential cache location is unusable.
    Ccache(CcacheError),

    /// Errors due to IO, such as failures writing the output file.
    IOError(String, io::Error),

    Csv(csv::Error),

    String(String),
}

impl Error {
    pub fn is_empty_batch(&self) -> bool {
        matches!(self, Error::EmptyBatch)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyBatch => write!(f, "No tickets retrieved"),
            Error::Directory(e) => write!(f, "Directory error: {}", e),
            Error::Ccache(e) => write!(f, "{}", e),
            Error::IOError(desc, e) => write!(f, "{}: {}", desc, e),
            Error::Csv(e) => write!(f, "CSV error: {}", e),
            Error::String(s) => write!(f, "{}", s),
        }
    }
}

impl std::error::Error for Error {}

impl From<LdapError> for Error {
    fn from(error: LdapError) -> Self {
        Self::Directory(error)
    }
}

impl From<CcacheError> for Error {
    fn from(error: CcacheError) -> Self {
        Self::Ccache(error)
    }
}

impl From<csv::Error> for Error {
    fn from(error: csv::Error) -> Self {
        Self::Csv(error)
    }
}

impl From<(&str, io::Error)> for Error {
    fn from(error: (&str, io::Error)) -> Self {
        Self::IOError(error.0.into(), error.1)
    }
}

impl From<String> for Error {
    fn from(error: String) -> Self {
        Self::String(error)
    }
}

impl From<&str> for Error {
    fn from(error: &str) -> Self {
        Self::String(error.to_string())
    }
}
