//! MIT credential cache (ccache) support: where the platform Kerberos stack
//! keeps the service tickets it obtained.

pub mod locator;
pub mod parser;

pub use locator::{parse_krb5ccname, resolve_ccache_path, CcacheLocation};
pub use parser::{parse_ccache_bytes, parse_ccache_file};

use std::fmt;
use std::io;

#[derive(Debug)]
pub enum CcacheError {
    Io(String, io::Error),
    InvalidFormat(String),
    UnsupportedVersion(u16),
    UnsupportedLocation(String),
    NotFound(String),
}

impl From<io::Error> for CcacheError {
    fn from(err: io::Error) -> Self {
        CcacheError::Io("Failed to read credential cache".to_string(), err)
    }
}

impl fmt::Display for CcacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CcacheError::Io(desc, e) => write!(f, "{}: {}", desc, e),
            CcacheError::InvalidFormat(s) => write!(f, "Invalid ccache format: {}", s),
            CcacheError::UnsupportedVersion(v) => {
                write!(f, "Unsupported ccache version: 0x{:04x}", v)
            }
            CcacheError::UnsupportedLocation(s) => write!(f, "{}", s),
            CcacheError::NotFound(s) => write!(f, "{}", s),
        }
    }
}

impl std::error::Error for CcacheError {}

#[derive(Debug, Clone)]
pub struct CcacheFile {
    pub version: u16,
    pub default_principal: CachePrincipal,
    pub credentials: Vec<Credential>,
}

impl CcacheFile {
    /// Most recently stored ticket whose server principal is `spn`.
    pub fn find_service_ticket(&self, spn: &str) -> Option<&Credential> {
        self.credentials
            .iter()
            .rev()
            .find(|cred| cred.server.matches_spn(spn))
    }
}

#[derive(Debug, Clone)]
pub struct CachePrincipal {
    pub name_type: u32,
    pub realm: String,
    pub components: Vec<String>,
}

impl CachePrincipal {
    pub fn name(&self) -> String {
        self.components.join("/")
    }

    /// Compares against `service/host[:port]`, ignoring case and any realm.
    pub fn matches_spn(&self, spn: &str) -> bool {
        let bare = spn.split('@').next().unwrap_or(spn);
        !self.components.is_empty() && self.name().eq_ignore_ascii_case(bare)
    }
}

impl fmt::Display for CachePrincipal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name(), self.realm)
    }
}

#[derive(Debug, Clone)]
pub struct Credential {
    pub client: CachePrincipal,
    pub server: CachePrincipal,
    pub keytype: u16,
    pub end_time: u32,
    pub ticket: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(components: &[&str]) -> CachePrincipal {
        CachePrincipal {
            name_type: 2,
            realm: "CORP.LOCAL".to_string(),
            components: components.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn credential(server: &[&str], ticket: &[u8]) -> Credential {
        Credential {
            client: principal(&["alice"]),
            server: principal(server),
            keytype: 23,
            end_time: 0,
            ticket: ticket.to_vec(),
        }
    }

    #[test]
    fn test_spn_matching() {
        let p = principal(&["MSSQLSvc", "db01.corp.local:1433"]);
        assert!(p.matches_spn("MSSQLSvc/db01.corp.local:1433"));
        assert!(p.matches_spn("mssqlsvc/DB01.corp.local:1433@CORP.LOCAL"));
        assert!(!p.matches_spn("MSSQLSvc/db01.corp.local"));
        assert!(!principal(&[]).matches_spn(""));
    }

    #[test]
    fn test_latest_ticket_wins() {
        let ccache = CcacheFile {
            version: 0x0504,
            default_principal: principal(&["alice"]),
            credentials: vec![
                credential(&["krbtgt", "CORP.LOCAL"], &[0]),
                credential(&["HTTP", "web01"], &[1]),
                credential(&["HTTP", "web01"], &[2]),
            ],
        };
        let found = ccache.find_service_ticket("HTTP/web01").unwrap();
        assert_eq!(found.ticket, vec![2]);
        assert!(ccache.find_service_ticket("cifs/web01").is_none());
    }
}
