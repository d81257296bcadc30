//! SPN owner lookup against the directory.

use crate::ldap::{connect_global_catalog, escape_filter, DirectoryConfig};
use crate::record::Principal;
use ldap3::adapters::{Adapter, EntriesOnly, PagedResults};
use ldap3::{LdapConn, LdapError, Scope, SearchEntry};
use log::{debug, warn};

const PAGE_SIZE: i32 = 1000;
const UPN_ATTRIBUTE: &str = "userPrincipalName";

pub trait PrincipalResolver {
    fn resolve(&mut self, spn: &str) -> Principal;
}

/// Resolution switched off for the whole batch.
pub struct NoResolver;

impl PrincipalResolver for NoResolver {
    fn resolve(&mut self, _spn: &str) -> Principal {
        Principal::Unknown
    }
}

/// Global Catalog lookup. The connection lives as long as the resolver and
/// is unbound when it is dropped.
pub struct DirectoryResolver {
    ldap: LdapConn,
}

impl DirectoryResolver {
    pub fn connect(config: &DirectoryConfig) -> Result<Self, LdapError> {
        let ldap = connect_global_catalog(config)?;
        Ok(Self { ldap })
    }

    fn lookup(&mut self, spn: &str) -> Result<Option<String>, LdapError> {
        let filter = format!("(servicePrincipalName={})", escape_filter(spn));
        debug!("Executing LDAP search with filter: {}", filter);

        let adapters: Vec<Box<dyn Adapter<_, _>>> = vec![
            Box::new(EntriesOnly::new()),
            Box::new(PagedResults::new(PAGE_SIZE)),
        ];

        // Empty base on the Global Catalog covers every domain in the forest
        let mut search =
            self.ldap
                .streaming_search_with(adapters, "", Scope::Subtree, &filter, vec![UPN_ATTRIBUTE])?;

        let mut upn = None;
        while let Some(entry) = search.next()? {
            let entry = SearchEntry::construct(entry);
            if upn.is_none() {
                upn = entry
                    .attrs
                    .get(UPN_ATTRIBUTE)
                    .and_then(|values| values.first())
                    .cloned();
            }
        }
        search.result().success()?;

        Ok(upn)
    }
}

impl PrincipalResolver for DirectoryResolver {
    fn resolve(&mut self, spn: &str) -> Principal {
        let lookup = self.lookup(spn);
        principal_from_lookup(spn, lookup)
    }
}

/// Misses and failed queries both degrade to `Principal::Unknown`.
fn principal_from_lookup(spn: &str, lookup: Result<Option<String>, LdapError>) -> Principal {
    match lookup {
        Ok(Some(upn)) => {
            debug!("{} belongs to {}", spn, upn);
            Principal::Resolved(upn)
        }
        Ok(None) => {
            warn!("No directory account with a {} for {}", UPN_ATTRIBUTE, spn);
            Principal::Unknown
        }
        Err(e) => {
            warn!("Directory lookup for {} failed: {}", spn, e);
            Principal::Unknown
        }
    }
}

impl Drop for DirectoryResolver {
    fn drop(&mut self) {
        if let Err(e) = self.ldap.unbind() {
            debug!("LDAP unbind failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_resolution_is_unknown() {
        let mut resolver = NoResolver;
        assert_eq!(resolver.resolve("HTTP/svcA.example.com"), Principal::Unknown);
        assert_eq!(resolver.resolve(""), Principal::Unknown);
    }

    #[test]
    fn test_lookup_outcomes() {
        let spn = "MSSQLSvc/db01.corp.local:1433";
        assert_eq!(
            principal_from_lookup(spn, Ok(Some("svc_sql@corp.local".to_string()))),
            Principal::Resolved("svc_sql@corp.local".to_string())
        );
        assert_eq!(principal_from_lookup(spn, Ok(None)), Principal::Unknown);

        let failure = LdapError::Io {
            source: std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer"),
        };
        assert_eq!(principal_from_lookup(spn, Err(failure)), Principal::Unknown);
    }
}
