use ldap3::{LdapConn, LdapConnSettings, LdapError};
use std::time::Duration;

const CONNECTION_TIMEOUT_SECS: u64 = 30;
const GLOBAL_CATALOG_PORT: u16 = 3268;
const GLOBAL_CATALOG_TLS_PORT: u16 = 3269;

#[derive(Clone)]
pub struct DirectoryConfig {
    pub username: String,
    pub password: String,
    pub domain: String,
    pub dc_host: String,
    pub secure_ldaps: bool,
    pub kerberos: bool,
}

impl DirectoryConfig {
    /// Global Catalog URL: forest-wide view instead of a single domain.
    pub fn global_catalog_url(&self) -> String {
        if self.secure_ldaps {
            format!("ldaps://{}:{}", self.dc_host, GLOBAL_CATALOG_TLS_PORT)
        } else {
            format!("ldap://{}:{}", self.dc_host, GLOBAL_CATALOG_PORT)
        }
    }

    pub fn bind_dn(&self) -> String {
        format!("{}@{}", self.username, self.domain)
    }
}

pub fn connect_global_catalog(config: &DirectoryConfig) -> Result<LdapConn, LdapError> {
    let settings = LdapConnSettings::new()
        .set_conn_timeout(Duration::from_secs(CONNECTION_TIMEOUT_SECS))
        .set_no_tls_verify(true);

    let url = config.global_catalog_url();
    log::info!("Connecting to Global Catalog at {}", url);
    let mut ldap = LdapConn::with_settings(settings, &url)?;

    if config.kerberos {
        gssapi_bind(&mut ldap, &config.dc_host)?;
    } else {
        ldap.simple_bind(&config.bind_dn(), &config.password)?
            .success()?;
    }

    log::debug!("Bound to {} as {}", url, config.bind_dn());
    Ok(ldap)
}

#[cfg(any(target_os = "linux", target_os = "windows"))]
fn gssapi_bind(ldap: &mut LdapConn, server: &str) -> Result<(), LdapError> {
    log::info!("Using Kerberos authentication for LDAP");
    ldap.sasl_gssapi_bind(server)?.success()?;
    Ok(())
}

#[cfg(not(any(target_os = "linux", target_os = "windows")))]
fn gssapi_bind(_ldap: &mut LdapConn, _server: &str) -> Result<(), LdapError> {
    Err(LdapError::Io {
        source: std::io::Error::new(
            std::io::ErrorKind::Other,
            "Kerberos LDAP bind is not supported on this platform",
        ),
    })
}

pub fn escape_filter(input: &str) -> String {
    input
        .replace('\\', "\\5C")
        .replace('*', "\\2A")
        .replace('(', "\\28")
        .replace(')', "\\29")
        .replace('\0', "\\00")
}
