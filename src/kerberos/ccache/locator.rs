use crate::kerberos::ccache::CcacheError;
use std::path::{Path, PathBuf};

pub const KRB5CCNAME: &str = "KRB5CCNAME";

#[derive(Debug, Clone, PartialEq)]
pub enum CcacheLocation {
    File(PathBuf),
    Dir(String),
    Keyring(String),
    Kcm,
}

pub fn parse_krb5ccname(env_value: &str) -> CcacheLocation {
    if let Some(path) = env_value.strip_prefix("FILE:") {
        CcacheLocation::File(PathBuf::from(path))
    } else if let Some(dir) = env_value.strip_prefix("DIR:") {
        CcacheLocation::Dir(dir.to_string())
    } else if env_value.starts_with("KEYRING:") {
        CcacheLocation::Keyring(env_value.to_string())
    } else if env_value.starts_with("KCM:") {
        CcacheLocation::Kcm
    } else {
        CcacheLocation::File(PathBuf::from(env_value))
    }
}

/// Credential cache file to read tickets from: `explicit`, else
/// `KRB5CCNAME`, else the platform default.
pub fn resolve_ccache_path(explicit: Option<&Path>) -> Result<PathBuf, CcacheError> {
    if let Some(path) = explicit {
        return existing_file(path.to_path_buf());
    }

    if let Ok(value) = std::env::var(KRB5CCNAME) {
        log::debug!("Using {}={}", KRB5CCNAME, value);
        return match parse_krb5ccname(&value) {
            CcacheLocation::File(path) => existing_file(path),
            CcacheLocation::Dir(_) => Err(CcacheError::UnsupportedLocation(
                "DIR: ccache collections are not supported".to_string(),
            )),
            CcacheLocation::Keyring(_) => Err(CcacheError::UnsupportedLocation(
                "KEYRING: ccache type is not supported".to_string(),
            )),
            CcacheLocation::Kcm => Err(CcacheError::UnsupportedLocation(
                "KCM: ccache type is not supported".to_string(),
            )),
        };
    }

    default_ccache().ok_or_else(|| {
        CcacheError::NotFound("No ccache file found. Use --ccache or set KRB5CCNAME".to_string())
    })
}

fn existing_file(path: PathBuf) -> Result<PathBuf, CcacheError> {
    if !path.exists() {
        Err(CcacheError::NotFound(format!(
            "Ccache file not found: {}",
            path.display()
        )))
    } else if !path.is_file() {
        Err(CcacheError::UnsupportedLocation(format!(
            "Path is not a file: {}",
            path.display()
        )))
    } else {
        Ok(path)
    }
}

#[cfg(unix)]
fn default_ccache() -> Option<PathBuf> {
    // SAFETY: getuid/geteuid take no arguments and cannot fail
    let (uid, euid) = unsafe { (libc::getuid(), libc::geteuid()) };

    [uid, euid]
        .iter()
        .map(|id| PathBuf::from(format!("/tmp/krb5cc_{}", id)))
        .find(|path| path.is_file())
}

#[cfg(not(unix))]
fn default_ccache() -> Option<PathBuf> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_krb5ccname() {
        assert_eq!(
            parse_krb5ccname("FILE:/tmp/krb5cc_1000"),
            CcacheLocation::File(PathBuf::from("/tmp/krb5cc_1000"))
        );
        assert_eq!(
            parse_krb5ccname("/home/alice/roast.ccache"),
            CcacheLocation::File(PathBuf::from("/home/alice/roast.ccache"))
        );
        assert_eq!(
            parse_krb5ccname("DIR:/run/user/1000/krb5cc"),
            CcacheLocation::Dir("/run/user/1000/krb5cc".to_string())
        );
        assert_eq!(
            parse_krb5ccname("KEYRING:persistent:1000"),
            CcacheLocation::Keyring("KEYRING:persistent:1000".to_string())
        );
        assert_eq!(parse_krb5ccname("KCM:1000"), CcacheLocation::Kcm);
    }

    #[test]
    fn test_explicit_missing_file() {
        let missing = std::env::temp_dir().join(format!("{}.ccache", uuid::Uuid::new_v4()));
        assert!(matches!(
            resolve_ccache_path(Some(&missing)),
            Err(CcacheError::NotFound(_))
        ));
    }
}
