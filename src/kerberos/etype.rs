use kerberos_constants::etypes::{
    AES128_CTS_HMAC_SHA1_96, AES256_CTS_HMAC_SHA1_96, DES_CBC_CRC, DES_CBC_MD5, RC4_HMAC,
};
use std::fmt;

/// Encryption type of a ticket's encrypted part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncryptionType {
    DesCbcCrc,
    DesCbcMd5,
    Aes128CtsHmacSha196,
    Aes256CtsHmacSha196,
    Rc4Hmac,
    Unknown(i32),
}

impl EncryptionType {
    pub fn from_code(code: i32) -> Self {
        match code {
            DES_CBC_CRC => EncryptionType::DesCbcCrc,
            DES_CBC_MD5 => EncryptionType::DesCbcMd5,
            AES128_CTS_HMAC_SHA1_96 => EncryptionType::Aes128CtsHmacSha196,
            AES256_CTS_HMAC_SHA1_96 => EncryptionType::Aes256CtsHmacSha196,
            RC4_HMAC => EncryptionType::Rc4Hmac,
            other => EncryptionType::Unknown(other),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            EncryptionType::DesCbcCrc => DES_CBC_CRC,
            EncryptionType::DesCbcMd5 => DES_CBC_MD5,
            EncryptionType::Aes128CtsHmacSha196 => AES128_CTS_HMAC_SHA1_96,
            EncryptionType::Aes256CtsHmacSha196 => AES256_CTS_HMAC_SHA1_96,
            EncryptionType::Rc4Hmac => RC4_HMAC,
            EncryptionType::Unknown(code) => *code,
        }
    }

    pub fn is_rc4(&self) -> bool {
        matches!(self, EncryptionType::Rc4Hmac)
    }
}

impl From<i32> for EncryptionType {
    fn from(code: i32) -> Self {
        Self::from_code(code)
    }
}

impl fmt::Display for EncryptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncryptionType::DesCbcCrc => write!(f, "DES-CBC-CRC"),
            EncryptionType::DesCbcMd5 => write!(f, "DES-CBC-MD5"),
            EncryptionType::Aes128CtsHmacSha196 => write!(f, "AES128-CTS-HMAC-SHA1-96"),
            EncryptionType::Aes256CtsHmacSha196 => write!(f, "AES256-CTS-HMAC-SHA1-96"),
            EncryptionType::Rc4Hmac => write!(f, "RC4-HMAC"),
            EncryptionType::Unknown(code) => write!(f, "Unknown({})", code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        let table = [
            (1, "DES-CBC-CRC"),
            (3, "DES-CBC-MD5"),
            (17, "AES128-CTS-HMAC-SHA1-96"),
            (18, "AES256-CTS-HMAC-SHA1-96"),
            (23, "RC4-HMAC"),
        ];
        for (code, name) in table {
            let etype = EncryptionType::from_code(code);
            assert_eq!(etype.to_string(), name);
            assert_eq!(etype.code(), code);
            assert!(!matches!(etype, EncryptionType::Unknown(_)));
        }
    }

    #[test]
    fn test_unknown_codes_keep_value() {
        for code in [0, 2, 16, 24, -128, i32::MAX] {
            let etype = EncryptionType::from(code);
            assert_eq!(etype, EncryptionType::Unknown(code));
            assert_eq!(etype.code(), code);
            assert_eq!(etype.to_string(), format!("Unknown({})", code));
        }
    }

    #[test]
    fn test_only_rc4_is_rc4() {
        assert!(EncryptionType::Rc4Hmac.is_rc4());
        assert!(!EncryptionType::Aes256CtsHmacSha196.is_rc4());
        assert!(!EncryptionType::Unknown(23 + 1).is_rc4());
    }
}
