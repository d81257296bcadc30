use crate::kerberos::ccache::{CachePrincipal, CcacheError, CcacheFile, Credential};
use byteorder::{BigEndian, ReadBytesExt};
use std::fs;
use std::io::{self, Cursor, Read};
use std::path::Path;

const CCACHE_V4: u16 = 0x0504;
const CCACHE_V3: u16 = 0x0503;

/// Upper bound for any counted field; larger values mean a corrupt file.
const MAX_COUNTED_LEN: u32 = 16 * 1024 * 1024;

pub fn parse_ccache_file(path: &Path) -> Result<CcacheFile, CcacheError> {
    let buffer = fs::read(path).map_err(|e| {
        CcacheError::Io(format!("Failed to read ccache {}", path.display()), e)
    })?;
    parse_ccache_bytes(&buffer)
}

pub fn parse_ccache_bytes(data: &[u8]) -> Result<CcacheFile, CcacheError> {
    let mut cursor = Cursor::new(data);

    let version = cursor.read_u16::<BigEndian>()?;
    match version {
        CCACHE_V4 => {
            let tag_len = cursor.read_u16::<BigEndian>()?;
            skip(&mut cursor, tag_len as u64)?;
        }
        CCACHE_V3 => {}
        _ => return Err(CcacheError::UnsupportedVersion(version)),
    }

    let default_principal = parse_principal(&mut cursor)?;

    let mut credentials = Vec::new();
    while cursor.position() < data.len() as u64 {
        match parse_credential(&mut cursor) {
            Ok(cred) => credentials.push(cred),
            Err(CcacheError::Io(_, ref e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
                log::debug!("Ignoring truncated credential at end of ccache");
                break;
            }
            Err(e) => return Err(e),
        }
    }

    log::debug!(
        "Parsed ccache v0x{:04x} for {} with {} credential(s)",
        version,
        default_principal,
        credentials.len()
    );

    Ok(CcacheFile {
        version,
        default_principal,
        credentials,
    })
}

fn parse_principal(cursor: &mut Cursor<&[u8]>) -> Result<CachePrincipal, CcacheError> {
    let name_type = cursor.read_u32::<BigEndian>()?;
    let num_components = cursor.read_u32::<BigEndian>()?;

    let realm = parse_counted_string(cursor)?;

    let mut components = Vec::new();
    for _ in 0..num_components {
        components.push(parse_counted_string(cursor)?);
    }

    Ok(CachePrincipal {
        name_type,
        realm,
        components,
    })
}

fn parse_credential(cursor: &mut Cursor<&[u8]>) -> Result<Credential, CcacheError> {
    let client = parse_principal(cursor)?;
    let server = parse_principal(cursor)?;

    let keytype = cursor.read_u16::<BigEndian>()?;
    parse_counted_data(cursor)?;

    // authtime, starttime, endtime, renew_till
    let _auth_time = cursor.read_u32::<BigEndian>()?;
    let _start_time = cursor.read_u32::<BigEndian>()?;
    let end_time = cursor.read_u32::<BigEndian>()?;
    let _renew_till = cursor.read_u32::<BigEndian>()?;

    let _is_skey = cursor.read_u8()?;
    let _ticket_flags = cursor.read_u32::<BigEndian>()?;

    let num_addrs = cursor.read_u32::<BigEndian>()?;
    for _ in 0..num_addrs {
        cursor.read_u16::<BigEndian>()?;
        parse_counted_data(cursor)?;
    }

    let num_authdata = cursor.read_u32::<BigEndian>()?;
    for _ in 0..num_authdata {
        cursor.read_u16::<BigEndian>()?;
        parse_counted_data(cursor)?;
    }

    let ticket = parse_counted_data(cursor)?;
    let _second_ticket = parse_counted_data(cursor)?;

    Ok(Credential {
        client,
        server,
        keytype,
        end_time,
        ticket,
    })
}

fn parse_counted_string(cursor: &mut Cursor<&[u8]>) -> Result<String, CcacheError> {
    let data = parse_counted_data(cursor)?;
    String::from_utf8(data).map_err(|e| CcacheError::InvalidFormat(format!("Invalid UTF-8: {}", e)))
}

fn parse_counted_data(cursor: &mut Cursor<&[u8]>) -> Result<Vec<u8>, CcacheError> {
    let len = cursor.read_u32::<BigEndian>()?;
    if len > MAX_COUNTED_LEN {
        return Err(CcacheError::InvalidFormat(format!(
            "Field of {} bytes at offset {}",
            len,
            cursor.position()
        )));
    }
    let mut data = vec![0u8; len as usize];
    cursor.read_exact(&mut data)?;
    Ok(data)
}

fn skip(cursor: &mut Cursor<&[u8]>, n: u64) -> Result<(), CcacheError> {
    let target = cursor.position() + n;
    if target > cursor.get_ref().len() as u64 {
        return Err(CcacheError::InvalidFormat("Header tags overrun file".to_string()));
    }
    cursor.set_position(target);
    Ok(())
}
