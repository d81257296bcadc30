//! Locates the encrypted part of a Kerberos service ticket.
//!
//! Accepts a bare `Ticket`, an `AP-REQ` (optionally wrapped in a GSS-API
//! initial context token), a `TGS-REP` or a `KRB-CRED`. The outer tag picks
//! the message type and `kerberos_asn1` parses the structure.

use crate::kerberos::EncryptionType;
use crate::record::CipherPayload;
use kerberos_asn1::{ApReq, Asn1Object, KrbCred, TgsRep, Ticket};
use log::{debug, trace};
use std::fmt;

const fn application(n: u8) -> u8 {
    0x60 | n
}

const GSS_TOKEN: u8 = application(0);
const TICKET: u8 = application(1);
const TGS_REP: u8 = application(13);
const AP_REQ: u8 = application(14);
const KRB_CRED: u8 = application(22);

const TAG_OID: u8 = 0x06;
/// 1.2.840.113554.1.2.2
const KRB5_OID: &[u8] = &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x12, 0x01, 0x02, 0x02];
/// 1.2.840.48018.1.2.2, the legacy Microsoft alias
const MS_KRB5_OID: &[u8] = &[0x2a, 0x86, 0x48, 0x82, 0xf7, 0x12, 0x01, 0x02, 0x02];
const TOK_ID_AP_REQ: &[u8] = &[0x01, 0x00];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    Empty,
    UnsupportedMessage(u8),
    /// Malformed GSS-API framing around an AP-REQ.
    InvalidToken(String),
    Asn1 {
        message: &'static str,
        detail: String,
    },
    /// KRB-CRED without any ticket.
    NoTicket,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Empty => write!(f, "empty ticket blob"),
            DecodeError::UnsupportedMessage(tag) => {
                write!(f, "unsupported Kerberos message (tag 0x{:02x})", tag)
            }
            DecodeError::InvalidToken(reason) => write!(f, "invalid GSS-API token: {}", reason),
            DecodeError::Asn1 { message, detail } => {
                write!(f, "unable to parse {}: {}", message, detail)
            }
            DecodeError::NoTicket => write!(f, "KRB-CRED carries no ticket"),
        }
    }
}

impl std::error::Error for DecodeError {}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedTicket {
    pub etype: EncryptionType,
    pub cipher: CipherPayload,
    pub realm: String,
    pub service: String,
    pub kvno: Option<u32>,
}

impl From<Ticket> for DecodedTicket {
    fn from(ticket: Ticket) -> Self {
        Self {
            etype: EncryptionType::from_code(ticket.enc_part.etype),
            cipher: CipherPayload::new(ticket.enc_part.cipher),
            realm: ticket.realm,
            service: ticket.sname.name_string.join("/"),
            kvno: ticket.enc_part.kvno,
        }
    }
}

/// Encryption type and cipher octets of the ticket carried by `raw`.
pub fn decode(raw: &[u8]) -> Result<(EncryptionType, CipherPayload), DecodeError> {
    let ticket = decode_ticket_message(raw)?;
    Ok((ticket.etype, ticket.cipher))
}

pub fn decode_ticket_message(raw: &[u8]) -> Result<DecodedTicket, DecodeError> {
    let tag = *raw.first().ok_or(DecodeError::Empty)?;

    let ticket = match tag {
        TICKET => parsed(Ticket::parse(raw), "Ticket")?,
        AP_REQ => {
            trace!("Message is an AP-REQ");
            parsed(ApReq::parse(raw), "AP-REQ")?.ticket
        }
        GSS_TOKEN => {
            trace!("Message is a GSS-API token");
            let ap_req = strip_gss_header(raw)?;
            parsed(ApReq::parse(ap_req), "AP-REQ")?.ticket
        }
        TGS_REP => {
            trace!("Message is a TGS-REP");
            parsed(TgsRep::parse(raw), "TGS-REP")?.ticket
        }
        KRB_CRED => {
            trace!("Message is a KRB-CRED");
            parsed(KrbCred::parse(raw), "KRB-CRED")?
                .tickets
                .into_iter()
                .next()
                .ok_or(DecodeError::NoTicket)?
        }
        other => return Err(DecodeError::UnsupportedMessage(other)),
    };

    let decoded = DecodedTicket::from(ticket);
    debug!(
        "Ticket for {} in {}: etype {}, {} cipher bytes",
        decoded.service,
        decoded.realm,
        decoded.etype,
        decoded.cipher.len()
    );
    Ok(decoded)
}

fn parsed<T, E: fmt::Debug>(
    result: Result<(&[u8], T), E>,
    message: &'static str,
) -> Result<T, DecodeError> {
    let (rest, value) = result.map_err(|e| DecodeError::Asn1 {
        message,
        detail: format!("{:?}", e),
    })?;
    if !rest.is_empty() {
        debug!("Ignoring {} bytes after the {}", rest.len(), message);
    }
    Ok(value)
}

/// AP-REQ bytes inside `[APPLICATION 0] { mech OID, tok-id 01 00, AP-REQ }`.
fn strip_gss_header(token: &[u8]) -> Result<&[u8], DecodeError> {
    let (_, inner, _) = split_element(token)?;
    let (tag, oid, rest) = split_element(inner)?;
    if tag != TAG_OID {
        return Err(DecodeError::InvalidToken(format!(
            "expected mechanism OID, found tag 0x{:02x}",
            tag
        )));
    }
    if oid != KRB5_OID && oid != MS_KRB5_OID {
        return Err(DecodeError::InvalidToken(format!(
            "mechanism {} is not Kerberos",
            hex::encode(oid)
        )));
    }

    match take(rest, TOK_ID_AP_REQ.len()) {
        Some((tok_id, ap_req)) if tok_id == TOK_ID_AP_REQ => Ok(ap_req),
        Some((tok_id, _)) => Err(DecodeError::InvalidToken(format!(
            "token id {} is not an AP-REQ",
            hex::encode(tok_id)
        ))),
        None => Err(DecodeError::InvalidToken("missing token id".to_string())),
    }
}

/// `(tag, content, rest)` of the DER element at the start of `data`.
fn split_element(data: &[u8]) -> Result<(u8, &[u8], &[u8]), DecodeError> {
    let truncated = || DecodeError::InvalidToken("truncated header".to_string());

    let (&tag, data) = data.split_first().ok_or_else(truncated)?;
    let (&first, data) = data.split_first().ok_or_else(truncated)?;

    let (len, data) = if first < 0x80 {
        (first as usize, data)
    } else {
        let octets = (first & 0x7f) as usize;
        if octets == 0 || octets > 4 {
            return Err(DecodeError::InvalidToken(format!(
                "unsupported length form 0x{:02x}",
                first
            )));
        }
        let (bytes, data) = take(data, octets).ok_or_else(truncated)?;
        let len = bytes.iter().fold(0usize, |acc, b| (acc << 8) | *b as usize);
        (len, data)
    };

    let (content, rest) = take(data, len).ok_or_else(truncated)?;
    Ok((tag, content, rest))
}

fn take(data: &[u8], n: usize) -> Option<(&[u8], &[u8])> {
    (data.len() >= n).then(|| data.split_at(n))
}
