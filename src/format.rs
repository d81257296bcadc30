//! Crack formats consumed by hashcat, John the Ripper and kerberoast tools.

use crate::error::{Error, Result};
use crate::kerberos::EncryptionType;
use crate::record::CrackRecord;
use log::info;
use std::fmt;

/// First 16 bytes of an RC4-HMAC cipher are the HMAC checksum.
pub const CHECKSUM_HEX_LEN: usize = 32;

/// Two literal characters, not a line break.
pub const DUMP_SEPARATOR: &str = "\\n";

/// Which half of the cipher a John line starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JohnOrder {
    #[default]
    EdataFirst,
    ChecksumFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrackFormat {
    Hashcat,
    John(JohnOrder),
    Kerberoast,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EncodedOutput {
    Records(Vec<CrackRecord>),
    Lines(Vec<String>),
    Dump(String),
}

impl EncodedOutput {
    /// UTF-8 text as written to a file or the terminal.
    pub fn to_text(&self) -> Result<String> {
        match self {
            EncodedOutput::Records(records) => records_to_csv(records),
            EncodedOutput::Lines(lines) if lines.is_empty() => Ok(String::new()),
            EncodedOutput::Lines(lines) => Ok(format!("{}\n", lines.join("\n"))),
            EncodedOutput::Dump(blob) => Ok(blob.clone()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            EncodedOutput::Records(records) => records.len(),
            EncodedOutput::Lines(lines) => lines.len(),
            EncodedOutput::Dump(blob) if blob.is_empty() => 0,
            EncodedOutput::Dump(blob) => blob.split(DUMP_SEPARATOR).count(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn records_to_csv(records: &[CrackRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(["SPN", "Principal", "EncryptionType", "CipherPayload"])?;
    for record in records {
        wtr.write_record([
            record.spn.clone(),
            record.principal.to_string(),
            record.etype.to_string(),
            record.payload.to_hex(),
        ])?;
    }
    let data = wtr
        .into_inner()
        .map_err(|e| Error::IOError("Failed to flush CSV output".to_string(), e.into_error()))?;
    Ok(String::from_utf8_lossy(&data).into_owned())
}

#[derive(Debug, Clone, PartialEq)]
pub enum MismatchReason {
    UnsupportedAlgorithm(EncryptionType),
    PayloadTooShort(usize),
}

/// A record the requested format had to leave out.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatMismatch {
    pub spn: String,
    pub reason: MismatchReason,
}

impl fmt::Display for FormatMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            MismatchReason::UnsupportedAlgorithm(etype) => write!(
                f,
                "{} uses {}, only RC4-HMAC can be written in this format",
                self.spn, etype
            ),
            MismatchReason::PayloadTooShort(len) => write!(
                f,
                "{} has a {} byte cipher, too short to hold a checksum",
                self.spn, len
            ),
        }
    }
}

#[derive(Debug)]
pub struct Encoding {
    pub output: EncodedOutput,
    pub mismatches: Vec<FormatMismatch>,
}

pub fn encode(records: Vec<CrackRecord>, format: Option<CrackFormat>) -> Encoding {
    let mut mismatches = Vec::new();

    let output = match format {
        None => EncodedOutput::Records(records),
        Some(CrackFormat::Kerberoast) => EncodedOutput::Dump(
            records
                .iter()
                .map(|r| r.payload.to_hex())
                .collect::<Vec<_>>()
                .join(DUMP_SEPARATOR),
        ),
        Some(CrackFormat::Hashcat) => EncodedOutput::Lines(rc4_lines(
            &records,
            &mut mismatches,
            |etype, checksum, edata| format!("$krb5tgs${}${}${}", etype, checksum, edata),
        )),
        Some(CrackFormat::John(order)) => EncodedOutput::Lines(rc4_lines(
            &records,
            &mut mismatches,
            |etype, checksum, edata| match order {
                JohnOrder::EdataFirst => format!("$krb5tgs${}${}${}", etype, edata, checksum),
                JohnOrder::ChecksumFirst => {
                    format!("$krb5tgs${}${}${}", etype, checksum, edata)
                }
            },
        )),
    };

    for mismatch in &mismatches {
        info!("Not encoded: {}", mismatch);
    }

    Encoding { output, mismatches }
}

fn rc4_lines<F>(records: &[CrackRecord], mismatches: &mut Vec<FormatMismatch>, line: F) -> Vec<String>
where
    F: Fn(i32, &str, &str) -> String,
{
    let mut lines = Vec::new();
    for record in records {
        if !record.etype.is_rc4() {
            mismatches.push(FormatMismatch {
                spn: record.spn.clone(),
                reason: MismatchReason::UnsupportedAlgorithm(record.etype),
            });
            continue;
        }

        match split_checksum(&record.payload.to_hex()) {
            Some((checksum, edata)) => lines.push(line(record.etype.code(), checksum, edata)),
            None => mismatches.push(FormatMismatch {
                spn: record.spn.clone(),
                reason: MismatchReason::PayloadTooShort(record.payload.len()),
            }),
        }
    }
    lines
}

/// (checksum, remainder) of a hex payload; both halves must be non-empty.
pub fn split_checksum(hex: &str) -> Option<(&str, &str)> {
    if hex.len() <= CHECKSUM_HEX_LEN {
        return None;
    }
    Some(hex.split_at(CHECKSUM_HEX_LEN))
}
