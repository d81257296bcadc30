use crate::kerberos::EncryptionType;
use std::fmt;

pub const UNKNOWN_PRINCIPAL: &str = "unknown";

/// Owner of an SPN as reported by the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    Resolved(String),
    Unknown,
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Principal::Resolved(upn) => write!(f, "{}", upn),
            Principal::Unknown => write!(f, "{}", UNKNOWN_PRINCIPAL),
        }
    }
}

/// Raw `enc-part.cipher` octets of a service ticket.
#[derive(Clone, PartialEq, Eq)]
pub struct CipherPayload(Vec<u8>);

impl CipherPayload {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl From<&[u8]> for CipherPayload {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl fmt::Debug for CipherPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CipherPayload({} bytes)", self.0.len())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrackRecord {
    pub spn: String,
    pub principal: Principal,
    pub etype: EncryptionType,
    pub payload: CipherPayload,
}

/// Why an SPN produced no record.
#[derive(Debug)]
pub enum SkipReason {
    Acquire(crate::kerberos::AcquireError),
    Decode(crate::kerberos::DecodeError),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Acquire(e) => write!(f, "ticket request failed: {}", e),
            SkipReason::Decode(e) => write!(f, "ticket could not be decoded: {}", e),
        }
    }
}

#[derive(Debug)]
pub struct Skipped {
    pub index: usize,
    pub spn: String,
    pub reason: SkipReason,
}

/// Everything one batch run accumulates. Owned by a single invocation.
#[derive(Debug, Default)]
pub struct BatchContext {
    records: Vec<(usize, CrackRecord)>,
    skipped: Vec<Skipped>,
    seen: usize,
}

impl BatchContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_record(&mut self, index: usize, record: CrackRecord) {
        self.seen += 1;
        self.records.push((index, record));
    }

    pub fn push_skipped(&mut self, skipped: Skipped) {
        self.seen += 1;
        self.skipped.push(skipped);
    }

    /// Number of SPNs processed so far, recorded or skipped.
    pub fn seen(&self) -> usize {
        self.seen
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn skipped(&self) -> &[Skipped] {
        &self.skipped
    }

    /// Restores input order after an unordered (pooled) run.
    pub fn sort_by_input(&mut self) {
        self.records.sort_by_key(|(index, _)| *index);
        self.skipped.sort_by_key(|s| s.index);
    }

    pub fn records(&self) -> impl Iterator<Item = &CrackRecord> {
        self.records.iter().map(|(_, record)| record)
    }

    pub fn into_parts(self) -> (Vec<CrackRecord>, Vec<Skipped>) {
        let records = self.records.into_iter().map(|(_, record)| record).collect();
        (records, self.skipped)
    }
}
