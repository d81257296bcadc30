//! DER builders for Kerberos test fixtures.

const TAG_INTEGER: u8 = 0x02;
const TAG_BIT_STRING: u8 = 0x03;
const TAG_OCTET_STRING: u8 = 0x04;
const TAG_OID: u8 = 0x06;
const TAG_GENERAL_STRING: u8 = 0x1b;
const TAG_SEQUENCE: u8 = 0x30;

const fn context(n: u8) -> u8 {
    0xa0 | n
}

const fn application(n: u8) -> u8 {
    0x60 | n
}

pub const KRB5_OID: [u8; 9] = [0x2a, 0x86, 0x48, 0x86, 0xf7, 0x12, 0x01, 0x02, 0x02];

pub fn tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    let len = content.len();
    if len < 0x80 {
        out.push(len as u8);
    } else {
        let bytes: Vec<u8> = (len as u32)
            .to_be_bytes()
            .iter()
            .copied()
            .skip_while(|b| *b == 0)
            .collect();
        out.push(0x80 | bytes.len() as u8);
        out.extend(bytes);
    }
    out.extend_from_slice(content);
    out
}

pub fn integer(value: i32) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    while start < 3 {
        let redundant = (bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
            || (bytes[start] == 0xff && bytes[start + 1] & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    tlv(TAG_INTEGER, &bytes[start..])
}

pub fn explicit(n: u8, inner: &[u8]) -> Vec<u8> {
    tlv(context(n), inner)
}

pub fn sequence(fields: &[Vec<u8>]) -> Vec<u8> {
    tlv(TAG_SEQUENCE, &fields.concat())
}

pub fn general_string(s: &str) -> Vec<u8> {
    tlv(TAG_GENERAL_STRING, s.as_bytes())
}

pub fn principal_name(name_type: i32, components: &[&str]) -> Vec<u8> {
    let strings: Vec<Vec<u8>> = components.iter().map(|c| general_string(c)).collect();
    sequence(&[
        explicit(0, &integer(name_type)),
        explicit(1, &sequence(&strings)),
    ])
}

pub fn encrypted_data(etype: i32, kvno: Option<i32>, cipher: &[u8]) -> Vec<u8> {
    let mut fields = vec![explicit(0, &integer(etype))];
    if let Some(kvno) = kvno {
        fields.push(explicit(1, &integer(kvno)));
    }
    fields.push(explicit(2, &tlv(TAG_OCTET_STRING, cipher)));
    sequence(&fields)
}

/// `Ticket` for `spn` (split on `/`) in `realm`.
pub fn ticket(realm: &str, spn: &str, etype: i32, cipher: &[u8]) -> Vec<u8> {
    let components: Vec<&str> = spn.split('/').collect();
    tlv(
        application(1),
        &sequence(&[
            explicit(0, &integer(5)),
            explicit(1, &general_string(realm)),
            explicit(2, &principal_name(2, &components)),
            explicit(3, &encrypted_data(etype, Some(2), cipher)),
        ]),
    )
}

/// `AP-REQ` carrying `ticket` followed by an authenticator.
pub fn ap_req(ticket: &[u8]) -> Vec<u8> {
    tlv(
        application(14),
        &sequence(&[
            explicit(0, &integer(5)),
            explicit(1, &integer(14)),
            explicit(2, &tlv(TAG_BIT_STRING, &[0x00, 0x20, 0x00, 0x00, 0x00])),
            explicit(3, ticket),
            explicit(4, &encrypted_data(23, None, &[0xee; 40])),
        ]),
    )
}

/// GSS-API initial context token wrapping an AP-REQ.
pub fn gss_token(ap_req: &[u8]) -> Vec<u8> {
    let mut inner = tlv(TAG_OID, &KRB5_OID);
    inner.extend_from_slice(&[0x01, 0x00]);
    inner.extend_from_slice(ap_req);
    tlv(application(0), &inner)
}

pub fn tgs_rep(realm: &str, ticket: &[u8]) -> Vec<u8> {
    tlv(
        application(13),
        &sequence(&[
            explicit(0, &integer(5)),
            explicit(1, &integer(13)),
            explicit(3, &general_string(realm)),
            explicit(4, &principal_name(1, &["alice"])),
            explicit(5, ticket),
            explicit(6, &encrypted_data(23, Some(1), &[0x11; 24])),
        ]),
    )
}

pub fn krb_cred(tickets: &[Vec<u8>]) -> Vec<u8> {
    tlv(
        application(22),
        &sequence(&[
            explicit(0, &integer(5)),
            explicit(1, &integer(22)),
            explicit(2, &sequence(tickets)),
            explicit(3, &encrypted_data(0, None, &[0x30, 0x00])),
        ]),
    )
}

/// Deterministic payload of `len` bytes.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 + 3) as u8).collect()
}
