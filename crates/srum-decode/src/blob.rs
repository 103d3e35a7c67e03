//! Structured blob decoding.

use srum_model::{CanonicalType, DecodedValue};

use crate::error::FieldDecodeError;
use crate::rules::BlobKind;

const NAME_OFFSET: usize = 4;
const SSID_OFFSET: usize = 36;
const SSID_LEN: usize = 32;

/// Smallest buffer that holds the SSID field.
pub const CHANNEL_HINTS_MIN_LEN: usize = SSID_OFFSET + SSID_LEN;

const CHANNEL_HINTS_FIELDS: &[(&str, CanonicalType)] = &[
    ("NameLength", CanonicalType::Integer),
    ("Name", CanonicalType::Text),
    ("SSID", CanonicalType::Text),
];

/// Fields a blob of `kind` decodes into, in output order.
pub fn blob_fields(kind: BlobKind) -> &'static [(&'static str, CanonicalType)] {
    match kind {
        BlobKind::ChannelHints => CHANNEL_HINTS_FIELDS,
    }
}

/// Decodes a structured blob into named fields.
pub fn decode_blob(kind: BlobKind, data: &[u8]) -> Result<DecodedValue, FieldDecodeError> {
    match kind {
        BlobKind::ChannelHints => channel_hints(data),
    }
}

/// `Channel Hints` layout: `NameLength` (u32 LE) at 0, `Name` bytes at 4,
/// 32 SSID bytes at 36 rendered as lowercase hex.
fn channel_hints(data: &[u8]) -> Result<DecodedValue, FieldDecodeError> {
    let malformed = |needed: usize| FieldDecodeError::MalformedBlob {
        kind: "channel hints",
        needed,
        actual: data.len(),
    };
    if data.len() < CHANNEL_HINTS_MIN_LEN {
        return Err(malformed(CHANNEL_HINTS_MIN_LEN));
    }
    let mut length = [0u8; 4];
    length.copy_from_slice(&data[..NAME_OFFSET]);
    let name_length = u32::from_le_bytes(length);

    let name_end = usize::try_from(name_length)
        .ok()
        .and_then(|len| len.checked_add(NAME_OFFSET))
        .ok_or_else(|| malformed(usize::MAX))?;
    if data.len() < name_end {
        return Err(malformed(name_end));
    }

    let name_bytes = &data[NAME_OFFSET..name_end];
    let name = match std::str::from_utf8(name_bytes) {
        Ok(text) => DecodedValue::text(text),
        Err(_) => DecodedValue::Bytes(name_bytes.to_vec()),
    };
    let ssid = hex::encode(&data[SSID_OFFSET..CHANNEL_HINTS_MIN_LEN]);

    Ok(DecodedValue::Fields(vec![
        ("NameLength".to_string(), DecodedValue::Integer(i64::from(name_length))),
        ("Name".to_string(), name),
        ("SSID".to_string(), DecodedValue::Text(ssid)),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hints(name: &[u8], declared_len: u32) -> Vec<u8> {
        let mut data = vec![0u8; CHANNEL_HINTS_MIN_LEN];
        data[..4].copy_from_slice(&declared_len.to_le_bytes());
        data[4..4 + name.len()].copy_from_slice(name);
        for (index, byte) in data[SSID_OFFSET..].iter_mut().enumerate() {
            *byte = 0xA0 + u8::try_from(index).expect("small index");
        }
        data
    }

    #[test]
    fn decodes_name_and_ssid() {
        let value = decode_blob(BlobKind::ChannelHints, &hints(b"test", 4)).expect("decode");
        let DecodedValue::Fields(fields) = value else {
            panic!("expected fields");
        };
        assert_eq!(fields[0], ("NameLength".to_string(), DecodedValue::Integer(4)));
        assert_eq!(fields[1], ("Name".to_string(), DecodedValue::text("test")));
        let DecodedValue::Text(ssid) = &fields[2].1 else {
            panic!("expected text ssid");
        };
        assert_eq!(ssid.len(), 64);
        assert!(ssid.starts_with("a0a1a2"));
        assert_eq!(ssid, &ssid.to_lowercase());
    }

    #[test]
    fn short_buffer_is_malformed() {
        let result = decode_blob(BlobKind::ChannelHints, &[4, 0, 0, 0, b't']);
        assert!(matches!(
            result,
            Err(FieldDecodeError::MalformedBlob { needed: 68, actual: 5, .. })
        ));
    }

    #[test]
    fn name_length_past_end_is_malformed() {
        let result = decode_blob(BlobKind::ChannelHints, &hints(b"", 200));
        assert!(matches!(
            result,
            Err(FieldDecodeError::MalformedBlob { needed: 204, .. })
        ));
    }

    #[test]
    fn non_utf8_name_stays_bytes() {
        let value = decode_blob(BlobKind::ChannelHints, &hints(&[0xFF, 0xFE], 2)).expect("decode");
        let DecodedValue::Fields(fields) = value else {
            panic!("expected fields");
        };
        assert_eq!(fields[1].1, DecodedValue::Bytes(vec![0xFF, 0xFE]));
    }

    #[test]
    fn declared_fields_match_decoded_fields() {
        let value = decode_blob(BlobKind::ChannelHints, &hints(b"abc", 3)).expect("decode");
        let DecodedValue::Fields(fields) = value else {
            panic!("expected fields");
        };
        let decoded: Vec<_> = fields.iter().map(|(name, _)| name.as_str()).collect();
        let declared: Vec<_> = blob_fields(BlobKind::ChannelHints)
            .iter()
            .map(|(name, _)| *name)
            .collect();
        assert_eq!(decoded, declared);
    }
}
