//! Override-then-type decode dispatch.

use encoding_rs::UTF_16LE;
use srum_ingest::RawRecord;
use srum_model::{
    CanonicalType, ColumnDescriptor, DecodedValue, EseColumnType, NativeType, NumericKind,
    RegistryValueType,
};
use tracing::{trace, warn};
use uuid::Uuid;

use crate::blob::decode_blob;
use crate::context::{DecodeOutcome, RecordContext};
use crate::datetime::{ole_automation_date, windows_filetime};
use crate::error::{ConfigError, FieldDecodeError};
use crate::rules::{DecodeStrategy, RuleSet};
use crate::type_map::TypeMap;

/// Why a single column failed.
enum Failure {
    Field(FieldDecodeError),
    Config(ConfigError),
}

impl From<FieldDecodeError> for Failure {
    fn from(error: FieldDecodeError) -> Self {
        Failure::Field(error)
    }
}

impl From<ConfigError> for Failure {
    fn from(error: ConfigError) -> Self {
        Failure::Config(error)
    }
}

/// Decodes raw column values using a rule set and a type map.
#[derive(Debug, Clone, Copy)]
pub struct RecordDecoder<'a> {
    type_map: &'a TypeMap,
    rules: &'a RuleSet,
}

impl<'a> RecordDecoder<'a> {
    pub fn new(type_map: &'a TypeMap, rules: &'a RuleSet) -> Self {
        Self { type_map, rules }
    }

    /// Decodes every column of `record` in source column order.
    ///
    /// Field failures become nulls and are listed in the outcome; a
    /// configuration problem aborts with an error.
    pub fn decode_record(
        &self,
        table: &str,
        columns: &[ColumnDescriptor],
        record: &RawRecord,
    ) -> Result<DecodeOutcome, ConfigError> {
        let mut context = RecordContext::new(table);
        for (index, column) in columns.iter().enumerate() {
            let value = self.decode_field(column, record.value(index), &mut context)?;
            context.insert(column.name.as_str(), value);
        }
        Ok(context.into_outcome())
    }

    /// Decodes one value. The caller stores the result in `context`.
    pub fn decode_field(
        &self,
        column: &ColumnDescriptor,
        data: Option<&[u8]>,
        context: &mut RecordContext<'_>,
    ) -> Result<DecodedValue, ConfigError> {
        let Some(data) = data else {
            return Ok(DecodedValue::Null);
        };
        let rule = self.rules.resolve(context.table(), &column.name);
        let result = match rule {
            Some(rule) => self.apply(&rule.strategy, column, data, context),
            None => self.decode_default(context.table(), column, data),
        };
        match result {
            Ok(value) => {
                trace!(table = context.table(), column = %column.name, value = ?value, "Decoded field");
                Ok(value)
            }
            Err(Failure::Config(error)) => Err(error),
            Err(Failure::Field(error)) => {
                warn!(
                    table = context.table(),
                    column = %column.name,
                    native_type = %column.native_type,
                    error = %error,
                    "Field decode failed, storing null"
                );
                context.record_failure(&column.name, error);
                Ok(DecodedValue::Null)
            }
        }
    }

    fn apply(
        &self,
        strategy: &DecodeStrategy,
        column: &ColumnDescriptor,
        data: &[u8],
        context: &RecordContext<'_>,
    ) -> Result<DecodedValue, Failure> {
        let value = match strategy {
            DecodeStrategy::RawPassthrough => DecodedValue::Bytes(data.to_vec()),
            DecodeStrategy::FixedWidthNumeric(kind) => decode_numeric(*kind, data)?,
            DecodeStrategy::Utf16Le => DecodedValue::Text(decode_utf16le(data)?),
            DecodeStrategy::OleAutomationDate => {
                let days = f64::from_le_bytes(fixed::<8>(NumericKind::F64, data)?);
                DecodedValue::Timestamp(ole_automation_date(days)?)
            }
            DecodeStrategy::WindowsFileTime => {
                let ticks = u64::from_le_bytes(fixed::<8>(NumericKind::U64, data)?);
                DecodedValue::Timestamp(windows_filetime(ticks)?)
            }
            DecodeStrategy::StructuredBlob(kind) => decode_blob(*kind, data)?,
            DecodeStrategy::ConditionalOnSibling {
                sibling,
                predicate,
                then,
            } => {
                if predicate.matches(context.sibling(sibling)) {
                    self.apply(then, column, data, context)?
                } else {
                    DecodedValue::Bytes(data.to_vec())
                }
            }
        };
        Ok(value)
    }

    fn decode_default(
        &self,
        table: &str,
        column: &ColumnDescriptor,
        data: &[u8],
    ) -> Result<DecodedValue, Failure> {
        let unknown = || ConfigError::UnknownNativeType {
            column: column.name.clone(),
            native: column.native_type,
        };
        let canonical = self
            .type_map
            .canonical(column.native_type)
            .ok_or_else(unknown)?;
        let value = match canonical {
            CanonicalType::Integer | CanonicalType::Real => {
                let kind = column.native_type.numeric_kind().ok_or_else(unknown)?;
                decode_numeric(kind, data)?
            }
            CanonicalType::DateTime => {
                return Err(ConfigError::MissingDatetimeRule {
                    table: table.to_string(),
                    column: column.name.clone(),
                }
                .into());
            }
            CanonicalType::Text => match column.native_type {
                NativeType::Ese(EseColumnType::Guid) => decode_guid(data)?,
                NativeType::Registry(RegistryValueType::MultiSz) => {
                    DecodedValue::Text(decode_multi_string(data)?)
                }
                NativeType::Registry(ty) if ty.is_string() => {
                    DecodedValue::Text(decode_utf16le(data)?)
                }
                _ => pre_decoded_text(data),
            },
            CanonicalType::Blob => DecodedValue::Bytes(data.to_vec()),
        };
        Ok(value)
    }
}

fn fixed<const N: usize>(kind: NumericKind, data: &[u8]) -> Result<[u8; N], FieldDecodeError> {
    data.try_into().map_err(|_| FieldDecodeError::Width {
        kind,
        expected: N,
        actual: data.len(),
    })
}

/// Fixed-width numeric unpack; the buffer must match the width exactly.
pub fn decode_numeric(kind: NumericKind, data: &[u8]) -> Result<DecodedValue, FieldDecodeError> {
    let value = match kind {
        NumericKind::Bool => DecodedValue::Integer(i64::from(fixed::<1>(kind, data)?[0] != 0)),
        NumericKind::U8 => DecodedValue::Integer(i64::from(fixed::<1>(kind, data)?[0])),
        NumericKind::I16 => {
            DecodedValue::Integer(i64::from(i16::from_le_bytes(fixed(kind, data)?)))
        }
        NumericKind::U16 => {
            DecodedValue::Integer(i64::from(u16::from_le_bytes(fixed(kind, data)?)))
        }
        NumericKind::I32 => {
            DecodedValue::Integer(i64::from(i32::from_le_bytes(fixed(kind, data)?)))
        }
        NumericKind::U32 => {
            DecodedValue::Integer(i64::from(u32::from_le_bytes(fixed(kind, data)?)))
        }
        NumericKind::U32Be => {
            DecodedValue::Integer(i64::from(u32::from_be_bytes(fixed(kind, data)?)))
        }
        NumericKind::I64 => DecodedValue::Integer(i64::from_le_bytes(fixed(kind, data)?)),
        NumericKind::U64 => {
            let value = u64::from_le_bytes(fixed(kind, data)?);
            let value =
                i64::try_from(value).map_err(|_| FieldDecodeError::IntegerOverflow { value })?;
            DecodedValue::Integer(value)
        }
        NumericKind::F32 => DecodedValue::Real(f64::from(f32::from_le_bytes(fixed(kind, data)?))),
        NumericKind::F64 => DecodedValue::Real(f64::from_le_bytes(fixed(kind, data)?)),
    };
    Ok(value)
}

/// Strict UTF-16LE decode with trailing NULs removed.
pub fn decode_utf16le(data: &[u8]) -> Result<String, FieldDecodeError> {
    let text = UTF_16LE
        .decode_without_bom_handling_and_without_replacement(data)
        .ok_or(FieldDecodeError::Encoding { len: data.len() })?;
    Ok(text.trim_end_matches('\0').to_string())
}

/// Text columns arrive already decoded by the reader; anything that is not
/// UTF-8 is kept as opaque bytes.
fn pre_decoded_text(data: &[u8]) -> DecodedValue {
    match std::str::from_utf8(data) {
        Ok(text) => DecodedValue::text(text),
        Err(_) => DecodedValue::Bytes(data.to_vec()),
    }
}

/// `REG_MULTI_SZ`: NUL-separated strings, joined with newlines.
fn decode_multi_string(data: &[u8]) -> Result<String, FieldDecodeError> {
    let text = UTF_16LE
        .decode_without_bom_handling_and_without_replacement(data)
        .ok_or(FieldDecodeError::Encoding { len: data.len() })?;
    let parts: Vec<&str> = text.split('\0').filter(|part| !part.is_empty()).collect();
    Ok(parts.join("\n"))
}

/// 16 GUID bytes in stored order as hyphenated lowercase text.
fn decode_guid(data: &[u8]) -> Result<DecodedValue, FieldDecodeError> {
    let guid = Uuid::from_slice(data).map_err(|_| FieldDecodeError::Guid { actual: data.len() })?;
    Ok(DecodedValue::Text(guid.hyphenated().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16(text: &str) -> Vec<u8> {
        text.encode_utf16().flat_map(u16::to_le_bytes).collect()
    }

    #[test]
    fn i32_all_ones_is_minus_one() {
        assert_eq!(
            decode_numeric(NumericKind::I32, &[0xFF, 0xFF, 0xFF, 0xFF]),
            Ok(DecodedValue::Integer(-1))
        );
    }

    #[test]
    fn u32_all_ones_stays_positive() {
        assert_eq!(
            decode_numeric(NumericKind::U32, &[0xFF, 0xFF, 0xFF, 0xFF]),
            Ok(DecodedValue::Integer(4_294_967_295))
        );
    }

    #[test]
    fn big_endian_dword() {
        assert_eq!(
            decode_numeric(NumericKind::U32Be, &[0, 0, 1, 0]),
            Ok(DecodedValue::Integer(256))
        );
    }

    #[test]
    fn width_mismatch_is_reported() {
        assert_eq!(
            decode_numeric(NumericKind::I16, &[1, 2, 3]),
            Err(FieldDecodeError::Width {
                kind: NumericKind::I16,
                expected: 2,
                actual: 3
            })
        );
    }

    #[test]
    fn u64_overflow_is_reported() {
        assert!(matches!(
            decode_numeric(NumericKind::U64, &[0xFF; 8]),
            Err(FieldDecodeError::IntegerOverflow { .. })
        ));
    }

    #[test]
    fn floats_widen() {
        assert_eq!(
            decode_numeric(NumericKind::F32, &1.5f32.to_le_bytes()),
            Ok(DecodedValue::Real(1.5))
        );
        assert_eq!(
            decode_numeric(NumericKind::Bool, &[7]),
            Ok(DecodedValue::Integer(1))
        );
    }

    #[test]
    fn utf16_trims_trailing_nuls() {
        let mut data = utf16("en-US");
        data.extend([0, 0]);
        assert_eq!(decode_utf16le(&data).as_deref(), Ok("en-US"));
    }

    #[test]
    fn utf16_rejects_lone_surrogate() {
        assert!(matches!(
            decode_utf16le(&[0x00, 0xD8]),
            Err(FieldDecodeError::Encoding { len: 2 })
        ));
        assert!(decode_utf16le(&[0x41]).is_err());
    }

    #[test]
    fn multi_string_joins_lines() {
        let data = utf16("one\0two\0\0");
        assert_eq!(decode_multi_string(&data).as_deref(), Ok("one\ntwo"));
    }

    #[test]
    fn text_passthrough_keeps_invalid_utf8_as_bytes() {
        assert_eq!(pre_decoded_text(b"WLAN"), DecodedValue::text("WLAN"));
        assert_eq!(pre_decoded_text(&[0xC3]), DecodedValue::Bytes(vec![0xC3]));
    }

    #[test]
    fn guid_renders_hyphenated() {
        let data: Vec<u8> = (0u8..16).collect();
        assert_eq!(
            decode_guid(&data),
            Ok(DecodedValue::text("00010203-0405-0607-0809-0a0b0c0d0e0f"))
        );
        assert!(decode_guid(&data[..4]).is_err());
    }
}
