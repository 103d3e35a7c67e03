//! Type tags reported by the source readers and the canonical storage kinds
//! they are mapped onto.
//!
//! Two independent native type systems exist: ESE column types (numbered as
//! libesedb reports them) and registry value types (numbered as in
//! `winnt.h`). Neither overlaps the other, so both live under [`NativeType`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sink-neutral storage kind every native type must map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CanonicalType {
    Text,
    Blob,
    Integer,
    Real,
    DateTime,
}

impl CanonicalType {
    /// All canonical types, in declaration order.
    pub const ALL: [CanonicalType; 5] = [
        CanonicalType::Text,
        CanonicalType::Blob,
        CanonicalType::Integer,
        CanonicalType::Real,
        CanonicalType::DateTime,
    ];

    /// Column type keyword used in create statements.
    pub fn as_sql(&self) -> &'static str {
        match self {
            CanonicalType::Text => "TEXT",
            CanonicalType::Blob => "BLOB",
            CanonicalType::Integer => "INTEGER",
            CanonicalType::Real => "REAL",
            CanonicalType::DateTime => "DATETIME",
        }
    }
}

impl fmt::Display for CanonicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for CanonicalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TEXT" => Ok(CanonicalType::Text),
            "BLOB" => Ok(CanonicalType::Blob),
            "INTEGER" => Ok(CanonicalType::Integer),
            "REAL" => Ok(CanonicalType::Real),
            "DATETIME" => Ok(CanonicalType::DateTime),
            other => Err(format!("unknown canonical type: {other}")),
        }
    }
}

/// Column type of an ESE (extensible storage engine) table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EseColumnType {
    Null,
    Boolean,
    UInt8,
    Int16,
    Int32,
    Currency,
    Float32,
    Double64,
    DateTime,
    Binary,
    Text,
    LargeBinary,
    LargeText,
    SuperLarge,
    UInt32,
    Int64,
    Guid,
    UInt16,
    /// A tag the reader reported that this engine does not know.
    Unknown(u32),
}

impl EseColumnType {
    /// Builds the type from the numeric tag reported by the reader.
    pub fn from_tag(tag: u32) -> Self {
        match tag {
            0 => Self::Null,
            1 => Self::Boolean,
            2 => Self::UInt8,
            3 => Self::Int16,
            4 => Self::Int32,
            5 => Self::Currency,
            6 => Self::Float32,
            7 => Self::Double64,
            8 => Self::DateTime,
            9 => Self::Binary,
            10 => Self::Text,
            11 => Self::LargeBinary,
            12 => Self::LargeText,
            13 => Self::SuperLarge,
            14 => Self::UInt32,
            15 => Self::Int64,
            16 => Self::Guid,
            17 => Self::UInt16,
            other => Self::Unknown(other),
        }
    }

    /// Numeric tag as reported by the reader.
    pub fn tag(&self) -> u32 {
        match self {
            Self::Null => 0,
            Self::Boolean => 1,
            Self::UInt8 => 2,
            Self::Int16 => 3,
            Self::Int32 => 4,
            Self::Currency => 5,
            Self::Float32 => 6,
            Self::Double64 => 7,
            Self::DateTime => 8,
            Self::Binary => 9,
            Self::Text => 10,
            Self::LargeBinary => 11,
            Self::LargeText => 12,
            Self::SuperLarge => 13,
            Self::UInt32 => 14,
            Self::Int64 => 15,
            Self::Guid => 16,
            Self::UInt16 => 17,
            Self::Unknown(tag) => *tag,
        }
    }

    /// Fixed-width layout for numeric column types.
    pub fn numeric_kind(&self) -> Option<NumericKind> {
        match self {
            Self::Boolean => Some(NumericKind::Bool),
            Self::UInt8 => Some(NumericKind::U8),
            Self::Int16 => Some(NumericKind::I16),
            Self::UInt16 => Some(NumericKind::U16),
            Self::Int32 => Some(NumericKind::I32),
            Self::UInt32 => Some(NumericKind::U32),
            Self::Int64 => Some(NumericKind::I64),
            Self::Float32 => Some(NumericKind::F32),
            Self::Double64 => Some(NumericKind::F64),
            _ => None,
        }
    }
}

/// Value type of a registry value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RegistryValueType {
    None,
    Sz,
    ExpandSz,
    Binary,
    Dword,
    DwordBigEndian,
    Link,
    MultiSz,
    ResourceList,
    FullResourceDescriptor,
    ResourceRequirementsList,
    Qword,
    Unknown(u32),
}

impl RegistryValueType {
    pub fn from_tag(tag: u32) -> Self {
        match tag {
            0 => Self::None,
            1 => Self::Sz,
            2 => Self::ExpandSz,
            3 => Self::Binary,
            4 => Self::Dword,
            5 => Self::DwordBigEndian,
            6 => Self::Link,
            7 => Self::MultiSz,
            8 => Self::ResourceList,
            9 => Self::FullResourceDescriptor,
            10 => Self::ResourceRequirementsList,
            11 => Self::Qword,
            other => Self::Unknown(other),
        }
    }

    pub fn tag(&self) -> u32 {
        match self {
            Self::None => 0,
            Self::Sz => 1,
            Self::ExpandSz => 2,
            Self::Binary => 3,
            Self::Dword => 4,
            Self::DwordBigEndian => 5,
            Self::Link => 6,
            Self::MultiSz => 7,
            Self::ResourceList => 8,
            Self::FullResourceDescriptor => 9,
            Self::ResourceRequirementsList => 10,
            Self::Qword => 11,
            Self::Unknown(tag) => *tag,
        }
    }

    pub fn numeric_kind(&self) -> Option<NumericKind> {
        match self {
            Self::Dword => Some(NumericKind::U32),
            Self::DwordBigEndian => Some(NumericKind::U32Be),
            Self::Qword => Some(NumericKind::U64),
            _ => None,
        }
    }

    /// Whether the value holds UTF-16LE encoded text.
    pub fn is_string(&self) -> bool {
        matches!(self, Self::Sz | Self::ExpandSz | Self::Link | Self::MultiSz)
    }
}

/// Native type tag of one column or value, from either source family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NativeType {
    Ese(EseColumnType),
    Registry(RegistryValueType),
}

impl NativeType {
    pub fn numeric_kind(&self) -> Option<NumericKind> {
        match self {
            NativeType::Ese(ty) => ty.numeric_kind(),
            NativeType::Registry(ty) => ty.numeric_kind(),
        }
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeType::Ese(EseColumnType::Unknown(tag)) => write!(f, "ese:unknown({tag})"),
            NativeType::Ese(ty) => write!(f, "ese:{ty:?}"),
            NativeType::Registry(RegistryValueType::Unknown(tag)) => {
                write!(f, "registry:unknown({tag})")
            }
            NativeType::Registry(ty) => write!(f, "registry:{ty:?}"),
        }
    }
}

impl From<EseColumnType> for NativeType {
    fn from(value: EseColumnType) -> Self {
        NativeType::Ese(value)
    }
}

impl From<RegistryValueType> for NativeType {
    fn from(value: RegistryValueType) -> Self {
        NativeType::Registry(value)
    }
}

/// Fixed-width little-endian numeric layout (unless noted otherwise).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NumericKind {
    /// Single byte, zero is false.
    Bool,
    U8,
    I16,
    U16,
    I32,
    U32,
    /// Big-endian 32-bit unsigned (`REG_DWORD_BIG_ENDIAN`).
    U32Be,
    I64,
    U64,
    F32,
    F64,
}

impl NumericKind {
    /// Width of the encoded value in bytes.
    pub fn width(&self) -> usize {
        match self {
            NumericKind::Bool | NumericKind::U8 => 1,
            NumericKind::I16 | NumericKind::U16 => 2,
            NumericKind::I32 | NumericKind::U32 | NumericKind::U32Be | NumericKind::F32 => 4,
            NumericKind::I64 | NumericKind::U64 | NumericKind::F64 => 8,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, NumericKind::F32 | NumericKind::F64)
    }

    /// Canonical type values of this layout are stored as.
    pub fn canonical(&self) -> CanonicalType {
        if self.is_float() {
            CanonicalType::Real
        } else {
            CanonicalType::Integer
        }
    }
}

impl fmt::Display for NumericKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NumericKind::Bool => "bool",
            NumericKind::U8 => "u8",
            NumericKind::I16 => "i16",
            NumericKind::U16 => "u16",
            NumericKind::I32 => "i32",
            NumericKind::U32 => "u32",
            NumericKind::U32Be => "u32be",
            NumericKind::I64 => "i64",
            NumericKind::U64 => "u64",
            NumericKind::F32 => "f32",
            NumericKind::F64 => "f64",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ese_tags_round_trip() {
        for tag in 0..=17 {
            assert_eq!(EseColumnType::from_tag(tag).tag(), tag);
        }
        assert_eq!(EseColumnType::from_tag(42), EseColumnType::Unknown(42));
    }

    #[test]
    fn registry_string_types() {
        assert!(RegistryValueType::Sz.is_string());
        assert!(RegistryValueType::MultiSz.is_string());
        assert!(!RegistryValueType::Dword.is_string());
    }

    #[test]
    fn canonical_type_parses_case_insensitive() {
        assert_eq!("integer".parse::<CanonicalType>(), Ok(CanonicalType::Integer));
        assert!("VARCHAR".parse::<CanonicalType>().is_err());
    }
}
