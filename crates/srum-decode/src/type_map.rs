//! Native type tag to canonical type translation.

use std::collections::{BTreeMap, BTreeSet};

use srum_model::{CanonicalType, EseColumnType, NativeType, RegistryValueType};

use crate::error::ConfigError;

/// Static mapping from canonical types to the native types stored as them.
///
/// The sets are pairwise disjoint; construction rejects overlap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMap {
    entries: BTreeMap<CanonicalType, BTreeSet<NativeType>>,
    index: BTreeMap<NativeType, CanonicalType>,
}

impl TypeMap {
    pub fn new<I, N>(entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (CanonicalType, N)>,
        N: IntoIterator<Item = NativeType>,
    {
        let mut map = Self {
            entries: BTreeMap::new(),
            index: BTreeMap::new(),
        };
        for (canonical, natives) in entries {
            let set = map.entries.entry(canonical).or_default();
            for native in natives {
                if let Some(first) = map.index.get(&native)
                    && *first != canonical
                {
                    return Err(ConfigError::OverlappingTypeMap {
                        native,
                        first: *first,
                        second: canonical,
                    });
                }
                map.index.insert(native, canonical);
                set.insert(native);
            }
        }
        Ok(map)
    }

    /// Map for ESE tables. Null, Currency and unknown tags are left out and
    /// abort processing when a table uses them.
    pub fn ese() -> Result<Self, ConfigError> {
        use EseColumnType as E;
        let ese = |types: &[EseColumnType]| {
            types
                .iter()
                .map(|ty| NativeType::Ese(*ty))
                .collect::<Vec<_>>()
        };
        Self::new([
            (CanonicalType::DateTime, ese(&[E::DateTime])),
            (CanonicalType::Real, ese(&[E::Double64, E::Float32])),
            (
                CanonicalType::Integer,
                ese(&[
                    E::Boolean,
                    E::Int16,
                    E::UInt16,
                    E::Int32,
                    E::UInt32,
                    E::Int64,
                    E::UInt8,
                ]),
            ),
            (CanonicalType::Blob, ese(&[E::Binary, E::LargeBinary])),
            (
                CanonicalType::Text,
                ese(&[E::Guid, E::LargeText, E::SuperLarge, E::Text]),
            ),
        ])
    }

    /// Map for registry values. Only unknown tags are unmapped.
    pub fn registry() -> Result<Self, ConfigError> {
        use RegistryValueType as R;
        let reg = |types: &[RegistryValueType]| {
            types
                .iter()
                .map(|ty| NativeType::Registry(*ty))
                .collect::<Vec<_>>()
        };
        Self::new([
            (
                CanonicalType::Integer,
                reg(&[R::Dword, R::DwordBigEndian, R::Qword]),
            ),
            (
                CanonicalType::Text,
                reg(&[R::Sz, R::ExpandSz, R::MultiSz, R::Link]),
            ),
            (
                CanonicalType::Blob,
                reg(&[
                    R::None,
                    R::Binary,
                    R::ResourceList,
                    R::FullResourceDescriptor,
                    R::ResourceRequirementsList,
                ]),
            ),
        ])
    }

    pub fn canonical(&self, native: NativeType) -> Option<CanonicalType> {
        self.index.get(&native).copied()
    }

    /// Native types stored as `canonical`, in tag order.
    pub fn natives(&self, canonical: CanonicalType) -> impl Iterator<Item = NativeType> + '_ {
        self.entries
            .get(&canonical)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ese_map_covers_reported_types() {
        let map = TypeMap::ese().expect("ese map");
        for tag in 0..=17 {
            let ty = EseColumnType::from_tag(tag);
            let mapped = map.canonical(ty.into());
            match ty {
                EseColumnType::Null | EseColumnType::Currency => assert_eq!(mapped, None),
                _ => assert!(mapped.is_some(), "{ty:?} should be mapped"),
            }
        }
        assert_eq!(map.canonical(EseColumnType::Unknown(40).into()), None);
    }

    #[test]
    fn ese_guid_is_text() {
        let map = TypeMap::ese().expect("ese map");
        assert_eq!(
            map.canonical(EseColumnType::Guid.into()),
            Some(CanonicalType::Text)
        );
    }

    #[test]
    fn registry_map_is_complete() {
        let map = TypeMap::registry().expect("registry map");
        for tag in 0..=11 {
            assert!(map.canonical(RegistryValueType::from_tag(tag).into()).is_some());
        }
        assert_eq!(map.len(), 12);
    }

    #[test]
    fn overlap_is_rejected() {
        let native = NativeType::Ese(EseColumnType::Int32);
        let result = TypeMap::new([
            (CanonicalType::Integer, vec![native]),
            (CanonicalType::Real, vec![native]),
        ]);
        assert!(matches!(
            result,
            Err(ConfigError::OverlappingTypeMap { .. })
        ));
    }

    #[test]
    fn natives_lists_members() {
        let map = TypeMap::ese().expect("ese map");
        let real: Vec<_> = map.natives(CanonicalType::Real).collect();
        assert_eq!(real.len(), 2);
    }
}
