//! Hierarchical (registry hive) source contract and an in-memory
//! implementation.

use serde::{Deserialize, Serialize};
use srum_model::RegistryValueType;

use crate::error::{IngestError, Result};

/// A named value stored under a registry key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryValue {
    pub name: String,
    pub value_type: RegistryValueType,
    pub data: Vec<u8>,
}

impl RegistryValue {
    pub fn new(name: impl Into<String>, value_type: RegistryValueType, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            value_type,
            data,
        }
    }
}

/// A key in the hive tree.
pub trait RegistryKey: Sized {
    fn name(&self) -> &str;

    fn subkeys(&self) -> Result<Vec<Self>>;

    /// Child key by name; registry names compare case-insensitively.
    fn subkey(&self, name: &str) -> Result<Option<Self>>;

    fn values(&self) -> Result<Vec<RegistryValue>>;
}

/// An opened hive.
pub trait RegistryHive {
    type Key<'a>: RegistryKey
    where
        Self: 'a;

    /// Opens a key by backslash-separated path relative to the hive root.
    fn open(&self, path: &str) -> Result<Self::Key<'_>>;
}

/// A key held fully in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryKey {
    pub name: String,
    pub subkeys: Vec<MemoryKey>,
    pub values: Vec<RegistryValue>,
}

impl MemoryKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subkeys: Vec::new(),
            values: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_subkey(mut self, key: MemoryKey) -> Self {
        self.subkeys.push(key);
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: RegistryValue) -> Self {
        self.values.push(value);
        self
    }

    fn child(&self, name: &str) -> Option<&MemoryKey> {
        self.subkeys
            .iter()
            .find(|key| key.name.eq_ignore_ascii_case(name))
    }
}

impl<'a> RegistryKey for &'a MemoryKey {
    fn name(&self) -> &str {
        &self.name
    }

    fn subkeys(&self) -> Result<Vec<Self>> {
        let key: &'a MemoryKey = *self;
        Ok(key.subkeys.iter().collect())
    }

    fn subkey(&self, name: &str) -> Result<Option<Self>> {
        let key: &'a MemoryKey = *self;
        Ok(key.child(name))
    }

    fn values(&self) -> Result<Vec<RegistryValue>> {
        Ok(self.values.clone())
    }
}

/// In-memory hive, also the target of snapshot loading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryHive {
    pub root: MemoryKey,
}

impl MemoryHive {
    pub fn new(root: MemoryKey) -> Self {
        Self { root }
    }
}

impl RegistryHive for MemoryHive {
    type Key<'a> = &'a MemoryKey;

    fn open(&self, path: &str) -> Result<Self::Key<'_>> {
        let mut key = &self.root;
        for part in path.split('\\').filter(|part| !part.is_empty()) {
            key = key.child(part).ok_or_else(|| IngestError::KeyNotFound {
                path: path.to_string(),
            })?;
        }
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hive() -> MemoryHive {
        MemoryHive::new(
            MemoryKey::new("ROOT").with_subkey(
                MemoryKey::new("Microsoft").with_subkey(
                    MemoryKey::new("WlanSvc").with_subkey(
                        MemoryKey::new("Interfaces").with_value(RegistryValue::new(
                            "Flags",
                            RegistryValueType::Dword,
                            vec![1, 0, 0, 0],
                        )),
                    ),
                ),
            ),
        )
    }

    #[test]
    fn opens_nested_path_case_insensitive() {
        let hive = hive();
        let key = hive.open("microsoft\\WLANSVC\\Interfaces").expect("open");
        assert_eq!(key.name(), "Interfaces");
        assert_eq!(key.values().expect("values").len(), 1);
    }

    #[test]
    fn missing_path_is_reported() {
        let hive = hive();
        assert!(matches!(
            hive.open("Microsoft\\Missing"),
            Err(IngestError::KeyNotFound { .. })
        ));
    }
}
