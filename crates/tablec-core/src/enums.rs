//! The enum registry
//!
//! Populated from the dedicated enum table during the head-parse phase and
//! consulted by the type algebra for the rest of the compilation. The
//! head-parse phase runs files in parallel, so inserts must be atomic
//! insert-if-absent; after that phase the registry is read-only.

use dashmap::DashMap;

use crate::error::{Error, Result};
use crate::platform::{Platform, PlatformMask};

/// One `(name, value)` pair of an enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    pub name: String,
    pub value: i32,
}

/// A named enumeration declared by the enum table
#[derive(Debug, Clone)]
pub struct EnumInfo {
    pub name: String,
    /// Declaration order is preserved for emission
    pub members: Vec<EnumMember>,
    /// Declared for the whole enum, not per member
    pub platform: PlatformMask,
    pub comment: String,
}

impl EnumInfo {
    pub fn member_value(&self, member: &str) -> Option<i32> {
        self.members
            .iter()
            .find(|m| m.name == member)
            .map(|m| m.value)
    }
}

/// All enums known to a compilation run
#[derive(Debug, Default)]
pub struct EnumRegistry {
    map: DashMap<String, EnumInfo>,
}

impl EnumRegistry {
    pub fn new() -> EnumRegistry {
        EnumRegistry::default()
    }

    /// Insert-if-absent; a duplicate enum name is a validation error.
    pub fn insert(&self, info: EnumInfo) -> Result<()> {
        let name = info.name.clone();
        match self.map.entry(name.clone()) {
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(info);
                Ok(())
            }
            dashmap::mapref::entry::Entry::Occupied(_) => Err(Error::DuplicateEnum(name)),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    pub fn member_value(&self, enum_name: &str, member: &str) -> Option<i32> {
        self.map.get(enum_name)?.member_value(member)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Snapshot of the enums visible to a platform, sorted by name so
    /// emission output is deterministic.
    pub fn sorted_for_platform(&self, platform: Platform) -> Vec<EnumInfo> {
        let mut enums: Vec<EnumInfo> = self
            .map
            .iter()
            .filter(|entry| entry.platform.contains(platform))
            .map(|entry| entry.value().clone())
            .collect();
        enums.sort_by(|a, b| a.name.cmp(&b.name));
        enums
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color() -> EnumInfo {
        EnumInfo {
            name: "Color".to_string(),
            members: vec![
                EnumMember {
                    name: "Red".to_string(),
                    value: 0,
                },
                EnumMember {
                    name: "Blue".to_string(),
                    value: 2,
                },
            ],
            platform: PlatformMask::CLIENT,
            comment: String::new(),
        }
    }

    #[test]
    fn duplicate_insert_is_an_error() {
        let registry = EnumRegistry::new();
        registry.insert(color()).unwrap();
        assert!(matches!(
            registry.insert(color()),
            Err(Error::DuplicateEnum(name)) if name == "Color"
        ));
    }

    #[test]
    fn member_lookup() {
        let registry = EnumRegistry::new();
        registry.insert(color()).unwrap();
        assert_eq!(registry.member_value("Color", "Blue"), Some(2));
        assert_eq!(registry.member_value("Color", "Green"), None);
        assert_eq!(registry.member_value("Shape", "Red"), None);
    }

    #[test]
    fn platform_snapshot_is_filtered_and_sorted() {
        let registry = EnumRegistry::new();
        registry.insert(color()).unwrap();
        registry
            .insert(EnumInfo {
                name: "Ability".to_string(),
                members: Vec::new(),
                platform: PlatformMask::ALL,
                comment: String::new(),
            })
            .unwrap();

        let client: Vec<String> = registry
            .sorted_for_platform(Platform::Client)
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(client, vec!["Ability", "Color"]);

        let server: Vec<String> = registry
            .sorted_for_platform(Platform::Server)
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(server, vec!["Ability"]);
    }
}
