//! Artist alias table.
//!
//! Raw artist strings from search results are noisy ("Ed Sheeran",
//! "Ed Sheeran Official", "ED SHEERAN"). Users merge such names onto one
//! master name. Resolution is always a single lookup: merges rewrite the
//! table so no alias ever points at another alias.

use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtistResolver {
    mapping: BTreeMap<String, String>,
}

impl ArtistResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a resolver from persisted data, dropping self-mappings and
    /// flattening any chains left by older data.
    pub fn from_mapping(mapping: BTreeMap<String, String>) -> Self {
        let mut resolver = Self::new();
        for (alias, master) in mapping {
            resolver.merge(&alias, &master);
        }
        resolver
    }

    pub fn mapping(&self) -> &BTreeMap<String, String> {
        &self.mapping
    }

    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.mapping.get(name).map(String::as_str).unwrap_or(name)
    }

    pub fn is_alias(&self, name: &str) -> bool {
        self.mapping.contains_key(name)
    }

    pub fn merge(&mut self, alias: &str, target: &str) {
        let master = self.resolve(target).to_string();
        if alias == master {
            // Merging a master onto one of its own aliases would create a cycle.
            return;
        }

        for value in self.mapping.values_mut() {
            if value.as_str() == alias {
                *value = master.clone();
            }
        }
        self.mapping.insert(alias.to_string(), master.clone());

        log::debug!("Merged artist '{}' into '{}'", alias, master);
    }

    pub fn unmerge(&mut self, alias: &str) -> bool {
        let removed = self.mapping.remove(alias).is_some();
        if removed {
            log::debug!("Unmerged artist alias '{}'", alias);
        }
        removed
    }

    pub fn aliases_of(&self, master: &str) -> Vec<&str> {
        self.mapping
            .iter()
            .filter(|(_, m)| m.as_str() == master)
            .map(|(a, _)| a.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_fallback() {
        let resolver = ArtistResolver::new();
        assert_eq!(resolver.resolve("Dua Lipa"), "Dua Lipa");
    }

    #[test]
    fn test_merge_then_unmerge() {
        let mut resolver = ArtistResolver::new();
        resolver.merge("ED SHEERAN", "Ed Sheeran");
        assert_eq!(resolver.resolve("ED SHEERAN"), "Ed Sheeran");

        assert!(resolver.unmerge("ED SHEERAN"));
        assert_eq!(resolver.resolve("ED SHEERAN"), "ED SHEERAN");
        assert!(!resolver.unmerge("ED SHEERAN"));
    }

    #[test]
    fn test_merge_flattens_existing_aliases() {
        let mut resolver = ArtistResolver::new();
        resolver.merge("Weeknd", "The Weeknd VEVO");
        resolver.merge("The Weeknd Official", "The Weeknd VEVO");
        resolver.merge("The Weeknd VEVO", "The Weeknd");

        for alias in ["Weeknd", "The Weeknd Official", "The Weeknd VEVO"] {
            assert_eq!(resolver.resolve(alias), "The Weeknd");
        }
        assert_eq!(resolver.aliases_of("The Weeknd").len(), 3);
    }

    #[test]
    fn test_merge_onto_alias_targets_its_master() {
        let mut resolver = ArtistResolver::new();
        resolver.merge("b", "a");
        resolver.merge("c", "b");
        assert_eq!(resolver.resolve("c"), "a");
        assert_eq!(resolver.mapping().get("c").map(String::as_str), Some("a"));
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let mut resolver = ArtistResolver::new();
        resolver.merge("x", "y");
        resolver.merge("y", "z");
        resolver.merge("w", "x");
        for name in ["w", "x", "y", "z", "unmapped"] {
            let once = resolver.resolve(name);
            assert_eq!(resolver.resolve(once), once);
        }
    }

    #[test]
    fn test_no_self_mapping() {
        let mut resolver = ArtistResolver::new();
        resolver.merge("a", "a");
        assert!(resolver.mapping().is_empty());

        resolver.merge("b", "a");
        resolver.merge("a", "b");
        assert!(resolver.mapping().iter().all(|(k, v)| k != v));
        assert_eq!(resolver.resolve("b"), "a");
    }

    #[test]
    fn test_from_mapping_flattens_chains() {
        let mut raw = BTreeMap::new();
        raw.insert("a".to_string(), "b".to_string());
        raw.insert("b".to_string(), "c".to_string());
        raw.insert("d".to_string(), "d".to_string());

        let resolver = ArtistResolver::from_mapping(raw);
        assert_eq!(resolver.resolve("a"), "c");
        assert_eq!(resolver.resolve("b"), "c");
        assert!(!resolver.is_alias("d"));
    }
}
