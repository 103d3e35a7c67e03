//! Source table identifier to destination table name resolution.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

/// Braced 8-4-4-4-12 hex GUID at the start of an identifier. A suffix
/// such as `LT` may follow the closing brace.
static GUID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\{[0-9A-Fa-f]{8}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{12}\}",
    )
    .expect("Invalid GUID regex")
});

/// Known SRUM extension tables.
pub const DEFAULT_ALIASES: &[(&str, &str)] = &[
    (
        "{DD6636C4-8929-4683-974E-22C046A43763}",
        "NetworkConnectivityData",
    ),
    (
        "{D10CA2FE-6FCF-4F6D-848E-B2E99266FA89}",
        "ApplicationResourceUsageData",
    ),
    ("{973F5D5C-1D90-4944-BE8E-24B94231A174}", "NetworkUsageData"),
    ("{D10CA2FE-6FCF-4F6D-848E-B2E99266FA86}", "EnergyUsageData"),
    (
        "{FEE4E14F-02A9-4550-B5CE-5FA2DA202E37}",
        "WindowsPushNotificationData",
    ),
    (
        "{FEE4E14F-02A9-4550-B5CE-5FA2DA202E37}LT",
        "WindowsPushNotificationDataLT",
    ),
];

/// Whether `identifier` starts with a braced GUID.
pub fn is_guid_shaped(identifier: &str) -> bool {
    GUID_REGEX.is_match(identifier)
}

/// Resolves source identifiers to destination names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNameResolver {
    aliases: BTreeMap<String, String>,
}

impl Default for TableNameResolver {
    fn default() -> Self {
        Self {
            aliases: DEFAULT_ALIASES
                .iter()
                .map(|(source, destination)| ((*source).to_string(), (*destination).to_string()))
                .collect(),
        }
    }
}

impl TableNameResolver {
    /// Adds or replaces an alias.
    #[must_use]
    pub fn with_alias(mut self, source: impl Into<String>, destination: impl Into<String>) -> Self {
        self.aliases.insert(source.into(), destination.into());
        self
    }

    /// Alias lookup, then GUID canonicalization (braces and dashes
    /// stripped), else the identifier unchanged.
    pub fn resolve(&self, identifier: &str) -> String {
        if let Some(alias) = self.aliases.get(identifier) {
            return alias.clone();
        }
        if is_guid_shaped(identifier) {
            return identifier
                .chars()
                .filter(|c| !matches!(c, '{' | '}' | '-'))
                .collect();
        }
        identifier.to_string()
    }

    pub fn aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases
            .iter()
            .map(|(source, destination)| (source.as_str(), destination.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliased_guid_resolves_to_name() {
        let resolver = TableNameResolver::default();
        assert_eq!(
            resolver.resolve("{DD6636C4-8929-4683-974E-22C046A43763}"),
            "NetworkConnectivityData"
        );
        assert_eq!(
            resolver.resolve("{FEE4E14F-02A9-4550-B5CE-5FA2DA202E37}LT"),
            "WindowsPushNotificationDataLT"
        );
    }

    #[test]
    fn unaliased_guid_is_stripped() {
        let resolver = TableNameResolver::default();
        assert_eq!(
            resolver.resolve("{AAAAAAAA-BBBB-CCCC-DDDD-EEEEEEEEEEEE}"),
            "AAAAAAAABBBBCCCCDDDDEEEEEEEEEEEE"
        );
    }

    #[test]
    fn suffixed_guid_keeps_suffix() {
        let resolver = TableNameResolver::default();
        assert_eq!(
            resolver.resolve("{5C8CF1C7-7257-4F13-B223-970EF5939312}LT"),
            "5C8CF1C772574F13B223970EF5939312LT"
        );
    }

    #[test]
    fn plain_names_pass_through() {
        let resolver = TableNameResolver::default();
        assert_eq!(resolver.resolve("SruDbIdMapTable"), "SruDbIdMapTable");
        assert_eq!(resolver.resolve("MSysObjects"), "MSysObjects");
        assert_eq!(
            resolver.resolve("AAAAAAAA-BBBB-CCCC-DDDD-EEEEEEEEEEEE"),
            "AAAAAAAA-BBBB-CCCC-DDDD-EEEEEEEEEEEE"
        );
    }

    #[test]
    fn extra_alias_wins() {
        let resolver = TableNameResolver::default()
            .with_alias("{AAAAAAAA-BBBB-CCCC-DDDD-EEEEEEEEEEEE}", "Custom");
        assert_eq!(
            resolver.resolve("{AAAAAAAA-BBBB-CCCC-DDDD-EEEEEEEEEEEE}"),
            "Custom"
        );
    }
}
