//! Column-name decode rules.
//!
//! A rule overrides the type-driven default decode of one column. Rules
//! are either global (match the column name in any table) or scoped to a
//! destination table; table-scoped rules win over global ones.
//!
//! Rule sets are validated once on construction. Sibling dependencies are
//! additionally validated against each table's column order before any of
//! its records are decoded (see [`RuleSet::validate_columns`]).

use std::fmt;

use srum_model::{CanonicalType, ColumnDescriptor, DecodedValue, NumericKind};

use crate::error::ConfigError;

/// Layout of a structured blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobKind {
    /// WLAN profile `Channel Hints`.
    ChannelHints,
}

impl fmt::Display for BlobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlobKind::ChannelHints => f.write_str("channel hints"),
        }
    }
}

/// Condition evaluated against a sibling's decoded value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiblingPredicate {
    /// Sibling decoded to one of these integers.
    IntegerIn(Vec<i64>),
}

impl SiblingPredicate {
    pub fn matches(&self, value: &DecodedValue) -> bool {
        match self {
            SiblingPredicate::IntegerIn(allowed) => value
                .as_integer()
                .is_some_and(|value| allowed.contains(&value)),
        }
    }
}

impl fmt::Display for SiblingPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiblingPredicate::IntegerIn(allowed) => {
                let items: Vec<String> = allowed.iter().map(i64::to_string).collect();
                write!(f, "in {{{}}}", items.join(", "))
            }
        }
    }
}

/// How to turn one column's raw bytes into a value.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeStrategy {
    RawPassthrough,
    FixedWidthNumeric(NumericKind),
    Utf16Le,
    OleAutomationDate,
    WindowsFileTime,
    StructuredBlob(BlobKind),
    /// Applies `then` when the already decoded `sibling` satisfies
    /// `predicate`; otherwise the bytes pass through unchanged.
    ConditionalOnSibling {
        sibling: String,
        predicate: SiblingPredicate,
        then: Box<DecodeStrategy>,
    },
}

impl DecodeStrategy {
    pub fn conditional(
        sibling: impl Into<String>,
        predicate: SiblingPredicate,
        then: DecodeStrategy,
    ) -> Self {
        DecodeStrategy::ConditionalOnSibling {
            sibling: sibling.into(),
            predicate,
            then: Box::new(then),
        }
    }

    /// Canonical type the strategy always produces, if it fixes one.
    pub fn canonical_override(&self) -> Option<CanonicalType> {
        match self {
            DecodeStrategy::OleAutomationDate | DecodeStrategy::WindowsFileTime => {
                Some(CanonicalType::DateTime)
            }
            DecodeStrategy::Utf16Le | DecodeStrategy::StructuredBlob(_) => {
                Some(CanonicalType::Text)
            }
            DecodeStrategy::FixedWidthNumeric(kind) => Some(kind.canonical()),
            DecodeStrategy::RawPassthrough | DecodeStrategy::ConditionalOnSibling { .. } => None,
        }
    }
}

impl fmt::Display for DecodeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeStrategy::RawPassthrough => f.write_str("raw"),
            DecodeStrategy::FixedWidthNumeric(kind) => write!(f, "numeric({kind})"),
            DecodeStrategy::Utf16Le => f.write_str("utf-16le"),
            DecodeStrategy::OleAutomationDate => f.write_str("ole-date"),
            DecodeStrategy::WindowsFileTime => f.write_str("filetime"),
            DecodeStrategy::StructuredBlob(kind) => write!(f, "blob({kind})"),
            DecodeStrategy::ConditionalOnSibling {
                sibling,
                predicate,
                then,
            } => write!(f, "{then} if {sibling} {predicate}"),
        }
    }
}

/// Where a rule applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleScope {
    Global,
    /// Destination table name, after alias resolution.
    Table(String),
}

impl fmt::Display for RuleScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleScope::Global => f.write_str("global"),
            RuleScope::Table(table) => write!(f, "table {table}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodeRule {
    pub scope: RuleScope,
    pub column: String,
    pub strategy: DecodeStrategy,
}

impl DecodeRule {
    pub fn global(column: impl Into<String>, strategy: DecodeStrategy) -> Self {
        Self {
            scope: RuleScope::Global,
            column: column.into(),
            strategy,
        }
    }

    pub fn for_table(
        table: impl Into<String>,
        column: impl Into<String>,
        strategy: DecodeStrategy,
    ) -> Self {
        Self {
            scope: RuleScope::Table(table.into()),
            column: column.into(),
            strategy,
        }
    }
}

/// A validated, read-only set of decode rules.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    rules: Vec<DecodeRule>,
}

impl RuleSet {
    /// Builds a rule set, rejecting duplicates, nested conditions and
    /// self-referencing conditions.
    pub fn new(rules: Vec<DecodeRule>) -> Result<Self, ConfigError> {
        for (index, rule) in rules.iter().enumerate() {
            if rules[..index]
                .iter()
                .any(|prior| prior.scope == rule.scope && prior.column == rule.column)
            {
                return Err(ConfigError::DuplicateRule {
                    scope: rule.scope.to_string(),
                    column: rule.column.clone(),
                });
            }
            if let DecodeStrategy::ConditionalOnSibling { sibling, then, .. } = &rule.strategy {
                if matches!(**then, DecodeStrategy::ConditionalOnSibling { .. }) {
                    return Err(ConfigError::NestedConditional {
                        column: rule.column.clone(),
                    });
                }
                if *sibling == rule.column {
                    return Err(ConfigError::SelfReferentialSibling {
                        column: rule.column.clone(),
                    });
                }
            }
        }
        Ok(Self { rules })
    }

    /// Rules for SRUM database tables.
    pub fn srum_defaults() -> Result<Self, ConfigError> {
        Self::new(vec![
            DecodeRule::global("EventTimestamp", DecodeStrategy::WindowsFileTime),
            DecodeRule::global("ConnectStartTime", DecodeStrategy::WindowsFileTime),
            DecodeRule::global("TimeStamp", DecodeStrategy::OleAutomationDate),
            DecodeRule::global("LocaleName", DecodeStrategy::Utf16Le),
            DecodeRule::global("Key", DecodeStrategy::Utf16Le),
            // IdType 0-2 are application, service and user names.
            DecodeRule::global(
                "IdBlob",
                DecodeStrategy::conditional(
                    "IdType",
                    SiblingPredicate::IntegerIn(vec![0, 1, 2]),
                    DecodeStrategy::Utf16Le,
                ),
            ),
        ])
    }

    /// Rules for WLAN profile values in the SOFTWARE hive.
    pub fn wlan_defaults() -> Result<Self, ConfigError> {
        Self::new(vec![
            DecodeRule::global("All User Profile Security Descriptor", DecodeStrategy::Utf16Le),
            DecodeRule::global(
                "Channel Hints",
                DecodeStrategy::StructuredBlob(BlobKind::ChannelHints),
            ),
        ])
    }

    /// Adds a rule, re-running validation.
    pub fn with_rule(self, rule: DecodeRule) -> Result<Self, ConfigError> {
        let mut rules = self.rules;
        rules.push(rule);
        Self::new(rules)
    }

    /// Highest-precedence rule for `column` in destination table `table`.
    pub fn resolve(&self, table: &str, column: &str) -> Option<&DecodeRule> {
        let scoped = self.rules.iter().find(|rule| {
            rule.column == column && matches!(&rule.scope, RuleScope::Table(name) if name == table)
        });
        scoped.or_else(|| {
            self.rules
                .iter()
                .find(|rule| rule.column == column && rule.scope == RuleScope::Global)
        })
    }

    /// Checks every sibling dependency among `columns` of `table`: the
    /// sibling must exist and come first.
    pub fn validate_columns(
        &self,
        table: &str,
        columns: &[ColumnDescriptor],
    ) -> Result<(), ConfigError> {
        for (position, column) in columns.iter().enumerate() {
            let Some(rule) = self.resolve(table, &column.name) else {
                continue;
            };
            let DecodeStrategy::ConditionalOnSibling { sibling, .. } = &rule.strategy else {
                continue;
            };
            match columns.iter().position(|other| other.name == *sibling) {
                None => {
                    return Err(ConfigError::MissingSibling {
                        table: table.to_string(),
                        column: column.name.clone(),
                        sibling: sibling.clone(),
                    });
                }
                Some(sibling_position) if sibling_position > position => {
                    return Err(ConfigError::MisorderedSibling {
                        table: table.to_string(),
                        column: column.name.clone(),
                        sibling: sibling.clone(),
                    });
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    pub fn rules(&self) -> &[DecodeRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
