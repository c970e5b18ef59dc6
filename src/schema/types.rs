// src/schema/types.rs

use serde::{Deserialize, Serialize};

/// Value type of a canonical field once a stage has coerced it.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number,
}

/// One canonical output field and the cleaned source headers it may come from.
///
/// Aliases are matched against headers that already went through `clean_name`,
/// in order; the first one present wins.
#[derive(Debug, PartialEq, Clone, Copy, Eq, Hash)]
pub struct FieldSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn text(name: &'static str, aliases: &'static [&'static str]) -> Self {
        Self {
            name,
            aliases,
            kind: FieldKind::Text,
        }
    }

    pub const fn number(name: &'static str, aliases: &'static [&'static str]) -> Self {
        Self {
            name,
            aliases,
            kind: FieldKind::Number,
        }
    }
}

/// Geographic granularity of an occupation extract.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    State,
    Metro,
    National,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::State => "state",
            Scope::Metro => "metro",
            Scope::National => "national",
        }
    }
}
