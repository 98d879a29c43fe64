//! Asset filename rules for `include` / `exclude` options.
//!
//! A string rule matches names that start with it; a `{ "regex": "..." }` rule
//! matches names the expression finds a match in. A rule set matches when any
//! of its rules does.

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single filename rule.
#[derive(Debug, Clone)]
pub enum Rule {
    Prefix(String),
    Regex(Regex),
}

impl Rule {
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Rule::Prefix(prefix.into())
    }

    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Rule::Regex)
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            Rule::Prefix(prefix) => name.starts_with(prefix.as_str()),
            Rule::Regex(regex) => regex.is_match(name),
        }
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Rule::Prefix(a), Rule::Prefix(b)) => a == b,
            (Rule::Regex(a), Rule::Regex(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawRule {
    Prefix(String),
    Regex { regex: String },
}

impl Serialize for Rule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Rule::Prefix(prefix) => RawRule::Prefix(prefix.clone()),
            Rule::Regex(regex) => RawRule::Regex {
                regex: regex.as_str().to_string(),
            },
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Rule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawRule::deserialize(deserializer)? {
            RawRule::Prefix(prefix) => Ok(Rule::Prefix(prefix)),
            RawRule::Regex { regex } => Rule::regex(&regex).map_err(serde::de::Error::custom),
        }
    }
}

/// One or more rules; accepts a single rule or a list in configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Rules(Vec<Rule>);

impl Rules {
    pub fn new(rules: impl IntoIterator<Item = Rule>) -> Self {
        Self(rules.into_iter().collect())
    }

    pub fn matches(&self, name: &str) -> bool {
        self.0.iter().any(|rule| rule.matches(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.0.iter()
    }
}

impl<'de> Deserialize<'de> for Rules {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum OneOrMany {
            One(Rule),
            Many(Vec<Rule>),
        }

        Ok(match OneOrMany::deserialize(deserializer)? {
            OneOrMany::One(rule) => Rules(vec![rule]),
            OneOrMany::Many(rules) => Rules(rules),
        })
    }
}

impl From<Rule> for Rules {
    fn from(rule: Rule) -> Self {
        Rules(vec![rule])
    }
}

impl From<&str> for Rules {
    fn from(prefix: &str) -> Self {
        Rules(vec![Rule::prefix(prefix)])
    }
}

impl<const N: usize> From<[&str; N]> for Rules {
    fn from(prefixes: [&str; N]) -> Self {
        Rules(prefixes.into_iter().map(Rule::prefix).collect())
    }
}

/// `include` must match when set; `exclude` must not match when set.
pub fn match_object(include: Option<&Rules>, exclude: Option<&Rules>, name: &str) -> bool {
    if let Some(include) = include {
        if !include.matches(name) {
            return false;
        }
    }
    if let Some(exclude) = exclude {
        if exclude.matches(name) {
            return false;
        }
    }
    true
}
