//! Values for placeholder heads: user variables and the process environment.

use crate::parser::Head;
use indexmap::IndexMap;
use std::fmt;

/// Case-sensitive, insertion-ordered `name -> value` table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableTable {
    values: IndexMap<String, String>,
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a variable. The later value wins.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Applies every entry of `other` over this table.
    pub fn merge(&mut self, other: VariableTable) {
        self.values.extend(other.values);
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for VariableTable {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut table = Self::new();
        for (k, v) in iter {
            table.insert(k, v);
        }
        table
    }
}

/// How environment variable names are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum EnvCase {
    Sensitive,
    Insensitive,
}

impl EnvCase {
    /// Insensitive on Windows hosts, sensitive everywhere else.
    pub fn platform_default() -> Self {
        if cfg!(windows) {
            EnvCase::Insensitive
        } else {
            EnvCase::Sensitive
        }
    }

    fn key(self, name: &str) -> String {
        match self {
            EnvCase::Sensitive => name.to_string(),
            EnvCase::Insensitive => name.to_uppercase(),
        }
    }
}

impl Default for EnvCase {
    fn default() -> Self {
        Self::platform_default()
    }
}

impl fmt::Display for EnvCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvCase::Sensitive => write!(f, "sensitive"),
            EnvCase::Insensitive => write!(f, "insensitive"),
        }
    }
}

/// Read-only snapshot of environment variables.
#[derive(Debug, Clone)]
pub struct EnvironmentView {
    case: EnvCase,
    values: IndexMap<String, String>,
}

impl EnvironmentView {
    /// Snapshots the current process environment. Entries whose name or
    /// value is not valid Unicode are skipped.
    pub fn from_process(case: EnvCase) -> Self {
        Self::from_pairs(
            case,
            std::env::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?))),
        )
    }

    /// Builds a view from explicit pairs. With [`EnvCase::Insensitive`] a
    /// later pair overrides an earlier one differing only in case.
    pub fn from_pairs<K, V>(case: EnvCase, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let values = pairs.into_iter().map(|(k, v)| (case.key(k.as_ref()), v.into())).collect();
        Self { case, values }
    }

    pub fn case(&self) -> EnvCase {
        self.case
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(&self.case.key(name)).map(String::as_str)
    }
}

/// Why a head could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unresolved {
    Variable(String),
    Environment(String),
}

/// Resolves placeholder heads against one variable table and environment.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    variables: &'a VariableTable,
    environment: &'a EnvironmentView,
}

impl<'a> Scope<'a> {
    pub fn new(variables: &'a VariableTable, environment: &'a EnvironmentView) -> Self {
        Self { variables, environment }
    }

    /// Looks up the head value. A missing name is always an error, never
    /// an empty string.
    pub fn resolve(&self, head: &Head) -> Result<&'a str, Unresolved> {
        match head {
            Head::Variable(name) => {
                self.variables.get(name).ok_or_else(|| Unresolved::Variable(name.clone()))
            }
            Head::Environment(name) => {
                self.environment.get(name).ok_or_else(|| Unresolved::Environment(name.clone()))
            }
        }
    }
}
