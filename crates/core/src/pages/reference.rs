//! Virtual document references.

use std::fmt;
use std::str::FromStr;

/// Namespaces a document reference can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {
    Main,
    Template,
    Module,
}

impl Namespace {
    /// Prefix used when rendering a reference (`Module:Foo`). Empty for `Main`.
    pub fn prefix(self) -> &'static str {
        match self {
            Namespace::Main => "",
            Namespace::Template => "Template",
            Namespace::Module => "Module",
        }
    }

    /// Directory name used by the page store.
    pub fn dir_name(self) -> &'static str {
        match self {
            Namespace::Main => "Main",
            Namespace::Template => "Template",
            Namespace::Module => "Module",
        }
    }

    /// File extension for pages stored in this namespace.
    pub fn extension(self) -> &'static str {
        match self {
            Namespace::Module => "lua",
            Namespace::Main | Namespace::Template => "wiki",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix.trim().to_lowercase().as_str() {
            "template" => Some(Namespace::Template),
            "module" => Some(Namespace::Module),
            _ => None,
        }
    }
}

/// A (namespace, name) pair addressing a page.
///
/// Names are normalised on construction: surrounding whitespace is trimmed,
/// underscores become spaces and the first character is upper-cased, so
/// `Module:common_tests` and `Module:Common tests` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentRef {
    namespace: Namespace,
    name: String,
}

impl DocumentRef {
    pub fn new(namespace: Namespace, name: &str) -> Self {
        Self { namespace, name: normalize_name(name) }
    }

    pub fn module(name: &str) -> Self {
        Self::new(Namespace::Module, name)
    }

    /// The title every simulated render starts from.
    pub fn main_page() -> Self {
        Self::new(Namespace::Main, "Main Page")
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name as stored on disk (spaces replaced by underscores).
    pub fn db_key(&self) -> String {
        self.name.replace(' ', "_")
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.namespace {
            Namespace::Main => write!(f, "{}", self.name),
            ns => write!(f, "{}:{}", ns.prefix(), self.name),
        }
    }
}

impl From<&str> for DocumentRef {
    /// Parse `Prefix:Name`. An unknown prefix is part of a `Main` name.
    fn from(s: &str) -> Self {
        if let Some((prefix, rest)) = s.split_once(':') {
            if let Some(ns) = Namespace::from_prefix(prefix) {
                return Self::new(ns, rest);
            }
        }
        Self::new(Namespace::Main, s)
    }
}

impl FromStr for DocumentRef {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

fn normalize_name(name: &str) -> String {
    let spaced = name.replace('_', " ");
    let trimmed = spaced.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
