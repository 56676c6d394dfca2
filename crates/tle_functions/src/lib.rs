//! tle_functions: The built-in function signature catalog.
//!
//! Signatures live in an embedded JSON asset rather than in code, so the
//! catalog can be refreshed without touching the analysis crates. Lookup is
//! case-insensitive, matching the host runtime's treatment of function names.

use serde::Deserialize;
use thiserror::Error;
use tle_core::NameMap;

const CATALOG_JSON: &str = include_str!("../assets/functions.json");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("malformed function catalog: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// The declared signature of one built-in function.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FunctionMetadata {
    pub name: String,
    /// The fewest arguments a call may supply.
    pub min_args: usize,
    /// The most arguments a call may supply; absent means unbounded.
    #[serde(default)]
    pub max_args: Option<usize>,
    #[serde(default)]
    pub return_type: Option<String>,
    /// A usage string like `concat(arg1, arg2, ...)`, shown on hover.
    pub usage: String,
    pub description: String,
}

impl FunctionMetadata {
    /// Whether a call supplying `count` arguments satisfies this signature.
    pub fn accepts_argument_count(&self, count: usize) -> bool {
        count >= self.min_args && self.max_args.map_or(true, |max| count <= max)
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    functions: Vec<FunctionMetadata>,
}

/// All built-in function signatures, keyed by case-insensitive name.
#[derive(Debug)]
pub struct FunctionCatalog {
    functions: NameMap<FunctionMetadata>,
}

impl FunctionCatalog {
    /// Load the embedded catalog. The asset ships inside the binary, so the
    /// only failure mode is a malformed asset.
    pub fn builtin() -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(CATALOG_JSON)?;
        let mut functions = NameMap::new();
        for metadata in file.functions {
            functions.insert(metadata.name.clone(), metadata);
        }
        Ok(Self { functions })
    }

    /// Look up a function by name, case-insensitively.
    pub fn lookup(&self, name: &str) -> Option<&FunctionMetadata> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains(name)
    }

    /// All functions whose name starts with the prefix, for completion.
    pub fn with_prefix(&self, prefix: &str) -> Vec<&FunctionMetadata> {
        self.functions.values_with_prefix(prefix)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FunctionMetadata> {
        self.functions.values()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
