//! Collection types for name-keyed definition lookup.

use rustc_hash::FxHashMap;

/// Strip one layer of surrounding quote characters from a name, if present.
///
/// Callers of the scope lookup methods sometimes pass the raw quoted argument
/// text (`'storageName'`); definitions store the unquoted name. Only a single
/// layer is removed and only when the string is framed by matching quotes.
pub fn unquote(name: &str) -> &str {
    let bytes = name.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        let last = bytes[bytes.len() - 1];
        if first == last && (first == b'\'' || first == b'"') {
            return &name[1..name.len() - 1];
        }
    }
    name
}

/// Fold a name for case-insensitive comparison, stripping one quote layer.
fn fold(name: &str) -> String {
    unquote(name).to_lowercase()
}

/// An ordered, case-insensitive name map with last-definition-wins lookup.
///
/// Unlike a plain map, duplicate names are *kept* in insertion order; `get`
/// returns the definition inserted last for that name, matching the host
/// runtime's behavior when a template declares the same name twice. Iteration
/// yields every entry in insertion order, which is what the unused-definition
/// accounting and completion lists need.
#[derive(Debug, Clone)]
pub struct NameMap<V> {
    entries: Vec<(String, V)>,
    /// Folded name to index of the last entry with that name.
    index: FxHashMap<String, usize>,
}

impl<V> NameMap<V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    /// Append an entry. An existing entry with the same folded name is kept
    /// but shadowed for lookup purposes.
    pub fn insert(&mut self, name: impl Into<String>, value: V) {
        let name = name.into();
        let idx = self.entries.len();
        self.index.insert(fold(&name), idx);
        self.entries.push((name, value));
    }

    /// Look up by name, case-insensitively, ignoring one layer of quotes.
    /// Returns the last entry inserted under that name.
    pub fn get(&self, name: &str) -> Option<&V> {
        self.index
            .get(&fold(name))
            .map(|&idx| &self.entries[idx].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&fold(name))
    }

    /// All entries whose name starts with the given prefix (case-insensitive),
    /// in insertion order, shadowed duplicates omitted. Feeds completion.
    pub fn values_with_prefix(&self, prefix: &str) -> Vec<&V> {
        let prefix = fold(prefix);
        self.entries
            .iter()
            .enumerate()
            .filter(|(idx, (name, _))| {
                let folded = fold(name);
                folded.starts_with(&prefix) && self.index.get(&folded) == Some(idx)
            })
            .map(|(_, (_, value))| value)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate every entry, including shadowed duplicates, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate every value in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }
}

impl<V> Default for NameMap<V> {
    fn default() -> Self {
        Self::new()
    }
}
