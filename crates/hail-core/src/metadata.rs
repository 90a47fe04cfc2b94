//! Call metadata: ordered key/value entries attached to requests as headers
//! and to responses as trailers.

/// A single metadata value.
///
/// Textual values cover the common case; binary values carry opaque bytes
/// (the conventional `-bin` suffixed keys).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataValue {
    Str(String),
    Bin(Vec<u8>),
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        MetadataValue::Str(s.to_owned())
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        MetadataValue::Str(s)
    }
}

impl From<Vec<u8>> for MetadataValue {
    fn from(b: Vec<u8>) -> Self {
        MetadataValue::Bin(b)
    }
}

/// Ordered metadata entries.
///
/// This is a multimap: duplicate keys are allowed, and insertion order is
/// preserved exactly. Entries are attached to the wire in the order they
/// were pushed; the invocation layer never reorders or rewrites them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: Vec<(String, MetadataValue)>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, preserving order.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<MetadataValue>) {
        self.entries.push((key.into(), value.into()));
    }

    /// Builder form of [`push`](Self::push).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.push(key, value);
        self
    }

    /// First value for `key`, if any.
    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// All values for `key`, in insertion order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a MetadataValue> {
        self.entries
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// All entries, in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, (String, MetadataValue)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for Metadata {
    type Item = (String, MetadataValue);
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Metadata {
    type Item = &'a (String, MetadataValue);
    type IntoIter = std::slice::Iter<'a, (String, MetadataValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<K, V> FromIterator<(K, V)> for Metadata
where
    K: Into<String>,
    V: Into<MetadataValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Metadata {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_is_preserved() {
        let mut md = Metadata::new();
        md.push("b", "2");
        md.push("a", "1");
        md.push("c", "3");
        let keys: Vec<&str> = md.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["b", "a", "c"]);
    }

    #[test]
    fn duplicate_keys_are_a_multimap() {
        let md = Metadata::new()
            .with("trace", "outer")
            .with("trace", "inner");
        assert_eq!(md.len(), 2);
        assert_eq!(md.get("trace"), Some(&MetadataValue::Str("outer".into())));
        assert_eq!(md.get_all("trace").count(), 2);
    }

    #[test]
    fn binary_values() {
        let md = Metadata::new().with("token-bin", vec![0xDE, 0xAD]);
        assert_eq!(md.get("token-bin"), Some(&MetadataValue::Bin(vec![0xDE, 0xAD])));
    }
}
