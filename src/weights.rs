//! Ordered element -> weight maps.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Insertion-ordered map of element name to weight.
///
/// Weight maps produced by the engine are sorted by descending weight, ties in
/// first-seen order. Serializes as a JSON object in that order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightMap {
    entries: Vec<(String, f64)>,
}

impl WeightMap {
    /// Keep the given order.
    pub fn from_entries(entries: Vec<(String, f64)>) -> Self {
        Self { entries }
    }

    /// Stable sort by descending weight.
    pub fn sorted_descending(mut entries: Vec<(String, f64)>) -> Self {
        entries.sort_by(|a, b| b.1.total_cmp(&a.1));
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| *v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, v)| v).sum()
    }

    pub fn as_slice(&self) -> &[(String, f64)] {
        &self.entries
    }

    pub fn into_vec(self) -> Vec<(String, f64)> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a WeightMap {
    type Item = &'a (String, f64);
    type IntoIter = std::slice::Iter<'a, (String, f64)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl Serialize for WeightMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
