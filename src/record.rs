use std::collections::BTreeMap;

use itertools::Itertools;
use serde::{Serialize, Serializer, ser::SerializeMap};

use crate::value::Value;

/// A sparse, ordered mapping from cleaned column name to value.
///
/// Keys keep the position of their first insertion; inserting an existing key
/// replaces the value in place, so duplicate column names keep the last write.
/// Equality is map equality and ignores key order.
#[derive(Debug, Clone, Default)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(key, _)| key.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.fields.iter().map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Stable reordering of the keys; values are untouched.
    pub fn sort_keys_by_rank<F>(&mut self, rank: F)
    where
        F: Fn(&str) -> usize,
    {
        self.fields.sort_by_key(|(key, _)| rank(key));
    }

    /// Key-sorted rendering used to detect duplicate records. Values keep
    /// their variant, so the text `"1"` and the number `1` differ.
    pub fn canonical_key(&self) -> String {
        let sorted = self
            .fields
            .iter()
            .map(|(key, value)| (key.as_str(), value))
            .collect::<BTreeMap<_, _>>();
        format!("{sorted:?}")
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(key, value)| other.get(key) == Some(value))
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (key, value) in iter {
            record.insert(key, value);
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Every key used by `records`, in first-seen order.
pub fn union_headers(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .flat_map(Record::keys)
        .unique()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replaces_duplicate_keys_in_place() {
        let mut record = Record::new();
        record.insert("Name", Value::String("Alice".into()));
        record.insert("Value", Value::Number(1.0));
        record.insert("Name", Value::String("Bob".into()));
        assert_eq!(record.len(), 2);
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["Name", "Value"]);
        assert_eq!(record.get("Name"), Some(&Value::String("Bob".into())));
    }

    #[test]
    fn equality_ignores_key_order() {
        let left: Record = [("a", Value::Number(1.0)), ("b", Value::Boolean(true))]
            .into_iter()
            .collect();
        let right: Record = [("b", Value::Boolean(true)), ("a", Value::Number(1.0))]
            .into_iter()
            .collect();
        assert_eq!(left, right);
        assert_eq!(left.canonical_key(), right.canonical_key());
    }

    #[test]
    fn canonical_key_distinguishes_value_variants() {
        let text: Record = [("id", Value::String("1".into()))].into_iter().collect();
        let number: Record = [("id", Value::Number(1.0))].into_iter().collect();
        assert_ne!(text.canonical_key(), number.canonical_key());
    }

    #[test]
    fn serializes_as_ordered_json_object() {
        let record: Record = [
            ("ID", Value::String("1".into())),
            ("Value", Value::Number(10.0)),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r#"{"ID":"1","Value":10}"#
        );
    }

    #[test]
    fn union_headers_keeps_first_seen_order() {
        let records = vec![
            [("b", Value::Number(1.0))].into_iter().collect::<Record>(),
            [("a", Value::Number(1.0)), ("b", Value::Number(2.0))]
                .into_iter()
                .collect(),
        ];
        assert_eq!(union_headers(&records), vec!["b", "a"]);
    }
}
