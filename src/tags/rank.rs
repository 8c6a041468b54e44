use std::collections::HashMap;

use serde::Serialize;

use super::extract::TagExtractor;
use crate::{record::Record, value::Value};

pub const DEFAULT_TAG_CAP: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub frequency: usize,
}

/// Tags of a record set ordered by descending frequency. Ties keep the order
/// in which tags were first encountered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagVocabulary {
    entries: Vec<TagCount>,
}

impl TagVocabulary {
    /// Count every candidate occurrence across all field values, stringified.
    /// Tags are identified case-insensitively and keep their first-seen
    /// spelling. The cap never exceeds [`DEFAULT_TAG_CAP`].
    pub fn build(records: &[Record], extractor: &TagExtractor, cap: usize) -> Self {
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut entries: Vec<TagCount> = Vec::new();

        let texts = records
            .iter()
            .flat_map(Record::values)
            .map(Value::as_display);
        for text in texts {
            for tag in extractor.extract(&text) {
                let key = tag.to_lowercase();
                match positions.get(&key) {
                    Some(&index) => entries[index].frequency += 1,
                    None => {
                        positions.insert(key, entries.len());
                        entries.push(TagCount { tag, frequency: 1 });
                    }
                }
            }
        }

        entries.sort_by(|a, b| b.frequency.cmp(&a.frequency));
        entries.truncate(cap.min(DEFAULT_TAG_CAP));
        Self { entries }
    }

    pub fn entries(&self) -> &[TagCount] {
        &self.entries
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.tag.as_str())
    }

    pub fn into_tags(self) -> Vec<String> {
        self.entries.into_iter().map(|entry| entry.tag).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(text: &str) -> Record {
        [("Notes", Value::String(text.to_string()))]
            .into_iter()
            .collect()
    }

    #[test]
    fn ranks_by_frequency_then_first_seen() {
        let records = vec![
            record("alpha beta"),
            record("gamma beta"),
            record("Beta delta"),
        ];
        let vocabulary = TagVocabulary::build(&records, &TagExtractor::default(), 10);
        let entries = vocabulary.entries();
        assert_eq!(entries[0], TagCount { tag: "beta".into(), frequency: 3 });
        assert_eq!(
            vocabulary.tags().skip(1).collect::<Vec<_>>(),
            vec!["alpha", "gamma", "delta"]
        );
    }

    #[test]
    fn counts_each_occurrence_not_each_record() {
        let records = vec![record("excel excel excel"), record("sheet")];
        let vocabulary = TagVocabulary::build(&records, &TagExtractor::default(), 10);
        assert_eq!(vocabulary.entries()[0].frequency, 3);
    }

    #[test]
    fn truncates_to_the_cap() {
        let text = (0..80).map(|n| format!("word{n:02}")).collect::<Vec<_>>().join(" ");
        let vocabulary = TagVocabulary::build(&[record(&text)], &TagExtractor::default(), DEFAULT_TAG_CAP);
        assert_eq!(vocabulary.len(), DEFAULT_TAG_CAP);
        assert_eq!(vocabulary.tags().next(), Some("word00"));
    }

    #[test]
    fn booleans_are_stringified_and_numbers_are_dropped() {
        let records: Vec<Record> = vec![
            [
                ("Done", Value::Boolean(false)),
                ("Amount", Value::Number(125.0)),
                ("Item", Value::String("widget".into())),
            ]
            .into_iter()
            .collect(),
        ];
        let vocabulary = TagVocabulary::build(&records, &TagExtractor::default(), 10);
        assert_eq!(vocabulary.into_tags(), vec!["false", "widget"]);
    }

    #[test]
    fn requested_cap_above_the_default_is_clamped() {
        let text = (0..80).map(|n| format!("word{n:02}")).collect::<Vec<_>>().join(" ");
        let vocabulary = TagVocabulary::build(&[record(&text)], &TagExtractor::default(), 100);
        assert_eq!(vocabulary.len(), DEFAULT_TAG_CAP);
    }
}
