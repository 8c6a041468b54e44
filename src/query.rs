//! Consumers of normalized records: free-text search, tag filtering,
//! grouping, pagination and match highlighting.

use regex::{Regex, RegexBuilder};
use serde::Serialize;

use crate::record::Record;

pub const UNGROUPED: &str = "Ungrouped";
pub const DEFAULT_PER_PAGE: usize = 50;

/// Search term plus selected tags. Both conditions must hold.
#[derive(Debug, Clone, Default)]
pub struct RecordQuery {
    search: Option<String>,
    tags: Vec<String>,
}

impl RecordQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        self.search = (!term.trim().is_empty()).then(|| term.to_lowercase());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags.extend(
            tags.into_iter()
                .map(|tag| tag.as_ref().to_lowercase())
                .filter(|tag| !tag.is_empty()),
        );
        self
    }

    pub fn is_empty(&self) -> bool {
        self.search.is_none() && self.tags.is_empty()
    }

    /// Terms worth highlighting in rendered output.
    pub fn terms(&self) -> Vec<&str> {
        self.search
            .iter()
            .chain(&self.tags)
            .map(String::as_str)
            .collect()
    }

    pub fn matches(&self, record: &Record) -> bool {
        let values = lowered_values(record);
        let searched = self
            .search
            .as_ref()
            .is_none_or(|term| values.iter().any(|value| value.contains(term.as_str())));
        searched
            && self
                .tags
                .iter()
                .all(|tag| values.iter().any(|value| value.contains(tag.as_str())))
    }

    pub fn apply<'a>(&self, records: &'a [Record]) -> Vec<&'a Record> {
        records.iter().filter(|record| self.matches(record)).collect()
    }
}

fn lowered_values(record: &Record) -> Vec<String> {
    record
        .values()
        .map(|value| value.as_display().to_lowercase())
        .collect()
}

/// Records with any value containing `term`, case-insensitively. An empty
/// term keeps every record.
pub fn search<'a>(records: &'a [Record], term: &str) -> Vec<&'a Record> {
    RecordQuery::new().with_search(term).apply(records)
}

/// Records where every tag occurs in at least one value.
pub fn filter_by_tags<'a, S: AsRef<str>>(records: &'a [Record], tags: &[S]) -> Vec<&'a Record> {
    RecordQuery::new().with_tags(tags).apply(records)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group<'a> {
    pub key: String,
    pub records: Vec<&'a Record>,
}

/// Group records by the displayed value of `column`, in first-seen key
/// order. Records without the column fall into [`UNGROUPED`].
pub fn group_by<'a, I>(records: I, column: &str) -> Vec<Group<'a>>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut groups: Vec<Group<'a>> = Vec::new();
    for record in records {
        let key = record
            .get(column)
            .map(|value| value.as_display())
            .unwrap_or_else(|| UNGROUPED.to_string());
        match groups.iter_mut().find(|group| group.key == key) {
            Some(group) => group.records.push(record),
            None => groups.push(Group {
                key,
                records: vec![record],
            }),
        }
    }
    groups
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    /// 1-based.
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

/// Slice out one 1-based page. Pages outside `1..=total_pages` are empty.
pub fn paginate<T>(items: &[T], page: usize, per_page: usize) -> Page<'_, T> {
    let per_page = per_page.max(1);
    let total_pages = items.len().div_ceil(per_page);
    let start = page.saturating_sub(1).saturating_mul(per_page);
    let slice = if page == 0 || start >= items.len() {
        &items[..0]
    } else {
        &items[start..(start + per_page).min(items.len())]
    };
    Page {
        items: slice,
        page,
        per_page,
        total_items: items.len(),
        total_pages,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: &'a str,
    pub matched: bool,
}

/// Split `text` into matched and unmatched segments for the given terms.
/// Terms are literal and matched case-insensitively, longest first.
pub fn highlight<'a, S: AsRef<str>>(text: &'a str, terms: &[S]) -> Vec<Segment<'a>> {
    let Some(pattern) = highlight_pattern(terms) else {
        return whole(text);
    };
    let mut segments = Vec::new();
    let mut cursor = 0;
    for found in pattern.find_iter(text) {
        if found.start() > cursor {
            segments.push(Segment {
                text: &text[cursor..found.start()],
                matched: false,
            });
        }
        segments.push(Segment {
            text: found.as_str(),
            matched: true,
        });
        cursor = found.end();
    }
    if cursor < text.len() {
        segments.push(Segment {
            text: &text[cursor..],
            matched: false,
        });
    }
    segments
}

fn whole(text: &str) -> Vec<Segment<'_>> {
    if text.is_empty() {
        Vec::new()
    } else {
        vec![Segment {
            text,
            matched: false,
        }]
    }
}

fn highlight_pattern<S: AsRef<str>>(terms: &[S]) -> Option<Regex> {
    let mut terms = terms
        .iter()
        .map(|term| term.as_ref().trim())
        .filter(|term| !term.is_empty())
        .collect::<Vec<_>>();
    if terms.is_empty() {
        return None;
    }
    terms.sort_by_key(|term| std::cmp::Reverse(term.chars().count()));
    let alternation = terms
        .iter()
        .map(|term| regex::escape(term))
        .collect::<Vec<_>>()
        .join("|");
    RegexBuilder::new(&alternation)
        .case_insensitive(true)
        .build()
        .ok()
}
