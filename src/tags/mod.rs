//! Tag extraction and frequency ranking for Japanese and Latin text.

pub mod extract;
pub mod rank;
pub mod stopwords;

pub use extract::{TagExtractor, extract_tags};
pub use rank::{DEFAULT_TAG_CAP, TagCount, TagVocabulary};
pub use stopwords::StopWords;

use crate::record::Record;

/// Up to [`DEFAULT_TAG_CAP`] tags ranked by frequency, using the default stop
/// words.
pub fn rank_tags(records: &[Record]) -> Vec<String> {
    TagVocabulary::build(records, &TagExtractor::default(), DEFAULT_TAG_CAP).into_tags()
}
