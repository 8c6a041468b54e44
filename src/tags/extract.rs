//! Script-aware tag candidate extraction.
//!
//! Text containing any Hiragana, Katakana or Kanji is segmented into maximal
//! runs per script, plus mixed Kanji+Hiragana runs and lower-cased ASCII
//! alphanumeric runs. Everything else is split into words. Candidates from
//! the different passes may overlap; the ranker merges them.

use std::sync::OnceLock;

use itertools::Itertools;
use regex::Regex;

use super::stopwords::StopWords;

const MIN_LATIN_LEN: usize = 3;
const MIN_CJK_LEN: usize = 2;
const MIN_ALPHANUMERIC_LEN: usize = 2;

const SMALL_HIRAGANA: &[char] = &['ぁ', 'ぃ', 'ぅ', 'ぇ', 'ぉ', 'ゃ', 'ゅ', 'ょ', 'っ'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Script {
    Hiragana,
    Katakana,
    Kanji,
    Other,
}

fn script_of(ch: char) -> Script {
    match ch {
        '\u{3041}'..='\u{3096}' | '\u{309D}' | '\u{309E}' => Script::Hiragana,
        '\u{30A1}'..='\u{30FA}' | '\u{30FC}'..='\u{30FE}' => Script::Katakana,
        '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}' | '\u{3005}' => Script::Kanji,
        _ => Script::Other,
    }
}

pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(|ch| script_of(ch) != Script::Other)
}

fn alphanumeric_run() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"[a-zA-Z0-9][a-zA-Z0-9\-_]*[a-zA-Z0-9]").expect("valid alphanumeric pattern")
    })
}

fn latin_boundary() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"[\s,;:!?()\[\]{}<>"/\\|。、！？]+"#).expect("valid boundary pattern")
    })
}

fn is_numeric(token: &str) -> bool {
    token.chars().all(char::is_numeric)
}

fn is_symbolic(token: &str) -> bool {
    token.chars().all(|ch| !ch.is_alphanumeric())
}

#[derive(Debug, Clone, Default)]
pub struct TagExtractor {
    stop_words: StopWords,
}

impl TagExtractor {
    pub fn new(stop_words: StopWords) -> Self {
        Self { stop_words }
    }

    pub fn stop_words(&self) -> &StopWords {
        &self.stop_words
    }

    /// Tag candidates for one text, in extraction order and not deduplicated.
    pub fn extract(&self, text: &str) -> Vec<String> {
        let candidates = if contains_cjk(text) {
            self.extract_cjk(text)
        } else {
            extract_latin(text)
        };
        candidates
            .into_iter()
            .filter(|tag| {
                let trimmed = tag.trim();
                !trimmed.is_empty()
                    && !is_numeric(trimmed)
                    && !is_symbolic(trimmed)
                    && !self.stop_words.contains(trimmed)
            })
            .collect()
    }

    fn extract_cjk(&self, text: &str) -> Vec<String> {
        let mut tags = Vec::new();

        for (script, run) in &text.chars().chunk_by(|ch| script_of(*ch)) {
            if script == Script::Other {
                continue;
            }
            let run = run.collect::<String>();
            if self.keep_cjk(&run) {
                tags.push(run);
            }
        }

        let mixed = |ch: &char| matches!(script_of(*ch), Script::Kanji | Script::Hiragana);
        for (is_mixed, run) in &text.chars().chunk_by(mixed) {
            if !is_mixed {
                continue;
            }
            let run = run.collect::<String>();
            let has_kanji = run.chars().any(|ch| script_of(ch) == Script::Kanji);
            let has_hiragana = run.chars().any(|ch| script_of(ch) == Script::Hiragana);
            if has_kanji && has_hiragana && self.keep_cjk(&run) {
                tags.push(run);
            }
        }

        tags.extend(
            alphanumeric_run()
                .find_iter(text)
                .map(|found| found.as_str())
                .filter(|part| part.len() >= MIN_ALPHANUMERIC_LEN && !is_numeric(part))
                .map(str::to_lowercase),
        );
        tags
    }

    fn keep_cjk(&self, run: &str) -> bool {
        run.chars().count() >= MIN_CJK_LEN
            && !self.stop_words.contains(run)
            && !run.chars().all(|ch| SMALL_HIRAGANA.contains(&ch))
    }
}

fn extract_latin(text: &str) -> Vec<String> {
    latin_boundary()
        .split(text)
        .map(|word| {
            word.chars()
                .filter(|ch| ch.is_alphanumeric() || matches!(ch, '-' | '_'))
                .collect::<String>()
        })
        .map(|word| word.trim_matches(['-', '_']).to_lowercase())
        .filter(|word| word.chars().count() >= MIN_LATIN_LEN && !is_numeric(word))
        .collect()
}

/// Extract candidates with the default stop words.
pub fn extract_tags(text: &str) -> Vec<String> {
    static EXTRACTOR: OnceLock<TagExtractor> = OnceLock::new();
    EXTRACTOR.get_or_init(TagExtractor::default).extract(text)
}
