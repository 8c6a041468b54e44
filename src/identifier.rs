/// Keywords marking a column as the head of a hierarchical grouping.
pub const DEFAULT_ID_KEYWORDS: &[&str] = &[
    "id",
    "name",
    "country",
    "region",
    "code",
    "identifier",
    "key",
    "number",
    "no",
    "番号",
    "名前",
    "コード",
    "識別子",
];

/// Flags identifier columns by case-insensitive substring match against a
/// fixed keyword list.
#[derive(Debug, Clone)]
pub struct IdentifierDetector {
    keywords: Vec<String>,
}

impl Default for IdentifierDetector {
    fn default() -> Self {
        Self::new(DEFAULT_ID_KEYWORDS.iter().copied())
    }
}

impl IdentifierDetector {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|keyword| keyword.as_ref().trim().to_lowercase())
            .filter(|keyword| !keyword.is_empty())
            .collect();
        Self { keywords }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn is_identifier(&self, header: &str) -> bool {
        let lowered = header.to_lowercase();
        self.keywords
            .iter()
            .any(|keyword| lowered.contains(keyword.as_str()))
    }

    /// Matching headers, in input order.
    pub fn detect(&self, headers: &[String]) -> Vec<String> {
        headers
            .iter()
            .filter(|header| self.is_identifier(header))
            .cloned()
            .collect()
    }
}
