//! YAML configuration shared by the commands.
//!
//! ```yaml
//! normalize:
//!   id_columns: [Region, Country]
//!   fill_empty_id_columns: true
//!   preserve_hierarchy: false
//!   max_rows: 100000
//! tags:
//!   top: 30
//!   extra_stop_words: [the, and]
//! id_keywords: [id, name, 部署]
//! ```
//!
//! Every field is optional. Command-line flags take precedence over the file.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    identifier::IdentifierDetector,
    normalize::{NormalizeConfig, Normalizer},
    tags::{DEFAULT_TAG_CAP, StopWords, TagExtractor},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagConfig {
    pub top: usize,
    pub extra_stop_words: Vec<String>,
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            top: DEFAULT_TAG_CAP,
            extra_stop_words: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub normalize: NormalizeConfig,
    pub tags: TagConfig,
    /// Replaces the built-in identifier keywords when present.
    pub id_keywords: Option<Vec<String>>,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let reader = BufReader::new(file);
        let settings = serde_yaml::from_reader(reader).context("Parsing config YAML")?;
        Ok(settings)
    }

    /// Defaults when no path is given.
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    pub fn detector(&self) -> IdentifierDetector {
        match &self.id_keywords {
            Some(keywords) => IdentifierDetector::new(keywords),
            None => IdentifierDetector::default(),
        }
    }

    pub fn normalizer(&self) -> Normalizer {
        Normalizer::new(self.normalize.clone()).with_detector(self.detector())
    }

    pub fn tag_extractor(&self) -> TagExtractor {
        TagExtractor::new(StopWords::default().with_extra(&self.tags.extra_stop_words))
    }
}
