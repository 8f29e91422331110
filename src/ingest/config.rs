// src/ingest/config.rs
//! Track-cycling exclusion list: built in, or read from a keyword file.
//!
//! A keyword file is picked by extension. `.json` holds a bare array or an
//! object; `.toml` holds a table:
//!
//! ```toml
//! keywords = ["derny", "zesdaagse"]
//! extend_defaults = true   # add to the built-in list instead of replacing it
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::ingest::filter::DEFAULT_IGNORED_KEYWORDS;

pub const ENV_KEYWORDS_PATH: &str = "IGNORED_KEYWORDS_PATH";
pub const DEFAULT_KEYWORDS_PATH: &str = "config/ignored_keywords.toml";

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum KeywordFile {
    List(Vec<String>),
    Table {
        keywords: Vec<String>,
        #[serde(default)]
        extend_defaults: bool,
    },
}

impl KeywordFile {
    fn into_keywords(self) -> Vec<String> {
        match self {
            Self::List(keywords)
            | Self::Table {
                keywords,
                extend_defaults: false,
            } => normalize_keywords(keywords),
            Self::Table {
                keywords,
                extend_defaults: true,
            } => normalize_keywords(
                DEFAULT_IGNORED_KEYWORDS
                    .iter()
                    .map(|k| k.to_string())
                    .chain(keywords),
            ),
        }
    }
}

/// Lowercase and trim each keyword, drop blanks and repeats, keep file order.
/// The filter compares against lowercased titles and snippets.
pub fn normalize_keywords<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for k in raw {
        let k = k.as_ref().trim().to_lowercase();
        if !k.is_empty() && !out.contains(&k) {
            out.push(k);
        }
    }
    out
}

pub fn load_keywords_from(path: &Path) -> Result<Vec<String>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading keyword file {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let file: KeywordFile = match ext.as_str() {
        "toml" => toml::from_str(&raw)
            .with_context(|| format!("{} is not a keyword table", path.display()))?,
        "json" => serde_json::from_str(&raw)
            .with_context(|| format!("{} is not a keyword list", path.display()))?,
        _ => bail!(
            "keyword file {} must end in .toml or .json",
            path.display()
        ),
    };

    let keywords = file.into_keywords();
    if keywords.is_empty() {
        tracing::warn!(path = %path.display(), "keyword file is empty; no items will be excluded");
    }
    Ok(keywords)
}

/// `$IGNORED_KEYWORDS_PATH` (must exist), then `config/ignored_keywords.toml`,
/// else the built-in list.
pub fn load_ignored_keywords() -> Result<Vec<String>> {
    if let Ok(p) = std::env::var(ENV_KEYWORDS_PATH) {
        let path = PathBuf::from(p);
        if !path.exists() {
            bail!("{ENV_KEYWORDS_PATH} points to {}, which does not exist", path.display());
        }
        return load_keywords_from(&path);
    }
    let path = Path::new(DEFAULT_KEYWORDS_PATH);
    if path.exists() {
        return load_keywords_from(path);
    }
    Ok(normalize_keywords(DEFAULT_IGNORED_KEYWORDS))
}
