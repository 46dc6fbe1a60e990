//! Classification rules: an ordered list of named keyword groups.

use std::fmt;

/// A named classification bucket.
///
/// The name doubles as the destination folder name. Keywords are stored
/// lowercase so they can be compared directly against lowercased text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    name: String,
    keywords: Vec<String>,
}

impl Category {
    /// Build a category, or `None` when `name` is empty.
    ///
    /// An empty name means "no category is open" to the loader, so it is
    /// dropped rather than treated as data. Keywords are trimmed and
    /// lowercased; blank keywords are discarded because an empty string is a
    /// substring of every text.
    pub fn new<N, I, K>(name: N, keywords: I) -> Option<Self>
    where
        N: Into<String>,
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let name = name.into();
        if name.trim().is_empty() {
            return None;
        }
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Some(Self { name, keywords })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Append a keyword, applying the same normalisation as [`Category::new`].
    pub fn push_keyword(&mut self, keyword: &str) {
        let keyword = keyword.trim().to_lowercase();
        if !keyword.is_empty() {
            self.keywords.push(keyword);
        }
    }

    /// Whether this category can ever match. Categories without keywords never do.
    pub fn is_matchable(&self) -> bool {
        !self.keywords.is_empty()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// How many keywords of a category must appear in the text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchMode {
    /// At least one keyword.
    #[default]
    Any,
    /// Every keyword.
    All,
}

impl MatchMode {
    pub fn from_match_all(match_all: bool) -> Self {
        if match_all { Self::All } else { Self::Any }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any keyword"),
            Self::All => f.write_str("all keywords"),
        }
    }
}
