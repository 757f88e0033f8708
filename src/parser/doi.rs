//! DOI validation, normalization and detection in free text.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::error::ParseError;

/// Regex for a DOI embedded in a longer line: `10.XXXX/suffix`.
/// Handles nested registrants like `10.1000.10/example`.
#[allow(clippy::expect_used)]
static DOI_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"10\.\d{4,9}(?:\.\d+)*/[^\s<>"',;\]]+"#).expect("DOI regex is valid") // Static pattern, safe to panic
});

const URL_PREFIXES: [&str; 4] = [
    "https://doi.org/",
    "http://doi.org/",
    "https://dx.doi.org/",
    "http://dx.doi.org/",
];

/// A validated Digital Object Identifier.
///
/// DOIs are case-insensitive, so equality and hashing use [`Doi::key`]
/// (the ASCII-lowercased form) while [`Doi::as_str`] keeps the spelling the
/// user supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Doi {
    value: String,
    key: String,
}

impl Doi {
    /// Parses and validates a DOI.
    ///
    /// Accepts bare DOIs, `doi:` prefixed DOIs (any case) and
    /// `https://doi.org/` / `https://dx.doi.org/` URLs. Percent-encoded input
    /// is decoded before validation.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] when the input is empty or is not shaped like
    /// `10.<registrant>/<suffix>`.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdfharvest::parser::Doi;
    ///
    /// let doi = Doi::parse("https://doi.org/10.1000/XYZ123").unwrap();
    /// assert_eq!(doi.as_str(), "10.1000/XYZ123");
    /// assert_eq!(doi.key(), "10.1000/xyz123");
    /// ```
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let normalized = normalize_doi(input);
        if normalized.is_empty() {
            return Err(ParseError::Empty);
        }
        validate_doi(&normalized)?;
        let key = normalized.to_ascii_lowercase();
        Ok(Self {
            value: normalized,
            key,
        })
    }

    /// Rebuilds a DOI from its stored form ([`Doi::as_str`]).
    ///
    /// Only validates: stored values are already normalized, so prefixes are
    /// not stripped and `%xx` sequences are kept literally.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] when the value is not a valid DOI.
    pub fn from_stored(value: String) -> Result<Self, ParseError> {
        if value.is_empty() {
            return Err(ParseError::Empty);
        }
        validate_doi(&value)?;
        let key = value.to_ascii_lowercase();
        Ok(Self { value, key })
    }

    /// The DOI as supplied (prefixes stripped, case preserved).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// The normalized lookup key (ASCII-lowercased).
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl PartialEq for Doi {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Doi {}

impl std::hash::Hash for Doi {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for Doi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl FromStr for Doi {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Doi {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_stored(value)
    }
}

impl From<Doi> for String {
    fn from(doi: Doi) -> Self {
        doi.value
    }
}

/// Normalizes raw DOI input into a lookup key without validating it.
///
/// Used where a key is needed for arbitrary strings (cache lookups by
/// user-supplied text). Valid DOIs produce the same value as [`Doi::key`].
#[must_use]
pub fn normalize_key(input: &str) -> String {
    normalize_doi(input).to_ascii_lowercase()
}

/// Finds the first DOI-looking token in a line of text.
///
/// Lines from DOI list files may carry other columns (CSV rows, titles), so
/// only the DOI-shaped part is returned. Trailing sentence punctuation and
/// unbalanced closing parentheses are stripped.
#[must_use]
pub fn find_doi(line: &str) -> Option<String> {
    for m in DOI_PATTERN.find_iter(line) {
        // Reject IP-like or versioned tokens such as 192.10.1234/24 or v10.1234/rc1
        if m.start() > 0 {
            let prev_byte = line.as_bytes()[m.start() - 1];
            if prev_byte.is_ascii_alphanumeric() || prev_byte == b'.' {
                continue;
            }
        }
        let candidate = clean_doi_parens(m.as_str().trim_end_matches(['.', ':']));
        trace!(candidate = %candidate, "found DOI candidate");
        return Some(candidate);
    }
    None
}

/// Strips URL and `doi:` prefixes, URL-decodes and trims.
fn normalize_doi(input: &str) -> String {
    let mut doi = input.trim();

    for prefix in &URL_PREFIXES {
        if doi
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
        {
            doi = &doi[prefix.len()..];
            break;
        }
    }

    if doi.get(..4).is_some_and(|head| head.eq_ignore_ascii_case("doi:")) {
        doi = doi[4..].trim_start();
    }

    match urlencoding::decode(doi) {
        Ok(decoded) => decoded.trim().to_string(),
        Err(_) => doi.trim().to_string(),
    }
}

/// Validation rules:
/// - must start with `10.`
/// - first registrant segment must be 4+ digits (nested `10.1000.10` allowed)
/// - non-empty suffix after `/`, without whitespace
fn validate_doi(doi: &str) -> Result<(), ParseError> {
    if !doi.starts_with("10.") {
        return Err(ParseError::invalid_doi(doi, "DOI must start with '10.'"));
    }

    let Some(slash_pos) = doi.find('/') else {
        return Err(ParseError::doi_no_suffix(doi));
    };

    let registrant = &doi[3..slash_pos];
    let first_segment = registrant.split('.').next().unwrap_or("");
    if first_segment.len() < 4 || !first_segment.chars().all(|c| c.is_ascii_digit()) {
        return Err(ParseError::invalid_doi(
            doi,
            "registrant code must have at least 4 digits",
        ));
    }
    if !registrant
        .split('.')
        .all(|segment| !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit()))
    {
        return Err(ParseError::invalid_doi(
            doi,
            "registrant code must be dot-separated digits",
        ));
    }

    let suffix = &doi[slash_pos + 1..];
    if suffix.is_empty() {
        return Err(ParseError::doi_no_suffix(doi));
    }
    if suffix.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ParseError::invalid_doi(
            doi,
            "suffix must not contain whitespace",
        ));
    }

    Ok(())
}

/// DOIs can contain parentheses (`10.1002/(SICI)1097-4636`) but are often
/// wrapped in them in text; only unmatched trailing `)` are stripped.
fn clean_doi_parens(doi: &str) -> String {
    let mut result = doi.to_string();
    if let Some(slash_pos) = result.find('/') {
        while result.ends_with(')') && {
            let s = &result[slash_pos + 1..];
            s.chars().filter(|&c| c == ')').count() > s.chars().filter(|&c| c == '(').count()
        } {
            result.pop();
        }
    }
    result
}
