//! DOI list parsing for files and piped stdin.

use tracing::debug;

use super::doi::find_doi;

/// DOIs collected from a list file, in input order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParseResult {
    /// DOI strings as found in the input (not yet validated)
    pub items: Vec<String>,
    /// Non-empty lines with no recognizable DOI (headers, notes)
    pub skipped: Vec<String>,
}

impl ParseResult {
    /// Creates a new empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of DOIs found.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true when no DOI was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of skipped lines.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// Appends another result, keeping order.
    pub fn extend(&mut self, other: Self) {
        self.items.extend(other.items);
        self.skipped.extend(other.skipped);
    }
}

/// Parses a DOI list: one entry per line, `#` starts a comment line.
///
/// Each line contributes at most one DOI, taken from anywhere in the line so
/// CSV/TSV exports with a DOI column work as-is. Duplicates are kept; the
/// second occurrence is served from the cache.
///
/// # Examples
///
/// ```
/// use pdfharvest::parser::parse_doi_list;
///
/// let result = parse_doi_list("doi,title\n10.1000/a,First\n# note\n10.1000/b\n");
/// assert_eq!(result.items, vec!["10.1000/a", "10.1000/b"]);
/// assert_eq!(result.skipped, vec!["doi,title"]);
/// ```
#[tracing::instrument(skip(input), fields(input_len = input.len()))]
#[must_use]
pub fn parse_doi_list(input: &str) -> ParseResult {
    let mut result = ParseResult::new();
    for line in input.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match find_doi(trimmed) {
            Some(doi) => result.items.push(doi),
            None => {
                debug!(line = %trimmed, "no DOI found on line");
                result.skipped.push(trimmed.to_string());
            }
        }
    }
    result
}
