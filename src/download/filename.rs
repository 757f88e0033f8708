//! File names for downloaded PDFs.

use std::path::{Path, PathBuf};

/// Maximum file name stem length in bytes (before `.pdf`).
pub const MAX_STEM_BYTES: usize = 200;

/// Turns a DOI key into a safe file name.
///
/// Runs of characters outside `[A-Za-z0-9._-]` become one `_`, a leading
/// `doi:` is dropped, the stem is cut to [`MAX_STEM_BYTES`] and `.pdf` is
/// appended.
///
/// # Examples
///
/// ```
/// use pdfharvest::download::sanitize_doi_filename;
///
/// assert_eq!(sanitize_doi_filename("10.1000/xyz123"), "10.1000_xyz123.pdf");
/// assert_eq!(sanitize_doi_filename("10.1002/(sici)1097"), "10.1002_sici_1097.pdf");
/// ```
#[must_use]
pub fn sanitize_doi_filename(key: &str) -> String {
    let key = key.trim();
    let key = match key.get(..4) {
        Some(head) if head.eq_ignore_ascii_case("doi:") => &key[4..],
        _ => key,
    };

    let mut stem = String::with_capacity(key.len());
    let mut prev_sep = false;
    for ch in key.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
            stem.push(ch);
            prev_sep = false;
        } else if !prev_sep {
            stem.push('_');
            prev_sep = true;
        }
    }

    let mut stem = stem.trim_matches('_').to_string();
    // ASCII only, so any byte index is a char boundary.
    stem.truncate(MAX_STEM_BYTES);
    // Never produce "", "." or ".." as a stem.
    if stem.trim_matches('.').is_empty() {
        stem = "unnamed".to_string();
    }
    format!("{stem}.pdf")
}

/// Destination path for a DOI key inside `output_dir`.
#[must_use]
pub fn pdf_path_for_doi(output_dir: &Path, key: &str) -> PathBuf {
    output_dir.join(sanitize_doi_filename(key))
}
