//! Integration tests for the parser module.
//!
//! These tests verify DOI list parsing with realistic inputs and that the
//! extracted values survive validation.

use pdfharvest::parser::{Doi, normalize_key, parse_doi_list};

/// A reading list exported from a reference manager, with a header row.
#[test]
fn test_parse_csv_export_with_header() {
    let input = "\
doi,title,year
10.1038/nature12373,\"Nanometre-scale thermometry\",2013
10.1103/PhysRevLett.116.061102,Observation of Gravitational Waves,2016
";

    let result = parse_doi_list(input);

    assert_eq!(
        result.items,
        vec!["10.1038/nature12373", "10.1103/PhysRevLett.116.061102"]
    );
    assert_eq!(result.skipped, vec!["doi,title,year"]);
}

/// Mixed notations in a hand-written list all validate to the same form.
#[test]
fn test_parse_mixed_notations_then_validate() {
    let input = r"
# papers to read
https://doi.org/10.1000/xyz123
doi:10.1000/abc
  10.1000/def.  

See 10.1000/ghi (preprint)
";

    let result = parse_doi_list(input);
    let dois: Vec<Doi> = result
        .items
        .iter()
        .map(|raw| Doi::parse(raw).unwrap())
        .collect();

    let values: Vec<&str> = dois.iter().map(Doi::as_str).collect();
    assert_eq!(
        values,
        vec!["10.1000/xyz123", "10.1000/abc", "10.1000/def", "10.1000/ghi"]
    );
    assert!(result.skipped.is_empty());
}

/// Keys collapse case differences so repeated DOIs share a cache entry.
#[test]
fn test_keys_are_shared_across_spellings() {
    let result = parse_doi_list("10.1000/ABC\nhttps://doi.org/10.1000/abc\n");
    assert_eq!(result.len(), 2);

    let first = Doi::parse(&result.items[0]).unwrap();
    let second = Doi::parse(&result.items[1]).unwrap();
    assert_eq!(first.key(), second.key());
    assert_eq!(normalize_key("DOI:10.1000/Abc"), first.key());
    assert_eq!(first, second);
}

/// Lines that only look numeric are not mistaken for DOIs.
#[test]
fn test_parse_ignores_lines_without_doi() {
    let result = parse_doi_list("192.10.1234/24\nno identifier here\n");
    assert!(result.is_empty());
    assert_eq!(result.skipped_count(), 2);
}

#[test]
fn test_invalid_doi_error_message_names_input() {
    let err = Doi::parse("11.1000/abc").unwrap_err();
    assert!(err.to_string().contains("11.1000/abc"), "{err}");
}
