//! Input parsing for DOIs.
//!
//! - [`Doi`] validates and normalizes a single identifier
//! - [`parse_doi_list`] pulls DOIs out of list files and piped input
//! - [`normalize_key`] gives the case-insensitive key used for cache lookups

mod doi;
mod error;
mod input;

pub use doi::{Doi, find_doi, normalize_key};
pub use error::ParseError;
pub use input::{ParseResult, parse_doi_list};
