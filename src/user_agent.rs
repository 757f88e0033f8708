//! User-Agent string sent with every request.
//!
//! Crossref and Unpaywall route clients that identify themselves with a
//! contact address to their "polite" pools.

/// Project URL included in the User-Agent.
const PROJECT_UA_URL: &str = "https://github.com/fierce/pdfharvest";

/// Builds `pdfharvest/<version> (+<project url>; mailto:<contact>)`.
#[must_use]
pub fn polite_user_agent(contact: &str) -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("pdfharvest/{version} (+{PROJECT_UA_URL}; mailto:{contact})")
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_contains_version_and_project_url() {
        let ua = polite_user_agent("me@example.org");
        assert!(ua.contains(PROJECT_UA_URL), "UA must contain project URL: {ua}");
        assert_eq!(
            env!("CARGO_PKG_VERSION"),
            ua.strip_prefix("pdfharvest/")
                .and_then(|s| s.split(' ').next())
                .expect("UA has version"),
        );
    }

    #[test]
    fn test_user_agent_contains_contact() {
        let ua = polite_user_agent("me@example.org");
        assert!(ua.ends_with("; mailto:me@example.org)"), "unexpected UA: {ua}");
    }
}
