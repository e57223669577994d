//! Parsers for pip's listing and show output.

use serde::Deserialize;

/// One record from `pip list --format=json`.
///
/// pip emits more fields (editable install location and the like); anything
/// beyond name and version is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ListedPackage {
    /// Distribution name as reported by pip.
    pub name: String,
    /// Installed version string.
    pub version: String,
}

/// Malformed `pip list` output.
///
/// Carries the raw text so the operator can inspect what pip actually
/// printed. A listing parse failure aborts only the refresh that produced
/// it; the rows already on screen stay untouched.
#[derive(Debug, thiserror::Error)]
#[error("malformed package listing: {source}")]
pub struct ParseError {
    /// Underlying JSON decoding error.
    #[source]
    pub source: serde_json::Error,
    /// The raw stdout that failed to decode.
    pub raw: String,
}

/// Decode a `pip list --format=json` payload into records sorted for
/// display (ascending by name, case-insensitive).
pub fn parse_listing(raw: &str) -> Result<Vec<ListedPackage>, ParseError> {
    match serde_json::from_str::<Vec<ListedPackage>>(raw) {
        Ok(mut pkgs) => {
            sort_listing(&mut pkgs);
            Ok(pkgs)
        }
        Err(source) => Err(ParseError {
            source,
            raw: raw.to_string(),
        }),
    }
}

/// Display order for listings: ascending by name, case-insensitive.
pub fn sort_listing(pkgs: &mut [ListedPackage]) {
    pkgs.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
}

/// Extract the `Location:` value from `pip show` output, trimmed.
///
/// Returns `None` when no such line exists or its value is empty; detail
/// lookups degrade to "unknown" rather than failing.
pub fn parse_location(raw: &str) -> Option<String> {
    raw.lines()
        .find_map(|line| line.strip_prefix("Location:"))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_sorts_case_insensitively() {
        let raw = r#"[{"name":"Zeta","version":"1.0"},{"name":"alpha","version":"2.0"}]"#;
        let pkgs = parse_listing(raw).expect("valid listing");
        let names: Vec<&str> = pkgs.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "Zeta"]);
    }

    #[test]
    fn listing_ignores_extra_fields() {
        let raw = r#"[{"name":"pip","version":"24.0","editable_project_location":"/x"}]"#;
        let pkgs = parse_listing(raw).expect("valid listing");
        assert_eq!(pkgs[0].name, "pip");
        assert_eq!(pkgs[0].version, "24.0");
    }

    #[test]
    fn malformed_listing_keeps_raw_text() {
        let raw = "WARNING: not json at all";
        let err = parse_listing(raw).expect_err("must fail");
        assert_eq!(err.raw, raw);
        assert!(err.to_string().contains("malformed package listing"));
    }

    #[test]
    fn location_line_is_trimmed() {
        let raw = "Name: foo\nVersion: 1.0\nLocation:   /usr/lib/foo  \nRequires: bar\n";
        assert_eq!(parse_location(raw).as_deref(), Some("/usr/lib/foo"));
    }

    #[test]
    fn missing_location_is_none() {
        assert_eq!(parse_location("Name: foo\nVersion: 1.0\n"), None);
        assert_eq!(parse_location("Location:\n"), None);
        assert_eq!(parse_location(""), None);
    }
}
