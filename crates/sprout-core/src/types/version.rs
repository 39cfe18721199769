//! Version helpers for update recommendations.
//!
//! These compare a manifest's declared range with the latest published
//! version using a numeric-prefix approximation, not full semver range
//! evaluation: `^1.2.0` against latest `1.3.0` recommends an update even
//! though the range would accept it. A manifest not pinned at the latest
//! version is considered outdated.

/// Characters stripped from the front of a declared range
const RANGE_PREFIXES: &[char] = &['^', '~', 'v', 'V'];

/// Characters stripped from the front of a published version
const VERSION_PREFIXES: &[char] = &['v', 'V'];

/// Check whether the declared `wanted` range trails the `latest` version
pub fn update_recommended(latest: &str, wanted: &str) -> bool {
    update_path(latest, wanted).is_some()
}

/// Old and new versions to display for an update (`old -> new`)
///
/// Returns `None` when either side is empty or has no numeric prefix, or
/// when both prefixes are equal.
pub fn update_path(latest: &str, wanted: &str) -> Option<(String, String)> {
    if latest.is_empty() || wanted.is_empty() {
        return None;
    }

    let old = numeric_prefix(wanted.trim_start_matches(RANGE_PREFIXES));
    let new = numeric_prefix(latest.trim_start_matches(VERSION_PREFIXES));
    if old.is_empty() || new.is_empty() || old == new {
        return None;
    }

    Some((old.to_string(), new.to_string()))
}

/// Leading run of ASCII digits and dots
pub fn numeric_prefix(s: &str) -> &str {
    let end = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len());
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_prefix() {
        assert_eq!(numeric_prefix("1.2.3"), "1.2.3");
        assert_eq!(numeric_prefix("1.2.3-beta.1"), "1.2.3");
        assert_eq!(numeric_prefix("latest"), "");
        assert_eq!(numeric_prefix(""), "");
    }

    #[test]
    fn test_update_recommended() {
        assert!(!update_recommended("1.2.3", "^1.2.3"));
        assert!(!update_recommended("v1.2.3", "~1.2.3"));
        assert!(update_recommended("1.3.0", "^1.2.0"));
        assert!(update_recommended("2.0.0", "1.9.9"));

        // Nothing to compare
        assert!(!update_recommended("", "^1.0.0"));
        assert!(!update_recommended("1.0.0", ""));
        assert!(!update_recommended("1.0.0", "latest"));
        assert!(!update_recommended("1.0.0", "*"));
    }

    #[test]
    fn test_update_path() {
        assert_eq!(
            update_path("4.18.2", "^4.17.1"),
            Some(("4.17.1".to_string(), "4.18.2".to_string()))
        );
        assert_eq!(update_path("4.18.2", "^4.18.2"), None);
        assert_eq!(update_path("v2.1.0", "=2.1.0"), None);
        assert_eq!(
            update_path("5.0.0-rc.1", "^~4.0.0"),
            Some(("4.0.0".to_string(), "5.0.0".to_string()))
        );
    }
}
