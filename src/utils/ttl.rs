//! Page-cache TTL directives such as `1h30m` or `45s`.

use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

static TTL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:(\d+)h)?(?:(\d+)m)?(?:(\d+)s)?").unwrap());

/// Parses a TTL directive into a duration.
///
/// Hours, minutes and seconds are each optional and must appear in that
/// order; missing components count as zero. Parsing stops at the first
/// character that does not fit, so a malformed directive yields whatever
/// prefix matched (possibly zero). A zero duration means "cache forever".
pub fn parse_ttl(directive: &str) -> Duration {
    let Some(caps) = TTL_REGEX.captures(directive.trim()) else {
        return Duration::ZERO;
    };

    let part = |i: usize| -> u64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };

    let hours = part(1);
    let minutes = part(2);
    let seconds = part(3);

    Duration::from_secs(
        hours
            .saturating_mul(3600)
            .saturating_add(minutes.saturating_mul(60))
            .saturating_add(seconds),
    )
}

/// Returns true if the whole directive is well formed. The empty directive is
/// valid and means "forever".
pub fn is_ttl_directive(directive: &str) -> bool {
    let directive = directive.trim();
    TTL_REGEX
        .find(directive)
        .is_some_and(|m| m.end() == directive.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_directive() {
        assert_eq!(parse_ttl("1h2m3s"), Duration::from_secs(3723));
    }

    #[test]
    fn test_missing_components_are_zero() {
        assert_eq!(parse_ttl("20m"), Duration::from_secs(1200));
        assert_eq!(parse_ttl("45s"), Duration::from_secs(45));
        assert_eq!(parse_ttl("2h"), Duration::from_secs(7200));
        assert_eq!(parse_ttl("1h30s"), Duration::from_secs(3630));
    }

    #[test]
    fn test_empty_and_malformed_mean_forever() {
        assert_eq!(parse_ttl(""), Duration::ZERO);
        assert_eq!(parse_ttl("soon"), Duration::ZERO);
        assert_eq!(parse_ttl("0s"), Duration::ZERO);
    }

    #[test]
    fn test_prefix_is_used_when_trailing_garbage() {
        assert_eq!(parse_ttl("10mfoo"), Duration::from_secs(600));
    }

    #[test]
    fn test_is_ttl_directive() {
        assert!(is_ttl_directive("1h30m"));
        assert!(is_ttl_directive("10m"));
        assert!(is_ttl_directive(""));
        assert!(!is_ttl_directive("soon"));
        assert!(!is_ttl_directive("10mfoo"));
        assert!(!is_ttl_directive("30m1h"));
    }
}
