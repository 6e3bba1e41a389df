use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{GurlzError, Result};

pub const DEFAULT_USER_AGENT: &str = concat!("gurlz/", env!("CARGO_PKG_VERSION"));

/// User defaults for executing requests and rendering responses.
///
/// Keys missing from an existing `config.yaml` fall back to [`Config::default`],
/// except `default_headers`: an empty map is saved by omitting the key, so a
/// missing key reads back as no headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub default_headers: BTreeMap<String, String>,
    pub timeout: String,
    pub follow_redirect: bool,
    pub save_responses: bool,
    pub output_format: String,
    pub color_output: bool,
    pub default_method: String,
    pub max_response_size: i64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            default_headers: BTreeMap::from([(
                "User-Agent".to_string(),
                DEFAULT_USER_AGENT.to_string(),
            )]),
            timeout: "30s".to_string(),
            follow_redirect: true,
            save_responses: true,
            output_format: "json".to_string(),
            color_output: true,
            default_method: "GET".to_string(),
            max_response_size: 1024 * 1024,
        }
    }
}

impl Config {
    pub fn timeout_duration(&self) -> Result<Duration> {
        parse_duration(&self.timeout)
    }

    /// Negative sizes mean "no limit".
    pub fn response_limit(&self) -> Option<usize> {
        usize::try_from(self.max_response_size).ok()
    }
}

/// Parses duration strings such as `30s`, `1.5s`, `250ms`, `100us`, `1m30s`
/// or `2h`. Units are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`; a bare `0`
/// is also accepted.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let invalid = || GurlzError::validation(format!("invalid duration: '{}'", input));
    let s = input.trim();
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.is_empty() {
        return Err(invalid());
    }

    let mut total_nanos: u128 = 0;
    let mut rest = s;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(invalid)?;
        let (whole, fraction) = match rest[..number_len].split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (&rest[..number_len], ""),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit: u128 = match &rest[..unit_len] {
            "ns" => 1,
            "us" | "µs" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => 1_000_000_000,
            "m" => 60 * 1_000_000_000,
            "h" => 3600 * 1_000_000_000,
            _ => return Err(invalid()),
        };
        rest = &rest[unit_len..];

        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let mut part = whole.checked_mul(unit).ok_or_else(invalid)?;
        // digits past nanosecond precision are dropped
        let mut scale = unit;
        for digit in fraction.bytes() {
            if !digit.is_ascii_digit() {
                return Err(invalid());
            }
            scale /= 10;
            part += u128::from(digit - b'0') * scale;
        }
        total_nanos = total_nanos.checked_add(part).ok_or_else(invalid)?;
    }

    let secs = u64::try_from(total_nanos / 1_000_000_000).map_err(|_| invalid())?;
    Ok(Duration::new(secs, (total_nanos % 1_000_000_000) as u32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.default_headers.len(), 1);
        assert!(config.default_headers["User-Agent"].starts_with("gurlz/"));
        assert_eq!(config.timeout_duration().unwrap(), Duration::from_secs(30));
        assert!(config.follow_redirect);
        assert!(config.save_responses);
        assert_eq!(config.output_format, "json");
        assert!(config.color_output);
        assert_eq!(config.default_method, "GET");
        assert_eq!(config.max_response_size, 1_048_576);
    }

    #[test_case("30s", Duration::from_secs(30) ; "seconds")]
    #[test_case("500ms", Duration::from_millis(500) ; "millis")]
    #[test_case("1m30s", Duration::from_secs(90) ; "compound")]
    #[test_case("2h", Duration::from_secs(7200) ; "hours")]
    #[test_case("1.5s", Duration::from_millis(1500) ; "fractional seconds")]
    #[test_case("0.25m", Duration::from_secs(15) ; "fractional minutes")]
    #[test_case(".5s", Duration::from_millis(500) ; "leading dot")]
    #[test_case("250us", Duration::from_micros(250) ; "micros")]
    #[test_case("250µs", Duration::from_micros(250) ; "micro sign")]
    #[test_case("100ns", Duration::from_nanos(100) ; "nanos")]
    #[test_case("1h2m3.5s", Duration::from_millis(3_723_500) ; "mixed compound")]
    #[test_case("0", Duration::ZERO ; "bare zero")]
    fn parses_durations(input: &str, expected: Duration) {
        assert_eq!(parse_duration(input).unwrap(), expected);
    }

    #[test_case("" ; "empty")]
    #[test_case("30" ; "missing unit")]
    #[test_case("s" ; "missing value")]
    #[test_case("10d" ; "unknown unit")]
    #[test_case(".s" ; "lone dot")]
    #[test_case("1.2.3s" ; "two dots")]
    #[test_case("-5s" ; "negative")]
    fn rejects_bad_durations(input: &str) {
        assert!(matches!(parse_duration(input), Err(GurlzError::Validation(_))));
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config: Config = serde_yaml::from_str("timeout: 5s\ncolor_output: false\n").unwrap();
        assert_eq!(config.timeout, "5s");
        assert!(!config.color_output);
        assert_eq!(config.default_method, "GET");
        assert_eq!(config.max_response_size, 1_048_576);
    }

    #[test]
    fn missing_default_headers_read_back_empty() {
        let config: Config = serde_yaml::from_str("timeout: 5s\n").unwrap();
        assert!(config.default_headers.is_empty());
    }

    #[test]
    fn serializes_with_stable_keys() {
        let yaml = serde_yaml::to_string(&Config::default()).unwrap();
        for key in [
            "default_headers",
            "timeout",
            "follow_redirect",
            "save_responses",
            "output_format",
            "color_output",
            "default_method",
            "max_response_size",
        ] {
            assert!(yaml.contains(&format!("{}:", key)), "missing {}", key);
        }
    }

    #[test]
    fn negative_size_means_unlimited() {
        let config = Config { max_response_size: -1, ..Config::default() };
        assert_eq!(config.response_limit(), None);
    }
}
