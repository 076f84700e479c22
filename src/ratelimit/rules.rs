//! Per-endpoint rate limit rules.
//!
//! Rules are loaded from YAML and map an endpoint name to the quota its
//! callers get. Endpoints without a rule of their own fall back to the
//! default rule.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

use super::counter::Quota;
use crate::error::{Result, RiverdaleError};

/// Endpoint name for review submissions.
pub const REVIEWS: &str = "reviews";
/// Endpoint name for travel inquiries.
pub const INQUIRIES: &str = "inquiries";
/// Endpoint name for callback requests.
pub const CALLBACK_REQUESTS: &str = "callback-requests";

/// The rule table for every throttled endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointRules {
    /// Rule applied to endpoints that have none of their own
    #[serde(default = "default_rule")]
    pub default: RateLimitRule,
    /// Map of endpoint name to rule
    #[serde(default)]
    pub endpoints: HashMap<String, RateLimitRule>,
}

/// A rate limit rule: the request limit and its time window.
///
/// The window is either a whole `unit` or an explicit `window_ms`; when both
/// are given `window_ms` wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitRule {
    /// Number of requests allowed per window
    pub requests_per_unit: u32,
    /// The time unit
    #[serde(default)]
    pub unit: Option<TimeUnit>,
    /// Explicit window length in milliseconds
    #[serde(default)]
    pub window_ms: Option<u64>,
    /// Optional name/description for this limit
    #[serde(default)]
    pub name: Option<String>,
}

/// Time unit for rate limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Second,
    Minute,
    Hour,
    Day,
}

impl TimeUnit {
    /// Length of this unit in milliseconds.
    pub fn as_millis(&self) -> u64 {
        match self {
            TimeUnit::Second => 1_000,
            TimeUnit::Minute => 60_000,
            TimeUnit::Hour => 3_600_000,
            TimeUnit::Day => 86_400_000,
        }
    }
}

impl RateLimitRule {
    /// A rule of `requests_per_unit` per `unit`.
    pub fn per(requests_per_unit: u32, unit: TimeUnit) -> Self {
        Self {
            requests_per_unit,
            unit: Some(unit),
            window_ms: None,
            name: None,
        }
    }

    /// Resolve this rule into a validated quota.
    pub fn quota(&self) -> Result<Quota> {
        let window_ms = match (self.window_ms, self.unit) {
            (Some(window_ms), _) => window_ms,
            (None, Some(unit)) => unit.as_millis(),
            (None, None) => {
                return Err(RiverdaleError::Config(
                    "rate limit rule needs either `unit` or `window_ms`".to_string(),
                ))
            }
        };
        Quota::new(self.requests_per_unit, window_ms)
    }
}

fn default_rule() -> RateLimitRule {
    RateLimitRule::per(30, TimeUnit::Minute)
}

impl Default for EndpointRules {
    fn default() -> Self {
        let endpoints = HashMap::from([
            (REVIEWS.to_string(), RateLimitRule::per(5, TimeUnit::Hour)),
            (INQUIRIES.to_string(), RateLimitRule::per(10, TimeUnit::Hour)),
            (
                CALLBACK_REQUESTS.to_string(),
                RateLimitRule::per(5, TimeUnit::Hour),
            ),
        ]);

        Self {
            default: default_rule(),
            endpoints,
        }
    }
}

impl EndpointRules {
    /// Load rules from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading rate limit rules");

        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load rules from a YAML string.
    ///
    /// Every rule is validated up front so a bad quota is reported at
    /// startup rather than on the first request that hits it.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let rules: EndpointRules = serde_yaml::from_str(yaml).map_err(|e| {
            RiverdaleError::Config(format!("Failed to parse rate limit rules: {}", e))
        })?;
        rules.validate()?;
        Ok(rules)
    }

    /// Check that every rule resolves to a valid quota.
    pub fn validate(&self) -> Result<()> {
        self.default
            .quota()
            .map_err(|e| RiverdaleError::Config(format!("default rule: {}", e)))?;
        for (endpoint, rule) in &self.endpoints {
            rule.quota()
                .map_err(|e| RiverdaleError::Config(format!("rule for `{}`: {}", endpoint, e)))?;
        }
        Ok(())
    }

    /// The rule that applies to an endpoint.
    pub fn rule_for(&self, endpoint: &str) -> &RateLimitRule {
        self.endpoints.get(endpoint).unwrap_or(&self.default)
    }

    /// The quota that applies to an endpoint.
    pub fn quota_for(&self, endpoint: &str) -> Result<Quota> {
        self.rule_for(endpoint).quota()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_defaults() {
        let rules = EndpointRules::default();
        rules.validate().unwrap();

        let reviews = rules.quota_for(REVIEWS).unwrap();
        assert_eq!(reviews.max(), 5);
        assert_eq!(reviews.window_ms(), 3_600_000);

        let inquiries = rules.quota_for(INQUIRIES).unwrap();
        assert_eq!(inquiries.max(), 10);

        let unknown = rules.quota_for("newsletter").unwrap();
        assert_eq!(unknown.max(), 30);
        assert_eq!(unknown.window_ms(), 60_000);
    }

    #[test]
    fn test_parse_rules() {
        let yaml = r#"
default:
  requests_per_unit: 20
  unit: minute
endpoints:
  reviews:
    requests_per_unit: 3
    unit: hour
    name: review submissions
  inquiries:
    requests_per_unit: 2
    window_ms: 1500
"#;
        let rules = EndpointRules::from_yaml(yaml).unwrap();

        let reviews = rules.rule_for(REVIEWS);
        assert_eq!(reviews.requests_per_unit, 3);
        assert_eq!(reviews.unit, Some(TimeUnit::Hour));
        assert_eq!(reviews.name.as_deref(), Some("review submissions"));

        let inquiries = rules.quota_for(INQUIRIES).unwrap();
        assert_eq!(inquiries.window_ms(), 1500);

        let fallback = rules.quota_for(CALLBACK_REQUESTS).unwrap();
        assert_eq!(fallback.max(), 20);
    }

    #[test]
    fn test_missing_default_uses_builtin() {
        let yaml = r#"
endpoints:
  reviews:
    requests_per_unit: 1
    unit: day
"#;
        let rules = EndpointRules::from_yaml(yaml).unwrap();
        assert_eq!(rules.default, default_rule());
    }

    #[test]
    fn test_window_ms_wins_over_unit() {
        let rule = RateLimitRule {
            requests_per_unit: 4,
            unit: Some(TimeUnit::Day),
            window_ms: Some(250),
            name: None,
        };
        assert_eq!(rule.quota().unwrap().window_ms(), 250);
    }

    #[test]
    fn test_invalid_rules_rejected() {
        let zero = r#"
endpoints:
  reviews:
    requests_per_unit: 0
    unit: second
"#;
        assert!(EndpointRules::from_yaml(zero).is_err());

        let no_window = r#"
endpoints:
  reviews:
    requests_per_unit: 5
"#;
        assert!(matches!(
            EndpointRules::from_yaml(no_window),
            Err(RiverdaleError::Config(_))
        ));

        let bad_unit = r#"
endpoints:
  reviews:
    requests_per_unit: 5
    unit: fortnight
"#;
        assert!(EndpointRules::from_yaml(bad_unit).is_err());
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir()
            .join(format!("riverdale-rules-{}.yaml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            "endpoints:\n  reviews:\n    requests_per_unit: 7\n    unit: day\n",
        )
        .unwrap();

        let rules = EndpointRules::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        let reviews = rules.quota_for(REVIEWS).unwrap();
        assert_eq!(reviews.max(), 7);
        assert_eq!(reviews.window_ms(), 86_400_000);
        assert!(EndpointRules::from_file(&path).is_err());
    }

    #[test]
    fn test_time_unit_millis() {
        assert_eq!(TimeUnit::Second.as_millis(), 1_000);
        assert_eq!(TimeUnit::Minute.as_millis(), 60_000);
        assert_eq!(TimeUnit::Hour.as_millis(), 3_600_000);
        assert_eq!(TimeUnit::Day.as_millis(), 86_400_000);
    }
}
