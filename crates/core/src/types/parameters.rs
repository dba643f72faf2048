//! Operation parameters and budget values

use crate::error::{RelayError, RelayResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// String-keyed parameters of an operation request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters(Map<String, Value>);

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter, builder style
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a string parameter, if present and non-blank
    ///
    /// Numeric values are accepted and rendered as strings since platform
    /// ids frequently arrive as JSON numbers.
    pub fn optional_str(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Returns a required string parameter or an invalid-request error
    pub fn require_str(&self, operation: &str, key: &str) -> RelayResult<String> {
        self.optional_str(key)
            .ok_or_else(|| RelayError::missing_field(operation, key))
    }

    /// Returns a numeric parameter, accepting numeric strings
    pub fn optional_amount(&self, operation: &str, key: &str) -> RelayResult<Option<f64>> {
        let amount = match self.0.get(key) {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            Some(_) => None,
        };

        match amount {
            Some(a) if a.is_finite() && a > 0.0 => Ok(Some(a)),
            _ => Err(RelayError::InvalidRequest {
                operation: operation.to_string(),
                reason: format!("{} must be a positive number", key),
            }),
        }
    }

    /// Returns a required positive amount
    pub fn require_amount(&self, operation: &str, key: &str) -> RelayResult<f64> {
        self.optional_amount(operation, key)?
            .ok_or_else(|| RelayError::missing_field(operation, key))
    }

    /// Returns a list of strings, accepting a single string as a one-item list
    pub fn string_list(&self, key: &str) -> Vec<String> {
        match self.0.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str())
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.trim().to_string())
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Parameters {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Whether a budget is spent per day or over the object's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    Daily,
    Lifetime,
}

impl fmt::Display for BudgetPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BudgetPeriod::Daily => write!(f, "daily"),
            BudgetPeriod::Lifetime => write!(f, "lifetime"),
        }
    }
}

/// Budget in the account currency's major unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub amount: f64,
    pub period: BudgetPeriod,
}

impl Budget {
    pub fn daily(amount: f64) -> Self {
        Self {
            amount,
            period: BudgetPeriod::Daily,
        }
    }

    pub fn lifetime(amount: f64) -> Self {
        Self {
            amount,
            period: BudgetPeriod::Lifetime,
        }
    }

    /// Reads a budget from `daily_budget`, `lifetime_budget` or `budget`
    pub fn from_parameters(operation: &str, params: &Parameters) -> RelayResult<Self> {
        if let Some(amount) = params.optional_amount(operation, "daily_budget")? {
            return Ok(Self::daily(amount));
        }
        if let Some(amount) = params.optional_amount(operation, "lifetime_budget")? {
            return Ok(Self::lifetime(amount));
        }
        let amount = params.require_amount(operation, "budget")?;
        match params.optional_str("budget_type").as_deref() {
            Some("lifetime") => Ok(Self::lifetime(amount)),
            Some("daily") | None => Ok(Self::daily(amount)),
            Some(other) => Err(RelayError::InvalidRequest {
                operation: operation.to_string(),
                reason: format!("unsupported budget_type '{}'", other),
            }),
        }
    }

    /// Amount in cents
    pub fn minor_units(&self) -> i64 {
        (self.amount * 100.0).round() as i64
    }

    /// Amount in millionths of the currency unit
    pub fn micros(&self) -> i64 {
        (self.amount * 1_000_000.0).round() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_require_str_missing() {
        let params = Parameters::new().with("name", "Spring sale");
        let err = params.require_str("create_campaign", "ad_account_id").unwrap_err();
        assert!(matches!(err, RelayError::InvalidRequest { .. }));
        assert!(err.to_string().contains("ad_account_id"));
    }

    #[test]
    fn test_require_str_blank_counts_as_missing() {
        let params = Parameters::new().with("ad_account_id", "   ");
        assert!(params.require_str("create_campaign", "ad_account_id").is_err());
    }

    #[test]
    fn test_numeric_ids_are_accepted() {
        let params = Parameters::new().with("campaign_id", json!(120200000001u64));
        assert_eq!(
            params.require_str("get_status", "campaign_id").ok().as_deref(),
            Some("120200000001")
        );
    }

    #[test]
    fn test_amount_parsing() {
        let params = Parameters::new()
            .with("a", 12.5)
            .with("b", "40")
            .with("c", -3)
            .with("d", "abc");
        assert_eq!(params.optional_amount("op", "a").ok(), Some(Some(12.5)));
        assert_eq!(params.optional_amount("op", "b").ok(), Some(Some(40.0)));
        assert!(params.optional_amount("op", "c").is_err());
        assert!(params.optional_amount("op", "d").is_err());
        assert_eq!(params.optional_amount("op", "missing").ok(), Some(None));
    }

    #[test]
    fn test_string_list() {
        let params = Parameters::new()
            .with("one", "US")
            .with("many", json!(["US", "", "CA"]));
        assert_eq!(params.string_list("one"), vec!["US"]);
        assert_eq!(params.string_list("many"), vec!["US", "CA"]);
        assert!(params.string_list("none").is_empty());
    }

    #[test]
    fn test_budget_from_parameters() {
        let daily = Parameters::new().with("daily_budget", 50);
        assert_eq!(
            Budget::from_parameters("update_budget", &daily).ok(),
            Some(Budget::daily(50.0))
        );

        let lifetime = Parameters::new()
            .with("budget", "1200")
            .with("budget_type", "lifetime");
        assert_eq!(
            Budget::from_parameters("update_budget", &lifetime).ok(),
            Some(Budget::lifetime(1200.0))
        );

        let missing = Parameters::new();
        assert!(Budget::from_parameters("update_budget", &missing).is_err());
    }

    #[test]
    fn test_budget_units() {
        let budget = Budget::daily(25.5);
        assert_eq!(budget.minor_units(), 2550);
        assert_eq!(budget.micros(), 25_500_000);
    }

    #[test]
    fn test_deserializes_from_object() {
        let params: Parameters =
            serde_json::from_value(json!({"ad_account_id": "act_1", "name": "Launch"})).unwrap();
        assert!(params.contains("ad_account_id"));
        assert_eq!(params.as_map().len(), 2);
    }
}
