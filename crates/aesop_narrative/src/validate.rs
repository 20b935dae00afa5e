//! Structural validation of normalized story data.
//!
//! Validation accumulates every violation in one pass rather than stopping
//! at the first, so a caller sees all problems in a document at once.

use serde_json::Value;

const REQUIRED_TURN_FIELDS: &[&str] = &["turn", "result", "news", "stocks"];
const REQUIRED_STOCK_FIELDS: &[&str] = &["name", "current_value", "risk_level"];

/// Minimum narrative length before a turn draws an advisory notice.
const SHORT_RESULT_CHARS: usize = 10;

/// Accumulated validation outcome.
///
/// Violations are structural failures; notices are advisory observations
/// that do not affect validity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    violations: Vec<String>,
    notices: Vec<String>,
}

impl ValidationReport {
    /// True iff no violations were recorded.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Structural violations, in document order.
    pub fn violations(&self) -> &[String] {
        &self.violations
    }

    /// Advisory notices, in document order.
    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    /// Consume the report, yielding `(violations, notices)`.
    pub fn into_parts(self) -> (Vec<String>, Vec<String>) {
        (self.violations, self.notices)
    }
}

/// Validate a normalized story value against the turn/stock schema.
///
/// Rules, evaluated over every turn in order:
/// - the top level must be an array;
/// - each turn must carry `turn`, `result`, `news`, and `stocks`, one
///   violation per missing field with the 1-based turn index;
/// - each stock must carry `name`, `current_value`, and `risk_level`, named
///   by its `name` field or "Unknown";
/// - a non-object entry inside `stocks` is itself a violation.
///
/// Advisory notices flag very short narrative text and empty stock lists.
///
/// # Examples
///
/// ```
/// use aesop_narrative::validate;
///
/// let value = serde_json::json!([
///     {"turn": 1, "result": "A bakery opens", "news": "Prices rise", "stocks": []}
/// ]);
/// let report = validate(&value);
/// assert!(report.is_valid());
/// ```
#[tracing::instrument(skip(value))]
pub fn validate(value: &Value) -> ValidationReport {
    let mut report = ValidationReport::default();

    let Some(turns) = value.as_array() else {
        report
            .violations
            .push(format!("Story data must be an array, got {}", type_name(value)));
        return report;
    };

    for (index, turn) in turns.iter().enumerate() {
        let turn_index = index + 1;

        let Some(fields) = turn.as_object() else {
            report
                .violations
                .push(format!("Turn {turn_index} is not an object"));
            continue;
        };

        for field in REQUIRED_TURN_FIELDS {
            if !fields.contains_key(*field) {
                report.violations.push(format!(
                    "Turn {turn_index} is missing the '{field}' field"
                ));
            }
        }

        if let Some(result) = fields.get("result").and_then(Value::as_str) {
            if result.chars().count() < SHORT_RESULT_CHARS {
                report
                    .notices
                    .push(format!("Turn {turn_index} narrative is very short"));
            }
        }

        if let Some(stocks) = fields.get("stocks").and_then(Value::as_array) {
            if stocks.is_empty() {
                report
                    .notices
                    .push(format!("Turn {turn_index} has no stock entries"));
            }
            for (stock_index, stock) in stocks.iter().enumerate() {
                validate_stock(&mut report, turn_index, stock_index + 1, stock);
            }
        }
    }

    tracing::debug!(
        turns = turns.len(),
        violations = report.violations.len(),
        notices = report.notices.len(),
        "Validated story structure"
    );

    report
}

fn validate_stock(report: &mut ValidationReport, turn_index: usize, stock_index: usize, stock: &Value) {
    let Some(fields) = stock.as_object() else {
        report.violations.push(format!(
            "Turn {turn_index} stock entry {stock_index} is not an object"
        ));
        return;
    };

    let name = fields
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("Unknown");

    for field in REQUIRED_STOCK_FIELDS {
        if !fields.contains_key(*field) {
            report.violations.push(format!(
                "Turn {turn_index} stock '{name}' is missing the '{field}' field"
            ));
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
