// LogicMonitor list filters.
//
// Rendered as the `filter` query parameter: comma-separated predicates,
// `field:value` for equality and `field~value` for "includes". String
// values are double-quoted with embedded quotes escaped; numbers are bare.

use std::fmt;

use serde_json::Value;

/// A value on the right-hand side of a filter predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Text(String),
    Number(i64),
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "\"{}\"", s.replace('"', "\\\"")),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

/// Predicate operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    /// `field:value`
    Eq,
    /// `field~value` -- the field (a string or an array) contains the value.
    Includes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub field: String,
    pub op: FilterOp,
    pub value: FilterValue,
}

/// An ordered conjunction of predicates.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Filter {
    predicates: Vec<Predicate>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality predicate.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.predicates.push(Predicate {
            field: field.into(),
            op: FilterOp::Eq,
            value: value.into(),
        });
        self
    }

    /// Add an "includes" predicate.
    pub fn includes(mut self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.predicates.push(Predicate {
            field: field.into(),
            op: FilterOp::Includes,
            value: value.into(),
        });
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Value of the first equality predicate on `field`, if any.
    pub fn eq_value(&self, field: &str) -> Option<&FilterValue> {
        self.predicates
            .iter()
            .find(|p| p.op == FilterOp::Eq && p.field == field)
            .map(|p| &p.value)
    }

    /// Render as the `filter` query parameter value.
    pub fn to_query(&self) -> String {
        self.predicates
            .iter()
            .map(|p| {
                let op = match p.op {
                    FilterOp::Eq => ':',
                    FilterOp::Includes => '~',
                };
                format!("{}{op}{}", p.field, p.value)
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Evaluate the filter against a JSON object, the way the portal would.
    ///
    /// Missing fields never match.
    pub fn matches(&self, object: &Value) -> bool {
        self.predicates.iter().all(|p| {
            let Some(field) = object.get(&p.field) else {
                return false;
            };
            match p.op {
                FilterOp::Eq => value_equals(field, &p.value),
                FilterOp::Includes => match field {
                    Value::Array(values) => values.iter().any(|v| value_equals(v, &p.value)),
                    Value::String(s) => match &p.value {
                        FilterValue::Text(t) => s.contains(t.as_str()),
                        FilterValue::Number(n) => s.contains(&n.to_string()),
                    },
                    other => value_equals(other, &p.value),
                },
            }
        })
    }
}

fn value_equals(json: &Value, expected: &FilterValue) -> bool {
    match (json, expected) {
        (Value::String(s), FilterValue::Text(t)) => s == t,
        (Value::Number(n), FilterValue::Number(e)) => n.as_i64() == Some(*e),
        // The portal compares loosely: `parentId:"1"` matches a numeric 1.
        (Value::String(s), FilterValue::Number(e)) => s.parse::<i64>().ok() == Some(*e),
        (Value::Number(n), FilterValue::Text(t)) => n.to_string() == *t,
        _ => false,
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn renders_ordered_predicates() {
        let filter = Filter::new().eq("name", "Customer-42").eq("parentId", 1);
        assert_eq!(filter.to_query(), r#"name:"Customer-42",parentId:1"#);
    }

    #[test]
    fn escapes_quotes_in_text_values() {
        let filter = Filter::new().eq("name", r#"The "A" team"#);
        assert_eq!(filter.to_query(), r#"name:"The \"A\" team""#);
    }

    #[test]
    fn renders_includes() {
        let filter = Filter::new().includes("adminGroupIds", 12);
        assert_eq!(filter.to_query(), "adminGroupIds~12");
    }

    #[test]
    fn matches_json_objects() {
        let group = json!({ "id": 7, "name": "Acme", "parentId": 1 });
        assert!(Filter::new().eq("name", "Acme").eq("parentId", 1).matches(&group));
        assert!(!Filter::new().eq("name", "Acme").eq("parentId", 2).matches(&group));
        assert!(!Filter::new().eq("fullPath", "Acme").matches(&group));
    }

    #[test]
    fn includes_matches_array_membership() {
        let user = json!({ "id": 3, "adminGroupIds": [4, 12] });
        assert!(Filter::new().includes("adminGroupIds", 12).matches(&user));
        assert!(!Filter::new().includes("adminGroupIds", 5).matches(&user));
    }
}
