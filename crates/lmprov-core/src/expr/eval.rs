// Expression evaluation against a variable scope.

use std::cmp::Ordering;

use indexmap::IndexMap;

use super::parser::{BinaryOp, Expr, TemplatePart, UnaryOp, parse};
use super::value::{FromValue, Value};
use crate::error::CoreError;
use crate::scope::VariableScope;

/// Outcome of a typed evaluation that kept the type mismatch visible.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluated<T> {
    /// The expression produced a value of the requested type.
    Value(T),
    /// The expression produced `actual`, which is not of the requested
    /// type; the typed contract substitutes the default.
    Fallback { actual: Value },
}

impl<T: Default> Evaluated<T> {
    pub fn into_value(self) -> T {
        match self {
            Self::Value(v) => v,
            Self::Fallback { .. } => T::default(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Evaluate `expression` to a dynamic value.
pub fn evaluate(expression: &str, scope: &VariableScope) -> Result<Value, CoreError> {
    parse(expression)
        .eval(scope)
        .map_err(|reason| CoreError::Evaluation {
            expression: expression.to_owned(),
            reason,
        })
}

/// Evaluate `expression` as a `T`.
///
/// A value of the wrong type yields `T::default()` rather than an error.
/// Parse failures are impossible (unparseable input is a template);
/// undefined variables and operator errors still propagate.
pub fn evaluate_as<T: FromValue>(expression: &str, scope: &VariableScope) -> Result<T, CoreError> {
    evaluate_outcome(expression, scope).map(Evaluated::into_value)
}

/// Evaluate `expression` as a `T`, reporting a type mismatch as
/// [`Evaluated::Fallback`] instead of hiding it.
pub fn evaluate_outcome<T: FromValue>(
    expression: &str,
    scope: &VariableScope,
) -> Result<Evaluated<T>, CoreError> {
    let value = evaluate(expression, scope)?;
    Ok(match T::from_value(&value) {
        Some(typed) => Evaluated::Value(typed),
        None => Evaluated::Fallback { actual: value },
    })
}

/// Evaluate the field `name` of a field map as a `T`.
///
/// `None` when the field is absent or evaluates to another type.
pub fn try_evaluate_field<T: FromValue>(
    fields: &IndexMap<String, String>,
    name: &str,
    scope: &VariableScope,
) -> Result<Option<T>, CoreError> {
    let Some(expression) = fields.get(name) else {
        return Ok(None);
    };
    Ok(match evaluate_outcome(expression, scope)? {
        Evaluated::Value(v) => Some(v),
        Evaluated::Fallback { .. } => None,
    })
}

// ── Tree walk ────────────────────────────────────────────────────────

impl Expr {
    pub fn eval(&self, scope: &VariableScope) -> Result<Value, String> {
        match self {
            Expr::Literal(v) => Ok(v.clone()),
            Expr::Variable(name) => lookup(scope, name).cloned(),
            Expr::Template(parts) => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        TemplatePart::Text(t) => out.push_str(t),
                        TemplatePart::Variable(name) => {
                            out.push_str(&lookup(scope, name)?.to_string());
                        }
                    }
                }
                Ok(Value::Str(out))
            }
            Expr::Unary(op, operand) => unary(*op, operand.eval(scope)?),
            Expr::Binary(BinaryOp::And, lhs, rhs) => {
                if expect_bool(lhs.eval(scope)?, "and")? {
                    Ok(Value::Bool(expect_bool(rhs.eval(scope)?, "and")?))
                } else {
                    Ok(Value::Bool(false))
                }
            }
            Expr::Binary(BinaryOp::Or, lhs, rhs) => {
                if expect_bool(lhs.eval(scope)?, "or")? {
                    Ok(Value::Bool(true))
                } else {
                    Ok(Value::Bool(expect_bool(rhs.eval(scope)?, "or")?))
                }
            }
            Expr::Binary(op, lhs, rhs) => binary(*op, lhs.eval(scope)?, rhs.eval(scope)?),
            Expr::Ternary(condition, then, otherwise) => {
                if expect_bool(condition.eval(scope)?, "?:")? {
                    then.eval(scope)
                } else {
                    otherwise.eval(scope)
                }
            }
            Expr::Call(name, args) => call(name, args, scope),
        }
    }
}

fn lookup<'a>(scope: &'a VariableScope, name: &str) -> Result<&'a Value, String> {
    scope
        .get(name)
        .ok_or_else(|| format!("undefined variable '{name}'"))
}

fn expect_bool(value: Value, op: &str) -> Result<bool, String> {
    value
        .as_bool()
        .ok_or_else(|| format!("'{op}' needs a bool, got {}", value.type_name()))
}

fn unary(op: UnaryOp, value: Value) -> Result<Value, String> {
    match (op, value) {
        (UnaryOp::Neg, Value::Int(n)) => n
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| "integer overflow".to_owned()),
        (UnaryOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::Neg, other) => Err(format!("cannot negate {}", other.type_name())),
        (UnaryOp::Not, other) => Err(format!("'not' needs a bool, got {}", other.type_name())),
    }
}

fn binary(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, String> {
    match op {
        BinaryOp::Add => match (&lhs, &rhs) {
            (Value::Str(_), _) | (_, Value::Str(_)) => Ok(Value::Str(format!("{lhs}{rhs}"))),
            _ => arithmetic(op, &lhs, &rhs),
        },
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
            arithmetic(op, &lhs, &rhs)
        }
        BinaryOp::Eq => Ok(Value::Bool(equals(&lhs, &rhs))),
        BinaryOp::Ne => Ok(Value::Bool(!equals(&lhs, &rhs))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = compare(&lhs, &rhs).ok_or_else(|| {
                format!(
                    "cannot compare {} with {}",
                    lhs.type_name(),
                    rhs.type_name()
                )
            })?;
            Ok(Value::Bool(match op {
                BinaryOp::Lt => ordering == Ordering::Less,
                BinaryOp::Le => ordering != Ordering::Greater,
                BinaryOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            }))
        }
        BinaryOp::And => Ok(Value::Bool(
            expect_bool(lhs, "and")? && expect_bool(rhs, "and")?,
        )),
        BinaryOp::Or => Ok(Value::Bool(
            expect_bool(lhs, "or")? || expect_bool(rhs, "or")?,
        )),
    }
}

fn arithmetic(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, String> {
    if let (Value::Int(a), Value::Int(b)) = (lhs, rhs) {
        let (a, b) = (*a, *b);
        let result = match op {
            BinaryOp::Add => a.checked_add(b),
            BinaryOp::Sub => a.checked_sub(b),
            BinaryOp::Mul => a.checked_mul(b),
            BinaryOp::Div | BinaryOp::Mod if b == 0 => return Err("division by zero".into()),
            BinaryOp::Div if a % b != 0 => return float_arithmetic(op, lhs, rhs),
            BinaryOp::Div => a.checked_div(b),
            _ => a.checked_rem(b),
        };
        return result
            .map(Value::Int)
            .ok_or_else(|| "integer overflow".to_owned());
    }
    float_arithmetic(op, lhs, rhs)
}

fn float_arithmetic(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, String> {
    let (Some(a), Some(b)) = (lhs.as_f64(), rhs.as_f64()) else {
        return Err(format!(
            "arithmetic needs numbers, got {} and {}",
            lhs.type_name(),
            rhs.type_name()
        ));
    };
    if matches!(op, BinaryOp::Div | BinaryOp::Mod) && b == 0.0 {
        return Err("division by zero".into());
    }
    Ok(Value::Float(match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        _ => a % b,
    }))
}

/// Values of different kinds are never equal, except int/float.
#[allow(clippy::float_cmp)]
fn equals(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            lhs.as_f64() == rhs.as_f64()
        }
        _ => lhs == rhs,
    }
}

fn compare(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => lhs.as_f64()?.partial_cmp(&rhs.as_f64()?),
    }
}

// ── Functions ────────────────────────────────────────────────────────

fn call(name: &str, args: &[Expr], scope: &VariableScope) -> Result<Value, String> {
    match (name.to_ascii_lowercase().as_str(), args) {
        ("if", [condition, then, otherwise]) => {
            if expect_bool(condition.eval(scope)?, "if")? {
                then.eval(scope)
            } else {
                otherwise.eval(scope)
            }
        }
        ("lower", [arg]) => text_arg(name, arg.eval(scope)?).map(|s| Value::Str(s.to_lowercase())),
        ("upper", [arg]) => text_arg(name, arg.eval(scope)?).map(|s| Value::Str(s.to_uppercase())),
        ("string", [arg]) => Ok(Value::Str(arg.eval(scope)?.to_string())),
        ("isnull", [arg]) => Ok(Value::Bool(arg.eval(scope)?.is_null())),
        ("if" | "lower" | "upper" | "string" | "isnull", _) => {
            Err(format!("wrong number of arguments to {name}()"))
        }
        _ => Err(format!("unknown function {name}()")),
    }
}

fn text_arg(name: &str, value: Value) -> Result<String, String> {
    match value {
        Value::Str(s) => Ok(s),
        other => Err(format!("{name}() needs a string, got {}", other.type_name())),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn scope() -> VariableScope {
        [
            ("id", Value::Int(42)),
            ("name", Value::from("Acme")),
            ("enabled", Value::Bool(true)),
            ("ratio", Value::Float(0.5)),
            ("missing", Value::Null),
        ]
        .into_iter()
        .collect()
    }

    fn eval(expression: &str) -> Value {
        evaluate(expression, &scope()).unwrap()
    }

    #[test]
    fn template_fallback_interpolates_scope() {
        assert_eq!(eval("Customer-{id}"), Value::from("Customer-42"));
    }

    #[test]
    fn plus_concatenates_when_either_side_is_text() {
        assert_eq!(eval("'Customer-' + id"), Value::from("Customer-42"));
        assert_eq!(eval("id + 1"), Value::Int(43));
    }

    #[test]
    fn integer_division_stays_integral_only_when_exact() {
        assert_eq!(eval("id / 2"), Value::Int(21));
        assert_eq!(eval("id / 4"), Value::Float(10.5));
        assert!(evaluate("id / 0", &scope()).is_err());
    }

    #[test]
    fn relational_and_logical_operators() {
        assert_eq!(eval("id > 40 && enabled"), Value::Bool(true));
        assert_eq!(eval("id < 40 or not enabled"), Value::Bool(false));
        assert_eq!(eval("ratio * 2 == 1"), Value::Bool(true));
        assert_eq!(eval("name = 'Acme'"), Value::Bool(true));
        assert_eq!(eval("name <> 'Acme'"), Value::Bool(false));
    }

    #[test]
    fn mismatched_types_are_never_equal() {
        assert_eq!(eval("id == '42'"), Value::Bool(false));
        assert_eq!(eval("missing == null"), Value::Bool(true));
    }

    #[test]
    fn logical_operators_short_circuit() {
        assert_eq!(eval("false && undefinedThing"), Value::Bool(false));
        assert_eq!(eval("true || undefinedThing"), Value::Bool(true));
    }

    #[test]
    fn ternary_and_functions() {
        assert_eq!(eval("enabled ? 'on' : 'off'"), Value::from("on"));
        assert_eq!(eval("if(id > 100, 'big', 'small')"), Value::from("small"));
        assert_eq!(eval("upper(name) + lower('X')"), Value::from("ACMEx"));
        assert_eq!(eval("string(id)"), Value::from("42"));
        assert_eq!(eval("isNull(missing)"), Value::Bool(true));
    }

    #[test]
    fn undefined_variables_are_errors() {
        let err = evaluate("nope + 1", &scope()).unwrap_err();
        assert!(matches!(err, CoreError::Evaluation { .. }));
    }

    #[test]
    fn typed_evaluation_falls_back_to_default_on_mismatch() {
        assert!(!evaluate_as::<bool>("name", &scope()).unwrap());
        assert_eq!(evaluate_as::<String>("id", &scope()).unwrap(), "");
        assert_eq!(evaluate_as::<i64>("id", &scope()).unwrap(), 42);
    }

    #[test]
    fn outcome_exposes_the_fallback() {
        let outcome = evaluate_outcome::<bool>("name", &scope()).unwrap();
        assert_eq!(
            outcome,
            Evaluated::Fallback {
                actual: Value::from("Acme")
            }
        );
        assert!(outcome.is_fallback());
    }

    #[test]
    fn missing_or_mistyped_fields_are_none() {
        let mut fields = IndexMap::new();
        fields.insert("Name".to_owned(), "'Overview-' + id".to_owned());
        fields.insert("Description".to_owned(), "id".to_owned());

        let s = scope();
        assert_eq!(
            try_evaluate_field::<String>(&fields, "Name", &s).unwrap(),
            Some("Overview-42".to_owned())
        );
        assert_eq!(try_evaluate_field::<String>(&fields, "Description", &s).unwrap(), None);
        assert_eq!(try_evaluate_field::<String>(&fields, "Other", &s).unwrap(), None);
    }
}
