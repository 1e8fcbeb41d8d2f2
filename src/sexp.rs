//! S-expression plist helpers shared by config loading, replay scripts and
//! event formatting.

use lexpr::Value;

use crate::error::HpuiError;

/// Parse a single s-expression.
pub fn parse(raw: &str) -> Result<Value, HpuiError> {
    lexpr::from_str(raw).map_err(|e| HpuiError::Parse(format!("malformed s-expression: {e}")))
}

/// Find the value following `:key` in a plist.
/// Accepts both `Value::Keyword("key")` and `Value::Symbol(":key")` forms.
pub fn get_value<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    let prefixed = format!(":{}", key);
    let mut current = value;
    while let Value::Cons(pair) = current {
        let is_key = match pair.car() {
            Value::Keyword(k) => k.as_ref() == key,
            Value::Symbol(s) => s.as_ref() == prefixed,
            _ => false,
        };
        if is_key {
            return match pair.cdr() {
                Value::Cons(next) => Some(next.car()),
                _ => None,
            };
        }
        current = pair.cdr();
    }
    None
}

/// Extract a keyword value from a plist as a string.
pub fn get_keyword(value: &Value, key: &str) -> Option<String> {
    let val = get_value(value, key)?;
    Some(match val {
        Value::Keyword(v) => v.to_string(),
        Value::Symbol(v) => {
            let s = v.to_string();
            s.strip_prefix(':').unwrap_or(&s).to_string()
        }
        Value::String(v) => v.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => if *b { "t" } else { "nil" }.to_string(),
        Value::Null | Value::Nil => "nil".to_string(),
        _ => val.to_string(),
    })
}

pub fn get_int(value: &Value, key: &str) -> Option<i64> {
    get_keyword(value, key).and_then(|s| s.parse().ok())
}

pub fn get_float(value: &Value, key: &str) -> Option<f64> {
    get_keyword(value, key).and_then(|s| s.parse().ok())
}

/// Treats "nil" as false, anything else as true.
pub fn get_bool(value: &Value, key: &str) -> Option<bool> {
    get_keyword(value, key).map(|s| s != "nil")
}

/// Extract a list of numbers, e.g. `:center (0 0.1 0)`.
pub fn get_floats(value: &Value, key: &str) -> Option<Vec<f32>> {
    let mut current = get_value(value, key)?;
    let mut out = Vec::new();
    loop {
        match current {
            Value::Cons(pair) => {
                match pair.car() {
                    Value::Number(n) => out.push(n.as_f64()? as f32),
                    _ => return None,
                }
                current = pair.cdr();
            }
            Value::Null => return Some(out),
            _ => return None,
        }
    }
}

/// Escape a string for s-expression output.
pub fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// `t` / `nil` rendering of a boolean.
pub fn bool_sexp(b: bool) -> &'static str {
    if b {
        "t"
    } else {
        "nil"
    }
}

/// Format an event s-expression.
pub fn format_event(event_type: &str, fields: &[(&str, &str)]) -> String {
    let mut s = format!("(:type :event :event :{}", event_type);
    for (key, val) in fields {
        s.push_str(&format!(" :{} {}", key, val));
    }
    s.push(')');
    s
}
