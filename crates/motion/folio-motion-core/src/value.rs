//! Value: what a tween writes into a stage property.
//! Numbers are f32; text carries CSS-like values such as "12px" or "45deg".

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    /// Scalar float
    Float(f32),

    /// Text. Numeric text with a unit suffix interpolates; anything else steps.
    Text(String),
}

impl Value {
    #[inline]
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Text(s) => split_unit(s).map(|(n, _)| n),
        }
    }

    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Float(_) => None,
        }
    }

    /// Interpolate between two values at eased progress `t`.
    ///
    /// - Float/Float: linear.
    /// - Numeric text on either side: linear on the number, unit taken from `to`
    ///   (or `from` when `to` is a bare float).
    /// - Otherwise: step, switching to `to` once `t >= 1`.
    pub fn lerp(from: &Value, to: &Value, t: f32) -> Value {
        match (from, to) {
            (Value::Float(a), Value::Float(b)) => Value::Float(lerp_f32(*a, *b, t)),
            _ => {
                let a = numeric_parts(from);
                let b = numeric_parts(to);
                match (a, b) {
                    (Some((na, ua)), Some((nb, ub))) => {
                        let unit = if ub.is_empty() { ua } else { ub };
                        Value::Text(format_with_unit(lerp_f32(na, nb, t), unit))
                    }
                    _ => {
                        if t >= 1.0 {
                            to.clone()
                        } else {
                            from.clone()
                        }
                    }
                }
            }
        }
    }

    /// Zero of the same flavour as `like` ("0px" for "12px", 0.0 for floats).
    pub fn zero_like(like: &Value) -> Value {
        match numeric_parts(like) {
            Some((_, unit)) if !unit.is_empty() => Value::Text(format_with_unit(0.0, unit)),
            _ => Value::Float(0.0),
        }
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v as f32)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

#[inline]
fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn numeric_parts(v: &Value) -> Option<(f32, &str)> {
    match v {
        Value::Float(f) => Some((*f, "")),
        Value::Text(s) => split_unit(s),
    }
}

/// Split "12.5px" into (12.5, "px"). Returns None when there is no leading number.
fn split_unit(s: &str) -> Option<(f32, &str)> {
    let s = s.trim();
    let end = s
        .char_indices()
        .find(|&(i, c)| {
            !(c.is_ascii_digit() || c == '.' || ((c == '-' || c == '+') && i == 0))
        })
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    let number: f32 = s[..end].parse().ok()?;
    let unit = s[end..].trim();
    if unit.chars().all(|c| c.is_ascii_alphabetic() || c == '%') {
        Some((number, unit))
    } else {
        None
    }
}

fn format_with_unit(n: f32, unit: &str) -> String {
    // Trim float noise so "10px" does not come back as "10.000001px".
    let rounded = (n * 1000.0).round() / 1000.0;
    format!("{rounded}{unit}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_lerp() {
        assert_eq!(
            Value::lerp(&Value::Float(0.0), &Value::Float(10.0), 0.25),
            Value::Float(2.5)
        );
    }

    #[test]
    fn unit_text_lerp_keeps_unit() {
        let v = Value::lerp(&"0px".into(), &"20px".into(), 0.5);
        assert_eq!(v, Value::Text("10px".into()));
        let v = Value::lerp(&Value::Float(0.0), &"90deg".into(), 1.0);
        assert_eq!(v, Value::Text("90deg".into()));
    }

    #[test]
    fn non_numeric_text_steps_at_end() {
        let from: Value = "circle(10%)".into();
        let to: Value = "circle(60%)".into();
        assert_eq!(Value::lerp(&from, &to, 0.99), from);
        assert_eq!(Value::lerp(&from, &to, 1.0), to);
    }

    #[test]
    fn zero_like_matches_unit() {
        assert_eq!(Value::zero_like(&"3rem".into()), Value::Text("0rem".into()));
        assert_eq!(Value::zero_like(&Value::Float(3.0)), Value::Float(0.0));
    }

    #[test]
    fn untagged_json() {
        let v: Vec<Value> = serde_json::from_str(r#"[1.5, "4px"]"#).unwrap();
        assert_eq!(v, vec![Value::Float(1.5), Value::Text("4px".into())]);
    }
}
