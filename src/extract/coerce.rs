//! Lenient numeric parsing for source fields that arrive as numbers or strings.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

/// A JSON scalar that should be read as a number.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Numeric {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Numeric {
    fn into_f64(self) -> Result<f64, String> {
        match self {
            Numeric::Int(i) => Ok(i as f64),
            Numeric::Float(f) => Ok(f),
            Numeric::Text(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .ok_or_else(|| format!("\"{}\" is not a number", s)),
        }
    }

    fn into_i64(self) -> Result<i64, String> {
        match &self {
            Numeric::Int(i) => return Ok(*i),
            Numeric::Text(s) => {
                if let Ok(i) = s.trim().parse::<i64>() {
                    return Ok(i);
                }
            }
            Numeric::Float(_) => {}
        }
        let f = self.into_f64()?;
        if f.fract() != 0.0 || f < i64::MIN as f64 || f > i64::MAX as f64 {
            return Err(format!("{} is not an integer", f));
        }
        Ok(f as i64)
    }
}

pub fn integer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Numeric::deserialize(deserializer)?
        .into_i64()
        .map_err(D::Error::custom)
}

pub fn float<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Numeric::deserialize(deserializer)?
        .into_f64()
        .map_err(D::Error::custom)
}

/// `null` and blank strings read as `None`.
pub fn optional_float<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    match Option::<Numeric>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Numeric::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(n) => n.into_f64().map(Some).map_err(D::Error::custom),
    }
}

/// `null` and blank strings read as `None`.
pub fn optional_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(deserialize_with = "integer")]
        int: i64,
        #[serde(deserialize_with = "float")]
        real: f64,
        #[serde(default, deserialize_with = "optional_float")]
        maybe: Option<f64>,
        #[serde(default, deserialize_with = "optional_text")]
        text: Option<String>,
    }

    fn probe(value: serde_json::Value) -> Result<Probe, serde_json::Error> {
        serde_json::from_value(value)
    }

    #[test]
    fn test_integer_accepts_float_and_string() {
        assert_eq!(probe(json!({"int": 0.0, "real": 1})).unwrap().int, 0);
        assert_eq!(probe(json!({"int": "1997", "real": 1})).unwrap().int, 1997);
        assert_eq!(probe(json!({"int": "2004.0", "real": 1})).unwrap().int, 2004);
        assert_eq!(probe(json!({"int": 39, "real": 1})).unwrap().int, 39);
    }

    #[test]
    fn test_integer_rejects_fractions_and_text() {
        assert!(probe(json!({"int": 1997.5, "real": 1})).is_err());
        assert!(probe(json!({"int": "", "real": 1})).is_err());
        assert!(probe(json!({"int": "abc", "real": 1})).is_err());
        assert!(probe(json!({"int": null, "real": 1})).is_err());
    }

    #[test]
    fn test_float_accepts_string() {
        let p = probe(json!({"int": 1, "real": "218.93179"})).unwrap();
        assert_eq!(p.real, 218.93179);
        assert!(probe(json!({"int": 1, "real": "NaN"})).is_err());
        assert!(probe(json!({"int": 1})).is_err());
    }

    #[test]
    fn test_optionals() {
        let p = probe(json!({"int": 1, "real": 1})).unwrap();
        assert_eq!(p.maybe, None);
        assert_eq!(p.text, None);

        let p = probe(json!({"int": 1, "real": 1, "maybe": null, "text": "  "})).unwrap();
        assert_eq!(p.maybe, None);
        assert_eq!(p.text, None);

        let p = probe(json!({"int": 1, "real": 1, "maybe": "", "text": "Hamtramck, MI"})).unwrap();
        assert_eq!(p.maybe, None);
        assert_eq!(p.text.as_deref(), Some("Hamtramck, MI"));

        let p = probe(json!({"int": 1, "real": 1, "maybe": 35.14968})).unwrap();
        assert_eq!(p.maybe, Some(35.14968));
    }
}
