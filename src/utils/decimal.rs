//! Lenient number decoding
//!
//! The API serialises `Decimal` columns (prices, macro values) as JSON
//! strings and float columns as JSON numbers. Both land in `f64` here.

use serde::de::{self, Deserializer};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

fn to_f64<E: de::Error>(raw: NumberOrString) -> Result<f64, E> {
    match raw {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| E::custom(format!("invalid decimal value: '{}'", s))),
    }
}

/// Deserialize a required `f64` from a number or a numeric string
pub fn f64_lenient<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    to_f64(NumberOrString::deserialize(deserializer)?)
}

/// Deserialize an optional `f64` from null, a number or a numeric string
pub fn opt_f64_lenient<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrString>::deserialize(deserializer)? {
        Some(raw) => to_f64(raw).map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(deserialize_with = "f64_lenient")]
        close: f64,
        #[serde(default, deserialize_with = "opt_f64_lenient")]
        adjusted: Option<f64>,
    }

    #[test]
    fn test_accepts_number_and_string() {
        let a: Sample = serde_json::from_str(r#"{"close": 2850.5, "adjusted": "2849.75"}"#).unwrap();
        assert_eq!(a.close, 2850.5);
        assert_eq!(a.adjusted, Some(2849.75));

        let b: Sample = serde_json::from_str(r#"{"close": "1200.00", "adjusted": null}"#).unwrap();
        assert_eq!(b.close, 1200.0);
        assert_eq!(b.adjusted, None);
    }

    #[test]
    fn test_missing_optional_is_none() {
        let s: Sample = serde_json::from_str(r#"{"close": 10}"#).unwrap();
        assert_eq!(s.adjusted, None);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(serde_json::from_str::<Sample>(r#"{"close": "n/a"}"#).is_err());
    }
}
