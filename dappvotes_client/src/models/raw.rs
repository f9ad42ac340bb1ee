//! Raw records as they come off the chain or out of JSON

use ethers::types::U256;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A numeric value in whatever shape the source produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NumericLike {
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Text(String),
    Big(U256),
}

impl From<u64> for NumericLike {
    fn from(value: u64) -> Self {
        NumericLike::Unsigned(value)
    }
}

impl From<i64> for NumericLike {
    fn from(value: i64) -> Self {
        NumericLike::Signed(value)
    }
}

impl From<f64> for NumericLike {
    fn from(value: f64) -> Self {
        NumericLike::Float(value)
    }
}

impl From<&str> for NumericLike {
    fn from(value: &str) -> Self {
        NumericLike::Text(value.to_string())
    }
}

impl From<String> for NumericLike {
    fn from(value: String) -> Self {
        NumericLike::Text(value)
    }
}

impl From<U256> for NumericLike {
    fn from(value: U256) -> Self {
        NumericLike::Big(value)
    }
}

impl fmt::Display for NumericLike {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericLike::Unsigned(v) => write!(f, "{}", v),
            NumericLike::Signed(v) => write!(f, "{}", v),
            NumericLike::Float(v) => write!(f, "{}", v),
            NumericLike::Text(v) => write!(f, "{:?}", v),
            NumericLike::Big(v) => write!(f, "{}", v),
        }
    }
}

/// Accepts JSON strings and numbers alike
impl<'de> Deserialize<'de> for NumericLike {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct NumericVisitor;

        impl<'de> Visitor<'de> for NumericVisitor {
            type Value = NumericLike;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a number or a string holding a number")
            }

            fn visit_str<E>(self, value: &str) -> Result<NumericLike, E>
            where
                E: de::Error,
            {
                Ok(NumericLike::Text(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> Result<NumericLike, E>
            where
                E: de::Error,
            {
                Ok(NumericLike::Text(value))
            }

            fn visit_u64<E>(self, value: u64) -> Result<NumericLike, E>
            where
                E: de::Error,
            {
                Ok(NumericLike::Unsigned(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<NumericLike, E>
            where
                E: de::Error,
            {
                Ok(NumericLike::Signed(value))
            }

            fn visit_f64<E>(self, value: f64) -> Result<NumericLike, E>
            where
                E: de::Error,
            {
                Ok(NumericLike::Float(value))
            }
        }

        deserializer.deserialize_any(NumericVisitor)
    }
}

/// Poll record before normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPoll {
    pub id: NumericLike,
    pub image: String,
    pub title: String,
    pub description: String,
    pub votes: NumericLike,
    pub contestants: NumericLike,
    pub deleted: bool,
    pub director: String,
    pub starts_at: NumericLike,
    pub ends_at: NumericLike,
    pub timestamp: NumericLike,
    #[serde(default)]
    pub voters: Vec<String>,
    #[serde(default)]
    pub avatars: Vec<String>,
}

/// Contestant record before normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawContestant {
    pub id: NumericLike,
    pub image: String,
    pub name: String,
    pub voter: String,
    pub votes: NumericLike,
    #[serde(default)]
    pub voters: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_like_accepts_strings_and_numbers() {
        let parsed: Vec<NumericLike> = serde_json::from_str(r#"[3, "10", -2, 1.5]"#).unwrap();
        assert_eq!(
            parsed,
            vec![
                NumericLike::Unsigned(3),
                NumericLike::Text("10".to_string()),
                NumericLike::Signed(-2),
                NumericLike::Float(1.5),
            ]
        );
    }

    #[test]
    fn test_raw_contestant_from_camel_case_json() {
        let raw: RawContestant = serde_json::from_value(serde_json::json!({
            "id": 1,
            "image": "https://gw.example/ipfs/QmA",
            "name": "Alice",
            "voter": "0xAbC0000000000000000000000000000000000001",
            "votes": "3"
        }))
        .unwrap();

        assert_eq!(raw.votes, NumericLike::Text("3".to_string()));
        assert!(raw.voters.is_empty());
    }
}
