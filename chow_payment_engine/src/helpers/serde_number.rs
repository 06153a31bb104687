//! Accepts an integer that may arrive either as a JSON number or as a string.
//!
//! Gateway metadata is free-form JSON, so the transaction id we sent as a string can come back as a number if anyone
//! in between re-encodes it.
use serde::{de::Error, Deserialize, Deserializer, Serializer};

pub fn serialize<S>(value: &i64, serializer: S) -> Result<S::Ok, S::Error>
where S: Serializer {
    serializer.serialize_str(&value.to_string())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<i64, D::Error>
where D: Deserializer<'de> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum I64Input {
        String(String),
        Number(i64),
    }

    match I64Input::deserialize(deserializer)? {
        I64Input::String(raw) => raw.trim().parse::<i64>().map_err(D::Error::custom),
        I64Input::Number(value) => Ok(value),
    }
}
