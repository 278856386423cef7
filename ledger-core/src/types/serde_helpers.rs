//! Some convenient serde helpers

use serde::{Deserialize, Deserializer, Serializer};

/// Helper type to parse both stringified and plain `u64` values. Nodes encode
/// 64-bit integers as JSON strings, but mocks and older nodes use numbers.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum StringifiedNumeric {
    String(String),
    Num(u64),
}

impl TryFrom<StringifiedNumeric> for u64 {
    type Error = String;

    fn try_from(value: StringifiedNumeric) -> Result<Self, Self::Error> {
        match value {
            StringifiedNumeric::Num(n) => Ok(n),
            StringifiedNumeric::String(s) if s.is_empty() => Ok(0),
            StringifiedNumeric::String(s) => s.parse().map_err(|err| format!("{s:?}: {err}")),
        }
    }
}

/// Serializes a `u64` as a decimal string and accepts either a string or a
/// number when deserializing.
///
/// ```
/// # use serde::{Deserialize, Serialize};
/// #[derive(Serialize, Deserialize)]
/// struct Gas {
///     #[serde(with = "ledger_core::types::serde_helpers::stringified_u64")]
///     wanted: u64,
/// }
/// let gas: Gas = serde_json::from_str(r#"{"wanted":"200000"}"#).unwrap();
/// assert_eq!(gas.wanted, 200_000);
/// assert_eq!(serde_json::to_string(&gas).unwrap(), r#"{"wanted":"200000"}"#);
/// ```
pub mod stringified_u64 {
    use super::*;

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let num = StringifiedNumeric::deserialize(deserializer)?;
        u64::try_from(num).map_err(serde::de::Error::custom)
    }
}

/// Deserializes an optional stringified `u64`, mapping `null` and missing
/// fields to zero. Use together with `#[serde(default)]`.
pub fn deserialize_stringified_u64_or_zero<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<StringifiedNumeric>::deserialize(deserializer)? {
        Some(num) => u64::try_from(num).map_err(serde::de::Error::custom),
        None => Ok(0),
    }
}
