//! Serde helpers for the API's string-oriented field encoding.
//!
//! The wizard backend represents "unset" enum fields as the empty string
//! rather than `null` or an absent key. These adapters map that convention
//! onto `Option<T>` so the rest of the crate never handles `""` directly.

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serializer};

/// `Option<T>` <-> wire string, where `None` is the empty string.
///
/// Used on entity fields: the server always sends the key, so an empty
/// string (or `null` from older backends) means "not set".
pub mod option_wire {
    use super::*;

    pub fn serialize<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Display,
        S: Serializer,
    {
        match value {
            Some(v) => serializer.collect_str(v),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        T: FromStr,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref() {
            None | Some("") => Ok(None),
            Some(s) => s.parse::<T>().map(Some).map_err(serde::de::Error::custom),
        }
    }
}

/// `Option<Option<T>>` <-> wire string, for PATCH bodies.
///
/// The outer `Option` is "field present in this patch" (absent keys are
/// skipped via `skip_serializing_if`), the inner one is the value itself,
/// with `None` encoded as the empty string to clear the field server-side.
pub mod patch_wire {
    use super::*;

    pub fn serialize<T, S>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Display,
        S: Serializer,
    {
        match value {
            Some(inner) => option_wire::serialize(inner, serializer),
            // Unreachable under skip_serializing_if, but encode a clear
            // rather than panicking if called directly.
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: FromStr,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        option_wire::deserialize(deserializer).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use crate::model::BloomLevel;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Carrier {
        #[serde(default, with = "crate::wire::option_wire")]
        level: Option<BloomLevel>,
    }

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct PatchCarrier {
        #[serde(
            default,
            skip_serializing_if = "Option::is_none",
            with = "crate::wire::patch_wire"
        )]
        level: Option<Option<BloomLevel>>,
    }

    #[test]
    fn option_wire_round_trips_values() {
        let c = Carrier {
            level: Some(BloomLevel::Analyze),
        };
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, r#"{"level":"Analyze"}"#);
        assert_eq!(serde_json::from_str::<Carrier>(&json).unwrap(), c);
    }

    #[test]
    fn option_wire_maps_empty_string_to_none() {
        let c = Carrier { level: None };
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, r#"{"level":""}"#);
        assert_eq!(serde_json::from_str::<Carrier>(&json).unwrap(), c);
        // Absent and null also read back as None.
        assert_eq!(serde_json::from_str::<Carrier>("{}").unwrap(), c);
        assert_eq!(serde_json::from_str::<Carrier>(r#"{"level":null}"#).unwrap(), c);
    }

    #[test]
    fn option_wire_rejects_unknown_values() {
        assert!(serde_json::from_str::<Carrier>(r#"{"level":"Transcend"}"#).is_err());
    }

    #[test]
    fn patch_wire_distinguishes_absent_from_clear() {
        let absent = PatchCarrier { level: None };
        assert_eq!(serde_json::to_string(&absent).unwrap(), "{}");

        let clear = PatchCarrier { level: Some(None) };
        assert_eq!(serde_json::to_string(&clear).unwrap(), r#"{"level":""}"#);

        let set = PatchCarrier {
            level: Some(Some(BloomLevel::Create)),
        };
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"{"level":"Create"}"#);

        assert_eq!(serde_json::from_str::<PatchCarrier>("{}").unwrap(), absent);
        assert_eq!(
            serde_json::from_str::<PatchCarrier>(r#"{"level":""}"#).unwrap(),
            clear
        );
    }
}
