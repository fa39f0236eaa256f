//! Serialization helpers for durations
//!
//! Configuration files and dashboard reports express every duration as an
//! integer number of milliseconds.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serializer};

/// Serde adapter for `Duration` as milliseconds (u64)
///
/// ```rust
/// # #[cfg(feature = "foundation")]
/// # {
/// use std::time::Duration;
///
/// use cadence_common::duration_millis;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Window {
///     #[serde(with = "duration_millis")]
///     batch_window_ms: Duration,
/// }
/// # }
/// ```
pub mod duration_millis {
    use super::*;

    type SerializeResult<S> = Result<<S as Serializer>::Ok, <S as Serializer>::Error>;

    /// Serialize a Duration as milliseconds
    pub fn serialize<S>(duration: &Duration, serializer: S) -> SerializeResult<S>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    /// Deserialize milliseconds into a Duration
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// Serde adapter for `Option<Duration>` as optional milliseconds
pub mod option_duration_millis {
    use super::*;

    type SerializeResult<S> = Result<<S as Serializer>::Ok, <S as Serializer>::Error>;

    /// Serialize an optional Duration as optional milliseconds
    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> SerializeResult<S>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize optional milliseconds into an optional Duration
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for serialization utilities
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Window {
        #[serde(with = "duration_millis")]
        ttl: Duration,
        #[serde(default, with = "option_duration_millis")]
        grace: Option<Duration>,
    }

    /// Tests that durations serialize to integer milliseconds
    #[test]
    fn test_duration_millis_serialize() {
        let data = Window { ttl: Duration::from_millis(1500), grace: Some(Duration::from_secs(2)) };

        let json = serde_json::to_string(&data).expect("Should serialize valid struct");
        assert_eq!(json, r#"{"ttl":1500,"grace":2000}"#);
    }

    /// Tests that a missing optional duration deserializes to `None`
    #[test]
    fn test_option_duration_missing() {
        let data: Window = serde_json::from_str(r#"{"ttl":10}"#).expect("Should deserialize");
        assert_eq!(data.ttl, Duration::from_millis(10));
        assert_eq!(data.grace, None);
    }

    /// Tests that non-numeric input is rejected
    #[test]
    fn test_duration_millis_deserialize_invalid_json() {
        let result: Result<Window, _> = serde_json::from_str(r#"{"ttl":"soon"}"#);
        assert!(result.is_err());
    }
}
