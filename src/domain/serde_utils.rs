//! Serde utilities for catalog payloads.

use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serializer};
use std::fmt;

/// Reads an explicit `null` as the type's default, for collections the
/// server serializes as `null` when empty or not loaded.
///
/// # Errors
///
/// Returns an error if a present value does not deserialize as `T`.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Module to handle server date-times that arrive either as ISO strings
/// (with or without offset) or as Jackson `[y, m, d, h, min, s, nanos]` arrays.
pub mod local_datetime {
    use super::{SeqAccess, Visitor, de, fmt, Deserializer, Serializer};
    use chrono::{DateTime, NaiveDate, NaiveDateTime};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    /// Serializes a date-time as an ISO-8601 string without offset.
    ///
    /// # Errors
    ///
    /// Returns an error if the serializer fails.
    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    /// Deserializes a date-time from a string or an array.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is neither form or holds an invalid date.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(LocalDateTimeVisitor)
    }

    /// Parses the string forms the catalog API emits.
    #[must_use]
    pub fn parse(value: &str) -> Option<NaiveDateTime> {
        let value = value.trim();
        NaiveDateTime::parse_from_str(value, FORMAT)
            .ok()
            .or_else(|| {
                DateTime::parse_from_rfc3339(value)
                    .ok()
                    .map(|dt| dt.naive_local())
            })
    }

    pub(super) struct LocalDateTimeVisitor;

    impl<'de> Visitor<'de> for LocalDateTimeVisitor {
        type Value = NaiveDateTime;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("an ISO-8601 date-time string or a date-time array")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            parse(value).ok_or_else(|| E::custom(format!("invalid date-time: {value}")))
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            let mut parts = [0_i64; 7];
            let mut len = 0;
            while let Some(part) = seq.next_element::<i64>()? {
                if len < parts.len() {
                    parts[len] = part;
                }
                len += 1;
            }

            if len < 3 {
                return Err(de::Error::invalid_length(len, &self));
            }

            let year = i32::try_from(parts[0]).map_err(de::Error::custom)?;
            let mut fields = [0_u32; 6];
            for (slot, part) in fields.iter_mut().zip(&parts[1..]) {
                *slot = u32::try_from(*part).map_err(de::Error::custom)?;
            }
            let [month, day, hour, minute, second, nanos] = fields;

            NaiveDate::from_ymd_opt(year, month, day)
                .and_then(|date| date.and_hms_nano_opt(hour, minute, second, nanos))
                .ok_or_else(|| de::Error::custom("date-time array out of range"))
        }
    }

    /// Module to handle optional server date-times.
    pub mod option {
        use super::{Deserializer, LocalDateTimeVisitor, Serializer, Visitor, de, fmt};
        use chrono::NaiveDateTime;

        /// Serializes an optional date-time.
        ///
        /// # Errors
        ///
        /// Returns an error if the serializer fails.
        pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(v) => super::serialize(v, serializer),
                None => serializer.serialize_none(),
            }
        }

        /// Deserializes an optional date-time.
        ///
        /// # Errors
        ///
        /// Returns an error if a present value is malformed.
        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
        where
            D: Deserializer<'de>,
        {
            struct OptionVisitor;

            impl<'de> Visitor<'de> for OptionVisitor {
                type Value = Option<NaiveDateTime>;

                fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                    formatter.write_str("an optional date-time")
                }

                fn visit_none<E>(self) -> Result<Self::Value, E>
                where
                    E: de::Error,
                {
                    Ok(None)
                }

                fn visit_unit<E>(self) -> Result<Self::Value, E>
                where
                    E: de::Error,
                {
                    Ok(None)
                }

                fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
                where
                    D: Deserializer<'de>,
                {
                    deserializer.deserialize_any(LocalDateTimeVisitor).map(Some)
                }
            }

            deserializer.deserialize_option(OptionVisitor)
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct Stamped {
        #[serde(with = "super::local_datetime")]
        at: NaiveDateTime,
        #[serde(default, with = "super::local_datetime::option")]
        updated: Option<NaiveDateTime>,
    }

    fn expected() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_milli_opt(12, 30, 45, 123)
            .unwrap()
    }

    #[test]
    fn test_string_without_offset() {
        let s: Stamped = serde_json::from_str(r#"{"at":"2024-05-01T12:30:45.123"}"#).unwrap();
        assert_eq!(s.at, expected());
        assert!(s.updated.is_none());
    }

    #[test]
    fn test_string_with_offset() {
        let s: Stamped =
            serde_json::from_str(r#"{"at":"2024-05-01T12:30:45.123-03:00","updated":null}"#)
                .unwrap();
        assert_eq!(s.at, expected());
    }

    #[test]
    fn test_jackson_array_form() {
        let s: Stamped = serde_json::from_str(
            r#"{"at":[2024,5,1,12,30,45,123000000],"updated":[2024,5,1]}"#,
        )
        .unwrap();
        assert_eq!(s.at, expected());
        assert_eq!(
            s.updated.unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_invalid_value_rejected() {
        assert!(serde_json::from_str::<Stamped>(r#"{"at":"yesterday"}"#).is_err());
        assert!(serde_json::from_str::<Stamped>(r#"{"at":[2024,13,1]}"#).is_err());
    }
}
