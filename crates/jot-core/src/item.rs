use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single list entry.
///
/// Field names on disk follow the browser layout (`id`, `text`, `completed`,
/// `createdAt`) so a collection exported from one host loads in the other.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: u64,

    pub text: String,

    #[serde(default)]
    pub completed: bool,

    #[serde(alias = "timestamp", with = "created_at_serde")]
    pub created_at: DateTime<Utc>,
}

impl Item {
    pub fn new(id: u64, text: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            text,
            completed: false,
            created_at: now,
        }
    }

    pub fn toggled(&self) -> Self {
        Self {
            completed: !self.completed,
            ..self.clone()
        }
    }

    pub fn with_text(&self, text: String) -> Self {
        Self {
            text,
            ..self.clone()
        }
    }
}

/// Trims `raw` and rejects the result when nothing is left.
pub fn normalize_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Allocates an id from the creation clock, bumped past `last_id` so ids stay
/// strictly increasing when two items land in the same millisecond.
pub fn next_id(now: DateTime<Utc>, last_id: u64) -> u64 {
    let millis = u64::try_from(now.timestamp_millis()).unwrap_or(0);
    millis.max(last_id.saturating_add(1))
}

/// `createdAt` is written as epoch milliseconds. Reads also accept RFC 3339
/// strings, which is what a serialized JS `Date` looks like.
pub mod created_at_serde {
    use chrono::{DateTime, TimeZone, Utc};
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};

    pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(dt.timestamp_millis())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(CreatedAtVisitor)
    }

    struct CreatedAtVisitor;

    impl Visitor<'_> for CreatedAtVisitor {
        type Value = DateTime<Utc>;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("epoch milliseconds or an RFC 3339 timestamp")
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
            Utc.timestamp_millis_opt(value)
                .single()
                .ok_or_else(|| E::custom(format!("timestamp out of range: {value}")))
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
            let value = i64::try_from(value)
                .map_err(|_| E::custom(format!("timestamp out of range: {value}")))?;
            self.visit_i64(value)
        }

        #[allow(clippy::cast_possible_truncation)]
        fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
            self.visit_i64(value.round() as i64)
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            DateTime::parse_from_rfc3339(value.trim())
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(E::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{Item, next_id, normalize_text};

    #[test]
    fn normalize_rejects_blank_input() {
        assert_eq!(normalize_text(""), None);
        assert_eq!(normalize_text("   \t "), None);
        assert_eq!(normalize_text("  Buy milk "), Some("Buy milk".to_string()));
    }

    #[test]
    fn next_id_never_repeats_within_a_millisecond() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let first = next_id(now, 0);
        let second = next_id(now, first);
        assert_eq!(first, 1_772_355_600_000);
        assert_eq!(second, first + 1);
    }

    #[test]
    fn created_at_is_written_as_epoch_millis() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let item = Item::new(7, "Walk dog".to_string(), now);

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["createdAt"], serde_json::json!(1_772_355_600_000_i64));
        assert_eq!(json["completed"], serde_json::json!(false));
    }

    #[test]
    fn browser_records_with_iso_timestamps_load() {
        let raw = r#"{"id":1709283600000,"text":"Buy milk","completed":true,"timestamp":"2026-03-01T09:00:00.000Z"}"#;
        let item: Item = serde_json::from_str(raw).unwrap();

        assert_eq!(item.text, "Buy milk");
        assert!(item.completed);
        assert_eq!(
            item.created_at,
            Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
        );
    }
}
