use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A time field as it arrives from the hosted document store. Exports carry native
/// timestamps as `{seconds, nanoseconds}` maps, hand-edited documents use RFC 3339 strings,
/// and a few legacy writers stored epoch milliseconds. Absent or `null` fields are modelled
/// as `Option::None` on the owning document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoreTimestamp {
    Native {
        #[serde(alias = "_seconds")]
        seconds: i64,
        #[serde(alias = "_nanoseconds", default)]
        nanoseconds: u32,
    },
    Text(String),
    Millis(i64),
}

impl StoreTimestamp {
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            StoreTimestamp::Native {
                seconds,
                nanoseconds,
            } => Utc.timestamp_opt(*seconds, *nanoseconds).single(),
            StoreTimestamp::Text(raw) => DateTime::parse_from_rfc3339(raw.trim())
                .ok()
                .map(|value| value.with_timezone(&Utc)),
            StoreTimestamp::Millis(millis) => Utc.timestamp_millis_opt(*millis).single(),
        }
    }
}

impl From<DateTime<Utc>> for StoreTimestamp {
    fn from(value: DateTime<Utc>) -> Self {
        StoreTimestamp::Native {
            seconds: value.timestamp(),
            nanoseconds: value.timestamp_subsec_nanos(),
        }
    }
}

/// Collapse an optional store field into the single internal representation.
pub fn normalize(value: Option<&StoreTimestamp>) -> Option<DateTime<Utc>> {
    value.and_then(StoreTimestamp::to_datetime)
}
