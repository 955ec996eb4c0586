//! Raw input documents as they appear in the song and log datasets.
//!
//! Only the fields the pipelines select are modelled; anything else in a
//! document is ignored. Every field is optional at this level, required
//! fields are enforced by the derivation steps.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Page value marking a log record as a song play.
pub const NEXT_SONG_PAGE: &str = "NextSong";

/// One catalog document from `song_data`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SongRecord {
    pub song_id: Option<String>,
    pub title: Option<String>,
    pub artist_id: Option<String>,
    pub year: Option<i32>,
    pub duration: Option<f64>,
    pub artist_name: Option<String>,
    pub artist_location: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    pub artist_latitude: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub artist_longitude: Option<f64>,
}

/// One user-activity line from `log_data`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LogRecord {
    #[serde(rename = "userId", deserialize_with = "lenient_string")]
    pub user_id: Option<String>,
    #[serde(rename = "firstName")]
    pub first_name: Option<String>,
    #[serde(rename = "lastName")]
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub level: Option<String>,
    pub page: Option<String>,
    /// Event time in epoch milliseconds.
    pub ts: Option<i64>,
    pub song: Option<String>,
    pub artist: Option<String>,
    pub length: Option<f64>,
    #[serde(rename = "sessionId")]
    pub session_id: Option<i64>,
    pub location: Option<String>,
    #[serde(rename = "userAgent")]
    pub user_agent: Option<String>,
}

impl LogRecord {
    pub fn is_song_play(&self) -> bool {
        self.page.as_deref() == Some(NEXT_SONG_PAGE)
    }
}

/// Accepts numbers, numeric strings, null and garbage; garbage becomes `None`.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    })
}

/// User ids show up both as `"15"` and as `15` depending on the log producer.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}
