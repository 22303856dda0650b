use crate::timestamp::{normalize, NormalizedInstant};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Value of `bombaLigada` that means the pump is running.
pub const PUMP_ON_FLAG: &str = "Sim";

/// Reading identifier as sent by the endpoint.
///
/// Integers stay numeric. Any other non-null value is kept as text, and an
/// absent or null id is `Missing`, so one odd id never rejects the payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum ReadingId {
    Number(i64),
    Text(String),
    #[default]
    Missing,
}

impl<'de> Deserialize<'de> for ReadingId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Null => ReadingId::Missing,
            Value::Number(n) => match n.as_i64() {
                Some(n) => ReadingId::Number(n),
                None => ReadingId::Text(n.to_string()),
            },
            Value::String(s) => ReadingId::Text(s),
            other => ReadingId::Text(other.to_string()),
        })
    }
}

impl fmt::Display for ReadingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadingId::Number(n) => fmt::Display::fmt(n, f),
            ReadingId::Text(s) => f.pad(s),
            ReadingId::Missing => f.pad("--"),
        }
    }
}

/// Water-monitoring sensor reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    #[serde(default)]
    pub id: ReadingId,
    #[serde(deserialize_with = "number_or_numeric_text")]
    pub leitura: f64,
    #[serde(default, deserialize_with = "loose_text")]
    pub status: String,
    #[serde(rename = "bombaLigada", default, deserialize_with = "loose_text")]
    pub bomba_ligada: String,
    #[serde(default, deserialize_with = "loose_optional_text")]
    pub timestamp: Option<String>,
}

impl Reading {
    /// Normalized instant, recomputed from the raw timestamp on every call.
    pub fn instant(&self) -> NormalizedInstant {
        normalize(self.timestamp.as_deref())
    }

    pub fn pump_on(&self) -> bool {
        self.bomba_ligada == PUMP_ON_FLAG
    }
}

fn number_or_numeric_text<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    let value = match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => n,
        NumberOrText::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("leitura is not numeric: {:?}", s)))?,
    };

    if !value.is_finite() {
        return Err(de::Error::custom("leitura must be finite"));
    }
    Ok(value)
}

// Strings pass through, null becomes empty, anything else is kept as its JSON text.
fn loose_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn loose_optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Null => None,
        other => Some(other.to_string()),
    })
}
