//! Per-kind generation settings
//!
//! A job's `parameters` bag is stored verbatim, but before a job is created it
//! is translated into typed settings. Unset keys take their defaults; a key
//! that is present with an unusable value is rejected.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::domain::job::JobKind;

pub const DEFAULT_TEMPLATE: u8 = 1;
pub const MAX_TEMPLATE: u8 = 20;
pub const DEFAULT_VOICE_A: &str = "Kore";
pub const DEFAULT_VOICE_B: &str = "Puck";

const MAX_VOICE_LEN: usize = 64;

/// Validation failure for a single settings key
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid setting '{key}': {reason}")]
pub struct SettingsError {
    pub key: String,
    pub reason: String,
}

impl SettingsError {
    fn new(key: &str, reason: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// Requested length of the artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthTier {
    Short,
    #[default]
    Medium,
    Long,
}

impl LengthTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            LengthTier::Short => "short",
            LengthTier::Medium => "medium",
            LengthTier::Long => "long",
        }
    }

    /// Approximate slide count of a deck generated at this tier
    pub fn slide_bucket(&self) -> &'static str {
        match self {
            LengthTier::Short => "5-8",
            LengthTier::Medium => "10-15",
            LengthTier::Long => "20-30",
        }
    }

    /// Approximate running time of a podcast generated at this tier
    pub fn duration_bucket(&self) -> &'static str {
        match self {
            LengthTier::Short => "3-5 min",
            LengthTier::Medium => "8-12 min",
            LengthTier::Long => "15-20 min",
        }
    }
}

impl FromStr for LengthTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "short" => Ok(LengthTier::Short),
            "medium" => Ok(LengthTier::Medium),
            "long" => Ok(LengthTier::Long),
            other => Err(format!("expected short, medium or long, got '{}'", other)),
        }
    }
}

impl fmt::Display for LengthTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Podcast audio quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioQuality {
    High,
    #[default]
    Low,
}

impl AudioQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioQuality::High => "high",
            AudioQuality::Low => "low",
        }
    }
}

impl FromStr for AudioQuality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(AudioQuality::High),
            "low" => Ok(AudioQuality::Low),
            other => Err(format!("expected high or low, got '{}'", other)),
        }
    }
}

impl fmt::Display for AudioQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideDeckSettings {
    pub template: u8,
    pub length: LengthTier,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodcastSettings {
    pub voice_a: String,
    pub voice_b: String,
    pub quality: AudioQuality,
    /// Only drives the reported duration bucket; the generator does not take it
    pub length: LengthTier,
}

/// Typed settings for one job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationSettings {
    SlideDeck(SlideDeckSettings),
    Podcast(PodcastSettings),
}

impl GenerationSettings {
    /// Translates a raw parameters bag for the given kind
    pub fn from_parameters(
        kind: JobKind,
        parameters: &HashMap<String, Value>,
    ) -> Result<Self, SettingsError> {
        let length = match lookup(parameters, &["length"]) {
            Some(raw) => raw
                .parse::<LengthTier>()
                .map_err(|e| SettingsError::new("length", e))?,
            None => LengthTier::default(),
        };

        match kind {
            JobKind::SlideDeck => {
                let template = match parameters.get("template") {
                    Some(value) => parse_template(value)?,
                    None => DEFAULT_TEMPLATE,
                };
                Ok(GenerationSettings::SlideDeck(SlideDeckSettings {
                    template,
                    length,
                }))
            }
            JobKind::Podcast => {
                let voice_a = voice(parameters, &["voiceA", "AlexVoice"], DEFAULT_VOICE_A)?;
                let voice_b = voice(parameters, &["voiceB", "AveryVoice"], DEFAULT_VOICE_B)?;
                let quality = match lookup(parameters, &["quality"]) {
                    Some(raw) => raw
                        .parse::<AudioQuality>()
                        .map_err(|e| SettingsError::new("quality", e))?,
                    None => AudioQuality::default(),
                };
                Ok(GenerationSettings::Podcast(PodcastSettings {
                    voice_a,
                    voice_b,
                    quality,
                    length,
                }))
            }
        }
    }

    pub fn kind(&self) -> JobKind {
        match self {
            GenerationSettings::SlideDeck(_) => JobKind::SlideDeck,
            GenerationSettings::Podcast(_) => JobKind::Podcast,
        }
    }

    /// Generator arguments that follow the source and destination paths
    pub fn generator_args(&self) -> Vec<String> {
        match self {
            GenerationSettings::SlideDeck(s) => {
                vec![s.template.to_string(), s.length.as_str().to_string()]
            }
            GenerationSettings::Podcast(s) => vec![
                s.voice_a.clone(),
                s.voice_b.clone(),
                s.quality.as_str().to_string(),
            ],
        }
    }

    /// Podcast duration bucket, if this is a podcast
    pub fn duration_bucket(&self) -> Option<String> {
        match self {
            GenerationSettings::Podcast(s) => Some(s.length.duration_bucket().to_string()),
            GenerationSettings::SlideDeck(_) => None,
        }
    }

    /// Slide count bucket, if this is a slide deck
    pub fn slide_bucket(&self) -> Option<String> {
        match self {
            GenerationSettings::SlideDeck(s) => Some(s.length.slide_bucket().to_string()),
            GenerationSettings::Podcast(_) => None,
        }
    }
}

/// Parses the `settings` form field.
///
/// Anything that is not a JSON object (including malformed JSON) yields an
/// empty bag instead of an error.
pub fn parse_parameters(raw: Option<&str>) -> HashMap<String, Value> {
    match raw.map(str::trim) {
        Some(text) if !text.is_empty() => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => map.into_iter().collect(),
            _ => HashMap::new(),
        },
        _ => HashMap::new(),
    }
}

/// Returns the first non-empty string (or number) value among `keys`
fn lookup(parameters: &HashMap<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match parameters.get(*key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn parse_template(value: &Value) -> Result<u8, SettingsError> {
    let parsed = match value {
        Value::Null => return Ok(DEFAULT_TEMPLATE),
        Value::String(s) if s.trim().is_empty() => return Ok(DEFAULT_TEMPLATE),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    };

    match parsed {
        Some(n) if (1..=MAX_TEMPLATE as u64).contains(&n) => Ok(n as u8),
        _ => Err(SettingsError::new(
            "template",
            format!("expected an integer between 1 and {}", MAX_TEMPLATE),
        )),
    }
}

fn voice(
    parameters: &HashMap<String, Value>,
    keys: &[&str],
    default: &str,
) -> Result<String, SettingsError> {
    let Some(name) = lookup(parameters, keys) else {
        return Ok(default.to_string());
    };

    let valid = name.len() <= MAX_VOICE_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if valid {
        Ok(name)
    } else {
        Err(SettingsError::new(
            keys[0],
            "voice names are letters, digits, '-' or '_' (at most 64 chars)",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bag(value: Value) -> HashMap<String, Value> {
        match value {
            Value::Object(map) => map.into_iter().collect(),
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_slide_deck_defaults() {
        let settings = GenerationSettings::from_parameters(JobKind::SlideDeck, &HashMap::new())
            .unwrap();
        assert_eq!(settings.generator_args(), vec!["1", "medium"]);
        assert_eq!(settings.slide_bucket().as_deref(), Some("10-15"));
        assert_eq!(settings.duration_bucket(), None);
    }

    #[test]
    fn test_slide_deck_template_and_length() {
        let params = bag(json!({ "template": "7", "length": "short" }));
        let settings = GenerationSettings::from_parameters(JobKind::SlideDeck, &params).unwrap();
        assert_eq!(settings.generator_args(), vec!["7", "short"]);
        assert_eq!(settings.slide_bucket().as_deref(), Some("5-8"));

        let params = bag(json!({ "template": 20, "length": "LONG" }));
        let settings = GenerationSettings::from_parameters(JobKind::SlideDeck, &params).unwrap();
        assert_eq!(settings.generator_args(), vec!["20", "long"]);
    }

    #[test]
    fn test_slide_deck_rejects_out_of_range_template() {
        for bad in [json!(0), json!(21), json!("abc"), json!(-3), json!([1])] {
            let params = bag(json!({ "template": bad }));
            let err = GenerationSettings::from_parameters(JobKind::SlideDeck, &params)
                .unwrap_err();
            assert_eq!(err.key, "template");
        }
    }

    #[test]
    fn test_empty_values_fall_back_to_defaults() {
        let params = bag(json!({ "template": "", "length": "", "quality": null }));
        let deck = GenerationSettings::from_parameters(JobKind::SlideDeck, &params).unwrap();
        assert_eq!(deck.generator_args(), vec!["1", "medium"]);
    }

    #[test]
    fn test_podcast_defaults() {
        let settings =
            GenerationSettings::from_parameters(JobKind::Podcast, &HashMap::new()).unwrap();
        assert_eq!(settings.generator_args(), vec!["Kore", "Puck", "low"]);
        assert_eq!(settings.duration_bucket().as_deref(), Some("8-12 min"));
        assert_eq!(settings.slide_bucket(), None);
    }

    #[test]
    fn test_podcast_accepts_legacy_voice_keys() {
        let params = bag(json!({ "AlexVoice": "Charon", "AveryVoice": "Aoede", "quality": "high" }));
        let settings = GenerationSettings::from_parameters(JobKind::Podcast, &params).unwrap();
        assert_eq!(settings.generator_args(), vec!["Charon", "Aoede", "high"]);
    }

    #[test]
    fn test_podcast_rejects_bad_values() {
        let params = bag(json!({ "quality": "ultra" }));
        let err = GenerationSettings::from_parameters(JobKind::Podcast, &params).unwrap_err();
        assert_eq!(err.key, "quality");

        let params = bag(json!({ "voiceA": "Kore; rm -rf /" }));
        let err = GenerationSettings::from_parameters(JobKind::Podcast, &params).unwrap_err();
        assert_eq!(err.key, "voiceA");

        let params = bag(json!({ "length": "epic" }));
        let err = GenerationSettings::from_parameters(JobKind::Podcast, &params).unwrap_err();
        assert_eq!(err.key, "length");
    }

    #[test]
    fn test_parse_parameters_tolerates_garbage() {
        assert!(parse_parameters(None).is_empty());
        assert!(parse_parameters(Some("")).is_empty());
        assert!(parse_parameters(Some("{not json")).is_empty());
        assert!(parse_parameters(Some("[1, 2]")).is_empty());
        assert!(parse_parameters(Some("\"text\"")).is_empty());

        let params = parse_parameters(Some(r#"{"voiceA":"Kore","quality":"low"}"#));
        assert_eq!(params.get("voiceA"), Some(&json!("Kore")));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_kind_mismatch_keys_are_ignored() {
        // Podcast keys on a slide deck are stored but have no effect
        let params = bag(json!({ "voiceA": "!!!", "template": "3" }));
        let settings = GenerationSettings::from_parameters(JobKind::SlideDeck, &params).unwrap();
        assert_eq!(settings.kind(), JobKind::SlideDeck);
        assert_eq!(settings.generator_args(), vec!["3", "medium"]);
    }
}
