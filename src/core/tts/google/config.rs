//! Google voice naming and request options.

use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Voice names
// =============================================================================

/// A Google voice name split into its parts.
///
/// Names follow `language-COUNTRY-audio_type-name`, where the trailing name
/// may itself contain dashes: `en-US-Chirp3-HD-Charon` has audio type
/// `Chirp3` and name `HD-Charon`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoiceName {
    pub language: String,
    pub country: String,
    pub audio_type: String,
    pub name: String,
}

impl VoiceName {
    /// Split a full voice name. Returns `None` when it has fewer than four parts.
    pub fn parse(full_name: &str) -> Option<Self> {
        let mut parts = full_name.splitn(4, '-');
        let language = parts.next().filter(|p| !p.is_empty())?;
        let country = parts.next().filter(|p| !p.is_empty())?;
        let audio_type = parts.next().filter(|p| !p.is_empty())?;
        let name = parts.next().filter(|p| !p.is_empty())?;
        Some(Self {
            language: language.to_string(),
            country: country.to_string(),
            audio_type: audio_type.to_string(),
            name: name.to_string(),
        })
    }

    /// The `language-COUNTRY` locale the voice belongs to.
    pub fn locale(&self) -> String {
        format!("{}-{}", self.language, self.country)
    }
}

impl fmt::Display for VoiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}",
            self.language, self.country, self.audio_type, self.name
        )
    }
}

// =============================================================================
// Audio options
// =============================================================================

/// Output encoding requested from the synthesize endpoint. Only MP3 is
/// served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoogleAudioEncoding {
    #[default]
    Mp3,
}

/// SSML gender hint sent with each request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SsmlGender {
    #[default]
    Neutral,
    Male,
    Female,
}
