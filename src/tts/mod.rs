pub mod elevenlabs;

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Voice {
    pub voice_id: String,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TtsOptions {
    pub model_id: String,
    pub stability: f32,
    pub similarity_boost: f32,
    pub output_format: String,
}

impl Default for TtsOptions {
    fn default() -> Self {
        Self {
            model_id: "eleven_monolingual_v1".to_string(),
            stability: 0.5,
            similarity_boost: 0.5,
            output_format: "mp3_22050_32".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TtsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
}

impl Serialize for TtsError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Rough playback duration in seconds, derived from the payload size
/// and the bitrate encoded in the output format name (e.g.
/// "mp3_22050_32" is 32 kbit/s). Formats without a parseable bitrate
/// report 0.
pub fn estimate_duration(payload_len: usize, output_format: &str) -> f64 {
    let kbps: Option<u32> = output_format
        .rsplit('_')
        .next()
        .and_then(|s| s.parse().ok());
    match kbps {
        Some(kbps) if kbps > 0 => (payload_len as f64 * 8.0) / (kbps as f64 * 1000.0),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_follows_format_bitrate() {
        // 32 kbit/s: 4000 bytes per second of audio.
        assert_eq!(estimate_duration(4000, "mp3_22050_32"), 1.0);
        assert_eq!(estimate_duration(8000, "mp3_44100_64"), 1.0);
        assert_eq!(estimate_duration(0, "mp3_22050_32"), 0.0);
    }

    #[test]
    fn unparseable_format_reports_zero() {
        assert_eq!(estimate_duration(4000, "pcm"), 0.0);
        assert_eq!(estimate_duration(4000, ""), 0.0);
    }
}
