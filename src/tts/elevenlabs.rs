use super::{TtsError, TtsOptions, Voice};
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io/v1";

#[derive(Debug, Clone)]
pub struct ElevenLabsConfig {
    pub api_key: String,
    pub base_url: String,
}

#[derive(Serialize)]
struct SynthesisRequest {
    text: String,
    model_id: String,
    voice_settings: VoiceSettings,
    output_format: String,
}

#[derive(Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

#[derive(Deserialize)]
struct VoicesResponse {
    voices: Vec<Voice>,
}

pub async fn get_voices(config: &ElevenLabsConfig) -> Result<Vec<Voice>, TtsError> {
    let client = Client::new();
    let resp = client
        .get(format!("{}/voices", config.base_url))
        .header("xi-api-key", &config.api_key)
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let text = resp.text().await.unwrap_or_default();
        return Err(TtsError::Api {
            status,
            message: text,
        });
    }

    let data: VoicesResponse = resp.json().await?;
    Ok(data.voices)
}

/// Synthesizes `text` with the given voice and returns the raw audio
/// payload.
pub async fn synthesize(
    config: &ElevenLabsConfig,
    text: &str,
    voice_id: &str,
    options: &TtsOptions,
) -> Result<Vec<u8>, TtsError> {
    let client = Client::new();
    let body = SynthesisRequest {
        text: text.to_string(),
        model_id: options.model_id.clone(),
        voice_settings: VoiceSettings {
            stability: options.stability,
            similarity_boost: options.similarity_boost,
        },
        output_format: options.output_format.clone(),
    };

    let resp = client
        .post(format!("{}/text-to-speech/{}", config.base_url, voice_id))
        .header("xi-api-key", &config.api_key)
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let text = resp.text().await.unwrap_or_default();
        return Err(TtsError::Api {
            status,
            message: text,
        });
    }

    Ok(resp.bytes().await?.to_vec())
}
