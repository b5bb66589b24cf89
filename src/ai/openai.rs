use super::{AiError, ChatMessage};
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const MODEL: &str = "gpt-4o-mini";

/// Rules prepended to every system prompt so replies can be spliced
/// straight into the story text.
const BACKGROUND_RULES: &str = "IMPORTANT RULES:
- Do not add quotation marks around your responses
- Give direct answers to what is being asked
- No need for any next questions at the end or beginning
- Keep responses concise and focused
- Maintain consistent tone and style
- Avoid unnecessary explanations or meta-commentary";

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
}

#[derive(Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

async fn complete(
    config: &OpenAiConfig,
    system: String,
    user: String,
    max_tokens: u32,
    temperature: f32,
) -> Result<String, AiError> {
    let client = Client::new();
    let body = CompletionRequest {
        model: MODEL.to_string(),
        messages: vec![
            ChatMessage {
                role: "system".to_string(),
                content: system,
            },
            ChatMessage {
                role: "user".to_string(),
                content: user,
            },
        ],
        max_tokens,
        temperature,
    };

    let resp = client
        .post(format!("{}/chat/completions", config.base_url))
        .header("Content-Type", "application/json")
        .header("Authorization", format!("Bearer {}", config.api_key))
        .json(&body)
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let text = resp.text().await.unwrap_or_default();
        return Err(AiError::Api {
            status,
            message: text,
        });
    }

    let data: CompletionResponse = resp.json().await?;
    data.choices
        .first()
        .and_then(|c| c.message.content.clone())
        .ok_or_else(|| AiError::Parse("completion response had no content".to_string()))
}

/// Generates a complete story from a prompt, for the empty-editor flow.
pub async fn generate_story(
    config: &OpenAiConfig,
    prompt: &str,
    story_context: Option<&str>,
) -> Result<String, AiError> {
    let system = format!(
        "You are a creative storyteller. Generate engaging, well-structured stories based on user prompts.\n\n{BACKGROUND_RULES}\n\nYour task is to create a complete story based on the provided prompt and context."
    );
    let context_block = match story_context {
        Some(ctx) if !ctx.is_empty() => format!("Story Context and Guidelines:\n{ctx}\n\n"),
        _ => String::new(),
    };
    let user = format!("{context_block}Story Prompt:\n{prompt}");
    complete(config, system, user, 2000, 0.7).await
}

/// Asks for a replacement for the selected span only. The model sees
/// the full story for coherence but must return just the substitute
/// text for `[start, end)`.
pub async fn edit_story(
    config: &OpenAiConfig,
    full_text: &str,
    selected_text: &str,
    start: usize,
    end: usize,
    instruction: &str,
    contextual_prompt: Option<&str>,
) -> Result<String, AiError> {
    let system = format!(
        "You are an expert story editor. You will receive:\n1. The full story for context\n2. A specific text selection to modify\n3. Instructions for the modification\n4. Optional contextual guidelines\n\nYour task is to return ONLY the replacement text for the selected portion. The replacement should:\n- Maintain narrative coherence with the full story\n- Follow the editing instructions precisely\n- Respect the contextual guidelines if provided\n- Keep appropriate length and style consistency\n\n{BACKGROUND_RULES}"
    );
    let guidelines = match contextual_prompt {
        Some(ctx) if !ctx.is_empty() => format!("\nContextual guidelines: {ctx}\n"),
        _ => String::new(),
    };
    let user = format!(
        "Full story context:\n\"{full_text}\"\n\nSelected text to replace (characters {start}-{end}):\n\"{selected_text}\"\n\nEdit instruction: {instruction}\n{guidelines}\nReturn only the replacement text for the selected portion."
    );
    complete(config, system, user, 1000, 0.5).await
}

/// Generates new text meant to be inserted at a point in the existing
/// content (the slash-command flow).
pub async fn generate_with_context(
    config: &OpenAiConfig,
    prompt: &str,
    existing_content: &str,
    contextual_prompt: Option<&str>,
) -> Result<String, AiError> {
    let system = format!(
        "You are a creative content generator. You will receive:\n1. A prompt describing what content to generate\n2. Existing content for context\n3. Optional contextual guidelines\n\nYour task is to generate content that fits naturally into the existing context.\n\n{BACKGROUND_RULES}"
    );
    let guidelines = match contextual_prompt {
        Some(ctx) if !ctx.is_empty() => format!("Contextual Guidelines:\n{ctx}\n\n"),
        _ => String::new(),
    };
    let user = format!(
        "{guidelines}Prompt: {prompt}\n\nExisting content for context:\n\"{existing_content}\"\n\nGenerate content that fits naturally into this context."
    );
    complete(config, system, user, 1500, 0.6).await
}
