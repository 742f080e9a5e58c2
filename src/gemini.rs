use crate::models::{ImageAttachment, RecommendationRequest, StylistResponse};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{info, error};

/// Fast text/vision model; no runtime model selection.
pub const MODEL_ID: &str = "gemini-2.5-flash";

/// The one message callers ever see when a recommendation cannot be produced.
pub const UNAVAILABLE_MESSAGE: &str =
    "Unable to generate outfit recommendations at this time. Please try again.";

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("HTTP error: {0}")] Http(String),
    #[error("empty response from model")] EmptyResponse,
    #[error("malformed response: {0}")] Malformed(String),
}

/// Uniform user-facing failure. The underlying `GeminiError` is logged,
/// never surfaced.
#[derive(Debug, Error)]
#[error("{}", UNAVAILABLE_MESSAGE)]
pub struct RecommendationUnavailable;

#[async_trait]
pub trait StylistProvider: Send + Sync {
    async fn get_outfit_recommendation(
        &self,
        request: &RecommendationRequest,
    ) -> Result<StylistResponse, RecommendationUnavailable>;
}

pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

const SYSTEM_INSTRUCTION: &str = "\
You are a world-class AI Fashion Stylist.
Your goal is to recommend elegant, stylish, and appropriate outfits based on the user's event, gender identity, and optional visual input.

PERSONALIZATION RULES:
If preferences are provided, treat them as a User Style Profile. You must:
1. Prioritize: Select items matching their favorite colors, preferred styles (e.g., Minimal, Y2K, Korean), and fits (baggy, regular).
2. Budget Alignment: Respect any stated budget level (low/mid/high) by suggesting items that look the part.
3. Strict Restrictions: ABSOLUTELY AVOID any disliked items or specific restrictions mentioned.
4. Cohesion: Ensure the final look feels naturally aligned with the user's aesthetic. Do not force mismatches.

OUTPUT GUIDELINES:
- Minimal yet Powerful: Be concise. Use evocative language. Avoid filler words.
- Primary Outfit: This must be the perfect marriage of the Occasion + User Profile.
- Reasoning: Explain why this fits their specific profile and the event.
- Additional Suggestions: Provide 3 distinct variations (e.g., \"The Edgy Option\", \"The Comfort Choice\") that still respect their core dislikes.

If an image is provided:
- Analyze it deeply.
- If it's a clothing item: Make it the centerpiece.
- If it's a mood/scene: Translate that vibe into clothing textures and colors.";

fn build_user_prompt(
    occasion: &str,
    gender: &str,
    preferences: Option<&str>,
    has_image: bool,
) -> String {
    let preferences = preferences
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or("None provided");

    let mut prompt = format!(
        "Curate an outfit for a {gender}.\n\
         Occasion: \"{occasion}\".\n\
         User Style Profile / Preferences: \"{preferences}\"\n"
    );
    if has_image {
        prompt.push_str(
            "Visual Context: An image has been provided. Analyze it and integrate it into the styling.\n",
        );
    }
    prompt.push_str("\nReturn a JSON response with the best possible outfit and suggestions.");
    prompt
}

// Text first; the inline image, when present, must be the second part.
fn build_request_parts(user_prompt: &str, image: Option<&ImageAttachment>) -> Vec<Value> {
    let mut parts = vec![json!({ "text": user_prompt })];
    if let Some(image) = image {
        parts.push(json!({
            "inlineData": {
                "mimeType": image.mime_type,
                "data": image.data,
            }
        }));
    }
    parts
}

// JSON shape the model is constrained to. Requires every field of
// StylistResponse but deliberately not a suggestion count.
fn response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "primary_outfit": {
                "type": "object",
                "properties": {
                    "title": { "type": "string" },
                    "top": { "type": "string" },
                    "bottom": { "type": "string" },
                    "footwear": { "type": "string" },
                    "accessories": { "type": "array", "items": { "type": "string" } },
                    "reasoning": { "type": "string" }
                },
                "required": ["title", "top", "bottom", "footwear", "accessories", "reasoning"]
            },
            "additional_suggestions": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "label": { "type": "string" },
                        "outfit_summary": { "type": "string" }
                    },
                    "required": ["label", "outfit_summary"]
                }
            },
            "styling_notes": { "type": "string" }
        },
        "required": ["primary_outfit", "additional_suggestions", "styling_notes"]
    })
}

fn redact_api_key(text: &str, key: &str) -> String {
    if key.trim().is_empty() {
        return text.to_string();
    }
    text.replace(key, "***")
}

fn decode_stylist_response(text: &str) -> Result<StylistResponse, GeminiError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(GeminiError::EmptyResponse);
    }
    serde_json::from_str(text)
        .map_err(|e| GeminiError::Malformed(format!("invalid stylist JSON: {}", e)))
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        let base_url = std::env::var("GEMINI_API_BASE")
            .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta".to_string());
        Self {
            client: Client::new(),
            api_key,
            base_url,
        }
    }

    async fn perform_api_call(
        &self,
        request: &RecommendationRequest,
    ) -> Result<StylistResponse, GeminiError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, MODEL_ID, self.api_key
        );

        info!("🔗 Making request to: {}", redact_api_key(&url, &self.api_key));

        let user_prompt = build_user_prompt(
            &request.occasion,
            &request.gender,
            request.preferences.as_deref(),
            request.image.is_some(),
        );
        let parts = build_request_parts(&user_prompt, request.image.as_ref());
        info!(
            "📤 Styling prompt: occasion=\"{}\" gender=\"{}\" parts={}",
            request.occasion,
            request.gender,
            parts.len()
        );

        let request_body = json!({
            "systemInstruction": { "parts": [{ "text": SYSTEM_INSTRUCTION }] },
            "contents": [{ "role": "user", "parts": parts }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": response_schema()
            }
        });

        let response = self.client
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| GeminiError::Http(e.to_string()))?;

        let status = response.status();
        info!("📥 Response status: {}", status);

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!("❌ API Error response: {}", error_body);
            return Err(GeminiError::Http(format!("status={} body={}", status, error_body)));
        }

        let response_text = response.text().await
            .map_err(|e| GeminiError::Http(e.to_string()))?;

        let parsed: GeminiResponse = serde_json::from_str(&response_text)
            .map_err(|e| GeminiError::Malformed(format!("parse error: {}", e)))?;

        decode_stylist_response(extract_first_text(&parsed).unwrap_or(""))
    }
}

#[async_trait]
impl StylistProvider for GeminiClient {
    async fn get_outfit_recommendation(
        &self,
        request: &RecommendationRequest,
    ) -> Result<StylistResponse, RecommendationUnavailable> {
        info!("Generating outfit recommendation with Gemini API...");
        match self.perform_api_call(request).await {
            Ok(response) => {
                info!(
                    "✅ Recommendation ready: \"{}\" ({} suggestions)",
                    response.primary_outfit.title,
                    response.additional_suggestions.len()
                );
                Ok(response)
            }
            Err(e) => {
                error!("❌ Gemini API Error: {}", e);
                Err(RecommendationUnavailable)
            }
        }
    }
}

// --- Response Parsing Helpers ---

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate { #[serde(default)] content: Content }

#[derive(Debug, Deserialize, Default)]
struct Content { #[serde(default)] parts: Vec<Part> }

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    Other(serde_json::Value),
}

fn extract_first_text(resp: &GeminiResponse) -> Option<&str> {
    for c in &resp.candidates {
        for p in &c.content.parts {
            if let Part::Text { text } = p {
                return Some(text);
            }
        }
    }
    None
}
