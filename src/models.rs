use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RecommendationRequest {
    pub occasion: String,
    pub gender: String,
    #[serde(default)]
    pub preferences: Option<String>, // free-form style profile, e.g. "loves pastel colors, mid budget"
    #[serde(default)]
    pub image: Option<ImageAttachment>,
}

/// Inline attachment: base64-encoded bytes plus their MIME type.
/// Both fields are required together; there is no image without a type.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ImageAttachment {
    pub data: String,
    pub mime_type: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PrimaryOutfit {
    pub title: String,
    pub top: String,
    pub bottom: String,
    pub footwear: String,
    pub accessories: Vec<String>,
    pub reasoning: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OutfitSuggestion {
    pub label: String,
    pub outfit_summary: String,
}

/// Decoded model output. `additional_suggestions` is expected to hold 3
/// entries by prompt convention; the count is not enforced structurally.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StylistResponse {
    pub primary_outfit: PrimaryOutfit,
    pub additional_suggestions: Vec<OutfitSuggestion>,
    pub styling_notes: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RecommendationResponse {
    pub id: Uuid,
    pub occasion: String,
    pub gender: String,
    pub recommendation: StylistResponse,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OptionsResponse {
    pub suggested_occasions: Vec<String>,
    pub gender_options: Vec<String>,
    pub occasion_min_length: usize,
    pub occasion_max_length: usize,
    pub preferences_max_length: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn request_defaults_optional_fields_to_none() {
        let req: RecommendationRequest =
            serde_json::from_str(r#"{"occasion":"Gallery Opening","gender":"Woman"}"#).unwrap();
        assert_eq!(req.occasion, "Gallery Opening");
        assert_eq!(req.gender, "Woman");
        assert!(req.preferences.is_none());
        assert!(req.image.is_none());
    }

    #[test]
    fn request_accepts_inline_image() {
        let req: RecommendationRequest = serde_json::from_str(
            r#"{
                "occasion": "Beach Vacation",
                "gender": "Man",
                "image": { "data": "aGVsbG8=", "mime_type": "image/png" }
            }"#,
        )
        .unwrap();
        let image = req.image.unwrap();
        assert_eq!(image.data, "aGVsbG8=");
        assert_eq!(image.mime_type, "image/png");
    }
}
