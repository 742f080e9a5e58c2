use axum::{Json, extract::State, http::StatusCode};
use std::sync::Arc;
use base64::Engine;
use uuid::Uuid;
use chrono::Utc;

use crate::gemini::StylistProvider;
use crate::models::{
    ErrorResponse, OptionsResponse, RecommendationRequest, RecommendationResponse,
};

#[derive(Clone)]
pub struct AppState {
    pub stylist: Arc<dyn StylistProvider>,
}

pub const OCCASION_MIN_LENGTH: usize = 5;
pub const OCCASION_MAX_LENGTH: usize = 300;
pub const PREFERENCES_MAX_LENGTH: usize = 200;

pub fn suggested_occasions() -> Vec<&'static str> {
    vec![
        "Casual Coffee Date",
        "Summer Wedding Guest",
        "Tech Job Interview",
        "Weekend Brunch",
        "Gallery Opening",
        "Beach Vacation",
    ]
}

pub fn gender_options() -> Vec<&'static str> {
    vec!["Female", "Male", "Non-Binary"]
}

fn validate_request(req: &RecommendationRequest) -> Vec<String> {
    let mut errors = Vec::new();

    let occasion = req.occasion.trim();
    if occasion.is_empty() {
        errors.push("Please describe the occasion.".to_string());
    } else if occasion.chars().count() < OCCASION_MIN_LENGTH {
        errors.push(format!("Occasion must be at least {} characters.", OCCASION_MIN_LENGTH));
    } else if req.occasion.chars().count() > OCCASION_MAX_LENGTH {
        errors.push(format!("Occasion must be at most {} characters.", OCCASION_MAX_LENGTH));
    }

    if req.gender.trim().is_empty() {
        errors.push("Please select a style focus.".to_string());
    }

    if let Some(preferences) = req.preferences.as_deref() {
        if preferences.chars().count() > PREFERENCES_MAX_LENGTH {
            errors.push(format!("Preferences must be at most {} characters.", PREFERENCES_MAX_LENGTH));
        } else if !preferences.is_empty() && !preferences.chars().any(|c| c.is_alphanumeric()) {
            errors.push("Preferences must include valid text.".to_string());
        }
    }

    if let Some(image) = &req.image {
        if image.data.trim().is_empty() || image.mime_type.trim().is_empty() {
            errors.push("Image data and mime type must both be provided.".to_string());
        } else if !image.mime_type.starts_with("image/") {
            errors.push("Only image attachments are supported.".to_string());
        } else if base64::engine::general_purpose::STANDARD.decode(image.data.trim()).is_err() {
            errors.push("Image data must be valid base64.".to_string());
        }
    }

    errors
}

pub async fn recommend_outfit(
    State(state): State<AppState>,
    Json(body): Json<RecommendationRequest>,
) -> Result<Json<RecommendationResponse>, (StatusCode, Json<ErrorResponse>)> {
    let errors = validate_request(&body);
    if !errors.is_empty() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse { error: errors.join(" ") }),
        ));
    }

    tracing::info!(
        "🎯 Styling request: occasion=\"{}\" gender=\"{}\" image={}",
        body.occasion,
        body.gender,
        body.image.is_some()
    );

    match state.stylist.get_outfit_recommendation(&body).await {
        Ok(recommendation) => Ok(Json(RecommendationResponse {
            id: Uuid::new_v4(),
            occasion: body.occasion,
            gender: body.gender,
            recommendation,
            generated_at: Utc::now(),
        })),
        Err(e) => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse { error: e.to_string() }),
        )),
    }
}

pub async fn get_stylist_options() -> Json<OptionsResponse> {
    Json(OptionsResponse {
        suggested_occasions: suggested_occasions().into_iter().map(String::from).collect(),
        gender_options: gender_options().into_iter().map(String::from).collect(),
        occasion_min_length: OCCASION_MIN_LENGTH,
        occasion_max_length: OCCASION_MAX_LENGTH,
        preferences_max_length: PREFERENCES_MAX_LENGTH,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::RecommendationUnavailable;
    use crate::models::{ImageAttachment, OutfitSuggestion, PrimaryOutfit, StylistResponse};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    struct MockStylist {
        response: Option<StylistResponse>,
    }

    #[async_trait]
    impl StylistProvider for MockStylist {
        async fn get_outfit_recommendation(
            &self,
            _request: &RecommendationRequest,
        ) -> Result<StylistResponse, RecommendationUnavailable> {
            self.response.clone().ok_or(RecommendationUnavailable)
        }
    }

    fn sample_request() -> RecommendationRequest {
        RecommendationRequest {
            occasion: "Beach Wedding".to_string(),
            gender: "Woman".to_string(),
            preferences: Some(
                "loves pastel colors, minimal style, mid budget, dislikes sequins".to_string(),
            ),
            image: None,
        }
    }

    fn sample_response() -> StylistResponse {
        StylistResponse {
            primary_outfit: PrimaryOutfit {
                title: "Coastal Elegance".to_string(),
                top: "Pastel lavender slip blouse".to_string(),
                bottom: "Flowing ivory maxi skirt".to_string(),
                footwear: "Nude block-heel sandals".to_string(),
                accessories: vec!["Pearl drop earrings".to_string()],
                reasoning: "Pastel palette suits both the profile and a beach ceremony."
                    .to_string(),
            },
            additional_suggestions: vec![OutfitSuggestion {
                label: "The Comfort Choice".to_string(),
                outfit_summary: "Soft blush jumpsuit with espadrilles.".to_string(),
            }],
            styling_notes: "Skip anything sequined.".to_string(),
        }
    }

    #[test]
    fn valid_request_passes_validation() {
        assert!(validate_request(&sample_request()).is_empty());
    }

    #[test]
    fn short_occasion_is_rejected() {
        let mut req = sample_request();
        req.occasion = "Gala".to_string();
        let errors = validate_request(&req);
        assert_eq!(errors, vec!["Occasion must be at least 5 characters.".to_string()]);
    }

    #[test]
    fn oversized_occasion_is_rejected() {
        let mut req = sample_request();
        req.occasion = "x".repeat(OCCASION_MAX_LENGTH + 1);
        assert_eq!(validate_request(&req).len(), 1);
    }

    #[test]
    fn blank_gender_is_rejected() {
        let mut req = sample_request();
        req.gender = "  ".to_string();
        let errors = validate_request(&req);
        assert_eq!(errors, vec!["Please select a style focus.".to_string()]);
    }

    #[test]
    fn oversized_preferences_are_rejected() {
        let mut req = sample_request();
        req.preferences = Some("y".repeat(PREFERENCES_MAX_LENGTH + 1));
        assert_eq!(validate_request(&req).len(), 1);
    }

    #[test]
    fn punctuation_only_preferences_are_rejected() {
        let mut req = sample_request();
        req.preferences = Some("!!! ???".to_string());
        let errors = validate_request(&req);
        assert_eq!(errors, vec!["Preferences must include valid text.".to_string()]);
    }

    #[test]
    fn invalid_base64_image_is_rejected() {
        let mut req = sample_request();
        req.image = Some(ImageAttachment {
            data: "not base64 %%".to_string(),
            mime_type: "image/png".to_string(),
        });
        let errors = validate_request(&req);
        assert_eq!(errors, vec!["Image data must be valid base64.".to_string()]);
    }

    #[test]
    fn non_image_mime_type_is_rejected() {
        let mut req = sample_request();
        req.image = Some(ImageAttachment {
            data: "aGVsbG8=".to_string(),
            mime_type: "application/pdf".to_string(),
        });
        let errors = validate_request(&req);
        assert_eq!(errors, vec!["Only image attachments are supported.".to_string()]);
    }

    #[tokio::test]
    async fn recommendation_is_passed_through_unchanged() {
        let state = AppState {
            stylist: Arc::new(MockStylist { response: Some(sample_response()) }),
        };
        let result = recommend_outfit(State(state), Json(sample_request()))
            .await
            .expect("expected a recommendation");
        assert_eq!(result.0.recommendation, sample_response());
        assert_eq!(result.0.occasion, "Beach Wedding");
        assert_eq!(result.0.gender, "Woman");
    }

    #[tokio::test]
    async fn provider_failure_yields_uniform_message() {
        let state = AppState {
            stylist: Arc::new(MockStylist { response: None }),
        };
        let (status, body) = recommend_outfit(State(state), Json(sample_request()))
            .await
            .expect_err("expected failure");
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body.0.error,
            "Unable to generate outfit recommendations at this time. Please try again."
        );
    }

    #[tokio::test]
    async fn validation_failure_never_reaches_the_provider() {
        let state = AppState {
            stylist: Arc::new(MockStylist { response: None }),
        };
        let mut req = sample_request();
        req.occasion = String::new();
        let (status, body) = recommend_outfit(State(state), Json(req))
            .await
            .expect_err("expected validation failure");
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.0.error, "Please describe the occasion.");
    }

    #[tokio::test]
    async fn options_expose_front_end_limits() {
        let options = get_stylist_options().await;
        assert_eq!(options.0.occasion_max_length, 300);
        assert_eq!(options.0.preferences_max_length, 200);
        assert!(options.0.gender_options.contains(&"Non-Binary".to_string()));
        assert!(options.0.suggested_occasions.contains(&"Gallery Opening".to_string()));
    }
}
