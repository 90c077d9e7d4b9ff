use async_trait::async_trait;
use serde_json::Value;

use super::AnalysisKind;
use crate::error::AppError;
use crate::openai::{strip_code_fences, ChatMessage, OpenAiClient};

const VISION_MAX_TOKENS: u32 = 1000;

const ALGAE_SYSTEM_PROMPT: &str = "You are a planted tank expert with a PhD in aquatic plants. Carefully analyze the aquarium image, identify the algae species, and provide a precise 2-week action plan. Be extremely specific: describe physical traits, causes, and unique identifiers. Maintain high confidence before concluding. Return a structured JSON response.";

const FISH_SYSTEM_PROMPT: &str = "You are a fish pathology expert with a PhD in aquatic veterinary medicine. Carefully analyze the image of the fish, identify any visible diseases or health issues, and provide a precise treatment plan. Be extremely specific: describe visible symptoms, likely causes, and diagnostic details. Maintain high confidence before concluding. Return a structured JSON response.";

const ALGAE_USER_PROMPT: &str = r#"Please analyze this aquarium image and identify the algae type. Return the information in this JSON format: { "algae_type": { "common_name": "string", "scientific_name": "string" }, "confidence": number (0-100), "description": "detailed physical traits (color, texture, growth)", "causes": "tank conditions like light, nutrients, CO2", "identification_details": "how the algae was visually identified", "treatment_plan": ["step1", "step2", ...] }"#;

const FISH_USER_PROMPT: &str = r#"Please analyze this fish image and identify any visible health issues or diseases. Return the information in this JSON format: { "disease": { "common_name": "string", "scientific_name": "string" }, "confidence": number (0-100), "symptoms": "visible symptoms in the image", "causes": "likely causes of the condition", "diagnosis_details": "how the condition was visually identified", "treatment_plan": ["step1", "step2", ...] }"#;

impl AnalysisKind {
    pub fn system_prompt(self) -> &'static str {
        match self {
            AnalysisKind::Algae => ALGAE_SYSTEM_PROMPT,
            AnalysisKind::FishHealth => FISH_SYSTEM_PROMPT,
        }
    }

    pub fn user_prompt(self) -> &'static str {
        match self {
            AnalysisKind::Algae => ALGAE_USER_PROMPT,
            AnalysisKind::FishHealth => FISH_USER_PROMPT,
        }
    }
}

/// Hosted vision model that turns an aquarium photo into unvalidated JSON.
#[async_trait]
pub trait VisionModel: Send + Sync {
    async fn analyze_image(&self, kind: AnalysisKind, mime: &str, image_base64: &str) -> Result<Value, AppError>;
}

#[async_trait]
impl VisionModel for OpenAiClient {
    async fn analyze_image(&self, kind: AnalysisKind, mime: &str, image_base64: &str) -> Result<Value, AppError> {
        let messages = [
            ChatMessage::system(kind.system_prompt()),
            ChatMessage::user_with_image(kind.user_prompt(), format!("data:{};base64,{}", mime, image_base64)),
        ];
        let content = self.chat(&self.vision_model, &messages, VISION_MAX_TOKENS, true).await?;
        parse_model_json(&content)
    }
}

/// Parses the model's JSON answer, tolerating code fences and leading chatter.
pub fn parse_model_json(content: &str) -> Result<Value, AppError> {
    let json_str = strip_code_fences(content);
    match serde_json::from_str::<Value>(json_str) {
        Ok(value) => Ok(value),
        Err(e) => {
            tracing::warn!("Model response is not plain JSON ({}), trying the outermost object", e);
            match (json_str.find('{'), json_str.rfind('}')) {
                (Some(start), Some(end)) if start < end => Ok(serde_json::from_str(&json_str[start..=end])?),
                _ => Err(AppError::ModelError(format!("model response is not JSON: {}", e))),
            }
        }
    }
}
