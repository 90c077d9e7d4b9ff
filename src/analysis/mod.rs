//! Image analysis results returned by the vision model.

pub mod vision;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

pub use vision::VisionModel;

/// Number of base64 characters of the upload kept on a record.
const IMAGE_REF_PREFIX_LEN: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    Algae,
    FishHealth,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SpeciesName {
    pub common_name: String,
    pub scientific_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AlgaeAnalysis {
    pub algae_type: SpeciesName,
    /// Model confidence, 0-100
    pub confidence: f64,
    pub description: String,
    pub causes: String,
    pub identification_details: String,
    /// Ordered treatment steps
    pub treatment_plan: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FishHealthAnalysis {
    pub disease: SpeciesName,
    /// Model confidence, 0-100
    pub confidence: f64,
    pub symptoms: String,
    pub causes: String,
    pub diagnosis_details: String,
    /// Ordered treatment steps
    pub treatment_plan: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisResult {
    Algae(AlgaeAnalysis),
    FishHealth(FishHealthAnalysis),
}

impl AnalysisResult {
    pub fn confidence(&self) -> f64 {
        match self {
            AnalysisResult::Algae(a) => a.confidence,
            AnalysisResult::FishHealth(f) => f.confidence,
        }
    }
}

impl AnalysisKind {
    /// Checks a raw model response against the expected schema for this kind,
    /// reporting every problem found.
    pub fn validate(self, value: Value) -> Result<AnalysisResult, Vec<String>> {
        let mut errors = Vec::new();

        if let Some(confidence) = value.get("confidence").and_then(Value::as_f64) {
            if !(0.0..=100.0).contains(&confidence) {
                errors.push(format!("confidence must be between 0 and 100, got {}", confidence));
            }
        }

        let parsed = match self {
            AnalysisKind::Algae => serde_json::from_value::<AlgaeAnalysis>(value).map(AnalysisResult::Algae),
            AnalysisKind::FishHealth => {
                serde_json::from_value::<FishHealthAnalysis>(value).map(AnalysisResult::FishHealth)
            }
        };

        match parsed {
            Ok(result) if errors.is_empty() => Ok(result),
            Ok(_) => Err(errors),
            Err(e) => {
                errors.insert(0, e.to_string());
                Err(errors)
            }
        }
    }
}

/// A validated analysis together with a short reference to the uploaded image.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AnalysisRecord {
    pub id: Uuid,
    pub kind: AnalysisKind,
    /// `data:` URL prefix of the upload; never the full image
    pub image_ref: String,
    pub created_at: DateTime<Utc>,
    pub result: AnalysisResult,
}

impl AnalysisRecord {
    pub fn new(kind: AnalysisKind, mime: &str, image_base64: &str, result: AnalysisResult) -> Self {
        let prefix_len = image_base64.len().min(IMAGE_REF_PREFIX_LEN);
        Self {
            id: Uuid::new_v4(),
            kind,
            image_ref: format!("data:{};base64,{}", mime, &image_base64[..prefix_len]),
            created_at: Utc::now(),
            result,
        }
    }
}

pub fn encode_image(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn algae_json(confidence: f64) -> Value {
        json!({
            "algae_type": { "common_name": "Black Beard Algae", "scientific_name": "Audouinella" },
            "confidence": confidence,
            "description": "Dark tufts on driftwood",
            "causes": "Fluctuating CO2",
            "identification_details": "Brush-like growth on leaf edges",
            "treatment_plan": ["Stabilise CO2", "Spot treat with liquid carbon"]
        })
    }

    #[test]
    fn valid_algae_response_is_accepted() {
        let result = AnalysisKind::Algae.validate(algae_json(87.5)).unwrap();
        match result {
            AnalysisResult::Algae(a) => {
                assert_eq!(a.algae_type.common_name, "Black Beard Algae");
                assert_eq!(a.treatment_plan.len(), 2);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn confidence_out_of_range_is_rejected() {
        let errors = AnalysisKind::Algae.validate(algae_json(140.0)).unwrap_err();
        assert!(errors[0].contains("confidence"));
        assert!(AnalysisKind::Algae.validate(algae_json(-1.0)).is_err());
    }

    #[test]
    fn wrong_variant_shape_is_rejected() {
        let errors = AnalysisKind::FishHealth.validate(algae_json(50.0)).unwrap_err();
        assert!(errors[0].contains("disease"));
    }

    #[test]
    fn shape_and_range_problems_are_reported_together() {
        let errors = AnalysisKind::FishHealth.validate(algae_json(140.0)).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("disease"));
        assert!(errors[1].contains("between 0 and 100"));
    }

    #[test]
    fn record_serializes_timestamp_and_id() {
        let result = AnalysisKind::Algae.validate(algae_json(55.0)).unwrap();
        let record = AnalysisRecord::new(AnalysisKind::Algae, "image/jpeg", "AAAA", result);
        let value = serde_json::to_value(&record).unwrap();

        let created_at = value["created_at"].as_str().unwrap();
        let parsed = DateTime::parse_from_rfc3339(created_at).unwrap();
        assert_eq!(parsed.with_timezone(&Utc), record.created_at);
        assert_eq!(value["id"], record.id.to_string());
        assert_eq!(value["kind"], "algae");
    }

    #[test]
    fn fish_response_is_accepted() {
        let value = json!({
            "disease": { "common_name": "Ich", "scientific_name": "Ichthyophthirius multifiliis" },
            "confidence": 92,
            "symptoms": "White spots on fins",
            "causes": "Temperature swings",
            "diagnosis_details": "Salt-grain sized cysts",
            "treatment_plan": ["Raise temperature gradually", "Dose ich medication"]
        });
        let result = AnalysisKind::FishHealth.validate(value).unwrap();
        assert_eq!(result.confidence(), 92.0);
    }

    #[test]
    fn record_keeps_only_an_image_prefix() {
        let encoded = encode_image(&vec![7u8; 600]);
        let result = AnalysisKind::Algae.validate(algae_json(10.0)).unwrap();
        let record = AnalysisRecord::new(AnalysisKind::Algae, "image/png", &encoded, result);
        assert!(record.image_ref.starts_with("data:image/png;base64,"));
        assert_eq!(record.image_ref.len(), "data:image/png;base64,".len() + 100);
    }

    #[test]
    fn result_serializes_with_kind_tag() {
        let result = AnalysisKind::Algae.validate(algae_json(10.0)).unwrap();
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["kind"], "algae");
        assert_eq!(value["algae_type"]["scientific_name"], "Audouinella");
    }
}
