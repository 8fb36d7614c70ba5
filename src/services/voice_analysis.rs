use serde::Deserialize;
use std::str::FromStr;
use strsim::jaro_winkler;

use crate::models::advisory::VoiceAnalysis;
use crate::models::report::{PollutionType, Severity};
use crate::services::ai::TextGenerator;

/// Minimum Jaro-Winkler similarity for a spoken word to count as a keyword.
/// Tolerates small speech-to-text misspellings ("smok", "garbge").
const KEYWORD_MATCH_THRESHOLD: f64 = 0.9;

const KEYWORD_CONFIDENCE: f64 = 0.6;

const TYPE_KEYWORDS: &[(PollutionType, &[&str])] = &[
    (PollutionType::GasEmission, &["smoke", "gas", "fumes", "emission"]),
    (PollutionType::Waste, &["trash", "garbage", "waste", "dump"]),
    (PollutionType::WaterPollution, &["water", "river", "sewage"]),
    (PollutionType::Fire, &["fire", "burning", "flame"]),
];

const HIGH_KEYWORDS: &[&str] = &["severe", "critical", "heavy", "dangerous"];
const MEDIUM_KEYWORDS: &[&str] = &["moderate", "some", "noticeable"];

#[derive(Debug, Deserialize)]
struct ModelAnalysis {
    pollution_type: String,
    severity: String,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    confidence: f64,
}

/// Infer pollution type and severity from a spoken report.
///
/// The text model is asked first; if it fails or returns something
/// unparseable, keyword matching is used instead.
pub async fn analyze_transcription(generator: &dyn TextGenerator, transcription: &str) -> VoiceAnalysis {
    if transcription.trim().is_empty() {
        return VoiceAnalysis::empty();
    }

    let prompt = format!(
        "Analyze this pollution report and extract key information:\n\n\"{transcription}\"\n\n\
         Return ONLY a JSON object with this exact format:\n\
         {{\"pollution_type\": \"gas_emission|air_quality|waste|water_pollution|fire|noise|other\", \
         \"severity\": \"low|medium|high|critical\", \
         \"keywords\": [\"keyword1\", \"keyword2\"], \
         \"confidence\": 0.0}}\n\n\
         Extract 3-5 relevant keywords. Confidence is how certain you are, from 0.0 to 1.0.\n\
         JSON only, no explanation:"
    );

    match generator.generate(&prompt, 300, 0.3).await {
        Ok(text) => match parse_model_analysis(&text) {
            Some(analysis) => return analysis,
            None => tracing::warn!(response = %text, "Unparseable voice analysis, using keyword fallback"),
        },
        Err(e) => tracing::warn!(error = %e, "Voice analysis model call failed, using keyword fallback"),
    }

    metrics::counter!("assistant_fallbacks_total", "kind" => "voice_analysis").increment(1);
    keyword_analysis(transcription)
}

fn parse_model_analysis(text: &str) -> Option<VoiceAnalysis> {
    let cleaned = text.replace("```json", "").replace("```", "");
    let raw: ModelAnalysis = serde_json::from_str(cleaned.trim()).ok()?;

    Some(VoiceAnalysis {
        pollution_type: PollutionType::from_str(&raw.pollution_type).unwrap_or(PollutionType::Other),
        severity: Severity::from_str(&raw.severity).ok()?,
        keywords: raw.keywords,
        confidence: raw.confidence.clamp(0.0, 1.0),
    })
}

/// Keyword-based analysis used when the text model is unavailable.
pub fn keyword_analysis(text: &str) -> VoiceAnalysis {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    let mentions = |keywords: &[&str]| {
        words
            .iter()
            .any(|w| keywords.iter().any(|k| jaro_winkler(w, k) >= KEYWORD_MATCH_THRESHOLD))
    };

    let pollution_type = TYPE_KEYWORDS
        .iter()
        .find(|(_, keywords)| mentions(keywords))
        .map(|(kind, _)| *kind)
        .unwrap_or(PollutionType::AirQuality);

    let severity = if mentions(HIGH_KEYWORDS) {
        Severity::High
    } else if mentions(MEDIUM_KEYWORDS) {
        Severity::Medium
    } else {
        Severity::Low
    };

    VoiceAnalysis {
        pollution_type,
        severity,
        keywords: words.iter().take(5).map(|w| w.to_string()).collect(),
        confidence: KEYWORD_CONFIDENCE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ai::AiError;
    use async_trait::async_trait;

    struct FixedGenerator(Result<String, ()>);

    #[async_trait]
    impl TextGenerator for FixedGenerator {
        async fn generate(&self, _prompt: &str, _max_tokens: u32, _temperature: f32) -> Result<String, AiError> {
            self.0.clone().map_err(|_| AiError::EmptyResponse)
        }
    }

    #[test]
    fn test_keyword_smoke_is_gas_emission() {
        let analysis = keyword_analysis("Heavy smoke from the factory");
        assert_eq!(analysis.pollution_type, PollutionType::GasEmission);
        assert_eq!(analysis.severity, Severity::High);
        assert_eq!(analysis.confidence, 0.6);
        assert_eq!(analysis.keywords, ["heavy", "smoke", "from", "the", "factory"]);
    }

    #[test]
    fn test_keyword_tolerates_misspelling() {
        let analysis = keyword_analysis("garbge piling up, moderate smell");
        assert_eq!(analysis.pollution_type, PollutionType::Waste);
        assert_eq!(analysis.severity, Severity::Medium);
    }

    #[test]
    fn test_keyword_defaults() {
        let analysis = keyword_analysis("strange haze over the street");
        assert_eq!(analysis.pollution_type, PollutionType::AirQuality);
        assert_eq!(analysis.severity, Severity::Low);
    }

    #[test]
    fn test_parse_model_output_with_fences() {
        let text = "```json\n{\"pollution_type\": \"fire\", \"severity\": \"critical\", \"keywords\": [\"fire\"], \"confidence\": 0.92}\n```";
        let analysis = parse_model_analysis(text).unwrap();
        assert_eq!(analysis.pollution_type, PollutionType::Fire);
        assert_eq!(analysis.severity, Severity::Critical);
        assert_eq!(analysis.confidence, 0.92);
    }

    #[tokio::test]
    async fn test_empty_transcription() {
        let generator = FixedGenerator(Ok("{}".to_string()));
        assert_eq!(analyze_transcription(&generator, "  ").await, VoiceAnalysis::empty());
    }

    #[tokio::test]
    async fn test_model_failure_uses_keywords() {
        let generator = FixedGenerator(Err(()));
        let analysis = analyze_transcription(&generator, "dangerous fumes near the river").await;
        assert_eq!(analysis.pollution_type, PollutionType::GasEmission);
        assert_eq!(analysis.severity, Severity::High);
        assert_eq!(analysis.confidence, 0.6);
    }

    #[tokio::test]
    async fn test_garbage_model_output_uses_keywords() {
        let generator = FixedGenerator(Ok("I think it is smoke".to_string()));
        let analysis = analyze_transcription(&generator, "smoke everywhere").await;
        assert_eq!(analysis.pollution_type, PollutionType::GasEmission);
        assert_eq!(analysis.confidence, 0.6);
    }
}
