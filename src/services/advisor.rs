//! Spoken guidance for the voice assistant flows.
//!
//! Every generator here degrades to a fixed fallback text when the text
//! model is unavailable, so callers always get something to speak.

use chrono::Utc;
use std::fmt::Write as _;

use crate::models::advisory::{
    EmergencyPollution, GeneratedBy, HealthAdvice, LocationDetails, SpokenTips, TriggerReason,
    VoiceAnalysis,
};
use crate::models::report::{NearbyReport, Severity};
use crate::models::user::UserProfile;
use crate::services::ai::{AiError, SpeechSynthesizer, TextGenerator};
use crate::services::storage::{advisory_audio_key, R2Client, StorageError};

/// Distance under which a nearby high-severity report raises the tip severity.
const CLOSE_RANGE_KM: f64 = 2.0;

/// Severity attached to location tips.
pub fn overall_tip_severity(analysis: Option<&VoiceAnalysis>, nearby: &[NearbyReport]) -> Severity {
    let current_elevated = analysis.is_some_and(|a| a.severity.is_elevated());
    let close_elevated = nearby
        .iter()
        .any(|p| p.severity.is_elevated() && p.distance_km < CLOSE_RANGE_KM);

    if current_elevated || close_elevated {
        Severity::High
    } else {
        Severity::Medium
    }
}

/// Severity of a health advisory given the surrounding reports.
pub fn advisory_severity(nearby: &[NearbyReport]) -> Severity {
    match nearby.iter().map(|p| p.severity).max() {
        None => Severity::Low,
        Some(Severity::Critical) => Severity::Critical,
        Some(Severity::High) => Severity::High,
        Some(_) => Severity::Medium,
    }
}

/// Short, actionable tips for the user's current location.
pub async fn location_tips(
    generator: &dyn TextGenerator,
    profile: Option<&UserProfile>,
    location: &LocationDetails,
    analysis: Option<&VoiceAnalysis>,
    nearby: &[NearbyReport],
) -> SpokenTips {
    let severity = overall_tip_severity(analysis, nearby);
    let prompt = tips_prompt(profile, location, analysis, nearby);

    match generator.generate(&prompt, 400, 0.7).await {
        Ok(text) => SpokenTips {
            spoken_text: text,
            severity,
            generated_by: GeneratedBy::Model,
            generated_at: Utc::now(),
        },
        Err(e) => {
            tracing::warn!(error = %e, "Tips generation failed, using fallback");
            metrics::counter!("assistant_fallbacks_total", "kind" => "tips").increment(1);
            fallback_tips(location, nearby)
        }
    }
}

fn tips_prompt(
    profile: Option<&UserProfile>,
    location: &LocationDetails,
    analysis: Option<&VoiceAnalysis>,
    nearby: &[NearbyReport],
) -> String {
    let mut context = format!("Location: {}\n", location.display_name());

    if let Some(a) = analysis {
        let _ = writeln!(context, "Current report: {} ({} severity)", a.pollution_type, a.severity);
    }
    if !nearby.is_empty() {
        let _ = writeln!(context, "Nearby pollution reports ({}):", nearby.len());
        for p in nearby.iter().take(3) {
            let _ = writeln!(context, "- {} ({}) at {} km", p.pollution_type, p.severity, p.distance_km);
        }
    }
    if let Some(conditions) = profile.map(|p| &p.health_conditions).filter(|c| !c.is_empty()) {
        let _ = writeln!(context, "User has: {}", conditions.join(", "));
    }

    format!(
        "You are a voice assistant giving real-time pollution tips during a call.\n\n{context}\n\
         Generate SHORT, ACTIONABLE tips for voice delivery:\n\
         1. IMMEDIATE STATUS (1 sentence: is it safe or dangerous?)\n\
         2. QUICK ACTIONS (3-4 bullet points, each under 15 words)\n\
         3. KEY WARNING (1 sentence if needed)\n\n\
         Keep it conversational. This will be SPOKEN to the user."
    )
}

pub fn fallback_tips(location: &LocationDetails, nearby: &[NearbyReport]) -> SpokenTips {
    let place = location.display_name();
    let spoken_text = if nearby.is_empty() {
        format!("Air quality in {place} appears normal. Continue monitoring for any changes.")
    } else {
        format!(
            "There are {} pollution reports near {place}. Stay indoors if possible and monitor the air quality.",
            nearby.len()
        )
    };

    SpokenTips {
        spoken_text,
        severity: Severity::Medium,
        generated_by: GeneratedBy::Fallback,
        generated_at: Utc::now(),
    }
}

/// Personal health advice opening a voice session.
pub async fn health_advice(
    generator: &dyn TextGenerator,
    profile: &UserProfile,
    place: &str,
    nearby: &[NearbyReport],
    trigger: TriggerReason,
) -> HealthAdvice {
    let name = profile.first_name();
    let conditions = if profile.health_conditions.is_empty() {
        "no specific health conditions".to_string()
    } else {
        profile.health_conditions.join(", ")
    };

    let critical = nearby.iter().filter(|p| p.severity == Severity::Critical).count();
    let high = nearby.iter().filter(|p| p.severity == Severity::High).count();
    let urgency = if trigger == TriggerReason::Emergency {
        "URGENT"
    } else if critical + high > 0 {
        "IMPORTANT"
    } else {
        "ADVISORY"
    };

    let prompt = format!(
        "You are a voice health assistant speaking to {name} about pollution in {place}.\n\n\
         CONTEXT:\n\
         - User has: {conditions}\n\
         - Nearby pollution: {critical} critical and {high} high severity reports out of {total}\n\
         - Urgency level: {urgency}\n\n\
         Generate health advice that will be SPOKEN to the user:\n\
         1. Start with \"Hello {name},\"\n\
         2. State the situation clearly\n\
         3. Give 3-4 short, actionable steps (each under 20 words)\n\
         4. End with reassurance or a warning\n\
         Use simple language and short sentences, 150-200 words maximum.",
        total = nearby.len(),
    );

    let severity = if trigger == TriggerReason::Emergency {
        Severity::Critical
    } else {
        advisory_severity(nearby)
    };

    match generator.generate(&prompt, 500, 0.7).await {
        Ok(text) => HealthAdvice {
            spoken_text: text,
            severity,
            generated_by: GeneratedBy::Model,
            generated_at: Utc::now(),
        },
        Err(e) => {
            tracing::warn!(error = %e, user_id = %profile.user_id, "Health advice generation failed, using fallback");
            metrics::counter!("assistant_fallbacks_total", "kind" => "health_advice").increment(1);
            fallback_advice(name, nearby)
        }
    }
}

pub fn fallback_advice(name: &str, nearby: &[NearbyReport]) -> HealthAdvice {
    let spoken_text = if nearby.is_empty() {
        format!("Hello {name}. Air quality appears normal in your area. Continue to monitor for any changes.")
    } else {
        format!(
            "Hello {name}. There are pollution reports in your area. Please stay indoors, close your windows, and monitor air quality. Stay safe."
        )
    };

    HealthAdvice {
        spoken_text,
        severity: Severity::Medium,
        generated_by: GeneratedBy::Fallback,
        generated_at: Utc::now(),
    }
}

/// Short answer to a question asked during an active session.
pub async fn contextual_response(
    generator: &dyn TextGenerator,
    profile: Option<&UserProfile>,
    nearby: &[NearbyReport],
    query: &str,
) -> String {
    let name = profile.map_or("there", |p| p.first_name());
    let conditions = profile
        .map(|p| p.health_conditions.join(", "))
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| "none".to_string());

    let prompt = format!(
        "You are a voice health assistant in an active call with {name}.\n\n\
         User's health conditions: {conditions}\n\
         Their question: \"{query}\"\n\
         Nearby pollution: {} reports\n\n\
         Respond naturally in 30-50 words. Be conversational, helpful, and direct. This will be SPOKEN.",
        nearby.len()
    );

    match generator.generate(&prompt, 200, 0.7).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, "Contextual response failed, using fallback");
            metrics::counter!("assistant_fallbacks_total", "kind" => "contextual").increment(1);
            format!(
                "I understand your concern about {query}. Stay indoors and monitor the situation. I'll keep you updated."
            )
        }
    }
}

/// Urgent plain-text message about critical pollution close to the user.
pub fn emergency_message(name: &str, pollution: &EmergencyPollution) -> String {
    let kind = pollution.pollution_type.to_string().replace('_', " ");
    format!(
        "Urgent alert for {name}. Critical {kind} detected {:.1} kilometers from your location. \
         Take immediate action. Move indoors now. Close all windows and doors. \
         Stay inside until you receive the all-clear notification. \
         Your safety is our priority. We will monitor the situation and keep you updated.",
        pollution.distance_km
    )
}

/// Synthesize `text` and publish the audio, returning its public URL.
pub async fn speak(
    synthesizer: &dyn SpeechSynthesizer,
    storage: &R2Client,
    user_id: &str,
    text: &str,
) -> Result<String, SpeakError> {
    let audio = synthesizer.synthesize(text).await?;
    let key = advisory_audio_key(user_id, &uuid::Uuid::new_v4().to_string(), Utc::now().timestamp());
    let url = storage.upload(&key, &audio, "audio/mpeg").await?;

    metrics::counter!("tts_generated_total").increment(1);
    tracing::info!(user_id, key = %key, bytes = audio.len(), "Advisory audio published");
    Ok(url)
}

#[derive(Debug, thiserror::Error)]
pub enum SpeakError {
    #[error("Speech synthesis failed: {0}")]
    Synthesis(#[from] AiError),

    #[error("Audio upload failed: {0}")]
    Upload(#[from] StorageError),
}
