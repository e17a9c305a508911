// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout photo verification through the OpenAI chat completions API.
//!
//! Verification never fails the caller. Without an API key, or when the
//! upstream call goes wrong, the verdict is [`Verdict::Unknown`] and the
//! feedback explains why.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

pub const MODEL: &str = "gpt-4o";
const MAX_TOKENS: u32 = 300;
const TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Valid,
    Invalid,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verification {
    pub verdict: Verdict,
    pub feedback: String,
    /// 90 for valid, 80 for invalid, 0 when unknown
    pub confidence: u8,
}

impl Verification {
    fn unknown(feedback: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Unknown,
            feedback: feedback.into(),
            confidence: 0,
        }
    }

    /// Interpret the model's reply: "VALID"/"INVALID" on the first line.
    pub fn from_reply(reply: String) -> Self {
        let upper = reply.to_uppercase();
        let valid = upper.starts_with("VALID") || (upper.contains("VALID") && !upper.contains("INVALID"));
        Self {
            verdict: if valid { Verdict::Valid } else { Verdict::Invalid },
            confidence: if valid { 90 } else { 80 },
            feedback: reply,
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum UpstreamError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("API Error: {status} - {body}")]
    Status { status: u16, body: String },
    #[error("empty reply")]
    EmptyReply,
}

fn system_prompt(strictness: u8) -> &'static str {
    match strictness {
        1 => "You are an encouraging PE teacher at a Singapore secondary school evaluating student exercise form. \
              Be generous and supportive, these are young students still learning. Accept any reasonable attempt at the exercise. \
              Only reject if the student is clearly doing a completely different exercise or there is an obvious injury risk. \
              When in doubt, approve. Focus your feedback on one positive and one gentle tip to improve.",
        3 => "You are a strict PE teacher at a Singapore secondary school evaluating student exercise form. \
              Hold students to proper technique standards. Check all key form points carefully. \
              Reject if any major form criterion is not met, partial credit is not given. \
              Be direct and specific about what needs to improve.",
        _ => "You are a PE teacher at a Singapore secondary school evaluating student exercise form. \
              Apply age-appropriate standards: students should show clear effort and roughly correct technique. \
              Accept minor form imperfections but reject sloppy or unsafe form. Give balanced, constructive feedback.",
    }
}

/// Form checklist for the exercise, matched case-insensitively.
pub fn form_criteria(exercise: &str) -> String {
    let known = match exercise.to_lowercase().as_str() {
        "pull-ups" | "pull-up" => "1) Arms fully extended at bottom, 2) Chin clears the bar at top, 3) No excessive kipping or swinging",
        "sit-ups" | "sit-up" => "1) Feet flat or anchored, 2) Hands behind head or crossed on chest, 3) Shoulders clearly lift off ground",
        "push-ups" | "push-up" => "1) Body forms a straight line, 2) Chest near the floor at bottom, 3) Arms fully extend at top, 4) No sagging hips",
        "squats" | "squat" => "1) Feet shoulder-width apart, 2) Knees track over toes, 3) Hips at or below knee level, 4) Back stays straight",
        "lunges" => "1) Front knee doesn't go past toes, 2) Back knee lowers close to ground, 3) Torso stays upright",
        "burpees" => "1) Clear push-up position at bottom, 2) Full jump with arms overhead at top",
        "plank (seconds)" => "1) Body forms a straight line, 2) Core engaged, 3) No raised or sagging hips",
        "jumping jacks" => "1) Arms reach overhead, 2) Feet jump out wide and back together",
        "mountain climbers" => "1) Plank position maintained, 2) Knees drive toward chest alternately",
        "bicycle crunches" => "1) Shoulders lift off ground, 2) Opposite elbow meets opposite knee",
        "walk" => "1) Person is clearly walking at a moderate pace",
        "jog" => "1) Person is clearly jogging, both feet leave ground at points",
        "run" => "1) Person is clearly running at a brisk pace",
        "sprint" => "1) Person is running at maximum effort",
        _ => {
            return format!(
                "The student is clearly attempting to perform {exercise} with reasonable effort and form."
            )
        }
    };
    known.to_string()
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// OpenAI vision client.
#[derive(Clone)]
pub struct VisionClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl VisionClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Judge a base64 JPEG of the student doing `exercise`.
    pub async fn verify(&self, photo_b64: &str, exercise: &str, strictness: u8) -> Verification {
        let Some(api_key) = self.api_key.as_deref() else {
            return Verification::unknown(
                "OpenAI API key not configured. Set OPENAI_API_KEY to enable photo verification.",
            );
        };

        match self.request(api_key, photo_b64, exercise, strictness).await {
            Ok(reply) => {
                let verification = Verification::from_reply(reply);
                tracing::info!(
                    exercise,
                    strictness,
                    verdict = ?verification.verdict,
                    "Workout photo verified"
                );
                verification
            }
            Err(e) => {
                tracing::warn!(error = %e, exercise, "Photo verification failed");
                Verification::unknown(format!("Error: {e}"))
            }
        }
    }

    async fn request(
        &self,
        api_key: &str,
        photo_b64: &str,
        exercise: &str,
        strictness: u8,
    ) -> Result<String, UpstreamError> {
        let prompt = format!(
            "Evaluate this student performing {exercise}.\n\
             Key form criteria to check: {}\n\n\
             Respond with exactly 'VALID' or 'INVALID' on the first line, \
             then 2-3 sentences of specific, constructive feedback.",
            form_criteria(exercise)
        );

        let body = json!({
            "model": MODEL,
            "messages": [
                { "role": "system", "content": system_prompt(strictness) },
                {
                    "role": "user",
                    "content": [
                        { "type": "text", "text": prompt },
                        {
                            "type": "image_url",
                            "image_url": { "url": format!("data:image/jpeg;base64,{photo_b64}") }
                        }
                    ]
                }
            ],
            "max_tokens": MAX_TOKENS,
        });

        let response = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .timeout(TIMEOUT)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let chat: ChatResponse = response.json().await?;
        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(UpstreamError::EmptyReply)
    }
}
