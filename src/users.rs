use anyhow::{bail, ensure, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::types::User;

/// Partial user payload for create/update. Absent fields stay untouched
/// server-side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferences: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mental: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meditation: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Identity as seen by the auth layer.
pub async fn get_auth_user(client: &ApiClient) -> Result<serde_json::Value> {
    client.get_json("/user/me").await
}

/// Full profile (404 when the questionnaire was never completed).
pub async fn get_current_user(client: &ApiClient) -> Result<User> {
    client.get_json("/api/v2/user").await
}

/// Create the profile after the onboarding questionnaire.
pub async fn create_user(client: &ApiClient, payload: &UserUpdate) -> Result<User> {
    client.put_json("/api/v2/user/create", payload).await
}

/// Update the profile (check-in, profile edits).
pub async fn update_user(client: &ApiClient, payload: &UserUpdate) -> Result<User> {
    client.post_json("/api/v2/user/update", payload).await
}

/// Mean wellbeing on the 0-10 scale; stress counts inverted, so higher is
/// always better.
pub fn wellness_score(mental: u8, sleep: u8, stress: u8, meditation: u8) -> f64 {
    let inverted_stress = 10u8.saturating_sub(stress);
    f64::from(u16::from(mental) + u16::from(sleep) + u16::from(inverted_stress) + u16::from(meditation))
        / 4.0
}

// --- Questionnaire (onboarding and check-in share the question set) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WellnessMetric {
    Mental,
    Sleep,
    Stress,
    Meditation,
}

#[derive(Debug, Clone, Copy)]
pub struct Question {
    pub prompt: &'static str,
    pub metric: WellnessMetric,
}

pub const QUESTIONS: [Question; 4] = [
    Question {
        prompt: "How would you rate your current mental wellbeing? (0-10)",
        metric: WellnessMetric::Mental,
    },
    Question {
        prompt: "How well have you been sleeping lately? (0-10)",
        metric: WellnessMetric::Sleep,
    },
    Question {
        prompt: "How stressed do you feel day to day? (0-10)",
        metric: WellnessMetric::Stress,
    },
    Question {
        prompt: "How experienced are you with meditation? (0-10)",
        metric: WellnessMetric::Meditation,
    },
];

/// Step-by-step questionnaire state: one answer per question, no skipping
/// forward past an unanswered question.
#[derive(Debug, Default)]
pub struct Questionnaire {
    answers: [Option<u8>; QUESTIONS.len()],
    current: usize,
}

impl Questionnaire {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_question(&self) -> &'static Question {
        &QUESTIONS[self.current]
    }

    pub fn answer(&mut self, value: u8) -> Result<()> {
        ensure!(value <= 10, "answer {value} out of range, expected 0 to 10");
        self.answers[self.current] = Some(value);
        Ok(())
    }

    pub fn next(&mut self) -> Result<()> {
        if self.answers[self.current].is_none() {
            bail!("please provide an answer before proceeding");
        }
        if self.current + 1 < QUESTIONS.len() {
            self.current += 1;
        }
        Ok(())
    }

    pub fn previous(&mut self) {
        if self.current > 0 {
            self.current -= 1;
        }
    }

    /// Completion percentage for a progress bar.
    pub fn progress(&self) -> f64 {
        let answered = self.answers.iter().filter(|a| a.is_some()).count();
        answered as f64 / QUESTIONS.len() as f64 * 100.0
    }

    pub fn is_complete(&self) -> bool {
        self.answers.iter().all(|a| a.is_some())
    }

    /// Assemble the user-update payload once every question is answered.
    pub fn to_update(&self) -> Result<UserUpdate> {
        ensure!(self.is_complete(), "questionnaire is not complete");
        let get = |metric: WellnessMetric| {
            QUESTIONS
                .iter()
                .position(|q| q.metric == metric)
                .and_then(|i| self.answers[i])
        };
        Ok(UserUpdate {
            mental: get(WellnessMetric::Mental),
            sleep: get(WellnessMetric::Sleep),
            stress: get(WellnessMetric::Stress),
            meditation: get(WellnessMetric::Meditation),
            updated_at: Some(Utc::now().to_rfc3339()),
            ..Default::default()
        })
    }
}
