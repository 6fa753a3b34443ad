use anyhow::Result;
use tracing::info;

use crate::client::ApiClient;
use crate::config::Config;
use crate::types::{Plan, PlanLevel, User};
use crate::users::wellness_score;

/// Retrieve all plans of the current user.
pub async fn get_my_plans(client: &ApiClient) -> Result<Vec<Plan>> {
    client.get_json("/api/v2/plan/").await
}

/// Create a plan of the given level for the current user. The backend
/// picks the content and returns a confirmation message.
pub async fn create_plan(client: &ApiClient, level: PlanLevel) -> Result<String> {
    info!(level = level.as_str(), "creating plan");
    client.post_text(&format!("/api/v2/plan/{}", level.as_str())).await
}

/// Suggest a plan level from the user's wellness metrics: the better the
/// mean wellbeing score, the lighter the plan.
pub fn recommend_level(user: &User, config: &Config) -> PlanLevel {
    let score = wellness_score(user.mental, user.sleep, user.stress, user.meditation);
    if score >= config.plan_easy_threshold {
        PlanLevel::Easy
    } else if score >= config.plan_intermediate_threshold {
        PlanLevel::Intermediate
    } else {
        PlanLevel::Advanced
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(mental: u8, sleep: u8, stress: u8, meditation: u8) -> User {
        User {
            id: None,
            email: "a@b.c".into(),
            first_name: String::new(),
            last_name: String::new(),
            roles: None,
            city: None,
            locale: None,
            preferences: None,
            is_active: None,
            mental,
            sleep,
            stress,
            meditation,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn high_wellbeing_gets_the_light_plan() {
        let cfg = Config::default();
        assert_eq!(recommend_level(&user(9, 8, 2, 8), &cfg), PlanLevel::Easy);
    }

    #[test]
    fn middling_wellbeing_gets_the_intermediate_plan() {
        let cfg = Config::default();
        assert_eq!(recommend_level(&user(5, 5, 5, 5), &cfg), PlanLevel::Intermediate);
    }

    #[test]
    fn low_wellbeing_gets_the_heaviest_plan() {
        let cfg = Config::default();
        assert_eq!(recommend_level(&user(2, 2, 9, 1), &cfg), PlanLevel::Advanced);
    }

    #[test]
    fn thresholds_come_from_configuration() {
        let mut cfg = Config::default();
        cfg.plan_easy_threshold = 1.0;
        assert_eq!(recommend_level(&user(2, 2, 9, 1), &cfg), PlanLevel::Easy);
    }
}
