use anyhow::{ensure, Result};

use crate::client::ApiClient;
use crate::types::{HistoryEntry, PageResponse, NO_RATING};

/// Retrieve the user's viewing history (zero-based page index, backend
/// convention; the discovery pipeline's own pages are 1-based).
pub async fn get_history(
    client: &ApiClient,
    page: u32,
    size: u32,
) -> Result<PageResponse<HistoryEntry>> {
    client
        .get_json_query(
            "/api/v2/history",
            &[("pages", page.to_string()), ("size", size.to_string())],
        )
        .await
}

/// Report watched seconds for a content item; called at playback start and
/// periodically afterwards.
pub async fn update_progress(client: &ApiClient, content_id: &str, watch_time: u32) -> Result<()> {
    let _: serde_json::Value = client
        .patch_query(
            &format!("/api/v2/history/{content_id}/progress"),
            &[("watchTime", watch_time.to_string())],
        )
        .await?;
    Ok(())
}

/// Rate a content item with UI stars (0-5, halves allowed). The backend
/// stores an integer 0-10.
pub async fn rate(client: &ApiClient, content_id: &str, stars: f64) -> Result<HistoryEntry> {
    let backend = to_backend_stars(stars)?;
    client
        .patch_query(
            &format!("/api/v2/history/{content_id}/rating"),
            &[("stars", backend.to_string())],
        )
        .await
}

pub async fn add_comment(client: &ApiClient, content_id: &str, text: &str) -> Result<HistoryEntry> {
    client
        .put_query(
            &format!("/api/v2/history/{content_id}/comment"),
            &[("text", text.to_string())],
        )
        .await
}

// --- Star scale conversions (canonical policy) ---
//
// Storage keeps the exact backend/2 value; display snaps to half stars;
// writes round stars*2 to the nearest integer.

/// Backend 0-10 value to UI stars. Negative input is the absence sentinel.
pub fn stars_from_backend(backend: f64) -> f64 {
    crate::pipeline::normalize_rating(backend)
}

/// UI stars (0-5) to the backend 0-10 integer scale.
pub fn to_backend_stars(stars: f64) -> Result<u8> {
    ensure!(
        (0.0..=5.0).contains(&stars),
        "star rating {stars} out of range, expected 0 to 5"
    );
    Ok(((stars * 2.0).round() as u8).min(10))
}

/// Snap a star value to the nearest half star for display.
pub fn round_half_star(stars: f64) -> f64 {
    if stars == NO_RATING {
        return NO_RATING;
    }
    (stars * 2.0).round() / 2.0
}

/// Client-side mean over a set of interactions, on the backend 0-10 scale.
/// Unrated interactions are excluded; no rated interaction at all yields
/// the absence sentinel.
pub fn mean_rating_of(interactions: &[HistoryEntry]) -> f64 {
    let rated: Vec<f64> = interactions
        .iter()
        .filter_map(|h| h.rating)
        .map(f64::from)
        .collect();
    if rated.is_empty() {
        return NO_RATING;
    }
    rated.iter().sum::<f64>() / rated.len() as f64
}
