use anyhow::Result;
use async_trait::async_trait;
use tracing::warn;

use crate::client::ApiClient;
use crate::types::{
    Category, ContentCategory, ContentItem, HistoryEntry, MediaKind, PageResponse,
};

/// Read side of the content backend, as consumed by the enrichment
/// pipeline. Implementations are idempotent reads with no retry policy;
/// tests substitute a scripted fake.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn list_by_type(&self, kind: MediaKind) -> Result<Vec<ContentItem>>;
    async fn list_categories(&self) -> Result<Vec<Category>>;
    /// Bulk content/category association list, fetched once per pipeline run.
    async fn list_associations(&self) -> Result<Vec<ContentCategory>>;
    /// Per-item category lookup (admin/detail enrichment path).
    async fn categories_for(&self, content_id: &str) -> Result<Vec<Category>>;
    /// Mean rating on the backend 0-10 scale; negative means "no ratings".
    async fn mean_rating(&self, content_id: &str) -> Result<f64>;
    /// All users' interactions (ratings and comments) with one content item.
    async fn interactions(&self, content_id: &str) -> Result<Vec<HistoryEntry>>;
}

/// The REST content source backed by `/api/v2/content` and friends.
#[derive(Debug, Clone)]
pub struct RestContentSource {
    client: ApiClient,
}

impl RestContentSource {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Look up one content item by its title. The title travels as an
    /// encoded path segment; titles with `?`, `#` or `/` still route to
    /// the lookup endpoint.
    pub async fn get_by_title(&self, title: &str) -> Result<ContentItem> {
        self.client.get_json_segment("/api/v2/content", title).await
    }

    /// Paginated list of the whole catalog (zero-based page index,
    /// matching the backend convention).
    pub async fn list_all(&self, page: u32, size: u32) -> Result<PageResponse<ContentItem>> {
        self.client
            .get_json_query(
                "/api/v2/content/all",
                &[("pages", page.to_string()), ("size", size.to_string())],
            )
            .await
    }
}

#[async_trait]
impl ContentSource for RestContentSource {
    async fn list_by_type(&self, kind: MediaKind) -> Result<Vec<ContentItem>> {
        self.client
            .get_json(&format!("/api/v2/content/type/{}", kind.as_str()))
            .await
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        self.client.get_json("/api/v2/categories/").await
    }

    async fn list_associations(&self) -> Result<Vec<ContentCategory>> {
        self.client.get_json("/api/v2/content/categories").await
    }

    async fn categories_for(&self, content_id: &str) -> Result<Vec<Category>> {
        self.client
            .get_json(&format!("/api/v2/content/{content_id}/categories"))
            .await
    }

    async fn mean_rating(&self, content_id: &str) -> Result<f64> {
        self.client
            .get_json(&format!("/api/v2/history/{content_id}/rating/mean"))
            .await
    }

    async fn interactions(&self, content_id: &str) -> Result<Vec<HistoryEntry>> {
        self.client
            .get_json(&format!("/api/v2/history/content/{content_id}"))
            .await
    }
}

/// Fetch one catalog slice, tolerating a failed listing by substituting an
/// empty list so the pipeline can still render what is available.
pub async fn list_by_type_or_empty<S: ContentSource + ?Sized>(
    source: &S,
    kind: MediaKind,
) -> Vec<ContentItem> {
    match source.list_by_type(kind).await {
        Ok(items) => items,
        Err(err) => {
            warn!(kind = kind.as_str(), error = %err, "content listing failed, rendering partial catalog");
            Vec::new()
        }
    }
}
