use anyhow::{bail, Result};
use tracing::{info, warn};

use crate::client::ApiClient;
use crate::pipeline;
use crate::source::{ContentSource, RestContentSource};
use crate::types::{Category, ContentCategory, ContentItem, EnrichedContentItem, User};

/// The one access gate all admin operations consult. A UX affordance only:
/// the backend enforces the real authorization on every admin endpoint.
pub fn ensure_admin(user: &User) -> Result<()> {
    if !is_admin(user) {
        bail!("user {} is not an administrator", user.email);
    }
    Ok(())
}

pub fn is_admin(user: &User) -> bool {
    user.roles
        .as_deref()
        .is_some_and(|roles| roles.to_ascii_uppercase().contains("ADMIN"))
}

pub async fn create_content(client: &ApiClient, content: &ContentItem) -> Result<ContentItem> {
    info!(title = %content.title, "creating content");
    client.post_json("/api/v2/content", content).await
}

pub async fn update_content(
    client: &ApiClient,
    content_id: &str,
    content: &ContentItem,
) -> Result<ContentItem> {
    client.put_json(&format!("/api/v2/content/{content_id}"), content).await
}

pub async fn delete_content(client: &ApiClient, content_id: &str) -> Result<()> {
    info!(%content_id, "deleting content");
    client.delete(&format!("/api/v2/content/{content_id}")).await
}

pub async fn assign_category(
    client: &ApiClient,
    content_id: &str,
    category_id: &str,
) -> Result<ContentCategory> {
    let link = ContentCategory {
        id: None,
        content_id: content_id.to_string(),
        category_id: category_id.to_string(),
    };
    client.post_json("/api/v2/content/categories", &link).await
}

pub async fn remove_category_link(client: &ApiClient, link_id: &str) -> Result<()> {
    client.delete(&format!("/api/v2/content/categories/{link_id}")).await
}

/// Create a content item and link it to the selected categories. The
/// assignments are issued concurrently; one failed link does not abort the
/// others. Returns the created item and how many links succeeded.
pub async fn create_content_with_categories(
    client: &ApiClient,
    content: &ContentItem,
    category_ids: &[String],
) -> Result<(ContentItem, usize)> {
    let created = create_content(client, content).await?;
    let content_id = created.key().to_string();

    let assignments = category_ids.iter().map(|cat_id| {
        let content_id = content_id.clone();
        async move {
            match assign_category(client, &content_id, cat_id).await {
                Ok(_) => true,
                Err(err) => {
                    warn!(%content_id, category_id = %cat_id, error = %err, "category assignment failed");
                    false
                }
            }
        }
    });
    let done = futures::future::join_all(assignments)
        .await
        .into_iter()
        .filter(|ok| *ok)
        .count();
    Ok((created, done))
}

/// Trigger the notification emails for due plan entries.
pub async fn trigger_emails(client: &ApiClient) -> Result<()> {
    client.get_ok("/api/v2/mail/trigger").await
}

/// The admin screen's data: one catalog page with per-item category names,
/// plus the category list for the assignment checkboxes. Both base fetches
/// run concurrently; the per-item enrichment fans out after.
pub async fn admin_overview(
    source: &RestContentSource,
    page: u32,
    size: u32,
) -> Result<(Vec<EnrichedContentItem>, Vec<Category>)> {
    let (contents, categories) = tokio::join!(source.list_all(page, size), source.list_categories());
    let contents = match contents {
        Ok(page) => page.content,
        Err(err) => {
            warn!(error = %err, "content listing failed, rendering empty admin catalog");
            Vec::new()
        }
    };
    let categories = match categories {
        Ok(list) => list,
        Err(err) => {
            warn!(error = %err, "category listing failed");
            Vec::new()
        }
    };
    let enriched = pipeline::enrich_per_item(source, contents).await;
    Ok((enriched, categories))
}

/// Human label for a difficulty level.
pub fn difficulty_label(level: Option<u8>) -> &'static str {
    match level {
        Some(1) => "Easy",
        Some(2) => "Medium",
        Some(3) => "Hard",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_roles(roles: Option<&str>) -> User {
        User {
            id: None,
            email: "a@b.c".into(),
            first_name: String::new(),
            last_name: String::new(),
            roles: roles.map(str::to_string),
            city: None,
            locale: None,
            preferences: None,
            is_active: None,
            mental: 0,
            sleep: 0,
            stress: 0,
            meditation: 0,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn admin_gate_checks_role_string() {
        assert!(is_admin(&user_with_roles(Some("ROLE_ADMIN"))));
        assert!(is_admin(&user_with_roles(Some("role_user,role_admin"))));
        assert!(!is_admin(&user_with_roles(Some("ROLE_USER"))));
        assert!(!is_admin(&user_with_roles(None)));
        assert!(ensure_admin(&user_with_roles(Some("ADMIN"))).is_ok());
        assert!(ensure_admin(&user_with_roles(None)).is_err());
    }

    #[test]
    fn difficulty_labels_match_the_form() {
        assert_eq!(difficulty_label(Some(1)), "Easy");
        assert_eq!(difficulty_label(Some(2)), "Medium");
        assert_eq!(difficulty_label(Some(3)), "Hard");
        assert_eq!(difficulty_label(None), "");
        assert_eq!(difficulty_label(Some(9)), "");
    }
}
