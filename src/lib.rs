pub mod admin;
pub mod auth;
pub mod client;
pub mod config;
pub mod history;
pub mod overpass;
pub mod pipeline;
pub mod plan;
pub mod session;
pub mod source;
pub mod types;
pub mod users;

// --- Library API for embedding ---

/// Convenience re-exports for embedders.
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::pipeline::{
        Discover, DurationBounds, DurationBucket, FilterCriteria, PageMark, RatingFilter,
    };
    pub use crate::types::{
        Category, ContentItem, EnrichedContentItem, HistoryEntry, MediaKind, Plan, PlanLevel,
        User, NO_RATING,
    };
    pub use crate::Mindwell;
}

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::client::ApiClient;
use crate::config::Config;
use crate::overpass::{OverpassClient, Psychologist};
use crate::pipeline::Discover;
use crate::session::{Session, SessionStore};
use crate::source::{ContentSource, RestContentSource};
use crate::types::{
    Category, ContentItem, EnrichedContentItem, HistoryEntry, MediaKind, PageResponse, Plan,
    PlanLevel, User,
};
use crate::users::{Questionnaire, UserUpdate};

/// Everything the profile screen aggregates, fetched in one fan-out.
/// Branches degrade independently: a failed plans fetch still leaves the
/// user block usable.
#[derive(Debug, Serialize)]
pub struct ProfileOverview {
    pub user: Option<User>,
    pub plans: Vec<Plan>,
    pub recent_history: Vec<HistoryEntry>,
}

/// Async library entry point. Owns the configuration, the API client and
/// the persisted session.
pub struct Mindwell {
    config: Config,
    client: ApiClient,
    store: SessionStore,
    session: Option<Session>,
}

impl Mindwell {
    /// Load configuration, open the default session store and restore any
    /// persisted session.
    pub fn connect() -> Result<Self> {
        let config = Config::load()?;
        let store = SessionStore::open_default()?;
        Self::with_store(config, store)
    }

    /// Entry point with explicit config and session store (embedders, tests).
    pub fn with_store(config: Config, store: SessionStore) -> Result<Self> {
        let mut client = ApiClient::new(&config.api_url)?;
        let session = store.load();
        client.set_token(session.as_ref().map(|s| s.token.clone()));
        Ok(Self { config, client, store, session })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_some()
    }

    fn content_source(&self) -> RestContentSource {
        RestContentSource::new(self.client.clone())
    }

    fn authed(&self) -> Result<&ApiClient> {
        self.session
            .as_ref()
            .context("not logged in; run `login` first")?;
        Ok(&self.client)
    }

    fn install_session(&mut self, session: Session) -> Result<()> {
        self.store.save(&session)?;
        self.client.set_token(Some(session.token.clone()));
        self.session = Some(session);
        Ok(())
    }

    // --- Authentication & session lifecycle ---

    pub async fn register(
        &mut self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<()> {
        let req = auth::RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        };
        let session = auth::register(&self.client, &req).await?;
        self.install_session(session)
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<()> {
        let session = auth::login(&self.client, email, password).await?;
        self.install_session(session)
    }

    /// Where to send a browser for the OAuth provider flow.
    pub fn oauth_login_url(&self) -> Result<url::Url> {
        auth::oauth_login_url(self.client.base_url())
    }

    /// Finish an OAuth flow with the ID token obtained out-of-band.
    pub async fn login_with_token(&mut self, token: &str, email: &str) -> Result<()> {
        let session = auth::session_from_token(token.to_string(), email.to_string());
        self.install_session(session)?;
        // Reject obviously bad tokens straight away
        if let Err(err) = auth::validate(&self.client).await {
            self.clear_session()?;
            return Err(err.context("token validation failed"));
        }
        Ok(())
    }

    /// End the session: best-effort server call, then local state is
    /// cleared unconditionally.
    pub async fn logout(&mut self) -> Result<()> {
        if self.session.is_some() {
            if let Err(err) = auth::logout(&self.client).await {
                warn!(error = %err, "server logout failed, clearing local session anyway");
            }
        }
        self.clear_session()
    }

    fn clear_session(&mut self) -> Result<()> {
        self.store.clear()?;
        self.client.set_token(None);
        self.session = None;
        Ok(())
    }

    // --- Users, questionnaire, profile ---

    pub async fn current_user(&self) -> Result<User> {
        users::get_current_user(self.authed()?).await
    }

    /// Onboarding: create the profile from a completed questionnaire.
    pub async fn complete_onboarding(&self, questionnaire: &Questionnaire) -> Result<User> {
        let payload = questionnaire.to_update()?;
        users::create_user(self.authed()?, &payload).await
    }

    /// Periodic check-in: update the wellness metrics.
    pub async fn check_in(&self, questionnaire: &Questionnaire) -> Result<User> {
        let payload = questionnaire.to_update()?;
        users::update_user(self.authed()?, &payload).await
    }

    pub async fn update_profile(&self, payload: &UserUpdate) -> Result<User> {
        users::update_user(self.authed()?, payload).await
    }

    /// The profile screen's aggregate: user, plans and a first history
    /// page, fetched concurrently with per-branch error containment.
    pub async fn profile_overview(&self) -> Result<ProfileOverview> {
        let client = self.authed()?;
        let (user, plans, history) = tokio::join!(
            users::get_current_user(client),
            plan::get_my_plans(client),
            history::get_history(client, 0, 10),
        );
        Ok(ProfileOverview {
            user: match user {
                Ok(u) => Some(u),
                Err(err) => {
                    warn!(error = %err, "profile fetch failed");
                    None
                }
            },
            plans: plans.unwrap_or_else(|err| {
                warn!(error = %err, "plan fetch failed");
                Vec::new()
            }),
            recent_history: match history {
                Ok(page) => page.content,
                Err(err) => {
                    warn!(error = %err, "history fetch failed");
                    Vec::new()
                }
            },
        })
    }

    // --- Content discovery ---

    /// Build a discovery view over the catalog. The bulk lookups (items
    /// per requested type, categories, associations) are issued
    /// concurrently; a failed branch contributes an empty list so the rest
    /// of the catalog still renders.
    pub async fn discover(&self, kind: Option<MediaKind>) -> Result<Discover> {
        self.authed()?;
        let mut view = Discover::new(self.config.duration_bounds, self.config.page_size);
        let token = view.begin_refresh();
        let items = self.load_catalog(kind).await;
        view.finish_refresh(token, items);
        Ok(view)
    }

    /// Re-fetch the catalog into an existing view, respecting the view's
    /// staleness token.
    pub async fn refresh_discover(
        &self,
        view: &mut Discover,
        kind: Option<MediaKind>,
    ) -> Result<bool> {
        self.authed()?;
        let token = view.begin_refresh();
        let items = self.load_catalog(kind).await;
        Ok(view.finish_refresh(token, items))
    }

    async fn load_catalog(&self, kind: Option<MediaKind>) -> Vec<EnrichedContentItem> {
        let source = self.content_source();
        let items = async {
            match kind {
                Some(k) => source::list_by_type_or_empty(&source, k).await,
                None => {
                    let (videos, audios) = tokio::join!(
                        source::list_by_type_or_empty(&source, MediaKind::Video),
                        source::list_by_type_or_empty(&source, MediaKind::Audio),
                    );
                    let mut all = videos;
                    all.extend(audios);
                    all
                }
            }
        };
        let categories = async {
            source.list_categories().await.unwrap_or_else(|err| {
                warn!(error = %err, "category listing failed, enriching without names");
                Vec::new()
            })
        };
        let associations = async {
            source.list_associations().await.unwrap_or_else(|err| {
                warn!(error = %err, "association listing failed, enriching without names");
                Vec::new()
            })
        };
        let (items, categories, associations) = tokio::join!(items, categories, associations);
        info!(
            items = items.len(),
            categories = categories.len(),
            "catalog loaded"
        );

        let enriched = pipeline::enrich_bulk(items, &categories, &associations);
        pipeline::enrich_ratings(&source, enriched).await
    }

    pub async fn categories(&self) -> Result<Vec<Category>> {
        self.authed()?;
        self.content_source().list_categories().await
    }

    /// One item by title, enriched through the per-item path, plus the
    /// interactions feeding its comment list.
    pub async fn content_detail(
        &self,
        title: &str,
    ) -> Result<(EnrichedContentItem, Vec<HistoryEntry>)> {
        self.authed()?;
        let source = self.content_source();
        let item = source.get_by_title(title).await?;
        let enriched = pipeline::enrich_per_item(&source, vec![item]).await;
        let enriched = enriched
            .into_iter()
            .next()
            .context("per-item enrichment returned nothing")?;
        let interactions = source
            .interactions(enriched.item.key())
            .await
            .unwrap_or_else(|err| {
                warn!(error = %err, "interaction fetch failed, showing none");
                Vec::new()
            });
        Ok((enriched, interactions))
    }

    // --- History ---

    pub async fn history(&self, page: u32, size: u32) -> Result<PageResponse<HistoryEntry>> {
        history::get_history(self.authed()?, page, size).await
    }

    pub async fn update_progress(&self, content_id: &str, watch_time: u32) -> Result<()> {
        history::update_progress(self.authed()?, content_id, watch_time).await
    }

    pub async fn rate(&self, content_id: &str, stars: f64) -> Result<HistoryEntry> {
        history::rate(self.authed()?, content_id, stars).await
    }

    pub async fn comment(&self, content_id: &str, text: &str) -> Result<HistoryEntry> {
        history::add_comment(self.authed()?, content_id, text).await
    }

    // --- Plans ---

    pub async fn my_plans(&self) -> Result<Vec<Plan>> {
        plan::get_my_plans(self.authed()?).await
    }

    pub async fn create_plan(&self, level: PlanLevel) -> Result<String> {
        plan::create_plan(self.authed()?, level).await
    }

    /// Level suggested from the current wellness metrics.
    pub async fn recommended_plan_level(&self) -> Result<PlanLevel> {
        let user = self.current_user().await?;
        Ok(plan::recommend_level(&user, &self.config))
    }

    // --- Admin panel ---

    async fn ensure_admin(&self) -> Result<&ApiClient> {
        let client = self.authed()?;
        let user = users::get_current_user(client).await?;
        admin::ensure_admin(&user)?;
        Ok(client)
    }

    pub async fn admin_overview(
        &self,
        page: u32,
        size: u32,
    ) -> Result<(Vec<EnrichedContentItem>, Vec<Category>)> {
        self.ensure_admin().await?;
        admin::admin_overview(&self.content_source(), page, size).await
    }

    pub async fn admin_create_content(
        &self,
        content: &ContentItem,
        category_ids: &[String],
    ) -> Result<(ContentItem, usize)> {
        let client = self.ensure_admin().await?;
        admin::create_content_with_categories(client, content, category_ids).await
    }

    pub async fn admin_update_content(
        &self,
        content_id: &str,
        content: &ContentItem,
    ) -> Result<ContentItem> {
        let client = self.ensure_admin().await?;
        admin::update_content(client, content_id, content).await
    }

    pub async fn admin_delete_content(&self, content_id: &str) -> Result<()> {
        let client = self.ensure_admin().await?;
        admin::delete_content(client, content_id).await
    }

    pub async fn admin_trigger_emails(&self) -> Result<()> {
        let client = self.ensure_admin().await?;
        admin::trigger_emails(client).await
    }

    // --- Map ---

    /// Nearby mental-health practitioners via the public Overpass API.
    /// Works without a session; the data source is public.
    pub async fn nearby_psychologists(
        &self,
        lat: f64,
        lon: f64,
        zoom: u8,
    ) -> Result<Vec<Psychologist>> {
        let overpass = OverpassClient::new(&self.config.overpass_url)?;
        overpass.find_nearby(lat, lon, zoom).await
    }
}
