use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::source::ContentSource;
use crate::types::{Category, ContentCategory, ContentItem, EnrichedContentItem, MediaKind, NO_RATING};

/// Duration bucket cutoffs in minutes. The defaults split at 10/20; a
/// longer-form catalog works better with 20/40, so the pair is
/// configuration rather than code.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct DurationBounds {
    /// Strictly below this is "short"; at or above begins "medium".
    pub short_max: u32,
    /// At or below this ends "medium"; strictly above is "long".
    pub medium_max: u32,
}

impl Default for DurationBounds {
    fn default() -> Self {
        Self { short_max: 10, medium_max: 20 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationBucket {
    Short,
    Medium,
    Long,
}

impl DurationBucket {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "short" => Some(DurationBucket::Short),
            "medium" => Some(DurationBucket::Medium),
            "long" => Some(DurationBucket::Long),
            _ => None,
        }
    }

    fn contains(&self, minutes: u32, bounds: &DurationBounds) -> bool {
        match self {
            DurationBucket::Short => minutes < bounds.short_max,
            DurationBucket::Medium => minutes >= bounds.short_max && minutes <= bounds.medium_max,
            DurationBucket::Long => minutes > bounds.medium_max,
        }
    }
}

/// Rating clause: either "only unrated items" or a minimum star threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RatingFilter {
    /// Keeps only items still carrying the no-rating sentinel.
    Unrated,
    /// Keeps rated items at or above the threshold; sentinel items never pass.
    AtLeast(f64),
}

impl RatingFilter {
    /// Accepts the wire form used by the filter controls: "none" or a number.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("none") {
            return Some(RatingFilter::Unrated);
        }
        s.parse::<f64>().ok().map(RatingFilter::AtLeast)
    }
}

/// Category clause, pre-resolved from a category id. An id that matches no
/// known category resolves to `name: None` and never matches any item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryFilter {
    pub id: String,
    pub name: Option<String>,
}

impl CategoryFilter {
    pub fn resolve(id: &str, categories: &[Category]) -> Self {
        let name = categories
            .iter()
            .find(|c| c.id.as_deref() == Some(id))
            .map(|c| c.name.clone());
        Self { id: id.to_string(), name }
    }
}

/// Compound filter. Every field is optional; `None` (or empty text) means
/// "no constraint". Clauses combine as a pure conjunction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub search_text: Option<String>,
    pub kind: Option<MediaKind>,
    pub language: Option<String>,
    pub difficulty: Option<u8>,
    pub category: Option<CategoryFilter>,
    pub rating: Option<RatingFilter>,
    pub duration: Option<DurationBucket>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        !self.search_text.as_deref().is_some_and(|s| !s.is_empty())
            && self.kind.is_none()
            && !self.language.as_deref().is_some_and(|s| !s.is_empty())
            && self.difficulty.is_none()
            && self.category.is_none()
            && self.rating.is_none()
            && self.duration.is_none()
    }

    /// Evaluate all clauses against one enriched item, short-circuiting on
    /// the first failing clause.
    pub fn matches(&self, item: &EnrichedContentItem, bounds: &DurationBounds) -> bool {
        if let Some(text) = self.search_text.as_deref() {
            if !text.is_empty()
                && !item.item.title.to_lowercase().contains(&text.to_lowercase())
            {
                return false;
            }
        }

        if let Some(kind) = self.kind {
            if MediaKind::parse(&item.item.kind) != Some(kind) {
                return false;
            }
        }

        if let Some(lang) = self.language.as_deref() {
            if !lang.is_empty() && item.item.language != lang {
                return false;
            }
        }

        if let Some(level) = self.difficulty {
            if item.item.difficulty != Some(level) {
                return false;
            }
        }

        if let Some(cat) = &self.category {
            match &cat.name {
                Some(name) => {
                    if !item.category_names.iter().any(|n| n == name) {
                        return false;
                    }
                }
                // Unknown category id: matches nothing.
                None => return false,
            }
        }

        if let Some(rating) = self.rating {
            match rating {
                RatingFilter::Unrated => {
                    if item.rating != NO_RATING {
                        return false;
                    }
                }
                RatingFilter::AtLeast(threshold) => {
                    if item.rating == NO_RATING || item.rating < threshold {
                        return false;
                    }
                }
            }
        }

        if let Some(bucket) = self.duration {
            if !bucket.contains(item.item.duration_min, bounds) {
                return false;
            }
        }

        true
    }
}

/// Backend mean ratings are on a 0-10 scale; stars are 0-5. The sentinel
/// (and any other negative value) passes through as "no rating".
pub fn normalize_rating(backend: f64) -> f64 {
    if backend < 0.0 || !backend.is_finite() {
        return NO_RATING;
    }
    (backend / 2.0).clamp(0.0, 5.0)
}

/// Bulk enrichment: join items with the category/association lists fetched
/// once per run. Pure; same length and order as the input. Ratings start at
/// the sentinel and are filled in by [`enrich_ratings`].
pub fn enrich_bulk(
    items: Vec<ContentItem>,
    categories: &[Category],
    associations: &[ContentCategory],
) -> Vec<EnrichedContentItem> {
    items
        .into_iter()
        .map(|item| {
            let category_names = category_names_for(item.key(), categories, associations);
            EnrichedContentItem { item, category_names, rating: NO_RATING }
        })
        .collect()
}

fn category_names_for(
    content_id: &str,
    categories: &[Category],
    associations: &[ContentCategory],
) -> Vec<String> {
    categories
        .iter()
        .filter(|c| {
            associations.iter().any(|a| {
                a.content_id == content_id && Some(a.category_id.as_str()) == c.id.as_deref()
            })
        })
        .map(|c| c.name.clone())
        .collect()
}

/// Fill in mean ratings with a concurrent per-item fan-out. A failing
/// lookup leaves that item's sentinel in place and never affects siblings.
pub async fn enrich_ratings<S: ContentSource + ?Sized>(
    source: &S,
    mut items: Vec<EnrichedContentItem>,
) -> Vec<EnrichedContentItem> {
    let lookups = items.iter().map(|e| {
        let id = e.item.key().to_string();
        async move {
            match source.mean_rating(&id).await {
                Ok(raw) => normalize_rating(raw),
                Err(err) => {
                    warn!(content_id = %id, error = %err, "rating lookup failed, keeping sentinel");
                    NO_RATING
                }
            }
        }
    });
    let ratings = futures::future::join_all(lookups).await;
    for (item, rating) in items.iter_mut().zip(ratings) {
        item.rating = rating;
    }
    items
}

/// Per-item enrichment: category and rating lookups for every item are
/// issued concurrently, each branch degrading independently on failure.
/// Used by the admin and detail views that have no bulk association list.
pub async fn enrich_per_item<S: ContentSource + ?Sized>(
    source: &S,
    items: Vec<ContentItem>,
) -> Vec<EnrichedContentItem> {
    let lookups = items.into_iter().map(|item| async move {
        let id = item.key().to_string();
        let (cats, rating) = tokio::join!(source.categories_for(&id), source.mean_rating(&id));
        let category_names = match cats {
            Ok(list) => list.into_iter().map(|c| c.name).collect(),
            Err(err) => {
                warn!(content_id = %id, error = %err, "category lookup failed, leaving empty");
                Vec::new()
            }
        };
        let rating = match rating {
            Ok(raw) => normalize_rating(raw),
            Err(err) => {
                warn!(content_id = %id, error = %err, "rating lookup failed, keeping sentinel");
                NO_RATING
            }
        };
        EnrichedContentItem { item, category_names, rating }
    });
    futures::future::join_all(lookups).await
}

// --- Pagination ---

/// 1-based page slice; out-of-range indexes yield an empty slice.
pub fn paginate<T>(items: &[T], page_index: usize, page_size: usize) -> &[T] {
    if page_index == 0 || page_size == 0 {
        return &[];
    }
    let start = (page_index - 1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = (start + page_size).min(items.len());
    &items[start..end]
}

/// Ceil division with a floor of one page: an empty result set still has
/// exactly one (empty) page, so a pager always has a current page to show.
pub fn total_pages(count: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 1;
    }
    count.div_ceil(page_size).max(1)
}

/// One slot in the pager control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMark {
    Num(usize),
    Ellipsis,
}

impl std::fmt::Display for PageMark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageMark::Num(n) => write!(f, "{n}"),
            PageMark::Ellipsis => write!(f, "..."),
        }
    }
}

/// Compact page-index sequence: first and last page always shown, a window
/// of radius two around the current page, ellipsis over any gap.
pub fn pages_to_display(total: usize, current: usize) -> Vec<PageMark> {
    if total <= 1 {
        return vec![PageMark::Num(1)];
    }

    let window = 5usize;
    let mut start = current.saturating_sub(2).max(2);
    let mut end = (current + 2).min(total - 1);

    if current <= 4 {
        start = 2;
        end = (1 + window).min(total - 1);
    }
    if current + 3 >= total {
        end = total - 1;
        start = total.saturating_sub(window).max(2);
    }

    let mut pages = vec![PageMark::Num(1)];
    if start > 2 {
        pages.push(PageMark::Ellipsis);
    }
    for i in start..=end {
        pages.push(PageMark::Num(i));
    }
    if end + 1 < total {
        pages.push(PageMark::Ellipsis);
    }
    pages.push(PageMark::Num(total));
    pages
}

/// The discovery view state: one enriched set, the active criteria and the
/// pager position.
#[derive(Debug)]
pub struct Discover {
    items: Vec<EnrichedContentItem>,
    criteria: FilterCriteria,
    bounds: DurationBounds,
    page_size: usize,
    current_page: usize,
    generation: u64,
}

impl Discover {
    pub fn new(bounds: DurationBounds, page_size: usize) -> Self {
        Self {
            items: Vec::new(),
            criteria: FilterCriteria::default(),
            bounds,
            page_size,
            current_page: 1,
            generation: 0,
        }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Replace the criteria. Any mutation invalidates the pager position,
    /// since the filtered set may have shrunk below the current page.
    pub fn set_criteria(&mut self, criteria: FilterCriteria) {
        self.criteria = criteria;
        self.current_page = 1;
    }

    /// In-place criteria edit; resets the pager like `set_criteria`.
    pub fn edit_criteria(&mut self, edit: impl FnOnce(&mut FilterCriteria)) {
        edit(&mut self.criteria);
        self.current_page = 1;
    }

    /// Hand out a generation token before starting a refresh. A refresh
    /// completed with a stale token is dropped rather than clobbering a
    /// newer result set.
    pub fn begin_refresh(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Install a refreshed result set. Returns false (and changes nothing)
    /// when the token is stale.
    pub fn finish_refresh(&mut self, token: u64, items: Vec<EnrichedContentItem>) -> bool {
        if token != self.generation {
            return false;
        }
        self.items = items;
        self.current_page = 1;
        true
    }

    pub fn all(&self) -> &[EnrichedContentItem] {
        &self.items
    }

    pub fn filtered(&self) -> Vec<&EnrichedContentItem> {
        self.items
            .iter()
            .filter(|i| self.criteria.matches(i, &self.bounds))
            .collect()
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.filtered().len(), self.page_size)
    }

    pub fn page(&self) -> Vec<&EnrichedContentItem> {
        let filtered = self.filtered();
        paginate(&filtered, self.current_page, self.page_size).to_vec()
    }

    pub fn pager(&self) -> Vec<PageMark> {
        pages_to_display(self.total_pages(), self.current_page)
    }

    pub fn go_to_page(&mut self, page: usize) {
        if page >= 1 && page <= self.total_pages() {
            self.current_page = page;
        }
    }

    pub fn next_page(&mut self) {
        if self.current_page < self.total_pages() {
            self.current_page += 1;
        }
    }

    pub fn prev_page(&mut self) {
        if self.current_page > 1 {
            self.current_page -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ContentItem;

    fn item(title: &str, kind: &str, duration: u32, rating: f64) -> EnrichedContentItem {
        EnrichedContentItem {
            item: ContentItem {
                id: Some(title.to_lowercase().replace(' ', "-")),
                title: title.to_string(),
                kind: kind.to_string(),
                duration_min: duration,
                difficulty: Some(1),
                language: "EN".to_string(),
                source: None,
                is_active: Some(true),
                created_at: None,
            },
            category_names: vec!["Sleep".to_string()],
            rating,
        }
    }

    fn sample() -> Vec<EnrichedContentItem> {
        vec![
            item("Calm Sleep", "audio", 8, NO_RATING),
            item("Focus Now", "video", 25, 4.5),
        ]
    }

    #[test]
    fn empty_criteria_keeps_everything_in_order() {
        let items = sample();
        let criteria = FilterCriteria::default();
        assert!(criteria.is_empty());
        let bounds = DurationBounds::default();
        let kept: Vec<_> = items.iter().filter(|i| criteria.matches(i, &bounds)).collect();
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].item.title, "Calm Sleep");
        assert_eq!(kept[1].item.title, "Focus Now");
    }

    #[test]
    fn type_clause_selects_videos() {
        let items = sample();
        let criteria = FilterCriteria { kind: Some(MediaKind::Video), ..Default::default() };
        let bounds = DurationBounds::default();
        let kept: Vec<_> = items.iter().filter(|i| criteria.matches(i, &bounds)).collect();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].item.title, "Focus Now");
    }

    #[test]
    fn none_bucket_keeps_only_sentinel_items() {
        let items = sample();
        let criteria = FilterCriteria {
            rating: RatingFilter::parse("none"),
            ..Default::default()
        };
        let bounds = DurationBounds::default();
        let kept: Vec<_> = items.iter().filter(|i| criteria.matches(i, &bounds)).collect();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].item.title, "Calm Sleep");
    }

    #[test]
    fn rating_threshold_rejects_sentinel_and_below() {
        let items = vec![
            item("A", "video", 5, NO_RATING),
            item("B", "video", 5, 2.0),
            item("C", "video", 5, 4.0),
        ];
        let criteria = FilterCriteria {
            rating: Some(RatingFilter::AtLeast(3.0)),
            ..Default::default()
        };
        let bounds = DurationBounds::default();
        let kept: Vec<_> = items.iter().filter(|i| criteria.matches(i, &bounds)).collect();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].item.title, "C");
    }

    #[test]
    fn search_text_is_case_insensitive_substring() {
        let items = sample();
        let criteria = FilterCriteria {
            search_text: Some("calm".to_string()),
            ..Default::default()
        };
        let bounds = DurationBounds::default();
        let kept: Vec<_> = items.iter().filter(|i| criteria.matches(i, &bounds)).collect();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].item.title, "Calm Sleep");
    }

    #[test]
    fn duration_buckets_partition_the_axis() {
        let bounds = DurationBounds::default();
        for minutes in 0..60 {
            let matching = [DurationBucket::Short, DurationBucket::Medium, DurationBucket::Long]
                .iter()
                .filter(|b| b.contains(minutes, &bounds))
                .count();
            assert_eq!(matching, 1, "minute {minutes} must land in exactly one bucket");
        }
        assert!(DurationBucket::Short.contains(9, &bounds));
        assert!(DurationBucket::Medium.contains(10, &bounds));
        assert!(DurationBucket::Medium.contains(20, &bounds));
        assert!(DurationBucket::Long.contains(21, &bounds));
    }

    #[test]
    fn duration_bounds_are_configuration() {
        let bounds = DurationBounds { short_max: 20, medium_max: 40 };
        assert!(DurationBucket::Short.contains(19, &bounds));
        assert!(DurationBucket::Medium.contains(40, &bounds));
        assert!(DurationBucket::Long.contains(41, &bounds));
    }

    #[test]
    fn unknown_category_id_matches_nothing() {
        let items = sample();
        let criteria = FilterCriteria {
            category: Some(CategoryFilter::resolve("missing", &[])),
            ..Default::default()
        };
        let bounds = DurationBounds::default();
        assert!(items.iter().all(|i| !criteria.matches(i, &bounds)));
    }

    #[test]
    fn resolved_category_matches_by_name() {
        let cats = vec![Category { id: Some("c1".into()), name: "Sleep".into() }];
        let items = sample();
        let criteria = FilterCriteria {
            category: Some(CategoryFilter::resolve("c1", &cats)),
            ..Default::default()
        };
        let bounds = DurationBounds::default();
        let kept: Vec<_> = items.iter().filter(|i| criteria.matches(i, &bounds)).collect();
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn normalize_rating_halves_and_preserves_sentinel() {
        assert_eq!(normalize_rating(9.0), 4.5);
        assert_eq!(normalize_rating(0.0), 0.0);
        assert_eq!(normalize_rating(10.0), 5.0);
        assert_eq!(normalize_rating(-1.0), NO_RATING);
        assert_eq!(normalize_rating(-7.0), NO_RATING);
        // Out-of-contract backend values still land inside [0, 5]
        assert_eq!(normalize_rating(14.0), 5.0);
    }

    #[test]
    fn bulk_enrichment_joins_category_names() {
        let items = vec![
            ContentItem {
                id: Some("a".into()),
                title: "A".into(),
                kind: "video".into(),
                duration_min: 10,
                difficulty: None,
                language: "EN".into(),
                source: None,
                is_active: None,
                created_at: None,
            },
            ContentItem {
                id: Some("b".into()),
                title: "B".into(),
                kind: "audio".into(),
                duration_min: 5,
                difficulty: None,
                language: "EN".into(),
                source: None,
                is_active: None,
                created_at: None,
            },
        ];
        let categories = vec![
            Category { id: Some("c1".into()), name: "Sleep".into() },
            Category { id: Some("c2".into()), name: "Focus".into() },
        ];
        let associations = vec![
            ContentCategory { id: None, content_id: "a".into(), category_id: "c1".into() },
            ContentCategory { id: None, content_id: "a".into(), category_id: "c2".into() },
        ];
        let enriched = enrich_bulk(items, &categories, &associations);
        assert_eq!(enriched.len(), 2);
        assert_eq!(enriched[0].category_names, vec!["Sleep", "Focus"]);
        assert!(enriched[1].category_names.is_empty());
        assert_eq!(enriched[0].rating, NO_RATING);
    }

    #[test]
    fn paginate_partitions_the_input() {
        let xs: Vec<usize> = (0..25).collect();
        for size in 1..=13 {
            let mut rebuilt = Vec::new();
            for p in 1..=total_pages(xs.len(), size) {
                rebuilt.extend_from_slice(paginate(&xs, p, size));
            }
            assert_eq!(rebuilt, xs, "page size {size}");
        }
    }

    #[test]
    fn paginate_out_of_range_is_empty() {
        let xs = [1, 2, 3];
        assert!(paginate(&xs, 0, 2).is_empty());
        assert!(paginate(&xs, 3, 2).is_empty());
        assert!(paginate(&xs, 99, 2).is_empty());
    }

    #[test]
    fn total_pages_has_floor_of_one() {
        assert_eq!(total_pages(0, 12), 1);
        assert_eq!(total_pages(0, 1), 1);
        assert_eq!(total_pages(25, 12), 3);
        assert_eq!(total_pages(24, 12), 2);
    }

    #[test]
    fn twenty_five_items_page_three_holds_one() {
        let xs: Vec<usize> = (0..25).collect();
        assert_eq!(total_pages(xs.len(), 12), 3);
        assert_eq!(paginate(&xs, 3, 12).len(), 1);
    }

    #[test]
    fn pager_degenerates_to_single_page() {
        assert_eq!(pages_to_display(0, 1), vec![PageMark::Num(1)]);
        assert_eq!(pages_to_display(1, 1), vec![PageMark::Num(1)]);
    }

    #[test]
    fn pager_always_includes_edges_without_duplicates() {
        for total in 2..=30 {
            for current in 1..=total {
                let marks = pages_to_display(total, current);
                let nums: Vec<usize> = marks
                    .iter()
                    .filter_map(|m| match m {
                        PageMark::Num(n) => Some(*n),
                        PageMark::Ellipsis => None,
                    })
                    .collect();
                assert_eq!(nums.first(), Some(&1), "total={total} current={current}");
                assert_eq!(nums.last(), Some(&total), "total={total} current={current}");
                let mut deduped = nums.clone();
                deduped.dedup();
                assert_eq!(nums, deduped, "duplicate page numbers at total={total}");
            }
        }
    }

    #[test]
    fn pager_gaps_are_always_marked_with_ellipsis() {
        for total in 2..=40 {
            for current in 1..=total {
                let marks = pages_to_display(total, current);
                for pair in marks.windows(2) {
                    if let [PageMark::Num(a), PageMark::Num(b)] = pair {
                        assert!(
                            b - a <= 1,
                            "unmarked gap {a}->{b} at total={total} current={current}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn criteria_change_resets_current_page() {
        let mut view = Discover::new(DurationBounds::default(), 1);
        let token = view.begin_refresh();
        assert!(view.finish_refresh(token, sample()));
        view.go_to_page(2);
        assert_eq!(view.current_page(), 2);
        view.edit_criteria(|c| c.kind = Some(MediaKind::Video));
        assert_eq!(view.current_page(), 1);
        assert_eq!(view.page().len(), 1);
    }

    #[test]
    fn stale_refresh_is_dropped() {
        let mut view = Discover::new(DurationBounds::default(), 12);
        let old = view.begin_refresh();
        let newer = view.begin_refresh();
        assert!(!view.finish_refresh(old, sample()));
        assert!(view.all().is_empty());
        assert!(view.finish_refresh(newer, sample()));
        assert_eq!(view.all().len(), 2);
    }

    #[test]
    fn go_to_page_ignores_out_of_range() {
        let mut view = Discover::new(DurationBounds::default(), 1);
        let token = view.begin_refresh();
        view.finish_refresh(token, sample());
        view.go_to_page(5);
        assert_eq!(view.current_page(), 1);
        view.next_page();
        assert_eq!(view.current_page(), 2);
        view.next_page();
        assert_eq!(view.current_page(), 2);
        view.prev_page();
        assert_eq!(view.current_page(), 1);
        view.prev_page();
        assert_eq!(view.current_page(), 1);
    }
}
