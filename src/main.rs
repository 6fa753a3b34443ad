mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{AdminCommands, Cli, Commands, PlanCommands};
use mindwell::admin::difficulty_label;
use mindwell::pipeline::{
    CategoryFilter, DurationBucket, FilterCriteria, PageMark, RatingFilter,
};
use mindwell::types::{ContentItem, MediaKind, PlanLevel, NO_RATING};
use mindwell::users::Questionnaire;
use mindwell::Mindwell;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();
    let mut mw = Mindwell::connect()?;

    match cli.command {
        Commands::Login { email, password } => {
            mw.login(&email, &password).await?;
            println!("Logged in as {email}");
        }
        Commands::Register { email, password, first_name, last_name } => {
            mw.register(&email, &password, &first_name, &last_name).await?;
            println!("Account created, logged in as {email}");
        }
        Commands::Oauth { token, email } => match (token, email) {
            (Some(token), Some(email)) => {
                mw.login_with_token(&token, &email).await?;
                println!("Logged in as {email}");
            }
            (None, _) => {
                println!("Open this URL in a browser, then rerun with --token and --email:");
                println!("{}", mw.oauth_login_url()?);
            }
            (Some(_), None) => bail!("--token requires --email"),
        },
        Commands::Logout => {
            mw.logout().await?;
            println!("Logged out");
        }
        Commands::Profile => {
            let overview = mw.profile_overview().await?;
            match &overview.user {
                Some(user) => {
                    println!("{} {} <{}>", user.first_name, user.last_name, user.email);
                }
                None => println!("(profile unavailable)"),
            }
            println!("Plans: {}", overview.plans.len());
            for plan in &overview.plans {
                println!("  {:?}: {} entries", plan.level, plan.to_watch.len());
            }
            println!("Recent history: {} entries", overview.recent_history.len());
        }
        Commands::Checkin { mental, sleep, stress, meditation, onboard } => {
            let mut q = Questionnaire::new();
            for value in [mental, sleep, stress, meditation] {
                q.answer(value)?;
                if !q.is_complete() {
                    q.next()?;
                }
            }
            let user = if onboard {
                mw.complete_onboarding(&q).await?
            } else {
                mw.check_in(&q).await?
            };
            println!("Metrics saved for {}", user.email);
        }
        Commands::Discover {
            kind,
            search,
            language,
            difficulty,
            category,
            rating,
            duration,
            page,
        } => {
            let kind = match kind {
                Some(s) => Some(
                    MediaKind::parse(&s).with_context(|| format!("unknown media type: {s}"))?,
                ),
                None => None,
            };
            let mut view = mw.discover(kind).await?;

            let categories = if category.is_some() {
                mw.categories().await.unwrap_or_default()
            } else {
                Vec::new()
            };
            view.set_criteria(FilterCriteria {
                search_text: search,
                kind,
                language,
                difficulty,
                category: category.map(|id| CategoryFilter::resolve(&id, &categories)),
                rating: match rating {
                    Some(s) => Some(
                        RatingFilter::parse(&s)
                            .with_context(|| format!("bad rating filter: {s}"))?,
                    ),
                    None => None,
                },
                duration: match duration {
                    Some(s) => Some(
                        DurationBucket::parse(&s)
                            .with_context(|| format!("bad duration bucket: {s}"))?,
                    ),
                    None => None,
                },
            });
            view.go_to_page(page);

            for item in view.page() {
                let stars = if item.rating == NO_RATING {
                    "unrated".to_string()
                } else {
                    format!("{:.1}★", item.rating)
                };
                println!(
                    "{:<40} {:<6} {:>4} min  {:<8} {}  [{}]",
                    item.item.title,
                    item.item.kind,
                    item.item.duration_min,
                    difficulty_label(item.item.difficulty),
                    stars,
                    item.category_names.join(", "),
                );
            }
            let pager: Vec<String> = view
                .pager()
                .iter()
                .map(|mark| match mark {
                    PageMark::Num(n) if *n == view.current_page() => format!("[{n}]"),
                    other => other.to_string(),
                })
                .collect();
            println!(
                "page {}/{}  {}",
                view.current_page(),
                view.total_pages(),
                pager.join(" ")
            );
        }
        Commands::Show { title } => {
            let (item, interactions) = mw.content_detail(&title).await?;
            println!("{} ({})", item.item.title, item.item.kind);
            println!("  duration: {} min", item.item.duration_min);
            println!("  difficulty: {}", difficulty_label(item.item.difficulty));
            if item.rating == NO_RATING {
                println!("  rating: none yet");
            } else {
                println!("  rating: {:.1}★", item.rating);
            }
            if !item.category_names.is_empty() {
                println!("  categories: {}", item.category_names.join(", "));
            }
            let comments: Vec<_> = interactions
                .iter()
                .flat_map(|entry| &entry.comments)
                .filter(|c| !c.text.is_empty())
                .collect();
            if !comments.is_empty() {
                println!("  comments:");
                for comment in comments {
                    println!("    - {}", comment.text);
                }
            }
        }
        Commands::History { page, size } => {
            let response = mw.history(page, size).await?;
            for entry in &response.content {
                let rating = entry
                    .rating
                    .map(|r| format!("{:.1}★", f64::from(r) / 2.0))
                    .unwrap_or_else(|| "-".into());
                println!(
                    "{:<36} watched {:>4}s / {:>4}s  {}",
                    entry.content_id, entry.watched_duration, entry.content_duration, rating,
                );
            }
            println!(
                "page {}/{} ({} entries total)",
                page + 1,
                response.total_pages.max(1),
                response.total_elements,
            );
        }
        Commands::Progress { content_id, watch_time } => {
            mw.update_progress(&content_id, watch_time).await?;
            println!("Progress saved");
        }
        Commands::Rate { content_id, stars } => {
            let entry = mw.rate(&content_id, stars).await?;
            let saved = entry.rating.map(|r| f64::from(r) / 2.0).unwrap_or(0.0);
            println!("Rated {:.1}★", saved);
        }
        Commands::Comment { content_id, text } => {
            mw.comment(&content_id, &text).await?;
            println!("Comment saved");
        }
        Commands::Plan { command } => match command {
            PlanCommands::List => {
                for plan in mw.my_plans().await? {
                    println!("{:?} plan ({} entries)", plan.level, plan.to_watch.len());
                    for entry in &plan.to_watch {
                        let done = if entry.notified { "x" } else { " " };
                        println!("  [{done}] {}", entry.content);
                    }
                }
            }
            PlanCommands::Create { level } => {
                let level = parse_level(&level)?;
                let message = mw.create_plan(level).await?;
                println!("{message}");
            }
            PlanCommands::Recommend => {
                let level = mw.recommended_plan_level().await?;
                println!("Suggested level: {level:?} ({} entries)", level.entry_count());
            }
        },
        Commands::Admin { command } => match command {
            AdminCommands::Overview { page, size } => {
                let (items, categories) = mw.admin_overview(page, size).await?;
                println!("{} categories known", categories.len());
                for item in &items {
                    println!(
                        "{:<36} {:<40} {:<6} active={}",
                        item.item.id.as_deref().unwrap_or("-"),
                        item.item.title,
                        item.item.kind,
                        item.item.is_active.unwrap_or(true),
                    );
                }
            }
            AdminCommands::Create {
                title,
                kind,
                duration,
                difficulty,
                language,
                source,
                category,
            } => {
                let content = ContentItem {
                    id: None,
                    title,
                    kind,
                    duration_min: duration,
                    difficulty,
                    language,
                    source,
                    is_active: Some(true),
                    created_at: None,
                };
                let (created, assigned) = mw.admin_create_content(&content, &category).await?;
                println!(
                    "Created {} ({} of {} categories assigned)",
                    created.title,
                    assigned,
                    category.len()
                );
            }
            AdminCommands::Delete { content_id } => {
                mw.admin_delete_content(&content_id).await?;
                println!("Deleted {content_id}");
            }
            AdminCommands::TriggerEmails => {
                mw.admin_trigger_emails().await?;
                println!("Email run triggered");
            }
        },
        Commands::Psychologists { lat, lon, zoom } => {
            let results = mw.nearby_psychologists(lat, lon, zoom).await?;
            if results.is_empty() {
                println!("No practitioners found nearby");
            }
            for psy in results {
                println!("{} ({:.5}, {:.5})", psy.name, psy.lat, psy.lon);
                if !psy.address.is_empty() {
                    println!("  {}", psy.address);
                }
            }
        }
    }

    Ok(())
}

fn parse_level(s: &str) -> Result<PlanLevel> {
    match s.to_ascii_lowercase().as_str() {
        "easy" => Ok(PlanLevel::Easy),
        "intermediate" => Ok(PlanLevel::Intermediate),
        "advanced" => Ok(PlanLevel::Advanced),
        other => bail!("unknown plan level: {other} (easy, intermediate or advanced)"),
    }
}
