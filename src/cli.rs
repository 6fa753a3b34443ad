use clap::{Parser, Subcommand};

/// CLI front-end for the wellness platform
#[derive(Parser)]
#[command(name = "mindwell")]
#[command(about = "Explore guided meditation content, plans and history", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in with email and password
    Login {
        email: String,
        password: String,
    },
    /// Create a new account
    Register {
        email: String,
        password: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
    },
    /// OAuth login: prints the provider URL, or finishes with a pasted token
    Oauth {
        /// ID token obtained from the browser flow
        #[arg(long)]
        token: Option<String>,
        /// Account email, required together with --token
        #[arg(long)]
        email: Option<String>,
    },
    /// End the current session
    Logout,
    /// Show the logged-in user's profile, plans and recent history
    Profile,
    /// Answer the wellness questionnaire and update your metrics
    Checkin {
        /// Mental wellbeing, 0-10
        mental: u8,
        /// Sleep quality, 0-10
        sleep: u8,
        /// Stress level, 0-10 (higher is worse)
        stress: u8,
        /// Meditation experience, 0-10
        meditation: u8,
        /// Create the profile instead of updating it (first run)
        #[arg(long)]
        onboard: bool,
    },
    /// Browse the catalog with filters and pagination
    Discover {
        /// Restrict to "video" or "audio"
        #[arg(short = 't', long)]
        kind: Option<String>,
        /// Case-insensitive title substring
        #[arg(short, long)]
        search: Option<String>,
        #[arg(short, long)]
        language: Option<String>,
        /// Difficulty 1-3
        #[arg(short, long)]
        difficulty: Option<u8>,
        /// Category id
        #[arg(short, long)]
        category: Option<String>,
        /// "none" for unrated, or a minimum star count like "3.5"
        #[arg(short, long)]
        rating: Option<String>,
        /// "short", "medium" or "long"
        #[arg(long)]
        duration: Option<String>,
        /// Page to show, 1-based
        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },
    /// Show one item by title, with ratings and comments
    Show {
        title: String,
    },
    /// List your watch history
    History {
        #[arg(short, long, default_value_t = 0)]
        page: u32,
        #[arg(short, long, default_value_t = 10)]
        size: u32,
    },
    /// Record watch progress for an item
    Progress {
        content_id: String,
        /// Seconds watched
        watch_time: u32,
    },
    /// Rate an item, 0-5 stars in half-star steps
    Rate {
        content_id: String,
        stars: f64,
    },
    /// Comment on an item
    Comment {
        content_id: String,
        text: String,
    },
    /// Meditation plans
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Administration (requires the ADMIN role)
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },
    /// Find mental-health practitioners near a coordinate
    Psychologists {
        lat: f64,
        lon: f64,
        /// Map zoom level, controls the search radius
        #[arg(short, long, default_value_t = 13)]
        zoom: u8,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// List your plans
    List,
    /// Create a plan at a given level: easy, intermediate or advanced
    Create {
        level: String,
    },
    /// Suggest a plan level from your current wellness metrics
    Recommend,
}

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Paged catalog overview with categories and ratings
    Overview {
        #[arg(short, long, default_value_t = 0)]
        page: u32,
        #[arg(short, long, default_value_t = 20)]
        size: u32,
    },
    /// Create a content item, optionally assigning categories
    Create {
        title: String,
        /// "video" or "audio"
        #[arg(short = 't', long, default_value = "video")]
        kind: String,
        /// Duration in minutes
        #[arg(long)]
        duration: u32,
        /// Difficulty 1-3
        #[arg(long)]
        difficulty: Option<u8>,
        #[arg(long, default_value = "EN")]
        language: String,
        /// Media source URL
        #[arg(long)]
        source: Option<String>,
        /// Category ids to assign
        #[arg(long)]
        category: Vec<String>,
    },
    /// Delete a content item
    Delete {
        content_id: String,
    },
    /// Trigger the reminder email run
    TriggerEmails,
}
