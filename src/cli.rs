use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::logging::LoggingMode;
use crate::query::{ReviewTab, SortField, SortOrder};

#[derive(Parser)]
#[command(name = "digimall-reviews")]
#[command(about = "Review moderation for the digiMall admin", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        long,
        value_enum,
        default_value_t = LoggingMode::Stderr,
        global = true,
        hide = true
    )]
    pub logging_mode: LoggingMode,

    /// Verbose logging
    #[arg(long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List reviews matching the given filters
    List {
        /// Output JSON (the full result page)
        #[arg(long)]
        json: bool,

        /// Tab to list from: all, pending, flagged
        #[arg(long, value_enum, default_value_t = ReviewTab::All)]
        tab: ReviewTab,

        /// Free-text search over title, content, author and target
        #[arg(long)]
        search: Option<String>,

        /// Status: pending, approved, rejected, flagged
        #[arg(long)]
        status: Option<String>,

        /// Review type: product, vendor
        #[arg(long = "type")]
        review_type: Option<String>,

        #[arg(long)]
        min_rating: Option<u8>,

        #[arg(long)]
        max_rating: Option<u8>,

        /// Only pending or flagged reviews
        #[arg(long)]
        needs_moderation: bool,

        /// Only flagged reviews
        #[arg(long)]
        flagged: bool,

        #[arg(long, value_enum)]
        sort_by: Option<SortField>,

        #[arg(long, value_enum)]
        sort_order: Option<SortOrder>,

        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Page size (defaults to ui.page_size)
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Show a single review
    Show {
        id: String,

        #[arg(long)]
        json: bool,
    },
    /// Approve, reject, flag or delete reviews
    Moderate {
        /// Action: approve, reject, flag, delete
        #[arg(long)]
        action: String,

        /// Reason (required for reject and flag, optional comment for approve)
        #[arg(long)]
        reason: Option<String>,

        /// Suppress the confirmation line
        #[arg(long)]
        quiet: bool,

        /// One id moderates a single review, several go through bulk moderation
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Review statistics
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Import reviews from a JSON array file into the local store
    Import { file: PathBuf },
    /// Launch the admin console
    Tui,
}
