use anyhow::Result;
use clap::Parser;
use log::info;

use digimall_reviews::cli::{Cli, Commands};
use digimall_reviews::commands;
use digimall_reviews::config;
use digimall_reviews::context::DigimallContext;
use digimall_reviews::logging::{self, LoggingMode};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let logging_mode = match cli.command {
        Commands::Tui => LoggingMode::File,
        _ => cli.logging_mode,
    };
    logging::init_logging(logging_mode, cli.debug)?;
    info!("digimall-reviews starting");
    info!("logging mode: {:?}", logging_mode);
    info!("args: {:?}", std::env::args().collect::<Vec<_>>());

    let config = config::load()?;
    let context = DigimallContext::new(cli, config);
    if let Ok(dir) = context.digimall_dir() {
        info!("digimall dir: {}", dir.display());
    }

    match &context.invocation.command {
        Commands::List {
            json,
            tab,
            search,
            status,
            review_type,
            min_rating,
            max_rating,
            needs_moderation,
            flagged,
            sort_by,
            sort_order,
            page,
            limit,
        } => commands::list::run(
            &context,
            commands::list::ListParams {
                json: *json,
                tab: *tab,
                search: search.clone(),
                status: status.clone(),
                review_type: review_type.clone(),
                min_rating: *min_rating,
                max_rating: *max_rating,
                needs_moderation: *needs_moderation,
                flagged: *flagged,
                sort_by: *sort_by,
                sort_order: *sort_order,
                page: *page,
                limit: *limit,
            },
        ),
        Commands::Show { id, json } => commands::show::run(&context, id, *json),
        Commands::Moderate {
            action,
            reason,
            quiet,
            ids,
        } => commands::moderate::run(
            &context,
            commands::moderate::ModerateParams {
                action: action.parse()?,
                reason: reason.clone(),
                ids: ids.clone(),
                quiet: *quiet,
            },
        ),
        Commands::Stats { json } => commands::stats::run(&context, *json),
        Commands::Import { file } => commands::import::run(&context, file),
        Commands::Tui => commands::tui::run(&context),
    }
}
