use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use murmur::app::AppContext;
use murmur::cli::{commands, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let ctx = AppContext::new(cli.config.as_deref())?;

    match cli.command {
        Commands::Feed {
            page_id,
            pages,
            json,
        } => {
            commands::show_feed(&ctx, page_id, pages, json).await?;
        }
        Commands::React { post, kind } => {
            commands::react(&ctx, &post, &kind).await?;
        }
        Commands::Delete { post } => {
            commands::delete(&ctx, &post).await?;
        }
        Commands::Edit {
            post,
            text,
            question,
            options,
        } => {
            let edit = commands::build_edit(text, question, options);
            commands::edit(&ctx, &post, edit).await?;
        }
        Commands::Save { post } => {
            commands::save(&ctx, &post).await?;
        }
        Commands::Show { post_id, json } => {
            commands::show_post(&ctx, post_id, json).await?;
        }
    }

    Ok(())
}
