pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "murmur")]
#[command(about = "Browse and interact with a social feed", long_about = None)]
pub struct Cli {
    /// Path to the config file (default: ~/.config/murmur/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print posts from the home feed or a page's feed
    Feed {
        /// Show a page profile's posts instead of the home feed
        #[arg(long)]
        page_id: Option<i64>,

        /// Maximum number of pages to load
        #[arg(short, long, default_value_t = 1)]
        pages: usize,

        /// Print items as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// React to a post (sending the same reaction again removes it server-side)
    React {
        /// Post id as <kind>_<id>, e.g. image_42
        post: String,
        /// like, love, laugh, wow, sad or angry
        kind: String,
    },
    /// Delete one of your posts
    Delete {
        /// Post id as <kind>_<id>
        post: String,
    },
    /// Edit a post on a page you manage
    Edit {
        /// Post id as <kind>_<id>
        post: String,
        /// New post text
        text: String,
        /// New poll question (poll posts only)
        #[arg(long)]
        question: Option<String>,
        /// Poll option; repeat for each option
        #[arg(long = "option")]
        options: Vec<String>,
    },
    /// Save a post, or unsave it if already saved
    Save {
        /// Post id as <kind>_<id>
        post: String,
    },
    /// Print a single post, as opened from a shared link
    Show {
        /// Numeric post id from the link
        post_id: i64,

        /// Print the post as JSON
        #[arg(long)]
        json: bool,
    },
}
