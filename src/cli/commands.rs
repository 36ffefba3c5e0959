use crate::api::FeedSource;
use crate::app::{AppContext, MurmurError, Result};
use crate::domain::{FeedItem, PollEdit, PostContent, PostEdit, ReactionKind, ReactionSummary, UniqueId};
use crate::feed::FetchOutcome;

pub fn parse_post_id(raw: &str) -> Result<UniqueId> {
    raw.parse().map_err(MurmurError::Validation)
}

pub fn parse_reaction(raw: &str) -> Result<ReactionKind> {
    raw.parse::<ReactionKind>()
        .map_err(|e| MurmurError::Validation(e.to_string()))
}

pub async fn show_feed(ctx: &AppContext, page_id: Option<i64>, pages: usize, json: bool) -> Result<()> {
    let source = match page_id {
        Some(id) => FeedSource::Page(id),
        None => FeedSource::Home,
    };
    let feed = ctx.paginator(source);

    for _ in 0..pages {
        match feed.fetch_next_page().await? {
            FetchOutcome::Loaded { has_more: false, .. } | FetchOutcome::Exhausted => break,
            FetchOutcome::Loaded { .. } => {}
            FetchOutcome::InFlight | FetchOutcome::Discarded => break,
        }
    }

    let items = feed.items();
    if items.is_empty() {
        println!("No posts");
        return Ok(());
    }

    for item in &items {
        if json {
            println!("{}", serde_json::to_string(item)?);
        } else {
            print_item(item);
        }
    }

    if !json {
        let more = if feed.has_more() { ", more available" } else { "" };
        println!("{} posts{}", items.len(), more);
    }
    Ok(())
}

fn print_item(item: &FeedItem) {
    println!(
        "{:<12} {}  {}",
        item.unique_id().to_string(),
        item.created_at.format("%Y-%m-%d %H:%M"),
        item.author.display_name()
    );

    match &item.content {
        PostContent::Poll(poll) => {
            println!("    {}", poll.question);
            for option in &poll.options {
                println!("      {}. {}", option.id, option.text);
            }
        }
        PostContent::Image { url: Some(url) } | PostContent::Video { url: Some(url) } => {
            if !item.display_body().is_empty() {
                println!("    {}", item.display_body());
            }
            println!("    [{}] {}", item.kind(), url);
        }
        _ => println!("    {}", item.display_body()),
    }

    println!(
        "    {}  {} comments",
        format_reactions(&item.reactions),
        item.comment_count
    );
}

fn format_reactions(reactions: &ReactionSummary) -> String {
    let mut out = format!("{} reactions", reactions.total());
    if let Some(mine) = reactions.current() {
        out.push_str(&format!(" (you: {})", mine));
    }
    out
}

pub async fn react(ctx: &AppContext, post: &str, kind: &str) -> Result<()> {
    let post = parse_post_id(post)?;
    let kind = parse_reaction(kind)?;

    match ctx.api.react(post, kind).await? {
        Some(summary) => println!("{}: {}", post, format_reactions(&summary)),
        None => println!("Reacted {} to {}", kind, post),
    }
    Ok(())
}

pub async fn delete(ctx: &AppContext, post: &str) -> Result<()> {
    let post = parse_post_id(post)?;
    ctx.api.delete_post(post).await?;
    println!("Post deleted successfully!");
    Ok(())
}

/// Build an edit from the command line. Poll details are only sent when a
/// question or at least one option was given.
pub fn build_edit(text: String, question: Option<String>, options: Vec<String>) -> PostEdit {
    if question.is_none() && options.is_empty() {
        return PostEdit::text(text);
    }
    PostEdit {
        body: text,
        poll: Some(PollEdit {
            question: question.unwrap_or_default(),
            options,
        }),
    }
}

pub async fn edit(ctx: &AppContext, post: &str, edit: PostEdit) -> Result<()> {
    let post = parse_post_id(post)?;

    let current = ctx.api.fetch_post(post.id).await?;
    if current.unique_id() != post {
        return Err(MurmurError::ItemNotFound(post.to_string()));
    }

    let checked = edit.check(&current)?;
    ctx.api.update_post(&checked).await?;
    println!("Post updated successfully!");
    Ok(())
}

pub async fn save(ctx: &AppContext, post: &str) -> Result<()> {
    let post = parse_post_id(post)?;
    if ctx.api.toggle_saved(post).await? {
        println!("Saved {}", post);
    } else {
        println!("Removed {} from saved posts", post);
    }
    Ok(())
}

pub async fn show_post(ctx: &AppContext, post_id: i64, json: bool) -> Result<()> {
    let item = ctx.api.fetch_post(post_id).await?;
    if json {
        println!("{}", serde_json::to_string(&item)?);
    } else {
        print_item(&item);
    }
    Ok(())
}
