use chrono::{DateTime, NaiveDateTime};

use crate::controllers::FeedStatus;
use crate::forms::ImagePreview;
use crate::models::{Meme, ReactionCounts, ReactionKind};

/// "Mar 5" style label. Unparseable timestamps are shown verbatim.
pub fn short_date(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format("%b %-d").to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return dt.format("%b %-d").to_string();
    }
    raw.to_string()
}

fn reaction_label(kind: ReactionKind) -> &'static str {
    match kind {
        ReactionKind::Laugh => "laugh",
        ReactionKind::Robot => "robot",
        ReactionKind::Think => "think",
    }
}

pub fn render_card(
    meme: &Meme,
    counts: Option<ReactionCounts>,
    viewer: Option<ReactionKind>,
    asset_base: &str,
) -> String {
    let mut out = String::new();
    let uploader = meme.uploader_username.as_deref().unwrap_or("Anonymous");
    out.push_str(&format!(
        "[{}] @{} · {} · #{}\n",
        meme.id,
        uploader,
        short_date(&meme.created_at),
        meme.category
    ));
    out.push_str(&format!("  {}\n", meme.title));
    out.push_str(&format!("  {}\n", meme.caption));
    if let Some(src) = meme.image_src(asset_base) {
        out.push_str(&format!("  image: {}\n", src));
    }

    if let Some(counts) = counts {
        let line: Vec<String> = ReactionKind::ALL
            .iter()
            .map(|kind| {
                let marker = if viewer == Some(*kind) { "*" } else { "" };
                format!("{}{} {}", marker, reaction_label(*kind), counts.get(*kind))
            })
            .collect();
        out.push_str(&format!("  {}\n", line.join("  ")));
    }
    out.push_str(&format!("  {} reactions\n", meme.reaction_count));
    out
}

pub fn render_feed(memes: &[Meme], status: &FeedStatus, empty_message: &str, asset_base: &str) -> String {
    match status {
        FeedStatus::Idle | FeedStatus::Loading => return "Loading...\n".to_string(),
        FeedStatus::Failed(message) if memes.is_empty() => return format!("{}\n", message),
        _ => {}
    }
    if memes.is_empty() {
        return format!("{}\n", empty_message);
    }
    memes
        .iter()
        .map(|m| render_card(m, None, None, asset_base))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_preview(preview: &ImagePreview) -> String {
    format!(
        "preview: {} ({}, {} bytes)",
        preview.file_name, preview.mime, preview.size_bytes
    )
}
