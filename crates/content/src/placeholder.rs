// ABOUTME: Editor-side round trip between <video> markup and inert placeholder <img> tags.
// ABOUTME: A caller-owned PlaceholderTable correlates placeholder ids with the original src/poster.

//! Rich-text editors that cannot host `<video>` get an `<img>` stand-in whose
//! `alt` carries `视频_<id>`. The [`PlaceholderTable`] lives for one edit
//! session: created empty when editing starts, dropped on save or navigation.
//! It is never persisted; only the restored HTML is.

use std::collections::HashMap;

use base64::Engine;
use chrono::Utc;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::attrs::{extract_attr, looks_like_image_url};
use crate::media::{replace_video_spans, resolve_video_tag, SpanShape};
use crate::options::DEFAULT_PLACEHOLDER_STYLE;

/// Prefix of the `alt` text that marks an `<img>` as a video placeholder.
pub const PLACEHOLDER_ALT_PREFIX: &str = "视频_";

const PLAY_CARD_SVG: &str = concat!(
    r##"<svg xmlns="http://www.w3.org/2000/svg" width="320" height="180" viewBox="0 0 320 180">"##,
    r##"<rect width="320" height="180" rx="8" fill="#e0e0e0"/>"##,
    r##"<circle cx="160" cy="90" r="32" fill="#9e9e9e"/>"##,
    r##"<path d="M150 72 L178 90 L150 108 Z" fill="#ffffff"/>"##,
    r##"</svg>"##
);

static PLAY_CARD_DATA_URI: Lazy<String> = Lazy::new(|| {
    format!(
        "data:image/svg+xml;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(PLAY_CARD_SVG)
    )
});

static IMG_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<img\b([^>]*)>").unwrap());

/// One video hidden behind a placeholder image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderEntry {
    pub id: String,
    pub src: String,
    pub poster: Option<String>,
}

/// Side table mapping placeholder ids to the videos they stand in for.
///
/// Owned by one edit session. Entries are only ever added or looked up; a
/// resumed session registers fresh ids for the videos it loads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaceholderTable {
    entries: HashMap<String, PlaceholderEntry>,
    next_index: u64,
}

impl PlaceholderTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&PlaceholderEntry> {
        self.entries.get(id)
    }

    pub fn entries(&self) -> impl Iterator<Item = &PlaceholderEntry> {
        self.entries.values()
    }

    /// Ends the session's bookkeeping. Placeholders still in the editor become orphans.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Registers a video and returns its entry. Posters that do not look like
    /// images are discarded.
    pub fn insert_video(&mut self, src: impl Into<String>, poster: Option<String>) -> PlaceholderEntry {
        let id = self.next_id();
        let entry = PlaceholderEntry {
            id: id.clone(),
            src: src.into(),
            poster: poster.filter(|p| looks_like_image_url(p)),
        };
        self.entries.insert(id, entry.clone());
        entry
    }

    // millis, per-table counter and 32 random bits, hex-joined
    fn next_id(&mut self) -> String {
        loop {
            let index = self.next_index;
            self.next_index += 1;
            let id = format!(
                "{:x}-{:x}-{:08x}",
                Utc::now().timestamp_millis(),
                index,
                rand::random::<u32>()
            );
            if !self.entries.contains_key(&id) {
                return id;
            }
        }
    }
}

/// Placeholder `<img>` markup for an entry, using the poster or a play-card glyph.
pub fn placeholder_img_tag(entry: &PlaceholderEntry) -> String {
    placeholder_img_tag_styled(entry, DEFAULT_PLACEHOLDER_STYLE)
}

fn placeholder_img_tag_styled(entry: &PlaceholderEntry, style: &str) -> String {
    let image = entry
        .poster
        .as_deref()
        .unwrap_or(PLAY_CARD_DATA_URI.as_str());
    format!(
        r#"<img src="{}" alt="{}{}" style="{}">"#,
        escape_attr(image),
        PLACEHOLDER_ALT_PREFIX,
        entry.id,
        escape_attr(style)
    )
}

fn video_tag_styled(entry: &PlaceholderEntry, style: &str) -> String {
    let poster = entry
        .poster
        .as_deref()
        .map(|p| format!(r#" poster="{}""#, escape_attr(p)))
        .unwrap_or_default();
    format!(
        r#"<video src="{}"{} controls style="{}"></video>"#,
        escape_attr(&entry.src),
        poster,
        escape_attr(style)
    )
}

fn escape_attr(value: &str) -> String {
    value.replace('"', "&quot;")
}

/// Replaces every `<video>` with a placeholder `<img>`, registering each in `table`.
///
/// Videos whose src cannot be resolved to an absolute URL are dropped.
pub fn to_placeholder_html(html: &str, table: &mut PlaceholderTable) -> String {
    to_placeholder_html_styled(html, table, DEFAULT_PLACEHOLDER_STYLE)
}

/// Restores every placeholder `<img>` found in `table` to a `<video>` tag.
///
/// Placeholders whose id is unknown are left untouched so content is never lost.
pub fn from_placeholder_html(html: &str, table: &PlaceholderTable) -> String {
    from_placeholder_html_styled(html, table, DEFAULT_PLACEHOLDER_STYLE)
}

pub(crate) fn to_placeholder_html_styled(
    html: &str,
    table: &mut PlaceholderTable,
    style: &str,
) -> String {
    replace_video_spans(html, |span| {
        let video = match span.shape {
            // editors keep iframes as they are
            SpanShape::Iframe { .. } => return span.markup.to_string(),
            SpanShape::SelfClosing { attrs } => resolve_video_tag(attrs, None),
            SpanShape::Block { attrs, inner } => resolve_video_tag(attrs, inner),
        };
        match video {
            Some(video) => {
                let entry = table.insert_video(video.src, video.poster);
                debug!("registered video placeholder {}", entry.id);
                placeholder_img_tag_styled(&entry, style)
            }
            None => {
                warn!("dropping video without resolvable src: {}", span.markup);
                String::new()
            }
        }
    })
}

pub(crate) fn from_placeholder_html_styled(
    html: &str,
    table: &PlaceholderTable,
    style: &str,
) -> String {
    IMG_TAG_RE
        .replace_all(html, |caps: &Captures<'_>| {
            let alt = extract_attr(&caps[1], &["alt"]);
            let id = match alt.as_deref().and_then(|a| a.strip_prefix(PLACEHOLDER_ALT_PREFIX)) {
                Some(id) => id,
                None => return caps[0].to_string(),
            };
            match table.get(id) {
                Some(entry) => video_tag_styled(entry, style),
                None => {
                    warn!("orphaned video placeholder {}, leaving it in place", id);
                    caps[0].to_string()
                }
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_ids_are_unique_within_a_table() {
        let mut table = PlaceholderTable::new();
        let a = table.insert_video("https://x/a.mp4", None);
        let b = table.insert_video("https://x/a.mp4", None);
        assert_ne!(a.id, b.id);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_insert_video_drops_video_poster() {
        let mut table = PlaceholderTable::new();
        let entry = table.insert_video("https://x/a.mp4", Some("https://x/b.mp4".into()));
        assert_eq!(entry.poster, None);
    }

    #[test]
    fn test_placeholder_uses_play_card_without_poster() {
        let entry = PlaceholderEntry {
            id: "abc".into(),
            src: "https://x/a.mp4".into(),
            poster: None,
        };
        let tag = placeholder_img_tag(&entry);
        assert!(tag.starts_with(r#"<img src="data:image/svg+xml;base64,"#));
        assert!(tag.contains(r#"alt="视频_abc""#));
        assert!(tag.ends_with(r#"style="max-width:100%;margin:12px 0;">"#));
    }

    #[test]
    fn test_placeholder_uses_poster() {
        let entry = PlaceholderEntry {
            id: "abc".into(),
            src: "https://x/a.mp4".into(),
            poster: Some("https://x/p.jpg".into()),
        };
        assert_eq!(
            placeholder_img_tag(&entry),
            r#"<img src="https://x/p.jpg" alt="视频_abc" style="max-width:100%;margin:12px 0;">"#
        );
    }

    #[test]
    fn test_restored_video_tag_shape() {
        let entry = PlaceholderEntry {
            id: "abc".into(),
            src: "https://x/a.mp4".into(),
            poster: Some("https://x/p.jpg".into()),
        };
        assert_eq!(
            video_tag_styled(&entry, DEFAULT_PLACEHOLDER_STYLE),
            r#"<video src="https://x/a.mp4" poster="https://x/p.jpg" controls style="max-width:100%;margin:12px 0;"></video>"#
        );
    }

    #[test]
    fn test_orphaned_placeholder_left_untouched() {
        let table = PlaceholderTable::new();
        let html = r#"<p>x</p><img src="https://x/p.jpg" alt="视频_gone">"#;
        assert_eq!(from_placeholder_html(html, &table), html);
    }

    #[test]
    fn test_unrelated_images_untouched() {
        let mut table = PlaceholderTable::new();
        table.insert_video("https://x/a.mp4", None);
        let html = r#"<img src="https://x/photo.jpg" alt="sunset">"#;
        assert_eq!(from_placeholder_html(html, &table), html);
    }

    #[test]
    fn test_dangling_video_open_tag_is_converted() {
        let mut table = PlaceholderTable::new();
        let out = to_placeholder_html(r#"<p>a</p><video src="https://x/a.mp4">"#, &mut table);
        assert_eq!(table.len(), 1);
        assert!(out.starts_with("<p>a</p><img "));
        assert!(!out.contains("<video"));
    }

    #[test]
    fn test_iframes_pass_through_untouched() {
        let mut table = PlaceholderTable::new();
        let html = r#"<iframe src="https://www.youtube.com/embed/x"></iframe><p>a</p>"#;
        assert_eq!(to_placeholder_html(html, &mut table), html);
        assert!(table.is_empty());
    }
}
