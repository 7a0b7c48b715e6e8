// ABOUTME: Decomposes article HTML into an ordered sequence of typed content nodes.
// ABOUTME: Substitutes video, image, and link spans with sentinel tokens, then splits on them.

//! The decomposer works in four stages over one string:
//!
//! 1. video spans (`<video>` blocks, `<video/>`, allow-listed `<iframe>`s)
//! 2. `<img>` / `<image>` tags
//! 3. `<a href>` anchors with http(s) targets
//! 4. split on the sentinel tokens left behind and materialize nodes
//!
//! Each stage replaces what it recognizes with `__KIND_PLACEHOLDER_n__`, so
//! later stages never see markup an earlier stage consumed. Node order is the
//! left-to-right order of the spans in the source document.

use std::collections::HashSet;

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::attrs::{extract_attr, is_absolute_url, is_http_url};
use crate::error::{ContentError, SentinelKind};
use crate::locators::{extract_videos_with, pick_share_image_with};
use crate::media::{classify_video_span, replace_video_spans, Disposition, VideoPlatforms};
use crate::models::{ContentNode, ImageRef, LinkRef, VideoRef};
use crate::options::{DecomposerBuilder, Options};
use crate::placeholder::{self, PlaceholderTable};
use crate::present::style_image_tags;
use crate::text::strip_tags;

static SENTINEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"__(VIDEO|IMAGE|LINK)_PLACEHOLDER_(\d+)__").unwrap());

static IMAGE_SPAN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<(?:img|image)\b([^>]*)>(?:\s*</image\s*>)?").unwrap());

static LINK_SPAN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<a\b([^>]*)>(.*?)</a\s*>").unwrap());

static DEFAULT_DECOMPOSER: Lazy<Decomposer> = Lazy::new(|| {
    DecomposerBuilder::new()
        .build()
        .expect("default video platform list compiles")
});

/// Decomposes `html` with the default options. Never fails.
///
/// An empty document, or one with no renderable content, yields a single
/// empty text node. If decomposition fails internally, the original HTML comes
/// back untouched as one text node.
pub fn parse_html_to_nodes(html: &str) -> Vec<ContentNode> {
    DEFAULT_DECOMPOSER.parse_html_to_nodes(html)
}

/// Like [`parse_html_to_nodes`] but reports why decomposition failed.
pub fn try_parse_html_to_nodes(html: &str) -> Result<Vec<ContentNode>, ContentError> {
    DEFAULT_DECOMPOSER.try_parse_html_to_nodes(html)
}

pub(crate) fn default_decomposer() -> &'static Decomposer {
    &DEFAULT_DECOMPOSER
}

/// Side arrays filled while sentinels are inserted; index `n` backs sentinel `n`.
#[derive(Debug, Default)]
struct Spans {
    videos: Vec<VideoRef>,
    images: Vec<ImageRef>,
    links: Vec<LinkRef>,
}

/// Configured entry point for decomposition, extraction, and the placeholder transform.
#[derive(Debug, Clone)]
pub struct Decomposer {
    opts: Options,
    platforms: VideoPlatforms,
}

impl Decomposer {
    pub fn builder() -> DecomposerBuilder {
        DecomposerBuilder::new()
    }

    pub(crate) fn new(opts: Options, platforms: VideoPlatforms) -> Self {
        Self { opts, platforms }
    }

    pub fn options(&self) -> &Options {
        &self.opts
    }

    pub fn platforms(&self) -> &VideoPlatforms {
        &self.platforms
    }

    /// Total decomposition: falls back to the whole document as one text node.
    pub fn parse_html_to_nodes(&self, html: &str) -> Vec<ContentNode> {
        match self.try_parse_html_to_nodes(html) {
            Ok(nodes) => nodes,
            Err(err) => {
                warn!("content decomposition fell back to raw html: {}", err);
                vec![ContentNode::text(html)]
            }
        }
    }

    pub fn try_parse_html_to_nodes(&self, html: &str) -> Result<Vec<ContentNode>, ContentError> {
        if html.trim().is_empty() {
            return Ok(vec![ContentNode::text("")]);
        }
        if let Some(found) = SENTINEL_RE.find(html) {
            return Err(ContentError::SentinelCollision(found.as_str().to_string()));
        }

        let mut spans = Spans::default();
        let marked = self.substitute_videos(html, &mut spans.videos);
        let marked = substitute_images(&marked, &mut spans.images);
        let marked = substitute_links(&marked, &mut spans.links);

        let nodes = self.materialize(&marked, &spans)?;
        if nodes.is_empty() {
            return Ok(vec![ContentNode::text("")]);
        }
        Ok(nodes)
    }

    pub fn extract_videos(&self, html: &str) -> Vec<VideoRef> {
        extract_videos_with(html, &self.platforms)
    }

    pub fn pick_share_image(&self, html: &str) -> Option<String> {
        pick_share_image_with(html, &self.platforms)
    }

    pub fn to_placeholder_html(&self, html: &str, table: &mut PlaceholderTable) -> String {
        placeholder::to_placeholder_html_styled(html, table, &self.opts.placeholder_style)
    }

    pub fn from_placeholder_html(&self, html: &str, table: &PlaceholderTable) -> String {
        placeholder::from_placeholder_html_styled(html, table, &self.opts.placeholder_style)
    }

    fn substitute_videos(&self, html: &str, videos: &mut Vec<VideoRef>) -> String {
        replace_video_spans(html, |span| match classify_video_span(span, &self.platforms) {
            Disposition::Keep(video) => {
                videos.push(video);
                sentinel(SentinelKind::Video, videos.len() - 1)
            }
            Disposition::Drop => {
                debug!("dropping video span without absolute src: {}", span.markup);
                String::new()
            }
            Disposition::Pass => span.markup.to_string(),
        })
    }

    fn materialize(&self, marked: &str, spans: &Spans) -> Result<Vec<ContentNode>, ContentError> {
        let mut nodes = Vec::new();
        let mut seen = HashSet::new();
        let mut last = 0;

        for caps in SENTINEL_RE.captures_iter(marked) {
            let whole = caps.get(0).map_or(0..0, |m| m.range());
            self.push_text(&mut nodes, &marked[last..whole.start]);
            let (kind, index) = parse_sentinel(&caps)?;
            // each slot is emitted once; a second hit was glued together from text
            if !seen.insert((kind, index)) {
                return Err(ContentError::DuplicateSentinel { kind, index });
            }
            nodes.push(resolve_sentinel(kind, index, spans)?);
            last = whole.end;
        }
        self.push_text(&mut nodes, &marked[last..]);

        Ok(nodes)
    }

    fn push_text(&self, nodes: &mut Vec<ContentNode>, fragment: &str) {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            return;
        }
        nodes.push(ContentNode::text(style_image_tags(
            fragment,
            &self.opts.inline_image_max_width,
        )));
    }
}

impl Default for Decomposer {
    fn default() -> Self {
        DEFAULT_DECOMPOSER.clone()
    }
}

fn sentinel(kind: SentinelKind, index: usize) -> String {
    format!("__{}_PLACEHOLDER_{}__", kind.tag(), index)
}

fn classify_image_span(attrs: &str) -> Disposition<ImageRef> {
    match extract_attr(attrs, &["data-original", "src"]) {
        Some(url) if is_absolute_url(&url) => Disposition::Keep(ImageRef { url }),
        _ => Disposition::Drop,
    }
}

fn substitute_images(marked: &str, images: &mut Vec<ImageRef>) -> String {
    IMAGE_SPAN_RE
        .replace_all(marked, |caps: &Captures<'_>| {
            match classify_image_span(&caps[1]) {
                Disposition::Keep(image) => {
                    images.push(image);
                    sentinel(SentinelKind::Image, images.len() - 1)
                }
                Disposition::Drop | Disposition::Pass => {
                    debug!("dropping image without absolute url: {}", &caps[0]);
                    String::new()
                }
            }
        })
        .into_owned()
}

fn substitute_links(marked: &str, links: &mut Vec<LinkRef>) -> String {
    LINK_SPAN_RE
        .replace_all(marked, |caps: &Captures<'_>| {
            let url = match extract_attr(&caps[1], &["href"]) {
                Some(url) if is_http_url(&url) => url,
                _ => return caps[0].to_string(),
            };

            // media already lifted out of the anchor body follows the link node
            let inner = &caps[2];
            let hoisted: String = SENTINEL_RE.find_iter(inner).map(|m| m.as_str()).collect();
            let text = strip_tags(&SENTINEL_RE.replace_all(inner, ""));
            let text = if text.is_empty() { url.clone() } else { text };

            links.push(LinkRef { url, text });
            format!("{}{}", sentinel(SentinelKind::Link, links.len() - 1), hoisted)
        })
        .into_owned()
}

fn parse_sentinel(caps: &Captures<'_>) -> Result<(SentinelKind, usize), ContentError> {
    let collision = || ContentError::SentinelCollision(caps[0].to_string());
    let kind = SentinelKind::from_tag(&caps[1]).ok_or_else(collision)?;
    let index: usize = caps[2].parse().map_err(|_| collision())?;
    Ok((kind, index))
}

fn resolve_sentinel(
    kind: SentinelKind,
    index: usize,
    spans: &Spans,
) -> Result<ContentNode, ContentError> {
    let missing = ContentError::MissingSentinel { kind, index };

    let node = match kind {
        SentinelKind::Video => spans.videos.get(index).cloned().map(ContentNode::from),
        SentinelKind::Image => spans.images.get(index).cloned().map(ContentNode::from),
        SentinelKind::Link => spans.links.get(index).cloned().map(ContentNode::from),
    };
    node.ok_or(missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_input_yields_single_empty_text() {
        assert_eq!(parse_html_to_nodes(""), vec![ContentNode::text("")]);
        assert_eq!(parse_html_to_nodes("   \n"), vec![ContentNode::text("")]);
    }

    #[test]
    fn test_only_dropped_media_yields_single_empty_text() {
        let html = r#"<img src="relative.jpg"><video src="v.mp4"></video>"#;
        assert_eq!(parse_html_to_nodes(html), vec![ContentNode::text("")]);
    }

    #[test]
    fn test_sentinel_in_input_falls_back_to_raw() {
        let html = "see __IMAGE_PLACEHOLDER_0__ <img src=\"https://x/1.jpg\">";
        assert!(try_parse_html_to_nodes(html).unwrap_err().is_collision());
        assert_eq!(parse_html_to_nodes(html), vec![ContentNode::text(html)]);
    }

    #[test]
    fn test_forged_sentinel_after_deletion_falls_back() {
        // deleting the relative image glues a sentinel-shaped token together
        let html = r#"__IMAGE_PLACEHOLDER_7<img src="rel.jpg">__"#;
        let err = try_parse_html_to_nodes(html).unwrap_err();
        assert!(matches!(
            err,
            ContentError::MissingSentinel {
                kind: SentinelKind::Image,
                index: 7
            }
        ));
        assert_eq!(parse_html_to_nodes(html), vec![ContentNode::text(html)]);
    }

    #[test]
    fn test_forged_sentinel_with_live_index_falls_back() {
        // the glued token names slot 0, which the real image already owns
        let html = r#"<img src="https://x/1.jpg">__IMAGE_PLACEHOLDER_0<img src="rel.jpg">__ tail"#;
        let err = try_parse_html_to_nodes(html).unwrap_err();
        assert!(matches!(
            err,
            ContentError::DuplicateSentinel {
                kind: SentinelKind::Image,
                index: 0
            }
        ));
        assert_eq!(parse_html_to_nodes(html), vec![ContentNode::text(html)]);
    }

    #[test]
    fn test_unclosed_video_becomes_node_and_keeps_following_text() {
        let html = r#"<p>a</p><video src="https://x/a.mp4"><p>b</p>"#;
        assert_eq!(
            parse_html_to_nodes(html),
            vec![
                ContentNode::text("<p>a</p>"),
                ContentNode::video("https://x/a.mp4", None),
                ContentNode::text("<p>b</p>"),
            ]
        );
    }

    #[test]
    fn test_link_with_nested_image_hoists_image() {
        let html = r#"<a href="https://site"><img src="https://x/1.jpg"></a>"#;
        assert_eq!(
            parse_html_to_nodes(html),
            vec![
                ContentNode::link("https://site", "https://site"),
                ContentNode::image("https://x/1.jpg"),
            ]
        );
    }

    #[test]
    fn test_non_http_link_stays_inline() {
        let html = r#"mail <a href="mailto:a@b.c">me</a> now"#;
        assert_eq!(parse_html_to_nodes(html), vec![ContentNode::text(html)]);
    }

    #[test]
    fn test_image_closing_tag_consumed() {
        let html = r#"<image src="https://x/1.jpg"></image>"#;
        assert_eq!(
            parse_html_to_nodes(html),
            vec![ContentNode::image("https://x/1.jpg")]
        );
    }

    #[test]
    fn test_sentinel_numbering_is_per_kind() {
        assert_eq!(sentinel(SentinelKind::Video, 0), "__VIDEO_PLACEHOLDER_0__");
        assert_eq!(sentinel(SentinelKind::Link, 12), "__LINK_PLACEHOLDER_12__");
    }
}
