// ABOUTME: Flat media locators over a whole HTML document.
// ABOUTME: Extracts deduplicated images, videos, and links, and picks a share-card image.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::attrs::{extract_attr, is_absolute_url, is_http_url};
use crate::decompose::default_decomposer;
use crate::media::{classify_video_span, video_spans, Disposition, VideoPlatforms};
use crate::models::{ImageRef, LinkRef, VideoRef};
use crate::text::strip_tags;

static IMAGE_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<(?:img|image)\b([^>]*)>").unwrap());

static ANCHOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<a\b([^>]*)>(.*?)</a\s*>").unwrap());

/// Every absolute `<img>`/`<image>` URL in document order, first occurrence wins.
///
/// `data-original` is preferred over `src` so lazy-loaded articles report the
/// full-size image rather than the placeholder thumbnail.
pub fn extract_images(html: &str) -> Vec<ImageRef> {
    let mut seen = HashSet::new();
    IMAGE_TAG_RE
        .captures_iter(html)
        .filter_map(|caps| extract_attr(caps.get(1)?.as_str(), &["data-original", "src"]))
        .filter(|url| is_absolute_url(url))
        .filter(|url| seen.insert(url.clone()))
        .map(|url| ImageRef { url })
        .collect()
}

/// Every video in the document using the default iframe allow-list.
pub fn extract_videos(html: &str) -> Vec<VideoRef> {
    default_decomposer().extract_videos(html)
}

/// Every video in the document: `<video>` blocks, `<video/>` tags and
/// iframes whose src is on `platforms`. Deduplicated by src.
pub fn extract_videos_with(html: &str, platforms: &VideoPlatforms) -> Vec<VideoRef> {
    let mut seen = HashSet::new();
    video_spans(html)
        .iter()
        .filter_map(|span| match classify_video_span(span, platforms) {
            Disposition::Keep(video) => Some(video),
            Disposition::Drop | Disposition::Pass => None,
        })
        .filter(|video| seen.insert(video.src.clone()))
        .collect()
}

/// Every http(s) anchor in document order, deduplicated by URL.
///
/// The text is the anchor's inner text with nested tags removed, or the URL
/// itself when nothing is left.
pub fn extract_links(html: &str) -> Vec<LinkRef> {
    let mut seen = HashSet::new();
    ANCHOR_RE
        .captures_iter(html)
        .filter_map(|caps| {
            let url = extract_attr(caps.get(1)?.as_str(), &["href"])?;
            if !is_http_url(&url) || !seen.insert(url.clone()) {
                return None;
            }
            let text = strip_tags(caps.get(2).map_or("", |m| m.as_str()));
            let text = if text.is_empty() { url.clone() } else { text };
            Some(LinkRef { url, text })
        })
        .collect()
}

/// Picks the image for a share card: the first image, else the first video poster.
pub fn pick_share_image(html: &str) -> Option<String> {
    default_decomposer().pick_share_image(html)
}

pub(crate) fn pick_share_image_with(html: &str, platforms: &VideoPlatforms) -> Option<String> {
    if let Some(first) = extract_images(html).into_iter().next() {
        return Some(first.url);
    }
    extract_videos_with(html, platforms)
        .into_iter()
        .find_map(|video| video.poster)
}
