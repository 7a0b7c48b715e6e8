// ABOUTME: Shared recognition of video spans: <video> blocks, self-closing tags, and platform iframes.
// ABOUTME: One span scanner feeds the locators, decomposer, placeholder transform, and styler.

use std::ops::Range;

use aho_corasick::{AhoCorasick, AhoCorasickBuilder};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::attrs::{extract_attr, is_absolute_url, looks_like_image_url};
use crate::error::ContentError;
use crate::models::VideoRef;

/// Iframe hosts treated as embedded video players (substring match, case-insensitive).
pub const DEFAULT_VIDEO_PLATFORMS: &[&str] = &[
    "youtube.com",
    "youtu.be",
    "bilibili.com",
    "vimeo.com",
    "youku.com",
    "iqiyi.com",
    "qq.com/video",
];

// Alternatives are tried left to right at each position, so a self-closing
// <video/> wins over a block that would otherwise run to a later </video>.
// Both closing tags are optional; an iframe only owns a close that follows it
// directly, and video_spans trims a block that ran into another video.
static VIDEO_SPAN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?is)<video\b(?P<self_attrs>[^>]*?)/>|<video\b(?P<attrs>[^>]*)>(?:(?P<inner>.*?)</video\s*>)?|<iframe\b(?P<iframe_attrs>[^>]*)>(?:\s*</iframe\s*>)?",
    )
    .unwrap()
});

static VIDEO_OPEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<video\b").unwrap());

static SOURCE_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<source\b([^>]*)>").unwrap());

/// What to do with a structurally matched span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Disposition<T> {
    /// Promote the span to a typed value.
    Keep(T),
    /// Remove the span from the text stream.
    Drop,
    /// Not ours: leave the original markup untouched.
    Pass,
}

/// The structural form of a matched span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SpanShape<'h> {
    SelfClosing { attrs: &'h str },
    /// `inner` is None when the opening tag was never closed.
    Block { attrs: &'h str, inner: Option<&'h str> },
    Iframe { attrs: &'h str },
}

/// A video or iframe span located in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct VideoSpan<'h> {
    pub range: Range<usize>,
    pub markup: &'h str,
    pub shape: SpanShape<'h>,
}

/// Every video-ish span in document order, non-overlapping.
///
/// A `<video>` whose closing tag is missing covers only its opening tag, so
/// markup between it and a later video's `</video>` is never swallowed.
pub(crate) fn video_spans(html: &str) -> Vec<VideoSpan<'_>> {
    let mut spans = Vec::new();
    let mut at = 0;

    while let Some(caps) = VIDEO_SPAN_RE.captures_at(html, at) {
        let Some(whole) = caps.get(0) else { break };
        let (range, shape) = if let Some(attrs) = caps.name("self_attrs") {
            (whole.range(), SpanShape::SelfClosing { attrs: attrs.as_str() })
        } else if let Some(attrs) = caps.name("attrs") {
            match caps.name("inner") {
                Some(inner) if !VIDEO_OPEN_RE.is_match(inner.as_str()) => (
                    whole.range(),
                    SpanShape::Block {
                        attrs: attrs.as_str(),
                        inner: Some(inner.as_str()),
                    },
                ),
                // attrs stops right before the opening tag's '>'
                _ => (
                    whole.start()..attrs.end() + 1,
                    SpanShape::Block {
                        attrs: attrs.as_str(),
                        inner: None,
                    },
                ),
            }
        } else if let Some(attrs) = caps.name("iframe_attrs") {
            (whole.range(), SpanShape::Iframe { attrs: attrs.as_str() })
        } else {
            break;
        };

        at = range.end;
        spans.push(VideoSpan {
            markup: &html[range.clone()],
            range,
            shape,
        });
    }

    spans
}

/// Rebuilds `html` with every span from [`video_spans`] swapped for `replace`'s output.
pub(crate) fn replace_video_spans<F>(html: &str, mut replace: F) -> String
where
    F: FnMut(&VideoSpan<'_>) -> String,
{
    let mut out = String::with_capacity(html.len());
    let mut last = 0;
    for span in video_spans(html) {
        out.push_str(&html[last..span.range.start]);
        out.push_str(&replace(&span));
        last = span.range.end;
    }
    out.push_str(&html[last..]);
    out
}

/// Compiled iframe host allow-list.
#[derive(Debug, Clone)]
pub struct VideoPlatforms {
    matcher: AhoCorasick,
    hosts: Vec<String>,
}

impl VideoPlatforms {
    pub fn new<I, S>(hosts: I) -> Result<Self, ContentError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let hosts: Vec<String> = hosts
            .into_iter()
            .map(Into::into)
            .filter(|h| !h.trim().is_empty())
            .collect();
        let matcher = AhoCorasickBuilder::new()
            .ascii_case_insensitive(true)
            .build(&hosts)
            .map_err(ContentError::pattern)?;
        Ok(Self { matcher, hosts })
    }

    /// Returns true if `src` mentions any allow-listed host.
    pub fn matches(&self, src: &str) -> bool {
        !self.hosts.is_empty() && self.matcher.is_match(src)
    }

    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }
}

/// Resolves a `<video>` tag's src and poster.
///
/// The tag's own `src` beats the first nested `<source src>`. A src that is not
/// absolute resolves to None. The poster survives only if it looks like an image.
pub(crate) fn resolve_video_tag(attrs: &str, inner: Option<&str>) -> Option<VideoRef> {
    let src = extract_attr(attrs, &["src"]).or_else(|| {
        inner.and_then(|inner| {
            SOURCE_TAG_RE
                .captures_iter(inner)
                .find_map(|caps| extract_attr(caps.get(1)?.as_str(), &["src"]))
        })
    })?;

    if !is_absolute_url(&src) {
        return None;
    }

    Some(VideoRef {
        src,
        poster: resolve_poster(attrs),
    })
}

pub(crate) fn resolve_poster(attrs: &str) -> Option<String> {
    extract_attr(attrs, &["poster"]).filter(|p| looks_like_image_url(p))
}

/// Classifies one span from [`video_spans`].
///
/// Video tags resolve or drop; iframes off the allow-list pass through untouched.
pub(crate) fn classify_video_span(
    span: &VideoSpan<'_>,
    platforms: &VideoPlatforms,
) -> Disposition<VideoRef> {
    match span.shape {
        SpanShape::SelfClosing { attrs } => keep_or_drop(resolve_video_tag(attrs, None)),
        SpanShape::Block { attrs, inner } => keep_or_drop(resolve_video_tag(attrs, inner)),
        SpanShape::Iframe { attrs } => {
            let src = match extract_attr(attrs, &["src"]) {
                Some(src) => src,
                None => return Disposition::Pass,
            };
            if !platforms.matches(&src) {
                return Disposition::Pass;
            }
            if !is_absolute_url(&src) {
                return Disposition::Drop;
            }
            Disposition::Keep(VideoRef {
                src,
                poster: resolve_poster(attrs),
            })
        }
    }
}

fn keep_or_drop(video: Option<VideoRef>) -> Disposition<VideoRef> {
    match video {
        Some(v) => Disposition::Keep(v),
        None => Disposition::Drop,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(html: &str) -> Disposition<VideoRef> {
        let platforms = VideoPlatforms::new(DEFAULT_VIDEO_PLATFORMS.iter().copied()).unwrap();
        let spans = video_spans(html);
        let span = spans.first().expect("span should match");
        classify_video_span(span, &platforms)
    }

    #[test]
    fn test_own_src_beats_nested_source() {
        let got = classify(
            r#"<video src="https://a/own.mp4"><source src="https://a/nested.mp4"></video>"#,
        );
        assert_eq!(
            got,
            Disposition::Keep(VideoRef {
                src: "https://a/own.mp4".into(),
                poster: None
            })
        );
    }

    #[test]
    fn test_nested_source_used_when_tag_has_no_src() {
        let got = classify(
            r#"<video controls><source type="video/mp4" src="https://a/nested.mp4"></video>"#,
        );
        assert_eq!(
            got,
            Disposition::Keep(VideoRef {
                src: "https://a/nested.mp4".into(),
                poster: None
            })
        );
    }

    #[test]
    fn test_self_closing_video() {
        let got = classify(r#"<video src="//cdn/v.mp4" poster="//cdn/p.jpg"/>"#);
        assert_eq!(
            got,
            Disposition::Keep(VideoRef {
                src: "//cdn/v.mp4".into(),
                poster: Some("//cdn/p.jpg".into())
            })
        );
    }

    #[test]
    fn test_relative_src_drops() {
        assert_eq!(classify(r#"<video src="v.mp4"></video>"#), Disposition::Drop);
        assert_eq!(classify("<video></video>"), Disposition::Drop);
    }

    #[test]
    fn test_iframe_allow_list() {
        assert!(matches!(
            classify(r#"<iframe src="https://www.YouTube.com/embed/xyz"></iframe>"#),
            Disposition::Keep(_)
        ));
        assert_eq!(
            classify(r#"<iframe src="https://example.com/ads"></iframe>"#),
            Disposition::Pass
        );
    }

    #[test]
    fn test_empty_platform_list_matches_nothing() {
        let platforms = VideoPlatforms::new(Vec::<String>::new()).unwrap();
        assert!(!platforms.matches("https://youtube.com/embed/x"));
    }

    #[test]
    fn test_unclosed_video_covers_only_its_open_tag() {
        let html = r#"<video src="https://x/a.mp4"><p>keep me</p><video src="https://x/b.mp4"></video>"#;
        let markup: Vec<&str> = video_spans(html).iter().map(|s| s.markup).collect();
        assert_eq!(
            markup,
            vec![
                r#"<video src="https://x/a.mp4">"#,
                r#"<video src="https://x/b.mp4"></video>"#,
            ]
        );
    }

    #[test]
    fn test_unclosed_iframe_covers_only_its_open_tag() {
        let html = r#"<iframe src="https://www.youtube.com/embed/a"><p>Paris</p><iframe src="https://example.com/ads"></iframe>"#;
        let spans = video_spans(html);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].markup, r#"<iframe src="https://www.youtube.com/embed/a">"#);
        assert_eq!(spans[1].markup, r#"<iframe src="https://example.com/ads"></iframe>"#);
    }

    #[test]
    fn test_replace_video_spans_keeps_surrounding_text() {
        let html = r#"a<video src="https://x/a.mp4">b<iframe src="https://vimeo.com/1"></iframe>c"#;
        assert_eq!(replace_video_spans(html, |_| "|".to_string()), "a|b|c");
    }
}
