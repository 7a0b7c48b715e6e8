// ABOUTME: Presentation views derived from a decomposed node sequence.
// ABOUTME: Splits nodes into a media rail and a body view, and styles residual inline images.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::media::replace_video_spans;
use crate::models::ContentNode;

static IMAGE_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(?P<name>img|image)\b(?P<attrs>[^>]*?)(?P<close>/?)>").unwrap()
});

static STYLE_ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)(?P<lead>^|\s)style\s*=\s*(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)')"#).unwrap()
});

static VIDEO_STRAY_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)</?(?:video|iframe)\b[^>]*>").unwrap());

/// The ordered image and video nodes, for a horizontal gallery.
pub fn to_media_rail(nodes: &[ContentNode]) -> Vec<ContentNode> {
    nodes.iter().filter(|n| n.is_media()).cloned().collect()
}

/// The nodes without images and videos: text and links in their original relative order.
pub fn to_body(nodes: &[ContentNode]) -> Vec<ContentNode> {
    nodes.iter().filter(|n| !n.is_media()).cloned().collect()
}

/// Caps every `<img>`/`<image>` at `max_width_px` and removes `<video>`/`<iframe>` markup.
///
/// Meant for rendering surfaces that cannot host video elements at all. Running
/// it twice yields the same output as running it once.
pub fn style_images_for_width(html: &str, max_width_px: u32) -> String {
    let stripped = replace_video_spans(html, |_| String::new());
    let stripped = VIDEO_STRAY_TAG_RE.replace_all(&stripped, "");
    style_image_tags(&stripped, &format!("{}px", max_width_px))
}

/// Injects a responsive inline style into every image tag that lacks a `max-width`.
pub(crate) fn style_image_tags(html: &str, max_width: &str) -> String {
    IMAGE_TAG_RE
        .replace_all(html, |caps: &Captures<'_>| restyle_image_tag(caps, max_width))
        .into_owned()
}

fn restyle_image_tag(caps: &Captures<'_>, max_width: &str) -> String {
    let name = &caps["name"];
    let attrs = &caps["attrs"];
    let close = if caps["close"].is_empty() { "" } else { " /" };

    let attrs = match STYLE_ATTR_RE.captures(attrs) {
        Some(style) => {
            let (value, quote) = match style.name("dq") {
                Some(dq) => (dq.as_str(), '"'),
                None => (style.name("sq").map_or("", |m| m.as_str()), '\''),
            };
            if value.to_ascii_lowercase().contains("max-width") {
                return caps[0].to_string();
            }
            let existing = value.trim().trim_end_matches(';').trim_end();
            let rule = format!("max-width: {}; width: 100%; height: auto;", max_width);
            let merged = if existing.is_empty() {
                rule
            } else {
                format!("{}; {}", existing, rule)
            };
            let whole = style.get(0).map_or(0..0, |m| m.range());
            format!(
                "{}{}style={}{}{}{}",
                &attrs[..whole.start],
                &style["lead"],
                quote,
                merged,
                quote,
                &attrs[whole.end..]
            )
        }
        None => format!(
            "{} style=\"max-width: {}; width: 100%; height: auto; display: block;\"",
            attrs.trim_end(),
            max_width
        ),
    };

    format!("<{}{}{}>", name, attrs.trim_end(), close)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rail_and_body_partition() {
        let nodes = vec![
            ContentNode::text("a"),
            ContentNode::image("https://x/1.jpg"),
            ContentNode::link("https://site", "Site"),
            ContentNode::video("https://x/1.mp4", None),
            ContentNode::text("b"),
        ];
        assert_eq!(
            to_media_rail(&nodes),
            vec![
                ContentNode::image("https://x/1.jpg"),
                ContentNode::video("https://x/1.mp4", None),
            ]
        );
        assert_eq!(
            to_body(&nodes),
            vec![
                ContentNode::text("a"),
                ContentNode::link("https://site", "Site"),
                ContentNode::text("b"),
            ]
        );
    }

    #[test]
    fn test_style_adds_attribute_when_missing() {
        let out = style_images_for_width(r#"<img src="a.jpg">"#, 375);
        assert_eq!(
            out,
            r#"<img src="a.jpg" style="max-width: 375px; width: 100%; height: auto; display: block;">"#
        );
    }

    #[test]
    fn test_style_appends_to_existing_style() {
        let out = style_images_for_width(r#"<img style="border: 0;" src="a.jpg"/>"#, 300);
        assert_eq!(
            out,
            r#"<img style="border: 0; max-width: 300px; width: 100%; height: auto;" src="a.jpg" />"#
        );
    }

    #[test]
    fn test_style_keeps_existing_max_width() {
        let html = r#"<image src='a.jpg' style='max-width: 50px'>"#;
        assert_eq!(style_images_for_width(html, 300), html);
    }

    #[test]
    fn test_style_is_idempotent() {
        let html = r#"<p>x<img src="a.jpg"><img style="float:left" src="b.jpg"></p>"#;
        let once = style_images_for_width(html, 320);
        assert_eq!(style_images_for_width(&once, 320), once);
    }

    #[test]
    fn test_style_strips_video_and_iframe() {
        let html = r#"<p>a</p><video src="https://x/v.mp4"><source src="https://x/v.mp4"></video><iframe src="https://www.youtube.com/embed/x"></iframe><video src="https://x/w.mp4"/><p>b</p></video>"#;
        assert_eq!(style_images_for_width(html, 320), "<p>a</p><p>b</p>");
    }

    #[test]
    fn test_style_keeps_text_after_unclosed_video() {
        let html = r#"<video src="https://x/a.mp4"><p>keep me</p><video src="https://x/b.mp4"></video>"#;
        assert_eq!(style_images_for_width(html, 320), "<p>keep me</p>");
    }

    #[test]
    fn test_style_ignores_data_style_attribute() {
        let out = style_image_tags(r#"<img data-style="x" src="a.jpg">"#, "100%");
        assert!(out.contains(r#"data-style="x""#));
        assert!(out.contains(r#"style="max-width: 100%; width: 100%; height: auto; display: block;""#));
    }
}
