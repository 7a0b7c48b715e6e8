// ABOUTME: Value types produced by decomposition and media extraction.
// ABOUTME: Defines ContentNode plus the flat ImageRef, VideoRef, and LinkRef references.

use serde::{Deserialize, Serialize};

/// One typed unit of decomposed article content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentNode {
    /// Raw markup fragment, rendered as styled text. May still hold non-media inline tags.
    Text { content: String },
    /// An absolute or protocol-relative image URL.
    Image { url: String },
    Video { src: String, poster: Option<String> },
    /// `text` falls back to `url` when the anchor had no inner text.
    Link { url: String, text: String },
}

impl ContentNode {
    pub fn text(content: impl Into<String>) -> Self {
        ContentNode::Text {
            content: content.into(),
        }
    }

    pub fn image(url: impl Into<String>) -> Self {
        ContentNode::Image { url: url.into() }
    }

    pub fn video(src: impl Into<String>, poster: Option<String>) -> Self {
        ContentNode::Video {
            src: src.into(),
            poster,
        }
    }

    pub fn link(url: impl Into<String>, text: impl Into<String>) -> Self {
        ContentNode::Link {
            url: url.into(),
            text: text.into(),
        }
    }

    /// Returns true for image and video nodes.
    pub fn is_media(&self) -> bool {
        matches!(self, ContentNode::Image { .. } | ContentNode::Video { .. })
    }

    /// Short lowercase name of the variant, matching the serialized `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            ContentNode::Text { .. } => "text",
            ContentNode::Image { .. } => "image",
            ContentNode::Video { .. } => "video",
            ContentNode::Link { .. } => "link",
        }
    }
}

impl From<ImageRef> for ContentNode {
    fn from(image: ImageRef) -> Self {
        ContentNode::Image { url: image.url }
    }
}

impl From<VideoRef> for ContentNode {
    fn from(video: VideoRef) -> Self {
        ContentNode::Video {
            src: video.src,
            poster: video.poster,
        }
    }
}

impl From<LinkRef> for ContentNode {
    fn from(link: LinkRef) -> Self {
        ContentNode::Link {
            url: link.url,
            text: link.text,
        }
    }
}

/// An image found anywhere in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub url: String,
}

/// A video found anywhere in a document. An invalid poster is absent, never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRef {
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
}

/// An http(s) anchor found anywhere in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRef {
    pub url: String,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_serializes_with_type_tag() {
        let node = ContentNode::video("https://cdn/v.mp4", None);
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "video");
        assert_eq!(json["src"], "https://cdn/v.mp4");
        assert!(json["poster"].is_null());
    }

    #[test]
    fn test_video_ref_omits_missing_poster() {
        let video = VideoRef {
            src: "https://cdn/v.mp4".into(),
            poster: None,
        };
        let json = serde_json::to_string(&video).unwrap();
        assert_eq!(json, r#"{"src":"https://cdn/v.mp4"}"#);
    }

    #[test]
    fn test_is_media() {
        assert!(ContentNode::image("https://x/1.jpg").is_media());
        assert!(ContentNode::video("https://x/1.mp4", None).is_media());
        assert!(!ContentNode::text("a").is_media());
        assert!(!ContentNode::link("https://x", "x").is_media());
    }
}
