// ABOUTME: Rich-content parsing core for the wayfarer travel app.
// ABOUTME: Re-exports decomposition, media locators, presentation views, and the placeholder round trip.

//! Wayfarer content turns freeform article HTML into typed nodes for a
//! rendering surface that cannot display raw `<video>` or `<iframe>` markup,
//! and round-trips videos through placeholder images for the rich-text editor.
//!
//! # Example
//!
//! ```
//! use wayfarer_content::{parse_html_to_nodes, to_body, to_media_rail, ContentNode};
//!
//! let html = r#"<p>Hello</p><video src="https://cdn/v1.mp4"></video>"#;
//! let nodes = parse_html_to_nodes(html);
//! assert_eq!(to_media_rail(&nodes), vec![ContentNode::video("https://cdn/v1.mp4", None)]);
//! assert_eq!(to_body(&nodes), vec![ContentNode::text("<p>Hello</p>")]);
//! ```

pub mod attrs;
pub mod decompose;
pub mod error;
pub mod locators;
pub mod media;
pub mod models;
pub mod options;
pub mod placeholder;
pub mod present;
pub mod text;

pub use attrs::{extract_attr, is_absolute_url, is_http_url, looks_like_image_url};
pub use decompose::{parse_html_to_nodes, try_parse_html_to_nodes, Decomposer};
pub use error::{ContentError, SentinelKind};
pub use locators::{extract_images, extract_links, extract_videos, extract_videos_with, pick_share_image};
pub use media::{VideoPlatforms, DEFAULT_VIDEO_PLATFORMS};
pub use models::{ContentNode, ImageRef, LinkRef, VideoRef};
pub use options::{DecomposerBuilder, Options, DEFAULT_PLACEHOLDER_STYLE};
pub use placeholder::{
    from_placeholder_html, placeholder_img_tag, to_placeholder_html, PlaceholderEntry,
    PlaceholderTable, PLACEHOLDER_ALT_PREFIX,
};
pub use present::{style_images_for_width, to_body, to_media_rail};
pub use text::{decode_entities, excerpt, strip_tags};
