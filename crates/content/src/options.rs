// ABOUTME: Configuration for the decomposer, including Options and DecomposerBuilder.
// ABOUTME: DecomposerBuilder provides a fluent API for constructing Decomposer instances.

use crate::decompose::Decomposer;
use crate::error::ContentError;
use crate::media::{VideoPlatforms, DEFAULT_VIDEO_PLATFORMS};

/// Inline style shared by placeholder `<img>` tags and restored `<video>` tags.
pub const DEFAULT_PLACEHOLDER_STYLE: &str = "max-width:100%;margin:12px 0;";

/// Configuration options for a [`Decomposer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Iframe hosts recognized as video players.
    pub video_platforms: Vec<String>,
    /// CSS `max-width` injected into images left inline inside text nodes.
    pub inline_image_max_width: String,
    pub placeholder_style: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            video_platforms: DEFAULT_VIDEO_PLATFORMS
                .iter()
                .map(|h| h.to_string())
                .collect(),
            inline_image_max_width: "100%".to_string(),
            placeholder_style: DEFAULT_PLACEHOLDER_STYLE.to_string(),
        }
    }
}

/// Builder for constructing Decomposer instances with custom configuration.
#[derive(Debug, Clone)]
pub struct DecomposerBuilder {
    opts: Options,
}

impl DecomposerBuilder {
    /// Create a new DecomposerBuilder with default options.
    pub fn new() -> Self {
        Self {
            opts: Options::default(),
        }
    }

    /// Replace the iframe host allow-list.
    pub fn video_platforms<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.opts.video_platforms = hosts.into_iter().map(Into::into).collect();
        self
    }

    /// Add one host to the allow-list.
    pub fn video_platform(mut self, host: impl Into<String>) -> Self {
        self.opts.video_platforms.push(host.into());
        self
    }

    /// Set the CSS max-width for images left inside text nodes.
    pub fn inline_image_max_width(mut self, max_width: impl Into<String>) -> Self {
        self.opts.inline_image_max_width = max_width.into();
        self
    }

    /// Set the inline style used by the placeholder transform.
    pub fn placeholder_style(mut self, style: impl Into<String>) -> Self {
        self.opts.placeholder_style = style.into();
        self
    }

    /// Build the Decomposer, compiling the host allow-list.
    pub fn build(self) -> Result<Decomposer, ContentError> {
        let platforms = VideoPlatforms::new(self.opts.video_platforms.iter().cloned())?;
        Ok(Decomposer::new(self.opts, platforms))
    }
}

impl Default for DecomposerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = Options::default();
        assert_eq!(opts.video_platforms.len(), DEFAULT_VIDEO_PLATFORMS.len());
        assert_eq!(opts.inline_image_max_width, "100%");
        assert_eq!(opts.placeholder_style, DEFAULT_PLACEHOLDER_STYLE);
    }

    #[test]
    fn test_builder_overrides() {
        let decomposer = DecomposerBuilder::new()
            .video_platforms(["example.tv"])
            .video_platform("clips.example.org")
            .inline_image_max_width("320px")
            .build()
            .unwrap();
        let opts = decomposer.options();
        assert_eq!(opts.video_platforms, vec!["example.tv", "clips.example.org"]);
        assert_eq!(opts.inline_image_max_width, "320px");
    }
}
