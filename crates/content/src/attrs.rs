// ABOUTME: Attribute extraction from raw tag text and URL shape checks.
// ABOUTME: Resolves preferred attributes (data-original over src) and rejects video-looking posters.

use aho_corasick::{AhoCorasick, AhoCorasickBuilder};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Extensions that mark a URL as video, even when it sits in an image slot.
const VIDEO_EXTENSIONS: &[&str] = &[
    ".mp4", ".mov", ".avi", ".mkv", ".webm", ".flv", ".f4v", ".m3u8",
];

const IMAGE_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".webp", ".bmp", ".svg", ".avif", ".heic", ".ico",
];

// name="value" or name='value'; unquoted values are ignored
static ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)([^\s"'=<>/]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

static VIDEO_EXT_MATCHER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasickBuilder::new()
        .ascii_case_insensitive(true)
        .build(VIDEO_EXTENSIONS)
        .unwrap()
});

static IMAGE_EXT_MATCHER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasickBuilder::new()
        .ascii_case_insensitive(true)
        .build(IMAGE_EXTENSIONS)
        .unwrap()
});

/// Extracts the value of the first attribute in `names` that carries a
/// non-empty quoted value.
///
/// `attrs` is the raw text between a tag's name and its closing `>`. Names are
/// matched case-insensitively and tried in preference order, so
/// `["data-original", "src"]` picks the lazy-load original over the thumbnail.
/// Returns None when none of the names is present.
pub fn extract_attr(attrs: &str, names: &[&str]) -> Option<String> {
    let pairs: Vec<(&str, &str)> = ATTR_RE
        .captures_iter(attrs)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str();
            let value = caps.get(2).or_else(|| caps.get(3))?.as_str();
            Some((name, value))
        })
        .collect();

    names.iter().find_map(|wanted| {
        pairs
            .iter()
            .filter(|(name, _)| name.eq_ignore_ascii_case(wanted))
            .map(|(_, value)| value.trim())
            .find(|value| !value.is_empty())
            .map(str::to_string)
    })
}

/// Returns true for `http://`, `https://` and protocol-relative `//` URLs.
pub fn is_absolute_url(url: &str) -> bool {
    let url = url.trim();
    starts_with_ignore_case(url, "http://")
        || starts_with_ignore_case(url, "https://")
        || url.starts_with("//")
}

/// Returns true only for `http://` and `https://` URLs.
pub fn is_http_url(url: &str) -> bool {
    let url = url.trim();
    starts_with_ignore_case(url, "http://") || starts_with_ignore_case(url, "https://")
}

/// Heuristic check that a URL points at an image.
///
/// A video extension anywhere in the path always rejects. A known image
/// extension accepts, and anything else is accepted too since generated image
/// endpoints often have no extension.
pub fn looks_like_image_url(url: &str) -> bool {
    let url = url.trim();
    if url.is_empty() {
        return false;
    }
    if starts_with_ignore_case(url, "data:") {
        return starts_with_ignore_case(url, "data:image/");
    }

    let path = url_path(url);
    if VIDEO_EXT_MATCHER.is_match(path.as_str()) {
        return false;
    }
    if IMAGE_EXT_MATCHER.is_match(path.as_str()) {
        return true;
    }
    true
}

/// Path portion of a URL, without query or fragment.
fn url_path(url: &str) -> String {
    let parsed = if url.starts_with("//") {
        Url::parse(&format!("https:{}", url))
    } else {
        Url::parse(url)
    };
    match parsed {
        Ok(u) if u.has_host() => u.path().to_string(),
        _ => url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.len() >= prefix.len()
        && s.is_char_boundary(prefix.len())
        && s[..prefix.len()].eq_ignore_ascii_case(prefix)
}
