// ABOUTME: Plain-text helpers over markup fragments.
// ABOUTME: Provides tag stripping for link text, entity decoding, and card excerpts.

const NAMED_ENTITIES: &[(&str, &str)] = &[
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&apos;", "'"),
    ("&nbsp;", " "),
    ("&ndash;", "–"),
    ("&mdash;", "—"),
    ("&lsquo;", "\u{2018}"),
    ("&rsquo;", "\u{2019}"),
    ("&ldquo;", "\u{201C}"),
    ("&rdquo;", "\u{201D}"),
    ("&hellip;", "…"),
    ("&middot;", "·"),
    ("&yen;", "¥"),
    ("&copy;", "©"),
];

/// Removes every angle-bracketed tag, decodes entities and collapses whitespace.
///
/// Used for anchor inner text, where nested `<span>`/`<b>` markup would be noise.
pub fn strip_tags(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len());
    let mut in_tag = false;
    let mut chars = fragment.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            // a bare '<' in prose ("a < b") is text, not a tag
            '<' if !in_tag && chars.peek().is_some_and(|&n| starts_tag(n)) => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                // tags separate words: "<p>a</p><p>b</p>" reads "a b"
                out.push(' ');
            }
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }

    collapse_whitespace(&decode_entities(&out))
}

fn starts_tag(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '/' || c == '!'
}

/// Decodes the common named entities plus decimal and hex numeric references.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    // &amp; goes last so "&amp;lt;" stays "&lt;"
    let mut decoded = decode_numeric(s);
    for (entity, replacement) in NAMED_ENTITIES.iter().skip(1) {
        decoded = decoded.replace(entity, replacement);
    }
    decoded.replace(NAMED_ENTITIES[0].0, NAMED_ENTITIES[0].1)
}

fn decode_numeric(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(start) = rest.find("&#") {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 2..];
        let (digits, radix) = match tail.strip_prefix(['x', 'X']) {
            Some(hex) => (hex, 16),
            None => (tail, 10),
        };
        let len = digits
            .find(|c: char| !c.is_digit(radix))
            .unwrap_or(digits.len());
        let decoded = if len > 0 && digits[len..].starts_with(';') {
            u32::from_str_radix(&digits[..len], radix)
                .ok()
                .and_then(char::from_u32)
        } else {
            None
        };

        match decoded {
            Some(c) => {
                out.push(c);
                rest = &digits[len + 1..];
            }
            None => {
                out.push_str("&#");
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Collapses runs of whitespace to single spaces and trims the ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Builds a plain-text summary of an article body for cards and share sheets.
///
/// Truncates on a character boundary and appends `…` when the text was cut.
pub fn excerpt(html: &str, max_chars: usize) -> String {
    let plain = strip_tags(html);
    if plain.chars().count() <= max_chars {
        return plain;
    }
    let cut: String = plain.chars().take(max_chars).collect();
    format!("{}…", cut.trim_end())
}
