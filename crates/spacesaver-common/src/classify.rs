//! Filename classification: a pure, never-failing parse from a release
//! filename into declared stream metadata, plus a human-readable title
//! cleaner.
//!
//! Both functions only ever look at the string they're given; neither reads
//! the filesystem nor probes the file itself. Each field of [`Declared`]
//! parses independently, so a miss on one token never drags another field
//! down to `"Unknown"`.

const UNKNOWN: &str = "Unknown";

/// Declared (filename-derived) stream metadata. Mirrors the `DECLARED`
/// metadata row fields the Scanner writes: every field defaults to
/// `"Unknown"` (or `0.0` for `framerate`) rather than failing.
#[derive(Debug, Clone, PartialEq)]
pub struct Declared {
    pub codec: String,
    pub format: String,
    pub sar: String,
    pub dar: String,
    pub resolution: String,
    pub framerate: String,
}

impl Default for Declared {
    fn default() -> Self {
        Self {
            codec: UNKNOWN.to_string(),
            format: UNKNOWN.to_string(),
            sar: UNKNOWN.to_string(),
            dar: UNKNOWN.to_string(),
            resolution: UNKNOWN.to_string(),
            framerate: "0.0".to_string(),
        }
    }
}

const CODEC_TOKENS: &[(&str, &str)] = &[
    ("x265", "h265"),
    ("h.265", "h265"),
    ("h265", "h265"),
    ("hevc", "hevc"),
    ("x264", "h264"),
    ("h.264", "h264"),
    ("h264", "h264"),
    ("avc", "avc"),
    ("av1", "av1"),
    ("vp9", "vp9"),
    ("vp8", "vp8"),
    ("xvid", "xvid"),
    ("divx", "divx"),
];

const RESOLUTION_TOKENS: &[(&str, &str)] = &[
    ("2160p", "3840x2160"),
    ("4k", "3840x2160"),
    ("uhd", "3840x2160"),
    ("1080p", "1920x1080"),
    ("1080i", "1920x1080"),
    ("720p", "1280x720"),
    ("576p", "720x576"),
    ("480p", "720x480"),
];

const FORMAT_TOKENS: &[&str] = &[
    "hdr10+", "hdr10", "hdr", "dolby vision", "dv", "hlg", "10bit", "12bit", "8bit",
];

/// Lowercase, and replace the common release separators (`.`, `_`, `-`) with
/// spaces, so token matching can work on word boundaries uniformly.
fn normalise_for_tokens(filename: &str) -> String {
    filename
        .to_lowercase()
        .chars()
        .map(|c| if c == '.' || c == '_' || c == '-' { ' ' } else { c })
        .collect()
}

fn find_first_token<'a>(haystack: &str, tokens: &[&'a str]) -> Option<&'a str> {
    tokens.iter().copied().find(|t| haystack.contains(t))
}

/// Classify a release filename into declared stream metadata. Never panics,
/// never returns a `Result` — a field that fails to parse is left
/// `"Unknown"` without affecting the others.
#[must_use]
pub fn classify(filename: &str) -> Declared {
    // Codec tokens (`h.265`) and the framerate token rely on the literal
    // dot, so they match against a lowercase-only copy; resolution/format
    // tokens are plain words and match against the separator-normalised copy.
    let lower = filename.to_lowercase();
    let normalised = normalise_for_tokens(filename);
    let mut out = Declared::default();

    if let Some((_, canonical)) = CODEC_TOKENS.iter().find(|(tok, _)| lower.contains(tok)) {
        out.codec = (*canonical).to_string();
    }

    if let Some((_, canonical)) = RESOLUTION_TOKENS.iter().find(|(tok, _)| normalised.contains(tok)) {
        out.resolution = (*canonical).to_string();
    }

    let format_tokens: Vec<&str> =
        find_first_token(&normalised, FORMAT_TOKENS).into_iter().collect();
    if !format_tokens.is_empty() {
        out.format = format_tokens.join(",");
    }

    if let Some(fps) = parse_framerate_token(&lower) {
        out.framerate = fps;
    }

    out
}

/// Match a `NN[.NN] fps` token, e.g. `23.976fps` or `24 fps`.
fn parse_framerate_token(normalised: &str) -> Option<String> {
    let bytes = normalised.as_bytes();
    let fps_pos = normalised.find("fps")?;

    let mut start = fps_pos;
    // Walk back over an optional space, then digits and at most one dot.
    while start > 0 && bytes[start - 1] == b' ' {
        start -= 1;
    }
    let digits_end = start;
    let mut dot_seen = false;
    while start > 0 {
        let c = bytes[start - 1];
        if c.is_ascii_digit() {
            start -= 1;
        } else if c == b'.' && !dot_seen {
            dot_seen = true;
            start -= 1;
        } else {
            break;
        }
    }
    if start == digits_end {
        return None;
    }
    let candidate = normalised[start..digits_end].trim();
    candidate.parse::<f64>().ok().map(|v| v.to_string())
}

/// Junk tokens stripped when no year is found to truncate at: resolution,
/// HDR, source, codec, audio-codec, release-type, and known group names.
const JUNK_TOKENS: &[&str] = &[
    "2160p", "1080p", "1080i", "720p", "576p", "480p", "4k", "uhd",
    "hdr10+", "hdr10", "hdr", "dolby vision", "dv", "hlg", "10bit", "12bit", "8bit",
    "bluray", "webrip", "webdl", "web", "dl", "hdtv", "dvdrip", "brrip",
    "x265", "x264", "h265", "h264", "hevc", "avc", "xvid", "divx",
    "aac", "ac3", "dts", "truehd", "flac", "atmos",
    "proper", "repack", "extended", "remastered", "uncut", "unrated",
    "yify", "rarbg", "ettv", "eztv", "sparks", "ntb", "fgt",
];

/// Strip a leading `www.example.com`/`example.tv`-style scene watermark or a
/// `Group - ` leading tag.
fn strip_leading_watermark(s: &str) -> &str {
    let trimmed = s.trim_start();
    if let Some(rest) = trimmed.strip_prefix("www.") {
        if let Some(space_idx) = rest.find(' ') {
            return rest[space_idx..].trim_start();
        }
    }
    if let Some(dash_idx) = trimmed.find(" - ") {
        let prefix = &trimmed[..dash_idx];
        if prefix.len() <= 20 && !prefix.chars().any(char::is_whitespace) {
            return trimmed[dash_idx + 3..].trim_start();
        }
    }
    trimmed
}

/// Strip bracketed groups: `[...]`, `(...)` once a year truncation hasn't
/// already removed them, `{...}`.
fn strip_bracketed(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut depth_square = 0i32;
    let mut depth_curly = 0i32;
    for c in s.chars() {
        match c {
            '[' => depth_square += 1,
            ']' => depth_square = (depth_square - 1).max(0),
            '{' => depth_curly += 1,
            '}' => depth_curly = (depth_curly - 1).max(0),
            _ if depth_square > 0 || depth_curly > 0 => {}
            _ => out.push(c),
        }
    }
    out
}

fn find_year_token(words: &[&str]) -> Option<usize> {
    words.iter().position(|w| {
        let digits: String = w.chars().filter(|c| c.is_ascii_digit()).collect();
        digits.len() == 4
            && digits.starts_with(['1', '2'])
            && digits.parse::<u32>().map(|y| (1900..=2099).contains(&y)).unwrap_or(false)
    })
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Derive a clean, human-readable title from a release filename.
///
/// Strips watermarks and bracketed groups, normalises separators to spaces,
/// then either truncates at the first year token or, absent one, strips a
/// broad junk-token set. The result is title-cased and bounded to 120 chars.
/// Idempotent: re-running it on its own output is a no-op, because the
/// output never contains a stripped token and is already title-cased.
#[must_use]
pub fn clean_name(filename: &str) -> String {
    let without_ext = match filename.rfind('.') {
        Some(idx) if idx > 0 && filename.len() - idx <= 5 => &filename[..idx],
        _ => filename,
    };

    let watermark_stripped = strip_leading_watermark(without_ext);
    let bracket_stripped = strip_bracketed(watermark_stripped);

    let spaced: String = bracket_stripped
        .chars()
        .map(|c| if c == '.' || c == '_' || c == '-' { ' ' } else { c })
        .collect();

    let words: Vec<&str> = spaced.split_whitespace().collect();

    let kept: Vec<&str> = if let Some(year_idx) = find_year_token(&words) {
        words[..year_idx].to_vec()
    } else {
        words
            .into_iter()
            .filter(|w| {
                let lw = w.to_lowercase();
                !JUNK_TOKENS.iter().any(|junk| lw == *junk)
            })
            .collect()
    };

    let joined = kept.join(" ");
    let collapsed: String = joined.split_whitespace().collect::<Vec<_>>().join(" ");
    let titled = title_case(&collapsed);

    bound_length(&titled, 120)
}

/// Truncate to at most `max_len` bytes, preferring the last word boundary so
/// a multi-byte char or a word is never split mid-way.
fn bound_length(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    let truncated = &s[..end];
    match truncated.rfind(' ') {
        Some(space_idx) if space_idx > 0 => truncated[..space_idx].to_string(),
        _ => truncated.to_string(),
    }
}
