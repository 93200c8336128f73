use once_cell::sync::Lazy;
use regex::Regex;

/// Default character budget for page text sent to the model
pub const DEFAULT_MAX_CHARS: usize = 50_000;

static SCRIPT_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").unwrap());
static STYLE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").unwrap());
static NOSCRIPT_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<noscript\b[^>]*>.*?</noscript\s*>").unwrap());
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Reduce an HTML page to plain text for the model.
///
/// Script, style and noscript blocks are dropped with their content, every
/// other tag becomes a space, entities are decoded, whitespace is collapsed,
/// and the result is cut to `max_chars` characters.
pub fn sanitize(html: &str, max_chars: usize) -> String {
    let text = SCRIPT_BLOCK.replace_all(html, " ");
    let text = STYLE_BLOCK.replace_all(&text, " ");
    let text = NOSCRIPT_BLOCK.replace_all(&text, " ");
    let text = TAG.replace_all(&text, " ");

    // Decoding can turn `&lt;b&gt;` back into a tag
    let decoded = html_escape::decode_html_entities(&text);
    let text = TAG.replace_all(&decoded, " ");

    let text = WHITESPACE.replace_all(&text, " ");
    truncate_chars(text.trim(), max_chars).to_string()
}

/// Remove stray tags from a single line of model output.
pub fn clean_text(text: &str) -> String {
    TAG.replace_all(text, "").into_owned()
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].trim_end(),
        None => text,
    }
}
