/// The instruction prompt used for extracting recipes from page text.
///
/// The prompt is loaded from `prompt.txt` at compile time using the
/// `include_str!` macro, making it easy to edit without dealing with
/// Rust string syntax.
pub const RECIPE_EXTRACTION_PROMPT: &str = include_str!("prompt.txt");

/// Build the full prompt for one page, embedding its sanitized text.
pub fn build_extraction_prompt(page_text: &str) -> String {
    format!(
        "{}\n\nPage text:\n\"\"\"\n{}\n\"\"\"",
        RECIPE_EXTRACTION_PROMPT, page_text
    )
}
