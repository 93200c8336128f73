mod meta;
mod sanitize;

pub use meta::page_image;
pub use sanitize::{clean_text, sanitize, DEFAULT_MAX_CHARS};
