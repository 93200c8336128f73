mod request;

pub use request::{looks_like_recipe_page, FetchStrategy, RequestFetcher};
