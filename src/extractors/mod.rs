mod llm_json;

pub use self::llm_json::{find_json_object, parse_model_output};
