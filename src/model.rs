use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ScrapeError;

/// Component name used when the model gives none
pub const DEFAULT_COMPONENT_NAME: &str = "Instructions";

/// A named part of a recipe ("Crust", "Filling", ...) with its own steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeComponent {
    pub name: String,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ingredients: Vec<String>,
}

impl RecipeComponent {
    /// The component kept when a recipe has no usable steps at all
    pub fn placeholder() -> Self {
        RecipeComponent {
            name: DEFAULT_COMPONENT_NAME.to_string(),
            steps: Vec::new(),
            ingredients: Vec::new(),
        }
    }
}

/// The canonical recipe returned by the scrape endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub components: Vec<RecipeComponent>,
    pub url: String,
}

impl Recipe {
    /// Build a normalized recipe from the model's JSON output.
    ///
    /// `title`, `ingredients` and `components` must be present. The source
    /// `url` always replaces whatever the model returned.
    pub fn from_model_json(value: &Value, url: &str) -> Result<Self, ScrapeError> {
        let object = value
            .as_object()
            .ok_or_else(|| invalid_structure("expected a JSON object"))?;

        let title = object
            .get("title")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .ok_or_else(|| invalid_structure("missing title"))?;

        let ingredients = object
            .get("ingredients")
            .and_then(string_list)
            .ok_or_else(|| invalid_structure("missing ingredients"))?;

        let components = object
            .get("components")
            .and_then(Value::as_array)
            .ok_or_else(|| invalid_structure("missing components"))?
            .iter()
            .filter_map(component_from_value)
            .collect();

        let recipe = Recipe {
            title: title.to_string(),
            description: optional_text(object.get("description")),
            image: optional_text(object.get("image")),
            ingredients,
            components,
            url: url.to_string(),
        };

        Ok(recipe.normalize())
    }

    /// Apply the canonical cleanup rules. Idempotent.
    pub fn normalize(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.ingredients = non_blank(self.ingredients);
        self.components = normalize_components(self.components);
        self
    }

    /// True when at least one component carries its own ingredients
    pub fn has_component_ingredients(&self) -> bool {
        self.components.iter().any(|c| !c.ingredients.is_empty())
    }
}

fn normalize_components(components: Vec<RecipeComponent>) -> Vec<RecipeComponent> {
    let kept: Vec<RecipeComponent> = components
        .into_iter()
        .map(|component| {
            let name = component.name.trim();
            RecipeComponent {
                name: if name.is_empty() {
                    DEFAULT_COMPONENT_NAME.to_string()
                } else {
                    name.to_string()
                },
                steps: non_blank(component.steps),
                ingredients: non_blank(component.ingredients),
            }
        })
        .filter(|component| !component.steps.is_empty())
        .collect();

    if kept.is_empty() {
        vec![RecipeComponent::placeholder()]
    } else {
        kept
    }
}

fn non_blank(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .filter(|item| !item.trim().is_empty())
        .collect()
}

fn invalid_structure(detail: &str) -> ScrapeError {
    ScrapeError::Validation(format!("Invalid recipe structure: {}", detail))
}

/// Strings of a JSON array; other entries are skipped
fn string_list(value: &Value) -> Option<Vec<String>> {
    value.as_array().map(|items| {
        items
            .iter()
            .filter_map(|item| item.as_str().map(String::from))
            .collect()
    })
}

fn optional_text(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => s.as_str(),
        // Models sometimes return the image as a list of URLs
        Value::Array(items) => items.iter().find_map(Value::as_str)?,
        _ => return None,
    };
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn component_from_value(value: &Value) -> Option<RecipeComponent> {
    let object = value.as_object()?;
    Some(RecipeComponent {
        name: object
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        steps: object.get("steps").and_then(string_list).unwrap_or_default(),
        ingredients: object
            .get("ingredients")
            .and_then(string_list)
            .unwrap_or_default(),
    })
}
