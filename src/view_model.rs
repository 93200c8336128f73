use std::collections::BTreeMap;

use log::{info, warn};

use crate::client::RecipeSource;
use crate::model::{Recipe, RecipeComponent};

/// Shown when the endpoint gives no message of its own
pub const GENERIC_ERROR_MESSAGE: &str = "Failed to load recipe. Ensure the URL is valid.";

/// Visibility flag per component index. Missing indices count as visible.
pub type ComponentVisibility = BTreeMap<usize, bool>;

/// Client-side state for one recipe form.
///
/// Holds the submitted URL, request status and the loaded recipe, and
/// derives the ingredient and step views from which components are toggled on.
pub struct RecipeViewModel<S> {
    source: S,
    pub url: String,
    loading: bool,
    error: Option<String>,
    recipe: Option<Recipe>,
    visibility: ComponentVisibility,
}

impl<S: RecipeSource> RecipeViewModel<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            url: String::new(),
            loading: false,
            error: None,
            recipe: None,
            visibility: ComponentVisibility::new(),
        }
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn recipe(&self) -> Option<&Recipe> {
        self.recipe.as_ref()
    }

    pub fn visibility(&self) -> &ComponentVisibility {
        &self.visibility
    }

    /// Scrape the current URL. Failures end up in [`Self::error`].
    pub async fn submit(&mut self) {
        self.loading = true;
        self.error = None;
        self.recipe = None;
        self.visibility.clear();

        let result = self.source.scrape(&self.url).await;
        match result {
            Ok(recipe) => {
                info!("Loaded '{}' from {}", recipe.title, self.url);
                self.visibility = (0..recipe.components.len()).map(|i| (i, true)).collect();
                self.recipe = Some(recipe);
            }
            Err(e) => {
                warn!("Scrape of {} failed: {}", self.url, e);
                self.error = Some(
                    e.status_message()
                        .unwrap_or(GENERIC_ERROR_MESSAGE)
                        .to_string(),
                );
            }
        }

        self.loading = false;
    }

    /// Flip one component. Ignored for indices outside the loaded recipe.
    pub fn toggle_component(&mut self, index: usize) {
        if index >= self.component_count() {
            return;
        }
        let visible = self.is_visible(index);
        self.visibility.insert(index, !visible);
    }

    pub fn select_all(&mut self) {
        self.set_all(true);
    }

    pub fn deselect_all(&mut self) {
        self.set_all(false);
    }

    fn set_all(&mut self, visible: bool) {
        for index in 0..self.component_count() {
            self.visibility.insert(index, visible);
        }
    }

    fn component_count(&self) -> usize {
        self.recipe.as_ref().map_or(0, |r| r.components.len())
    }

    pub fn is_visible(&self, index: usize) -> bool {
        self.visibility.get(&index).copied().unwrap_or(true)
    }

    pub fn has_component_ingredients(&self) -> bool {
        self.recipe
            .as_ref()
            .is_some_and(Recipe::has_component_ingredients)
    }

    /// Ingredients of the visible components, or the recipe's own list when
    /// no component carries ingredients.
    pub fn active_ingredients(&self) -> Vec<&str> {
        let Some(recipe) = &self.recipe else {
            return Vec::new();
        };

        if recipe.has_component_ingredients() {
            self.active_components()
                .into_iter()
                .flat_map(|c| c.ingredients.iter().map(String::as_str))
                .collect()
        } else {
            recipe.ingredients.iter().map(String::as_str).collect()
        }
    }

    pub fn active_components(&self) -> Vec<&RecipeComponent> {
        self.recipe
            .iter()
            .flat_map(|r| r.components.iter().enumerate())
            .filter(|(index, _)| self.is_visible(*index))
            .map(|(_, component)| component)
            .collect()
    }

    /// Snapshot of the current views for the export formatters
    pub fn export_view(&self) -> Option<ExportView<'_>> {
        let recipe = self.recipe.as_ref()?;
        Some(ExportView {
            recipe,
            components: self.active_components(),
            ingredients: self.active_ingredients(),
            has_component_ingredients: recipe.has_component_ingredients(),
        })
    }
}

/// A recipe together with the views derived from component visibility
#[derive(Debug, Clone)]
pub struct ExportView<'a> {
    pub recipe: &'a Recipe,
    pub components: Vec<&'a RecipeComponent>,
    pub ingredients: Vec<&'a str>,
    pub has_component_ingredients: bool,
}
