//! Markdown and printable HTML renderings of a loaded recipe.
//!
//! All functions take an [`ExportView`], so they only see the components and
//! ingredients currently toggled on.

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::model::RecipeComponent;
use crate::url_to_text::html::clean_text;
use crate::view_model::ExportView;

fn numbered_steps(steps: &[String]) -> String {
    steps
        .iter()
        .enumerate()
        .map(|(i, step)| format!("{}. {}", i + 1, clean_text(step)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn bullets(items: &[impl AsRef<str>]) -> String {
    items
        .iter()
        .map(|item| format!("- {}", item.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The recipe as a Markdown document
pub fn recipe_markdown(view: &ExportView<'_>) -> String {
    let mut md = format!("# {}\n\n", view.recipe.title);

    if view.has_component_ingredients && !view.components.is_empty() {
        for component in &view.components {
            md.push_str(&format!("### {}\n\n", component.name));
            if !component.ingredients.is_empty() {
                md.push_str(&format!(
                    "#### Ingredients\n{}\n\n",
                    bullets(component.ingredients.as_slice())
                ));
            }
            md.push_str(&format!(
                "#### Instructions\n{}\n\n",
                numbered_steps(&component.steps)
            ));
        }
    } else {
        md.push_str(&format!("## Ingredients\n{}\n\n", bullets(view.ingredients.as_slice())));
        md.push_str("## Instructions\n");
        for component in &view.components {
            md.push_str(&format!(
                "### {}\n\n{}\n\n",
                component.name,
                numbered_steps(&component.steps)
            ));
        }
    }

    md.push_str(&format!("\n[Source]({})", view.recipe.url));
    md
}

/// Shopping list sections: one per component with ingredients, or a single
/// "Ingredients" section built from the active ingredient list.
fn grocery_sections<'a>(view: &'a ExportView<'a>) -> Vec<(&'a str, Vec<&'a str>)> {
    if view.has_component_ingredients && !view.components.is_empty() {
        view.components
            .iter()
            .filter(|c| !c.ingredients.is_empty())
            .map(|c: &&RecipeComponent| {
                (
                    c.name.as_str(),
                    c.ingredients.iter().map(String::as_str).collect(),
                )
            })
            .collect()
    } else {
        vec![("Ingredients", view.ingredients.clone())]
    }
}

/// A Markdown checklist of the ingredients to buy
pub fn grocery_list_markdown(view: &ExportView<'_>) -> String {
    let mut md = format!("# Grocery List: {}\n\n", view.recipe.title);
    let grouped = view.has_component_ingredients && !view.components.is_empty();

    for (name, ingredients) in grocery_sections(view) {
        if grouped {
            md.push_str(&format!("## {}\n\n", name));
        }
        for ingredient in &ingredients {
            md.push_str(&format!("- [ ] {}\n", ingredient));
        }
        if grouped {
            md.push('\n');
        }
    }

    md.push_str(&format!("\n[Source]({})", view.recipe.url));
    md
}

const PRINT_STYLE: &str = r#"
    @media print {
      @page { margin: 20mm; size: letter; }
      body { background: white; }
    }
    body { font-family: system-ui, sans-serif; max-width: 800px; margin: 0 auto; padding: 20px; color: #1c1917; }
    h1 { font-size: 2rem; font-weight: bold; margin-bottom: 1rem; color: #ea580c; }
    h2 { font-size: 1.5rem; font-weight: bold; margin-top: 1.5rem; margin-bottom: 0.5rem; color: #f97316; }
    ul { list-style: none; padding-left: 0; }
    li { margin: 0.5rem 0; padding: 0.5rem; border-bottom: 1px solid #fde68a; }
    label { display: flex; align-items: center; }
    input[type="checkbox"] { width: 20px; height: 20px; margin-right: 10px; accent-color: #ea580c; }
    span { font-size: 1.1rem; }
    .source { margin-top: 2rem; font-size: 0.9rem; color: #78716c; font-style: italic; }
"#;

/// A printable HTML grocery checklist
pub fn grocery_list_html(view: &ExportView<'_>) -> String {
    let title = encode_text(&view.recipe.title);
    let sections = grocery_sections(view);
    let show_headings = sections.len() > 1;

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>Grocery List: {}</title>\n", title));
    html.push_str(&format!("<style>{}</style>\n", PRINT_STYLE));
    html.push_str("</head>\n<body>\n");
    html.push_str(&format!("<h1>Grocery List: {}</h1>\n", title));

    for (name, ingredients) in &sections {
        if show_headings && *name != "Ingredients" {
            html.push_str(&format!("<h2>{}</h2>\n", encode_text(name)));
        }
        html.push_str("<ul>\n");
        for ingredient in ingredients {
            html.push_str(&format!(
                "<li><label><input type=\"checkbox\"><span>{}</span></label></li>\n",
                encode_text(ingredient)
            ));
        }
        html.push_str("</ul>\n");
    }

    html.push_str(&format!(
        "<p class=\"source\">Source: <a href=\"{}\">{}</a></p>\n",
        encode_double_quoted_attribute(&view.recipe.url),
        encode_text(&view.recipe.url)
    ));
    html.push_str("</body>\n</html>\n");
    html
}
