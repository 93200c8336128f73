use mockito::{Server, ServerGuard};
use recipe_scraper::{
    export, server::routes, view_model::GENERIC_ERROR_MESSAGE, AppConfig, HttpRecipeClient,
    RecipeScraper, RecipeViewModel,
};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;

const PAGE: &str = "<html><body><h1>Layered Pie</h1><p>Crust, filling, glaze.</p></body></html>";

fn gemini_reply(text: &str) -> String {
    json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] }).to_string()
}

/// Start the API on a random local port and return its base URL
async fn spawn_api(gemini: &ServerGuard) -> String {
    let mut config = AppConfig::default();
    config.gemini.api_key = Some("test-key".to_string());
    config.gemini.base_url = gemini.url();
    config.fetch.retry_delay_ms = 0;

    let app = routes(Arc::new(RecipeScraper::new(config).unwrap()));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await });

    format!("http://{}", addr)
}

#[tokio::test]
async fn test_view_model_over_http() {
    let mut site = Server::new_async().await;
    let mut gemini = Server::new_async().await;
    let _page = site
        .mock("GET", "/pie")
        .with_status(200)
        .with_body(PAGE)
        .create_async()
        .await;
    let _model = gemini
        .mock("POST", "/v1beta/models/gemini-1.5-flash:generateContent")
        .with_status(200)
        .with_body(gemini_reply(
            r#"```json
{"title":"Layered Pie","ingredients":["flour","apples","sugar"],
 "components":[
   {"name":"Crust","ingredients":["flour"],"steps":["Mix"]},
   {"name":"Filling","ingredients":["apples"],"steps":["Slice","Cook"]},
   {"name":"Glaze","steps":["Brush"]}]}
```"#,
        ))
        .create_async()
        .await;

    let api = spawn_api(&gemini).await;
    let mut vm = RecipeViewModel::new(HttpRecipeClient::new(api, None).unwrap());
    vm.set_url(format!("{}/pie", site.url()));
    vm.submit().await;

    assert!(vm.error().is_none(), "{:?}", vm.error());
    assert_eq!(vm.recipe().unwrap().components.len(), 3);
    assert!(vm.has_component_ingredients());
    assert_eq!(vm.active_ingredients(), vec!["flour", "apples"]);

    vm.toggle_component(0);
    assert_eq!(vm.active_ingredients(), vec!["apples"]);

    let view = vm.export_view().unwrap();
    let markdown = export::recipe_markdown(&view);
    assert!(markdown.starts_with("# Layered Pie\n"));
    assert!(markdown.contains("### Filling"));
    assert!(!markdown.contains("### Crust"));

    let grocery = export::grocery_list_markdown(&view);
    assert!(grocery.contains("- [ ] apples"));
    assert!(!grocery.contains("- [ ] flour"));

    vm.toggle_component(1);
    assert!(vm.active_ingredients().is_empty());
}

#[tokio::test]
async fn test_view_model_shows_endpoint_message() {
    let mut site = Server::new_async().await;
    let gemini = Server::new_async().await;
    let _page = site
        .mock("GET", "/pie")
        .with_status(403)
        .create_async()
        .await;

    let api = spawn_api(&gemini).await;
    let mut vm = RecipeViewModel::new(HttpRecipeClient::new(api, None).unwrap());
    vm.set_url(format!("{}/pie", site.url()));
    vm.submit().await;

    assert!(!vm.loading());
    assert!(vm.recipe().is_none());
    assert!(vm.error().unwrap().contains("access denied"));
}

#[tokio::test]
async fn test_view_model_unreachable_endpoint() {
    let mut vm = RecipeViewModel::new(HttpRecipeClient::new("http://127.0.0.1:1", None).unwrap());
    vm.set_url("https://example.com/pie");
    vm.submit().await;

    assert_eq!(vm.error(), Some(GENERIC_ERROR_MESSAGE));
    assert!(vm.export_view().is_none());
}
