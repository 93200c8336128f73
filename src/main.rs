use clap::{Parser, Subcommand, ValueEnum};
use log::{error, info};
use std::process::ExitCode;

use recipe_scraper::{export, server, AppConfig, RecipeScraper, RecipeViewModel};

#[derive(Parser, Debug)]
#[command(author, version, about = "Scrape recipe pages into structured recipes")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// Address to listen on, overrides `server.bind`
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Scrape one URL and print the result
    Scrape {
        url: String,

        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,

        /// Component indices to leave out of the output
        #[arg(long, value_name = "INDEX")]
        hide: Vec<usize>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Markdown,
    Grocery,
    GroceryHtml,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let scraper = match RecipeScraper::new(config) {
        Ok(scraper) => scraper,
        Err(e) => {
            error!("Failed to set up scraper: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Command::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| scraper.config().server.bind.clone());
            if let Err(e) = server::serve(scraper, &bind).await {
                error!("Server on {} stopped: {}", bind, e);
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Command::Scrape { url, format, hide } => scrape(scraper, url, format, &hide).await,
    }
}

async fn scrape(scraper: RecipeScraper, url: String, format: Format, hide: &[usize]) -> ExitCode {
    let mut view_model = RecipeViewModel::new(scraper);
    view_model.set_url(url);
    view_model.submit().await;

    if let Some(message) = view_model.error() {
        eprintln!("{}", message);
        return ExitCode::FAILURE;
    }

    for index in hide {
        if view_model.is_visible(*index) {
            view_model.toggle_component(*index);
        }
    }

    let Some(view) = view_model.export_view() else {
        eprintln!("{}", recipe_scraper::view_model::GENERIC_ERROR_MESSAGE);
        return ExitCode::FAILURE;
    };
    info!(
        "Rendering {} of {} components",
        view.components.len(),
        view.recipe.components.len()
    );

    let output = match format {
        Format::Json => match serde_json::to_string_pretty(view.recipe) {
            Ok(json) => json,
            Err(e) => {
                eprintln!("Failed to encode recipe: {}", e);
                return ExitCode::FAILURE;
            }
        },
        Format::Markdown => export::recipe_markdown(&view),
        Format::Grocery => export::grocery_list_markdown(&view),
        Format::GroceryHtml => export::grocery_list_html(&view),
    };
    println!("{}", output);
    ExitCode::SUCCESS
}
