use anyhow::Context;
use clap::{Parser, Subcommand};
use clima_core::{
    Config, HomeView, Navigation, ResultView, Route, Router, SearchForm, WeatherProvider,
    config::DEFAULT_BASE_URL, provider_from_config,
};
use inquire::{Password, PasswordDisplayMode, Text};
use tracing::debug;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "clima", version, about = "Current weather for a city, from weatherapi.com")]
pub struct Cli {
    /// weatherapi.com API key; overrides the config file.
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Upstream base URL; overrides the config file.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Print debug logs to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Without a subcommand, start the interactive search.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the weatherapi.com API key in the config file.
    Configure,

    /// Search for a location and show its current weather.
    Show {
        /// City or location name, e.g. "London" or "48.8567,2.3508".
        query: String,

        /// Print the weather document as JSON instead of the text view.
        #[arg(long)]
        json: bool,
    },

    /// Open a navigation target such as `/result?q=Paris` or `/home`.
    Open {
        target: String,

        /// Print the weather document as JSON instead of the text view.
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let command = self.command;
        let config = Config::load()?.with_overrides(self.api_key, self.base_url);
        let router = Router::new();

        match command {
            Some(Command::Configure) => configure(config),
            Some(Command::Show { query, json }) => {
                let home = HomeView { form: SearchForm { q: query } };
                open(&router, &config, home.submit(), json).await
            }
            Some(Command::Open { target, json }) => {
                let (_, navigation) = router.navigate(&target)?;
                open(&router, &config, navigation, json).await
            }
            None => interactive(&config).await,
        }
    }
}

/// Render whichever view the navigation routes to.
async fn open(router: &Router, config: &Config, navigation: Navigation, json: bool) -> anyhow::Result<()> {
    let route = router.resolve(&navigation);
    debug!(%navigation, ?route, "opening view");

    match route {
        Route::Home => println!("{}", HomeView::activate(&navigation).render()),
        Route::Result => {
            let mut view = ResultView::new();
            if let Some(pending) = view.begin(&navigation) {
                let provider = provider_from_config(config)?;
                let outcome = provider.current_report(&pending.query).await;
                view.finish(pending.token, outcome);
            }
            print_result(&view, json)?;
        }
    }

    Ok(())
}

/// Home view loop: ask for a location, show the result, ask again.
async fn interactive(config: &Config) -> anyhow::Result<()> {
    let provider = provider_from_config(config)?;
    let mut navigation = Navigation::home();
    let mut view = ResultView::new();

    loop {
        let home = HomeView::activate(&navigation);
        println!("{}", home.render());

        let mut prompt = Text::new("Location:").with_help_message("Esc to quit");
        if !home.form.q.is_empty() {
            prompt = prompt.with_default(&home.form.q);
        }
        let input = prompt.prompt_skippable()?;
        let Some(q) = input.filter(|q| !q.trim().is_empty()) else {
            return Ok(());
        };

        navigation = SearchForm { q }.submit();
        view.activate(&navigation, provider.as_ref()).await;
        print_result(&view, false)?;
    }
}

fn print_result(view: &ResultView, json: bool) -> anyhow::Result<()> {
    match view.weather() {
        Some(report) if json => println!("{}", report.to_json_string_pretty()?),
        _ => println!("{}", view.render()),
    }
    Ok(())
}

fn configure(existing: Config) -> anyhow::Result<()> {
    let api_key = Password::new("weatherapi.com API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()?;

    let base_url = Text::new("Base URL:").with_default(existing.base_url()).prompt()?;
    let base_url = base_url.trim().trim_end_matches('/').to_string();

    let config = Config {
        api_key: Some(api_key.trim().to_string()),
        base_url: (base_url != DEFAULT_BASE_URL).then_some(base_url),
    };
    if config.api_key().is_none() {
        anyhow::bail!("The API key must not be empty.");
    }

    let path = config.save().context("Failed to store configuration")?;
    println!("Saved configuration to {}", path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_show_with_json_flag() {
        let cli = Cli::try_parse_from(["clima", "show", "New York", "--json"]).unwrap();

        match cli.command {
            Some(Command::Show { query, json }) => {
                assert_eq!(query, "New York");
                assert!(json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_overrides_after_subcommand() {
        let cli = Cli::try_parse_from(["clima", "open", "/result?q=Oslo", "--api-key", "K", "-v"])
            .unwrap();

        assert_eq!(cli.api_key.as_deref(), Some("K"));
        assert!(cli.verbose);
        assert!(matches!(cli.command, Some(Command::Open { ref target, json: false }) if target == "/result?q=Oslo"));
    }

    #[test]
    fn no_subcommand_means_interactive() {
        let cli = Cli::try_parse_from(["clima"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn show_requires_a_query() {
        assert!(Cli::try_parse_from(["clima", "show"]).is_err());
    }
}
