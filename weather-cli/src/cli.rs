use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{InquireError, Password, PasswordDisplayMode, Select, Text};
use tracing::{debug, info};
use weather_core::{
    ClockZone, Config, ConfigOverrides, DisplayModel, Session, Units, provider_from_config,
};

use crate::render::{RenderOptions, render};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "weather-widget",
    version,
    about = "Current weather, hourly forecast and map link for a city"
)]
pub struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// OpenWeather API key; overrides the config file.
    #[arg(long, global = true, env = "OPENWEATHER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Unit system: standard, metric or imperial. Upstream default when omitted.
    #[arg(long, global = true, value_parser = parse_units)]
    pub units: Option<Units>,

    /// Time zone for displayed times: local or location.
    #[arg(long, global = true, value_parser = parse_clock)]
    pub clock: Option<ClockZone>,

    /// Override the API base URL.
    #[arg(long, global = true, hide = true)]
    pub api_base: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key, default city and units in the config file.
    Configure,

    /// Show weather for a city once and exit.
    Show {
        /// City name.
        city: String,
    },

    /// Prompt for cities repeatedly (default). Esc or Ctrl-C quits.
    Interactive {
        /// City searched at startup; falls back to `default_city` from config.
        #[arg(long)]
        city: Option<String>,
    },
}

fn parse_units(value: &str) -> Result<Units, String> {
    Units::try_from(value).map_err(|e| e.to_string())
}

fn parse_clock(value: &str) -> Result<ClockZone, String> {
    match value.to_lowercase().as_str() {
        "local" => Ok(ClockZone::Local),
        "location" => Ok(ClockZone::Location),
        _ => Err(format!("Unknown clock '{value}'. Supported: local, location.")),
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let overrides = ConfigOverrides {
            api_key: self.api_key,
            units: self.units,
            clock: self.clock,
            api_base: self.api_base,
            ..ConfigOverrides::default()
        };

        match self.command.unwrap_or(Command::Interactive { city: None }) {
            Command::Configure => configure().await,
            Command::Show { city } => {
                let config = load_config(overrides)?;
                show(&config, &city).await
            }
            Command::Interactive { city } => {
                let config = load_config(ConfigOverrides {
                    default_city: city,
                    ..overrides
                })?;
                interactive(&config).await
            }
        }
    }
}

fn load_config(overrides: ConfigOverrides) -> anyhow::Result<Config> {
    let config = Config::load()?.apply_overrides(overrides);
    debug!(?config, "Resolved configuration");
    Ok(config)
}

fn render_options(config: &Config) -> RenderOptions {
    RenderOptions {
        units: config.units,
        clock: config.clock,
    }
}

fn print_model(model: &DisplayModel, config: &Config) {
    println!("{}", render(model, render_options(config)));
}

async fn show(config: &Config, city: &str) -> anyhow::Result<()> {
    let mut session = Session::new(provider_from_config(config)?);
    let model = session.search(city).await;
    print_model(model, config);
    Ok(())
}

async fn interactive(config: &Config) -> anyhow::Result<()> {
    let mut session = Session::new(provider_from_config(config)?);

    match config.startup_city() {
        Some(city) => {
            info!(city, "Startup search");
            session.search(city).await;
        }
        None => debug!("No startup city configured"),
    }
    print_model(session.model(), config);

    loop {
        let Some(city) = prompt_city().await? else {
            break;
        };
        session.submit(city);
        session.settle().await;
        print_model(session.model(), config);
    }

    Ok(())
}

/// `None` when the user cancels the prompt.
async fn prompt_city() -> anyhow::Result<Option<String>> {
    let answer = tokio::task::spawn_blocking(|| {
        Text::new("City:")
            .with_help_message("Esc or Ctrl-C to quit")
            .prompt()
    })
    .await
    .context("Prompt task failed")?;

    match answer {
        Ok(city) => Ok(Some(city)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(err) => Err(err).context("Failed to read city"),
    }
}

async fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let updated = tokio::task::spawn_blocking(move || -> anyhow::Result<Config> {
        let key_help = if config.api_key.is_some() {
            "Leave empty to keep the current key"
        } else {
            "Get one at https://openweathermap.org/api"
        };
        let api_key = Password::new("OpenWeather API key:")
            .with_display_mode(PasswordDisplayMode::Masked)
            .without_confirmation()
            .with_help_message(key_help)
            .prompt()?;
        if !api_key.trim().is_empty() {
            config.api_key = Some(api_key.trim().to_string());
        }

        let city = Text::new("Default city (optional):")
            .with_default(config.default_city.as_deref().unwrap_or(""))
            .prompt()?;
        config.default_city = Some(city.trim().to_string()).filter(|c| !c.is_empty());

        let mut choices = vec!["upstream default"];
        choices.extend(Units::all().iter().map(Units::as_str));
        let units = Select::new("Units:", choices).prompt()?;
        config.units = Units::try_from(units).ok();

        Ok(config)
    })
    .await
    .context("Configuration prompt task failed")??;

    updated.require_api_key()?;
    let path = updated.save()?;
    info!(path = %path.display(), "Saved configuration");
    println!("Configuration saved to {}", path.display());

    Ok(())
}
