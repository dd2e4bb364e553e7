use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Text};
use wxm_core::{Config, Exporter, WxmApi, WxmClient, run_export};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "wxm", version, about = "WeatherXM history exporter")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store WeatherXM account credentials in the config file.
    Configure,

    /// List the devices registered to the configured account.
    Devices,

    /// Fetch yesterday's history for every device and export it to a dated
    /// JSON file.
    Export {
        /// Export date (YYYY-MM-DD); the fetch window is [date - 1 day, date].
        /// Defaults to the current local date.
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Devices => devices().await,
            Command::Export { date } => export(date).await,
        }
    }
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let username = Text::new("WeatherXM username (email):").prompt()?;
    let password = Password::new("WeatherXM password:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()?;

    config.set_credentials(username, password);
    config.save()?;

    println!("Credentials saved to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn devices() -> Result<()> {
    let config = Config::load()?;
    let client = WxmClient::new(config.base_url.clone());

    let token = client
        .login(config.credentials()?)
        .await
        .context("Authentication failed")?;
    let devices = client.devices(&token).await.context("Failed to list devices")?;

    if devices.is_empty() {
        println!("No devices found.");
        return Ok(());
    }

    for device in &devices {
        match &device.name {
            Some(name) => println!("{}  {}", device.id, name),
            None => println!("{}", device.id),
        }
    }

    Ok(())
}

async fn export(date: Option<NaiveDate>) -> Result<()> {
    let config = Config::load()?;
    let client = WxmClient::new(config.base_url.clone());
    let exporter = Exporter::new(config.output_dir.clone());

    let today = date.unwrap_or_else(|| Local::now().date_naive());

    let mut stdout = std::io::stdout().lock();
    run_export(&client, &config, &exporter, today, &mut stdout).await?;

    Ok(())
}
