use anyhow::Result;
use clap::Parser;
use linguastream::cli::{Cli, Commands, ConfigAction};
use linguastream::config::Config;
use std::io::IsTerminal;

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();

    match cli.command.take() {
        None => {
            let config = load_config(&cli)?;
            if cli.file.is_some() || !std::io::stdin().is_terminal() {
                // Pipe mode: WAV data from a file or stdin
                linguastream::app::run_pipe_command(
                    config,
                    cli.file.as_deref(),
                    cli.quiet,
                    cli.verbose,
                )
                .await?;
            } else {
                run_live(config, cli.quiet, cli.verbose).await?;
            }
        }
        Some(Commands::Devices) => {
            list_audio_devices()?;
        }
        Some(Commands::Config { action }) => {
            handle_config_command(action, &cli)?;
        }
        #[cfg(feature = "lesson")]
        Some(Commands::Lesson {
            language,
            difficulty,
        }) => {
            let config = load_config(&cli)?;
            linguastream::app::run_lesson_command(config, &language, &difficulty).await?;
        }
    }

    Ok(())
}

#[cfg(feature = "cpal-audio")]
async fn run_live(config: Config, quiet: bool, verbose: u8) -> Result<()> {
    linguastream::app::run_live_command(config, quiet, verbose).await?;
    Ok(())
}

#[cfg(not(feature = "cpal-audio"))]
async fn run_live(_config: Config, _quiet: bool, _verbose: u8) -> Result<()> {
    anyhow::bail!(
        "This build has no microphone support; pipe WAV data on stdin or use --file"
    );
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/linguastream/config.toml)
/// 3. Built-in defaults with environment variable overrides
///
/// CLI flags override everything.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(path) = cli.config.as_deref() {
        Config::load(path)?
    } else {
        Config::load_or_default(&Config::default_path())?
    };
    config = config.with_env_overrides();

    if let Some(url) = cli.url.clone() {
        config.connection.url = url;
    }
    if let Some(language) = cli.language.clone() {
        config.session.language = Some(language);
    }
    if let Some(device) = cli.device.clone() {
        config.audio.device = Some(device);
    }

    Ok(config)
}

/// List available audio input devices.
#[cfg(feature = "cpal-audio")]
fn list_audio_devices() -> Result<()> {
    let devices = linguastream::audio::capture::CpalAudioSource::list_devices()?;

    if devices.is_empty() {
        eprintln!("No audio input devices found");
        std::process::exit(1);
    }

    println!("Available audio input devices:");
    for (idx, device) in devices.iter().enumerate() {
        println!("  [{}] {}", idx, device);
    }

    Ok(())
}

#[cfg(not(feature = "cpal-audio"))]
fn list_audio_devices() -> Result<()> {
    anyhow::bail!("This build has no microphone support")
}

/// Handle configuration commands.
fn handle_config_command(action: ConfigAction, cli: &Cli) -> Result<()> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(Config::default_path);

    match action {
        ConfigAction::Show => {
            let config = Config::load_or_default(&config_path)?.with_env_overrides();
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Init => {
            if config_path.exists() {
                eprintln!("Config already exists: {}", config_path.display());
                std::process::exit(1);
            }
            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&config_path, toml::to_string_pretty(&Config::default())?)?;
            println!("Wrote {}", config_path.display());
        }
        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
    }
    Ok(())
}
