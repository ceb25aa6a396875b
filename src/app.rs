//! Command implementations wiring config, audio sources and the session.

use crate::audio::source::AudioSource;
use crate::audio::wav::WavAudioSource;
use crate::config::Config;
use crate::error::Result;
use crate::output::TerminalSink;
use crate::session::orchestrator::Session;
use std::io::IsTerminal;
use std::path::Path;

fn terminal_sink(quiet: bool) -> TerminalSink {
    let sink = TerminalSink::new();
    if quiet || !std::io::stdout().is_terminal() {
        sink.plain()
    } else {
        sink
    }
}

/// Live microphone transcription until Ctrl-C.
#[cfg(feature = "cpal-audio")]
pub async fn run_live_command(config: Config, quiet: bool, verbose: u8) -> Result<()> {
    use crate::audio::capture::CpalAudioSource;
    use crate::audio::source::AudioSourceConfig;

    let source = CpalAudioSource::new(&AudioSourceConfig {
        sample_rate: config.session.sample_rate,
        device: config.audio.device.clone(),
    })?;

    if !quiet {
        eprintln!("Listening... press Ctrl-C to stop");
    }

    let mut handle = Session::new(config)
        .verbose(verbose > 0)
        .start(Box::new(source), Box::new(terminal_sink(quiet)))
        .await?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = handle.wait_for_capture() => {}
    }

    handle.stop().await
}

/// Transcribe a WAV file, or stdin when no path is given.
pub async fn run_pipe_command(
    config: Config,
    file: Option<&Path>,
    quiet: bool,
    verbose: u8,
) -> Result<()> {
    let source = match file {
        Some(path) => {
            let file = std::fs::File::open(path)?;
            WavAudioSource::from_reader(Box::new(file))?
        }
        None => WavAudioSource::from_stdin()?,
    };
    run_source(config, Box::new(source), quiet, verbose).await
}

async fn run_source(
    config: Config,
    source: Box<dyn AudioSource>,
    quiet: bool,
    verbose: u8,
) -> Result<()> {
    let mut handle = Session::new(config)
        .verbose(verbose > 0)
        .start(source, Box::new(terminal_sink(quiet)))
        .await?;

    handle.wait_for_capture().await;
    handle.stop().await
}

/// Fetch and render a lesson.
#[cfg(feature = "lesson")]
pub async fn run_lesson_command(config: Config, language: &str, difficulty: &str) -> Result<()> {
    use crate::lesson::LessonClient;
    use owo_colors::OwoColorize;

    let client = LessonClient::new(&config.lesson)?;
    let lesson = client.generate(language, difficulty).await?;

    println!("{}", lesson.title.bold());
    if !lesson.objective.is_empty() {
        println!("{}", lesson.objective);
    }
    if !lesson.vocabulary.is_empty() {
        println!();
        for entry in &lesson.vocabulary {
            println!(
                "  {} {} - {}",
                entry.word.bold(),
                format!("[{}]", entry.pronunciation).dimmed(),
                entry.translation
            );
        }
    }
    if !lesson.cultural_note.is_empty() {
        println!();
        println!("{}", lesson.cultural_note.italic());
    }
    Ok(())
}
