use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use navix::config::SynthesizerKind;
use navix::voice::{self, LineRecognizer, VoicePreference, select_voice};
use navix::{Config, Daemon, Transcript, resolve};

/// Navix - voice command assistant
#[derive(Parser)]
#[command(name = "navix", version, about)]
struct Cli {
    /// Handle a single listening session, then exit
    #[arg(long)]
    once: bool,

    /// Log URLs instead of opening them (also `NAVIX_DRY_RUN`)
    #[arg(long)]
    dry_run: bool,

    /// Log utterances instead of speaking them
    #[arg(long)]
    silent: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the intent a transcript resolves to
    Resolve {
        /// Transcript text
        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
    },
    /// Print what dispatching a transcript would say and open
    Plan {
        /// Transcript text
        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
    },
    /// List synthesizer voices and mark the one that would be selected
    Voices,
    /// Speak a test phrase with the configured voice and prosody
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,navix=info",
        1 => "info,navix=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if cli.dry_run {
        config.opener.dry_run = true;
    }
    if cli.silent {
        config.voice.synthesizer = SynthesizerKind::Log;
    }
    tracing::debug!(?config, "loaded configuration");

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::Resolve { text } => cmd_resolve(&text.join(" ")),
            Command::Plan { text } => cmd_plan(config, &text.join(" ")),
            Command::Voices => cmd_voices(&config).await,
            Command::TestTts { text } => cmd_test_tts(config, &text).await,
        };
    }

    let daemon = Daemon::from_config(config);
    let mut recognizer = LineRecognizer::stdin();
    eprintln!("Type a command and press Enter (Ctrl-D to quit).");
    daemon.run(&mut recognizer, cli.once).await?;

    Ok(())
}

/// Print the resolved intent as JSON
fn cmd_resolve(text: &str) -> anyhow::Result<()> {
    let intent = resolve(&Transcript::new(text));
    println!("{}", serde_json::to_string_pretty(&intent)?);
    Ok(())
}

/// Print the dispatch plan as JSON without side effects
fn cmd_plan(config: Config, text: &str) -> anyhow::Result<()> {
    let daemon = Daemon::new(
        config,
        Arc::new(voice::LogSynthesizer),
        Arc::new(navix::opener::LogOpener),
    );
    let transcript = Transcript::new(text);
    let intent = resolve(&transcript);
    let plan = daemon.dispatcher().plan(&transcript, &intent);
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}

/// List the synthesizer catalog
async fn cmd_voices(config: &Config) -> anyhow::Result<()> {
    let synthesizer = voice::synthesizer_from_config(&config.voice);
    let catalog = synthesizer.voices().await?;

    if catalog.is_empty() {
        println!("No voices reported by {}", synthesizer.id());
        return Ok(());
    }

    let preference = VoicePreference::new(config.voice.preferred.clone());
    let chosen = select_voice(&catalog, &config.voice.language_prefix, &preference);

    for v in &catalog {
        let marker = if chosen == Some(v) { "*" } else { " " };
        println!("{marker} {:<12} {}", v.language_tag, v.name);
    }
    if chosen.is_none() {
        println!(
            "\nNo voice matches language prefix \"{}\"; the synthesizer default will be used.",
            config.voice.language_prefix
        );
    }

    Ok(())
}

/// Speak a test phrase
async fn cmd_test_tts(config: Config, text: &str) -> anyhow::Result<()> {
    let daemon = Daemon::from_config(config);
    let voice = daemon.load_voices().await;
    println!(
        "Speaking with voice: {}",
        voice.map_or_else(|| "default".to_string(), |v| v.name)
    );
    daemon.dispatcher().speak(text).await?;
    println!("Done!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_dry_run_flag() {
        let cli = Cli::try_parse_from(["navix", "--dry-run", "--once"]).unwrap();
        assert!(cli.dry_run);
        assert!(cli.once);

        let cli = Cli::try_parse_from(["navix", "resolve", "open", "youtube"]).unwrap();
        assert!(!cli.dry_run);
        assert!(matches!(cli.command, Some(Command::Resolve { text }) if text == ["open", "youtube"]));
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_counts() {
        let cli = Cli::try_parse_from(["navix", "-vv", "voices"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Some(Command::Voices)));
    }
}
