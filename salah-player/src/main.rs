//! Salah Sequence Player (salah-player) - Main entry point
//!
//! Console front end: pick a language and a prayer, then follow the steps
//! while the player narrates them. Transport commands are read from stdin.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use salah_common::events::{EventBus, SalahEvent};
use salah_common::{Catalog, Language};
use salah_player::assets::TemplateResolver;
use salah_player::audio::CpalBackend;
use salah_player::config::PlayerConfig;
use salah_player::{spawn_player, PlayerHandle};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Input = Lines<BufReader<Stdin>>;

/// Command-line arguments for salah-player
#[derive(Parser, Debug)]
#[command(name = "salah-player")]
#[command(about = "Guided salah step player")]
#[command(version)]
struct Args {
    /// Narration language (english, malayalam)
    #[arg(short, long)]
    language: Option<Language>,

    /// Prayer to play (Fajr, Lohar, Asr, Maghrib, Isha)
    #[arg(short, long)]
    prayer: Option<String>,

    /// Catalog JSON to use instead of the bundled one
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Root folder containing the audio assets
    #[arg(short, long)]
    asset_root: Option<PathBuf>,

    /// Pause between steps in milliseconds
    #[arg(long)]
    advance_delay_ms: Option<u64>,

    /// Audio output device name
    #[arg(short, long, env = "SALAH_AUDIO_DEVICE")]
    device: Option<String>,

    /// Config file
    #[arg(long, env = "SALAH_CONFIG")]
    config: Option<PathBuf>,

    /// List languages, prayers and output devices, then exit
    #[arg(long)]
    list: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing (stderr, so it does not interleave with the prompts)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "salah_player=info,salah_common=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let (config, config_file) = match &args.config {
        Some(path) => (
            PlayerConfig::load(path).with_context(|| format!("Failed to load {}", path.display()))?,
            Some(path.clone()),
        ),
        None => PlayerConfig::load_or_default().context("Failed to load configuration")?,
    };

    match &config_file {
        Some(path) => info!("Config file: {}", path.display()),
        None => info!("No config file; using defaults"),
    }

    let catalog = Arc::new(load_catalog(args.catalog.as_ref().or(config.catalog_path.as_ref()))?);

    if args.list {
        print_listing(&catalog);
        return Ok(());
    }

    let asset_root = config.resolve_asset_root(args.asset_root.as_deref());
    info!("Asset root: {}", asset_root.display());
    if !asset_root.is_dir() {
        warn!("Asset root {} does not exist; every step will fail to load", asset_root.display());
    }

    let advance_delay = args
        .advance_delay_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| config.advance_delay());

    let backend = CpalBackend::new(args.device.clone().or(config.audio_device.clone()))
        .with_volume(config.volume);
    let events = EventBus::new(100);
    let (player, task) = spawn_player(
        Arc::clone(&catalog),
        Box::new(backend),
        Arc::new(TemplateResolver::new(asset_root)),
        advance_delay,
        events,
    );

    let renderer = tokio::spawn(render_events(player.subscribe(), Arc::clone(&catalog)));

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    tokio::select! {
        result = run_console(&player, &catalog, &mut input, args.language.or(config.language), args.prayer) => {
            if let Err(e) = result {
                error!("{:#}", e);
            }
        }
        _ = shutdown_signal() => {}
    }

    if let Err(e) = player.stop().await {
        warn!("Stop on exit failed: {}", e);
    }
    drop(player);
    let _ = task.await;
    renderer.abort();

    info!("Shutdown complete");
    Ok(())
}

fn load_catalog(path: Option<&PathBuf>) -> Result<Catalog> {
    match path {
        Some(path) => {
            info!("Loading catalog from {}", path.display());
            Catalog::load(path).with_context(|| format!("Failed to load catalog {}", path.display()))
        }
        None => Catalog::bundled().context("Bundled catalog is invalid"),
    }
}

fn print_listing(catalog: &Catalog) {
    println!("Languages:");
    for language in Language::ALL {
        println!("  {:<10} {}", language.code(), language.native_label());
    }

    println!("Prayers:");
    for prayer in catalog.prayers() {
        let rakat = prayer.rakat.map(|r| format!("{} rakat", r)).unwrap_or_default();
        println!("  {:<10} {:<9} {} steps", prayer.name, rakat, prayer.len());
    }

    match CpalBackend::list_devices() {
        Ok(devices) => {
            println!("Output devices:");
            for device in devices {
                println!("  {}", device);
            }
        }
        Err(e) => warn!("Could not list output devices: {}", e),
    }
}

/// Interactive loop; returns when the user quits or stdin closes
async fn run_console(
    player: &PlayerHandle,
    catalog: &Catalog,
    input: &mut Input,
    language: Option<Language>,
    prayer: Option<String>,
) -> Result<()> {
    let Some(language) = (match language {
        Some(language) => Some(language),
        None => prompt_language(input).await?,
    }) else {
        return Ok(());
    };
    player.select_language(language).await?;

    let mut preselected = prayer;
    loop {
        let name = match preselected.take() {
            Some(name) => name,
            None => match prompt_prayer(catalog, input).await? {
                Some(name) => name,
                None => return Ok(()),
            },
        };

        if let Err(e) = player.select_prayer(&name).await {
            println!("{}", e);
            continue;
        }
        if let Err(e) = player.start().await {
            println!("{}", e);
            continue;
        }
        print_help();

        match transport(player, input).await? {
            Exit::Quit => return Ok(()),
            Exit::BackToPrayers => {
                player.back_to_prayers().await?;
            }
            Exit::ChangeLanguage => {
                let Some(language) = prompt_language(input).await? else {
                    return Ok(());
                };
                player.select_language(language).await?;
            }
        }
    }
}

enum Exit {
    Quit,
    BackToPrayers,
    ChangeLanguage,
}

/// Transport commands for the running session
async fn transport(player: &PlayerHandle, input: &mut Input) -> Result<Exit> {
    while let Some(line) = input.next_line().await? {
        let mut words = line.split_whitespace();
        let result = match words.next() {
            Some("p") => player.pause().await,
            Some("r") => player.resume().await,
            Some("n") => player.next().await,
            Some("b") => player.previous().await,
            Some("j") => match words.next().and_then(|w| w.parse::<usize>().ok()) {
                // Steps are shown 1-based
                Some(step) if step > 0 => player.jump_to(step - 1).await,
                _ => {
                    println!("usage: j <step number>");
                    Ok(())
                }
            },
            Some("s") => return Ok(Exit::BackToPrayers),
            Some("l") => return Ok(Exit::ChangeLanguage),
            Some("q") => return Ok(Exit::Quit),
            Some("?") | Some("h") => {
                print_help();
                Ok(())
            }
            Some(other) => {
                println!("unknown command '{}' (h for help)", other);
                Ok(())
            }
            None => Ok(()),
        };

        if let Err(e) = result {
            println!("{}", e);
        }
    }
    Ok(Exit::Quit)
}

fn print_help() {
    println!("commands: p pause | r resume | n next | b previous | j N jump to step | s prayers | l language | q quit");
}

async fn prompt_language(input: &mut Input) -> Result<Option<Language>> {
    loop {
        println!("Select language:");
        for (i, language) in Language::ALL.iter().enumerate() {
            println!("  {}. {}", i + 1, language.native_label());
        }

        let Some(line) = input.next_line().await? else {
            return Ok(None);
        };
        let choice = line.trim();
        if let Some(language) = choice
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| Language::ALL.get(i).copied())
        {
            return Ok(Some(language));
        }
        match choice.parse::<Language>() {
            Ok(language) => return Ok(Some(language)),
            Err(e) => println!("{}", e),
        }
    }
}

async fn prompt_prayer(catalog: &Catalog, input: &mut Input) -> Result<Option<String>> {
    let prayers = catalog.prayers();
    loop {
        println!("Select salah:");
        for (i, prayer) in prayers.iter().enumerate() {
            println!("  {}. {}", i + 1, prayer.name);
        }

        let Some(line) = input.next_line().await? else {
            return Ok(None);
        };
        let choice = line.trim();
        if choice.is_empty() {
            continue;
        }
        let by_number = choice
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| prayers.get(i));
        match by_number {
            Some(prayer) => return Ok(Some(prayer.name.clone())),
            None => return Ok(Some(choice.to_string())),
        }
    }
}

/// Print player events as console lines
async fn render_events(mut rx: tokio::sync::broadcast::Receiver<SalahEvent>, catalog: Arc<Catalog>) {
    loop {
        let event = match rx.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                warn!("Console fell behind, {} events skipped", skipped);
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        match event {
            SalahEvent::SessionStarted { prayer, language, total_steps, .. } => {
                println!("== {} ({}, {} steps) ==", prayer, language.native_label(), total_steps);
            }
            SalahEvent::StepStarted { index, step_name, .. } => {
                println!("[{}] {}", index + 1, step_name);
            }
            SalahEvent::PlaybackStateChanged { new_state, .. } => {
                println!("   ({})", new_state);
            }
            SalahEvent::StepFailed { index, step_name, message, guidance, .. } => {
                println!("!! Step {} '{}' could not be played: {}", index + 1, step_name, message);
                println!("   {}", guidance);
            }
            SalahEvent::SequenceCompleted { prayer, .. } => {
                println!("== {} complete ==", prayer);
                if let Some(details) = catalog.find(&prayer) {
                    if let Some(rakat) = details.rakat {
                        println!("{} rakat", rakat);
                    }
                    if let Some(description) = &details.description {
                        println!("{}", description);
                    }
                }
                println!("s: back to prayers, q: quit");
            }
            SalahEvent::SelectionChanged { .. }
            | SalahEvent::AdvanceScheduled { .. }
            | SalahEvent::SessionEnded { .. } => {}
        }
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
