#![deny(warnings)]

//! Headless player: loads a content pack, autoplays one reign with a policy
//! and optionally saves the result.

use anyhow::{Context, Result};
use persistence::{SaveFormat, SaveStore};
use std::path::PathBuf;
use std::sync::Arc;
use throne_ai::{autoplay, Policy};
use throne_core::{GameConfig, Profile};
use throne_engine::{GameEvent, GameSession};
use tracing::{debug, info, Level};
use tracing_subscriber::EnvFilter;

const DEFAULT_TURNS: u32 = 200;

#[derive(Debug, Default)]
struct Args {
    content: Option<PathBuf>,
    config: Option<PathBuf>,
    seed: Option<u64>,
    turns: Option<u32>,
    policy: Policy,
    save_dir: Option<PathBuf>,
    slot: Option<String>,
    version: bool,
}

fn parse_args() -> Result<Args> {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--content" => args.content = it.next().map(PathBuf::from),
            "--config" => args.config = it.next().map(PathBuf::from),
            "--seed" => args.seed = it.next().and_then(|s| s.parse().ok()),
            "--turns" => args.turns = it.next().and_then(|s| s.parse().ok()),
            "--policy" => {
                let name = it.next().unwrap_or_default();
                args.policy = name.parse()?;
            }
            "--save-dir" => args.save_dir = it.next().map(PathBuf::from),
            "--slot" => args.slot = it.next(),
            "--version" => args.version = true,
            other => debug!(arg = other, "ignoring unknown argument"),
        }
    }
    Ok(args)
}

fn load_config(path: Option<&PathBuf>) -> Result<GameConfig> {
    let Some(path) = path else {
        return Ok(GameConfig::default());
    };
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_yaml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn log_event(event: &GameEvent) {
    match event {
        GameEvent::NewCard { card } => info!(%card, "card presented"),
        GameEvent::ChoiceMade { card, side } => info!(%card, %side, "choice made"),
        GameEvent::ResourceChange { resource, old, new } => {
            debug!(%resource, old, new, "resource changed")
        }
        GameEvent::EraChanged { from, to } => info!(%from, %to, "a new era begins"),
        GameEvent::GameOver {
            reason,
            turn,
            score,
        } => info!(%reason, turn, score, "game over"),
        GameEvent::Victory { turn, score } => info!(turn, score, "victory"),
        GameEvent::EndingReached { ending } => info!(%ending, "ending reached"),
        GameEvent::AchievementUnlocked {
            achievement,
            points,
        } => info!(%achievement, points, "achievement unlocked"),
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .init();

    let args = parse_args()?;
    if args.version {
        println!(
            "throne-cli {} ({} {})",
            env!("CARGO_PKG_VERSION"),
            env!("GIT_SHA"),
            env!("BUILD_DATE")
        );
        return Ok(());
    }
    info!(?args, "starting CLI");

    let content = args.content.clone().unwrap_or_else(contentkit::demo_pack_dir);
    let catalog = Arc::new(
        contentkit::load_catalog(&content)
            .with_context(|| format!("loading content pack {}", content.display()))?,
    );
    let mut config = load_config(args.config.as_ref())?;
    if let Some(seed) = args.seed {
        config.rng_seed = seed;
    }

    let store = args.save_dir.as_ref().map(SaveStore::open).transpose()?;
    let profile = match &store {
        Some(s) => s.load_profile()?,
        None => Profile::default(),
    };

    let mut session = GameSession::new(catalog, config, profile)?;
    session.subscribe(log_event);
    let report = autoplay(&mut session, args.policy, args.turns.unwrap_or(DEFAULT_TURNS))?;

    let state = session.state();
    let resources: Vec<String> = state
        .resources
        .iter()
        .map(|(r, v)| format!("{}={v}", r.label(state.era)))
        .collect();
    println!(
        "Reign {:?} | turns: {} | era: {} | score: {} | ending: {} | achievements: {} | {}",
        report.status,
        report.turns,
        state.era,
        report.score,
        report
            .ending
            .as_ref()
            .map_or_else(|| "-".to_string(), |e| e.to_string()),
        report.achievements.len(),
        resources.join(" ")
    );
    debug!(report = %serde_json::to_string(&session.serialize())?, "final state");

    if let Some(store) = store {
        let slot = args.slot.as_deref().unwrap_or("autosave");
        let path = store.save(slot, &session.serialize(), SaveFormat::Json)?;
        store.save_profile(session.profile())?;
        println!("Saved {} and profile to {}", path.display(), store.root().display());
    }

    Ok(())
}
