//! Headless Duel Runner
//!
//! Runs director-vs-director encounters and outputs a JSON report; a
//! fixed seed reproduces the identical event log.

use clap::Parser;
use serde::Serialize;

use riposte::content::registry::CardRegistry;
use riposte::content::template::WeaponProfile;
use riposte::core::config::EngineConfig;
use riposte::core::error::Result;
use riposte::core::types::Outcome;
use riposte::director::Director;
use riposte::encounter::{AgentSpec, Encounter};
use riposte::event::{Event, EventKind};
use riposte::resolve::damage::ThresholdBodyModel;

/// Headless duel runner - director vs director for tuning and replay
#[derive(Parser, Debug)]
#[command(name = "duel_runner")]
#[command(about = "Run a director-vs-director duel and report the outcome")]
struct Args {
    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Number of turns to simulate
    #[arg(long, default_value_t = 6)]
    turns: u64,

    /// TOML content file; the built-in catalog is used when omitted
    #[arg(long)]
    content: Option<std::path::PathBuf>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Print every event as it is published
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// JSON output structure
#[derive(Serialize)]
struct DuelReport {
    seed: u64,
    turns: u64,
    events: usize,
    resolved: usize,
    hits: usize,
    left_balance: f32,
    right_balance: f32,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let seed = args.seed.unwrap_or_else(rand::random);
    tracing::info!(seed, turns = args.turns, "starting duel");

    let registry = match &args.content {
        Some(path) => CardRegistry::load_file(path)?,
        None => CardRegistry::test_catalog(),
    };

    // Decks come from whatever content was loaded: two copies of every
    // cheap card, one of the rest; techniques with a cooldown become pool
    // masters
    let mut deck: Vec<String> = Vec::new();
    let mut pool: Vec<String> = Vec::new();
    for (_, template) in registry.iter() {
        if template.cooldown > 0 && template.is_offensive() {
            pool.push(template.name.clone());
            continue;
        }
        deck.push(template.name.clone());
        if template.stamina_cost <= 3.0 {
            deck.push(template.name.clone());
        }
    }
    let weapon = registry
        .weapons()
        .next()
        .cloned()
        .unwrap_or_else(WeaponProfile::arming_sword);

    let mut encounter = Encounter::new(registry, EngineConfig::default(), seed);
    encounter.set_body_model(Box::new(ThresholdBodyModel::default()));

    let mut left = AgentSpec::new("left", weapon.clone());
    left.deck = deck.clone();
    left.pool = pool.clone();

    let mut right = AgentSpec::new("right", weapon);
    right.deck = deck;
    right.pool = pool;

    let left_id = encounter.add_agent(left)?;
    let right_id = encounter.add_agent(right)?;

    let mut directors = vec![
        (left_id, Director::PoolCaster),
        (right_id, Director::SimpleDeck),
    ];

    let mut log: Vec<Event> = Vec::new();
    for _ in 0..args.turns {
        encounter.begin_turn()?;
        for (agent, director) in directors.iter_mut() {
            director.play_cards(*agent, &mut encounter);
        }
        encounter.lock_selection()?;
        encounter.resolve_tick()?;
        encounter.end_turn()?;

        encounter.swap_event_buffers();
        for event in encounter.events().current() {
            if args.verbose {
                println!("[{:>2}] {:?}", event.turn, event.kind);
            }
            log.push(event.clone());
        }
    }

    let resolved = log
        .iter()
        .filter(|e| matches!(e.kind, EventKind::TechniqueResolved { .. }))
        .count();
    let hits = log
        .iter()
        .filter(|e| {
            matches!(
                e.kind,
                EventKind::TechniqueResolved {
                    outcome: Outcome::Hit,
                    ..
                }
            )
        })
        .count();

    let report = DuelReport {
        seed,
        turns: args.turns,
        events: log.len(),
        resolved,
        hits,
        left_balance: encounter.agent(left_id).map(|a| a.balance).unwrap_or(0.5),
        right_balance: encounter.agent(right_id).map(|a| a.balance).unwrap_or(0.5),
    };

    if args.format == "text" {
        println!(
            "seed {} | {} turns | {} events | {}/{} hits | balance {:.2} vs {:.2}",
            report.seed,
            report.turns,
            report.events,
            report.hits,
            report.resolved,
            report.left_balance,
            report.right_balance
        );
    } else {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}
