//! Operator console for MerchantQuest.
//!
//! Offline sandbox equivalents of the deployed admin scripts: steer oracle
//! trends through scenarios and narrative events, inspect the price board,
//! and walk the stuck-travel recovery protocol end to end.
use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::{Parser, Subcommand};
use colored::Colorize;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::{SystemTime, UNIX_EPOCH};

use merchantquest_game::{
    City, Commodity, GAME_EVENTS, GameEvent, MarketScenario, MerchantId, Recovery, SimulatedFeed,
    StatusWatcher, TradeSide, World, reconcile, travel_duration,
};

#[derive(Debug, Parser)]
#[command(name = "merchantquest-tools", version)]
#[command(about = "Operator console for the MerchantQuest core - oracle steering and travel diagnosis")]
struct Args {
    /// Seed for the simulated feed and randomized scenarios
    #[arg(long, default_value_t = 1337)]
    seed: u64,

    /// Enable external-feed blending (snapshots references and leaves
    /// fallback mode)
    #[arg(long)]
    blend: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the price board and per-commodity breakdowns
    Prices,
    /// Apply a market scenario and show prices before/after
    Scenario {
        /// Scenario key (see `list`)
        name: String,
    },
    /// Trigger a narrative event and show prices before/after
    Event {
        /// Event key (see `list`)
        name: String,
    },
    /// List available scenarios and events
    List,
    /// Walk the stuck-travel recovery protocol for a demo merchant
    Travel {
        /// Destination city index (0-3)
        to: usize,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    println!("{}", "MerchantQuest Operator Console".bright_cyan().bold());
    println!("{}", "================================".cyan());
    println!("session {}\n", Local::now().format("%Y-%m-%d %H:%M:%S"));

    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let mut world = build_world(&mut rng, args.blend)?;

    match args.command {
        Command::Prices => show_prices(&world),
        Command::Scenario { name } => apply_scenario(&mut world, &mut rng, &name)?,
        Command::Event { name } => apply_event(&mut world, &name)?,
        Command::List => list_catalog(),
        Command::Travel { to } => walk_travel(&mut world, to)?,
    }

    Ok(())
}

/// Build a sandbox world over the simulated feed, warmed up a few steps so
/// blended prices have something to drift from.
fn build_world(rng: &mut ChaCha8Rng, blend: bool) -> Result<World<SimulatedFeed>> {
    let mut world = World::new(SimulatedFeed::new());
    world.oracle_mut().feed_mut().advance(rng);

    if blend {
        world
            .oracle_mut()
            .update_reference_prices()
            .context("snapshotting reference prices")?;
        world.oracle_mut().set_fallback_mode(false);
        // Let the walk move so deltas are visible.
        for _ in 0..5 {
            world.oracle_mut().feed_mut().advance(rng);
        }
        println!("{}", "external-feed blending enabled".green());
    } else {
        println!("{}", "fallback pricing (no feed blending)".yellow());
    }
    println!();
    Ok(world)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}

fn show_prices(world: &World<SimulatedFeed>) {
    println!("{}", "Oracle prices".bold());
    for commodity in Commodity::ALL {
        let breakdown = world.oracle().breakdown_of(commodity);
        let mode = if breakdown.using_fallback {
            "fallback".yellow()
        } else {
            format!("feed {:+} bp", breakdown.feed_delta_bp).green()
        };
        println!(
            "  {:<8} {:>6} gold  (base {:>4}, trend {:>6} bp, {mode})",
            commodity.name(),
            breakdown.final_price,
            breakdown.base_price,
            breakdown.trend_bp,
        );
    }

    println!("\n{}", "City markets (buy/sell)".bold());
    for city in City::ALL {
        let (buys, sells) = world.all_city_prices(city);
        let pairs: Vec<String> = Commodity::ALL
            .iter()
            .map(|c| format!("{} {}/{}", c.name(), buys[c.index()], sells[c.index()]))
            .collect();
        println!("  {:<11} {}", city.name(), pairs.join("  "));
    }
}

fn apply_scenario(
    world: &mut World<SimulatedFeed>,
    rng: &mut ChaCha8Rng,
    name: &str,
) -> Result<()> {
    let Some(scenario) = MarketScenario::by_key(name) else {
        bail!(
            "unknown scenario '{name}' (available: {})",
            scenario_keys().join(", ")
        );
    };

    let before = world.oracle().get_all_prices();
    let trends = scenario.trends_bp(rng);
    world
        .oracle_mut()
        .update_oracle_trends(trends)
        .context("applying scenario trends")?;

    println!("applying scenario {}", name.bold());
    print_price_shift(&before, &world.oracle().get_all_prices());
    Ok(())
}

fn apply_event(world: &mut World<SimulatedFeed>, name: &str) -> Result<()> {
    let Some(event) = GameEvent::by_key(name) else {
        bail!(
            "unknown event '{name}' (available: {})",
            event_keys().join(", ")
        );
    };

    let before = world.oracle().get_all_prices();
    event
        .apply(world.oracle_mut())
        .context("triggering game event")?;

    println!("{}", event.name.bold());
    println!("  \"{}\"", event.description);
    print_price_shift(&before, &world.oracle().get_all_prices());
    Ok(())
}

fn print_price_shift(before: &[u64; 5], after: &[u64; 5]) {
    for commodity in Commodity::ALL {
        let index = commodity.index();
        let delta = after[index] as i64 - before[index] as i64;
        let delta_text = match delta {
            0 => "unchanged".dimmed(),
            d if d > 0 => format!("+{d}").green(),
            d => format!("{d}").red(),
        };
        println!(
            "  {:<8} {:>6} -> {:>6} gold  ({delta_text})",
            commodity.name(),
            before[index],
            after[index],
        );
    }
}

fn list_catalog() {
    println!("{}", "Market scenarios".bold());
    for scenario in MarketScenario::ALL {
        println!("  {}", scenario.key());
    }
    println!("\n{}", "Narrative events".bold());
    for event in GAME_EVENTS {
        println!("  {:<18} {}", event.key, event.name);
    }
}

/// Start a trip, then run the recovery protocol the way a reconnecting
/// client would: reconcile against authoritative status, wait out the
/// countdown on a simulated clock, and let a watcher heal the arrival.
fn walk_travel(world: &mut World<SimulatedFeed>, to: usize) -> Result<()> {
    let now = unix_now();
    let owner = "operator";
    let id = world
        .create_merchant(owner, "Diagnostic", now)
        .context("registering diagnostic merchant")?;

    let status = world
        .start_travel(owner, id, to, now)
        .context("starting travel")?;
    println!(
        "merchant {id} departed {} for {} ({}s)",
        status.from_city.name().bold(),
        status.to_city.name().bold(),
        status.time_remaining
    );

    // A fresh client reconnects mid-flight.
    report_recovery(world, id, now + 1)?;

    // The trip-starter never completes; fast-forward past arrival.
    let arrival = now + travel_duration(status.from_city, status.to_city);
    println!("\n-- simulated clock jumps past arrival --\n");
    report_recovery(world, id, arrival)?;

    let mut watcher = StatusWatcher::new(owner, id);
    let healed = watcher.poll(world, arrival).context("polling status")?;
    if healed.is_traveling {
        println!("{}", "travel still pending after poll".red());
    } else {
        println!(
            "{} merchant now at {}",
            "auto-heal complete:".green(),
            healed.to_city.name().bold()
        );
        let buy = world.city_price(healed.to_city, Commodity::Silk, TradeSide::Buy);
        let sell = world.city_price(healed.to_city, Commodity::Silk, TradeSide::Sell);
        println!(
            "local {} market: buy {buy} / sell {sell} gold",
            Commodity::Silk.name()
        );
    }
    Ok(())
}

fn report_recovery(world: &World<SimulatedFeed>, id: MerchantId, now: u64) -> Result<()> {
    let status = world.get_travel_status(id, now).context("reading status")?;
    match reconcile(None, id, &status) {
        Recovery::CompleteNow { destination } => {
            println!(
                "{} arrival at {} is due; complete immediately",
                "recovery:".green(),
                destination.name()
            );
        }
        Recovery::ResumeCountdown {
            destination,
            remaining,
        } => {
            println!(
                "{} {}s left to {}; resume countdown and schedule completion",
                "recovery:".yellow(),
                remaining,
                destination.name()
            );
        }
        Recovery::DiscardCache => {
            println!("{} stale cache entry dropped", "recovery:".yellow());
        }
        Recovery::Idle => println!("recovery: nothing to do"),
    }
    Ok(())
}

fn scenario_keys() -> Vec<&'static str> {
    MarketScenario::ALL.iter().map(|s| s.key()).collect()
}

fn event_keys() -> Vec<&'static str> {
    GAME_EVENTS.iter().map(|event| event.key).collect()
}
