use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use natal_archetype::{
    BirthInput, CelestialBody, Element, EngineConfig, KeplerianEphemeris, Profile, ProfileEngine,
    DISCLAIMER,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "natal-archetype", about = "Natal positions to element archetype")]
struct Cli {
    /// Configuration file (TOML, YAML or JSON); NATAL_CONFIG is used when absent
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a profile for one birth record
    Profile {
        #[arg(long)]
        name: String,
        /// Civil birth date, YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// Civil birth time, HH:MM
        #[arg(long)]
        time: String,
        /// Prefecture or configured region
        #[arg(long)]
        region: String,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// List known regions
    Regions,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = EngineConfig::load(cli.config.as_deref()).context("loading configuration")?;
    info!(
        utc_offset_hours = config.utc_offset_hours,
        parallel = config.parallel,
        regions = config.regions.len(),
        "configuration loaded"
    );
    let engine = ProfileEngine::from_config(&config, Arc::new(KeplerianEphemeris::new()))?;

    match cli.command {
        Commands::Profile {
            name,
            date,
            time,
            region,
            json,
        } => {
            let input = BirthInput::parse(&name, &date, &time, &region)?;
            let profile = engine.compute(&input)?;
            if json {
                let output = serde_json::json!({
                    "success": true,
                    "profile": profile,
                    "disclaimer": DISCLAIMER,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                print_profile(&profile);
            }
        }
        Commands::Regions => {
            for region in engine.geo().regions() {
                println!(
                    "{:<10} {:>9.4} {:>10.4}  {}",
                    region.name,
                    region.coordinate.latitude,
                    region.coordinate.longitude,
                    region.aliases.join(", ")
                );
            }
        }
    }

    Ok(())
}

fn print_profile(profile: &Profile) {
    let subject = &profile.subject;
    println!(
        "{}  {} {} (UTC {})",
        subject.name,
        subject.birth_local.format("%Y-%m-%d %H:%M"),
        subject.region,
        profile.instant.utc.format("%Y-%m-%d %H:%M")
    );
    println!("JD {:.5}", profile.instant.julian_day);
    println!();

    for position in &profile.bodies {
        println!(
            "{:<8} {:>7.2}  {:<12} {:>5.2}  {}",
            position.body.name(),
            position.longitude,
            format!("{} {}", position.sign, position.sign.japanese_name()),
            position.degree_in_sign,
            position.element
        );
    }
    println!();

    let sun = profile.body(CelestialBody::Sun).map(|p| p.element);
    let moon = profile.body(CelestialBody::Moon).map(|p| p.element);
    if let (Some(sun), Some(moon)) = (sun, moon) {
        println!("Sun {} / Moon {}: {}", sun, moon, profile.archetype.label());
    }
    for element in Element::ALL {
        println!(
            "{:<6} {} {:>5.1}%",
            element.name(),
            element.japanese_name(),
            profile.element_balance.get(element)
        );
    }
    let missing = profile.element_balance.missing();
    if !missing.is_empty() {
        let names: Vec<&str> = missing.iter().map(|element| element.name()).collect();
        println!("Missing: {}", names.join(", "));
    }
    println!();
    println!("{}", DISCLAIMER);
}
