use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use spycat_common::config::SpyCatConfig;
use spycat_common::{APP_NAME, logging};
use spycat_core::{Mission, MissionState, StaticBreedCatalog, parse_id};
use spycat_store::Database;
use spycat_web::AppState;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "spycat", about = "Spy cat mission tracker", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create default config if missing, validate it and migrate the database.
    Doctor,
    /// Serve the HTTP API.
    Serve {
        /// Overrides `server.bind` from the config file.
        #[arg(long)]
        bind: Option<String>,
    },
    /// Inspect missions.
    Mission {
        #[command(subcommand)]
        command: MissionCommand,
    },
    /// Inspect cats.
    Agent {
        #[command(subcommand)]
        command: AgentCommand,
    },
}

#[derive(Debug, Subcommand)]
enum MissionCommand {
    /// List every mission with its targets.
    List,
    /// Show one mission.
    Show { mission_id: String },
}

#[derive(Debug, Subcommand)]
enum AgentCommand {
    /// List every cat.
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Some(Command::Doctor) => doctor(),
        Some(Command::Serve { bind }) => serve(bind),
        Some(Command::Mission { command }) => mission(command),
        Some(Command::Agent { command }) => agent(command),
        None => {
            println!("{APP_NAME} CLI ready.");
            println!("Run `spycat doctor` to generate and validate local config.");
            Ok(())
        }
    }
}

fn load_initialized_config() -> Result<(SpyCatConfig, PathBuf, bool)> {
    let (config, path, created) = SpyCatConfig::load_or_create()?;
    config.validate_and_prepare()?;
    logging::init(&config.log_level);
    Ok((config, path, created))
}

fn open_database(config: &SpyCatConfig) -> Result<Database> {
    Database::open(
        &config.db_path(),
        Duration::from_millis(config.database.busy_timeout_ms),
    )
    .context("failed to open mission database")
}

fn doctor() -> Result<()> {
    let (config, path, created) = load_initialized_config()?;
    let db = open_database(&config)?;

    println!("{APP_NAME} doctor: OK");
    println!("config: {}", path.display());
    println!("database: {}", db.path().display());
    println!("schema_version: {}", db.schema_version()?);
    println!("busy_timeout_ms: {}", db.busy_timeout().as_millis());
    println!("breed_allowlist: {}", config.breeds.allowlist.len());
    println!("created_config: {created}");
    Ok(())
}

fn serve(bind: Option<String>) -> Result<()> {
    let (config, _, _) = load_initialized_config()?;
    let db = open_database(&config)?;
    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    let breeds = Arc::new(StaticBreedCatalog::new(&config.breeds.allowlist));
    if breeds.is_empty() {
        info!("breed allowlist empty; any non-blank breed is accepted");
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    println!("api_status: starting");
    println!("bind: {bind}");
    println!("db: {}", db.path().display());
    runtime.block_on(spycat_web::serve(&bind, AppState::new(db, breeds)))
}

fn mission(command: MissionCommand) -> Result<()> {
    let (config, _, _) = load_initialized_config()?;
    let db = open_database(&config)?;
    let missions = db.missions()?;

    match command {
        MissionCommand::List => {
            let rows = missions.get_all()?;
            println!("missions: {}", rows.len());
            for row in &rows {
                print_mission(row);
            }
        }
        MissionCommand::Show { mission_id } => {
            let id = parse_id(&mission_id)?;
            print_mission(&missions.get_by_id(id)?);
        }
    }
    Ok(())
}

fn agent(command: AgentCommand) -> Result<()> {
    let (config, _, _) = load_initialized_config()?;
    let db = open_database(&config)?;
    let agents = db.agents()?;

    match command {
        AgentCommand::List => {
            let rows = agents.get_all()?;
            println!("cats: {}", rows.len());
            for row in rows {
                println!(
                    "- #{} {} | {} | {}y | salary {:.2}",
                    row.id, row.name, row.breed, row.years_of_experience, row.salary
                );
            }
        }
    }
    Ok(())
}

fn print_mission(mission: &Mission) {
    let assignment = match mission.state() {
        MissionState::Unassigned => "unassigned".to_string(),
        MissionState::Assigned(cat_id) => format!("cat #{cat_id}"),
    };
    println!(
        "- mission #{} | {} | completed: {} | open targets: {}/{}",
        mission.id,
        assignment,
        mission.completed,
        mission.open_targets(),
        mission.targets.len()
    );
    for target in &mission.targets {
        let mark = if target.complete { "x" } else { " " };
        println!(
            "    [{mark}] #{} {} ({}) {}",
            target.id, target.name, target.country, target.notes
        );
    }
}
