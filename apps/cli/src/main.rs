#![deny(warnings)]

//! Headless line-oriented front end: reads one command per line from stdin
//! and prints the resulting notifications.

use anyhow::{Context, Result};
use persistence::{default_save_path, JsonFileStore};
use sim_core::{Catalog, CountryId, RulesConfig, TerritoryMap};
use sim_runtime::{Command, GameData, Notification, NotificationSink, Session};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const HELP: &str = "\
commands:
  country <code>        choose your country (usa, russia, china, iran, germany)
  buy <asset> [qty]     buy units
  research <tech>       research a technology
  income                collect income
  battle                fight an AI army
  base <territory>      place your command post
  attack <territory>    attack an adjacent territory
  targets               list territories in reach
  claim <mission>       claim a daily mission reward
  missions              show mission progress
  message               record a message
  status                show your standing
  history               show recent battles
  quit                  save and exit";

#[derive(Debug, Default)]
struct Args {
    save: Option<PathBuf>,
    seed: Option<u64>,
    catalog: Option<PathBuf>,
    map: Option<PathBuf>,
    rules: Option<PathBuf>,
    name: Option<String>,
    country: Option<String>,
    json: bool,
    version: bool,
}

fn parse_args(raw: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut args = Args::default();
    let mut it = raw.into_iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--save" => {
                args.save = Some(PathBuf::from(it.next().context("--save needs a value")?))
            }
            "--seed" => {
                let raw = it.next().context("--seed needs a value")?;
                args.seed = Some(raw.parse().with_context(|| format!("invalid seed {raw}"))?);
            }
            "--catalog" => {
                args.catalog = Some(PathBuf::from(it.next().context("--catalog needs a value")?))
            }
            "--map" => {
                args.map = Some(PathBuf::from(it.next().context("--map needs a value")?))
            }
            "--rules" => {
                args.rules = Some(PathBuf::from(it.next().context("--rules needs a value")?))
            }
            "--name" => args.name = Some(it.next().context("--name needs a value")?),
            "--country" => args.country = Some(it.next().context("--country needs a value")?),
            "--json" => args.json = true,
            "--version" | "-V" => args.version = true,
            other => warn!(arg = other, "ignoring unknown argument"),
        }
    }
    Ok(args)
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn load_data(args: &Args) -> Result<GameData> {
    let catalog = match &args.catalog {
        Some(path) => Catalog::from_yaml_str(&read(path)?)
            .with_context(|| format!("loading catalog {}", path.display()))?,
        None => Catalog::builtin()?,
    };
    let map = match &args.map {
        Some(path) => TerritoryMap::from_yaml_str(&read(path)?)
            .with_context(|| format!("loading map {}", path.display()))?,
        None => TerritoryMap::builtin()?,
    };
    let rules = match &args.rules {
        Some(path) => RulesConfig::from_yaml_str(&read(path)?)
            .with_context(|| format!("loading rules {}", path.display()))?,
        None => RulesConfig::default(),
    };
    Ok(GameData {
        catalog,
        rules,
        map,
    })
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Prints notifications as they arrive.
struct ConsoleSink;

impl NotificationSink for ConsoleSink {
    fn notify(&mut self, notification: Notification) {
        println!("{notification}");
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    if args.version {
        println!(
            "warfront {} ({})",
            env!("CARGO_PKG_VERSION"),
            env!("WARFRONT_COMMIT")
        );
        return Ok(());
    }

    let data = load_data(&args)?;
    let store = JsonFileStore::new(args.save.clone().unwrap_or_else(default_save_path));
    info!(save = %store.path().display(), seed = ?args.seed, "starting CLI");

    let mut session = match &args.name {
        Some(name) => Session::new_game(data, name, store, ConsoleSink, args.seed)?,
        None => match Session::resume(data.clone(), store.clone(), ConsoleSink, args.seed)? {
            Some(session) => session,
            None => Session::new_game(data, "Commander", store, ConsoleSink, args.seed)?,
        },
    };
    if let Some(country) = &args.country {
        if session.state().country.is_none() {
            let command = Command::SelectCountry {
                country: CountryId::from(country.to_lowercase().as_str()),
            };
            let _ = session.dispatch(command, now());
        }
    }
    println!("{HELP}");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();
        match trimmed {
            "" => {}
            "quit" | "exit" => break,
            "help" => println!("{HELP}"),
            _ => match trimmed.parse::<Command>() {
                Ok(command) => {
                    if let Ok(outcome) = session.dispatch(command, now()) {
                        if args.json {
                            println!("{}", serde_json::to_string(&outcome)?);
                        }
                    }
                }
                Err(err) => println!("[error] {err}"),
            },
        }
        session.tick(now());
        stdout.flush()?;
    }

    session.save(now());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &[&str]) -> Result<Args> {
        parse_args(raw.iter().map(|s| s.to_string()))
    }

    #[test]
    fn flags_with_values() {
        let args = parse(&["--save", "a.json", "--seed", "7", "--country", "iran", "--json"]).unwrap();
        assert_eq!(args.save, Some(PathBuf::from("a.json")));
        assert_eq!(args.seed, Some(7));
        assert_eq!(args.country.as_deref(), Some("iran"));
        assert!(args.json);
    }

    #[test]
    fn trailing_flag_without_value_is_an_error() {
        for flag in ["--save", "--seed", "--catalog", "--map", "--rules", "--name", "--country"] {
            let err = parse(&["--json", flag]).unwrap_err();
            assert_eq!(err.to_string(), format!("{flag} needs a value"));
        }
    }
}
