use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use lectern_config::ConfigManager;
use std::path::PathBuf;

mod commands;
mod script;
mod simulate;

fn build_cli() -> Command {
    Command::new("lectern")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Lectern Developers")
        .about("Segment-based audiobook player with pauses between segments")
        .arg(
            Arg::new("config-dir")
                .long("config-dir")
                .value_name("PATH")
                .help("Directory holding config.toml")
                .value_parser(clap::value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("catalog")
                .short('c')
                .long("catalog")
                .value_name("PATH")
                .help("Catalog file to read instead of the configured one")
                .value_parser(clap::value_parser!(PathBuf))
                .global(true),
        )
        .subcommand(Command::new("list").about("List all audiobooks in the catalog"))
        .subcommand(
            Command::new("info")
                .about("Show segments and illustrations of an audiobook")
                .arg(
                    Arg::new("index")
                        .required(true)
                        .value_name("INDEX")
                        .help("Position of the audiobook in the catalog")
                        .value_parser(clap::value_parser!(usize)),
                ),
        )
        .subcommand(
            Command::new("simulate")
                .about("Play an audiobook on a virtual clock and print what the player does")
                .arg(
                    Arg::new("index")
                        .required(true)
                        .value_name("INDEX")
                        .help("Position of the audiobook in the catalog")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("pause")
                        .short('p')
                        .long("pause")
                        .value_name("SECONDS")
                        .help("Pause between segments (0 plays straight through)")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    Arg::new("speed")
                        .short('s')
                        .long("speed")
                        .value_name("RATE")
                        .help("Playback speed")
                        .value_parser(clap::value_parser!(f32)),
                )
                .arg(
                    Arg::new("until")
                        .short('u')
                        .long("until")
                        .value_name("SECONDS")
                        .help("Stop after this much virtual time")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    Arg::new("script")
                        .long("script")
                        .value_name("STEPS")
                        .help("Listener actions, e.g. \"4:next,6:speed=1.5,9:repeat\""),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print the report as JSON")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Inspect or reset settings")
                .subcommand(Command::new("show").about("Print the active settings"))
                .subcommand(Command::new("init").about("Write a default settings file"))
                .subcommand(Command::new("reset").about("Overwrite settings with defaults")),
        )
}

fn config_manager(dir: Option<&PathBuf>) -> Result<ConfigManager> {
    let manager = match dir {
        Some(dir) => ConfigManager::with_directory(dir.clone()),
        None => ConfigManager::new(),
    };
    manager.context("Failed to locate settings directory")
}

fn main() -> Result<()> {
    let matches = build_cli().get_matches();

    let manager = config_manager(matches.get_one::<PathBuf>("config-dir"))?;
    let mut config = manager
        .load_with_env_overrides()
        .context("Failed to load settings")?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.app.log_level.as_filter()),
    )
    .init();

    if let Some(catalog) = matches.get_one::<PathBuf>("catalog") {
        config.app.catalog_path = catalog.clone();
    }

    match matches.subcommand() {
        Some(("list", _)) => {
            let catalog = commands::load_catalog(&config.app.catalog_path)?;
            commands::list_tracks(&catalog)
        }
        Some(("info", sub_matches)) => {
            let catalog = commands::load_catalog(&config.app.catalog_path)?;
            commands::show_track_info(&catalog, sub_matches, &config.player)
        }
        Some(("simulate", sub_matches)) => {
            let catalog = commands::load_catalog(&config.app.catalog_path)?;
            commands::simulate(&catalog, sub_matches, &config.player)
        }
        Some(("config", sub_matches)) => match sub_matches.subcommand() {
            Some(("init", _)) => commands::init_config(&manager),
            Some(("reset", _)) => commands::reset_config(&manager),
            _ => commands::show_config(&manager, &config),
        },
        _ => {
            build_cli().print_help()?;
            Ok(())
        }
    }
}
