use crate::script::parse_script;
use crate::simulate::{run_simulation, EntrySource, SimulationReport};
use anyhow::{Context, Result};
use clap::ArgMatches;
use console::style;
use lectern_config::{Config, ConfigManager, PlayerConfig};
use lectern_core::{format_clock, Catalog, Track};
use lectern_media_engine::{EngineConfig, PauseDuration, Speed};
use std::path::Path;
use std::time::Duration;

/// Loads the catalog file named in the settings
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let catalog = Catalog::load(path)
        .with_context(|| format!("Failed to load catalog from {}", path.display()))?;
    log::debug!("Loaded {} tracks from {}", catalog.len(), path.display());
    Ok(catalog)
}

/// Builds engine settings from the player section of the settings file
pub fn engine_config(player: &PlayerConfig) -> Result<EngineConfig> {
    EngineConfig::from_values(
        player.default_speed,
        f64::from(player.default_pause_secs),
        Duration::from_millis(player.progress_refresh_ms),
        player.autoplay,
    )
    .context("Invalid player settings")
}

/// List all tracks in the catalog
pub fn list_tracks(catalog: &Catalog) -> Result<()> {
    if catalog.is_empty() {
        println!("The catalog is empty.");
        return Ok(());
    }

    println!("\n{} Audiobooks", style(catalog.len()).bold().cyan());
    println!("{}", "=".repeat(80));

    for (index, track) in catalog.iter().enumerate() {
        println!("{}", track_summary(index, track));
    }

    Ok(())
}

fn track_summary(index: usize, track: &Track) -> String {
    format!(
        "[{}] {} by {} ({}, {} segments)",
        index,
        track.title(),
        track.author(),
        format_clock(track.duration_secs() as f64),
        track.segment_count()
    )
}

/// Show detailed information about a track
pub fn show_track_info(catalog: &Catalog, matches: &ArgMatches, player: &PlayerConfig) -> Result<()> {
    let index = *matches
        .get_one::<usize>("index")
        .ok_or_else(|| anyhow::anyhow!("Track index is required"))?;
    let track = catalog.get(index).context("Failed to get track")?;

    println!("\n{}", style("Audiobook Information").bold().cyan());
    println!("{}", "=".repeat(80));
    println!("Title: {}", style(track.title()).bold());
    println!("Author: {}", track.author());
    println!("Duration: {}", format_clock(track.duration_secs() as f64));
    println!("Audio: {}", track.audio_ref());
    if !track.cover_image_ref().is_empty() {
        println!("Cover: {}", track.cover_image_ref());
    }

    println!("\n{}", style("Segments").bold());
    for (i, segment) in track.segments().iter().enumerate() {
        println!(
            "  {:>3}. {} - {} ({:.1}s)",
            i,
            format_clock(segment.start),
            format_clock(segment.end),
            segment.duration()
        );
    }

    if !track.sections().is_empty() {
        println!("\n{}", style("Illustrations").bold());
        for section in track.sections() {
            println!(
                "  {} - {}  {}",
                format_clock(section.start),
                format_clock(section.end),
                section.image_ref
            );
        }
    }

    println!("\n{}", style("Presets").bold());
    println!("  Speed: {}", format_presets(&player.speed_presets, "x"));
    println!("  Pause: {}", format_presets(&player.pause_presets, "s"));

    Ok(())
}

fn format_presets(presets: &[f32], unit: &str) -> String {
    presets
        .iter()
        .map(|p| format!("{}{}", p, unit))
        .collect::<Vec<_>>()
        .join("  ")
}

/// Play a track on the virtual clock and print the transport timeline
pub fn simulate(catalog: &Catalog, matches: &ArgMatches, player: &PlayerConfig) -> Result<()> {
    let index = *matches
        .get_one::<usize>("index")
        .ok_or_else(|| anyhow::anyhow!("Track index is required"))?;
    let track = catalog.get(index).context("Failed to get track")?;

    let mut config = engine_config(player)?;
    if let Some(speed) = matches.get_one::<f32>("speed") {
        config.speed = Speed::new(*speed).context("Invalid --speed")?;
    }
    if let Some(pause) = matches.get_one::<f64>("pause") {
        config.pause = PauseDuration::new(*pause).context("Invalid --pause")?;
    }

    let script = match matches.get_one::<String>("script") {
        Some(script) => parse_script(script).context("Failed to parse --script")?,
        None => Vec::new(),
    };
    let until = matches.get_one::<f64>("until").copied();

    log::info!(
        "Simulating '{}' at {} with {}s pauses ({} scripted steps)",
        track.title(),
        config.speed,
        config.pause.secs(),
        script.len()
    );
    let report = run_simulation(track, config, &script, until)?;

    if matches.get_flag("json") {
        let json = serde_json::to_string_pretty(&report).context("Failed to encode report")?;
        println!("{}", json);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn print_report(report: &SimulationReport) {
    println!("\n{}", style("Simulated Timeline").bold().cyan());
    println!("{}", "=".repeat(80));

    for entry in &report.timeline {
        let source = match entry.source {
            EntrySource::Intent => style("intent   ").yellow().bold(),
            EntrySource::Transport => style("transport").green(),
            EntrySource::Event => style("event    ").dim(),
        };
        println!("[{:>8.2}s] {} {}", entry.at, source, entry.text);
    }

    println!("{}", "=".repeat(80));
    match &report.final_view {
        Some(view) => println!(
            "Stopped at {} / {} in segment {} of {} ({:.0}%)",
            view.current_time_label,
            view.duration_label,
            view.segment_index + 1,
            view.segment_count,
            view.progress * 100.0
        ),
        None => println!("Session had already ended at {:.2}s", report.ended_at),
    }
}

/// Print the active settings
pub fn show_config(manager: &ConfigManager, config: &Config) -> Result<()> {
    println!("\n{}", style("Settings").bold().cyan());
    println!("{}", "=".repeat(80));
    println!("File: {}", manager.config_path().display());
    println!("Catalog: {}", config.app.catalog_path.display());
    println!("Log level: {}", config.app.log_level);
    println!("Default speed: {}x", config.player.default_speed);
    println!("Default pause: {}s", config.player.default_pause_secs);
    println!("Progress refresh: {}ms", config.player.progress_refresh_ms);
    println!("Autoplay: {}", config.player.autoplay);
    println!("Speed presets: {}", format_presets(&config.player.speed_presets, "x"));
    println!("Pause presets: {}", format_presets(&config.player.pause_presets, "s"));

    let problems = manager.validate().context("Failed to validate settings")?;
    for problem in problems {
        println!("{} {}", style("!").yellow().bold(), problem);
    }

    Ok(())
}

/// Write a default settings file if there is none
pub fn init_config(manager: &ConfigManager) -> Result<()> {
    let created = manager.initialize().context("Failed to write settings")?;
    if created {
        println!(
            "{} Settings written to {}",
            style("✓").green().bold(),
            manager.config_path().display()
        );
    } else {
        println!("Settings already exist at {}", manager.config_path().display());
    }
    Ok(())
}

/// Overwrite the settings file with defaults
pub fn reset_config(manager: &ConfigManager) -> Result<()> {
    manager.reset().context("Failed to reset settings")?;
    println!(
        "{} Settings reset to defaults at {}",
        style("✓").green().bold(),
        manager.config_path().display()
    );
    Ok(())
}

#[cfg(test)]
mod tests;
