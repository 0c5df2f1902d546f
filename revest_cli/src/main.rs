//! # RevestMaster CLI Application
//!
//! Terminal front end for the tiling estimator: one-off estimates, and
//! projects/rooms kept in the local data directory.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use clap::Parser;
use eyre::{eyre, Result};
use log::{debug, info};
use revest_core::calculations::compute;
use revest_core::{
    CalcError, FileSlot, MaterialResult, Project, ProjectId, ProjectStore, ProjectTotals, RoomId,
    RoomSpec, StoreConfig,
};
use serde_json::json;

mod cli;

use cli::{Cli, Commands, PrefsCommands, ProjectCommands, RoomCommands, SidebarState};

fn setup_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_default_env();
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    // Ignore a second initialisation
    let _ = builder.try_init();
}

fn confirm(prompt: &str) -> bool {
    print!("{} [y/N]: ", prompt);
    if io::stdout().flush().is_err() {
        return false;
    }

    let mut input = String::new();
    if io::stdin().lock().read_line(&mut input).is_err() {
        return false;
    }

    matches!(input.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn open_store(cli: &Cli) -> Result<ProjectStore<FileSlot>> {
    let config = StoreConfig::resolve(cli.data_dir.clone());
    debug!("using data directory {}", config.data_dir.display());
    let slot = FileSlot::open(&config, whoami::username())?;
    Ok(ProjectStore::open(slot))
}

/// Resolve a full id or a unique prefix of one.
fn resolve_id<'a, I>(kind: &str, wanted: &str, ids: I) -> Result<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let ids: Vec<&str> = ids.into_iter().collect();
    if ids.contains(&wanted) {
        return Ok(wanted.to_string());
    }
    let matches: Vec<&str> = ids.into_iter().filter(|id| id.starts_with(wanted)).collect();
    match matches.as_slice() {
        [only] => Ok(only.to_string()),
        [] => Err(CalcError::not_found(kind, wanted).into()),
        _ => Err(eyre!(
            "ambiguous {} id '{}' matches {} entries",
            kind,
            wanted,
            matches.len()
        )),
    }
}

fn resolve_project(store: &ProjectStore<FileSlot>, wanted: &str) -> Result<ProjectId> {
    let id = resolve_id("project", wanted, store.projects().iter().map(|p| p.id().as_str()))?;
    Ok(ProjectId::from(id))
}

fn resolve_room(project: &Project, wanted: &str) -> Result<RoomId> {
    let id = resolve_id("room", wanted, project.rooms().iter().map(|r| r.id().as_str()))?;
    Ok(RoomId::from(id))
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print `value` under `--json`, otherwise the plain message.
fn print_status(as_json: bool, value: serde_json::Value, message: &str) -> Result<()> {
    if as_json {
        print_json(&value)
    } else {
        println!("{}", message);
        Ok(())
    }
}

fn cancelled(as_json: bool) -> Result<()> {
    print_status(as_json, json!({ "cancelled": true }), "Cancelled.")
}

fn print_result(spec: &RoomSpec, result: &MaterialResult) {
    println!("═══════════════════════════════════════");
    println!("  MATERIAL ESTIMATE");
    println!("═══════════════════════════════════════");
    println!();
    println!("Input:");
    println!("  Room:     {} m x {} m", spec.length_m, spec.width_m);
    println!("  Tile:     {} x {} cm, joint {} mm", spec.tile_length_cm, spec.tile_width_cm, spec.grout_joint_mm);
    println!("  Waste:    {} %", spec.waste_margin_pct);
    println!(
        "  Mortar:   {} kg/m², {} kg bags",
        spec.mortar_consumption_kg_per_m2, spec.mortar_bag_weight_kg
    );
    println!();
    println!("Materials:");
    println!("  Area:       {:.2} m² ({:.2} m² with waste)", result.area_m2, result.area_with_waste_m2);
    println!("  Tiles:      {} units", result.tiles_units);
    println!("  Mortar:     {} bags", result.mortar_bags);
    println!("  Grout:      {:.2} kg", result.grout_kg);
}

fn print_totals(totals: &ProjectTotals) {
    println!("Totals ({} rooms):", totals.room_count);
    println!("  Area:       {:.2} m²", totals.area_m2);
    println!("  Tiles:      {} units", totals.tiles_units);
    println!("  Mortar:     {} bags", totals.mortar_bags);
    println!("  Grout:      {:.1} kg", totals.grout_kg);
}

fn print_project(project: &Project, totals: &ProjectTotals) {
    println!("═══════════════════════════════════════");
    println!("  {}", project.name());
    println!("═══════════════════════════════════════");
    println!("id: {}", project.id());
    println!();
    if project.rooms().is_empty() {
        println!("No rooms yet.");
    }
    for room in project.rooms() {
        let spec = room.spec();
        let results = room.results();
        println!(
            "{}  {}  {}m x {}m | tile {}x{}",
            room.id(),
            room.name(),
            spec.length_m,
            spec.width_m,
            spec.tile_length_cm,
            spec.tile_width_cm
        );
        println!(
            "    {} tiles, {} bags ({}kg), {} kg grout",
            results.tiles_units, results.mortar_bags, spec.mortar_bag_weight_kg, results.grout_kg
        );
    }
    println!();
    print_totals(totals);
}

fn run_project(cli: &Cli, command: &ProjectCommands) -> Result<()> {
    let mut store = open_store(cli)?;
    match command {
        ProjectCommands::New { name } => {
            let id = store.create_project(name)?;
            info!("created project {}", id);
            if cli.json {
                print_json(&json!({ "id": id }))?;
            } else {
                println!("Created project {}", id);
            }
        }
        ProjectCommands::List => {
            let summaries = store.project_summaries();
            if cli.json {
                print_json(&summaries)?;
            } else if summaries.is_empty() {
                println!("No projects yet. Create one with `revest project new <NAME>`.");
            } else {
                for summary in summaries {
                    println!(
                        "{}  {}  ({} rooms, {:.2} m²)",
                        summary.id, summary.name, summary.room_count, summary.total_area_m2
                    );
                }
            }
        }
        ProjectCommands::Show { id } => {
            let id = resolve_project(&store, id)?;
            let totals = store.project_totals(&id)?;
            let project = store
                .project(&id)
                .ok_or_else(|| CalcError::not_found("project", id.as_str()))?;
            if cli.json {
                print_json(&json!({ "project": project, "totals": totals }))?;
            } else {
                print_project(project, &totals);
            }
        }
        ProjectCommands::Delete { id, yes } => {
            let id = resolve_project(&store, id)?;
            let name = store.project(&id).map(|p| p.name().to_string()).unwrap_or_default();
            if !yes && !confirm(&format!("Delete project '{}' and all its rooms?", name)) {
                return cancelled(cli.json);
            }
            let removed = store.delete_project(&id)?;
            print_status(
                cli.json,
                json!({ "deleted": id, "rooms": removed.rooms().len() }),
                &format!("Deleted project {}", id),
            )?;
        }
    }
    Ok(())
}

fn run_room(cli: &Cli, command: &RoomCommands) -> Result<()> {
    let mut store = open_store(cli)?;
    match command {
        RoomCommands::Add { project, name, spec } => {
            let project_id = resolve_project(&store, project)?;
            let room_id = store.add_room(&project_id, spec.to_spec(), name)?;
            let totals = store.project_totals(&project_id)?;
            if cli.json {
                print_json(&json!({ "id": room_id, "totals": totals }))?;
            } else {
                println!("Added room {}", room_id);
                println!();
                print_totals(&totals);
            }
        }
        RoomCommands::Edit { project, room, name, patch } => {
            let project_id = resolve_project(&store, project)?;
            let (room_id, spec, name) = {
                let project = store
                    .project(&project_id)
                    .ok_or_else(|| CalcError::not_found("project", project_id.as_str()))?;
                let room_id = resolve_room(project, room)?;
                let current = project
                    .room(&room_id)
                    .ok_or_else(|| CalcError::not_found("room", room_id.as_str()))?;
                let name = name.clone().unwrap_or_else(|| current.name().to_string());
                (room_id, patch.apply(current.spec()), name)
            };
            store.edit_room(&project_id, &room_id, spec, &name)?;
            let totals = store.project_totals(&project_id)?;
            if cli.json {
                print_json(&json!({ "id": room_id, "totals": totals }))?;
            } else {
                println!("Updated room {}", room_id);
                println!();
                print_totals(&totals);
            }
        }
        RoomCommands::Delete { project, room, yes } => {
            let project_id = resolve_project(&store, project)?;
            let room_id = {
                let project = store
                    .project(&project_id)
                    .ok_or_else(|| CalcError::not_found("project", project_id.as_str()))?;
                resolve_room(project, room)?
            };
            if !yes && !confirm("Delete this room?") {
                return cancelled(cli.json);
            }
            store.delete_room(&project_id, &room_id)?;
            let totals = store.project_totals(&project_id)?;
            print_status(
                cli.json,
                json!({ "deleted": room_id, "totals": totals }),
                &format!("Deleted room {}", room_id),
            )?;
        }
    }
    Ok(())
}

fn run_prefs(cli: &Cli, command: &PrefsCommands) -> Result<()> {
    let mut store = open_store(cli)?;
    match command {
        PrefsCommands::Show => {}
        PrefsCommands::Theme { theme } => store.set_theme(*theme)?,
        PrefsCommands::Sidebar { state } => match state {
            SidebarState::Collapsed => store.set_sidebar_collapsed(true)?,
            SidebarState::Expanded => store.set_sidebar_collapsed(false)?,
            SidebarState::Toggle => {
                store.toggle_sidebar()?;
            }
        },
    }
    let prefs = store.preferences();
    if cli.json {
        print_json(prefs)?;
    } else {
        println!("theme:   {}", prefs.theme);
        println!(
            "sidebar: {}",
            if prefs.sidebar_collapsed { "collapsed" } else { "expanded" }
        );
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Estimate(args) => {
            let spec = args.to_spec();
            let result = compute(&spec)?;
            if cli.json {
                print_json(&result)?;
            } else {
                print_result(&spec, &result);
            }
        }
        Commands::Project { command } => run_project(cli, command)?,
        Commands::Room { command } => run_room(cli, command)?,
        Commands::Prefs { command } => run_prefs(cli, command)?,
        Commands::Wipe { yes } => {
            let mut store = open_store(cli)?;
            let count = store.projects().len();
            if !yes && !confirm("Delete ALL projects?") {
                return cancelled(cli.json);
            }
            store.wipe()?;
            print_status(cli.json, json!({ "deleted": count }), "All projects deleted.")?;
        }
    }
    Ok(())
}

fn report_error(report: &eyre::Report, as_json: bool) {
    match report.downcast_ref::<CalcError>() {
        Some(err) if as_json => {
            let body = json!({ "error": err, "code": err.error_code() });
            eprintln!("{}", serde_json::to_string_pretty(&body).unwrap_or_else(|_| err.to_string()));
        }
        _ => eprintln!("Error: {}", report),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => {
            report_error(&report, cli.json);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_status_json_and_text() {
        assert!(print_status(true, json!({ "deleted": 2 }), "All projects deleted.").is_ok());
        assert!(print_status(false, json!({ "deleted": 2 }), "All projects deleted.").is_ok());
        assert!(cancelled(true).is_ok());
    }

    #[test]
    fn test_resolve_exact_id() {
        let ids = ["abc", "abcd"];
        assert_eq!(resolve_id("project", "abc", ids).unwrap(), "abc");
    }

    #[test]
    fn test_resolve_unique_prefix() {
        let ids = ["1f0e-aa", "77b2-cc"];
        assert_eq!(resolve_id("room", "77", ids).unwrap(), "77b2-cc");
    }

    #[test]
    fn test_resolve_ambiguous_prefix() {
        let ids = ["abc1", "abc2"];
        let err = resolve_id("project", "abc", ids).unwrap_err();
        assert!(err.to_string().contains("ambiguous"));
    }

    #[test]
    fn test_resolve_missing_id() {
        let err = resolve_id("project", "zzz", ["abc"]).unwrap_err();
        let calc = err.downcast_ref::<CalcError>().unwrap();
        assert_eq!(calc.error_code(), "NOT_FOUND");
    }
}
