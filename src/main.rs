//! modmap - command line front end for the filemap engine.
//!
//! # Layout
//!
//! ```text
//! <game-dir>/
//!   mods/<ModName>/...           staging folders, one per mod
//!   overwrite/...                files written by tools, highest priority
//!   profiles/<profile>/
//!     modlist.txt                priority order, line 0 highest
//!     deployment.yaml            strip prefixes, extensions, root folders
//!     profile.yaml               Root_Folder toggle, debug logging
//!     mod_strip_prefixes.json    per-mod deployment paths
//!   filemap.txt                  data-dir index (output)
//!   filemap_root.txt             game-root index (output, only when non-empty)
//! ```
//!
//! # Commands
//!
//! - `build`: rebuild the index and print each mod's conflict status
//! - `conflicts <MOD>`: rebuild, then show what the mod overrides and what overrides it
//! - `winner <PATH>`: look a path up in the existing `filemap.txt`

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use std::sync::Arc;

use modmap::models::ConflictStatus;
use modmap::services::{FilemapBuilder, FilemapIndex, ModlistFile};
use modmap::{APP_NAME, ConfigManager, RebuildScheduler, StagingLayout, VERSION};

#[derive(Parser, Debug)]
#[command(name = "modmap", version, about = "Mod file overlay and conflict resolution")]
struct Cli {
    /// Game instance directory containing mods/, overwrite/ and profiles/
    #[arg(long)]
    game_dir: Utf8PathBuf,

    /// Profile name under <game-dir>/profiles
    #[arg(long, default_value = "Default")]
    profile: String,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Directory for log files
    #[arg(long, default_value = "logs")]
    log_dir: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rebuild filemap.txt and report conflicts
    Build,
    /// Rebuild, then show the override graph for one mod
    Conflicts {
        /// Mod name as it appears in modlist.txt
        mod_name: String,
    },
    /// Print which mod provides a file, from the existing index
    Winner {
        /// Path relative to the data directory
        path: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let profile_dir = cli.game_dir.join("profiles").join(&cli.profile);
    let config_manager = ConfigManager::new(&profile_dir)?;
    let settings = config_manager.load_profile_settings()?;

    let _log_guard = modmap::logging::setup_logging_with_console(
        &cli.log_dir,
        APP_NAME,
        cli.debug || settings.debug_logging,
        cli.debug,
    )?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let layout = StagingLayout::for_game_dir(&cli.game_dir);

    if let Command::Winner { path } = &cli.command {
        let index = FilemapIndex::read(&layout.output_path)?;
        match index.get(path) {
            Some(entry) => println!("{}\t{}", entry.relative_path, entry.mod_name),
            None => println!("{} is not provided by any mod", path),
        }
        return Ok(());
    }

    let rules = config_manager.load_path_rules()?;
    let store = ModlistFile::new(
        profile_dir.join("modlist.txt"),
        Some(settings.root_folder_enabled),
    );
    let builder = FilemapBuilder::new(Arc::new(store), layout, rules);

    // Completions arrive on a tokio channel; a current-thread runtime is enough
    // since the heavy work runs on the scheduler's own worker thread.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    let mut scheduler = RebuildScheduler::new(Arc::new(builder));
    scheduler.request_rebuild();
    runtime.block_on(scheduler.wait_idle());

    scheduler.metrics().log_summary();

    let snapshot = scheduler.snapshot();
    if snapshot.generation == 0 {
        anyhow::bail!("Rebuild failed, see log for details");
    }

    match &cli.command {
        Command::Build => {
            println!(
                "{} files indexed ({} data, {} root)",
                snapshot.count(),
                snapshot.data.len(),
                snapshot.root.len()
            );
            for (mod_name, status) in &snapshot.conflicts.conflict_map {
                println!("{:>8}  {}", status.label(), mod_name);
            }
        }
        Command::Conflicts { mod_name } => {
            let report = &snapshot.conflicts;
            let status = report.status(mod_name);
            println!("{}: {}", mod_name, status.label());
            if status != ConflictStatus::None {
                for other in report.overrides_of(mod_name) {
                    println!("  overrides      {}", other);
                }
                for other in report.overridden_by_of(mod_name) {
                    println!("  overridden by  {}", other);
                }
            }
            let provided = snapshot.data.files_of(mod_name).count()
                + snapshot.root.files_of(mod_name).count();
            println!("  provides {} file(s)", provided);
        }
        Command::Winner { .. } => {}
    }

    Ok(())
}
