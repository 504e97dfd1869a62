#![deny(
    warnings,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo
)]
#![allow(clippy::multiple_crate_versions)]

use anyhow::{Result, bail};
use clap::Parser;
use mapty::app::{App, FormInput};
use mapty::cli::{self, Cmd};
use mapty::geo::FixedGeolocator;
use mapty::map::TerminalMap;
use mapty::storage::SqliteStore;
use mapty::utils;
use std::process::ExitCode;

#[macro_use]
extern crate mapty;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    utils::init_logging(cli.verbose, cli.quiet);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            utils::alert(&err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: cli::Cli) -> Result<()> {
    let store = SqliteStore::open(&cli.db)?;
    let mut app: App<TerminalMap, _> = App::new(store)?;
    let geo = FixedGeolocator::new(cli.home);
    dlog!(
        "db={} home={:?} restored={}",
        cli.db.display(),
        cli.home,
        app.workouts().len()
    );

    match cli.cmd.unwrap_or(Cmd::List { html: false }) {
        Cmd::Add {
            kind,
            at,
            distance,
            duration,
            cadence,
            elevation,
        } => {
            app.acquire_location(&geo, TerminalMap::new())?;
            app.handle_map_click(at);
            app.toggle_field(kind);

            let w = app.submit_form(FormInput {
                kind,
                distance,
                duration,
                cadence,
                elevation,
            })?;
            println!(
                "{}\t{}\t{}",
                w.id(),
                w.description(),
                utils::format_metric(w)
            );
        }
        Cmd::List { html } => {
            if html {
                println!("{}", app.list_html());
            } else {
                for (i, w) in app.workouts().iter().enumerate() {
                    println!(
                        "{}\t{}\t{}\t{}\t{} km\t{} min\t{}\t{}\t{}",
                        i + 1,
                        w.id(),
                        w.date().to_rfc3339(),
                        w.kind(),
                        w.distance(),
                        w.duration(),
                        utils::format_metric(w),
                        utils::format_extra(w),
                        w.description()
                    );
                }
            }
        }
        Cmd::Goto { id } => {
            app.acquire_location(&geo, TerminalMap::new())?;
            let Some(coords) = app.handle_list_click(&id)? else {
                bail!("No workout with id {id}");
            };
            let url = app.map().and_then(TerminalMap::osm_url).unwrap_or_default();
            println!("{coords}\t{url}");
        }
        Cmd::Reset => {
            app.reset()?;
            tracing::info!(db = %cli.db.display(), "all workouts removed");
        }
    }

    Ok(())
}
