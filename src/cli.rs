use crate::types::{ActivityKind, LatLng};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

const DEFAULT_DB_PATH: &str = "mapty.db";

#[derive(Parser, Debug)]
#[command(name = "mapty", about = "Log running and cycling workouts on a map")]
pub struct Cli {
    /// SQLite file holding the saved workouts.
    #[arg(long, env = "MAPTY_DB", default_value = DEFAULT_DB_PATH, global = true)]
    pub db: PathBuf,

    /// Your current position as LAT,LNG. Without it the map stays unavailable.
    #[arg(
        long,
        env = "MAPTY_HOME",
        value_name = "LAT,LNG",
        allow_hyphen_values = true,
        global = true
    )]
    pub home: Option<LatLng>,

    /// Increase log verbosity (-v, -vv). Defaults to INFO.
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Decrease log verbosity (-q, -qq). Defaults to INFO.
    #[arg(short = 'q', long, action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[command(subcommand)]
    pub cmd: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Click the map at a position and submit the workout form.
    Add {
        #[arg(long = "type", value_enum, default_value_t = ActivityKind::Running)]
        kind: ActivityKind,

        /// Where the workout happened.
        #[arg(long, value_name = "LAT,LNG", allow_hyphen_values = true)]
        at: LatLng,

        /// Distance in km.
        #[arg(long, allow_hyphen_values = true)]
        distance: String,

        /// Duration in minutes.
        #[arg(long, allow_hyphen_values = true)]
        duration: String,

        /// Steps per minute (running).
        #[arg(long, default_value = "", allow_hyphen_values = true)]
        cadence: String,

        /// Elevation gain in meters (cycling). May be negative.
        #[arg(long, default_value = "", allow_hyphen_values = true)]
        elevation: String,
    },

    /// Print the workout list (default).
    List {
        /// Print the rendered HTML list instead of one line per workout.
        #[arg(long)]
        html: bool,
    },

    /// Click a list entry: move the map to that workout.
    Goto {
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Forget every saved workout.
    Reset,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_add_with_negative_values() {
        let cli = Cli::try_parse_from([
            "mapty",
            "--home",
            "38.7,-9.1",
            "add",
            "--type",
            "cycling",
            "--at",
            "-33.9,18.4",
            "--distance",
            "20",
            "--duration",
            "60",
            "--elevation",
            "-40",
        ])
        .unwrap();

        assert_eq!(cli.home, Some(LatLng::new(38.7, -9.1)));
        match cli.cmd {
            Some(Cmd::Add {
                kind,
                at,
                elevation,
                cadence,
                ..
            }) => {
                assert_eq!(kind, ActivityKind::Cycling);
                assert_eq!(at, LatLng::new(-33.9, 18.4));
                assert_eq!(elevation, "-40");
                assert_eq!(cadence, "");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn no_subcommand_means_list() {
        let cli = Cli::try_parse_from(["mapty", "--db", "/tmp/x.db"]).unwrap();
        assert!(cli.cmd.is_none());
        assert_eq!(cli.db, PathBuf::from("/tmp/x.db"));
    }

    #[test]
    fn rejects_bad_position() {
        assert!(Cli::try_parse_from(["mapty", "--home", "north", "list"]).is_err());
    }
}
