use crate::types::{Activity, Workout};
use tracing_subscriber::{EnvFilter, fmt};

#[macro_export]
macro_rules! dlog {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*);
    };
}

/// Initialize colorful logging.
///
/// Default level is INFO.
/// - `-v` => DEBUG
/// - `-vv` => TRACE
/// - `-q` => WARN
/// - `-qq` => ERROR
///
/// `RUST_LOG` overrides everything (e.g. `RUST_LOG=trace`).
pub fn init_logging(verbose: u8, quiet: u8) {
    let net = i16::from(verbose) - i16::from(quiet);
    let level = match net {
        i16::MIN..=-2 => "error",
        -1 => "warn",
        0 => "info",
        1 => "debug",
        2..=i16::MAX => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,mapty={level}")));

    let show_src = matches!(level, "debug" | "trace");

    fmt()
        .with_env_filter(filter)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .with_target(true)
        .with_level(true)
        .with_file(show_src)
        .with_line_number(show_src)
        .compact()
        .init();
}

/// Show a blocking user alert. In the terminal that is a line on stderr.
pub fn alert(err: &anyhow::Error) {
    tracing::debug!(err = ?err, "alert");
    eprintln!("alert: {err:#}");
}

/// Numeric coercion applied to raw form fields.
///
/// Blank input counts as zero; anything unparsable becomes NaN.
pub fn coerce_number(raw: &str) -> f64 {
    let s = raw.trim();
    if s.is_empty() {
        return 0.0;
    }
    s.parse::<f64>().unwrap_or(f64::NAN)
}

/// "6.0 min/km" / "20.0 km/h"
pub fn format_metric(w: &Workout) -> String {
    match *w.activity() {
        Activity::Running { pace, .. } => format!("{pace:.1} min/km"),
        Activity::Cycling { speed, .. } => format!("{speed:.1} km/h"),
    }
}

/// "150 spm" / "-20 m"
pub fn format_extra(w: &Workout) -> String {
    match *w.activity() {
        Activity::Running { cadence, .. } => format!("{cadence} spm"),
        Activity::Cycling { elevation_gain, .. } => format!("{elevation_gain} m"),
    }
}
