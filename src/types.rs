use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Geographic position. Persisted as a `[lat, lng]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl From<[f64; 2]> for LatLng {
    fn from([lat, lng]: [f64; 2]) -> Self {
        Self { lat, lng }
    }
}

impl From<LatLng> for [f64; 2] {
    fn from(c: LatLng) -> Self {
        [c.lat, c.lng]
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseLatLngError {
    #[error("expected LAT,LNG but got {0:?}")]
    Format(String),
    #[error("latitude {0} is outside -90..=90")]
    Latitude(f64),
    #[error("longitude {0} is outside -180..=180")]
    Longitude(f64),
}

impl FromStr for LatLng {
    type Err = ParseLatLngError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ParseLatLngError::Format(s.to_string());

        let (lat, lng) = s.split_once(',').ok_or_else(bad)?;
        let lat: f64 = lat.trim().parse().map_err(|_| bad())?;
        let lng: f64 = lng.trim().parse().map_err(|_| bad())?;

        if !(-90.0..=90.0).contains(&lat) {
            return Err(ParseLatLngError::Latitude(lat));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(ParseLatLngError::Longitude(lng));
        }

        Ok(Self { lat, lng })
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    #[default]
    Running,
    Cycling,
}

impl ActivityKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Cycling => "cycling",
        }
    }

    /// Capitalised name used in descriptions.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Running => "Running",
            Self::Cycling => "Cycling",
        }
    }

    pub const fn icon(self) -> &'static str {
        match self {
            Self::Running => "🏃‍♂️",
            Self::Cycling => "🚴‍♀️",
        }
    }

    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Running => Self::Cycling,
            Self::Cycling => Self::Running,
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Activity-specific input plus the metric derived from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Activity {
    /// `pace` is min/km.
    Running { cadence: f64, pace: f64 },
    /// `speed` is km/h.
    #[serde(rename_all = "camelCase")]
    Cycling { elevation_gain: f64, speed: f64 },
}

impl Activity {
    pub const fn kind(&self) -> ActivityKind {
        match self {
            Self::Running { .. } => ActivityKind::Running,
            Self::Cycling { .. } => ActivityKind::Cycling,
        }
    }
}

pub fn calc_pace(distance: f64, duration: f64) -> f64 {
    duration / distance
}

pub fn calc_speed(distance: f64, duration: f64) -> f64 {
    distance / (duration / 60.0)
}

/// Id derived from a creation timestamp: the last 10 digits of its Unix milliseconds.
pub fn workout_id(timestamp_ms: i64) -> String {
    let s = timestamp_ms.to_string();
    s[s.len().saturating_sub(10)..].to_string()
}

/// A logged workout.
///
/// Pace/speed and the description are computed when the value is built and
/// never touched again; the click counter is the only mutable field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Workout {
    date: DateTime<Utc>,
    id: String,
    coords: LatLng,
    distance: f64,
    duration: f64,
    clicks: u32,
    description: String,
    #[serde(flatten)]
    activity: Activity,
}

impl Workout {
    pub fn running(
        coords: LatLng,
        distance: f64,
        duration: f64,
        cadence: f64,
        date: DateTime<Utc>,
        id: String,
    ) -> Self {
        let activity = Activity::Running {
            cadence,
            pace: calc_pace(distance, duration),
        };
        Self::build(date, id, coords, distance, duration, 0, activity)
    }

    pub fn cycling(
        coords: LatLng,
        distance: f64,
        duration: f64,
        elevation_gain: f64,
        date: DateTime<Utc>,
        id: String,
    ) -> Self {
        let activity = Activity::Cycling {
            elevation_gain,
            speed: calc_speed(distance, duration),
        };
        Self::build(date, id, coords, distance, duration, 0, activity)
    }

    /// Rebuild a workout from persisted plain data, recomputing the derived fields.
    pub fn restore(stored: StoredWorkout) -> Self {
        let StoredWorkout {
            date,
            id,
            coords,
            distance,
            duration,
            clicks,
            metric,
        } = stored;

        let mut w = match metric {
            StoredMetric::Running { cadence } => {
                Self::running(coords, distance, duration, cadence, date, id)
            }
            StoredMetric::Cycling { elevation_gain } => {
                Self::cycling(coords, distance, duration, elevation_gain, date, id)
            }
        };
        w.clicks = clicks;
        w
    }

    fn build(
        date: DateTime<Utc>,
        id: String,
        coords: LatLng,
        distance: f64,
        duration: f64,
        clicks: u32,
        activity: Activity,
    ) -> Self {
        let description = describe(activity.kind(), date);
        Self {
            date,
            id,
            coords,
            distance,
            duration,
            clicks,
            description,
            activity,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub const fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub const fn coords(&self) -> LatLng {
        self.coords
    }

    pub const fn distance(&self) -> f64 {
        self.distance
    }

    pub const fn duration(&self) -> f64 {
        self.duration
    }

    pub const fn clicks(&self) -> u32 {
        self.clicks
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub const fn activity(&self) -> &Activity {
        &self.activity
    }

    pub const fn kind(&self) -> ActivityKind {
        self.activity.kind()
    }

    pub const fn pace(&self) -> Option<f64> {
        match self.activity {
            Activity::Running { pace, .. } => Some(pace),
            Activity::Cycling { .. } => None,
        }
    }

    pub const fn speed(&self) -> Option<f64> {
        match self.activity {
            Activity::Cycling { speed, .. } => Some(speed),
            Activity::Running { .. } => None,
        }
    }

    pub fn click(&mut self) {
        self.clicks = self.clicks.saturating_add(1);
    }
}

/// "Running on April 14", using the calendar day of the local timezone.
fn describe(kind: ActivityKind, date: DateTime<Utc>) -> String {
    let local = date.with_timezone(&Local);
    format!("{} on {}", kind.label(), local.format("%B %-d"))
}

/// A persisted workout record as read back from storage.
///
/// Derived fields (`pace`, `speed`, `description`) may be present in the
/// stored JSON but are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StoredWorkout {
    pub date: DateTime<Utc>,
    pub id: String,
    pub coords: LatLng,
    pub distance: f64,
    pub duration: f64,
    #[serde(default)]
    pub clicks: u32,
    #[serde(flatten)]
    pub metric: StoredMetric,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoredMetric {
    Running {
        cadence: f64,
    },
    #[serde(rename_all = "camelCase")]
    Cycling {
        elevation_gain: f64,
    },
}
