use crate::dlog;
use crate::geo::{GeoError, Geolocator};
use crate::map::{DEFAULT_ZOOM, MapView, OSM_HOT, Pan};
use crate::render;
use crate::storage::{self, KeyValueStore, WORKOUTS_KEY};
use crate::types::{ActivityKind, LatLng, Workout, workout_id};
use crate::utils::coerce_number;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Inputs have to be positive numbers!")]
    InvalidInput,

    #[error("Click on the map to choose where the workout happened")]
    NoLocation,

    #[error("Could not get your position")]
    Position(#[source] GeoError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Raw values of the creation form, as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormInput {
    pub kind: ActivityKind,
    pub distance: String,
    pub duration: String,
    pub cadence: String,
    pub elevation: String,
}

/// Visible state of the creation form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormState {
    pub visible: bool,
    /// Decides which secondary row is shown: cadence for running, elevation for cycling.
    pub kind: ActivityKind,
    pub distance_focused: bool,
}

impl FormState {
    pub fn shows_cadence(&self) -> bool {
        self.kind == ActivityKind::Running
    }

    pub fn shows_elevation(&self) -> bool {
        self.kind == ActivityKind::Cycling
    }
}

#[derive(Debug)]
pub enum AppEvent<M> {
    PositionResolved { coords: LatLng, map: M },
    PositionFailed(GeoError),
    MapClicked(LatLng),
    TypeChanged(ActivityKind),
    FormSubmitted(FormInput),
    ListClicked(String),
    Reset,
}

pub struct App<M, S> {
    store: S,
    map: Option<M>,
    workouts: Vec<Workout>,
    /// Rendered list entries, newest first.
    entries: VecDeque<String>,
    pending_click: Option<LatLng>,
    form: FormState,
}

impl<M: MapView, S: KeyValueStore> App<M, S> {
    /// Create the controller and restore any stored workouts.
    pub fn new(store: S) -> Result<Self, AppError> {
        let mut app = Self {
            store,
            map: None,
            workouts: Vec::new(),
            entries: VecDeque::new(),
            pending_click: None,
            form: FormState::default(),
        };
        app.load_from_storage()?;
        Ok(app)
    }

    pub fn handle(&mut self, event: AppEvent<M>) -> Result<(), AppError> {
        match event {
            AppEvent::PositionResolved { coords, map } => self.load_map(coords, map),
            AppEvent::PositionFailed(err) => return Err(position_failed(err)),
            AppEvent::MapClicked(coords) => self.handle_map_click(coords),
            AppEvent::TypeChanged(kind) => self.toggle_field(kind),
            AppEvent::FormSubmitted(input) => {
                self.submit_form(input)?;
            }
            AppEvent::ListClicked(id) => {
                self.handle_list_click(&id)?;
            }
            AppEvent::Reset => self.reset()?,
        }
        Ok(())
    }

    /// Look up the current position once and build the map around it.
    ///
    /// On failure the map stays unloaded for the rest of the session.
    pub fn acquire_location(&mut self, geo: &impl Geolocator, map: M) -> Result<(), AppError> {
        match geo.current_position() {
            Ok(coords) => {
                self.load_map(coords, map);
                Ok(())
            }
            Err(err) => Err(position_failed(err)),
        }
    }

    pub fn load_map(&mut self, coords: LatLng, mut map: M) {
        tracing::info!(%coords, "position acquired; loading map");
        map.set_view(coords, DEFAULT_ZOOM, None);
        map.add_tile_layer(&OSM_HOT);

        for w in &self.workouts {
            map.render_marker(w.coords(), &render::popup(w));
        }

        self.map = Some(map);
    }

    pub fn handle_map_click(&mut self, coords: LatLng) {
        if self.map.is_none() {
            dlog!("map click ignored; map not loaded");
            return;
        }
        self.pending_click = Some(coords);
        self.form.visible = true;
        self.form.distance_focused = true;
    }

    /// Show the secondary input that belongs to `kind`.
    pub fn toggle_field(&mut self, kind: ActivityKind) {
        if self.form.kind != kind {
            self.toggle_elevation_field();
        }
    }

    /// Swap the cadence and elevation rows.
    pub fn toggle_elevation_field(&mut self) {
        self.form.kind = self.form.kind.toggled();
        dlog!("form shows {} fields", self.form.kind);
    }

    /// Validate the form and create a workout at the last clicked position.
    ///
    /// Nothing changes when validation fails.
    pub fn submit_form(&mut self, input: FormInput) -> Result<&Workout, AppError> {
        let coords = self.pending_click.ok_or(AppError::NoLocation)?;
        let now = Utc::now();
        let distance = coerce_number(&input.distance);
        let duration = coerce_number(&input.duration);

        let workout = match input.kind {
            ActivityKind::Running => {
                let cadence = coerce_number(&input.cadence);
                if !all_finite(&[distance, duration, cadence])
                    || !all_positive(&[distance, duration, cadence])
                {
                    return Err(invalid_input(&input));
                }
                Workout::running(coords, distance, duration, cadence, now, self.next_id(now))
            }
            ActivityKind::Cycling => {
                let elevation = coerce_number(&input.elevation);
                if !all_finite(&[distance, duration, elevation])
                    || !all_positive(&[distance, duration])
                {
                    return Err(invalid_input(&input));
                }
                Workout::cycling(coords, distance, duration, elevation, now, self.next_id(now))
            }
        };

        let entry = render::render_entry(&workout)?;
        if let Some(map) = self.map.as_mut() {
            map.render_marker(workout.coords(), &render::popup(&workout));
        }
        self.entries.push_front(entry);

        tracing::info!(
            id = workout.id(),
            kind = %workout.kind(),
            distance = workout.distance(),
            duration = workout.duration(),
            "workout created"
        );

        let idx = self.workouts.len();
        self.workouts.push(workout);
        self.hide_form();
        self.save_to_storage()?;

        Ok(&self.workouts[idx])
    }

    /// Pan the map to the workout with `id`. Returns where the view moved to.
    pub fn handle_list_click(&mut self, id: &str) -> Result<Option<LatLng>, AppError> {
        let Some(map) = self.map.as_mut() else {
            dlog!("list click ignored; map not loaded");
            return Ok(None);
        };
        let Some(workout) = self.workouts.iter_mut().find(|w| w.id() == id) else {
            dlog!("list click on unknown id={id}");
            return Ok(None);
        };

        let coords = workout.coords();
        map.set_view(coords, DEFAULT_ZOOM, Some(Pan::default()));
        workout.click();
        dlog!("workout id={id} clicks={}", workout.clicks());

        self.save_to_storage()?;
        Ok(Some(coords))
    }

    pub fn load_from_storage(&mut self) -> Result<(), AppError> {
        let workouts = storage::load_workouts(&self.store)?;
        if workouts.is_empty() {
            return Ok(());
        }

        tracing::info!(count = workouts.len(), "restored workouts");
        for w in &workouts {
            self.entries.push_front(render::render_entry(w)?);
        }
        self.workouts = workouts;
        Ok(())
    }

    pub fn save_to_storage(&mut self) -> Result<(), AppError> {
        storage::save_workouts(&mut self.store, &self.workouts)?;
        Ok(())
    }

    /// Drop all persisted workouts and start over as if freshly opened.
    pub fn reset(&mut self) -> Result<(), AppError> {
        self.store.remove(WORKOUTS_KEY)?;
        tracing::info!(dropped = self.workouts.len(), "reset");

        self.workouts.clear();
        self.entries.clear();
        self.pending_click = None;
        self.form = FormState::default();
        if let Some(map) = self.map.as_mut() {
            map.clear_markers();
        }

        self.load_from_storage()
    }

    pub fn workouts(&self) -> &[Workout] {
        &self.workouts
    }

    pub const fn form(&self) -> &FormState {
        &self.form
    }

    pub const fn pending_click(&self) -> Option<LatLng> {
        self.pending_click
    }

    pub const fn map(&self) -> Option<&M> {
        self.map.as_ref()
    }

    pub const fn is_map_loaded(&self) -> bool {
        self.map.is_some()
    }

    /// Rendered list entries, newest first.
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn list_html(&self) -> String {
        let mut html = String::from("<ul class=\"workouts\">");
        for entry in &self.entries {
            html.push_str(entry);
        }
        html.push_str("</ul>");
        html
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn hide_form(&mut self) {
        self.form.visible = false;
        self.form.distance_focused = false;
        self.pending_click = None;
    }

    /// Timestamp-derived id, bumped until it is unused in this session.
    fn next_id(&self, now: DateTime<Utc>) -> String {
        let mut ms = now.timestamp_millis();
        loop {
            let id = workout_id(ms);
            if !self.workouts.iter().any(|w| w.id() == id) {
                return id;
            }
            ms += 1;
        }
    }
}

fn all_finite(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite())
}

fn all_positive(values: &[f64]) -> bool {
    values.iter().all(|&v| v > 0.0)
}

fn invalid_input(input: &FormInput) -> AppError {
    tracing::warn!(?input, "rejected workout form");
    AppError::InvalidInput
}

fn position_failed(err: GeoError) -> AppError {
    tracing::warn!(%err, "geolocation failed; map disabled");
    AppError::Position(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::FixedGeolocator;
    use crate::map::TerminalMap;
    use crate::storage::MemoryStore;

    const HOME: LatLng = LatLng::new(38.72, -9.14);

    fn loaded_app() -> App<TerminalMap, MemoryStore> {
        let mut app = App::new(MemoryStore::new()).unwrap();
        app.acquire_location(&FixedGeolocator::new(Some(HOME)), TerminalMap::new())
            .unwrap();
        app
    }

    fn run_input(distance: &str, duration: &str, cadence: &str) -> FormInput {
        FormInput {
            kind: ActivityKind::Running,
            distance: distance.into(),
            duration: duration.into(),
            cadence: cadence.into(),
            elevation: String::new(),
        }
    }

    fn ride_input(distance: &str, duration: &str, elevation: &str) -> FormInput {
        FormInput {
            kind: ActivityKind::Cycling,
            distance: distance.into(),
            duration: duration.into(),
            cadence: String::new(),
            elevation: elevation.into(),
        }
    }

    #[test]
    fn location_failure_leaves_map_unloaded() {
        let mut app: App<TerminalMap, _> = App::new(MemoryStore::new()).unwrap();
        let err = app
            .acquire_location(
                &FixedGeolocator::failing(GeoError::PermissionDenied),
                TerminalMap::new(),
            )
            .unwrap_err();

        assert!(matches!(err, AppError::Position(GeoError::PermissionDenied)));
        assert_eq!(err.to_string(), "Could not get your position");
        assert!(!app.is_map_loaded());

        app.handle_map_click(HOME);
        assert!(!app.form().visible);
        assert_eq!(app.pending_click(), None);
    }

    #[test]
    fn map_loads_at_position_with_tiles() {
        let app = loaded_app();
        let map = app.map().unwrap();
        assert_eq!(map.center(), Some(HOME));
        assert_eq!(map.zoom(), DEFAULT_ZOOM);
        assert_eq!(map.layers(), &[OSM_HOT]);
        assert!(map.markers().is_empty());
    }

    #[test]
    fn map_click_opens_form() {
        let mut app = loaded_app();
        let at = LatLng::new(38.7, -9.1);
        app.handle_map_click(at);

        assert_eq!(app.pending_click(), Some(at));
        assert!(app.form().visible);
        assert!(app.form().distance_focused);
    }

    #[test]
    fn valid_run_is_added_rendered_and_saved() {
        let mut app = loaded_app();
        let at = LatLng::new(38.7, -9.1);
        app.handle_map_click(at);

        let w = app.submit_form(run_input("5", "30", "150")).unwrap();
        assert_eq!(w.pace(), Some(6.0));
        assert_eq!(w.coords(), at);

        assert_eq!(app.workouts().len(), 1);
        assert_eq!(app.entries().count(), 1);
        assert!(!app.form().visible);
        assert!(!app.form().distance_focused);
        assert_eq!(app.pending_click(), None);

        let map = app.map().unwrap();
        assert_eq!(map.markers().len(), 1);
        assert_eq!(map.markers()[0].at, at);

        let saved = app.store().get(WORKOUTS_KEY).unwrap().unwrap();
        assert!(saved.contains("\"type\":\"running\""));
    }

    #[test]
    fn invalid_input_changes_nothing() {
        let mut app = loaded_app();
        app.handle_map_click(LatLng::new(1.0, 1.0));

        for input in [
            run_input("abc", "30", "150"),
            run_input("5", "", "150"),
            run_input("5", "30", "0"),
            run_input("-5", "30", "150"),
            run_input("5", "inf", "150"),
            ride_input("0", "30", "10"),
            ride_input("10", "-1", "10"),
            ride_input("10", "30", "NaN"),
            ride_input("10", "30", "high"),
        ] {
            let err = app.submit_form(input).unwrap_err();
            assert!(matches!(err, AppError::InvalidInput));
        }

        assert!(app.workouts().is_empty());
        assert_eq!(app.entries().count(), 0);
        assert!(app.map().unwrap().markers().is_empty());
        assert!(app.form().visible);
        assert_eq!(app.store().get(WORKOUTS_KEY).unwrap(), None);
    }

    #[test]
    fn elevation_may_be_negative_or_zero() {
        let mut app = loaded_app();
        app.handle_map_click(LatLng::new(1.0, 1.0));
        let w = app.submit_form(ride_input("20", "60", "-35")).unwrap();
        assert_eq!(w.speed(), Some(20.0));

        app.handle_map_click(LatLng::new(1.0, 1.0));
        app.submit_form(ride_input("20", "60", "")).unwrap();
        assert_eq!(app.workouts().len(), 2);
    }

    #[test]
    fn submit_without_click_is_rejected() {
        let mut app = loaded_app();
        let err = app.submit_form(run_input("5", "30", "150")).unwrap_err();
        assert!(matches!(err, AppError::NoLocation));
        assert!(app.workouts().is_empty());
    }

    #[test]
    fn ids_stay_unique_within_a_session() {
        let mut app = loaded_app();
        for _ in 0..5 {
            app.handle_map_click(HOME);
            app.submit_form(run_input("1", "5", "170")).unwrap();
        }
        let mut ids: Vec<_> = app.workouts().iter().map(Workout::id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 5);
    }

    #[test]
    fn toggle_swaps_secondary_field() {
        let mut app = loaded_app();
        assert!(app.form().shows_cadence());

        app.toggle_field(ActivityKind::Cycling);
        assert!(app.form().shows_elevation());
        assert!(!app.form().shows_cadence());

        app.toggle_field(ActivityKind::Cycling);
        assert!(app.form().shows_elevation());

        app.toggle_elevation_field();
        assert!(app.form().shows_cadence());
    }

    #[test]
    fn list_click_pans_to_stored_coords() {
        let mut app = loaded_app();
        let first = LatLng::new(38.701, -9.175);
        let second = LatLng::new(38.75, -9.2);

        app.handle_map_click(first);
        let id = app.submit_form(run_input("5", "30", "150")).unwrap().id().to_string();
        app.handle_map_click(second);
        app.submit_form(ride_input("20", "60", "100")).unwrap();

        let moved = app.handle_list_click(&id).unwrap();
        assert_eq!(moved, Some(first));

        let map = app.map().unwrap();
        assert_eq!(map.center(), Some(first));
        assert_eq!(map.zoom(), DEFAULT_ZOOM);
        assert_eq!(map.last_pan(), Some(Pan::default()));
        assert_eq!(app.workouts()[0].clicks(), 1);

        assert_eq!(app.handle_list_click("nope").unwrap(), None);
    }

    #[test]
    fn events_drive_the_same_handlers() {
        let mut app: App<TerminalMap, _> = App::new(MemoryStore::new()).unwrap();
        app.handle(AppEvent::PositionResolved {
            coords: HOME,
            map: TerminalMap::new(),
        })
        .unwrap();
        app.handle(AppEvent::MapClicked(HOME)).unwrap();
        app.handle(AppEvent::TypeChanged(ActivityKind::Cycling)).unwrap();
        app.handle(AppEvent::FormSubmitted(ride_input("12", "40", "80")))
            .unwrap();
        assert_eq!(app.workouts().len(), 1);
        assert!(app.form().shows_elevation());

        let err = app
            .handle(AppEvent::PositionFailed(GeoError::Timeout))
            .unwrap_err();
        assert!(matches!(err, AppError::Position(GeoError::Timeout)));

        app.handle(AppEvent::Reset).unwrap();
        assert!(app.workouts().is_empty());
    }

    #[test]
    fn reset_clears_everything() {
        let mut app = loaded_app();
        app.handle_map_click(HOME);
        app.submit_form(run_input("5", "30", "150")).unwrap();

        app.reset().unwrap();

        assert!(app.workouts().is_empty());
        assert_eq!(app.entries().count(), 0);
        assert!(app.map().unwrap().markers().is_empty());
        assert_eq!(app.store().get(WORKOUTS_KEY).unwrap(), None);
        assert_eq!(app.list_html(), "<ul class=\"workouts\"></ul>");
    }
}
