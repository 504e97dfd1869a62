use crate::types::LatLng;

pub const DEFAULT_ZOOM: u8 = 13;

/// Base tile layer description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileLayer {
    pub url_template: &'static str,
    pub attribution: &'static str,
}

pub const OSM_HOT: TileLayer = TileLayer {
    url_template: "https://{s}.tile.openstreetmap.fr/hot/{z}/{x}/{y}.png",
    attribution: "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors",
};

/// Animated pan used when jumping to a workout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pan {
    pub animate: bool,
    pub duration_secs: f64,
}

impl Default for Pan {
    fn default() -> Self {
        Self {
            animate: true,
            duration_secs: 1.0,
        }
    }
}

/// Marker popup. Stays open until explicitly closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Popup {
    pub content: String,
    pub class_name: String,
    pub max_width: u32,
    pub min_width: u32,
    pub auto_close: bool,
    pub close_on_click: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub at: LatLng,
    pub popup: Popup,
}

pub trait MapView {
    fn set_view(&mut self, center: LatLng, zoom: u8, pan: Option<Pan>);
    fn add_tile_layer(&mut self, layer: &TileLayer);
    fn render_marker(&mut self, at: LatLng, popup: &Popup);
    fn clear_markers(&mut self);
}

/// Map that keeps its state in memory and reports changes through `tracing`.
#[derive(Debug, Default)]
pub struct TerminalMap {
    center: Option<LatLng>,
    zoom: u8,
    last_pan: Option<Pan>,
    layers: Vec<TileLayer>,
    markers: Vec<Marker>,
}

impl TerminalMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn center(&self) -> Option<LatLng> {
        self.center
    }

    pub const fn zoom(&self) -> u8 {
        self.zoom
    }

    pub const fn last_pan(&self) -> Option<Pan> {
        self.last_pan
    }

    pub fn layers(&self) -> &[TileLayer] {
        &self.layers
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Link to the current view on openstreetmap.org.
    pub fn osm_url(&self) -> Option<String> {
        self.center.map(|c| {
            format!(
                "https://www.openstreetmap.org/#map={}/{:.5}/{:.5}",
                self.zoom, c.lat, c.lng
            )
        })
    }
}

impl MapView for TerminalMap {
    fn set_view(&mut self, center: LatLng, zoom: u8, pan: Option<Pan>) {
        tracing::info!(%center, zoom, animate = pan.is_some_and(|p| p.animate), "map view");
        self.center = Some(center);
        self.zoom = zoom;
        self.last_pan = pan;
    }

    fn add_tile_layer(&mut self, layer: &TileLayer) {
        tracing::debug!(url = layer.url_template, "tile layer added");
        self.layers.push(*layer);
    }

    fn render_marker(&mut self, at: LatLng, popup: &Popup) {
        tracing::debug!(%at, content = %popup.content, "marker");
        self.markers.push(Marker {
            at,
            popup: popup.clone(),
        });
    }

    fn clear_markers(&mut self) {
        self.markers.clear();
    }
}
