//! Map marker for the resolved location.
//!
//! The map itself is rendered elsewhere; this module only describes what to
//! show: a center, a zoom level, an OpenStreetMap tile layer and a popup.

use crate::model::Coordinates;

pub const DEFAULT_ZOOM: u8 = 13;
pub const MAX_ZOOM: u8 = 19;
pub const TILE_URL_TEMPLATE: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const TILE_ATTRIBUTION: &str = "© OpenStreetMap contributors";

/// Web Mercator cannot represent the poles.
const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_78;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapMarker {
    center: Coordinates,
    zoom: u8,
    popup: String,
}

impl MapMarker {
    pub fn new(center: Coordinates, popup: impl Into<String>) -> Self {
        Self {
            center,
            zoom: DEFAULT_ZOOM,
            popup: popup.into(),
        }
    }

    pub fn center(&self) -> Coordinates {
        self.center
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn popup(&self) -> &str {
        &self.popup
    }

    /// Slippy-map tile containing the marker. Zoom is capped at [`MAX_ZOOM`].
    pub fn tile(&self) -> TileCoord {
        let zoom = self.zoom.min(MAX_ZOOM);
        let n = f64::from(1u32 << zoom);
        let max_index = (1u32 << zoom) - 1;

        let lon = self.center.longitude.clamp(-180.0, 180.0);
        let lat = self
            .center
            .latitude
            .clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE)
            .to_radians();

        let x = ((lon + 180.0) / 360.0 * n).floor();
        let y = ((1.0 - lat.tan().asinh() / std::f64::consts::PI) / 2.0 * n).floor();

        TileCoord {
            x: (x.max(0.0) as u32).min(max_index),
            y: (y.max(0.0) as u32).min(max_index),
            z: zoom,
        }
    }

    pub fn tile_url(&self) -> String {
        let tile = self.tile();
        TILE_URL_TEMPLATE
            .replace("{z}", &tile.z.to_string())
            .replace("{x}", &tile.x.to_string())
            .replace("{y}", &tile.y.to_string())
    }

    /// Browsable link with a marker at the center.
    pub fn openstreetmap_url(&self) -> String {
        let Coordinates {
            latitude,
            longitude,
        } = self.center;
        format!(
            "https://www.openstreetmap.org/?mlat={latitude}&mlon={longitude}#map={}/{latitude}/{longitude}",
            self.zoom.min(MAX_ZOOM)
        )
    }
}
