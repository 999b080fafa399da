//! Map surface capability trait
//!
//! The controller never talks to a concrete map widget; it calls this small
//! capability interface and tolerates having no surface at all. The terminal
//! client uses [`LogMap`], headless tests use [`NoopMap`] or [`RecordingMap`].

use std::sync::Mutex;

use tracing::info;

use crate::game::geo::LatLon;

/// Operations the controller needs from a map widget.
///
/// Implementations must be cheap and infallible; a surface that cannot draw
/// simply does nothing.
pub trait MapSurface: Send + Sync {
    /// Place (or move) the player's own guess marker. At reveal time the
    /// bearing towards the solution is supplied for a directional icon.
    fn add_guess_marker(&self, at: LatLon, bearing_deg: Option<f64>);

    /// Place the revealed true-location marker
    fn add_solution_marker(&self, at: LatLon);

    /// Draw the guess-to-solution line
    fn draw_line(&self, from: LatLon, to: LatLon);

    /// Zoom/pan so both points are visible
    fn fit_bounds(&self, a: LatLon, b: LatLon);

    /// Lock or unlock all map interaction
    fn set_locked(&self, locked: bool);

    /// Remove markers and lines left over from the previous round
    fn clear_round_graphics(&self);

    /// Current view center, if the surface has one
    fn center(&self) -> Option<LatLon>;
}

/// Surface that ignores every call. Used where no map exists.
pub struct NoopMap;

impl MapSurface for NoopMap {
    fn add_guess_marker(&self, _at: LatLon, _bearing_deg: Option<f64>) {}
    fn add_solution_marker(&self, _at: LatLon) {}
    fn draw_line(&self, _from: LatLon, _to: LatLon) {}
    fn fit_bounds(&self, _a: LatLon, _b: LatLon) {}
    fn set_locked(&self, _locked: bool) {}
    fn clear_round_graphics(&self) {}
    fn center(&self) -> Option<LatLon> {
        None
    }
}

/// Surface for the terminal client: describes marker operations at info level
pub struct LogMap;

impl MapSurface for LogMap {
    fn add_guess_marker(&self, at: LatLon, bearing_deg: Option<f64>) {
        match bearing_deg {
            Some(bearing) => {
                info!(lat = at.lat, lon = at.lon, bearing = bearing, "guess marker")
            }
            None => info!(lat = at.lat, lon = at.lon, "guess marker"),
        }
    }

    fn add_solution_marker(&self, at: LatLon) {
        info!(lat = at.lat, lon = at.lon, "solution marker");
    }

    fn draw_line(&self, from: LatLon, to: LatLon) {
        info!(
            from_lat = from.lat,
            from_lon = from.lon,
            to_lat = to.lat,
            to_lon = to.lon,
            "guess line"
        );
    }

    fn fit_bounds(&self, a: LatLon, b: LatLon) {
        info!(
            a_lat = a.lat,
            a_lon = a.lon,
            b_lat = b.lat,
            b_lon = b.lon,
            "fit bounds"
        );
    }

    fn set_locked(&self, locked: bool) {
        info!(locked, "map interaction");
    }

    fn clear_round_graphics(&self) {
        info!("clear round graphics");
    }

    fn center(&self) -> Option<LatLon> {
        None
    }
}

/// Every observable map operation, recorded by [`RecordingMap`]
#[derive(Debug, Clone, PartialEq)]
pub enum MapCall {
    GuessMarker(LatLon, Option<f64>),
    SolutionMarker(LatLon),
    Line(LatLon, LatLon),
    FitBounds(LatLon, LatLon),
    SetLocked(bool),
    ClearRoundGraphics,
}

/// Test surface that records calls and reports a configurable center
#[derive(Default)]
pub struct RecordingMap {
    calls: Mutex<Vec<MapCall>>,
    center: Option<LatLon>,
}

impl RecordingMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_center(center: LatLon) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            center: Some(center),
        }
    }

    pub fn calls(&self) -> Vec<MapCall> {
        // A panic mid-assertion must not hide the calls made before it
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn push(&self, call: MapCall) {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(call);
    }
}

impl MapSurface for RecordingMap {
    fn add_guess_marker(&self, at: LatLon, bearing_deg: Option<f64>) {
        self.push(MapCall::GuessMarker(at, bearing_deg));
    }

    fn add_solution_marker(&self, at: LatLon) {
        self.push(MapCall::SolutionMarker(at));
    }

    fn draw_line(&self, from: LatLon, to: LatLon) {
        self.push(MapCall::Line(from, to));
    }

    fn fit_bounds(&self, a: LatLon, b: LatLon) {
        self.push(MapCall::FitBounds(a, b));
    }

    fn set_locked(&self, locked: bool) {
        self.push(MapCall::SetLocked(locked));
    }

    fn clear_round_graphics(&self) {
        self.push(MapCall::ClearRoundGraphics);
    }

    fn center(&self) -> Option<LatLon> {
        self.center
    }
}
