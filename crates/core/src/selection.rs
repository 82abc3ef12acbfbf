use crate::render::unit::Point2;
use serde::Serialize;

/// The station under the pointer, plus where the pointer was last seen. The
/// hover tooltip anchors to the pointer, not the marker.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Hover {
    pub station: String,
    pub pointer: Point2,
}

/// Which stations the user is interacting with. Both halves refer to
/// stations by name; the station data itself lives in the view's
/// [StationSet](crate::StationSet).
///
/// The selection is persistent and only changes when the host asks. The
/// hover is transient: it follows the pointer and is cleared when the pointer
/// leaves the map.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct InteractionSelection {
    selected: Option<String>,
    hovered: Option<Hover>,
}

impl InteractionSelection {
    pub fn new(selected: Option<String>) -> Self {
        Self {
            selected,
            hovered: None,
        }
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn hovered(&self) -> Option<&Hover> {
        self.hovered.as_ref()
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.selected() == Some(name)
    }

    pub fn is_hovered(&self, name: &str) -> bool {
        self.hovered.as_ref().map_or(false, |hover| hover.station == name)
    }

    /// Replace the selection. Returns whether anything changed.
    pub fn select(&mut self, name: Option<String>) -> bool {
        if self.selected == name {
            false
        } else {
            self.selected = name;
            true
        }
    }

    /// Mark a station as hovered at the given pointer position, or clear the
    /// hover if the pointer isn't over any station. Returns whether anything
    /// changed, including a pointer move within the same station.
    pub fn hover(&mut self, station: Option<String>, pointer: Point2) -> bool {
        let hovered = station.map(|station| Hover { station, pointer });
        if self.hovered == hovered {
            false
        } else {
            self.hovered = hovered;
            true
        }
    }

    /// Clear the hover. Returns whether there was one.
    pub fn clear_hover(&mut self) -> bool {
        self.hovered.take().is_some()
    }
}
