//! Georeferencing of Cartesian and polar products.

mod cartesian;
mod polar;

pub use cartesian::{
    BoundingBox, Corner, GeoReference, GeoReferenceBuilder, LatLon, UPPER_LEFT_ROW_OFFSET,
};
pub use polar::{PolarGeoReference, RadarSite, ScanGeometry};

/// Georeference of an open product, chosen by its object kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Georeference {
    /// Projected grid (IMAGE, COMP, ...).
    Cartesian(GeoReference),
    /// Radar-centred sweeps (SCAN, PVOL).
    Polar(PolarGeoReference),
}

impl Georeference {
    /// Cartesian georeference, if this is one.
    pub fn as_cartesian(&self) -> Option<&GeoReference> {
        match self {
            Self::Cartesian(geo) => Some(geo),
            Self::Polar(_) => None,
        }
    }

    /// Polar georeference, if this is one.
    pub fn as_polar(&self) -> Option<&PolarGeoReference> {
        match self {
            Self::Polar(geo) => Some(geo),
            Self::Cartesian(_) => None,
        }
    }
}
