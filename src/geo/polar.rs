//! Polar product georeference (`/where` of SCAN and PVOL products).

use crate::data::DataNode;
use crate::error::{OdimError, Result};

/// Radar site position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadarSite {
    /// Antenna height above sea level in metres.
    pub height: f64,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

/// Geometry of one sweep, from a dataset's own `where` group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanGeometry {
    /// Range bins per ray (`nbins`).
    pub bin_count: u64,
    /// Rays per sweep (`nrays`).
    pub ray_count: u64,
    /// Range bin length in metres (`rscale`).
    pub range_scale: f64,
    /// Range of the first bin start in kilometres (`rstart`).
    pub range_start: f64,
}

impl ScanGeometry {
    /// Read geometry from a dataset `where` node. `None` if any key is absent
    /// or not numeric.
    pub fn from_node(node: &DataNode) -> Option<Self> {
        let count = |key: &str| node.attr(key)?.as_i64().and_then(|v| u64::try_from(v).ok());
        let number = |key: &str| node.attr(key)?.as_f64();
        Some(Self {
            bin_count: count("nbins")?,
            ray_count: count("nrays")?,
            range_scale: number("rscale")?,
            range_start: number("rstart")?,
        })
    }
}

/// Georeference of a polar product.
///
/// The site is fixed for the file. The scan geometry is unknown until a
/// quantity lookup sets it, and each lookup in another sweep replaces it.
#[derive(Debug, Clone, PartialEq)]
pub struct PolarGeoReference {
    site: RadarSite,
    geometry: Option<ScanGeometry>,
}

impl PolarGeoReference {
    /// Create from a known site.
    pub fn new(site: RadarSite) -> Self {
        Self {
            site,
            geometry: None,
        }
    }

    /// Read the site from the root `/where` node; `height`, `lat` and `lon`
    /// must all be numeric.
    pub fn from_node(node: &DataNode) -> Result<Self> {
        let number = |key: &str| match node.attr(key) {
            Some(value) => value
                .as_f64()
                .ok_or_else(|| OdimError::invalid_attribute(node.path.as_str(), key, "numeric")),
            None => Err(OdimError::missing_attribute(node.path.as_str(), key)),
        };
        Ok(Self::new(RadarSite {
            height: number("height")?,
            lat: number("lat")?,
            lon: number("lon")?,
        }))
    }

    /// Radar site.
    pub fn site(&self) -> RadarSite {
        self.site
    }

    /// Geometry of the most recently accessed sweep.
    pub fn geometry(&self) -> Option<ScanGeometry> {
        self.geometry
    }

    /// Overwrite the sweep geometry.
    pub fn set_geometry(&mut self, geometry: ScanGeometry) {
        self.geometry = Some(geometry);
    }

    /// Forget the sweep geometry.
    pub fn clear_geometry(&mut self) {
        self.geometry = None;
    }
}
