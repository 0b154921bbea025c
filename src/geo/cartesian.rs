//! Cartesian product georeference (`/where` of IMAGE and COMP products).

use crate::data::{AttrValue, DataNode};
use crate::error::{OdimError, Result};
use std::fmt;
use std::str::FromStr;

/// Number of pixels the producer reports the upper-left corner above its
/// true position.
///
/// Set to `0.0` once upstream products place UL correctly.
pub const UPPER_LEFT_ROW_OFFSET: f64 = 1.0;

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lon: f64,
}

impl LatLon {
    /// Create a position.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// One of the four image corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    /// Upper left.
    UpperLeft,
    /// Upper right.
    UpperRight,
    /// Lower left.
    LowerLeft,
    /// Lower right.
    LowerRight,
}

/// Geographic extent of the four corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Westernmost corner longitude.
    pub min_lon: f64,
    /// Easternmost corner longitude.
    pub max_lon: f64,
    /// Southernmost corner latitude.
    pub min_lat: f64,
    /// Northernmost corner latitude.
    pub max_lat: f64,
}

/// Georeference of a Cartesian product.
///
/// The bounding box is never stored; it is derived from the corners on every
/// call, so it cannot drift from them.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoReference {
    projdef: String,
    xscale: f64,
    yscale: f64,
    xsize: f64,
    ysize: f64,
    ul: LatLon,
    ur: LatLon,
    ll: LatLon,
    lr: LatLon,
}

impl GeoReference {
    /// Start a builder; every field must be given explicitly or read from a node.
    pub fn builder() -> GeoReferenceBuilder {
        GeoReferenceBuilder::default()
    }

    /// Read a georeference from the attributes of a `/where` node.
    pub fn from_node(node: &DataNode) -> Result<Self> {
        Self::builder().with_node(node).build()
    }

    /// Projection definition (PROJ string).
    pub fn projdef(&self) -> &str {
        &self.projdef
    }

    /// Pixel width in projection units.
    pub fn xscale(&self) -> f64 {
        self.xscale
    }

    /// Pixel height in projection units.
    pub fn yscale(&self) -> f64 {
        self.yscale
    }

    /// Number of columns.
    pub fn xsize(&self) -> f64 {
        self.xsize
    }

    /// Number of rows.
    pub fn ysize(&self) -> f64 {
        self.ysize
    }

    /// Position of a corner.
    pub fn corner(&self, corner: Corner) -> LatLon {
        match corner {
            Corner::UpperLeft => self.ul,
            Corner::UpperRight => self.ur,
            Corner::LowerLeft => self.ll,
            Corner::LowerRight => self.lr,
        }
    }

    /// Move a corner.
    pub fn set_corner(&mut self, corner: Corner, position: LatLon) {
        match corner {
            Corner::UpperLeft => self.ul = position,
            Corner::UpperRight => self.ur = position,
            Corner::LowerLeft => self.ll = position,
            Corner::LowerRight => self.lr = position,
        }
    }

    /// Componentwise min/max over the four corners.
    pub fn bounding_box(&self) -> BoundingBox {
        let corners = [self.ul, self.ur, self.ll, self.lr];
        let lons = corners.iter().map(|c| c.lon);
        let lats = corners.iter().map(|c| c.lat);
        BoundingBox {
            min_lon: lons.clone().fold(f64::INFINITY, f64::min),
            max_lon: lons.fold(f64::NEG_INFINITY, f64::max),
            min_lat: lats.clone().fold(f64::INFINITY, f64::min),
            max_lat: lats.fold(f64::NEG_INFINITY, f64::max),
        }
    }

    /// Canonical description string.
    ///
    /// `key=value` pairs joined by `, ` in a fixed order; scales and sizes
    /// with one decimal, corner coordinates with ten.
    pub fn describe(&self) -> String {
        self.format_with_scales(self.xscale, self.yscale, self.xsize, self.ysize)
    }

    /// Description in the form older tooling emitted it, with xscale, yscale,
    /// xsize and ysize all printed from xsize.
    ///
    /// Only for comparing against strings already stored by that tooling;
    /// it does not round-trip through [`GeoReference::parse`].
    pub fn describe_legacy(&self) -> String {
        self.format_with_scales(self.xsize, self.xsize, self.xsize, self.xsize)
    }

    fn format_with_scales(&self, xscale: f64, yscale: f64, xsize: f64, ysize: f64) -> String {
        format!(
            "projdef={}, xscale={:.1}, yscale={:.1}, xsize={:.1}, ysize={:.1}, \
             ul_lat={:.10}, ul_lon={:.10}, ur_lat={:.10}, ur_lon={:.10}, \
             ll_lat={:.10}, ll_lon={:.10}, lr_lat={:.10}, lr_lon={:.10}",
            self.projdef,
            xscale,
            yscale,
            xsize,
            ysize,
            self.ul.lat,
            self.ul.lon,
            self.ur.lat,
            self.ur.lon,
            self.ll.lat,
            self.ll.lon,
            self.lr.lat,
            self.lr.lon,
        )
    }

    /// Parse a string produced by [`GeoReference::describe`].
    ///
    /// Unknown keys are ignored; a missing key is an error.
    pub fn parse(description: &str) -> Result<Self> {
        let mut builder = Self::builder();
        for part in description.split(", ") {
            let Some((key, raw)) = part.split_once('=') else {
                continue;
            };
            let key = key.trim();
            if key == "projdef" {
                builder = builder.projdef(raw);
                continue;
            }
            let number = || {
                raw.trim()
                    .parse::<f64>()
                    .map_err(|e| OdimError::Parse(format!("{}: '{}' ({})", key, raw, e)))
            };
            builder = match key {
                "xscale" => builder.xscale(number()?),
                "yscale" => builder.yscale(number()?),
                "xsize" => builder.xsize(number()?),
                "ysize" => builder.ysize(number()?),
                "ul_lat" => builder.ul_lat(number()?),
                "ul_lon" => builder.ul_lon(number()?),
                "ur_lat" => builder.ur_lat(number()?),
                "ur_lon" => builder.ur_lon(number()?),
                "ll_lat" => builder.ll_lat(number()?),
                "ll_lon" => builder.ll_lon(number()?),
                "lr_lat" => builder.lr_lat(number()?),
                "lr_lon" => builder.lr_lon(number()?),
                _ => builder,
            };
        }
        builder.build().map_err(|e| match e {
            OdimError::MissingAttribute { name, .. } => {
                OdimError::Parse(format!("description has no '{}'", name.to_lowercase()))
            },
            other => other,
        })
    }

    /// Upper-left corner in projection coordinates, corrected for the
    /// producer's UL offset.
    ///
    /// `project` maps `(lon, lat)` to planar `(x, y)` for [`Self::projdef`].
    pub fn projected_upper_left<F>(&self, project: F) -> (f64, f64)
    where
        F: FnOnce(f64, f64) -> (f64, f64),
    {
        let (x, reported_y) = project(self.ul.lon, self.ul.lat);
        (x, compensate_upper_left_offset(reported_y, self.yscale))
    }
}

/// Undo the producer bug that reports the UL latitude/longitude one pixel
/// above the actual corner.
fn compensate_upper_left_offset(reported_y: f64, yscale: f64) -> f64 {
    reported_y - UPPER_LEFT_ROW_OFFSET * yscale
}

impl fmt::Display for GeoReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl FromStr for GeoReference {
    type Err = OdimError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Builder for [`GeoReference`].
///
/// Explicitly set fields win over values read with [`Self::with_node`],
/// whatever the call order.
#[derive(Debug, Clone, Default)]
pub struct GeoReferenceBuilder {
    projdef: Option<String>,
    xscale: Option<f64>,
    yscale: Option<f64>,
    xsize: Option<f64>,
    ysize: Option<f64>,
    ul_lat: Option<f64>,
    ul_lon: Option<f64>,
    ur_lat: Option<f64>,
    ur_lon: Option<f64>,
    ll_lat: Option<f64>,
    ll_lon: Option<f64>,
    lr_lat: Option<f64>,
    lr_lon: Option<f64>,
    node_path: Option<String>,
    node_error: Option<(String, &'static str)>,
}

macro_rules! builder_setters {
    ($($field:ident),* $(,)?) => {
        $(
            #[doc = concat!("Set `", stringify!($field), "`.")]
            pub fn $field(mut self, value: f64) -> Self {
                self.$field = Some(value);
                self
            }
        )*
    };
}

impl GeoReferenceBuilder {
    builder_setters!(
        xscale, yscale, xsize, ysize, ul_lat, ul_lon, ur_lat, ur_lon, ll_lat, ll_lon, lr_lat,
        lr_lon,
    );

    /// Set the projection definition.
    pub fn projdef(mut self, value: impl Into<String>) -> Self {
        self.projdef = Some(value.into());
        self
    }

    /// Set both coordinates of a corner.
    pub fn corner(self, corner: Corner, position: LatLon) -> Self {
        match corner {
            Corner::UpperLeft => self.ul_lat(position.lat).ul_lon(position.lon),
            Corner::UpperRight => self.ur_lat(position.lat).ur_lon(position.lon),
            Corner::LowerLeft => self.ll_lat(position.lat).ll_lon(position.lon),
            Corner::LowerRight => self.lr_lat(position.lat).lr_lon(position.lon),
        }
    }

    /// Fill unset fields from a `/where` node's attributes.
    pub fn with_node(mut self, node: &DataNode) -> Self {
        let mut error = self.node_error.take();
        for (key, slot) in [
            ("xscale", &mut self.xscale),
            ("yscale", &mut self.yscale),
            ("xsize", &mut self.xsize),
            ("ysize", &mut self.ysize),
            ("UL_lat", &mut self.ul_lat),
            ("UL_lon", &mut self.ul_lon),
            ("UR_lat", &mut self.ur_lat),
            ("UR_lon", &mut self.ur_lon),
            ("LL_lat", &mut self.ll_lat),
            ("LL_lon", &mut self.ll_lon),
            ("LR_lat", &mut self.lr_lat),
            ("LR_lon", &mut self.lr_lon),
        ] {
            if slot.is_some() {
                continue;
            }
            match node.attr(key).map(AttrValue::as_f64) {
                Some(Some(v)) => *slot = Some(v),
                Some(None) => {
                    error.get_or_insert((key.to_string(), "numeric"));
                },
                None => {},
            }
        }
        if self.projdef.is_none() {
            match node.attr("projdef") {
                Some(AttrValue::Text(s)) => self.projdef = Some(s.clone()),
                Some(_) => {
                    error.get_or_insert(("projdef".to_string(), "text"));
                },
                None => {},
            }
        }
        self.node_error = error;
        self.node_path = Some(node.path.clone());
        self
    }

    /// Validate and build; any field still unset is an error.
    pub fn build(self) -> Result<GeoReference> {
        let path = self.node_path.unwrap_or_else(|| "<explicit>".to_string());
        if let Some((key, expected)) = self.node_error {
            return Err(OdimError::invalid_attribute(path, key, expected));
        }
        let need = |value: Option<f64>, key: &str| {
            value.ok_or_else(|| OdimError::missing_attribute(path.as_str(), key))
        };
        Ok(GeoReference {
            projdef: self
                .projdef
                .ok_or_else(|| OdimError::missing_attribute(path.as_str(), "projdef"))?,
            xscale: need(self.xscale, "xscale")?,
            yscale: need(self.yscale, "yscale")?,
            xsize: need(self.xsize, "xsize")?,
            ysize: need(self.ysize, "ysize")?,
            ul: LatLon::new(need(self.ul_lat, "UL_lat")?, need(self.ul_lon, "UL_lon")?),
            ur: LatLon::new(need(self.ur_lat, "UR_lat")?, need(self.ur_lon, "UR_lon")?),
            ll: LatLon::new(need(self.ll_lat, "LL_lat")?, need(self.ll_lon, "LL_lon")?),
            lr: LatLon::new(need(self.lr_lat, "LR_lat")?, need(self.lr_lon, "LR_lon")?),
        })
    }
}
