//! Decoded quantity fields.

use crate::data::{AttrValue, DataNode};
use ndarray::ArrayD;
use std::path::PathBuf;

/// Where a quantity came from. Tags are free text and never validated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Provenance {
    /// File the quantity was read from.
    pub source_path: Option<PathBuf>,
    /// Acquisition time, as the caller formats it.
    pub acquired_at: Option<String>,
    /// Name of the producing task.
    pub task: Option<String>,
}

/// One quantity field (e.g. `DBZH`) with its raw grid and decode metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuantityRecord {
    /// Path of the field group, e.g. `/dataset1/data2`.
    pub path: String,
    /// Raw samples.
    pub values: Option<ArrayD<f64>>,
    /// Quantity name.
    pub quantity: Option<String>,
    /// Multiplicative decode coefficient.
    pub gain: Option<f64>,
    /// Additive decode coefficient.
    pub offset: Option<f64>,
    /// Raw value meaning "outside coverage".
    pub nodata: Option<f64>,
    /// Raw value meaning "below detection threshold".
    pub undetect: Option<f64>,
    /// Tags attached after construction.
    pub provenance: Provenance,
}

impl QuantityRecord {
    /// Read a field group: samples from its `data` child, metadata from its
    /// `what` child. Anything absent stays `None`.
    pub fn from_node(group: &DataNode) -> Self {
        let what = group.child("what");
        let number = |key: &str| what.and_then(|w| w.attr(key)).and_then(AttrValue::as_f64);

        Self {
            path: group.path.clone(),
            values: group
                .child("data")
                .and_then(|d| d.grid.as_ref())
                .map(|g| g.values.clone()),
            quantity: what
                .and_then(|w| w.attr("quantity"))
                .map(|q| q.to_string()),
            gain: number("gain"),
            offset: number("offset"),
            nodata: number("nodata"),
            undetect: number("undetect"),
            provenance: Provenance::default(),
        }
    }

    /// Attach provenance tags. Only the tags given replace existing ones.
    pub fn set_provenance(
        &mut self,
        source_path: Option<PathBuf>,
        acquired_at: Option<String>,
        task: Option<String>,
    ) {
        if source_path.is_some() {
            self.provenance.source_path = source_path;
        }
        if acquired_at.is_some() {
            self.provenance.acquired_at = acquired_at;
        }
        if task.is_some() {
            self.provenance.task = task;
        }
    }

    /// `raw * gain + offset` over the whole grid.
    ///
    /// Sentinels are not masked: nodata and undetect cells are rescaled like
    /// any other. Use [`FileSession::decode_data_field`] for a masked decode.
    /// Returns `None` when values, gain or offset is unset.
    ///
    /// [`FileSession::decode_data_field`]: crate::session::FileSession::decode_data_field
    pub fn physical_values(&self) -> Option<ArrayD<f64>> {
        let (values, gain, offset) = (self.values.as_ref()?, self.gain?, self.offset?);
        Some(values.mapv(|raw| raw * gain + offset))
    }
}

/// Decode with sentinel masking: cells equal to `nodata` or `undetect` become
/// NaN, the rest `raw * gain + offset`.
pub fn decode_masked(
    raw: &ArrayD<f64>,
    gain: f64,
    offset: f64,
    nodata: f64,
    undetect: f64,
) -> ArrayD<f64> {
    raw.mapv(|v| {
        if v == nodata || v == undetect {
            f64::NAN
        } else {
            v * gain + offset
        }
    })
}
