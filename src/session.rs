//! Open ODIM_H5 products.
//!
//! A [`FileSession`] owns one product for its lifetime. The tree is loaded
//! eagerly when the session opens; mutations are applied in memory and
//! written back by [`FileSession::flush`], when switching to read-only, on
//! [`FileSession::close`], and as a last resort when the session is dropped.
//!
//! Sessions are single-writer: nothing guards against another process
//! writing the same path between a close and a reopen.

use crate::config::SessionConfig;
use crate::data::path::{self, ROOT};
use crate::data::{AccessMode, AttrValue, DataNode, Hdf5Backend, RawGrid, StoreBackend};
use crate::error::{OdimError, Result};
use crate::geo::{GeoReference, Georeference, PolarGeoReference, ScanGeometry};
use crate::navigation::AttributeIndex;
use crate::quantity::{decode_masked, QuantityRecord};
use ndarray::ArrayD;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, error, warn};

/// ODIM `/what/object` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// Polar volume.
    Pvol,
    /// Cartesian volume.
    Cvol,
    /// Polar scan.
    Scan,
    /// Single polar ray.
    Ray,
    /// Azimuthal object.
    Azim,
    /// Elevational object.
    Elev,
    /// 2-D Cartesian image.
    Image,
    /// Cartesian composite.
    Comp,
    /// Vertical cross section.
    Xsec,
    /// Vertical profile.
    Vp,
    /// Embedded graphical image.
    Pic,
}

impl ObjectKind {
    /// Whether products of this kind carry polar georeferencing.
    pub fn is_polar(self) -> bool {
        matches!(self, Self::Scan | Self::Pvol)
    }

    /// Canonical upper-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pvol => "PVOL",
            Self::Cvol => "CVOL",
            Self::Scan => "SCAN",
            Self::Ray => "RAY",
            Self::Azim => "AZIM",
            Self::Elev => "ELEV",
            Self::Image => "IMAGE",
            Self::Comp => "COMP",
            Self::Xsec => "XSEC",
            Self::Vp => "VP",
            Self::Pic => "PIC",
        }
    }
}

impl FromStr for ObjectKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let kind = match s.trim().to_ascii_uppercase().as_str() {
            "PVOL" => Self::Pvol,
            "CVOL" => Self::Cvol,
            "SCAN" => Self::Scan,
            "RAY" => Self::Ray,
            "AZIM" => Self::Azim,
            "ELEV" => Self::Elev,
            "IMAGE" => Self::Image,
            "COMP" => Self::Comp,
            "XSEC" => Self::Xsec,
            "VP" => Self::Vp,
            "PIC" => Self::Pic,
            other => return Err(format!("unrecognized object kind '{}'", other)),
        };
        Ok(kind)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One open ODIM_H5 product.
#[derive(Debug)]
pub struct FileSession<B: StoreBackend = Hdf5Backend> {
    backend: B,
    path: PathBuf,
    mode: AccessMode,
    config: SessionConfig,
    root: DataNode,
    object_kind: ObjectKind,
    georeference: Georeference,
    dirty: bool,
}

impl FileSession<Hdf5Backend> {
    /// Open a netCDF-4/HDF5 file with the default configuration.
    pub fn open(path: impl AsRef<Path>, mode: AccessMode) -> Result<Self> {
        Self::open_with(Hdf5Backend, path, mode, SessionConfig::default())
    }
}

impl<B: StoreBackend> FileSession<B> {
    /// Open a product through `backend`.
    ///
    /// Fails if the product cannot be loaded, if `/what/object` is absent or
    /// unknown, or if `/where` lacks the attributes its kind requires.
    pub fn open_with(
        backend: B,
        path: impl AsRef<Path>,
        mode: AccessMode,
        config: SessionConfig,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let root = backend.load(&path, mode)?;
        let object_kind = Self::read_object_kind(&path, &root)?;

        let where_node = root
            .node_at("/where")
            .ok_or_else(|| OdimError::open(&path, "no /where group"))?;
        let georeference = if object_kind.is_polar() {
            Georeference::Polar(PolarGeoReference::from_node(where_node)?)
        } else {
            Georeference::Cartesian(GeoReference::from_node(where_node)?)
        };

        debug!(
            "Opened {} ({}, {:?}, {} datasets)",
            path.display(),
            object_kind,
            mode,
            root.numbered_children("dataset").count()
        );

        Ok(Self {
            backend,
            path,
            mode,
            config,
            root,
            object_kind,
            georeference,
            dirty: false,
        })
    }

    fn read_object_kind(path: &Path, root: &DataNode) -> Result<ObjectKind> {
        let object = root
            .node_at("/what")
            .and_then(|what| what.attr("object"))
            .ok_or_else(|| OdimError::open(path, "no /what object attribute"))?;
        let text = object
            .as_str()
            .ok_or_else(|| OdimError::open(path, "/what object attribute is not text"))?;
        text.parse().map_err(|reason: String| OdimError::open(path, reason))
    }

    /// Path of the product.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current access mode.
    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    /// Whether mutations are currently allowed.
    pub fn is_writable(&self) -> bool {
        self.mode.is_writable()
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Product kind from `/what/object`.
    pub fn object_kind(&self) -> ObjectKind {
        self.object_kind
    }

    /// Whether the product is polar (SCAN or PVOL).
    pub fn is_polar(&self) -> bool {
        self.object_kind.is_polar()
    }

    /// Georeference read at open time.
    pub fn georeference(&self) -> &Georeference {
        &self.georeference
    }

    /// Root of the loaded tree.
    pub fn root(&self) -> &DataNode {
        &self.root
    }

    /// Number of top-level `datasetN` groups.
    pub fn dataset_count(&self) -> usize {
        self.root.numbered_children("dataset").count()
    }

    /// Whether in-memory changes are waiting to be written.
    pub fn has_pending_changes(&self) -> bool {
        self.dirty
    }

    // ---- mode switching --------------------------------------------------

    /// Switch to read-write; no-op if already writable.
    pub fn set_writable(&mut self) -> Result<()> {
        if self.mode == AccessMode::ReadWrite {
            return Ok(());
        }
        self.reopen(AccessMode::ReadWrite)
    }

    /// Write pending changes and switch to read-only; no-op if already read-only.
    pub fn set_read_only(&mut self) -> Result<()> {
        if self.mode == AccessMode::ReadOnly {
            return Ok(());
        }
        self.flush()?;
        self.reopen(AccessMode::ReadOnly)
    }

    fn reopen(&mut self, mode: AccessMode) -> Result<()> {
        self.root = self.backend.load(&self.path, mode)?;
        self.mode = mode;
        debug!("Reopened {} as {:?}", self.path.display(), mode);
        Ok(())
    }

    /// Write pending changes to the backend.
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        self.backend
            .save(&self.path, &self.root, &self.config.compression)?;
        self.dirty = false;
        debug!("Flushed {}", self.path.display());
        Ok(())
    }

    /// Flush and close the session.
    pub fn close(mut self) -> Result<()> {
        self.flush()
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.is_writable() {
            Ok(())
        } else {
            Err(OdimError::WriteNotPermitted {
                path: self.path.clone(),
            })
        }
    }

    // ---- georeference ----------------------------------------------------

    /// Cartesian georeference, or `NotCartesian` for polar products.
    pub fn cartesian(&self) -> Result<&GeoReference> {
        self.georeference
            .as_cartesian()
            .ok_or_else(|| OdimError::NotCartesian {
                path: self.path.clone(),
            })
    }

    /// Polar georeference, `None` for Cartesian products.
    pub fn polar(&self) -> Option<&PolarGeoReference> {
        self.georeference.as_polar()
    }

    /// Canonical description of the Cartesian georeference.
    pub fn where_description(&self) -> Result<String> {
        Ok(self.cartesian()?.describe())
    }

    /// Corrected upper-left corner in projection coordinates.
    ///
    /// See [`GeoReference::projected_upper_left`].
    pub fn projected_upper_left<F>(&self, project: F) -> Result<(f64, f64)>
    where
        F: FnOnce(f64, f64) -> (f64, f64),
    {
        Ok(self.cartesian()?.projected_upper_left(project))
    }

    // ---- lookups ---------------------------------------------------------

    fn start_node(&self, start_path: Option<&str>) -> Option<&DataNode> {
        match start_path {
            Some(start) => self.root.node_at(start),
            None => Some(&self.root),
        }
    }

    fn node(&self, target: &str) -> Result<&DataNode> {
        self.root
            .node_at(target)
            .ok_or_else(|| OdimError::node_not_found(path::normalize(target)))
    }

    /// Field group holding `quantity`, searched below `start_path` (root if
    /// `None`). Logs a warning and returns `None` if there is none.
    pub fn resolve_quantity_path(&self, quantity: &str, start_path: Option<&str>) -> Option<String> {
        let Some(start) = self.start_node(start_path) else {
            warn!(
                "Start path {:?} not found in file {}",
                start_path,
                self.path.display()
            );
            return None;
        };

        match AttributeIndex::find_first_path(start, "quantity", &AttrValue::from(quantity)) {
            Some(hit) => Some(AttributeIndex::derive_group_path(&hit, 1)),
            None => {
                warn!(
                    "Quantity \"{}\" not found in file {}",
                    quantity,
                    self.path.display()
                );
                None
            },
        }
    }

    /// Look up a quantity.
    ///
    /// On polar products this also replaces the session's scan geometry with
    /// that of the dataset the quantity belongs to (cleared if that dataset
    /// has no complete `where` group).
    pub fn quantity(&mut self, quantity: &str, start_path: Option<&str>) -> Option<QuantityRecord> {
        let group_path = self.resolve_quantity_path(quantity, start_path)?;

        if let Georeference::Polar(polar) = &mut self.georeference {
            let dataset_path = path::derive_group_path(&group_path, 1);
            let geometry = self
                .root
                .node_at(&dataset_path)
                .and_then(|dataset| dataset.child("where"))
                .and_then(ScanGeometry::from_node);
            match geometry {
                Some(geometry) => polar.set_geometry(geometry),
                None => {
                    debug!("No scan geometry in {}", dataset_path);
                    polar.clear_geometry();
                },
            }
        }

        let group = self.root.node_at(&group_path)?;
        let mut record = QuantityRecord::from_node(group);
        record.set_provenance(Some(self.path.clone()), None, None);
        Some(record)
    }

    fn dataset_at_elevation(&self, elangle: f64) -> Option<String> {
        let hit = AttributeIndex::find_first_path(&self.root, "elangle", &AttrValue::Float(elangle));
        if hit.is_none() {
            warn!(
                "Elevation {} not found in file {}",
                elangle,
                self.path.display()
            );
        }
        hit.map(|h| AttributeIndex::derive_group_path(&h, 1))
    }

    /// Look up a quantity in the sweep whose `elangle` equals `elangle`.
    pub fn quantity_at_elevation(&mut self, quantity: &str, elangle: f64) -> Option<QuantityRecord> {
        let dataset = self.dataset_at_elevation(elangle)?;
        self.quantity(quantity, Some(&dataset))
    }

    /// First value of attribute `name` inside the top-level dataset of the
    /// sweep at `elangle`.
    pub fn attribute_at_elevation(&self, elangle: f64, name: &str) -> Option<AttrValue> {
        let hit = self.dataset_at_elevation(elangle)?;
        let top = path::segments(&hit).first().map(|s| path::join(ROOT, s))?;
        self.first_attribute_value(name, Some(&top))
    }

    /// First value of attribute `name` anywhere below `start_path`.
    pub fn first_attribute_value(&self, name: &str, start_path: Option<&str>) -> Option<AttrValue> {
        let start = self.start_node(start_path)?;
        AttributeIndex::find_first_value(start, name).cloned()
    }

    /// Attribute `name` on the node at `target`.
    pub fn attribute(&self, target: &str, name: &str) -> Result<AttrValue> {
        let node = self.node(target)?;
        node.attr(name)
            .cloned()
            .ok_or_else(|| OdimError::missing_attribute(node.path.as_str(), name))
    }

    /// Masked decode of the field group at `field_path`.
    ///
    /// Reads `gain`, `offset`, `nodata` and `undetect` from its `what` group
    /// (all required), sets sentinel cells to NaN and rescales the rest.
    pub fn decode_data_field(&self, field_path: &str) -> Result<ArrayD<f64>> {
        let group = self.node(field_path)?;
        let what = group
            .child("what")
            .ok_or_else(|| OdimError::node_not_found(path::join(&group.path, "what")))?;
        let required = |key: &str| match what.attr(key) {
            Some(value) => value
                .as_f64()
                .ok_or_else(|| OdimError::invalid_attribute(what.path.as_str(), key, "numeric")),
            None => Err(OdimError::missing_attribute(what.path.as_str(), key)),
        };
        let gain = required("gain")?;
        let offset = required("offset")?;
        let nodata = required("nodata")?;
        let undetect = required("undetect")?;

        let grid = Self::field_grid(group)?;
        Ok(decode_masked(&grid.values, gain, offset, nodata, undetect))
    }

    fn field_grid(group: &DataNode) -> Result<&RawGrid> {
        group
            .child("data")
            .and_then(|data| data.grid.as_ref())
            .ok_or_else(|| OdimError::node_not_found(path::join(&group.path, "data")))
    }

    // ---- mutation --------------------------------------------------------

    /// Create the next numbered group.
    ///
    /// With a parent, creates `data{M+1}` below it; without, a top-level
    /// `dataset{N+1}`. The index is one past the highest existing index, so
    /// a gap left by external tooling never causes a collision.
    pub fn add_dataset(&mut self, parent_path: Option<&str>) -> Result<String> {
        self.ensure_writable()?;
        let (parent_path, stem) = match parent_path {
            Some(parent) => (path::normalize(parent), "data"),
            None => (ROOT.to_string(), "dataset"),
        };

        let parent = self
            .root
            .node_at_mut(&parent_path)
            .ok_or_else(|| OdimError::node_not_found(parent_path.as_str()))?;
        if parent.is_field() {
            return Err(OdimError::NotAGroup { path: parent_path });
        }
        let index = parent.numbered_children(stem).max().unwrap_or(0) + 1;
        let name = format!("{}{}", stem, index);
        parent.add_child(DataNode::group(name.as_str()));
        self.dirty = true;

        let created = path::join(&parent_path, &name);
        debug!("Created {}", created);
        Ok(created)
    }

    /// Create the group at `target` (and any missing parents) if absent.
    pub fn ensure_group(&mut self, target: &str) -> Result<()> {
        self.ensure_writable()?;
        if let Some(existing) = self.root.node_at(target) {
            return if existing.is_group() {
                Ok(())
            } else {
                Err(OdimError::NotAGroup {
                    path: path::normalize(target),
                })
            };
        }
        self.root.ensure_group(target).ok_or_else(|| OdimError::NotAGroup {
            path: path::normalize(target),
        })?;
        self.dirty = true;
        Ok(())
    }

    /// Replace the `data` field of the group at `field_path` with `grid`.
    ///
    /// The field is compressed with the session's compression policy when
    /// written. Fails with `ValueOutOfRange` if a value does not fit the
    /// grid's sample type.
    pub fn set_data_field(&mut self, field_path: &str, grid: impl Into<RawGrid>) -> Result<()> {
        self.ensure_writable()?;
        let grid = grid.into();
        if let Some(value) = grid.first_unrepresentable() {
            return Err(OdimError::ValueOutOfRange {
                path: path::join(field_path, "data"),
                value,
                sample_type: grid.sample_type.name(),
            });
        }
        let group = self.group_mut(field_path)?;
        group.remove_child("data");
        group.add_child(DataNode::field("data", grid));
        self.dirty = true;
        Ok(())
    }

    /// Overwrite the samples of an existing `data` field in place.
    ///
    /// The stored sample type is kept. The new grid must have exactly the
    /// stored shape (`ShapeMismatch` otherwise), and every value must be
    /// storable in that type unchanged (`ValueOutOfRange` otherwise; integer
    /// fields take whole numbers in range, no NaN). On error nothing is
    /// written.
    pub fn update_data_field(&mut self, field_path: &str, values: ArrayD<f64>) -> Result<()> {
        self.ensure_writable()?;
        let group = self.group_mut(field_path)?;
        let group_path = group.path.clone();
        let grid = group
            .child_mut("data")
            .and_then(|data| data.grid.as_mut())
            .ok_or_else(|| OdimError::node_not_found(path::join(&group_path, "data")))?;
        if grid.shape() != values.shape() {
            return Err(OdimError::ShapeMismatch {
                path: group_path,
                expected: grid.shape().to_vec(),
                actual: values.shape().to_vec(),
            });
        }
        let sample_type = grid.sample_type;
        if let Some(&value) = values.iter().find(|&&v| !sample_type.holds(v)) {
            return Err(OdimError::ValueOutOfRange {
                path: path::join(&group_path, "data"),
                value,
                sample_type: sample_type.name(),
            });
        }
        grid.values = values;
        self.dirty = true;
        Ok(())
    }

    /// Copy the subtree `source_parent/name` to `target_parent/name`.
    pub fn copy_group(&mut self, source_parent: &str, target_parent: &str, name: &str) -> Result<String> {
        self.ensure_writable()?;
        let source_path = path::join(source_parent, name);
        let subtree = self.node(&source_path)?.clone();
        let target_path = path::join(target_parent, name);
        if self.root.contains(&target_path) {
            return Err(OdimError::NodeExists { path: target_path });
        }

        self.group_mut(target_parent)?.add_child(subtree);
        self.dirty = true;
        debug!("Copied {} to {}", source_path, target_path);
        Ok(target_path)
    }

    /// Set an attribute, creating the node's groups if needed.
    ///
    /// Text values are stored as strings and numbers by value. Booleans are
    /// written to disk as the text `True`/`False` and read back as text, so
    /// after a reopen through [`Hdf5Backend`] they compare as
    /// `AttrValue::Text`; [`MemoryBackend`](crate::data::MemoryBackend) keeps
    /// them as `AttrValue::Bool`.
    pub fn set_attribute(&mut self, target: &str, name: &str, value: impl Into<AttrValue>) -> Result<()> {
        self.ensure_writable()?;
        let node = if self.root.contains(target) {
            self.root.node_at_mut(target)
        } else {
            self.root.ensure_group(target)
        };
        node.ok_or_else(|| OdimError::NotAGroup {
            path: path::normalize(target),
        })?
        .set_attr(name, value);
        self.dirty = true;
        Ok(())
    }

    fn group_mut(&mut self, target: &str) -> Result<&mut DataNode> {
        let node = self
            .root
            .node_at_mut(target)
            .ok_or_else(|| OdimError::node_not_found(path::normalize(target)))?;
        if node.is_field() {
            return Err(OdimError::NotAGroup {
                path: node.path.clone(),
            });
        }
        Ok(node)
    }
}

impl<B: StoreBackend + Clone> FileSession<B> {
    /// Copy the product to `target` and open the copy read-only.
    ///
    /// Pending changes are flushed first so the copy includes them.
    pub fn duplicate(&mut self, target: impl AsRef<Path>) -> Result<FileSession<B>> {
        self.flush()?;
        let target = target.as_ref();
        self.backend.copy(&self.path, target)?;
        FileSession::open_with(
            self.backend.clone(),
            target,
            AccessMode::ReadOnly,
            self.config.clone(),
        )
    }
}

impl<B: StoreBackend> Drop for FileSession<B> {
    fn drop(&mut self) {
        if self.dirty {
            if let Err(err) = self.flush() {
                error!("Failed to write {} on drop: {}", self.path.display(), err);
            }
        }
    }
}
