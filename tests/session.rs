mod common;

use common::{backend_with, cartesian_product, polar_volume, PROJDEF};
use ndarray::{array, Array2, ArrayD, IxDyn};
use odimh5::data::{RawGrid, SampleType};
use odimh5::geo::Georeference;
use odimh5::{
    AccessMode, AttrValue, DataNode, FileSession, GeoReference, MemoryBackend, ObjectKind,
    OdimError, SessionConfig,
};

fn open(
    backend: &MemoryBackend,
    path: &str,
    mode: AccessMode,
) -> odimh5::Result<FileSession<MemoryBackend>> {
    FileSession::open_with(backend.clone(), path, mode, SessionConfig::default())
}

fn pvol(mode: AccessMode) -> (MemoryBackend, FileSession<MemoryBackend>) {
    let backend = backend_with("pvol.h5", polar_volume());
    let session = open(&backend, "pvol.h5", mode).unwrap();
    (backend, session)
}

fn comp(mode: AccessMode) -> (MemoryBackend, FileSession<MemoryBackend>) {
    let backend = backend_with("comp.h5", cartesian_product());
    let session = open(&backend, "comp.h5", mode).unwrap();
    (backend, session)
}

#[test]
fn test_open_missing_product() {
    let backend = MemoryBackend::new();
    let result = open(&backend, "missing.h5", AccessMode::ReadOnly);
    assert!(matches!(result, Err(OdimError::FileOpen { .. })));
}

#[test]
fn test_open_without_object() {
    let root = DataNode::root().with_child(DataNode::group("where").with_attr("lat", 1.0));
    let backend = backend_with("bare.h5", root);
    let result = open(&backend, "bare.h5", AccessMode::ReadOnly);
    assert!(matches!(result, Err(OdimError::Open { .. })));
}

#[test]
fn test_open_unknown_object() {
    let mut root = polar_volume();
    root.node_at_mut("/what").unwrap().set_attr("object", "BOGUS");
    let backend = backend_with("bogus.h5", root);
    let result = open(&backend, "bogus.h5", AccessMode::ReadOnly);
    assert!(matches!(result, Err(OdimError::Open { .. })));
}

#[test]
fn test_open_polar_without_site() {
    let mut root = polar_volume();
    root.node_at_mut("/where").unwrap().attributes.remove("height");
    let backend = backend_with("nosite.h5", root);
    let result = open(&backend, "nosite.h5", AccessMode::ReadOnly);
    assert!(matches!(
        result,
        Err(OdimError::MissingAttribute { ref name, .. }) if name == "height"
    ));
}

#[test]
fn test_object_kind_selects_georeference() {
    let (_, session) = pvol(AccessMode::ReadOnly);
    assert_eq!(session.object_kind(), ObjectKind::Pvol);
    assert!(session.is_polar());
    let site = session.polar().unwrap().site();
    assert_eq!((site.height, site.lat, site.lon), (222.0, 58.1, 12.8));
    assert!(session.polar().unwrap().geometry().is_none());
    assert!(matches!(session.cartesian(), Err(OdimError::NotCartesian { .. })));
    assert_eq!(session.dataset_count(), 2);

    let (_, session) = comp(AccessMode::ReadOnly);
    assert_eq!(session.object_kind(), ObjectKind::Comp);
    assert!(!session.is_polar());
    assert!(session.polar().is_none());
    assert!(matches!(session.georeference(), Georeference::Cartesian(_)));
}

#[test]
fn test_cartesian_description_round_trip() {
    let (_, session) = comp(AccessMode::ReadOnly);
    let description = session.where_description().unwrap();
    assert!(description.starts_with(&format!("projdef={}, xscale=2.0, yscale=2.0", PROJDEF)));
    assert!(description.contains("ul_lat=54.0000000000, ul_lon=3.0000000000"));
    assert!(description.contains("lr_lat=50.0000000000, lr_lon=7.0000000000"));

    let parsed = GeoReference::parse(&description).unwrap();
    assert_eq!(&parsed, session.cartesian().unwrap());

    let bbox = parsed.bounding_box();
    assert_eq!((bbox.min_lon, bbox.max_lon), (3.0, 7.0));
    assert_eq!((bbox.min_lat, bbox.max_lat), (50.0, 54.0));
}

#[test]
fn test_projected_upper_left_compensates_one_row() {
    let (_, session) = comp(AccessMode::ReadOnly);
    let (x, y) = session
        .projected_upper_left(|lon, lat| (lon * 100.0, lat * 100.0))
        .unwrap();
    assert_eq!(x, 300.0);
    assert_eq!(y, 5400.0 - 2.0);

    let (_, polar) = pvol(AccessMode::ReadOnly);
    assert!(polar.projected_upper_left(|lon, lat| (lon, lat)).is_err());
}

#[test]
fn test_mutation_requires_write_mode() {
    let (backend, mut session) = pvol(AccessMode::ReadOnly);
    assert!(matches!(
        session.add_dataset(None),
        Err(OdimError::WriteNotPermitted { .. })
    ));
    assert!(matches!(
        session.set_attribute("/what", "source", "WMO:02606"),
        Err(OdimError::WriteNotPermitted { .. })
    ));
    assert!(matches!(
        session.ensure_group("/dataset3"),
        Err(OdimError::WriteNotPermitted { .. })
    ));
    assert!(!session.has_pending_changes());
    drop(session);
    assert!(backend.get("pvol.h5").unwrap().node_at("/dataset3").is_none());
}

#[test]
fn test_mode_switch_is_idempotent() {
    let (_, mut session) = pvol(AccessMode::ReadOnly);
    session.set_writable().unwrap();
    session.set_writable().unwrap();
    assert!(session.is_writable());
    session.set_read_only().unwrap();
    session.set_read_only().unwrap();
    assert_eq!(session.mode(), AccessMode::ReadOnly);
}

#[test]
fn test_set_read_only_persists_changes() {
    let (backend, mut session) = pvol(AccessMode::ReadWrite);
    session.set_attribute("/how", "software", "odimh5").unwrap();
    session.set_read_only().unwrap();
    assert!(!session.has_pending_changes());
    assert_eq!(
        session.attribute("/how", "software").unwrap(),
        AttrValue::from("odimh5")
    );
    let stored = backend.get("pvol.h5").unwrap();
    assert_eq!(
        stored.node_at("/how").unwrap().attr("software"),
        Some(&AttrValue::from("odimh5"))
    );
}

#[test]
fn test_add_dataset_numbers_past_the_highest() {
    let (_, mut session) = pvol(AccessMode::ReadWrite);
    assert_eq!(session.add_dataset(None).unwrap(), "/dataset3");
    assert_eq!(session.dataset_count(), 3);
    assert_eq!(session.add_dataset(Some("/dataset1")).unwrap(), "/dataset1/data3");
    assert_eq!(session.add_dataset(Some("/dataset3")).unwrap(), "/dataset3/data1");
    assert!(session.has_pending_changes());
}

#[test]
fn test_add_dataset_skips_gaps() {
    let mut root = polar_volume();
    let dataset2 = root.remove_child("dataset2").unwrap();
    let mut dataset5 = DataNode::group("dataset5");
    dataset5.children = dataset2.children;
    root.add_child(dataset5);
    let backend = backend_with("gap.h5", root);
    let mut session = open(&backend, "gap.h5", AccessMode::ReadWrite).unwrap();
    assert_eq!(session.add_dataset(None).unwrap(), "/dataset6");
}

#[test]
fn test_add_dataset_under_missing_parent() {
    let (_, mut session) = pvol(AccessMode::ReadWrite);
    assert!(matches!(
        session.add_dataset(Some("/dataset9")),
        Err(OdimError::NodeNotFound { .. })
    ));
    assert!(matches!(
        session.add_dataset(Some("/dataset1/data1/data")),
        Err(OdimError::NotAGroup { .. })
    ));
}

#[test]
fn test_ensure_group_creates_parents() {
    let (_, mut session) = pvol(AccessMode::ReadWrite);
    session.ensure_group("/dataset3/data1/what").unwrap();
    assert!(session.root().node_at("/dataset3/data1/what").unwrap().is_group());
    session.ensure_group("/dataset3/data1/what").unwrap();
    assert!(matches!(
        session.ensure_group("/dataset1/data1/data"),
        Err(OdimError::NotAGroup { .. })
    ));
}

#[test]
fn test_set_data_field_replaces_grid() {
    let (backend, mut session) = pvol(AccessMode::ReadWrite);
    let path = session.add_dataset(Some("/dataset2")).unwrap();
    session
        .set_data_field(&path, Array2::<u16>::from_elem((2, 4), 7))
        .unwrap();
    session.close().unwrap();

    let stored = backend.get("pvol.h5").unwrap();
    let grid = stored
        .node_at("/dataset2/data2/data")
        .and_then(|d| d.grid.as_ref())
        .unwrap();
    assert_eq!(grid.shape(), &[2, 4]);
    assert_eq!(grid.sample_type, SampleType::U16);
    assert!(grid.values.iter().all(|&v| v == 7.0));
}

#[test]
fn test_update_data_field_checks_shape() {
    let (_, mut session) = pvol(AccessMode::ReadWrite);
    let wrong = ArrayD::<f64>::zeros(IxDyn(&[3, 3]));
    match session.update_data_field("/dataset1/data1", wrong) {
        Err(OdimError::ShapeMismatch { expected, actual, .. }) => {
            assert_eq!(expected, vec![2, 3]);
            assert_eq!(actual, vec![3, 3]);
        },
        other => panic!("expected shape mismatch, got {:?}", other),
    }
    assert!(!session.has_pending_changes());

    let values = array![[9.0, 8.0, 7.0], [6.0, 5.0, 4.0]].into_dyn();
    session.update_data_field("/dataset1/data1", values.clone()).unwrap();
    let grid = session
        .root()
        .node_at("/dataset1/data1/data")
        .and_then(|d| d.grid.as_ref())
        .unwrap();
    assert_eq!(grid.values, values);
    assert_eq!(grid.sample_type, SampleType::U8);
}

#[test]
fn test_update_data_field_rejects_values_the_type_cannot_hold() {
    let (_, mut session) = pvol(AccessMode::ReadWrite);
    let too_large = array![[1.0, 2.0, 300.0], [4.0, 5.0, 6.0]].into_dyn();
    assert!(matches!(
        session.update_data_field("/dataset1/data1", too_large),
        Err(OdimError::ValueOutOfRange { value, sample_type: "u8", .. }) if value == 300.0
    ));
    let masked = array![[1.0, f64::NAN, 3.0], [4.0, 5.0, 6.0]].into_dyn();
    assert!(matches!(
        session.update_data_field("/dataset1/data1", masked),
        Err(OdimError::ValueOutOfRange { .. })
    ));
    assert!(!session.has_pending_changes());
    let grid = session
        .root()
        .node_at("/dataset1/data1/data")
        .and_then(|d| d.grid.as_ref())
        .unwrap();
    assert_eq!(grid.to_row_major(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
}

#[test]
fn test_set_data_field_rejects_unrepresentable_grid() {
    let (_, mut session) = pvol(AccessMode::ReadWrite);
    let grid = RawGrid::new(array![[0.5, 1.0]].into_dyn(), SampleType::I16);
    assert!(matches!(
        session.set_data_field("/dataset2/data1", grid),
        Err(OdimError::ValueOutOfRange { sample_type: "i16", .. })
    ));
    assert!(!session.has_pending_changes());
}

#[test]
fn test_copy_group_duplicates_subtree() {
    let (_, mut session) = pvol(AccessMode::ReadWrite);
    let target = session.add_dataset(None).unwrap();
    let copied = session.copy_group("/dataset1", &target, "where").unwrap();
    assert_eq!(copied, "/dataset3/where");
    assert_eq!(
        session.attribute("/dataset3/where", "elangle").unwrap(),
        AttrValue::Float(0.5)
    );

    session.copy_group("/dataset1", &target, "data2").unwrap();
    assert!(session.root().node_at("/dataset3/data2/data").unwrap().is_field());
    assert!(matches!(
        session.copy_group("/dataset1", &target, "data2"),
        Err(OdimError::NodeExists { .. })
    ));
    assert!(matches!(
        session.copy_group("/dataset1", &target, "data7"),
        Err(OdimError::NodeNotFound { .. })
    ));
}

#[test]
fn test_set_attribute_keeps_value_kind() {
    let (_, mut session) = pvol(AccessMode::ReadWrite);
    session.set_attribute("/dataset2/what", "product", "SCAN").unwrap();
    session.set_attribute("/dataset2/what", "prodpar", 1.5).unwrap();
    session.set_attribute("/dataset2/how", "malfunc", false).unwrap();

    let product = session.attribute("/dataset2/what", "product").unwrap();
    assert!(product.is_text());
    let prodpar = session.attribute("/dataset2/what", "prodpar").unwrap();
    assert_eq!(prodpar.as_f64(), Some(1.5));
    assert_eq!(
        session.attribute("/dataset2/how", "malfunc").unwrap().to_string(),
        "False"
    );
    assert!(matches!(
        session.attribute("/dataset2/what", "absent"),
        Err(OdimError::MissingAttribute { .. })
    ));
}

#[test]
fn test_quantity_sets_scan_geometry() {
    let (_, mut session) = pvol(AccessMode::ReadOnly);
    let record = session.quantity("DBZH", None).unwrap();
    assert_eq!(record.path, "/dataset1/data2");
    assert_eq!(record.quantity.as_deref(), Some("DBZH"));
    assert_eq!(record.gain, Some(0.5));
    assert_eq!(record.offset, Some(-32.0));
    assert_eq!(
        record.provenance.source_path.as_deref(),
        Some(std::path::Path::new("pvol.h5"))
    );

    let geometry = session.polar().unwrap().geometry().unwrap();
    assert_eq!(geometry.bin_count, 3);
    assert_eq!(geometry.ray_count, 2);
    assert_eq!(geometry.range_scale, 500.0);

    let physical = record.physical_values().unwrap();
    assert_eq!(physical[[0, 0]], -32.0);
    assert_eq!(physical[[0, 1]], 0.0);
    assert_eq!(physical[[0, 2]], 95.5);
}

#[test]
fn test_quantity_at_elevation() {
    let (_, mut session) = pvol(AccessMode::ReadOnly);
    let record = session.quantity_at_elevation("DBZH", 1.5).unwrap();
    assert_eq!(record.path, "/dataset2/data1");
    let geometry = session.polar().unwrap().geometry().unwrap();
    assert_eq!(geometry.bin_count, 4);
    assert_eq!(geometry.range_scale, 1000.0);

    assert!(session.quantity_at_elevation("TH", 1.5).is_none());
    assert!(session.quantity_at_elevation("DBZH", 4.0).is_none());
    assert_eq!(session.quantity_at_elevation("TH", 0.5).unwrap().path, "/dataset1/data1");
}

#[test]
fn test_quantity_missing() {
    let (_, mut session) = pvol(AccessMode::ReadOnly);
    assert!(session.quantity("VRADH", None).is_none());
    assert!(session.resolve_quantity_path("DBZH", Some("/dataset9")).is_none());
    assert_eq!(
        session.resolve_quantity_path("DBZH", Some("/dataset2")).as_deref(),
        Some("/dataset2/data1")
    );
}

#[test]
fn test_quantity_without_scan_geometry_clears_it() {
    let mut root = polar_volume();
    root.node_at_mut("/dataset2/where").unwrap().attributes.remove("nbins");
    let backend = backend_with("partial.h5", root);
    let mut session = open(&backend, "partial.h5", AccessMode::ReadOnly).unwrap();

    session.quantity("TH", None).unwrap();
    assert!(session.polar().unwrap().geometry().is_some());
    session.quantity_at_elevation("DBZH", 1.5).unwrap();
    assert!(session.polar().unwrap().geometry().is_none());
}

#[test]
fn test_attribute_lookups() {
    let (_, session) = pvol(AccessMode::ReadOnly);
    assert_eq!(
        session.attribute_at_elevation(1.5, "startazA"),
        Some(AttrValue::Float(0.5))
    );
    assert_eq!(session.attribute_at_elevation(2.5, "startazA"), None);
    assert_eq!(
        session.first_attribute_value("task", None),
        Some(AttrValue::from("se.smhi.sweep"))
    );
    assert_eq!(
        session.first_attribute_value("quantity", Some("/dataset2")),
        Some(AttrValue::from("DBZH"))
    );
    assert_eq!(session.first_attribute_value("nothing", None), None);
}

#[test]
fn test_decode_data_field_masks_sentinels() {
    let (_, session) = comp(AccessMode::ReadOnly);
    let decoded = session.decode_data_field("/dataset1/data1").unwrap();
    assert!(decoded[[0, 0]].is_nan());
    assert_eq!(decoded[[0, 1]], -27.0);
    assert_eq!(decoded[[0, 2]], -22.0);
    assert!(decoded[[1, 0]].is_nan());
    assert_eq!(decoded[[1, 1]], 18.0);
    assert!(decoded[[1, 2]].is_nan());
}

#[test]
fn test_decode_data_field_requires_metadata() {
    let mut root = cartesian_product();
    root.node_at_mut("/dataset1/data1/what")
        .unwrap()
        .attributes
        .remove("undetect");
    let backend = backend_with("nometa.h5", root);
    let session = open(&backend, "nometa.h5", AccessMode::ReadOnly).unwrap();
    assert!(matches!(
        session.decode_data_field("/dataset1/data1"),
        Err(OdimError::MissingAttribute { ref name, .. }) if name == "undetect"
    ));
    assert!(matches!(
        session.decode_data_field("/dataset4/data1"),
        Err(OdimError::NodeNotFound { .. })
    ));
}

#[test]
fn test_duplicate_includes_pending_changes() {
    let (backend, mut session) = comp(AccessMode::ReadWrite);
    session.set_attribute("/what", "source", "NOD:sekrn").unwrap();
    let copy = session.duplicate("copy.h5").unwrap();
    assert_eq!(copy.mode(), AccessMode::ReadOnly);
    assert_eq!(copy.path(), std::path::Path::new("copy.h5"));
    assert_eq!(
        copy.attribute("/what", "source").unwrap(),
        AttrValue::from("NOD:sekrn")
    );
    assert_eq!(copy.where_description().unwrap(), session.where_description().unwrap());
    assert!(backend.get("copy.h5").is_some());
}

#[test]
fn test_drop_flushes_pending_changes() {
    let backend = backend_with("comp.h5", cartesian_product());
    {
        let mut session = open(&backend, "comp.h5", AccessMode::ReadWrite).unwrap();
        session.add_dataset(None).unwrap();
    }
    let stored = backend.get("comp.h5").unwrap();
    assert!(stored.node_at("/dataset2").is_some());
}
