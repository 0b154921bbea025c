//! Synthetic ODIM_H5 products shared by the integration tests.

#![allow(dead_code)]

use ndarray::{array, Array2};
use odimh5::{DataNode, MemoryBackend};

pub const PROJDEF: &str = "+proj=stere +lat_0=90 +lon_0=14 +lat_ts=60 +ellps=bessel";

pub fn field_group(name: &str, quantity: &str, grid: Array2<u8>) -> DataNode {
    DataNode::group(name)
        .with_child(DataNode::field("data", grid))
        .with_child(
            DataNode::group("what")
                .with_attr("quantity", quantity)
                .with_attr("gain", 0.5)
                .with_attr("offset", -32.0)
                .with_attr("nodata", 255.0)
                .with_attr("undetect", 0.0),
        )
}

/// Composite with UL=(54,3), LR=(50,7), 2x3 pixels of 2.0 units.
pub fn cartesian_product() -> DataNode {
    DataNode::root()
        .with_child(
            DataNode::group("what")
                .with_attr("object", "COMP")
                .with_attr("date", "20240101")
                .with_attr("time", "120000"),
        )
        .with_child(
            DataNode::group("where")
                .with_attr("projdef", PROJDEF)
                .with_attr("xscale", 2.0)
                .with_attr("yscale", 2.0)
                .with_attr("xsize", 3i64)
                .with_attr("ysize", 2i64)
                .with_attr("UL_lat", 54.0)
                .with_attr("UL_lon", 3.0)
                .with_attr("UR_lat", 54.0)
                .with_attr("UR_lon", 7.0)
                .with_attr("LL_lat", 50.0)
                .with_attr("LL_lon", 3.0)
                .with_attr("LR_lat", 50.0)
                .with_attr("LR_lon", 7.0),
        )
        .with_child(
            DataNode::group("dataset1")
                .with_child(field_group("data1", "DBZH", array![[0, 10, 20], [255, 100, 0]]))
                .with_child(DataNode::group("what").with_attr("product", "PCAPPI")),
        )
}

/// Volume with two sweeps (0.5 and 1.5 degrees).
pub fn polar_volume() -> DataNode {
    DataNode::root()
        .with_child(DataNode::group("what").with_attr("object", "PVOL"))
        .with_child(
            DataNode::group("where")
                .with_attr("height", 222.0)
                .with_attr("lat", 58.1)
                .with_attr("lon", 12.8),
        )
        .with_child(
            DataNode::group("how").with_attr("task", "se.smhi.sweep"),
        )
        .with_child(
            DataNode::group("dataset1")
                .with_child(
                    DataNode::group("where")
                        .with_attr("elangle", 0.5)
                        .with_attr("nbins", 3i64)
                        .with_attr("nrays", 2i64)
                        .with_attr("rscale", 500.0)
                        .with_attr("rstart", 0.0),
                )
                .with_child(DataNode::group("how").with_attr("startazA", 0.0))
                .with_child(field_group("data1", "TH", array![[1, 2, 3], [4, 5, 6]]))
                .with_child(field_group("data2", "DBZH", array![[0, 64, 255], [10, 20, 30]])),
        )
        .with_child(
            DataNode::group("dataset2")
                .with_child(
                    DataNode::group("where")
                        .with_attr("elangle", 1.5)
                        .with_attr("nbins", 4i64)
                        .with_attr("nrays", 2i64)
                        .with_attr("rscale", 1000.0)
                        .with_attr("rstart", 0.0),
                )
                .with_child(DataNode::group("how").with_attr("startazA", 0.5))
                .with_child(field_group("data1", "DBZH", array![[2, 4, 6, 8], [0, 0, 255, 255]])),
        )
}

pub fn backend_with(path: &str, root: DataNode) -> MemoryBackend {
    let backend = MemoryBackend::new();
    backend.insert(path, root);
    backend
}
