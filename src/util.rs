//! Utility functions for odimh5.

use crate::data::DataNode;
use ndarray::ArrayD;

/// Summary statistics over the finite cells of a grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridStats {
    /// Minimum and maximum values.
    pub min_max: Option<(f64, f64)>,
    /// Mean value.
    pub mean: Option<f64>,
    /// Sample standard deviation.
    pub std: Option<f64>,
    /// Count of valid (finite) values.
    pub valid_count: usize,
    /// Total number of cells.
    pub total: usize,
}

impl GridStats {
    /// Compute statistics, skipping NaN and infinite cells.
    pub fn compute(data: &ArrayD<f64>) -> Self {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0f64;
        let mut count = 0usize;
        for &v in data.iter() {
            if v.is_finite() {
                min = min.min(v);
                max = max.max(v);
                sum += v;
                count += 1;
            }
        }
        let min_max = (count > 0).then_some((min, max));
        let mean = (count > 0).then(|| sum / count as f64);
        let std = match mean {
            Some(mean_val) if count > 1 => {
                let ssd: f64 = data
                    .iter()
                    .filter(|v| v.is_finite())
                    .map(|v| (v - mean_val) * (v - mean_val))
                    .sum();
                Some((ssd / (count - 1) as f64).sqrt())
            },
            _ => None,
        };

        Self {
            min_max,
            mean,
            std,
            valid_count: count,
            total: data.len(),
        }
    }

    /// Multi-line human readable summary.
    pub fn summary(&self, shape: &[usize]) -> String {
        let dims: Vec<String> = shape.iter().map(|d| d.to_string()).collect();
        let mut text = format!("Shape: {}\n", dims.join("x"));
        text.push_str(&format!("Valid: {} / {}\n", self.valid_count, self.total));
        if let Some((min, max)) = self.min_max {
            text.push_str(&format!("Min: {}\nMax: {}\n", min, max));
        }
        if let Some(mean) = self.mean {
            text.push_str(&format!("Mean: {}\n", mean));
        }
        if let Some(std) = self.std {
            text.push_str(&format!("Std: {}\n", std));
        }
        text
    }
}

/// Render a node hierarchy as an indented tree, attributes included.
pub fn format_tree(node: &DataNode) -> String {
    format_tree_recursive(node, "", true)
}

fn format_tree_recursive(node: &DataNode, prefix: &str, is_last: bool) -> String {
    let mut result = String::new();

    let connector = if is_last { "└── " } else { "├── " };
    result.push_str(&format!("{}{}{}\n", prefix, connector, node.display_name()));

    let new_prefix = format!("{}{}   ", prefix, if is_last { " " } else { "│" });

    for (key, value) in &node.attributes {
        result.push_str(&format!("{}  @{} = {}\n", new_prefix, key, value));
    }

    for (i, child) in node.children.iter().enumerate() {
        let is_last_child = i == node.children.len() - 1;
        result.push_str(&format_tree_recursive(child, &new_prefix, is_last_child));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn stats_skip_non_finite_cells() {
        let data = array![[1.0, f64::NAN], [3.0, 5.0]].into_dyn();
        let stats = GridStats::compute(&data);
        assert_eq!(stats.min_max, Some((1.0, 5.0)));
        assert_eq!(stats.mean, Some(3.0));
        assert_eq!(stats.std, Some(2.0));
        assert_eq!(stats.valid_count, 3);
        assert_eq!(stats.total, 4);
    }

    #[test]
    fn stats_of_empty_grid() {
        let data = array![[f64::NAN]].into_dyn();
        let stats = GridStats::compute(&data);
        assert_eq!(stats.min_max, None);
        assert_eq!(stats.mean, None);
        assert_eq!(stats.std, None);
    }

    #[test]
    fn tree_lists_nodes_and_attributes() {
        let root = DataNode::root()
            .with_child(DataNode::group("what").with_attr("object", "PVOL"))
            .with_child(DataNode::group("where").with_attr("lat", 58.1));
        let text = format_tree(&root);
        assert!(text.contains("what (0)"));
        assert!(text.contains("@object = PVOL"));
        assert!(text.contains("@lat = 58.1"));
    }
}
