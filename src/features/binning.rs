//! Interval binning of continuous fields
//!
//! Intervals are right-closed, `(lo, hi]`. When `include_lowest` is set the
//! first interval also contains its lower edge and is written `[lo, hi]`.
//! A value that falls in no interval is never moved to the nearest bin; the
//! caller receives `None` and decides how to fail.

use crate::error::{DataError, Result};
use serde::{Deserialize, Serialize};

/// Ordered bin edges with precomputed interval labels
#[derive(Debug, Clone, PartialEq)]
pub struct Cutpoints {
    edges: Vec<f64>,
    include_lowest: bool,
    labels: Vec<String>,
}

/// Render an edge the way it appears in a label
fn format_edge(edge: f64) -> String {
    if edge == f64::INFINITY {
        "Inf".to_string()
    } else {
        format!("{}", edge)
    }
}

impl Cutpoints {
    /// Build cutpoints for `field`
    ///
    /// Edges must be strictly increasing, at least two, and only the last one
    /// may be infinite.
    pub fn new(field: &'static str, edges: Vec<f64>, include_lowest: bool) -> Result<Self> {
        let invalid = |reason: &str| DataError::InvalidCutpoints {
            field,
            reason: reason.to_string(),
        };

        if edges.len() < 2 {
            return Err(invalid("at least two edges are required"));
        }
        if edges.iter().any(|e| e.is_nan()) {
            return Err(invalid("edges must not be NaN"));
        }
        if edges[..edges.len() - 1].iter().any(|e| e.is_infinite()) {
            return Err(invalid("only the last edge may be infinite"));
        }
        if edges.windows(2).any(|w| w[0] >= w[1]) {
            return Err(invalid("edges must be strictly increasing"));
        }

        let labels = edges
            .windows(2)
            .enumerate()
            .map(|(i, w)| {
                let open = if i == 0 && include_lowest { '[' } else { '(' };
                format!("{}{},{}]", open, format_edge(w[0]), format_edge(w[1]))
            })
            .collect();

        Ok(Self {
            edges,
            include_lowest,
            labels,
        })
    }

    /// Index of the interval containing `value`
    pub fn locate(&self, value: f64) -> Option<usize> {
        if value.is_nan() {
            return None;
        }

        let lowest = self.edges[0];
        if value < lowest {
            return None;
        }
        if value == lowest {
            return self.include_lowest.then_some(0);
        }

        // First upper edge that is >= value
        self.edges[1..].iter().position(|&upper| value <= upper)
    }

    /// Label of the interval containing `value`
    pub fn label_for(&self, value: f64) -> Option<&str> {
        self.locate(value).map(|i| self.labels[i].as_str())
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn bin_count(&self) -> usize {
        self.labels.len()
    }
}

fn default_open_ended() -> bool {
    true
}

/// Configurable form of a set of cutpoints
///
/// `open_ended` appends `+Inf` as the last edge, since JSON has no infinity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinSpec {
    pub edges: Vec<f64>,
    #[serde(default)]
    pub include_lowest: bool,
    #[serde(default = "default_open_ended")]
    pub open_ended: bool,
}

impl BinSpec {
    pub fn new(edges: &[f64], include_lowest: bool) -> Self {
        Self {
            edges: edges.to_vec(),
            include_lowest,
            open_ended: true,
        }
    }

    pub fn build(&self, field: &'static str) -> Result<Cutpoints> {
        let mut edges = self.edges.clone();
        if self.open_ended {
            edges.push(f64::INFINITY);
        }
        Cutpoints::new(field, edges, self.include_lowest)
    }
}
