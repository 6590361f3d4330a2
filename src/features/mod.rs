//! Feature derivation: interval binning and long-tail collapsing

mod binning;
mod categorical;
mod deriver;

pub use binning::{BinSpec, Cutpoints};
pub use categorical::{CollapseRule, CollapseSpec, OTHER};
pub use deriver::{FeatureConfig, FeatureDeriver, PolicyClaim};
