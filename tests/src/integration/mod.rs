//! Cross-crate notarisation scenarios.

pub mod notarisation_flows;
