//! Generate `siav2model` spectral range `UPDATE` statements from a CSV metadata export.

pub mod process;
pub mod types;
