//! Crystal structure model: id-tagged atom bases, lattices, canonical
//! fingerprints and hashes, formulas, supercells and conventional cells,
//! and XYZ / POSCAR / pw.x text interchange.

pub mod config;
pub mod error;
pub mod io;
pub mod model;
pub mod physics;
pub mod utils;

pub use config::Config;
pub use error::{Error, Result};
pub use model::{Basis, Lattice, LatticeType, Material};
