//src/model/mod.rs
pub mod basis;
pub mod elements;
pub mod identified;
pub mod lattice;
pub mod material;

// Re-exports for cleaner imports
pub use basis::{Atom, Basis, BasisConfig, Units};
pub use elements::{ElementData, PeriodicTable};
pub use identified::{IdentifiedSequence, Tagged};
pub use lattice::{Lattice, LatticeType};
pub use material::Material;
