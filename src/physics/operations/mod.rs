pub mod conventional;
pub mod supercell;

pub use supercell::SupercellMatrix;
