// src/model/lattice.rs

use crate::config::Config;
use crate::error::{Error, Result};
use crate::utils::geometry::{angle_between, len};
use crate::utils::linalg::{self, Mat3};
use serde::{Deserialize, Serialize};

// --- Enums ---

/// Bravais lattice types (Setyawan-Curtarolo labels).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LatticeType {
    Cub,
    Fcc,
    Bcc,
    Tet,
    Bct,
    Orc,
    Orcf,
    Orci,
    Orcc,
    Hex,
    Rhl,
    Mcl,
    Mclc,
    #[default]
    Tri,
}

impl LatticeType {
    pub fn label(&self) -> &'static str {
        match self {
            LatticeType::Cub => "Simple Cubic",
            LatticeType::Fcc => "Face-centered Cubic",
            LatticeType::Bcc => "Body-centered Cubic",
            LatticeType::Tet => "Simple Tetragonal",
            LatticeType::Bct => "Body-centered Tetragonal",
            LatticeType::Orc => "Orthorhombic",
            LatticeType::Orcf => "Orthorhombic Face-centered",
            LatticeType::Orci => "Orthorhombic Body-centered",
            LatticeType::Orcc => "Orthorhombic Base-centered",
            LatticeType::Hex => "Hexagonal",
            LatticeType::Rhl => "Rhombohedral",
            LatticeType::Mcl => "Simple Monoclinic",
            LatticeType::Mclc => "Base-centered Monoclinic",
            LatticeType::Tri => "Triclinic",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatticeUnits {
    pub length: String,
    pub angle: String,
}

impl Default for LatticeUnits {
    fn default() -> Self {
        Self {
            length: "angstrom".to_string(),
            angle: "degree".to_string(),
        }
    }
}

/// Serialized lattice shape; validated into a [`Lattice`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatticeConfig {
    #[serde(rename = "type", default)]
    pub lattice_type: LatticeType,
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    #[serde(default)]
    pub units: LatticeUnits,
}

// --- Lattice ---

/// A unit cell. The vector matrix is derived once at construction and
/// always agrees with the six parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LatticeConfig", into = "LatticeConfig")]
pub struct Lattice {
    lattice_type: LatticeType,
    a: f64,
    b: f64,
    c: f64,
    alpha: f64,
    beta: f64,
    gamma: f64,
    units: LatticeUnits,
    vectors: Mat3,
}

impl Lattice {
    pub fn new(
        lattice_type: LatticeType,
        a: f64,
        b: f64,
        c: f64,
        alpha: f64,
        beta: f64,
        gamma: f64,
    ) -> Result<Self> {
        let vectors = vectors_from_parameters(a, b, c, alpha, beta, gamma)?;
        Ok(Self {
            lattice_type,
            a,
            b,
            c,
            alpha,
            beta,
            gamma,
            units: LatticeUnits::default(),
            vectors,
        })
    }

    pub fn cubic(a: f64) -> Result<Self> {
        Self::new(LatticeType::Cub, a, a, a, 90.0, 90.0, 90.0)
    }

    /// Recovers the six parameters from three row vectors. The stored vector
    /// matrix is the standard orientation of those parameters, so it equals
    /// `vectors` only up to a rigid rotation.
    pub fn from_vectors(vectors: Mat3, lattice_type: LatticeType) -> Result<Self> {
        let [va, vb, vc] = vectors;
        if linalg::determinant(vectors).abs() < 1e-10 {
            return Err(Error::SingularCell(linalg::determinant(vectors)));
        }
        Self::new(
            lattice_type,
            len(va),
            len(vb),
            len(vc),
            angle_between(vb, vc),
            angle_between(va, vc),
            angle_between(va, vb),
        )
    }

    /// Replaces the whole parameter set, keeping type and units.
    pub fn set_parameters(&mut self, a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> Result<()> {
        *self = Self {
            units: self.units.clone(),
            ..Self::new(self.lattice_type, a, b, c, alpha, beta, gamma)?
        };
        Ok(())
    }

    pub fn set_type(&mut self, lattice_type: LatticeType) {
        self.lattice_type = lattice_type;
    }

    /// Same shape with every length multiplied by `k`
    pub fn scaled_by(&self, k: f64) -> Result<Self> {
        let mut out = self.clone();
        out.set_parameters(self.a * k, self.b * k, self.c * k, self.alpha, self.beta, self.gamma)?;
        Ok(out)
    }

    pub fn lattice_type(&self) -> LatticeType {
        self.lattice_type
    }

    pub fn type_label(&self) -> &'static str {
        self.lattice_type.label()
    }

    /// (a, b, c, alpha, beta, gamma)
    pub fn parameters(&self) -> (f64, f64, f64, f64, f64, f64) {
        (self.a, self.b, self.c, self.alpha, self.beta, self.gamma)
    }

    pub fn a(&self) -> f64 {
        self.a
    }

    pub fn units(&self) -> &LatticeUnits {
        &self.units
    }

    /// Lattice vectors as rows
    pub fn vector_arrays(&self) -> Mat3 {
        self.vectors
    }

    pub fn inverse(&self) -> Result<Mat3> {
        linalg::inverse(self.vectors)
    }

    pub fn volume(&self) -> f64 {
        linalg::determinant(self.vectors).abs()
    }

    pub fn get_hash_string(&self, is_scaled: bool) -> String {
        self.get_hash_string_with(is_scaled, &Config::default())
    }

    /// `"a;b;c;alpha;beta;gamma;"` rounded to the hash precision. Scaling
    /// divides the lengths by `a` first.
    pub fn get_hash_string_with(&self, is_scaled: bool, config: &Config) -> String {
        let k = if is_scaled { self.a } else { 1.0 };
        [
            self.a / k,
            self.b / k,
            self.c / k,
            self.alpha,
            self.beta,
            self.gamma,
        ]
        .iter()
        .map(|x| format!("{};", linalg::round_to(*x, config.hash_precision)))
        .collect()
    }

    /// Componentwise vector comparison within the configured tolerance
    pub fn has_equivalent_vectors_to(&self, other: &Lattice, config: &Config) -> bool {
        self
            .vectors
            .iter()
            .zip(other.vectors.iter())
            .all(|(u, v)| (0..3).all(|k| (u[k] - v[k]).abs() <= config.vector_tolerance))
    }
}

impl TryFrom<LatticeConfig> for Lattice {
    type Error = Error;

    fn try_from(config: LatticeConfig) -> Result<Self> {
        let mut lattice = Lattice::new(
            config.lattice_type,
            config.a,
            config.b,
            config.c,
            config.alpha,
            config.beta,
            config.gamma,
        )?;
        lattice.units = config.units;
        Ok(lattice)
    }
}

impl From<Lattice> for LatticeConfig {
    fn from(lattice: Lattice) -> Self {
        Self {
            lattice_type: lattice.lattice_type,
            a: lattice.a,
            b: lattice.b,
            c: lattice.c,
            alpha: lattice.alpha,
            beta: lattice.beta,
            gamma: lattice.gamma,
            units: lattice.units,
        }
    }
}

/// a along x, b in the xy-plane, c completing the right-handed set.
fn vectors_from_parameters(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> Result<Mat3> {
    for (name, v) in [("a", a), ("b", b), ("c", c)] {
        if !(v.is_finite() && v > 0.0) {
            return Err(Error::InvalidLattice(format!("{} must be positive, got {}", name, v)));
        }
    }
    for (name, v) in [("alpha", alpha), ("beta", beta), ("gamma", gamma)] {
        if !(v.is_finite() && v > 0.0 && v < 180.0) {
            return Err(Error::InvalidLattice(format!("{} must lie in (0, 180), got {}", name, v)));
        }
    }

    let (cos_a, cos_b) = (alpha.to_radians().cos(), beta.to_radians().cos());
    let (sin_g, cos_g) = gamma.to_radians().sin_cos();

    let cx = c * cos_b;
    let cy = c * (cos_a - cos_b * cos_g) / sin_g;
    let cz2 = c * c - cx * cx - cy * cy;
    if cz2 <= 1e-12 * c * c {
        return Err(Error::InvalidLattice(format!(
            "angles ({}, {}, {}) do not span a volume",
            alpha, beta, gamma
        )));
    }

    Ok([
        [a, 0.0, 0.0],
        [b * cos_g, b * sin_g, 0.0],
        [cx, cy, cz2.sqrt()],
    ])
}
