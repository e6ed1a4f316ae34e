// src/model/material.rs

use crate::config::Config;
use crate::error::{Error, Result};
use crate::io::{espresso, poscar, xyz};
use crate::model::basis::{Basis, BasisConfig};
use crate::model::elements::{ElementData, PeriodicTable};
use crate::model::lattice::Lattice;
use crate::physics::operations::conventional;
use serde::{Deserialize, Serialize};

pub const INCHI: &str = "inchi";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DerivedProperty {
    pub name: String,
    pub value: serde_json::Value,
}

/// Serialized material shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub basis: BasisConfig,
    pub lattice: Lattice,
    #[serde(default)]
    pub is_non_periodic: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub derived_properties: Vec<DerivedProperty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

/// A basis in a lattice plus metadata.
///
/// The basis cell always mirrors the lattice vectors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MaterialConfig", into = "MaterialConfig")]
pub struct Material {
    name: Option<String>,
    basis: Basis,
    lattice: Lattice,
    is_non_periodic: bool,
    derived_properties: Vec<DerivedProperty>,
    hash: Option<String>,
}

impl Material {
    pub fn new(basis: Basis, lattice: Lattice) -> Result<Self> {
        let mut basis = basis;
        basis.set_cell(lattice.vector_arrays())?;
        Ok(Self {
            name: None,
            basis,
            lattice,
            is_non_periodic: false,
            derived_properties: Vec::new(),
            hash: None,
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    // --- Accessors ---

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn basis(&self) -> &Basis {
        &self.basis
    }

    pub fn basis_mut(&mut self) -> &mut Basis {
        &mut self.basis
    }

    /// Replaces the basis; its cell is reset to this lattice.
    pub fn set_basis(&mut self, basis: Basis) -> Result<()> {
        let mut basis = basis;
        basis.set_cell(self.lattice.vector_arrays())?;
        self.basis = basis;
        Ok(())
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    /// Replaces the lattice. Crystal coordinates keep their fractions;
    /// Cartesian ones keep their absolute positions.
    pub fn set_lattice(&mut self, lattice: Lattice) -> Result<()> {
        self.basis.set_cell(lattice.vector_arrays())?;
        self.lattice = lattice;
        Ok(())
    }

    pub fn is_non_periodic(&self) -> bool {
        self.is_non_periodic
    }

    pub fn set_non_periodic(&mut self, is_non_periodic: bool) {
        self.is_non_periodic = is_non_periodic;
    }

    pub fn derived_properties(&self) -> &[DerivedProperty] {
        &self.derived_properties
    }

    pub fn get_derived_property_by_name(&self, name: &str) -> Option<&DerivedProperty> {
        self.derived_properties.iter().find(|p| p.name == name)
    }

    /// Inserts or replaces a property by name.
    pub fn set_derived_property(&mut self, name: impl Into<String>, value: serde_json::Value) {
        let name = name.into();
        match self.derived_properties.iter_mut().find(|p| p.name == name) {
            Some(p) => p.value = value,
            None => self.derived_properties.push(DerivedProperty { name, value }),
        }
    }

    /// Cached hash, if one was stored
    pub fn hash(&self) -> Option<&str> {
        self.hash.as_deref()
    }

    pub fn set_hash(&mut self, hash: impl Into<String>) {
        self.hash = Some(hash.into());
    }

    // --- Composition ---

    pub fn formula(&self) -> String {
        self.basis.formula()
    }

    pub fn formula_with(&self, data: &dyn ElementData) -> String {
        self.basis.formula_with(data)
    }

    pub fn unit_cell_formula(&self) -> String {
        self.basis.unit_cell_formula()
    }

    pub fn get_minimum_lattice_size(&self, scaling_factor: f64) -> Result<f64> {
        self.basis
            .get_minimum_lattice_size_with(scaling_factor, &PeriodicTable, &Config::default())
    }

    // --- Hashing ---

    fn inchi_for_hash(&self) -> Result<String> {
        let property = self
            .get_derived_property_by_name(INCHI)
            .ok_or_else(|| Error::MissingIdentifier(INCHI.to_string()))?;
        match &property.value {
            serde_json::Value::String(s) if !s.is_empty() => Ok(s.clone()),
            serde_json::Value::String(_) | serde_json::Value::Null => {
                Err(Error::MissingIdentifier(INCHI.to_string()))
            }
            other => Ok(other.to_string()),
        }
    }

    pub fn calculate_hash(&self, salt: &str, is_scaled: bool, bypass_non_periodic_check: bool) -> Result<String> {
        self.calculate_hash_with(salt, is_scaled, bypass_non_periodic_check, &Config::default())
    }

    /// Hex digest of `basis#lattice#salt`. Molecules hash their InChI
    /// instead, since their lattice is only a bounding box.
    pub fn calculate_hash_with(
        &self,
        salt: &str,
        is_scaled: bool,
        bypass_non_periodic_check: bool,
        config: &Config,
    ) -> Result<String> {
        let message = if !self.is_non_periodic || bypass_non_periodic_check {
            format!(
                "{}#{}#{}",
                self.basis.hash_string_with(config)?,
                self.lattice.get_hash_string_with(is_scaled, config),
                salt
            )
        } else {
            self.inchi_for_hash()?
        };
        log::debug!("Hashing message: {}", message);
        Ok(blake3::hash(message.as_bytes()).to_hex().to_string())
    }

    pub fn scaled_hash(&self) -> Result<String> {
        self.calculate_hash("", true, false)
    }

    /// Computes the plain hash and stores it.
    pub fn calculate_and_set_hash(&mut self) -> Result<String> {
        let hash = self.calculate_hash("", false, false)?;
        self.hash = Some(hash.clone());
        Ok(hash)
    }

    /// Same atomic arrangement, compared by basis fingerprint.
    pub fn is_equal_to(&self, other: &Material) -> Result<bool> {
        self.basis.is_equal_to(&other.basis)
    }

    pub fn has_equivalent_cell_to(&self, other: &Material) -> bool {
        self.lattice
            .has_equivalent_vectors_to(&other.lattice, &Config::default())
    }

    // --- Derived cells ---

    pub fn is_conventional_cell_same_as_primitive(&self) -> bool {
        conventional::is_conventional_same_as_primitive(self.lattice.lattice_type())
    }

    pub fn get_a_copy_with_conventional_cell(&self) -> Result<Material> {
        conventional::to_conventional_cell(self)
    }

    // --- Formats ---

    pub fn to_xyz(&self, fractional: bool) -> Result<String> {
        xyz::from_material(self, fractional)
    }

    pub fn to_poscar(&self, omit_constraints: bool) -> Result<String> {
        poscar::to_poscar(self, omit_constraints)
    }

    pub fn to_espresso(&self) -> Result<String> {
        espresso::to_espresso_format(self)
    }
}

impl TryFrom<MaterialConfig> for Material {
    type Error = Error;

    fn try_from(config: MaterialConfig) -> Result<Self> {
        let basis = Basis::try_from(config.basis)?;
        let mut material = Material::new(basis, config.lattice)?;
        material.name = config.name;
        material.is_non_periodic = config.is_non_periodic;
        material.derived_properties = config.derived_properties;
        material.hash = config.hash;
        Ok(material)
    }
}

impl From<Material> for MaterialConfig {
    fn from(material: Material) -> Self {
        Self {
            name: material.name,
            basis: material.basis.into(),
            lattice: material.lattice,
            is_non_periodic: material.is_non_periodic,
            derived_properties: material.derived_properties,
            hash: material.hash,
        }
    }
}
