// src/model/basis.rs

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::elements::{ElementData, PeriodicTable};
use crate::model::identified::{IdentifiedSequence, Tagged};
use crate::utils::geometry;
use crate::utils::linalg::{self, Mat3, Vec3};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

pub const IDENTITY_CELL: Mat3 = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// Fractions of the cell vectors
    Crystal,
    /// Absolute lengths
    Cartesian,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Atom {
    pub element: String,
    pub coordinate: Vec3,
    /// Selective-dynamics flags; `true` means the component may move.
    pub constraint: Option<[bool; 3]>,
}

impl Atom {
    pub fn new(element: impl Into<String>, coordinate: Vec3) -> Self {
        Self {
            element: element.into(),
            coordinate,
            constraint: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementCount {
    pub element: String,
    pub count: usize,
}

/// Serialized basis shape: parallel id-tagged arrays.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BasisConfig {
    pub elements: Vec<Tagged<String>>,
    pub coordinates: Vec<Tagged<Vec3>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<Units>,
    #[serde(default = "identity_cell")]
    pub cell: Mat3,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Tagged<[bool; 3]>>,
}

fn identity_cell() -> Mat3 {
    IDENTITY_CELL
}

/// Atoms (element + coordinate, one id per atom) in one unit system,
/// referred to a cell.
///
/// Canonicalization never mutates: `standard_representation`,
/// `hash_string` and friends work on copies, so a `&Basis` can be hashed
/// from any number of readers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BasisConfig", into = "BasisConfig")]
pub struct Basis {
    atoms: IdentifiedSequence<Atom>,
    units: Units,
    cell: Mat3,
}

impl Basis {
    /// Empty basis
    pub fn new(units: Units, cell: Mat3) -> Result<Self> {
        linalg::inverse(cell)?;
        Ok(Self {
            atoms: IdentifiedSequence::default(),
            units,
            cell,
        })
    }

    pub fn from_atoms<S: Into<String>>(
        elements: Vec<S>,
        coordinates: Vec<Vec3>,
        units: Units,
        cell: Mat3,
    ) -> Result<Self> {
        if elements.len() != coordinates.len() {
            return Err(Error::LengthMismatch {
                elements: elements.len(),
                coordinates: coordinates.len(),
            });
        }
        let mut basis = Self::new(units, cell)?;
        basis.atoms = IdentifiedSequence::new(
            elements
                .into_iter()
                .zip(coordinates)
                .map(|(e, c)| Atom::new(e, c))
                .collect(),
        );
        Ok(basis)
    }

    // --- Accessors ---

    pub fn units(&self) -> Units {
        self.units
    }

    pub fn cell(&self) -> Mat3 {
        self.cell
    }

    /// Replaces the reference cell. Coordinates are left as they are.
    pub fn set_cell(&mut self, cell: Mat3) -> Result<()> {
        linalg::inverse(cell)?;
        self.cell = cell;
        Ok(())
    }

    pub fn atoms(&self) -> &IdentifiedSequence<Atom> {
        &self.atoms
    }

    pub fn n_atoms(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn elements(&self) -> Vec<&str> {
        self.atoms.values().map(|a| a.element.as_str()).collect()
    }

    pub fn coordinates(&self) -> Vec<Vec3> {
        self.atoms.values().map(|a| a.coordinate).collect()
    }

    /// Distinct symbols in order of first appearance
    pub fn unique_elements(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for el in self.elements() {
            if !out.contains(&el) {
                out.push(el);
            }
        }
        out
    }

    pub fn has_constraints(&self) -> bool {
        self.atoms.values().any(|a| a.constraint.is_some())
    }

    // --- Mutation ---

    /// Appends an atom and returns its id. The coordinate is read in the
    /// current units.
    pub fn add_atom(&mut self, element: impl Into<String>, coordinate: Vec3) -> usize {
        self.atoms.add(Atom::new(element, coordinate))
    }

    /// Removes the atom with `id` if given and present, else the first atom
    /// with this element at this coordinate. Returns whether anything went.
    pub fn remove_atom(&mut self, element: &str, coordinate: Vec3, id: Option<usize>) -> bool {
        self
            .atoms
            .remove_where(
                |a| {
                    a.element == element
                        && (0..3).all(|k| (a.coordinate[k] - coordinate[k]).abs() < 1e-10)
                },
                id,
            )
            .is_some()
    }

    pub fn remove_atom_by_id(&mut self, id: usize) -> bool {
        self.atoms.remove_by_id(id).is_some()
    }

    pub fn remove_all_atoms(&mut self) {
        self.atoms.clear();
    }

    pub fn set_constraint(&mut self, id: usize, constraint: [bool; 3]) -> bool {
        match self.atoms.get_by_id_mut(id) {
            Some(atom) => {
                atom.constraint = Some(constraint);
                true
            }
            None => false,
        }
    }

    /// Adds `v` to every coordinate, in the current units.
    pub fn translate_by_vector(&mut self, v: Vec3) {
        self
            .atoms
            .map_in_place(|a| a.coordinate = geometry::add(a.coordinate, v));
    }

    // --- Unit conversion ---

    pub fn to_cartesian(&mut self) -> Result<()> {
        if self.units == Units::Cartesian {
            return Ok(());
        }
        let cell = self.cell;
        self
            .atoms
            .map_in_place(|a| a.coordinate = linalg::row_times(a.coordinate, cell));
        self.units = Units::Cartesian;
        Ok(())
    }

    pub fn to_crystal(&mut self) -> Result<()> {
        if self.units == Units::Crystal {
            return Ok(());
        }
        let inv = linalg::inverse(self.cell)?;
        self
            .atoms
            .map_in_place(|a| a.coordinate = linalg::row_times(a.coordinate, inv));
        self.units = Units::Crystal;
        Ok(())
    }

    pub fn as_cartesian(&self) -> Result<Basis> {
        let mut out = self.clone();
        out.to_cartesian()?;
        Ok(out)
    }

    pub fn as_crystal(&self) -> Result<Basis> {
        let mut out = self.clone();
        out.to_crystal()?;
        Ok(out)
    }

    // --- Canonicalization ---

    pub fn to_standard_representation(&mut self) -> Result<()> {
        self.to_standard_representation_with(&Config::default())
    }

    /// Crystal units with every component wrapped into [0, 1).
    pub fn to_standard_representation_with(&mut self, config: &Config) -> Result<()> {
        self.to_crystal()?;
        let tol = config.wrap_tolerance;
        self.atoms.map_in_place(|a| {
            for x in a.coordinate.iter_mut() {
                *x = wrap_unit(*x, tol);
            }
        });
        Ok(())
    }

    pub fn standard_representation(&self) -> Result<Basis> {
        self.standard_representation_with(&Config::default())
    }

    pub fn standard_representation_with(&self, config: &Config) -> Result<Basis> {
        let mut out = self.clone();
        out.to_standard_representation_with(config)?;
        Ok(out)
    }

    pub fn get_as_sorted_string(&self) -> Result<String> {
        self.get_as_sorted_string_with(&Config::default())
    }

    /// `"<el> <x>,<y>,<z>"` per atom in standard representation, rounded,
    /// sorted, each followed by `;`.
    pub fn get_as_sorted_string_with(&self, config: &Config) -> Result<String> {
        let standard = self.standard_representation_with(config)?;
        let mut lines: Vec<String> = standard
            .atoms
            .values()
            .map(|a| {
                let c = a
                    .coordinate
                    .map(|x| linalg::round_to(x, config.hash_precision));
                format!("{} {},{},{}", a.element, c[0], c[1], c[2])
            })
            .collect();
        lines.sort();
        Ok(format!("{};", lines.join(";")))
    }

    pub fn hash_string(&self) -> Result<String> {
        self.hash_string_with(&Config::default())
    }

    /// Fingerprint of the arrangement, independent of atom order and of the
    /// periodic image each atom was given in.
    pub fn hash_string_with(&self, config: &Config) -> Result<String> {
        self.as_crystal()?.get_as_sorted_string_with(config)
    }

    pub fn is_equal_to(&self, other: &Basis) -> Result<bool> {
        Ok(self.hash_string()? == other.hash_string()?)
    }

    pub fn has_equivalent_cell_to(&self, other: &Basis, config: &Config) -> bool {
        self
            .cell
            .iter()
            .zip(other.cell.iter())
            .all(|(u, v)| (0..3).all(|k| (u[k] - v[k]).abs() <= config.vector_tolerance))
    }

    // --- Composition ---

    /// Run-length counts in atom order: `[Si, Si, O, Si]` gives Si2, O1, Si1.
    pub fn element_counts(&self) -> Vec<ElementCount> {
        let mut out: Vec<ElementCount> = Vec::new();
        for el in self.atoms.values().map(|a| &a.element) {
            match out.last_mut() {
                Some(last) if &last.element == el => last.count += 1,
                _ => out.push(ElementCount {
                    element: el.clone(),
                    count: 1,
                }),
            }
        }
        out
    }

    /// One entry per element, by ascending electronegativity then symbol.
    /// Elements without an electronegativity go last.
    pub fn unique_element_counts_sorted_by_electronegativity(
        &self,
        data: &dyn ElementData,
    ) -> Vec<ElementCount> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for el in self.elements() {
            *counts.entry(el).or_insert(0) += 1;
        }
        let mut out: Vec<ElementCount> = counts
            .into_iter()
            .map(|(element, count)| ElementCount {
                element: element.to_string(),
                count,
            })
            .collect();
        out.sort_by(|x, y| {
            let ex = data.electronegativity(&x.element);
            let ey = data.electronegativity(&y.element);
            let by_en = match (ex, ey) {
                (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            by_en.then_with(|| x.element.cmp(&y.element))
        });
        out
    }

    pub fn formula(&self) -> String {
        self.formula_with(&PeriodicTable)
    }

    /// Empirical formula: counts reduced by their greatest common divisor.
    pub fn formula_with(&self, data: &dyn ElementData) -> String {
        let counts = self.unique_element_counts_sorted_by_electronegativity(data);
        let divisor = counts.iter().fold(0, |acc, c| gcd(acc, c.count)).max(1);
        render_formula(&counts, divisor)
    }

    pub fn unit_cell_formula(&self) -> String {
        self.unit_cell_formula_with(&PeriodicTable)
    }

    pub fn unit_cell_formula_with(&self, data: &dyn ElementData) -> String {
        render_formula(&self.unique_element_counts_sorted_by_electronegativity(data), 1)
    }

    // --- Geometry ---

    pub fn max_pairwise_distance(&self) -> Result<f64> {
        self.max_pairwise_distance_with(&Config::default())
    }

    pub fn max_pairwise_distance_with(&self, config: &Config) -> Result<f64> {
        let points = self.as_cartesian()?.coordinates();
        Ok(linalg::round_to(
            geometry::max_pairwise_distance(&points),
            config.metric_precision,
        ))
    }

    pub fn center_of_coordinates_point(&self) -> Vec3 {
        self.center_of_coordinates_point_with(&Config::default())
    }

    /// Mean of the coordinates in the current units.
    pub fn center_of_coordinates_point_with(&self, config: &Config) -> Vec3 {
        geometry::centroid(&self.coordinates()).map(|x| linalg::round_to(x, config.metric_precision))
    }

    pub fn get_minimum_lattice_size(&self, scaling_factor: f64) -> Result<f64> {
        self.get_minimum_lattice_size_with(scaling_factor, &PeriodicTable, &Config::default())
    }

    /// Edge length of a cell that encloses the structure: the atomic radius
    /// for a lone atom, otherwise the largest interatomic distance scaled.
    pub fn get_minimum_lattice_size_with(
        &self,
        scaling_factor: f64,
        data: &dyn ElementData,
        config: &Config,
    ) -> Result<f64> {
        let size = if self.n_atoms() == 1 {
            let element = self.elements()[0];
            data
                .atomic_radius(element)
                .ok_or_else(|| Error::UnknownElement(element.to_string()))?
        } else {
            self.max_pairwise_distance_with(config)? * scaling_factor
        };
        Ok(linalg::round_to(size, config.metric_precision))
    }
}

// --- Serialization ---

impl TryFrom<BasisConfig> for Basis {
    type Error = Error;

    fn try_from(config: BasisConfig) -> Result<Self> {
        let BasisConfig {
            elements,
            coordinates,
            units,
            cell,
            constraints,
        } = config;

        if elements.len() != coordinates.len() {
            return Err(Error::LengthMismatch {
                elements: elements.len(),
                coordinates: coordinates.len(),
            });
        }

        let units = units.unwrap_or_else(|| {
            log::warn!("Basis units not set, defaulting to crystal");
            Units::Crystal
        });

        let mut entries = Vec::with_capacity(elements.len());
        for (index, (el, coord)) in elements.into_iter().zip(coordinates).enumerate() {
            if el.id != coord.id {
                return Err(Error::IdMismatch {
                    index,
                    element: el.id,
                    coordinate: coord.id,
                });
            }
            entries.push(Tagged {
                id: el.id,
                value: Atom::new(el.value, coord.value),
            });
        }

        let mut basis = Basis::new(units, cell)?;
        basis.atoms = IdentifiedSequence::from_tagged(entries)?;
        for c in constraints {
            if !basis.set_constraint(c.id, c.value) {
                log::warn!("Constraint for unknown atom id {} ignored", c.id);
            }
        }
        Ok(basis)
    }
}

impl From<Basis> for BasisConfig {
    fn from(basis: Basis) -> Self {
        let entries = basis.atoms.entries();
        Self {
            elements: entries
                .iter()
                .map(|e| Tagged {
                    id: e.id,
                    value: e.value.element.clone(),
                })
                .collect(),
            coordinates: entries
                .iter()
                .map(|e| Tagged {
                    id: e.id,
                    value: e.value.coordinate,
                })
                .collect(),
            units: Some(basis.units),
            cell: basis.cell,
            constraints: entries
                .iter()
                .filter_map(|e| e.value.constraint.map(|value| Tagged { id: e.id, value }))
                .collect(),
        }
    }
}

// --- Helpers ---

/// Maps into [0, 1); values within `tol` of either edge become 0.
fn wrap_unit(x: f64, tol: f64) -> f64 {
    let m = x.rem_euclid(1.0);
    if m < tol || 1.0 - m < tol {
        0.0
    } else {
        m
    }
}

fn gcd(a: usize, b: usize) -> usize {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

fn render_formula(counts: &[ElementCount], divisor: usize) -> String {
    counts
        .iter()
        .map(|c| match c.count / divisor {
            1 => c.element.clone(),
            n => format!("{}{}", c.element, n),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::lattice::{Lattice, LatticeType};

    fn fcc_cell() -> Mat3 {
        Lattice::new(LatticeType::Fcc, 3.867, 3.867, 3.867, 60.0, 60.0, 60.0)
            .unwrap()
            .vector_arrays()
    }

    fn silicon() -> Basis {
        Basis::from_atoms(
            vec!["Si", "Si"],
            vec![[0.0, 0.0, 0.0], [0.25, 0.25, 0.25]],
            Units::Crystal,
            fcc_cell(),
        )
        .unwrap()
    }

    fn rock_salt() -> Basis {
        Basis::from_atoms(
            vec!["Na", "Na", "Na", "Na", "Cl", "Cl", "Cl", "Cl"],
            vec![
                [0.0, 0.0, 0.0],
                [0.0, 0.5, 0.5],
                [0.5, 0.0, 0.5],
                [0.5, 0.5, 0.0],
                [0.5, 0.5, 0.5],
                [0.5, 0.0, 0.0],
                [0.0, 0.5, 0.0],
                [0.0, 0.0, 0.5],
            ],
            Units::Crystal,
            [[5.64, 0.0, 0.0], [0.0, 5.64, 0.0], [0.0, 0.0, 5.64]],
        )
        .unwrap()
    }

    struct StubTable;

    impl ElementData for StubTable {
        fn electronegativity(&self, symbol: &str) -> Option<f64> {
            match symbol {
                "A" => Some(3.0),
                "B" => Some(1.0),
                _ => None,
            }
        }

        fn atomic_radius(&self, _symbol: &str) -> Option<f64> {
            Some(0.5)
        }
    }

    #[test]
    fn test_length_mismatch() {
        let err = Basis::from_atoms(vec!["Si"], vec![], Units::Crystal, IDENTITY_CELL).unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { elements: 1, coordinates: 0 }));
    }

    #[test]
    fn test_singular_cell_rejected() {
        let flat = [[1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 0.0, 1.0]];
        assert!(matches!(Basis::new(Units::Crystal, flat), Err(Error::SingularCell(_))));
    }

    #[test]
    fn test_unit_roundtrip() {
        let original = Basis::from_atoms(
            vec!["O", "H", "H"],
            vec![[0.1, 0.2, 0.3], [0.9, -0.4, 1.7], [0.33, 0.66, 0.5]],
            Units::Crystal,
            fcc_cell(),
        )
        .unwrap();

        let mut b = original.clone();
        b.to_cartesian().unwrap();
        assert_eq!(b.units(), Units::Cartesian);
        b.to_crystal().unwrap();
        assert_eq!(b.units(), Units::Crystal);

        for (p, q) in original.coordinates().iter().zip(b.coordinates()) {
            for k in 0..3 {
                assert!((p[k] - q[k]).abs() < 1e-10);
            }
        }

        // The other direction
        let cart = original.as_cartesian().unwrap();
        let back = cart.as_crystal().unwrap().as_cartesian().unwrap();
        for (p, q) in cart.coordinates().iter().zip(back.coordinates()) {
            for k in 0..3 {
                assert!((p[k] - q[k]).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn test_conversion_is_noop_in_same_units() {
        let mut b = silicon();
        b.to_crystal().unwrap();
        assert_eq!(b, silicon());
    }

    #[test]
    fn test_wrap_invariant() {
        let b = Basis::from_atoms(
            vec!["C", "C", "C", "C"],
            vec![
                [1.25, -0.25, 3.0],
                [-1e-9, 0.9999999, 0.5],
                [-2.75, 0.0, 1.0],
                [0.999, 0.0005, 0.42],
            ],
            Units::Crystal,
            IDENTITY_CELL,
        )
        .unwrap();

        let standard = b.standard_representation().unwrap();
        for c in standard.coordinates() {
            for x in c {
                assert!((0.0..1.0).contains(&x), "{} out of range", x);
            }
        }
        assert_eq!(standard.coordinates()[0], [0.25, 0.75, 0.0]);
        assert_eq!(standard.coordinates()[1], [0.0, 0.0, 0.5]);
        // The caller's copy is untouched
        assert_eq!(b.coordinates()[0], [1.25, -0.25, 3.0]);
    }

    #[test]
    fn test_sorted_string() {
        assert_eq!(
            silicon().get_as_sorted_string().unwrap(),
            "Si 0,0,0;Si 0.25,0.25,0.25;"
        );
    }

    #[test]
    fn test_hash_string_keeps_units() {
        let cart = silicon().as_cartesian().unwrap();
        let hash = cart.hash_string().unwrap();
        assert_eq!(cart.units(), Units::Cartesian);
        assert_eq!(hash, silicon().hash_string().unwrap());
    }

    #[test]
    fn test_permutation_invariance() {
        let b = rock_salt();
        let mut elements = b.elements();
        let mut coords = b.coordinates();
        elements.reverse();
        coords.reverse();
        elements.swap(0, 3);
        coords.swap(0, 3);
        let permuted = Basis::from_atoms(elements, coords, Units::Crystal, b.cell()).unwrap();

        assert_eq!(b.hash_string().unwrap(), permuted.hash_string().unwrap());
        assert!(b.is_equal_to(&permuted).unwrap());
    }

    #[test]
    fn test_periodic_image_invariance() {
        let mut shifted = silicon();
        shifted.translate_by_vector([1.0, -2.0, 3.0]);
        assert_eq!(shifted.hash_string().unwrap(), silicon().hash_string().unwrap());
    }

    #[test]
    fn test_sensitivity() {
        let base = silicon().hash_string().unwrap();

        let mut moved = silicon();
        moved.remove_atom("Si", [0.25, 0.25, 0.25], None);
        moved.add_atom("Si", [0.26, 0.25, 0.25]);
        assert_ne!(moved.hash_string().unwrap(), base);

        let mut swapped = silicon();
        swapped.remove_atom_by_id(1);
        swapped.add_atom("Ge", [0.25, 0.25, 0.25]);
        assert_ne!(swapped.hash_string().unwrap(), base);
    }

    #[test]
    fn test_sensitivity_near_cell_face() {
        let at_origin = Basis::from_atoms(vec!["O"], vec![[0.0, 0.5, 0.5]], Units::Crystal, IDENTITY_CELL).unwrap();
        let near_face = Basis::from_atoms(vec!["O"], vec![[0.0009, 0.5, 0.5]], Units::Crystal, IDENTITY_CELL).unwrap();
        let mid_cell = Basis::from_atoms(vec!["O"], vec![[0.5, 0.5, 0.5]], Units::Crystal, IDENTITY_CELL).unwrap();
        let mid_moved = Basis::from_atoms(vec!["O"], vec![[0.5009, 0.5, 0.5]], Units::Crystal, IDENTITY_CELL).unwrap();

        assert_ne!(at_origin.hash_string().unwrap(), near_face.hash_string().unwrap());
        assert_ne!(mid_cell.hash_string().unwrap(), mid_moved.hash_string().unwrap());
    }

    #[test]
    fn test_noise_collapses() {
        let mut noisy = silicon();
        noisy.translate_by_vector([1e-7, -1e-7, 2e-7]);
        assert_eq!(noisy.hash_string().unwrap(), silicon().hash_string().unwrap());
    }

    #[test]
    fn test_precision_is_configurable() {
        let config = Config {
            hash_precision: 1,
            ..Config::default()
        };
        assert_eq!(
            silicon().hash_string_with(&config).unwrap(),
            "Si 0,0,0;Si 0.3,0.3,0.3;"
        );
    }

    #[test]
    fn test_formula_reduction() {
        let b = rock_salt();
        assert_eq!(b.formula(), "NaCl");
        assert_eq!(b.unit_cell_formula(), "Na4Cl4");
    }

    #[test]
    fn test_single_element_formula() {
        let b = silicon();
        assert_eq!(b.formula(), "Si");
        assert_eq!(b.unit_cell_formula(), "Si2");
    }

    #[test]
    fn test_formula_with_injected_table() {
        let b = Basis::from_atoms(
            vec!["A", "A", "B", "B", "B", "B", "X", "X"],
            vec![[0.0; 3]; 8],
            Units::Crystal,
            IDENTITY_CELL,
        )
        .unwrap();
        // B is less electronegative than A; X has no value and goes last
        assert_eq!(b.unit_cell_formula_with(&StubTable), "B4A2X2");
        assert_eq!(b.formula_with(&StubTable), "B2AX");
    }

    #[test]
    fn test_element_counts_run_length() {
        let b = Basis::from_atoms(
            vec!["Si", "Si", "O", "Si"],
            vec![[0.0; 3]; 4],
            Units::Crystal,
            IDENTITY_CELL,
        )
        .unwrap();
        let counts: Vec<(String, usize)> = b
            .element_counts()
            .into_iter()
            .map(|c| (c.element, c.count))
            .collect();
        assert_eq!(
            counts,
            vec![("Si".to_string(), 2), ("O".to_string(), 1), ("Si".to_string(), 1)]
        );
        assert_eq!(b.unique_elements(), vec!["Si", "O"]);
    }

    #[test]
    fn test_max_pairwise_distance() {
        let mut b = Basis::from_atoms(
            vec!["H", "H"],
            vec![[0.0, 0.0, 0.0], [0.0, 1.5, 2.0]],
            Units::Cartesian,
            IDENTITY_CELL,
        )
        .unwrap();
        assert!((b.max_pairwise_distance().unwrap() - 2.5).abs() < 1e-4);
        assert_eq!(b.units(), Units::Cartesian);

        b.remove_atom_by_id(1);
        assert_eq!(b.max_pairwise_distance().unwrap(), 0.0);
    }

    #[test]
    fn test_max_pairwise_distance_from_crystal() {
        let b = Basis::from_atoms(
            vec!["H", "H"],
            vec![[0.0, 0.0, 0.0], [0.5, 0.0, 0.0]],
            Units::Crystal,
            [[5.0, 0.0, 0.0], [0.0, 5.0, 0.0], [0.0, 0.0, 5.0]],
        )
        .unwrap();
        assert!((b.max_pairwise_distance().unwrap() - 2.5).abs() < 1e-4);
        assert_eq!(b.units(), Units::Crystal);
    }

    #[test]
    fn test_center_of_coordinates() {
        let b = Basis::from_atoms(
            vec!["H", "H", "O"],
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            Units::Cartesian,
            IDENTITY_CELL,
        )
        .unwrap();
        assert_eq!(b.center_of_coordinates_point(), [0.3333, 0.3333, 0.0]);
    }

    #[test]
    fn test_minimum_lattice_size() {
        let pair = Basis::from_atoms(
            vec!["H", "H"],
            vec![[0.0, 0.0, 0.0], [0.0, 1.5, 2.0]],
            Units::Cartesian,
            IDENTITY_CELL,
        )
        .unwrap();
        assert!((pair.get_minimum_lattice_size(2.0).unwrap() - 5.0).abs() < 1e-9);

        let single = Basis::from_atoms(vec!["O"], vec![[0.0; 3]], Units::Cartesian, IDENTITY_CELL).unwrap();
        assert!((single.get_minimum_lattice_size(2.0).unwrap() - 0.73).abs() < 1e-9);

        let unknown = Basis::from_atoms(vec!["Qq"], vec![[0.0; 3]], Units::Cartesian, IDENTITY_CELL).unwrap();
        assert!(matches!(unknown.get_minimum_lattice_size(2.0), Err(Error::UnknownElement(_))));
    }

    #[test]
    fn test_equivalent_cell() {
        let config = Config::default();
        let a = silicon();
        let mut nudged = fcc_cell();
        nudged[2][1] += 1e-9;
        let b = Basis::from_atoms(vec!["Si"], vec![[0.0; 3]], Units::Crystal, nudged).unwrap();
        assert!(a.has_equivalent_cell_to(&b, &config));
        assert!(a.has_equivalent_cell_to(&a, &config));
        assert!(!a.has_equivalent_cell_to(&rock_salt(), &config));
    }

    #[test]
    fn test_remove_missing_atom_is_noop() {
        let mut b = silicon();
        assert!(!b.remove_atom("Si", [0.5, 0.5, 0.5], None));
        assert!(!b.remove_atom_by_id(42));
        assert_eq!(b.n_atoms(), 2);
    }

    #[test]
    fn test_config_roundtrip_and_default_units() {
        let json = r#"{
            "elements": [{"id": 3, "value": "Si"}, {"id": 5, "value": "Si"}],
            "coordinates": [{"id": 3, "value": [0, 0, 0]}, {"id": 5, "value": [0.25, 0.25, 0.25]}],
            "constraints": [{"id": 5, "value": [true, false, true]}]
        }"#;
        let b: Basis = serde_json::from_str(json).unwrap();
        assert_eq!(b.units(), Units::Crystal);
        assert_eq!(b.cell(), IDENTITY_CELL);
        assert_eq!(b.atoms().ids(), vec![3, 5]);
        assert_eq!(
            b.atoms().get_by_id(5).unwrap().constraint,
            Some([true, false, true])
        );

        let value = serde_json::to_value(&b).unwrap();
        assert_eq!(value["units"], "crystal");
        assert_eq!(value["elements"][1]["id"], 5);
        let back: Basis = serde_json::from_value(value).unwrap();
        assert_eq!(back, b);
    }

    #[test]
    fn test_config_id_mismatch() {
        let json = r#"{
            "elements": [{"id": 0, "value": "Si"}],
            "coordinates": [{"id": 1, "value": [0, 0, 0]}],
            "units": "crystal"
        }"#;
        assert!(serde_json::from_str::<Basis>(json).is_err());
    }
}
