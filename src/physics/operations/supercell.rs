use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::basis::{Basis, Units, IDENTITY_CELL};
use crate::model::lattice::{Lattice, LatticeType};
use crate::model::material::Material;
use crate::utils::linalg::{self, Mat3, Vec3};

/// Integer 3x3 matrix; row i gives new vector i in terms of the old ones.
pub type SupercellMatrix = [[i32; 3]; 3];

pub fn diagonal_matrix(nx: i32, ny: i32, nz: i32) -> SupercellMatrix {
    [[nx, 0, 0], [0, ny, 0], [0, 0, nz]]
}

/// `nx × ny × nz` replication along the existing lattice vectors.
pub fn generate_diagonal(material: &Material, nx: u32, ny: u32, nz: u32) -> Result<Material> {
    let mut out = generate_with_type(
        material,
        &diagonal_matrix(nx as i32, ny as i32, nz as i32),
        material.lattice().lattice_type(),
        &Config::default(),
    )?;
    let name = material.name().unwrap_or("Material");
    out.set_name(format!("{} ({}x{}x{} Supercell)", name, nx, ny, nz));
    Ok(out)
}

/// General supercell. The result is typed triclinic since an arbitrary
/// integer matrix need not preserve the lattice symmetry.
pub fn generate(material: &Material, matrix: &SupercellMatrix) -> Result<Material> {
    let mut out = generate_with_type(material, matrix, LatticeType::Tri, &Config::default())?;
    if let Some(name) = material.name() {
        out.set_name(format!("{} (Supercell)", name));
    }
    Ok(out)
}

pub fn generate_with_type(
    material: &Material,
    matrix: &SupercellMatrix,
    lattice_type: LatticeType,
    config: &Config,
) -> Result<Material> {
    let m = to_float(matrix);
    let det = linalg::determinant(m).round() as i64;
    if det == 0 {
        return Err(Error::MalformedTransformation(format!(
            "{:?} has zero determinant",
            matrix
        )));
    }

    // 1. New lattice: rows of M · V
    let vectors = linalg::multiply(m, material.lattice().vector_arrays());
    let lattice = Lattice::from_vectors(vectors, lattice_type)?;

    // 2. Old fractional coordinates
    let source = material.basis().as_crystal()?;
    let basis = generate_basis(&source, matrix, config)?;

    let expected = source.n_atoms() * det.unsigned_abs() as usize;
    if basis.n_atoms() != expected {
        log::warn!(
            "Supercell holds {} atoms, expected {} ({} x |det| {})",
            basis.n_atoms(),
            expected,
            source.n_atoms(),
            det.abs()
        );
    }

    // Derived properties and cached hash describe the old cell; drop them.
    let mut out = Material::new(basis, lattice)?;
    out.set_non_periodic(material.is_non_periodic());
    if let Some(name) = material.name() {
        out.set_name(name);
    }
    Ok(out)
}

/// Replicates `basis` (crystal units) over every translation that lands
/// inside the supercell, expressed in the supercell's fractions.
fn generate_basis(basis: &Basis, matrix: &SupercellMatrix, config: &Config) -> Result<Basis> {
    let m = to_float(matrix);
    let inv = linalg::inverse(m)
        .map_err(|_| Error::MalformedTransformation(format!("{:?} is singular", matrix)))?;
    let tol = config.supercell_tolerance;

    let mut out = Basis::new(Units::Crystal, IDENTITY_CELL)?;
    let (lo, hi) = translation_bounds(m);

    for x in lo[0]..=hi[0] {
        for y in lo[1]..=hi[1] {
            for z in lo[2]..=hi[2] {
                let shift = [x as f64, y as f64, z as f64];
                for atom in basis.atoms().values() {
                    let p = atom.coordinate.map(|f| fold(f.rem_euclid(1.0)));
                    let old = [p[0] + shift[0], p[1] + shift[1], p[2] + shift[2]];
                    let new = linalg::row_times(old, inv);
                    if !new.iter().all(|&f| f >= -tol && f < 1.0 - tol) {
                        continue;
                    }
                    let new = new.map(|f| fold(if f < 0.0 { f + 1.0 } else { f }));
                    if contains(&out, &atom.element, new, tol) {
                        continue;
                    }
                    let id = out.add_atom(atom.element.clone(), new);
                    if let Some(c) = atom.constraint {
                        out.set_constraint(id, c);
                    }
                }
            }
        }
    }
    Ok(out)
}

/// Integer range per axis covering the supercell's corners in old fractions.
fn translation_bounds(m: Mat3) -> ([i64; 3], [i64; 3]) {
    let mut lo = [0.0_f64; 3];
    let mut hi = [0.0_f64; 3];
    for corner in 0..8 {
        let c = [
            (corner & 1) as f64,
            ((corner >> 1) & 1) as f64,
            ((corner >> 2) & 1) as f64,
        ];
        let p = linalg::row_times(c, m);
        for k in 0..3 {
            lo[k] = lo[k].min(p[k]);
            hi[k] = hi[k].max(p[k]);
        }
    }
    (
        lo.map(|v| v.floor() as i64 - 1),
        hi.map(|v| v.ceil() as i64),
    )
}

fn contains(basis: &Basis, element: &str, p: Vec3, tol: f64) -> bool {
    basis
        .atoms()
        .values()
        .any(|a| a.element == element && (0..3).all(|k| (a.coordinate[k] - p[k]).abs() <= tol))
}

// `rem_euclid` and `f + 1.0` can round up to exactly 1.0
fn fold(f: f64) -> f64 {
    if f >= 1.0 {
        0.0
    } else {
        f
    }
}

fn to_float(matrix: &SupercellMatrix) -> Mat3 {
    matrix.map(|row| row.map(|v| v as f64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cubic_polonium() -> Material {
        let basis = Basis::from_atoms(vec!["Po"], vec![[0.0, 0.0, 0.0]], Units::Crystal, IDENTITY_CELL).unwrap();
        let mut m = Material::new(basis, Lattice::cubic(3.35).unwrap()).unwrap();
        m.set_name("Po");
        m
    }

    fn rock_salt_pair() -> Material {
        let basis = Basis::from_atoms(
            vec!["Na", "Cl"],
            vec![[0.0, 0.0, 0.0], [0.5, 0.5, 0.5]],
            Units::Crystal,
            IDENTITY_CELL,
        )
        .unwrap();
        Material::new(basis, Lattice::cubic(4.0).unwrap()).unwrap()
    }

    #[test]
    fn test_diagonal_supercell() {
        let sc = generate_diagonal(&rock_salt_pair(), 2, 2, 1).unwrap();
        assert_eq!(sc.basis().n_atoms(), 8);
        assert_eq!(sc.unit_cell_formula(), "Na4Cl4");
        assert_eq!(sc.formula(), "NaCl");

        let (a, b, c, alpha, beta, gamma) = sc.lattice().parameters();
        assert!((a - 8.0).abs() < 1e-9 && (b - 8.0).abs() < 1e-9 && (c - 4.0).abs() < 1e-9);
        assert!((alpha - 90.0).abs() < 1e-9 && (beta - 90.0).abs() < 1e-9 && (gamma - 90.0).abs() < 1e-9);
        assert_eq!(sc.name(), Some("Material (2x2x1 Supercell)"));

        for c in sc.basis().coordinates() {
            for x in c {
                assert!((0.0..1.0).contains(&x));
            }
        }
    }

    #[test]
    fn test_identity_is_a_copy() {
        let m = rock_salt_pair();
        let sc = generate_diagonal(&m, 1, 1, 1).unwrap();
        assert!(sc.is_equal_to(&m).unwrap());
        assert_eq!(sc.basis().n_atoms(), 2);
    }

    #[test]
    fn test_general_matrix() {
        // A sheared cell of twice the volume
        let sc = generate(&cubic_polonium(), &[[1, 1, 0], [-1, 1, 0], [0, 0, 1]]).unwrap();
        assert_eq!(sc.basis().n_atoms(), 2);
        assert_eq!(sc.lattice().lattice_type(), LatticeType::Tri);
        assert!((sc.lattice().volume() - 2.0 * 3.35_f64.powi(3)).abs() < 1e-9);
        assert_eq!(sc.name(), Some("Po (Supercell)"));
    }

    #[test]
    fn test_negative_determinant() {
        let sc = generate(&cubic_polonium(), &[[0, 1, 0], [1, 0, 0], [0, 0, 2]]).unwrap();
        assert_eq!(sc.basis().n_atoms(), 2);
    }

    #[test]
    fn test_singular_matrix_rejected() {
        let err = generate(&cubic_polonium(), &[[1, 0, 0], [2, 0, 0], [0, 0, 1]]).unwrap_err();
        assert!(matches!(err, Error::MalformedTransformation(_)));
    }

    #[test]
    fn test_atoms_outside_cell_are_folded_in() {
        let mut m = rock_salt_pair();
        m.basis_mut().translate_by_vector([-1.0, 2.0, 0.0]);
        let sc = generate_diagonal(&m, 2, 1, 1).unwrap();
        assert_eq!(sc.basis().n_atoms(), 4);
    }

    #[test]
    fn test_unit_supercell_keeps_coordinates_exactly() {
        let basis = Basis::from_atoms(
            vec!["O", "O"],
            vec![[0.0008, 0.5, 0.5], [0.9999995, 0.25, 0.25]],
            Units::Crystal,
            IDENTITY_CELL,
        )
        .unwrap();
        let m = Material::new(basis, Lattice::cubic(20.0).unwrap()).unwrap();

        let sc = generate_diagonal(&m, 1, 1, 1).unwrap();
        let coords = sc.basis().coordinates();
        assert_eq!(coords.len(), 2);
        for c in m.basis().coordinates() {
            assert!(coords.contains(&c), "{:?} moved", c);
        }
    }

    #[test]
    fn test_constraints_are_replicated() {
        let mut m = cubic_polonium();
        m.basis_mut().set_constraint(0, [false, true, true]);
        let sc = generate_diagonal(&m, 3, 1, 1).unwrap();
        assert!(sc
            .basis()
            .atoms()
            .values()
            .all(|a| a.constraint == Some([false, true, true])));
    }
}
