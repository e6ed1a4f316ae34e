use crate::config::Config;
use crate::error::Result;
use crate::model::lattice::LatticeType;
use crate::model::material::Material;
use crate::physics::operations::supercell::{self, SupercellMatrix};

const FACE_CENTERED: SupercellMatrix = [[-1, 1, 1], [1, -1, 1], [1, 1, -1]];
const BODY_CENTERED: SupercellMatrix = [[0, 1, 1], [1, 0, 1], [1, 1, 0]];
const BASE_CENTERED_ORC: SupercellMatrix = [[1, 1, 0], [-1, 1, 0], [0, 0, 1]];
const BASE_CENTERED_MCL: SupercellMatrix = [[1, -1, 0], [1, 1, 0], [0, 0, 1]];

/// Primitive → conventional multiplier and the type of the resulting cell.
/// `None` for lattices whose primitive cell is already conventional.
pub fn primitive_to_conventional(lattice_type: LatticeType) -> Option<(SupercellMatrix, LatticeType)> {
    match lattice_type {
        LatticeType::Fcc => Some((FACE_CENTERED, LatticeType::Cub)),
        LatticeType::Bcc => Some((BODY_CENTERED, LatticeType::Cub)),
        LatticeType::Orcf => Some((FACE_CENTERED, LatticeType::Orc)),
        LatticeType::Orci => Some((BODY_CENTERED, LatticeType::Orc)),
        LatticeType::Orcc => Some((BASE_CENTERED_ORC, LatticeType::Orc)),
        LatticeType::Bct => Some((BODY_CENTERED, LatticeType::Tet)),
        LatticeType::Mclc => Some((BASE_CENTERED_MCL, LatticeType::Mcl)),
        LatticeType::Cub
        | LatticeType::Tet
        | LatticeType::Orc
        | LatticeType::Hex
        | LatticeType::Rhl
        | LatticeType::Mcl
        | LatticeType::Tri => None,
    }
}

pub fn is_conventional_same_as_primitive(lattice_type: LatticeType) -> bool {
    match lattice_type {
        LatticeType::Cub
        | LatticeType::Tet
        | LatticeType::Orc
        | LatticeType::Hex
        | LatticeType::Rhl
        | LatticeType::Mcl
        | LatticeType::Tri => true,
        LatticeType::Fcc
        | LatticeType::Bcc
        | LatticeType::Orcf
        | LatticeType::Orci
        | LatticeType::Orcc
        | LatticeType::Bct
        | LatticeType::Mclc => false,
    }
}

/// Conventional cell for the material's lattice type, or an unmodified
/// copy when the primitive cell already is one.
///
/// The multipliers assume primitive vectors in the Setyawan-Curtarolo
/// setting up to a rotation (e.g. FCC vectors pairwise at 60 degrees).
pub fn to_conventional_cell(material: &Material) -> Result<Material> {
    let lattice_type = material.lattice().lattice_type();
    let (matrix, target) = match primitive_to_conventional(lattice_type) {
        Some(entry) if !is_conventional_same_as_primitive(lattice_type) => entry,
        _ => return Ok(material.clone()),
    };
    log::debug!(
        "Conventional cell for {} via {:?}",
        lattice_type.label(),
        matrix
    );
    supercell::generate_with_type(material, &matrix, target, &Config::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::basis::{Basis, Units, IDENTITY_CELL};
    use crate::model::lattice::Lattice;

    const ALL: [LatticeType; 14] = [
        LatticeType::Cub,
        LatticeType::Fcc,
        LatticeType::Bcc,
        LatticeType::Tet,
        LatticeType::Bct,
        LatticeType::Orc,
        LatticeType::Orcf,
        LatticeType::Orci,
        LatticeType::Orcc,
        LatticeType::Hex,
        LatticeType::Rhl,
        LatticeType::Mcl,
        LatticeType::Mclc,
        LatticeType::Tri,
    ];

    fn material(lattice: Lattice, elements: Vec<&str>, coords: Vec<[f64; 3]>) -> Material {
        let basis = Basis::from_atoms(elements, coords, Units::Crystal, IDENTITY_CELL).unwrap();
        Material::new(basis, lattice).unwrap()
    }

    #[test]
    fn test_tables_agree() {
        for t in ALL {
            assert_eq!(primitive_to_conventional(t).is_none(), is_conventional_same_as_primitive(t));
        }
    }

    #[test]
    fn test_fcc_silicon_to_cubic() {
        let lattice = Lattice::new(LatticeType::Fcc, 3.867, 3.867, 3.867, 60.0, 60.0, 60.0).unwrap();
        let si = material(lattice, vec!["Si", "Si"], vec![[0.0; 3], [0.25, 0.25, 0.25]]);

        let conv = si.get_a_copy_with_conventional_cell().unwrap();
        assert_eq!(conv.lattice().lattice_type(), LatticeType::Cub);
        assert_eq!(conv.basis().n_atoms(), 8);
        assert_eq!(conv.unit_cell_formula(), "Si8");
        assert_eq!(conv.formula(), "Si");

        let (a, b, c, alpha, beta, gamma) = conv.lattice().parameters();
        let edge = 3.867 * 2.0_f64.sqrt();
        for len in [a, b, c] {
            assert!((len - edge).abs() < 1e-6);
        }
        for angle in [alpha, beta, gamma] {
            assert!((angle - 90.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_bcc_to_cubic() {
        // BCC primitive vectors are pairwise at arccos(-1/3)
        let angle = (-1.0_f64 / 3.0).acos().to_degrees();
        let a = 2.87 * 3.0_f64.sqrt() / 2.0;
        let lattice = Lattice::new(LatticeType::Bcc, a, a, a, angle, angle, angle).unwrap();
        let fe = material(lattice, vec!["Fe"], vec![[0.0; 3]]);

        let conv = fe.get_a_copy_with_conventional_cell().unwrap();
        assert_eq!(conv.basis().n_atoms(), 2);
        let (ca, _, _, alpha, _, _) = conv.lattice().parameters();
        assert!((ca - 2.87).abs() < 1e-6);
        assert!((alpha - 90.0).abs() < 1e-6);
    }

    #[test]
    fn test_simple_cubic_is_a_copy() {
        let po = material(Lattice::cubic(3.35).unwrap(), vec!["Po"], vec![[0.0; 3]]);
        assert!(po.is_conventional_cell_same_as_primitive());
        let conv = po.get_a_copy_with_conventional_cell().unwrap();
        assert_eq!(conv, po);
    }
}
