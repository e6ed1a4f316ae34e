use crate::error::{Error, Result};
use crate::model::basis::{Basis, BasisConfig, Units, IDENTITY_CELL};
use crate::model::identified::Tagged;
use crate::model::lattice::{Lattice, LatticeType};
use crate::model::material::Material;
use crate::utils::linalg::Mat3;

/// Parses atom lines `El x y z [cx cy cz]` into a basis config.
///
/// A leading atom-count line and the comment line after it are skipped,
/// so plain XYZ files work too. An extended-XYZ `Lattice="..."` comment
/// becomes the cell; otherwise the cell is the identity.
pub fn to_basis_config(text: &str, units: Units) -> Result<BasisConfig> {
    let raw: Vec<&str> = text.lines().collect();
    let mut start = raw.iter().position(|l| !l.trim().is_empty()).unwrap_or(raw.len());
    let mut cell = IDENTITY_CELL;
    let mut declared = None;

    // 1. Optional header: count line, then the comment line even if blank
    if let Some(count) = raw.get(start).and_then(|l| l.trim().parse::<usize>().ok()) {
        declared = Some((count, start + 1));
        if let Some(comment) = raw.get(start + 1) {
            cell = lattice_from_comment(comment).unwrap_or(IDENTITY_CELL);
        }
        start += 2;
    }

    let lines = raw
        .iter()
        .enumerate()
        .skip(start)
        .filter(|(_, l)| !l.trim().is_empty());

    // 2. Atoms
    let mut elements = Vec::new();
    let mut coordinates = Vec::new();
    let mut constraints = Vec::new();

    for (id, (i, line)) in lines.enumerate() {
        let line_no = i + 1;
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 4 {
            return Err(Error::parse(line_no, "expected `element x y z`"));
        }
        if !parts[0].chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
            return Err(Error::parse(line_no, format!("invalid element `{}`", parts[0])));
        }

        let mut xyz = [0.0; 3];
        for k in 0..3 {
            xyz[k] = parts[k + 1]
                .parse()
                .map_err(|_| Error::parse(line_no, format!("invalid coordinate `{}`", parts[k + 1])))?;
        }

        if parts.len() >= 7 {
            let mut flags = [true; 3];
            for k in 0..3 {
                flags[k] = parse_flag(parts[k + 4])
                    .ok_or_else(|| Error::parse(line_no, format!("invalid constraint `{}`", parts[k + 4])))?;
            }
            constraints.push(Tagged { id, value: flags });
        }

        elements.push(Tagged { id, value: parts[0].to_string() });
        coordinates.push(Tagged { id, value: xyz });
    }

    if let Some((count, line_no)) = declared {
        if count != elements.len() {
            return Err(Error::parse(
                line_no,
                format!("header declares {} atoms, found {}", count, elements.len()),
            ));
        }
    }

    Ok(BasisConfig {
        elements,
        coordinates,
        units: Some(units),
        cell,
        constraints,
    })
}

/// Atom lines only, in the basis' current units.
pub fn from_basis(basis: &Basis) -> String {
    let mut out = String::new();
    for atom in basis.atoms().values() {
        let c = atom.coordinate;
        out.push_str(&format!("{:<4}{:>16.9}{:>16.9}{:>16.9}", atom.element, c[0], c[1], c[2]));
        if let Some(flags) = atom.constraint {
            for f in flags {
                out.push_str(if f { " 1" } else { " 0" });
            }
        }
        out.push('\n');
    }
    out
}

/// Full XYZ file: count, comment with the extended-XYZ lattice, atoms in
/// Cartesian or (with `fractional`) crystal coordinates.
pub fn from_material(material: &Material, fractional: bool) -> Result<String> {
    let basis = if fractional {
        material.basis().as_crystal()?
    } else {
        material.basis().as_cartesian()?
    };

    let v = material.lattice().vector_arrays();
    let lattice = v
        .iter()
        .flatten()
        .map(|x| format!("{:.9}", x))
        .collect::<Vec<_>>()
        .join(" ");
    let name = material.name().map(str::to_string).unwrap_or_else(|| material.formula());

    Ok(format!(
        "{}\n{} Lattice=\"{}\"\n{}",
        basis.n_atoms(),
        name,
        lattice,
        from_basis(&basis)
    ))
}

/// Parses an XYZ file into a material. Without an extended-XYZ lattice the
/// structure is taken as a molecule in a cubic box twice its extent.
pub fn parse(text: &str) -> Result<Material> {
    let config = to_basis_config(text, Units::Cartesian)?;
    let periodic = config.cell != IDENTITY_CELL;
    let mut basis = Basis::try_from(config)?;

    let lattice = if periodic {
        // Fractions survive the reorientation of the cell below
        basis.to_crystal()?;
        Lattice::from_vectors(basis.cell(), LatticeType::Tri)?
    } else {
        Lattice::cubic(basis.get_minimum_lattice_size(2.0)?)?
    };

    let mut material = Material::new(basis, lattice)?;
    material.set_non_periodic(!periodic);
    Ok(material)
}

// Format: Lattice="ax ay az bx by bz cx cy cz"
fn lattice_from_comment(comment: &str) -> Option<Mat3> {
    let start = comment.find("Lattice=\"")?;
    let remainder = &comment[start + 9..];
    let end = remainder.find('"')?;
    let parts: Vec<f64> = remainder[..end]
        .split_whitespace()
        .filter_map(|s| s.parse().ok())
        .collect();
    if parts.len() != 9 {
        return None;
    }
    Some([
        [parts[0], parts[1], parts[2]],
        [parts[3], parts[4], parts[5]],
        [parts[6], parts[7], parts[8]],
    ])
}

fn parse_flag(token: &str) -> Option<bool> {
    match token {
        "1" | "T" | "t" | "true" => Some(true),
        "0" | "F" | "f" | "false" => Some(false),
        _ => None,
    }
}
