use crate::error::{Error, Result};
use crate::model::basis::{Basis, Units, IDENTITY_CELL};
use crate::model::lattice::{Lattice, LatticeType};
use crate::model::material::Material;
use crate::utils::linalg::Mat3;

const BOHR_TO_ANG: f64 = 0.5291772109;

/// `CELL_PARAMETERS` and `ATOMIC_POSITIONS` cards for a pw.x input.
///
/// Constrained atoms carry the `if_pos` flags (1 moves, 0 fixed).
pub fn to_espresso_format(material: &Material) -> Result<String> {
    let basis = material.basis().as_crystal()?;
    let mut out = String::from("CELL_PARAMETERS angstrom\n");
    for v in &material.lattice().vector_arrays() {
        out.push_str(&format!("{:14.9} {:14.9} {:14.9}\n", v[0], v[1], v[2]));
    }
    out.push_str("\nATOMIC_POSITIONS crystal\n");
    for atom in basis.atoms().values() {
        let p = atom.coordinate;
        out.push_str(&format!("{:<4}{:14.9} {:14.9} {:14.9}", atom.element, p[0], p[1], p[2]));
        if let Some(flags) = atom.constraint {
            for f in flags {
                out.push_str(if f { " 1" } else { " 0" });
            }
        }
        out.push('\n');
    }
    Ok(out)
}

type AtomLine = (String, [f64; 3], Option<[bool; 3]>);

#[derive(Clone, Copy, Debug, PartialEq)]
enum Unit {
    Angstrom,
    Bohr,
    Alat,
    Crystal,
}

/// Reads the structure of a pw.x input: explicit `CELL_PARAMETERS`, or
/// `ibrav` 1-3 with `celldm(1)`/`A`, plus `ATOMIC_POSITIONS`.
pub fn parse(content: &str) -> Result<Material> {
    let lines: Vec<&str> = content.lines().collect();
    let mut alat = 0.0;
    let mut ibrav = 0;

    // Pass 1: namelist values
    for line in &lines {
        let lower = line.trim().to_lowercase();
        if lower.starts_with('!') || lower.starts_with('#') {
            continue;
        }
        for assignment in lower.split(',') {
            let Some((key, value)) = assignment.split_once('=') else {
                continue;
            };
            let Some(value) = parse_number(value) else {
                continue;
            };
            match key.replace(' ', "").as_str() {
                "celldm(1)" => alat = value * BOHR_TO_ANG,
                "a" => alat = value,
                "ibrav" => ibrav = value as i32,
                _ => {}
            }
        }
    }

    // Pass 2: cards
    let mut cell: Option<Mat3> = None;
    let mut positions: Option<(Unit, Vec<AtomLine>)> = None;
    let mut i = 0;
    while i < lines.len() {
        let lower = lines[i].trim().to_lowercase();

        if lower.starts_with("cell_parameters") {
            // Without celldm(1) or A, pw.x reads an unlabelled cell in bohr
            let default = if alat > 0.0 { Unit::Alat } else { Unit::Bohr };
            let factor = match header_unit(&lower, default) {
                Unit::Bohr => BOHR_TO_ANG,
                Unit::Alat if alat > 0.0 => alat,
                Unit::Alat => {
                    return Err(Error::parse(i + 1, "CELL_PARAMETERS alat needs celldm(1) or A"));
                }
                Unit::Angstrom | Unit::Crystal => 1.0,
            };
            let mut m = [[0.0; 3]; 3];
            for (k, row) in m.iter_mut().enumerate() {
                let line = lines
                    .get(i + 1 + k)
                    .ok_or_else(|| Error::parse(i + 2 + k, "truncated CELL_PARAMETERS"))?;
                *row = parse_vec3(line, i + 2 + k)?.map(|x| x * factor);
            }
            cell = Some(m);
            i += 4;
            continue;
        }

        if lower.starts_with("atomic_positions") {
            let unit = header_unit(&lower, Unit::Alat);
            let mut atoms = Vec::new();
            i += 1;
            while i < lines.len() {
                let line = lines[i].trim();
                if line.is_empty() || line.starts_with('/') || line.starts_with('&') {
                    break;
                }
                let first = line.split_whitespace().next().unwrap_or("").to_lowercase();
                if first.starts_with("k_points") || first.starts_with("cell_parameters") {
                    break;
                }
                let parts: Vec<&str> = line.split_whitespace().collect();
                let xyz = parse_vec3(&parts[1..].join(" "), i + 1)?;
                let flags = if parts.len() >= 7 {
                    Some([parts[4] != "0", parts[5] != "0", parts[6] != "0"])
                } else {
                    None
                };
                atoms.push((parts[0].to_string(), xyz, flags));
                i += 1;
            }
            positions = Some((unit, atoms));
            continue;
        }
        i += 1;
    }

    let (vectors, lattice_type) = match cell {
        Some(m) => (m, LatticeType::Tri),
        None => lattice_from_ibrav(ibrav, alat).ok_or_else(|| {
            Error::InvalidLattice(format!(
                "unsupported ibrav {} or missing CELL_PARAMETERS (alat={})",
                ibrav, alat
            ))
        })?,
    };
    let (unit, atoms) = positions.ok_or_else(|| Error::parse(lines.len(), "no ATOMIC_POSITIONS card"))?;

    let lattice = Lattice::from_vectors(vectors, lattice_type)?;
    let scale = match unit {
        Unit::Bohr => BOHR_TO_ANG,
        Unit::Alat => alat,
        Unit::Angstrom | Unit::Crystal => 1.0,
    };
    let units = if unit == Unit::Crystal {
        Units::Crystal
    } else {
        Units::Cartesian
    };

    let mut basis = Basis::new(units, IDENTITY_CELL)?;
    for (element, xyz, flags) in atoms {
        let id = basis.add_atom(element, xyz.map(|x| x * scale));
        if let Some(f) = flags {
            basis.set_constraint(id, f);
        }
    }
    if units == Units::Cartesian {
        basis.set_cell(vectors)?;
        basis.to_crystal()?;
    }
    log::debug!("Parsed pw.x input: ibrav {}, {} atoms", ibrav, basis.n_atoms());

    Material::new(basis, lattice)
}

fn header_unit(lower: &str, default: Unit) -> Unit {
    if lower.contains("angstrom") {
        Unit::Angstrom
    } else if lower.contains("bohr") {
        Unit::Bohr
    } else if lower.contains("crystal") {
        Unit::Crystal
    } else if lower.contains("alat") {
        Unit::Alat
    } else {
        default
    }
}

// Symmetric pw.x settings for the cubic Bravais lattices
fn lattice_from_ibrav(ibrav: i32, a: f64) -> Option<(Mat3, LatticeType)> {
    if a <= 1e-6 {
        return None;
    }
    let h = a / 2.0;
    match ibrav {
        1 => Some(([[a, 0.0, 0.0], [0.0, a, 0.0], [0.0, 0.0, a]], LatticeType::Cub)),
        2 => Some(([[-h, 0.0, h], [0.0, h, h], [-h, h, 0.0]], LatticeType::Fcc)),
        // ibrav=-3 vectors; pairwise at arccos(-1/3)
        3 => Some(([[-h, h, h], [h, -h, h], [h, h, -h]], LatticeType::Bcc)),
        _ => None,
    }
}

/// Handles trailing comments and Fortran `d` exponents.
fn parse_number(raw: &str) -> Option<f64> {
    let token = raw.split('!').next()?.split_whitespace().next()?;
    token.to_lowercase().replace('d', "e").parse().ok()
}

fn parse_vec3(line: &str, line_no: usize) -> Result<[f64; 3]> {
    let nums: Vec<f64> = line
        .split_whitespace()
        .take(3)
        .map(|t| parse_number(&t.replace(',', "")))
        .collect::<Option<_>>()
        .ok_or_else(|| Error::parse(line_no, "expected three numbers"))?;
    if nums.len() < 3 {
        return Err(Error::parse(line_no, "expected three numbers"));
    }
    Ok([nums[0], nums[1], nums[2]])
}
