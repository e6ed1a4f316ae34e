// src/io/poscar.rs

use crate::error::{Error, Result};
use crate::model::basis::{Basis, Units, IDENTITY_CELL};
use crate::model::lattice::{Lattice, LatticeType};
use crate::model::material::Material;

/// VASP POSCAR text for a material, coordinates in `direct` (crystal) units.
///
/// Species lines follow the run-length element counts, so the atom order
/// of the basis is preserved. Constraints become a `Selective dynamics`
/// block unless `omit_constraints` is set.
pub fn to_poscar(material: &Material, omit_constraints: bool) -> Result<String> {
    let basis = material.basis().as_crystal()?;
    let counts = basis.element_counts();
    let selective = !omit_constraints && basis.has_constraints();

    let mut out = String::new();

    // 1. Header
    let name = material.name().map(str::to_string).unwrap_or_else(|| material.formula());
    out.push_str(&format!("{}\n", name));
    out.push_str("1.0\n");

    // 2. Lattice Vectors
    for vec in &material.lattice().vector_arrays() {
        out.push_str(&format!(" {:14.9} {:14.9} {:14.9}\n", vec[0], vec[1], vec[2]));
    }

    // 3. Species and counts
    let labels: Vec<String> = counts.iter().map(|c| c.element.clone()).collect();
    let numbers: Vec<String> = counts.iter().map(|c| c.count.to_string()).collect();
    out.push_str(&format!("{}\n", labels.join(" ")));
    out.push_str(&format!("{}\n", numbers.join(" ")));

    // 4. Positions
    if selective {
        out.push_str("Selective dynamics\n");
    }
    out.push_str("direct\n");
    for atom in basis.atoms().values() {
        let p = atom.coordinate;
        out.push_str(&format!(" {:14.9} {:14.9} {:14.9}", p[0], p[1], p[2]));
        if selective {
            let flags = atom.constraint.unwrap_or([true; 3]);
            for f in flags {
                out.push_str(if f { " T" } else { " F" });
            }
        }
        out.push('\n');
    }

    Ok(out)
}

/// The comment line, used as the structure name
pub fn get_name_from_contents(text: &str) -> String {
    text.lines().next().unwrap_or("").trim().to_string()
}

/// Total number of atoms declared in the counts line.
pub fn atoms_count(text: &str) -> Result<usize> {
    let lines: Vec<&str> = text.lines().collect();
    let (_, counts_idx) = species_lines(&lines)?;
    parse_counts(lines[counts_idx], counts_idx + 1).map(|c| c.iter().sum())
}

/// Parses a POSCAR into a material with a triclinic lattice.
pub fn parse(text: &str) -> Result<Material> {
    let lines: Vec<&str> = text.lines().collect();
    let line = |i: usize| -> Result<&str> {
        lines
            .get(i)
            .copied()
            .ok_or_else(|| Error::parse(i + 1, "unexpected end of file"))
    };

    // Scale
    let scale: f64 = line(1)?
        .split_whitespace()
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| Error::parse(2, "invalid scale"))?;

    // Lattice
    let mut vectors = [[0.0; 3]; 3];
    for (i, vector) in vectors.iter_mut().enumerate() {
        *vector = parse_vec3(line(2 + i)?, 3 + i)?.map(|x| x * scale);
    }

    // Elements & Counts
    let (labels_idx, counts_idx) = species_lines(&lines)?;
    let counts = parse_counts(line(counts_idx)?, counts_idx + 1)?;
    let labels: Vec<String> = match labels_idx {
        Some(i) => line(i)?.split_whitespace().map(str::to_string).collect(),
        None => vec!["X".to_string(); counts.len()],
    };
    if labels.len() != counts.len() {
        return Err(Error::parse(
            counts_idx + 1,
            format!("{} species but {} counts", labels.len(), counts.len()),
        ));
    }

    // Mode
    let mut cursor = counts_idx + 1;
    let mut selective = false;
    if line(cursor)?.trim().to_lowercase().starts_with('s') {
        selective = true;
        cursor += 1;
    }
    let mode = line(cursor)?.trim().to_lowercase();
    let units = if mode.starts_with('c') || mode.starts_with('k') {
        Units::Cartesian
    } else {
        Units::Crystal
    };
    cursor += 1;

    // Atoms
    let lattice = Lattice::from_vectors(vectors, LatticeType::Tri)?;
    let mut basis = Basis::new(units, IDENTITY_CELL)?;
    for (label, &count) in labels.iter().zip(&counts) {
        for _ in 0..count {
            let row = line(cursor)?;
            let mut p = parse_vec3(row, cursor + 1)?;
            if units == Units::Cartesian {
                p = p.map(|x| x * scale);
            }
            let id = basis.add_atom(label.clone(), p);
            if selective {
                let flags: Vec<bool> = row
                    .split_whitespace()
                    .skip(3)
                    .take(3)
                    .map(|t| t.starts_with('T') || t.starts_with('t'))
                    .collect();
                if flags.len() == 3 {
                    basis.set_constraint(id, [flags[0], flags[1], flags[2]]);
                }
            }
            cursor += 1;
        }
    }

    // Cartesian positions refer to the file's own vectors, which may be
    // rotated relative to the standard orientation of `lattice`.
    if units == Units::Cartesian {
        basis.set_cell(vectors)?;
        basis.to_crystal()?;
    }

    let mut material = Material::new(basis, lattice)?;
    let name = get_name_from_contents(text);
    if !name.is_empty() {
        material.set_name(name);
    }
    Ok(material)
}

/// Indices of the species line (absent in VASP 4 files) and the counts line.
fn species_lines(lines: &[&str]) -> Result<(Option<usize>, usize)> {
    let line6 = lines.get(5).ok_or_else(|| Error::parse(6, "missing species line"))?;
    let first = line6.trim().chars().next();
    if first.is_some_and(|c| c.is_ascii_alphabetic()) {
        if lines.len() < 7 {
            return Err(Error::parse(7, "missing counts line"));
        }
        Ok((Some(5), 6))
    } else {
        Ok((None, 5))
    }
}

fn parse_counts(line: &str, line_no: usize) -> Result<Vec<usize>> {
    line.split_whitespace()
        .map(|x| {
            x.parse()
                .map_err(|_| Error::parse(line_no, format!("invalid count `{}`", x)))
        })
        .collect()
}

fn parse_vec3(line: &str, line_no: usize) -> Result<[f64; 3]> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 3 {
        return Err(Error::parse(line_no, "expected three numbers"));
    }
    let mut v = [0.0; 3];
    for k in 0..3 {
        v[k] = parts[k]
            .parse()
            .map_err(|_| Error::parse(line_no, format!("invalid number `{}`", parts[k])))?;
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quartz_like() -> Material {
        let basis = Basis::from_atoms(
            vec!["Si", "O", "O", "Si"],
            vec![
                [0.0, 0.0, 0.0],
                [0.25, 0.25, 0.0],
                [0.75, 0.25, 0.5],
                [0.5, 0.5, 0.5],
            ],
            Units::Crystal,
            IDENTITY_CELL,
        )
        .unwrap();
        let lattice = Lattice::new(LatticeType::Tet, 4.9, 4.9, 5.4, 90.0, 90.0, 90.0).unwrap();
        let mut m = Material::new(basis, lattice).unwrap();
        m.set_name("SiO2 test");
        m
    }

    #[test]
    fn test_to_poscar_layout() {
        let text = to_poscar(&quartz_like(), false).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "SiO2 test");
        assert_eq!(lines[1], "1.0");
        assert_eq!(lines[5], "Si O Si");
        assert_eq!(lines[6], "1 2 1");
        assert_eq!(lines[7], "direct");
        assert_eq!(lines.len(), 12);
    }

    #[test]
    fn test_selective_dynamics() {
        let mut m = quartz_like();
        m.basis_mut().set_constraint(1, [false, false, true]);

        let text = to_poscar(&m, false).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[7], "Selective dynamics");
        assert!(lines[9].ends_with("T T T"));
        assert!(lines[10].ends_with("F F T"));

        let omitted = to_poscar(&m, true).unwrap();
        assert!(!omitted.contains("Selective"));
    }

    #[test]
    fn test_count_and_name() {
        let text = to_poscar(&quartz_like(), false).unwrap();
        assert_eq!(atoms_count(&text).unwrap(), 4);
        assert_eq!(get_name_from_contents(&text), "SiO2 test");
    }

    #[test]
    fn test_vasp4_counts() {
        let text = "old\n1.0\n1 0 0\n0 1 0\n0 0 1\n2 3\nDirect\n";
        assert_eq!(atoms_count(text).unwrap(), 5);
    }

    #[test]
    fn test_parse_roundtrip() {
        let mut m = quartz_like();
        m.basis_mut().set_constraint(2, [true, false, false]);
        let parsed = parse(&to_poscar(&m, false).unwrap()).unwrap();

        assert_eq!(parsed.name(), Some("SiO2 test"));
        assert_eq!(parsed.unit_cell_formula(), m.unit_cell_formula());
        assert!(parsed.is_equal_to(&m).unwrap());
        assert_eq!(
            parsed.basis().atoms().get(2).unwrap().constraint,
            Some([true, false, false])
        );
        assert_eq!(
            parsed.lattice().get_hash_string(false),
            m.lattice().get_hash_string(false)
        );
    }

    #[test]
    fn test_parse_cartesian() {
        let text = "NaCl\n2.0\n2 0 0\n0 2 0\n0 0 2\nNa Cl\n1 1\nCartesian\n0 0 0\n1 1 1\n";
        let m = parse(text).unwrap();
        let coords = m.basis().coordinates();
        assert_eq!(m.basis().units(), Units::Crystal);
        for x in coords[1] {
            assert!((x - 0.5).abs() < 1e-9);
        }
        assert!((m.lattice().a() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_truncated_file() {
        let text = "bad\n1.0\n1 0 0\n0 1 0\n";
        assert!(matches!(parse(text), Err(Error::Parse { .. })));
    }
}
