// src/io/mod.rs
pub mod espresso;
pub mod poscar;
pub mod xyz;

use crate::error::Result;
use crate::model::material::Material;
use std::fs;
use std::path::Path;

pub fn load_material(path: &Path) -> Result<Material> {
    let content = fs::read_to_string(path)?;
    let p = path.to_string_lossy().to_lowercase();

    if p.ends_with(".json") {
        Material::from_json(&content)
    } else if p.ends_with(".xyz") {
        xyz::parse(&content)
    } else if p.ends_with(".in") || p.ends_with(".pwi") || p.ends_with(".qe") {
        espresso::parse(&content)
    } else {
        // Fallback to POSCAR for unknown or explicit POSCAR/CONTCAR
        poscar::parse(&content)
    }
}

pub fn save_material(path: &Path, material: &Material) -> Result<()> {
    let p = path.to_string_lossy().to_lowercase();

    let content = if p.ends_with(".json") {
        material.to_json()?
    } else if p.ends_with(".xyz") {
        material.to_xyz(false)?
    } else if p.ends_with(".in") || p.ends_with(".pwi") || p.ends_with(".qe") {
        material.to_espresso()?
    } else {
        material.to_poscar(false)?
    };
    fs::write(path, content)?;
    log::info!("Saved {} to {}", material.formula(), path.display());
    Ok(())
}
