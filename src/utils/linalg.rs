// src/utils/linalg.rs

use crate::error::{Error, Result};
use nalgebra::{Matrix3, Vector3};

pub type Vec3 = [f64; 3];
pub type Mat3 = [[f64; 3]; 3];

/// Row matrix [[ax, ay, az], [bx, by, bz], [cx, cy, cz]] as an nalgebra matrix
pub fn to_matrix(m: Mat3) -> Matrix3<f64> {
    Matrix3::from_row_slice(&[
        m[0][0], m[0][1], m[0][2], m[1][0], m[1][1], m[1][2], m[2][0], m[2][1], m[2][2],
    ])
}

pub fn from_matrix(m: &Matrix3<f64>) -> Mat3 {
    [
        [m.m11, m.m12, m.m13],
        [m.m21, m.m22, m.m23],
        [m.m31, m.m32, m.m33],
    ]
}

pub fn determinant(m: Mat3) -> f64 {
    to_matrix(m).determinant()
}

/// Inverse of a row matrix, or `SingularCell` when the determinant vanishes
pub fn inverse(m: Mat3) -> Result<Mat3> {
    let mat = to_matrix(m);
    let det = mat.determinant();
    if det.abs() < 1e-12 {
        return Err(Error::SingularCell(det));
    }
    let inv = mat.try_inverse().ok_or(Error::SingularCell(det))?;
    Ok(from_matrix(&inv))
}

/// Row vector times matrix: `p · m`
///
/// With `m` holding the lattice vectors as rows this is the
/// fractional → Cartesian map; with the inverse it goes the other way.
///
/// # Formula
/// ```text
/// result = m^T × p
/// ```
pub fn row_times(p: Vec3, m: Mat3) -> Vec3 {
    let v = to_matrix(m).transpose() * Vector3::from(p);
    [v.x, v.y, v.z]
}

/// Matrix product `a · b` of two row matrices
pub fn multiply(a: Mat3, b: Mat3) -> Mat3 {
    from_matrix(&(to_matrix(a) * to_matrix(b)))
}

/// Convert fractional coordinates to Cartesian using lattice matrix
pub fn frac_to_cart(frac: Vec3, lattice: Mat3) -> Vec3 {
    row_times(frac, lattice)
}

/// Convert Cartesian coordinates to fractional using lattice matrix
///
/// Fails only when the lattice is singular.
pub fn cart_to_frac(cart: Vec3, lattice: Mat3) -> Result<Vec3> {
    Ok(row_times(cart, inverse(lattice)?))
}

/// Round to a number of decimal places, folding `-0` into `0`
pub fn round_to(x: f64, decimals: u32) -> f64 {
    let k = 10f64.powi(decimals as i32);
    let r = (x * k).round() / k;
    if r == 0.0 {
        0.0
    } else {
        r
    }
}
