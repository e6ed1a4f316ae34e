// src/utils/geometry.rs

use super::linalg::Vec3;

/// Calculates distance between two points (Angstroms)
pub fn calculate_distance(p1: Vec3, p2: Vec3) -> f64 {
    len(sub(p1, p2))
}

/// Largest distance over all unordered pairs, 0 for fewer than two points
pub fn max_pairwise_distance(points: &[Vec3]) -> f64 {
    let mut max = 0.0_f64;
    for i in 0..points.len() {
        for j in (i + 1)..points.len() {
            max = max.max(calculate_distance(points[i], points[j]));
        }
    }
    max
}

/// Componentwise arithmetic mean, the origin for an empty slice
pub fn centroid(points: &[Vec3]) -> Vec3 {
    if points.is_empty() {
        return [0.0, 0.0, 0.0];
    }
    let n = points.len() as f64;
    let sum = points.iter().fold([0.0; 3], |acc, p| add(acc, *p));
    [sum[0] / n, sum[1] / n, sum[2] / n]
}

/// Angle between two vectors in degrees
pub fn angle_between(v1: Vec3, v2: Vec3) -> f64 {
    let v1 = normalize(v1);
    let v2 = normalize(v2);
    dot(v1, v2).clamp(-1.0, 1.0).acos().to_degrees()
}

// --- Math Helpers for [f64; 3] ---

pub fn add(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

pub fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub fn dot(a: Vec3, b: Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub fn len(a: Vec3) -> f64 {
    dot(a, a).sqrt()
}

fn normalize(a: Vec3) -> Vec3 {
    let l = len(a);
    if l == 0.0 { [0.0, 0.0, 0.0] } else { [a[0] / l, a[1] / l, a[2] / l] }
}
