// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Row-wise vector math over batches of 3D vectors

use nalgebra::{Point3, Vector3};

/// Dot product of each pair of rows.
///
/// Both batches must have the same length; extra rows in the longer batch are ignored.
pub fn dot_by_row(a: &[Vector3<f64>], b: &[Vector3<f64>]) -> Vec<f64> {
    a.iter().zip(b).map(|(u, v)| u.dot(v)).collect()
}

/// Euclidean length of each row
pub fn magnitude_by_row(v: &[Vector3<f64>]) -> Vec<f64> {
    dot_by_row(v, v).into_iter().map(f64::sqrt).collect()
}

/// Divide a vector by its magnitude.
///
/// No guard for zero length: the division yields inf/NaN components, which the
/// caller either masks out or checks for.
pub fn normalize(v: &Vector3<f64>) -> Vector3<f64> {
    v / v.dot(v).sqrt()
}

/// Normalize every row of a batch
pub fn normalize_rows(v: &[Vector3<f64>]) -> Vec<Vector3<f64>> {
    v.iter()
        .zip(magnitude_by_row(v))
        .map(|(row, mag)| row / mag)
        .collect()
}

/// Widen an f32 point to f64
pub fn widen(p: &Point3<f32>) -> Point3<f64> {
    Point3::new(p.x as f64, p.y as f64, p.z as f64)
}

/// Componentwise absolute value
pub fn abs_vector(v: &Vector3<f64>) -> Vector3<f64> {
    v.map(f64::abs)
}

/// Check if two floats are approximately equal
pub fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

/// Clamp a value between min and max
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Linear interpolation
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_by_row() {
        let a = [Vector3::new(1.0, 2.0, 3.0), Vector3::new(0.0, 1.0, 0.0)];
        let b = [Vector3::new(4.0, 5.0, 6.0), Vector3::new(1.0, 0.0, 0.0)];
        assert_eq!(dot_by_row(&a, &b), vec![32.0, 0.0]);
    }

    #[test]
    fn test_magnitude_by_row() {
        let v = [Vector3::new(3.0, 4.0, 0.0), Vector3::new(0.0, 0.0, -2.0)];
        assert_eq!(magnitude_by_row(&v), vec![5.0, 2.0]);
    }

    #[test]
    fn test_normalize_propagates_nan_for_zero_vector() {
        let n = normalize(&Vector3::new(0.0, 0.0, 2.0));
        assert_eq!(n, Vector3::new(0.0, 0.0, 1.0));

        let zero = normalize(&Vector3::zeros());
        assert!(zero.iter().all(|c| c.is_nan()));
    }

    #[test]
    fn test_normalize_rows() {
        let rows = normalize_rows(&[Vector3::new(2.0, 0.0, 0.0), Vector3::new(0.0, 3.0, 4.0)]);
        assert!(approx_eq(rows[0].x, 1.0, 1e-12));
        assert!(approx_eq(rows[1].y, 0.6, 1e-12));
        assert!(approx_eq(rows[1].z, 0.8, 1e-12));
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(5.0, 0.0, 10.0), 5.0);
        assert_eq!(clamp(-5.0, 0.0, 10.0), 0.0);
        assert_eq!(clamp(15.0, 0.0, 10.0), 10.0);
    }

    #[test]
    fn test_lerp() {
        assert_eq!(lerp(0.0, 10.0, 0.5), 5.0);
        assert_eq!(lerp(0.0, 10.0, 0.0), 0.0);
        assert_eq!(lerp(0.0, 10.0, 1.0), 10.0);
    }
}
