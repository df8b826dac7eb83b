//! 3x3 Matrix operations for color space transforms
//!
//! These matrices are used for RGB↔XYZ conversions, chromatic adaptation and
//! the ICtCp pipeline. All operations use f64 and return new values; a
//! `Matrix3x3` is never mutated by its own methods.

use std::ops::{Add, Index, IndexMut, Mul};

/// A 3x3 matrix for color space transformations
///
/// Stored in row-major order: m[row][col]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix3x3 {
    /// Matrix elements in row-major order
    pub m: [[f64; 3]; 3],
}

impl Matrix3x3 {
    /// Create a new matrix from row-major elements
    #[inline]
    pub const fn new(m: [[f64; 3]; 3]) -> Self {
        Self { m }
    }

    /// Create an identity matrix
    #[inline]
    pub const fn identity() -> Self {
        Self {
            m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    /// Create a zero matrix
    #[inline]
    pub const fn zero() -> Self {
        Self {
            m: [[0.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, 0.0]],
        }
    }

    /// Create a diagonal matrix from three values
    #[inline]
    pub const fn diagonal(d0: f64, d1: f64, d2: f64) -> Self {
        Self {
            m: [[d0, 0.0, 0.0], [0.0, d1, 0.0], [0.0, 0.0, d2]],
        }
    }

    /// Create a matrix whose columns are the given vectors
    #[inline]
    pub const fn from_columns(c0: [f64; 3], c1: [f64; 3], c2: [f64; 3]) -> Self {
        Self {
            m: [
                [c0[0], c1[0], c2[0]],
                [c0[1], c1[1], c2[1]],
                [c0[2], c1[2], c2[2]],
            ],
        }
    }

    /// Multiply this matrix by a 3-element vector
    ///
    /// Returns M × v
    #[inline]
    pub fn multiply_vec(&self, v: [f64; 3]) -> [f64; 3] {
        [
            self.m[0][0] * v[0] + self.m[0][1] * v[1] + self.m[0][2] * v[2],
            self.m[1][0] * v[0] + self.m[1][1] * v[1] + self.m[1][2] * v[2],
            self.m[2][0] * v[0] + self.m[2][1] * v[1] + self.m[2][2] * v[2],
        ]
    }

    /// Multiply this matrix by another matrix
    ///
    /// Returns self × other
    #[inline]
    pub fn multiply(&self, other: &Self) -> Self {
        let mut result = Self::zero();
        for i in 0..3 {
            for j in 0..3 {
                result.m[i][j] = self.m[i][0] * other.m[0][j]
                    + self.m[i][1] * other.m[1][j]
                    + self.m[i][2] * other.m[2][j];
            }
        }
        result
    }

    /// Elementwise sum of two matrices
    #[inline]
    pub fn add(&self, other: &Self) -> Self {
        let mut result = Self::zero();
        for i in 0..3 {
            for j in 0..3 {
                result.m[i][j] = self.m[i][j] + other.m[i][j];
            }
        }
        result
    }

    /// Transpose this matrix
    #[inline]
    pub fn transpose(&self) -> Self {
        Self {
            m: [
                [self.m[0][0], self.m[1][0], self.m[2][0]],
                [self.m[0][1], self.m[1][1], self.m[2][1]],
                [self.m[0][2], self.m[1][2], self.m[2][2]],
            ],
        }
    }

    /// Matrix of signed cofactors
    pub fn cofactors(&self) -> Self {
        let m = &self.m;
        Self {
            m: [
                [
                    m[1][1] * m[2][2] - m[1][2] * m[2][1],
                    -(m[1][0] * m[2][2] - m[1][2] * m[2][0]),
                    m[1][0] * m[2][1] - m[1][1] * m[2][0],
                ],
                [
                    -(m[0][1] * m[2][2] - m[0][2] * m[2][1]),
                    m[0][0] * m[2][2] - m[0][2] * m[2][0],
                    -(m[0][0] * m[2][1] - m[0][1] * m[2][0]),
                ],
                [
                    m[0][1] * m[1][2] - m[0][2] * m[1][1],
                    -(m[0][0] * m[1][2] - m[1][0] * m[0][2]),
                    m[0][0] * m[1][1] - m[0][1] * m[1][0],
                ],
            ],
        }
    }

    /// Adjugate matrix (transposed cofactors)
    #[inline]
    pub fn adjoint(&self) -> Self {
        self.cofactors().transpose()
    }

    /// Calculate the determinant
    #[inline]
    pub fn determinant(&self) -> f64 {
        let m = &self.m;
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    /// Calculate the inverse as `adjoint / determinant`
    ///
    /// No singularity check is made: a zero determinant yields infinite or
    /// NaN entries. Check [`determinant`](Self::determinant) or use
    /// [`inverse`](Self::inverse) when a meaningful result is required.
    pub fn invert(&self) -> Self {
        let det = self.determinant();
        let adj = self.adjoint();
        let mut result = Self::zero();
        for i in 0..3 {
            for j in 0..3 {
                result.m[i][j] = adj.m[i][j] / det;
            }
        }
        result
    }

    /// Calculate the inverse of this matrix
    ///
    /// Returns None if the matrix is singular (determinant ≈ 0)
    pub fn inverse(&self) -> Option<Self> {
        if self.determinant().abs() < 1e-14 {
            return None;
        }
        Some(self.invert())
    }

    /// Scale all elements by a scalar
    #[inline]
    pub fn scale(&self, s: f64) -> Self {
        Self {
            m: [
                [self.m[0][0] * s, self.m[0][1] * s, self.m[0][2] * s],
                [self.m[1][0] * s, self.m[1][1] * s, self.m[1][2] * s],
                [self.m[2][0] * s, self.m[2][1] * s, self.m[2][2] * s],
            ],
        }
    }

    /// True if every element is finite
    pub fn is_finite(&self) -> bool {
        self.m.iter().flatten().all(|v| v.is_finite())
    }

    /// Check if this matrix is approximately equal to another
    pub fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        for i in 0..3 {
            for j in 0..3 {
                if (self.m[i][j] - other.m[i][j]).abs() > epsilon {
                    return false;
                }
            }
        }
        true
    }

    /// Check if this is approximately an identity matrix
    pub fn is_identity(&self, epsilon: f64) -> bool {
        self.approx_eq(&Self::identity(), epsilon)
    }
}

impl Default for Matrix3x3 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Index<usize> for Matrix3x3 {
    type Output = [f64; 3];

    fn index(&self, row: usize) -> &Self::Output {
        &self.m[row]
    }
}

impl IndexMut<usize> for Matrix3x3 {
    fn index_mut(&mut self, row: usize) -> &mut Self::Output {
        &mut self.m[row]
    }
}

impl Add for Matrix3x3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Matrix3x3::add(&self, &rhs)
    }
}

impl Mul for Matrix3x3 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        self.multiply(&rhs)
    }
}

impl Mul<[f64; 3]> for Matrix3x3 {
    type Output = [f64; 3];

    fn mul(self, rhs: [f64; 3]) -> Self::Output {
        self.multiply_vec(rhs)
    }
}

impl Mul<&[f64; 3]> for Matrix3x3 {
    type Output = [f64; 3];

    fn mul(self, rhs: &[f64; 3]) -> Self::Output {
        self.multiply_vec(*rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-10;

    #[test]
    fn test_identity() {
        let id = Matrix3x3::identity();
        let v = [1.0, 2.0, 3.0];
        let result = id.multiply_vec(v);
        assert!((result[0] - v[0]).abs() < EPSILON);
        assert!((result[1] - v[1]).abs() < EPSILON);
        assert!((result[2] - v[2]).abs() < EPSILON);
    }

    #[test]
    fn test_multiply_matrices() {
        let a = Matrix3x3::new([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]);
        let id = Matrix3x3::identity();

        // A × I = A
        assert!(a.multiply(&id).approx_eq(&a, EPSILON));
        // I × A = A
        assert!(id.multiply(&a).approx_eq(&a, EPSILON));
    }

    #[test]
    fn test_multiply_not_commutative() {
        let a = Matrix3x3::new([[1.0, 2.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
        let b = Matrix3x3::new([[1.0, 0.0, 0.0], [3.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
        assert!(!a.multiply(&b).approx_eq(&b.multiply(&a), EPSILON));
    }

    #[test]
    fn test_add() {
        let a = Matrix3x3::new([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]);
        let sum = a + Matrix3x3::identity();
        let expected = Matrix3x3::new([[2.0, 2.0, 3.0], [4.0, 6.0, 6.0], [7.0, 8.0, 10.0]]);
        assert!(sum.approx_eq(&expected, EPSILON));
        // Operands are untouched
        assert_eq!(a.m[0][0], 1.0);
    }

    #[test]
    fn test_transpose() {
        let a = Matrix3x3::new([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]);
        let at = a.transpose();
        let expected = Matrix3x3::new([[1.0, 4.0, 7.0], [2.0, 5.0, 8.0], [3.0, 6.0, 9.0]]);
        assert!(at.approx_eq(&expected, EPSILON));

        // Transpose twice = original
        assert!(at.transpose().approx_eq(&a, EPSILON));
    }

    #[test]
    fn test_from_columns() {
        let m = Matrix3x3::from_columns([1.0, 4.0, 7.0], [2.0, 5.0, 8.0], [3.0, 6.0, 9.0]);
        let expected = Matrix3x3::new([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]);
        assert!(m.approx_eq(&expected, EPSILON));
    }

    #[test]
    fn test_determinant() {
        let id = Matrix3x3::identity();
        assert!((id.determinant() - 1.0).abs() < EPSILON);

        let a = Matrix3x3::new([[1.0, 2.0, 3.0], [0.0, 1.0, 4.0], [5.0, 6.0, 0.0]]);
        assert!((a.determinant() - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_cofactors_and_adjoint() {
        let a = Matrix3x3::new([[1.0, 2.0, 3.0], [0.0, 1.0, 4.0], [5.0, 6.0, 0.0]]);
        let expected_cof =
            Matrix3x3::new([[-24.0, 20.0, -5.0], [18.0, -15.0, 4.0], [5.0, -4.0, 1.0]]);
        assert!(a.cofactors().approx_eq(&expected_cof, EPSILON));
        assert!(a.adjoint().approx_eq(&expected_cof.transpose(), EPSILON));

        // A × adj(A) = det(A) × I
        let product = a.multiply(&a.adjoint());
        assert!(product.approx_eq(&Matrix3x3::identity().scale(a.determinant()), EPSILON));
    }

    #[test]
    fn test_invert() {
        let id = Matrix3x3::identity();
        assert!(id.invert().approx_eq(&id, EPSILON));

        // A × A⁻¹ = I
        let a = Matrix3x3::new([[1.0, 2.0, 3.0], [0.0, 1.0, 4.0], [5.0, 6.0, 0.0]]);
        let product = a.multiply(&a.invert());
        assert!(product.approx_eq(&id, 1e-9));

        let inv = a.inverse().unwrap();
        assert!(inv.approx_eq(&a.invert(), EPSILON));
    }

    #[test]
    fn test_singular_matrix() {
        // Singular matrix (row 3 = row 1 + row 2)
        let singular = Matrix3x3::new([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [5.0, 7.0, 9.0]]);
        assert!(singular.inverse().is_none());

        let zero = Matrix3x3::zero();
        let inv = zero.invert();
        assert!(!inv.is_finite(), "Singular inverse must not be silently finite");
    }

    #[test]
    fn test_operator_overloads() {
        let a = Matrix3x3::identity();
        let b = Matrix3x3::identity();
        let c = a * b;
        assert!(c.is_identity(EPSILON));

        let v = [1.0, 2.0, 3.0];
        let result = a * v;
        assert!((result[0] - 1.0).abs() < EPSILON);
        assert!((result[1] - 2.0).abs() < EPSILON);
        assert!((result[2] - 3.0).abs() < EPSILON);

        let result = a * &v;
        assert!((result[2] - 3.0).abs() < EPSILON);
        assert_eq!(a[1][1], 1.0);
    }
}
