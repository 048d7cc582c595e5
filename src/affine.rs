//! Voxel-to-world transforms.
//!
//! An [`AffineSpace`] is the "sform" of a volume: three basis vectors giving the
//! world-space step along each voxel axis, plus the world position of voxel
//! `(0, 0, 0)`. Oblique (non-orthogonal) bases are allowed.

use nalgebra::{Matrix3, Point3, Vector3};

use crate::error::VolumeError;

/// Ratio by which two non-zero sform elements may differ and still match.
const MATCH_TOLERANCE_RATIO: f64 = 0.999;

#[derive(Debug, Clone, Copy)]
pub struct AffineSpace {
    /// Columns are the i, j and k basis vectors.
    basis: Matrix3<f64>,
    origin: Vector3<f64>,
}

/// Precomputed world-to-voxel mapping of an invertible [`AffineSpace`].
#[derive(Debug, Clone, Copy)]
pub struct WorldToVoxel {
    inverse: Matrix3<f64>,
    origin: Vector3<f64>,
}

impl WorldToVoxel {
    /// Continuous (unrounded) voxel index of a world coordinate.
    #[inline]
    pub fn apply(&self, world: &Point3<f64>) -> Vector3<f64> {
        self.inverse * (world.coords - self.origin)
    }
}

impl AffineSpace {
    pub fn from_origin_and_basis(
        origin: [f64; 3],
        i: [f64; 3],
        j: [f64; 3],
        k: [f64; 3],
    ) -> Self {
        Self {
            basis: Matrix3::from_columns(&[Vector3::from(i), Vector3::from(j), Vector3::from(k)]),
            origin: Vector3::from(origin),
        }
    }

    /// Builds the space from the three top rows of a 4x4 homogeneous matrix.
    pub fn from_sform(sform: [[f64; 4]; 3]) -> Self {
        let column = |c: usize| [sform[0][c], sform[1][c], sform[2][c]];
        Self::from_origin_and_basis(column(3), column(0), column(1), column(2))
    }

    /// Axis-aligned space with the given voxel spacing.
    pub fn from_spacing(origin: [f64; 3], spacing: [f64; 3]) -> Self {
        Self::from_origin_and_basis(
            origin,
            [spacing[0], 0.0, 0.0],
            [0.0, spacing[1], 0.0],
            [0.0, 0.0, spacing[2]],
        )
    }

    pub fn to_sform(&self) -> [[f64; 4]; 3] {
        let mut sform = [[0.0; 4]; 3];
        for (r, row) in sform.iter_mut().enumerate() {
            for (c, value) in row.iter_mut().take(3).enumerate() {
                *value = self.basis[(r, c)];
            }
            row[3] = self.origin[r];
        }
        sform
    }

    pub fn origin(&self) -> Point3<f64> {
        Point3::from(self.origin)
    }

    /// Basis vector of voxel axis `axis` (0 = i, 1 = j, 2 = k).
    pub fn axis(&self, axis: usize) -> Vector3<f64> {
        self.basis.column(axis).into_owned()
    }

    pub fn determinant(&self) -> f64 {
        self.basis.determinant()
    }

    pub fn is_invertible(&self) -> bool {
        self.inverse().is_ok()
    }

    /// Solves `basis * voxel + origin = world` once for reuse.
    pub fn inverse(&self) -> Result<WorldToVoxel, VolumeError> {
        let scale = self.axis(0).norm() * self.axis(1).norm() * self.axis(2).norm();
        if !(self.determinant().abs() > scale * f64::EPSILON) {
            return Err(VolumeError::SingularTransform);
        }
        let inverse = self
            .basis
            .try_inverse()
            .ok_or(VolumeError::SingularTransform)?;
        Ok(WorldToVoxel {
            inverse,
            origin: self.origin,
        })
    }

    pub fn world_to_voxel(&self, world: &Point3<f64>) -> Result<Vector3<f64>, VolumeError> {
        Ok(self.inverse()?.apply(world))
    }

    pub fn voxel_to_world(&self, voxel: &Vector3<f64>) -> Point3<f64> {
        Point3::from(self.basis * voxel + self.origin)
    }

    /// Nearest integer voxel, rounding halves away from zero.
    pub fn enclosing_voxel(&self, world: &Point3<f64>) -> Result<[i64; 3], VolumeError> {
        let voxel = self.world_to_voxel(world)?;
        Ok([
            voxel.x.round() as i64,
            voxel.y.round() as i64,
            voxel.z.round() as i64,
        ])
    }

    /// Space whose voxel `delta` sits where this space's voxel `(0, 0, 0)` does
    /// not; i.e. the origin moves by `delta` voxels along the basis.
    pub fn translated_by(&self, delta: [f64; 3]) -> Self {
        Self {
            basis: self.basis,
            origin: self.origin + self.basis * Vector3::from(delta),
        }
    }

    /// World-space distance between adjacent voxel planes along each axis.
    pub fn layer_thickness(&self) -> Result<[f64; 3], VolumeError> {
        let det = self.determinant().abs();
        let mut thickness = [0.0; 3];
        for (axis, value) in thickness.iter_mut().enumerate() {
            let plane_normal = self.axis((axis + 1) % 3).cross(&self.axis((axis + 2) % 3));
            let area = plane_normal.norm();
            if area == 0.0 || det == 0.0 {
                return Err(VolumeError::SingularTransform);
            }
            *value = det / area;
        }
        Ok(thickness)
    }

    /// Loose equality used to decide whether two volumes share a space.
    pub fn matches(&self, other: &Self) -> bool {
        let left = self.to_sform();
        let right = other.to_sform();
        left.iter().flatten().zip(right.iter().flatten()).all(|(&a, &b)| {
            a == b
                || (a != 0.0
                    && b != 0.0
                    && a / b >= MATCH_TOLERANCE_RATIO
                    && b / a >= MATCH_TOLERANCE_RATIO)
        })
    }
}

impl PartialEq for AffineSpace {
    fn eq(&self, other: &Self) -> bool {
        self.basis == other.basis && self.origin == other.origin
    }
}

impl Default for AffineSpace {
    fn default() -> Self {
        Self::from_spacing([0.0; 3], [1.0; 3])
    }
}
