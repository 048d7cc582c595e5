use nalgebra::Vector3;
use ndarray::ArrayView3;

/// Keys cubic convolution parameter (Catmull-Rom).
const CUBIC_A: f64 = -0.5;

pub(crate) struct Interpolator;

impl Interpolator {
    #[inline]
    fn voxel_at(frame: &ArrayView3<f32>, i: i64, j: i64, k: i64) -> Option<f32> {
        if i < 0 || j < 0 || k < 0 {
            return None;
        }
        frame.get((i as usize, j as usize, k as usize)).copied()
    }

    /// True while the continuous index is no more than one voxel outside the
    /// frame on every axis.
    pub(crate) fn within_margin(frame: &ArrayView3<f32>, voxel: &Vector3<f64>) -> bool {
        let (ni, nj, nk) = frame.dim();
        [(voxel.x, ni), (voxel.y, nj), (voxel.z, nk)]
            .iter()
            .all(|&(v, n)| v >= -1.0 && v <= n as f64)
    }

    #[inline]
    pub(crate) fn enclosing_voxel(frame: &ArrayView3<f32>, voxel: &Vector3<f64>) -> Option<f32> {
        Self::voxel_at(
            frame,
            voxel.x.round() as i64,
            voxel.y.round() as i64,
            voxel.z.round() as i64,
        )
    }

    /// Blends the 8 surrounding voxels; voxels outside the frame count as 0.
    #[inline]
    pub(crate) fn trilinear_interpolate(frame: &ArrayView3<f32>, voxel: &Vector3<f64>) -> f32 {
        let (i0, j0, k0) = (voxel.x.floor(), voxel.y.floor(), voxel.z.floor());
        let dx = (voxel.x - i0) as f32;
        let dy = (voxel.y - j0) as f32;
        let dz = (voxel.z - k0) as f32;
        let (i0, j0, k0) = (i0 as i64, j0 as i64, k0 as i64);
        let one_minus_dx = 1.0 - dx;
        let one_minus_dy = 1.0 - dy;
        let one_minus_dz = 1.0 - dz;

        let v = |di: i64, dj: i64, dk: i64| {
            Self::voxel_at(frame, i0 + di, j0 + dj, k0 + dk).unwrap_or(0.0)
        };

        let v00 = v(0, 0, 0).mul_add(one_minus_dx, v(1, 0, 0) * dx);
        let v10 = v(0, 1, 0).mul_add(one_minus_dx, v(1, 1, 0) * dx);
        let v01 = v(0, 0, 1).mul_add(one_minus_dx, v(1, 0, 1) * dx);
        let v11 = v(0, 1, 1).mul_add(one_minus_dx, v(1, 1, 1) * dx);

        let v0 = v00.mul_add(one_minus_dy, v10 * dy);
        let v1 = v01.mul_add(one_minus_dy, v11 * dy);

        v0.mul_add(one_minus_dz, v1 * dz)
    }

    #[inline]
    fn cubic_kernel(t: f64) -> f64 {
        let t = t.abs();
        if t <= 1.0 {
            ((CUBIC_A + 2.0) * t - (CUBIC_A + 3.0)) * t * t + 1.0
        } else if t < 2.0 {
            ((CUBIC_A * t - 5.0 * CUBIC_A) * t + 8.0 * CUBIC_A) * t - 4.0 * CUBIC_A
        } else {
            0.0
        }
    }

    /// Weights for offsets -1, 0, 1, 2 from the floor of `v`.
    #[inline]
    fn cubic_weights(v: f64) -> (i64, [f64; 4]) {
        let base = v.floor();
        let t = v - base;
        (
            base as i64,
            [
                Self::cubic_kernel(1.0 + t),
                Self::cubic_kernel(t),
                Self::cubic_kernel(1.0 - t),
                Self::cubic_kernel(2.0 - t),
            ],
        )
    }

    /// 4x4x4 cubic convolution; neighbors outside the frame replicate the edge.
    pub(crate) fn cubic_interpolate(frame: &ArrayView3<f32>, voxel: &Vector3<f64>) -> f32 {
        let (ni, nj, nk) = frame.dim();
        let clamp = |index: i64, n: usize| index.clamp(0, n as i64 - 1) as usize;
        let (bi, wi) = Self::cubic_weights(voxel.x);
        let (bj, wj) = Self::cubic_weights(voxel.y);
        let (bk, wk) = Self::cubic_weights(voxel.z);

        let mut sum = 0.0_f64;
        for (c, &weight_k) in wk.iter().enumerate() {
            let k = clamp(bk + c as i64 - 1, nk);
            for (b, &weight_j) in wj.iter().enumerate() {
                let j = clamp(bj + b as i64 - 1, nj);
                let mut row = 0.0_f64;
                for (a, &weight_i) in wi.iter().enumerate() {
                    let i = clamp(bi + a as i64 - 1, ni);
                    row = weight_i.mul_add(f64::from(frame[[i, j, k]]), row);
                }
                sum = (weight_k * weight_j).mul_add(row, sum);
            }
        }
        sum as f32
    }
}
