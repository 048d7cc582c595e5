//! Growing a volume by a border of voxels, and cropping it back.
//!
//! Padding keeps every original voxel at its world position: the padded affine
//! is the original one shifted by minus the padding along each basis vector.

use ndarray::parallel::prelude::*;
use ndarray::{Axis, s};
use tracing::{debug, info};

use crate::affine::AffineSpace;
use crate::enums::VolumeKind;
use crate::error::VolumeError;
use crate::volume::VoxelGrid;

/// Geometry of a padding operation, reusable for any volume in the same space.
#[derive(Debug, Clone, PartialEq)]
pub struct PaddingPlan {
    original_dims: [usize; 3],
    padding: [usize; 3],
    original_affine: AffineSpace,
    padded_affine: AffineSpace,
}

pub struct VolumePadder;

impl VolumePadder {
    /// Plans a border of `pad_i`, `pad_j` and `pad_k` voxels on both sides of
    /// each axis.
    pub fn pad_by_voxels(grid: &VoxelGrid, pad_i: usize, pad_j: usize, pad_k: usize) -> PaddingPlan {
        let original_affine = *grid.affine();
        let padding = [pad_i, pad_j, pad_k];
        let plan = PaddingPlan {
            original_dims: grid.spatial_dims(),
            padding,
            original_affine,
            padded_affine: original_affine.translated_by(padding.map(|p| -(p as f64))),
        };
        debug!(
            original = ?plan.original_dims,
            padded = ?plan.padded_dims(),
            "Planned volume padding"
        );
        plan
    }

    /// Plans the smallest padding that keeps a sphere of radius `margin_mm`
    /// around any original voxel inside the padded volume, oblique grids
    /// included.
    pub fn pad_by_world_margin(grid: &VoxelGrid, margin_mm: f64) -> Result<PaddingPlan, VolumeError> {
        if !margin_mm.is_finite() || margin_mm < 0.0 {
            return Err(VolumeError::InvalidPadding(margin_mm));
        }
        let thickness = grid.affine().layer_thickness()?;
        let [pad_i, pad_j, pad_k] = thickness.map(|layer| (margin_mm / layer).ceil() as usize);
        Ok(Self::pad_by_voxels(grid, pad_i, pad_j, pad_k))
    }
}

impl PaddingPlan {
    pub fn original_dims(&self) -> [usize; 3] {
        self.original_dims
    }

    pub fn padding(&self) -> [usize; 3] {
        self.padding
    }

    pub fn padded_dims(&self) -> [usize; 3] {
        let mut dims = self.original_dims;
        for (dim, pad) in dims.iter_mut().zip(self.padding) {
            *dim += 2 * pad;
        }
        dims
    }

    pub fn original_affine(&self) -> &AffineSpace {
        &self.original_affine
    }

    pub fn padded_affine(&self) -> &AffineSpace {
        &self.padded_affine
    }

    /// Copies `grid` into the middle of a padded volume.
    ///
    /// The border holds `fill_value`, except in label volumes where it holds
    /// each subvolume's unassigned key.
    pub fn apply(&self, grid: &VoxelGrid, fill_value: f32) -> Result<VoxelGrid, VolumeError> {
        if grid.spatial_dims() != self.original_dims || *grid.affine() != self.original_affine {
            return Err(VolumeError::SpaceMismatch);
        }
        let fills = grid
            .subvolumes()
            .iter()
            .enumerate()
            .map(|(subvolume, attributes)| match grid.kind() {
                VolumeKind::Continuous => Ok(fill_value),
                VolumeKind::Label => attributes
                    .label_table
                    .as_ref()
                    .map(|table| table.unassigned_key() as f32)
                    .ok_or_else(|| VolumeError::MissingDictionary {
                        subvolume,
                        name: attributes.name.clone(),
                    }),
            })
            .collect::<Result<Vec<f32>, _>>()?;

        let [pi, pj, pk] = self.padding;
        let [ni, nj, nk] = self.original_dims;
        let [di, dj, dk] = self.padded_dims();
        let mut padded = VoxelGrid::filled(
            [di, dj, dk, grid.subvolume_count(), grid.component_count()],
            fill_value,
            self.padded_affine,
            grid.kind(),
            grid.subvolumes().to_vec(),
        )?;
        padded
            .data_mut()
            .axis_iter_mut(Axis(3))
            .into_par_iter()
            .zip(grid.data().axis_iter(Axis(3)).into_par_iter())
            .zip(fills.par_iter())
            .for_each(|((mut frame, source), &fill)| {
                frame.fill(fill);
                frame
                    .slice_mut(s![pi..pi + ni, pj..pj + nj, pk..pk + nk, ..])
                    .assign(&source);
            });

        info!(padded = ?[di, dj, dk], "Padded volume");
        Ok(padded)
    }

    /// Crops a volume produced by [`PaddingPlan::apply`] back to the original
    /// geometry.
    pub fn invert(&self, padded: &VoxelGrid) -> Result<VoxelGrid, VolumeError> {
        if padded.spatial_dims() != self.padded_dims() || *padded.affine() != self.padded_affine {
            return Err(VolumeError::SpaceMismatch);
        }
        let [pi, pj, pk] = self.padding;
        let [ni, nj, nk] = self.original_dims;
        let data = padded
            .data()
            .slice(s![pi..pi + ni, pj..pj + nj, pk..pk + nk, .., ..])
            .to_owned();
        VoxelGrid::new(
            data,
            self.original_affine,
            padded.kind(),
            padded.subvolumes().to_vec(),
        )
    }
}
