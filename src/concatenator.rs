use ndarray::parallel::prelude::*;
use ndarray::{ArrayView4, Axis};
use tracing::{debug, info};

use crate::enums::SubvolumeSelection;
use crate::error::VolumeError;
use crate::volume::{SubvolumeAttributes, VoxelGrid};

/// One volume to concatenate and which of its subvolumes to take.
#[derive(Debug, Clone, Copy)]
pub struct ConcatenationInput<'a> {
    pub grid: &'a VoxelGrid,
    pub selection: SubvolumeSelection,
}

impl<'a> ConcatenationInput<'a> {
    pub fn all(grid: &'a VoxelGrid) -> Self {
        Self {
            grid,
            selection: SubvolumeSelection::All,
        }
    }

    pub fn subvolume(grid: &'a VoxelGrid, index: usize) -> Self {
        Self {
            grid,
            selection: SubvolumeSelection::Index(index),
        }
    }
}

pub struct VolumeConcatenator;

impl VolumeConcatenator {
    /// Stacks the selected subvolumes of every input, in input order, into a
    /// new volume. No resampling happens; all inputs must already share the
    /// space of the first one.
    ///
    /// # Errors
    ///
    /// Returns error if there are no inputs, an input's space or kind differs
    /// from the first input, or an explicit subvolume index is out of range.
    pub fn concatenate(inputs: &[ConcatenationInput<'_>]) -> Result<VoxelGrid, VolumeError> {
        let first = inputs.first().ok_or(VolumeError::NoInputs)?.grid;

        let mut sources: Vec<ArrayView4<'_, f32>> = Vec::new();
        let mut attributes: Vec<SubvolumeAttributes> = Vec::new();
        for (input, ConcatenationInput { grid, selection }) in inputs.iter().enumerate() {
            Self::validate(first, grid, input)?;
            let count = grid.subvolume_count();
            let selected = match *selection {
                SubvolumeSelection::All => 0..count,
                SubvolumeSelection::Index(index) if index < count => index..index + 1,
                SubvolumeSelection::Index(index) => {
                    return Err(VolumeError::IndexOutOfRange {
                        input,
                        index,
                        count,
                    });
                }
            };
            for subvolume in selected {
                sources.push(grid.data().index_axis(Axis(3), subvolume));
                attributes.push(grid.subvolumes()[subvolume].clone());
            }
        }

        let [ni, nj, nk] = first.spatial_dims();
        let dims = [ni, nj, nk, sources.len(), first.component_count()];
        debug!(?dims, inputs = inputs.len(), "Concatenating volumes");

        let mut output =
            VoxelGrid::filled(dims, 0.0, *first.affine(), first.kind(), attributes)?;
        output
            .data_mut()
            .axis_iter_mut(Axis(3))
            .into_par_iter()
            .zip(sources.par_iter())
            .for_each(|(mut frame, source)| frame.assign(source));

        info!(subvolumes = dims[3], "Concatenated volumes");
        Ok(output)
    }

    fn validate(first: &VoxelGrid, grid: &VoxelGrid, input: usize) -> Result<(), VolumeError> {
        if !first.matches_space(grid) {
            return Err(VolumeError::IncompatibleVolumeSpace {
                input,
                name: grid
                    .subvolume(0)
                    .map(|subvolume| subvolume.name.clone())
                    .unwrap_or_default(),
            });
        }
        if grid.kind() != first.kind() {
            return Err(VolumeError::MixedVolumeKind { input });
        }
        Ok(())
    }
}
