//! Colors a surface with a label volume.
//!
//! Each surface vertex takes the label key of the voxel enclosing it. When all
//! subvolumes are mapped, their label tables are merged into one table first
//! and every subvolume's keys are rewritten through the remap its merge
//! produced, so each column refers to the shared table.

use nalgebra::Vector3;
use rayon::prelude::*;
use tracing::{debug, info, warn};
use web_time::Instant;

use crate::enums::{SubvolumeSelection, UnknownKeyPolicy, VolumeKind};
use crate::error::VolumeError;
use crate::interpolator::Interpolator;
use crate::label_dictionary::{KeyRemap, LabelDictionary};
use crate::surface::SurfaceCoordinates;
use crate::volume::{SubvolumeAttributes, VoxelGrid};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LabelMappingOptions {
    pub subvolume: SubvolumeSelection,
    pub unknown_keys: UnknownKeyPolicy,
}

/// One per-vertex key array of the output.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelColumn {
    pub name: String,
    pub keys: Vec<i32>,
}

/// Per-vertex label columns sharing one label table.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceLabels {
    pub columns: Vec<LabelColumn>,
    pub dictionary: LabelDictionary,
    /// Every key reassignment made while merging, later merges winning.
    pub key_remap: KeyRemap,
}

impl SurfaceLabels {
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, index: usize) -> Option<&LabelColumn> {
        self.columns.get(index)
    }
}

/// Subvolumes to sample, the output table, and the remap for each subvolume.
struct MappingPlan {
    subvolumes: Vec<usize>,
    dictionary: LabelDictionary,
    remaps: Vec<KeyRemap>,
}

pub struct LabelMapper;

impl LabelMapper {
    /// Maps a label volume onto the vertices of a surface.
    ///
    /// # Errors
    ///
    /// Fails before any sampling starts if the volume is not a label volume,
    /// the selected subvolume does not exist, a mapped subvolume has no label
    /// table, or the volume's transform cannot be inverted.
    pub fn map_volume_to_surface<S>(
        grid: &VoxelGrid,
        surface: &S,
        options: &LabelMappingOptions,
    ) -> Result<SurfaceLabels, VolumeError>
    where
        S: SurfaceCoordinates + ?Sized,
    {
        let start = Instant::now();
        if grid.kind() != VolumeKind::Label {
            return Err(VolumeError::WrongVolumeKind);
        }
        let locator = grid.affine().inverse()?;
        let plan = Self::plan(grid, options.subvolume)?;
        let key_remap: KeyRemap = plan.remaps.iter().flat_map(|remap| remap.iter()).collect();

        let node_count = surface.node_count();
        let component_count = grid.component_count();
        info!(
            nodes = node_count,
            subvolumes = plan.subvolumes.len(),
            components = component_count,
            "Mapping label volume to surface"
        );

        let voxels: Vec<Vector3<f64>> = (0..node_count)
            .into_par_iter()
            .map(|node| locator.apply(&surface.coordinate(node)))
            .collect();

        let mut columns = Vec::with_capacity(plan.subvolumes.len() * component_count);
        for (&subvolume, remap) in plan.subvolumes.iter().zip(&plan.remaps) {
            let attributes = Self::attributes(grid, subvolume)?;
            let background = Self::label_table(grid, subvolume)?.unassigned_key() as f32;
            for component in 0..component_count {
                let frame = grid.frame(subvolume, component)?;
                let mut keys: Vec<i32> = voxels
                    .par_iter()
                    .map(|voxel| {
                        let value =
                            Interpolator::enclosing_voxel(&frame, voxel).unwrap_or(background);
                        remap.apply((value + 0.5).floor() as i32)
                    })
                    .collect();
                Self::resolve_unknown_keys(&mut keys, &plan.dictionary, options.unknown_keys);

                let name = if component_count > 1 {
                    format!("{} component {}", attributes.name, component + 1)
                } else {
                    attributes.name.clone()
                };
                columns.push(LabelColumn { name, keys });
            }
        }

        info!(
            columns = columns.len(),
            labels = plan.dictionary.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Label mapping complete"
        );

        Ok(SurfaceLabels {
            columns,
            dictionary: plan.dictionary,
            key_remap,
        })
    }

    fn plan(grid: &VoxelGrid, selection: SubvolumeSelection) -> Result<MappingPlan, VolumeError> {
        let count = grid.subvolume_count();
        match selection {
            SubvolumeSelection::Index(subvolume) => {
                if subvolume >= count {
                    return Err(VolumeError::InvalidSubvolumeIndex {
                        index: subvolume as i64,
                        count,
                    });
                }
                Ok(MappingPlan {
                    subvolumes: vec![subvolume],
                    dictionary: Self::label_table(grid, subvolume)?.clone(),
                    remaps: vec![KeyRemap::default()],
                })
            }
            SubvolumeSelection::All => {
                let mut dictionary = Self::label_table(grid, 0)?.clone();
                let mut remaps = vec![KeyRemap::default()];
                for subvolume in 1..count {
                    let remap = dictionary.merge(Self::label_table(grid, subvolume)?);
                    debug!(subvolume, remapped = remap.len(), "Merged label table");
                    remaps.push(remap);
                }
                Ok(MappingPlan {
                    subvolumes: (0..count).collect(),
                    dictionary,
                    remaps,
                })
            }
        }
    }

    fn attributes(grid: &VoxelGrid, subvolume: usize) -> Result<&SubvolumeAttributes, VolumeError> {
        grid.subvolume(subvolume)
            .ok_or(VolumeError::InvalidSubvolumeIndex {
                index: subvolume as i64,
                count: grid.subvolume_count(),
            })
    }

    fn label_table(grid: &VoxelGrid, subvolume: usize) -> Result<&LabelDictionary, VolumeError> {
        let attributes = Self::attributes(grid, subvolume)?;
        attributes
            .label_table
            .as_ref()
            .ok_or_else(|| VolumeError::MissingDictionary {
                subvolume,
                name: attributes.name.clone(),
            })
    }

    fn resolve_unknown_keys(keys: &mut [i32], dictionary: &LabelDictionary, policy: UnknownKeyPolicy) {
        match policy {
            UnknownKeyPolicy::Keep => {
                let unknown = keys
                    .par_iter()
                    .filter(|&&key| !dictionary.contains_key(key))
                    .count();
                if unknown > 0 {
                    warn!(vertices = unknown, "Label values missing from the label table");
                }
            }
            UnknownKeyPolicy::Unassigned => {
                let unassigned = dictionary.unassigned_key();
                let replaced: usize = keys
                    .par_iter_mut()
                    .map(|key| {
                        if dictionary.contains_key(*key) {
                            0
                        } else {
                            *key = unassigned;
                            1
                        }
                    })
                    .sum();
                if replaced > 0 {
                    debug!(vertices = replaced, "Replaced unknown label values");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affine::AffineSpace;
    use crate::label_dictionary::Label;
    use nalgebra::Point3;

    fn table(entries: &[(i32, &str)]) -> LabelDictionary {
        let mut table = LabelDictionary::new();
        for &(key, name) in entries {
            table.insert(key, Label::new(name, [0.5, 0.5, 0.5, 1.0]));
        }
        table
    }

    fn two_frame_grid(first: LabelDictionary, second: Option<LabelDictionary>) -> VoxelGrid {
        let mut values = vec![1.0; 8];
        values.extend(vec![1.0; 8]);
        values[8] = 0.0;
        VoxelGrid::from_vec(
            [2, 2, 2, 2, 1],
            values,
            AffineSpace::default(),
            VolumeKind::Label,
            vec![
                SubvolumeAttributes::labeled("first", first),
                SubvolumeAttributes {
                    name: "second".to_string(),
                    label_table: second,
                    color_mapping: None,
                },
            ],
        )
        .unwrap()
    }

    fn vertices() -> Vec<Point3<f64>> {
        vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0), Point3::new(9.0, 0.0, 0.0)]
    }

    #[test]
    fn rejects_continuous_volumes() {
        let grid = VoxelGrid::from_vec(
            [1, 1, 1, 1, 1],
            vec![0.0],
            AffineSpace::default(),
            VolumeKind::Continuous,
            vec![SubvolumeAttributes::continuous("t1", None)],
        )
        .unwrap();
        let result =
            LabelMapper::map_volume_to_surface(&grid, vertices().as_slice(), &Default::default());
        assert_eq!(result, Err(VolumeError::WrongVolumeKind));
    }

    #[test]
    fn each_subvolume_uses_its_own_remap() {
        let grid = two_frame_grid(table(&[(1, "X")]), Some(table(&[(1, "Y")])));
        let labels =
            LabelMapper::map_volume_to_surface(&grid, vertices().as_slice(), &Default::default())
                .unwrap();

        let y_key = labels.key_remap.get(1).unwrap();
        assert_eq!(labels.column_count(), 2);
        assert_eq!(labels.columns[0].keys, vec![1, 1, 0]);
        assert_eq!(labels.columns[1].keys, vec![0, y_key, 0]);
        assert_eq!(labels.dictionary.label(1).unwrap().name, "X");
        assert_eq!(labels.dictionary.label(y_key).unwrap().name, "Y");
    }

    #[test]
    fn missing_table_is_fatal() {
        let grid = two_frame_grid(table(&[(1, "X")]), None);
        let result =
            LabelMapper::map_volume_to_surface(&grid, vertices().as_slice(), &Default::default());
        assert_eq!(
            result,
            Err(VolumeError::MissingDictionary {
                subvolume: 1,
                name: "second".to_string()
            })
        );
    }

    #[test]
    fn single_subvolume_copies_its_table() {
        let second = table(&[(1, "Y")]);
        let grid = two_frame_grid(table(&[(1, "X")]), Some(second.clone()));
        let options = LabelMappingOptions {
            subvolume: SubvolumeSelection::Index(1),
            ..Default::default()
        };
        let labels =
            LabelMapper::map_volume_to_surface(&grid, vertices().as_slice(), &options).unwrap();
        assert_eq!(labels.column_count(), 1);
        assert_eq!(labels.columns[0].name, "second");
        assert_eq!(labels.columns[0].keys, vec![0, 1, 0]);
        assert_eq!(labels.dictionary, second);
        assert!(labels.key_remap.is_empty());
    }

    #[test]
    fn selecting_past_the_end_fails() {
        let grid = two_frame_grid(table(&[(1, "X")]), Some(table(&[(1, "X")])));
        let options = LabelMappingOptions {
            subvolume: SubvolumeSelection::Index(2),
            ..Default::default()
        };
        let result = LabelMapper::map_volume_to_surface(&grid, vertices().as_slice(), &options);
        assert_eq!(
            result,
            Err(VolumeError::InvalidSubvolumeIndex { index: 2, count: 2 })
        );
    }

    #[test]
    fn unknown_keys_can_become_unassigned() {
        let grid = two_frame_grid(table(&[(3, "Z")]), Some(table(&[(3, "Z")])));
        let options = LabelMappingOptions {
            subvolume: SubvolumeSelection::Index(0),
            unknown_keys: UnknownKeyPolicy::Unassigned,
        };
        let labels =
            LabelMapper::map_volume_to_surface(&grid, vertices().as_slice(), &options).unwrap();
        assert_eq!(labels.columns[0].keys, vec![0, 0, 0]);

        let kept = LabelMapper::map_volume_to_surface(
            &grid,
            vertices().as_slice(),
            &LabelMappingOptions {
                subvolume: SubvolumeSelection::Index(0),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(kept.columns[0].keys, vec![1, 1, 0]);
    }

    #[test]
    fn multi_component_columns_are_suffixed() {
        let grid = VoxelGrid::from_vec(
            [1, 1, 1, 1, 2],
            vec![2.0, 3.0],
            AffineSpace::default(),
            VolumeKind::Label,
            vec![SubvolumeAttributes::labeled("rgb", table(&[(2, "A"), (3, "B")]))],
        )
        .unwrap();
        let labels = LabelMapper::map_volume_to_surface(
            &grid,
            [Point3::<f64>::origin()].as_slice(),
            &Default::default(),
        )
        .unwrap();
        let names: Vec<_> = labels.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["rgb component 1", "rgb component 2"]);
        assert_eq!(labels.columns[1].keys, vec![3]);
    }
}
