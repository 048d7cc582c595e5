//! # volume-label-map
//!
//! Label-volume to surface mapping and volume geometry utilities for
//! neuroimaging volumes that are already loaded into memory.
//!
//! A [`VoxelGrid`] is a 5-D array `(i, j, k, subvolume, component)` with a
//! voxel-to-world [`AffineSpace`] and per-subvolume metadata: a label table
//! for label volumes, or a color mapping for continuous ones. On top of it the
//! crate provides:
//!  - Sampling at world coordinates (enclosing voxel, trilinear, cubic)
//!  - [`LabelMapper`]: colors surface vertices with a label volume, merging
//!    the label tables of all subvolumes into one
//!  - [`VolumeConcatenator`]: stacks subvolumes of volumes sharing a space
//!  - [`VolumePadder`]: pads a volume while keeping its world positions, and
//!    crops it back
//!
//! Per-vertex sampling and per-subvolume copies run in parallel using rayon.
//! All validation and label table merging finish before any parallel work
//! starts, so a failed call never leaves partial output.
//!
//! Oblique (sheared) voxel grids are supported throughout.
//!
//! # Examples
//!
//! ## Mapping a label volume onto a surface
//!
//! ```
//! # use volume_label_map::{AffineSpace, Label, LabelDictionary, LabelMapper, SubvolumeAttributes, VolumeKind, VoxelGrid};
//! # use nalgebra::Point3;
//! let mut table = LabelDictionary::new();
//! table.insert(5, Label::new("V1", [1.0, 0.0, 0.0, 1.0]));
//! let grid = VoxelGrid::from_vec(
//!     [2, 2, 2, 1, 1],
//!     vec![5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
//!     AffineSpace::from_spacing([0.0; 3], [2.0; 3]),
//!     VolumeKind::Label,
//!     vec![SubvolumeAttributes::labeled("parcels", table)],
//! )
//! .expect("should have built the volume");
//!
//! let vertices = [Point3::new(0.1, 0.2, -0.3), Point3::new(3.9, 0.0, 0.0)];
//! let labels = LabelMapper::map_volume_to_surface(&grid, vertices.as_slice(), &Default::default())
//!     .expect("should have mapped labels");
//! assert_eq!(labels.columns[0].keys, vec![5, 0]);
//! ```
//!
//! ## Padding and cropping
//!
//! ```
//! # use volume_label_map::{AffineSpace, SubvolumeAttributes, VolumeKind, VolumePadder, VoxelGrid};
//! let grid = VoxelGrid::from_vec(
//!     [2, 2, 2, 1, 1],
//!     vec![1.0; 8],
//!     AffineSpace::default(),
//!     VolumeKind::Continuous,
//!     vec![SubvolumeAttributes::continuous("t1", None)],
//! )
//! .expect("should have built the volume");
//! let plan = VolumePadder::pad_by_world_margin(&grid, 2.0).expect("should have planned padding");
//! let padded = plan.apply(&grid, 0.0).expect("should have padded");
//! assert_eq!(padded.spatial_dims(), [6, 6, 6]);
//! assert_eq!(plan.invert(&padded).expect("should have cropped"), grid);
//! ```

pub mod affine;
pub mod concatenator;
pub mod enums;
pub mod error;
mod interpolator;
pub mod label_dictionary;
pub mod label_mapper;
pub mod padding;
pub mod surface;
pub mod volume;

pub use affine::{AffineSpace, WorldToVoxel};
pub use concatenator::{ConcatenationInput, VolumeConcatenator};
pub use enums::{InterpolationMode, SubvolumeSelection, UnknownKeyPolicy, VolumeKind};
pub use error::VolumeError;
pub use label_dictionary::{KeyRemap, Label, LabelDictionary, UNASSIGNED_LABEL_NAME};
pub use label_mapper::{LabelColumn, LabelMapper, LabelMappingOptions, SurfaceLabels};
pub use padding::{PaddingPlan, VolumePadder};
pub use surface::{SurfaceCoordinates, SurfaceMesh};
pub use volume::{ColorMapping, SubvolumeAttributes, VoxelGrid};
