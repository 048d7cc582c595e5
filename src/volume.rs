use crate::affine::AffineSpace;
use crate::enums::InterpolationMode;
use crate::enums::VolumeKind;
use crate::error::VolumeError;
use crate::interpolator::Interpolator;
use crate::label_dictionary::LabelDictionary;

use nalgebra::Point3;
use nalgebra::Vector3;
use ndarray::Array5;
use ndarray::ArrayView3;
use ndarray::ShapeBuilder;
use ndarray::s;

/// Palette settings of a continuous subvolume. Carried through untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMapping {
    pub palette_name: String,
    pub display_range: Option<(f32, f32)>,
}

/// Per-subvolume metadata: a name plus a label table (label volumes) or a
/// color mapping (continuous volumes).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubvolumeAttributes {
    pub name: String,
    pub label_table: Option<LabelDictionary>,
    pub color_mapping: Option<ColorMapping>,
}

impl SubvolumeAttributes {
    pub fn labeled(name: impl Into<String>, label_table: LabelDictionary) -> Self {
        Self {
            name: name.into(),
            label_table: Some(label_table),
            color_mapping: None,
        }
    }

    pub fn continuous(name: impl Into<String>, color_mapping: Option<ColorMapping>) -> Self {
        Self {
            name: name.into(),
            label_table: None,
            color_mapping,
        }
    }
}

/// In-memory volume indexed `(i, j, k, subvolume, component)`.
///
/// All subvolumes share the dimensions, the affine and the kind.
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelGrid {
    data: Array5<f32>,
    affine: AffineSpace,
    kind: VolumeKind,
    subvolumes: Vec<SubvolumeAttributes>,
}

impl VoxelGrid {
    pub fn new(
        data: Array5<f32>,
        affine: AffineSpace,
        kind: VolumeKind,
        subvolumes: Vec<SubvolumeAttributes>,
    ) -> Result<Self, VolumeError> {
        let shape = data.dim();
        let dims = [shape.0, shape.1, shape.2, shape.3, shape.4];
        if dims.contains(&0) {
            return Err(VolumeError::InvalidDimensions {
                dims,
                len: data.len(),
            });
        }
        if subvolumes.len() != dims[3] {
            return Err(VolumeError::SubvolumeCountMismatch {
                attributes: subvolumes.len(),
                count: dims[3],
            });
        }
        Ok(Self {
            data,
            affine,
            kind,
            subvolumes,
        })
    }

    /// Builds a grid from a flat buffer with `i` varying fastest, then `j`,
    /// `k`, subvolume and component.
    pub fn from_vec(
        dims: [usize; 5],
        values: Vec<f32>,
        affine: AffineSpace,
        kind: VolumeKind,
        subvolumes: Vec<SubvolumeAttributes>,
    ) -> Result<Self, VolumeError> {
        let len = values.len();
        let shape = (dims[0], dims[1], dims[2], dims[3], dims[4]).f();
        let data = Array5::from_shape_vec(shape, values)
            .map_err(|_| VolumeError::InvalidDimensions { dims, len })?;
        Self::new(data, affine, kind, subvolumes)
    }

    pub(crate) fn filled(
        dims: [usize; 5],
        value: f32,
        affine: AffineSpace,
        kind: VolumeKind,
        subvolumes: Vec<SubvolumeAttributes>,
    ) -> Result<Self, VolumeError> {
        let shape = (dims[0], dims[1], dims[2], dims[3], dims[4]).f();
        Self::new(Array5::from_elem(shape, value), affine, kind, subvolumes)
    }

    /// Get the dimensions `(i, j, k, subvolumes, components)`
    pub fn dims(&self) -> [usize; 5] {
        let (ni, nj, nk, ns, nc) = self.data.dim();
        [ni, nj, nk, ns, nc]
    }

    pub fn spatial_dims(&self) -> [usize; 3] {
        let (ni, nj, nk, _, _) = self.data.dim();
        [ni, nj, nk]
    }

    pub fn subvolume_count(&self) -> usize {
        self.data.dim().3
    }

    pub fn component_count(&self) -> usize {
        self.data.dim().4
    }

    pub fn kind(&self) -> VolumeKind {
        self.kind
    }

    pub fn affine(&self) -> &AffineSpace {
        &self.affine
    }

    /// Get a reference to the underlying data
    pub fn data(&self) -> &Array5<f32> {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut Array5<f32> {
        &mut self.data
    }

    pub fn subvolumes(&self) -> &[SubvolumeAttributes] {
        &self.subvolumes
    }

    pub fn subvolume(&self, index: usize) -> Option<&SubvolumeAttributes> {
        self.subvolumes.get(index)
    }

    /// Bounds-checked voxel read.
    pub fn value(&self, i: usize, j: usize, k: usize, subvolume: usize, component: usize) -> Option<f32> {
        self.data.get((i, j, k, subvolume, component)).copied()
    }

    /// The 3-D frame of one subvolume and component.
    pub fn frame(&self, subvolume: usize, component: usize) -> Result<ArrayView3<'_, f32>, VolumeError> {
        self.check_frame(subvolume, component)?;
        Ok(self.data.slice(s![.., .., .., subvolume, component]))
    }

    fn check_frame(&self, subvolume: usize, component: usize) -> Result<(), VolumeError> {
        let (_, _, _, ns, nc) = self.data.dim();
        if subvolume >= ns {
            return Err(VolumeError::InvalidSubvolumeIndex {
                index: subvolume as i64,
                count: ns,
            });
        }
        if component >= nc {
            return Err(VolumeError::InvalidComponentIndex {
                index: component,
                count: nc,
            });
        }
        Ok(())
    }

    /// Samples at a world coordinate; enclosing-voxel misses read as 0.
    pub fn sample(
        &self,
        world: &Point3<f64>,
        mode: InterpolationMode,
        subvolume: usize,
        component: usize,
    ) -> Result<f32, VolumeError> {
        self.sample_with_background(world, mode, subvolume, component, 0.0)
    }

    /// Samples at a world coordinate.
    ///
    /// Enclosing-voxel samples outside the grid return `background`. Trilinear
    /// and cubic samples fail with [`VolumeError::OutOfGrid`] once the point is
    /// more than one voxel outside the grid.
    pub fn sample_with_background(
        &self,
        world: &Point3<f64>,
        mode: InterpolationMode,
        subvolume: usize,
        component: usize,
        background: f32,
    ) -> Result<f32, VolumeError> {
        let frame = self.frame(subvolume, component)?;
        let voxel = self.affine.world_to_voxel(world)?;
        Self::sample_frame(&frame, &voxel, mode, background)
    }

    pub(crate) fn sample_frame(
        frame: &ArrayView3<f32>,
        voxel: &Vector3<f64>,
        mode: InterpolationMode,
        background: f32,
    ) -> Result<f32, VolumeError> {
        let (ni, nj, nk) = frame.dim();
        // No neighbors exist across a single slice.
        let mode = if ni == 1 || nj == 1 || nk == 1 {
            InterpolationMode::EnclosingVoxel
        } else {
            mode
        };
        match mode {
            InterpolationMode::EnclosingVoxel => {
                Ok(Interpolator::enclosing_voxel(frame, voxel).unwrap_or(background))
            }
            InterpolationMode::Trilinear | InterpolationMode::Cubic => {
                if !Interpolator::within_margin(frame, voxel) {
                    return Err(VolumeError::OutOfGrid {
                        i: voxel.x,
                        j: voxel.y,
                        k: voxel.z,
                    });
                }
                Ok(match mode {
                    InterpolationMode::Trilinear => Interpolator::trilinear_interpolate(frame, voxel),
                    _ => Interpolator::cubic_interpolate(frame, voxel),
                })
            }
        }
    }

    /// Resolves a user-supplied subvolume reference: a 1-based number, or
    /// otherwise a subvolume name.
    pub fn subvolume_index_by_name_or_number(&self, name_or_number: &str) -> Option<usize> {
        match name_or_number.trim().parse::<usize>() {
            Ok(number) => (number >= 1 && number <= self.subvolume_count()).then(|| number - 1),
            Err(_) => self
                .subvolumes
                .iter()
                .position(|subvolume| subvolume.name == name_or_number),
        }
    }

    /// Same spatial dimensions, component count and (tolerantly) affine.
    pub fn matches_space(&self, other: &VoxelGrid) -> bool {
        self.spatial_dims() == other.spatial_dims()
            && self.component_count() == other.component_count()
            && self.affine.matches(&other.affine)
    }
}
