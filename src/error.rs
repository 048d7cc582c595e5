use thiserror::Error;

/// Errors raised by the volume geometry and label mapping operations.
///
/// Every variant aborts the current operation; nothing is retried internally.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum VolumeError {
    #[error("label mapping requires a label volume")]
    WrongVolumeKind,

    #[error("invalid subvolume index {index} (volume has {count} subvolumes)")]
    InvalidSubvolumeIndex { index: i64, count: usize },

    #[error("input {input}: subvolume index {index} is out of range (volume has {count} subvolumes)")]
    IndexOutOfRange {
        input: usize,
        index: usize,
        count: usize,
    },

    #[error("component index {index} is out of range (volume has {count} components)")]
    InvalidComponentIndex { index: usize, count: usize },

    #[error("subvolume {subvolume} ('{name}') has no label table")]
    MissingDictionary { subvolume: usize, name: String },

    #[error("input {input} ('{name}') does not match the volume space of the first input")]
    IncompatibleVolumeSpace { input: usize, name: String },

    #[error("input {input} mixes label and non-label volumes")]
    MixedVolumeKind { input: usize },

    #[error("no volumes were given to concatenate")]
    NoInputs,

    #[error("voxel-to-world transform is not invertible")]
    SingularTransform,

    #[error("volume geometry does not match the padded geometry of the plan")]
    SpaceMismatch,

    #[error("voxel coordinate ({i:.3}, {j:.3}, {k:.3}) lies outside the volume")]
    OutOfGrid { i: f64, j: f64, k: f64 },

    #[error("invalid volume dimensions {dims:?} for {len} values")]
    InvalidDimensions { dims: [usize; 5], len: usize },

    #[error("{attributes} subvolume attributes given for {count} subvolumes")]
    SubvolumeCountMismatch { attributes: usize, count: usize },

    #[error("invalid padding margin {0}")]
    InvalidPadding(f64),
}
