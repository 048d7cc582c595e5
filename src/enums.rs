use crate::error::VolumeError;

/// How a volume is sampled at an arbitrary world coordinate.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum InterpolationMode {
    /// Nearest voxel; label values are never blended.
    #[default]
    EnclosingVoxel,
    Trilinear,
    /// 4x4x4 cubic convolution with edge replication.
    Cubic,
}

/// What the values of a volume mean.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum VolumeKind {
    #[default]
    Continuous,
    Label,
}

/// Which subvolumes of a volume an operation consumes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SubvolumeSelection {
    #[default]
    All,
    Index(usize),
}

impl SubvolumeSelection {
    /// Converts the `-1 == all` convention used by command front ends.
    pub fn from_signed(index: i64, count: usize) -> Result<Self, VolumeError> {
        match index {
            -1 => Ok(Self::All),
            i if i >= 0 && (i as u64) < count as u64 => Ok(Self::Index(i as usize)),
            _ => Err(VolumeError::InvalidSubvolumeIndex { index, count }),
        }
    }

    /// Number of subvolumes selected out of `count`.
    pub fn selected_count(&self, count: usize) -> usize {
        match self {
            Self::All => count,
            Self::Index(_) => 1,
        }
    }
}

/// What to do with sampled label values that have no entry in the output table.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum UnknownKeyPolicy {
    /// Keep the value; a warning reports how many vertices were affected.
    #[default]
    Keep,
    /// Replace the value with the table's unassigned key.
    Unassigned,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minus_one_selects_all() {
        assert_eq!(
            SubvolumeSelection::from_signed(-1, 3),
            Ok(SubvolumeSelection::All)
        );
        assert_eq!(
            SubvolumeSelection::from_signed(2, 3),
            Ok(SubvolumeSelection::Index(2))
        );
    }

    #[test]
    fn rejects_indices_outside_range() {
        assert_eq!(
            SubvolumeSelection::from_signed(3, 3),
            Err(VolumeError::InvalidSubvolumeIndex { index: 3, count: 3 })
        );
        assert!(SubvolumeSelection::from_signed(-2, 3).is_err());
    }

    #[test]
    fn selected_count() {
        assert_eq!(SubvolumeSelection::All.selected_count(4), 4);
        assert_eq!(SubvolumeSelection::Index(1).selected_count(4), 1);
    }
}
