use nalgebra::Point3;
use rayon::prelude::*;
use volume_label_map::{
    AffineSpace, ConcatenationInput, InterpolationMode, Label, LabelDictionary, LabelMapper,
    LabelMappingOptions, SubvolumeAttributes, SubvolumeSelection, SurfaceMesh, VolumeConcatenator,
    VolumeError, VolumeKind, VolumePadder, VoxelGrid,
};

fn table(entries: &[(i32, &str)]) -> LabelDictionary {
    let mut table = LabelDictionary::new();
    for (index, &(key, name)) in entries.iter().enumerate() {
        let shade = index as f32 / entries.len() as f32;
        table.insert(key, Label::new(name, [shade, 1.0 - shade, 0.5, 1.0]));
    }
    table
}

fn triangle_at(point: Point3<f64>) -> SurfaceMesh {
    SurfaceMesh::new(vec![point; 3], vec![[0, 1, 2]])
}

#[test]
fn single_label_volume_colors_a_triangle() {
    let dictionary = table(&[(5, "A")]);
    let affine = AffineSpace::from_spacing([-20.0, 10.0, 4.0], [1.5, 1.5, 1.5]);
    let mut values = vec![0.0; 8];
    values[0] = 5.0;
    let grid = VoxelGrid::from_vec(
        [2, 2, 2, 1, 1],
        values,
        affine,
        VolumeKind::Label,
        vec![SubvolumeAttributes::labeled("atlas", dictionary.clone())],
    )
    .unwrap();

    let surface = triangle_at(affine.origin());
    let labels = LabelMapper::map_volume_to_surface(&grid, &surface, &Default::default()).unwrap();

    assert_eq!(labels.column_count(), 1);
    assert_eq!(labels.columns[0].name, "atlas");
    assert_eq!(labels.columns[0].keys, vec![5, 5, 5]);
    assert_eq!(labels.dictionary, dictionary);
}

#[test]
fn colliding_subvolume_tables_are_merged() {
    let grid = VoxelGrid::from_vec(
        [1, 1, 1, 2, 1],
        vec![1.0, 1.0],
        AffineSpace::default(),
        VolumeKind::Label,
        vec![
            SubvolumeAttributes::labeled("first", table(&[(1, "X")])),
            SubvolumeAttributes::labeled("second", table(&[(1, "Y")])),
        ],
    )
    .unwrap();
    let surface = triangle_at(Point3::origin());
    let labels = LabelMapper::map_volume_to_surface(&grid, &surface, &Default::default()).unwrap();

    let new_key = labels.key_remap.get(1).unwrap();
    assert_eq!(labels.key_remap.len(), 1);
    assert_eq!(labels.dictionary.label(1).unwrap().name, "X");
    assert_eq!(labels.dictionary.label(new_key).unwrap().name, "Y");
    assert_eq!(labels.columns[0].keys, vec![1, 1, 1]);
    assert_eq!(labels.columns[1].keys, vec![new_key; 3]);
}

#[test]
fn signed_subvolume_index_past_the_end() {
    let grid = VoxelGrid::from_vec(
        [1, 1, 1, 2, 1],
        vec![0.0, 0.0],
        AffineSpace::default(),
        VolumeKind::Label,
        vec![
            SubvolumeAttributes::labeled("first", LabelDictionary::new()),
            SubvolumeAttributes::labeled("second", LabelDictionary::new()),
        ],
    )
    .unwrap();
    assert_eq!(
        SubvolumeSelection::from_signed(2, grid.subvolume_count()),
        Err(VolumeError::InvalidSubvolumeIndex { index: 2, count: 2 })
    );
    assert_eq!(
        VolumeConcatenator::concatenate(&[ConcatenationInput::subvolume(&grid, 2)]),
        Err(VolumeError::IndexOutOfRange {
            input: 0,
            index: 2,
            count: 2
        })
    );

    let options = LabelMappingOptions {
        subvolume: SubvolumeSelection::from_signed(-1, grid.subvolume_count()).unwrap(),
        ..Default::default()
    };
    let labels =
        LabelMapper::map_volume_to_surface(&grid, &triangle_at(Point3::origin()), &options)
            .unwrap();
    assert_eq!(labels.column_count(), 2);
}

#[test]
fn padding_a_cube_by_one_voxel() {
    let grid = VoxelGrid::from_vec(
        [2, 2, 2, 1, 1],
        (10..18).map(|v| v as f32).collect(),
        AffineSpace::from_spacing([3.0, 2.0, 1.0], [0.8, 0.8, 0.8]),
        VolumeKind::Continuous,
        vec![SubvolumeAttributes::continuous("t1", None)],
    )
    .unwrap();
    let plan = VolumePadder::pad_by_voxels(&grid, 1, 1, 1);
    let padded = plan.apply(&grid, -3.0).unwrap();

    assert_eq!(padded.spatial_dims(), [4, 4, 4]);
    assert_eq!(padded.value(1, 1, 1, 0, 0), grid.value(0, 0, 0, 0, 0));
    for i in 0..4 {
        for j in 0..4 {
            for k in 0..4 {
                let border = [i, j, k].iter().any(|&v| v == 0 || v == 3);
                if border {
                    assert_eq!(padded.value(i, j, k, 0, 0), Some(-3.0));
                } else {
                    assert_eq!(padded.value(i, j, k, 0, 0), grid.value(i - 1, j - 1, k - 1, 0, 0));
                }
            }
        }
    }
    assert_eq!(plan.invert(&padded).unwrap(), grid);
}

#[test]
fn concatenated_frames_match_their_sources() {
    let affine = AffineSpace::from_origin_and_basis(
        [1.0, 2.0, 3.0],
        [2.0, 0.1, 0.0],
        [0.0, 2.0, 0.1],
        [0.1, 0.0, 2.0],
    );
    let build = |frames: usize, offset: f32| {
        VoxelGrid::from_vec(
            [3, 2, 2, frames, 2],
            (0..12 * frames * 2).map(|v| v as f32 * 0.5 + offset).collect(),
            affine,
            VolumeKind::Continuous,
            (0..frames)
                .map(|f| SubvolumeAttributes::continuous(format!("{offset}-{f}"), None))
                .collect(),
        )
        .unwrap()
    };
    let a = build(2, 0.0);
    let b = build(3, 1000.0);
    let inputs = [
        ConcatenationInput::subvolume(&b, 2),
        ConcatenationInput::all(&a),
        ConcatenationInput::all(&b),
    ];
    let output = VolumeConcatenator::concatenate(&inputs).unwrap();

    assert_eq!(output.subvolume_count(), 1 + 2 + 3);
    let expected = [(&b, 2), (&a, 0), (&a, 1), (&b, 0), (&b, 1), (&b, 2)];
    for (slot, (source, subvolume)) in expected.into_iter().enumerate() {
        for component in 0..2 {
            let out: Vec<u32> = output
                .frame(slot, component)
                .unwrap()
                .iter()
                .map(|v| v.to_bits())
                .collect();
            let src: Vec<u32> = source
                .frame(subvolume, component)
                .unwrap()
                .iter()
                .map(|v| v.to_bits())
                .collect();
            assert_eq!(out, src);
        }
    }
}

#[test]
fn grid_can_be_sampled_from_many_threads() {
    let grid = VoxelGrid::from_vec(
        [4, 4, 4, 1, 1],
        (0..64).map(|v| v as f32).collect(),
        AffineSpace::default(),
        VolumeKind::Continuous,
        vec![SubvolumeAttributes::continuous("ramp", None)],
    )
    .unwrap();
    let points: Vec<Point3<f64>> = (0..1000)
        .map(|n| Point3::new((n % 10) as f64 * 0.3, (n % 7) as f64 * 0.4, (n % 5) as f64 * 0.6))
        .collect();
    let serial: Vec<f32> = points
        .iter()
        .map(|p| grid.sample(p, InterpolationMode::Cubic, 0, 0).unwrap())
        .collect();
    let parallel: Vec<f32> = points
        .par_iter()
        .map(|p| grid.sample(p, InterpolationMode::Cubic, 0, 0).unwrap())
        .collect();
    assert_eq!(serial, parallel);
}
