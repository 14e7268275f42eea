// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Voxel-grid point cloud reduction
//!
//! Space is partitioned into cubes of edge `voxel_size`; each occupied
//! cube emits one representative point. Aggregation is the arithmetic mean
//! of member positions and colors, so the result does not depend on
//! insertion order; output is sorted by voxel key, making reduction fully
//! deterministic.
//!
//! The voxel edge applies to pixel-scale x/y and unit-scale z alike. That
//! anisotropy is inherited behavior; tests pin it.

use std::collections::BTreeMap;

use tracing::debug;

use crate::reconstruction::point_cloud::PointCloud;

#[derive(Default)]
struct VoxelAccum {
    position: [f64; 3],
    color: [f64; 3],
    count: u32,
}

/// Reduce a cloud so that no two output points share a voxel cell.
///
/// `voxel_size` must be positive. Output length is always <= input length.
pub fn voxel_down_sample(cloud: &PointCloud, voxel_size: f32) -> PointCloud {
    debug_assert!(voxel_size > 0.0, "voxel_size must be positive");

    let mut grid: BTreeMap<(i64, i64, i64), VoxelAccum> = BTreeMap::new();

    for (point, color) in cloud.iter() {
        let key = (
            (point[0] / voxel_size).floor() as i64,
            (point[1] / voxel_size).floor() as i64,
            (point[2] / voxel_size).floor() as i64,
        );

        let accum = grid.entry(key).or_default();
        for axis in 0..3 {
            accum.position[axis] += f64::from(point[axis]);
            accum.color[axis] += f64::from(color[axis]);
        }
        accum.count += 1;
    }

    let mut reduced = PointCloud::with_capacity(grid.len());
    for accum in grid.values() {
        let n = f64::from(accum.count);
        reduced.push(
            [
                (accum.position[0] / n) as f32,
                (accum.position[1] / n) as f32,
                (accum.position[2] / n) as f32,
            ],
            [
                (accum.color[0] / n) as f32,
                (accum.color[1] / n) as f32,
                (accum.color[2] / n) as f32,
            ],
        );
    }

    debug!(
        "Voxel reduction: {} -> {} points (voxel size {})",
        cloud.len(),
        reduced.len(),
        voxel_size
    );

    reduced
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voxel_key(point: &[f32; 3], voxel_size: f32) -> (i64, i64, i64) {
        (
            (point[0] / voxel_size).floor() as i64,
            (point[1] / voxel_size).floor() as i64,
            (point[2] / voxel_size).floor() as i64,
        )
    }

    #[test]
    fn test_reduction_never_grows() {
        let mut cloud = PointCloud::new();
        for i in 0..100 {
            let t = i as f32 / 10.0;
            cloud.push([t, t * 2.0, t / 100.0], [0.5, 0.5, 0.5]);
        }
        let reduced = voxel_down_sample(&cloud, 0.08);
        assert!(reduced.len() <= cloud.len());
        assert!(!reduced.is_empty());
    }

    #[test]
    fn test_no_two_points_share_a_voxel() {
        let mut cloud = PointCloud::new();
        for i in 0..50 {
            for j in 0..4 {
                cloud.push([i as f32 * 0.03, j as f32 * 0.03, 0.0], [1.0, 0.0, 0.0]);
            }
        }
        let voxel_size = 0.08;
        let reduced = voxel_down_sample(&cloud, voxel_size);

        let mut seen = std::collections::BTreeSet::new();
        for point in reduced.points() {
            assert!(seen.insert(voxel_key(point, voxel_size)), "duplicate voxel");
        }
    }

    #[test]
    fn test_single_voxel_collapse_means_colors_and_positions() {
        let mut cloud = PointCloud::new();
        cloud.push([0.0, 0.0, 0.0], [0.0, 0.0, 0.0]);
        cloud.push([0.02, 0.02, 0.02], [1.0, 1.0, 1.0]);

        let reduced = voxel_down_sample(&cloud, 1.0);
        assert_eq!(reduced.len(), 1);
        assert!((reduced.points()[0][0] - 0.01).abs() < 1e-6);
        assert!((reduced.colors()[0][0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_deterministic_regardless_of_input_order() {
        let mut forward = PointCloud::new();
        let mut backward = PointCloud::new();
        let entries: Vec<_> = (0..20)
            .map(|i| {
                let t = i as f32 * 0.05;
                ([t, 1.0 - t, t / 2.0], [t, t, t])
            })
            .collect();
        for (p, c) in &entries {
            forward.push(*p, *c);
        }
        for (p, c) in entries.iter().rev() {
            backward.push(*p, *c);
        }

        assert_eq!(
            voxel_down_sample(&forward, 0.08),
            voxel_down_sample(&backward, 0.08)
        );
    }

    #[test]
    fn test_anisotropic_units_are_preserved() {
        // x spans whole pixels, z spans [0,1]: with edge 0.08 the x axis
        // separates points one pixel apart while z needs a 0.08 jump.
        let mut cloud = PointCloud::new();
        cloud.push([0.0, 0.0, 0.0], [0.0; 3]);
        cloud.push([1.0, 0.0, 0.0], [0.0; 3]); // different voxel (x)
        cloud.push([0.0, 0.0, 0.05], [0.0; 3]); // same voxel as first (z)

        let reduced = voxel_down_sample(&cloud, 0.08);
        assert_eq!(reduced.len(), 2);
    }

    #[test]
    fn test_negative_coordinates_bin_correctly() {
        // floor(), not truncation: -0.01 and +0.01 are different cells
        let mut cloud = PointCloud::new();
        cloud.push([-0.01, 0.0, 0.0], [0.0; 3]);
        cloud.push([0.01, 0.0, 0.0], [0.0; 3]);

        let reduced = voxel_down_sample(&cloud, 0.08);
        assert_eq!(reduced.len(), 2);
    }

    #[test]
    fn test_empty_cloud_reduces_to_empty() {
        let reduced = voxel_down_sample(&PointCloud::new(), 0.08);
        assert!(reduced.is_empty());
    }
}
