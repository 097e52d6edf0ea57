//! 接地求解
//!
//! - ground_elevation: 网格最低点（接地高度）
//! - contact_radius: 枢轴到接地点的有效半径
//! - ground_contact_frame: 接地点的位置与朝向（可视化与锚点）

mod locator;

pub use locator::{auto_parent_outline, locator_lines, transform_coords};

use glam::{Mat4, Vec3};

use crate::config::get_config;

/// 世界空间顶点中最低的 Z 坐标，没有顶点时返回 None
pub fn ground_elevation(world_vertices: &[Vec3]) -> Option<f32> {
    world_vertices
        .iter()
        .map(|v| v.z)
        .reduce(f32::min)
}

/// 有效半径 = |枢轴高度 - 接地高度|，钳制到最小半径
pub fn contact_radius(pivot_z: f32, ground_z: f32) -> f32 {
    let config = get_config();
    let radius = (pivot_z - ground_z).abs();
    if radius < config.radius_min {
        log::debug!(
            "[wheel] 接地半径 {:.6} 小于最小值，钳制为 {}",
            radius, config.radius_min
        );
    }
    config.clamp_radius(radius)
}

/// 接地变换 = 父级世界矩阵 ∘ 轴偏移 ∘ 向下平移半径
///
/// 父级可能有动画，每次重绘都要重新计算，不做跨帧缓存。
#[inline]
pub fn ground_contact_frame(parent_world: &Mat4, axis_offset: &Mat4, radius: f32) -> Mat4 {
    *parent_world * *axis_offset * Mat4::from_translation(Vec3::new(0.0, 0.0, -radius))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ground_elevation() {
        let verts = [
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, -0.25),
            Vec3::new(0.0, 2.0, 0.5),
        ];
        assert_eq!(ground_elevation(&verts), Some(-0.25));
        assert_eq!(ground_elevation(&[]), None);
    }

    #[test]
    fn test_contact_radius_clamped() {
        assert!((contact_radius(1.0, 0.25) - 0.75).abs() < 1e-6);
        assert!((contact_radius(0.25, 1.0) - 0.75).abs() < 1e-6);
        assert_eq!(contact_radius(0.5, 0.5), 0.001);
    }

    #[test]
    fn test_ground_contact_frame() {
        let parent = Mat4::from_translation(Vec3::new(3.0, 0.0, 0.0));
        let offset = Mat4::from_translation(Vec3::new(0.0, 0.0, 0.5));
        let frame = ground_contact_frame(&parent, &offset, 0.5);
        let p = frame.col(3).truncate();
        assert!((p - Vec3::new(3.0, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_ground_contact_frame_follows_parent_rotation() {
        // 父级绕 X 轴翻转 180°：接地点在父级本地 -Z，世界中位于上方
        let parent = Mat4::from_rotation_x(std::f32::consts::PI);
        let frame = ground_contact_frame(&parent, &Mat4::IDENTITY, 1.0);
        let p = frame.col(3).truncate();
        assert!((p - Vec3::new(0.0, 0.0, 1.0)).length() < 1e-5);
    }
}
