//! 网格快照
//!
//! 设置时从宿主读取一次，之后不再变化（几何在本地空间视为静态）。

use glam::{Mat3, Mat4, Vec3};
use std::f32::consts::TAU;

// ============================================================================
// 面
// ============================================================================

/// 网格面（只保留轴解析需要的信息）
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshFace {
    /// 顶点数
    pub vertex_count: usize,
    /// 本地空间法线
    pub normal: Vec3,
}

impl MeshFace {
    pub fn new(vertex_count: usize, normal: Vec3) -> Self {
        Self { vertex_count, normal }
    }

    /// 是否为端面（多边形顶点数达到阈值，如圆柱体的两个圆盖）
    #[inline]
    pub fn is_cap(&self, min_vertices: usize) -> bool {
        self.vertex_count >= min_vertices
    }
}

// ============================================================================
// 网格
// ============================================================================

/// 车轮网格快照
#[derive(Clone, Debug, Default)]
pub struct WheelMesh {
    /// 网格名称
    pub name: String,
    /// 本地空间顶点（未变形的静止姿态）
    pub vertices: Vec<Vec3>,
    /// 修改器求值后的本地空间顶点（可选）
    pub evaluated_vertices: Option<Vec<Vec3>>,
    /// 面列表
    pub faces: Vec<MeshFace>,
}

impl WheelMesh {
    /// 创建新网格
    pub fn new(name: impl Into<String>, vertices: Vec<Vec3>) -> Self {
        Self {
            name: name.into(),
            vertices,
            evaluated_vertices: None,
            faces: Vec::new(),
        }
    }

    pub fn with_faces(mut self, faces: Vec<MeshFace>) -> Self {
        self.faces = faces;
        self
    }

    pub fn with_evaluated_vertices(mut self, vertices: Vec<Vec3>) -> Self {
        self.evaluated_vertices = Some(vertices);
        self
    }

    /// 沿本地 Z 轴的圆柱体（与默认圆柱体图元相同的拓扑）
    ///
    /// 侧面为四边形，两个端面各有 `segments` 个顶点。
    pub fn cylinder(name: impl Into<String>, radius: f32, depth: f32, segments: usize) -> Self {
        let segments = segments.max(3);
        let half = depth * 0.5;
        let step = TAU / segments as f32;

        let mut vertices = Vec::with_capacity(segments * 2);
        for i in 0..segments {
            let (sin, cos) = (i as f32 * step).sin_cos();
            vertices.push(Vec3::new(radius * cos, radius * sin, -half));
            vertices.push(Vec3::new(radius * cos, radius * sin, half));
        }

        let mut faces = Vec::with_capacity(segments + 2);
        for i in 0..segments {
            let (sin, cos) = ((i as f32 + 0.5) * step).sin_cos();
            faces.push(MeshFace::new(4, Vec3::new(cos, sin, 0.0)));
        }
        faces.push(MeshFace::new(segments, Vec3::Z));
        faces.push(MeshFace::new(segments, Vec3::NEG_Z));

        Self::new(name, vertices).with_faces(faces)
    }

    /// 本地包围盒的 8 个角点
    pub fn local_bounds(&self) -> [Vec3; 8] {
        let (min, max) = match self.vertices.first() {
            Some(first) => self.vertices.iter().fold((*first, *first), |(lo, hi), v| {
                (lo.min(*v), hi.max(*v))
            }),
            None => (Vec3::ZERO, Vec3::ZERO),
        };

        [
            Vec3::new(min.x, min.y, min.z),
            Vec3::new(min.x, min.y, max.z),
            Vec3::new(min.x, max.y, max.z),
            Vec3::new(min.x, max.y, min.z),
            Vec3::new(max.x, min.y, min.z),
            Vec3::new(max.x, min.y, max.z),
            Vec3::new(max.x, max.y, max.z),
            Vec3::new(max.x, max.y, min.z),
        ]
    }

    /// 世界空间包围盒角点
    pub fn world_bounds(&self, matrix_world: &Mat4) -> [Vec3; 8] {
        self.local_bounds().map(|corner| matrix_world.transform_point3(corner))
    }

    /// 端面的世界空间法线
    pub fn cap_normals_world(&self, matrix_world: &Mat4, min_vertices: usize) -> Vec<Vec3> {
        let rotation = orientation_normalized(matrix_world);
        self.faces
            .iter()
            .filter(|face| face.is_cap(min_vertices))
            .map(|face| rotation * face.normal)
            .collect()
    }

    /// 用于接地计算的世界空间顶点
    ///
    /// 蒙皮网格使用静止姿态顶点：求值后的网格在父骨骼带 Z 平移时会得到错误的接地偏移。
    /// 代价是带形变修改器的蒙皮网格可能算错半径，用户可手动调整半径。
    pub fn contact_vertices_world(&self, matrix_world: &Mat4, skinned: bool) -> Vec<Vec3> {
        let source = match (&self.evaluated_vertices, skinned) {
            (Some(evaluated), false) => evaluated,
            _ => &self.vertices,
        };
        source.iter().map(|v| matrix_world.transform_point3(*v)).collect()
    }
}

/// 世界矩阵的旋转部分（每列单位化，去除缩放）
#[inline]
pub fn orientation_normalized(matrix: &Mat4) -> Mat3 {
    let m = Mat3::from_mat4(*matrix);
    Mat3::from_cols(
        m.x_axis.normalize_or_zero(),
        m.y_axis.normalize_or_zero(),
        m.z_axis.normalize_or_zero(),
    )
}

// ============================================================================
// 尺寸
// ============================================================================

/// 沿世界 X/Y/Z 的包围尺寸
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Dimensions {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Dimensions {
    /// 从一组点计算尺寸
    pub fn from_points(points: &[Vec3]) -> Self {
        let Some(first) = points.first() else {
            return Self::default();
        };
        let (min, max) = points
            .iter()
            .fold((*first, *first), |(lo, hi), p| (lo.min(*p), hi.max(*p)));
        let size = max - min;
        Self { x: size.x, y: size.y, z: size.z }
    }

    /// 所有尺寸都在容差内为零
    #[inline]
    pub fn is_degenerate(&self, tolerance: f32) -> bool {
        self.x <= tolerance && self.y <= tolerance && self.z <= tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cylinder_topology() {
        let mesh = WheelMesh::cylinder("wheel", 1.0, 0.5, 32);
        assert_eq!(mesh.vertices.len(), 64);
        assert_eq!(mesh.faces.len(), 34);

        let caps = mesh.cap_normals_world(&Mat4::IDENTITY, 5);
        assert_eq!(caps.len(), 2);
        assert!((caps[0] - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn test_world_bounds_dimensions() {
        let mesh = WheelMesh::cylinder("wheel", 1.0, 0.5, 32);
        // 绕 Y 轴旋转 90°：车轴从本地 Z 变为世界 X
        let m = Mat4::from_rotation_y(std::f32::consts::FRAC_PI_2);
        let dims = Dimensions::from_points(&mesh.world_bounds(&m));
        assert!((dims.x - 0.5).abs() < 1e-5);
        assert!((dims.y - 2.0).abs() < 1e-3);
        assert!((dims.z - 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_empty_mesh_is_degenerate() {
        let mesh = WheelMesh::new("empty", Vec::new());
        let dims = Dimensions::from_points(&mesh.world_bounds(&Mat4::IDENTITY));
        assert!(dims.is_degenerate(1e-6));
    }

    #[test]
    fn test_contact_vertices_source() {
        let rest = vec![Vec3::new(0.0, 0.0, -1.0)];
        let deformed = vec![Vec3::new(0.0, 0.0, -3.0)];
        let mesh = WheelMesh::new("wheel", rest).with_evaluated_vertices(deformed);

        let plain = mesh.contact_vertices_world(&Mat4::IDENTITY, false);
        assert_eq!(plain[0].z, -3.0);

        // 蒙皮网格使用静止姿态
        let skinned = mesh.contact_vertices_world(&Mat4::IDENTITY, true);
        assert_eq!(skinned[0].z, -1.0);
    }

    #[test]
    fn test_orientation_normalized_removes_scale() {
        let m = Mat4::from_scale(Vec3::new(2.0, 3.0, 4.0));
        let r = orientation_normalized(&m);
        assert!((r.x_axis - Vec3::X).length() < 1e-6);
        assert!((r.z_axis - Vec3::Z).length() < 1e-6);
    }
}
