//! 滚动轴解析
//!
//! 设计原则：
//! - 车轮的两个非车轴尺寸（直径方向）近似相等，尺寸差最小的一对之外的轴就是车轴
//! - X/Y 尺寸相同（默认圆柱体）时改为检查端面法线
//! - 本地轴取与世界滚动方向点积绝对值最大的本地基向量，点积为负则反转

use glam::{Mat3, Mat4, Vec3};

use super::mesh::{orientation_normalized, Dimensions, WheelMesh};
use super::{ForwardAxis, ForwardAxisMode, LocalAxis, WorldAxis};
use crate::config::get_config;
use crate::contact::{contact_radius, ground_elevation};
use crate::{Result, WheelError};

// ============================================================================
// 世界滚动轴
// ============================================================================

/// 根据世界空间包围盒解析滚动轴
///
/// # 参数
/// - `world_bounds`: 世界空间包围盒 8 个角点
/// - `cap_normals`: 多于 4 个顶点的面（端面）的世界空间法线，没有端面时为空
///
/// 尺寸差并列时取先出现的轴（X 优先于 Y）。
pub fn resolve_rolling_axis(world_bounds: &[Vec3; 8], cap_normals: &[Vec3]) -> Result<WorldAxis> {
    let config = get_config();
    let dims = Dimensions::from_points(world_bounds);

    if dims.is_degenerate(config.extent_tolerance) {
        return Err(WheelError::DegenerateGeometry(format!(
            "bounding box has zero extent ({:.6}, {:.6}, {:.6})",
            dims.x, dims.y, dims.z
        )));
    }

    // 下标 0: |dy-dz| → X 为车轴；1: |dx-dz| → Y 为车轴；2: |dx-dy| → Z
    let differences = [
        (dims.y - dims.z).abs(),
        (dims.x - dims.z).abs(),
        (dims.x - dims.y).abs(),
    ];
    let considered = if config.ignore_vertical_pair { 2 } else { 3 };

    let mut outlier = 0;
    for i in 1..considered {
        if differences[i] < differences[outlier] {
            outlier = i;
        }
    }

    // Z 不可能是车轴：退回 X/Y 中较小者，并强制检查端面
    let vertical_won = outlier == 2;
    if vertical_won {
        outlier = if differences[0] <= differences[1] { 0 } else { 1 };
    }

    let symmetric = (dims.x - dims.y).abs() < config.extent_tolerance;
    if symmetric || vertical_won {
        // 默认圆柱体：两个多边形端面，用端面法线判断车轴
        if cap_normals.len() == 2 {
            let dot_x = Vec3::X.dot(cap_normals[0]).abs();
            outlier = if dot_x > config.cap_axis_threshold { 0 } else { 1 };
        }
    }

    Ok(if outlier == 0 { WorldAxis::X } else { WorldAxis::Y })
}

// ============================================================================
// 本地旋转轴
// ============================================================================

/// 根据物体世界朝向解析本地旋转轴
///
/// `world_orientation` 的三列是本地基向量在世界空间中的方向，内部会先单位化。
/// 返回 (本地轴, 是否反转)。
pub fn resolve_local_axis(world_orientation: &Mat3, rolling_axis: WorldAxis) -> (LocalAxis, bool) {
    let axes = [
        world_orientation.x_axis.normalize_or_zero(),
        world_orientation.y_axis.normalize_or_zero(),
        world_orientation.z_axis.normalize_or_zero(),
    ];
    local_axis_and_inversion(&axes, rolling_axis.unit())
}

/// 骨骼版本：骨骼的骨架空间轴经骨架世界朝向变换后再解析
pub fn resolve_local_axis_bone(
    bone_pose: &Mat4,
    armature_world: &Mat4,
    rolling_axis: WorldAxis,
) -> (LocalAxis, bool) {
    let armature_rotation = orientation_normalized(armature_world);
    let pose = Mat3::from_mat4(*bone_pose);
    let axes = [
        (armature_rotation * pose.x_axis).normalize_or_zero(),
        (armature_rotation * pose.y_axis).normalize_or_zero(),
        (armature_rotation * pose.z_axis).normalize_or_zero(),
    ];
    local_axis_and_inversion(&axes, rolling_axis.unit())
}

/// 点积绝对值最大的轴即为旋转轴；并列时取 X、Y、Z 中先出现者
fn local_axis_and_inversion(axes: &[Vec3; 3], rolling_direction: Vec3) -> (LocalAxis, bool) {
    let dots = axes.map(|axis| axis.dot(rolling_direction));

    let mut best = 0;
    for i in 1..3 {
        if dots[i].abs() > dots[best].abs() {
            best = i;
        }
    }

    (LocalAxis::ALL[best], dots[best] < 0.0)
}

// ============================================================================
// 车轮几何信息
// ============================================================================

/// 车轮几何信息（每次设置时计算一次，之后不变）
#[derive(Clone, Debug)]
pub struct WheelGeometryInfo {
    /// 网格名称
    pub name: String,
    /// 设置时的世界位置（枢轴）
    pub location: Vec3,
    /// 世界空间尺寸
    pub dimensions: Dimensions,
    /// 世界滚动轴（车轴）
    pub rolling_axis: WorldAxis,
    /// 前进轴
    pub forward_axis: ForwardAxis,
    /// 本地旋转轴
    pub local_rotation_axis: LocalAxis,
    /// 是否反转旋转
    pub invert: bool,
    /// 半径（枢轴到接地点）
    pub radius: f32,
    /// 垂直于前进方向的尺寸
    pub width: f32,
    /// 沿前进方向的尺寸
    pub length: f32,
}

impl WheelGeometryInfo {
    /// 从网格快照和世界矩阵分析车轮
    ///
    /// `skinned` 为 true 时接地计算使用静止姿态顶点（见 `WheelMesh::contact_vertices_world`）。
    pub fn analyze(
        mesh: &WheelMesh,
        matrix_world: &Mat4,
        mode: ForwardAxisMode,
        skinned: bool,
    ) -> Result<Self> {
        let config = get_config();
        let location = matrix_world.col(3).truncate();
        let bounds = mesh.world_bounds(matrix_world);
        let dimensions = Dimensions::from_points(&bounds);

        let lowest = ground_elevation(&mesh.contact_vertices_world(matrix_world, skinned))
            .ok_or_else(|| {
                WheelError::DegenerateGeometry(format!("mesh '{}' has no vertices", mesh.name))
            })?;
        let radius = contact_radius(location.z, lowest);

        let rolling_axis = match mode {
            ForwardAxisMode::Auto => {
                let caps = mesh.cap_normals_world(matrix_world, config.cap_min_vertices);
                resolve_rolling_axis(&bounds, &caps)?
            }
            ForwardAxisMode::X => {
                if dimensions.is_degenerate(config.extent_tolerance) {
                    return Err(WheelError::DegenerateGeometry(format!(
                        "mesh '{}' has zero extent",
                        mesh.name
                    )));
                }
                WorldAxis::Y
            }
            ForwardAxisMode::Y => {
                if dimensions.is_degenerate(config.extent_tolerance) {
                    return Err(WheelError::DegenerateGeometry(format!(
                        "mesh '{}' has zero extent",
                        mesh.name
                    )));
                }
                WorldAxis::X
            }
        };
        let forward_axis = rolling_axis.forward();

        let (local_rotation_axis, invert) =
            resolve_local_axis(&orientation_normalized(matrix_world), rolling_axis);

        let (width, length) = match forward_axis {
            ForwardAxis::X => (dimensions.y, dimensions.x),
            ForwardAxis::Y => (dimensions.x, dimensions.y),
        };

        if config.debug_log {
            log::info!(
                "[wheel] '{}' 分析完成: 滚动轴={:?}, 本地轴={:?}, 反转={}, 半径={:.4}",
                mesh.name, rolling_axis, local_rotation_axis, invert, radius
            );
        }

        Ok(Self {
            name: mesh.name.clone(),
            location,
            dimensions,
            rolling_axis,
            forward_axis,
            local_rotation_axis,
            invert,
            radius,
            width,
            length,
        })
    }
}
