//! 绑定链 - 为积分器提供正确锚定的本地坐标系
//!
//! 核心设计思想：
//! - 无论被驱动对象是独立网格、有父级的网格、Child Of 约束网格还是骨骼，
//!   都归结为一个固定的轴偏移矩阵（设置时计算一次）
//! - 每帧：父级世界矩阵 ∘ 轴偏移 ∘ 向下平移半径 = 锚点（接地点）
//! - 绑定拓扑变化后不会自动重算，需要重新设置

mod armature;

pub use armature::{Armature, RigBone};

use bitflags::bitflags;
use glam::{Mat4, Quat, Vec3};

use crate::config::get_config;
use crate::contact::ground_contact_frame;
use crate::geometry::{
    resolve_local_axis_bone, ForwardAxis, ForwardAxisMode, LocalAxis, WheelGeometryInfo,
    WheelMesh,
};
use crate::{Result, WheelError};

// ============================================================================
// 绑定标志
// ============================================================================

bitflags! {
    /// 绑定标志位
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct RigFlags: u32 {
        /// 目标是骨骼
        const BONE = 1 << 0;
        /// 车轮网格被骨架蒙皮
        const SKINNED = 1 << 1;
        /// 父级来自 Child Of 约束
        const CHILD_OF = 1 << 2;
        /// 需要自动生成父级
        const AUTO_PARENT = 1 << 3;
        /// 旋转需要反转
        const INVERT_ROTATION = 1 << 4;
    }
}

// ============================================================================
// 对象类型
// ============================================================================

/// 被驱动对象的类型
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// 无父级、无约束的网格
    FreeMesh,
    /// 有直接父级的网格
    ParentedMesh,
    /// 通过 Child Of 约束跟随目标的网格
    ConstrainedMesh,
    /// 骨骼，参考网格被骨架蒙皮
    SkinnedBone,
    /// 骨骼，参考网格只是挂在骨骼下
    ParentedBone,
}

impl ObjectKind {
    /// 根据设置上下文判断类型
    pub fn classify(context: &RigContext<'_>) -> Self {
        if context.armature.is_some() || context.bone.is_some() {
            if context.skinned {
                ObjectKind::SkinnedBone
            } else {
                ObjectKind::ParentedBone
            }
        } else if context.parent_world.is_some() {
            ObjectKind::ParentedMesh
        } else if context.constraint_target_world.is_some() {
            ObjectKind::ConstrainedMesh
        } else {
            ObjectKind::FreeMesh
        }
    }

    #[inline]
    pub fn is_bone(self) -> bool {
        matches!(self, ObjectKind::SkinnedBone | ObjectKind::ParentedBone)
    }
}

// ============================================================================
// 设置上下文
// ============================================================================

/// 设置时的绑定上下文（由宿主提供）
#[derive(Clone, Copy, Debug, Default)]
pub struct RigContext<'a> {
    /// 直接父级的世界矩阵
    pub parent_world: Option<Mat4>,
    /// Child Of 约束目标的世界矩阵
    pub constraint_target_world: Option<Mat4>,
    /// 骨架（骨骼目标）
    pub armature: Option<&'a Armature>,
    /// 被驱动骨骼名称
    pub bone: Option<&'a str>,
    /// 车轮网格是否被骨架蒙皮
    pub skinned: bool,
}

impl<'a> RigContext<'a> {
    /// 独立网格
    pub fn free() -> Self {
        Self::default()
    }

    /// 有直接父级的网格
    pub fn parented(parent_world: Mat4) -> Self {
        Self {
            parent_world: Some(parent_world),
            ..Self::default()
        }
    }

    /// Child Of 约束网格
    pub fn constrained(target_world: Mat4) -> Self {
        Self {
            constraint_target_world: Some(target_world),
            ..Self::default()
        }
    }

    /// 骨骼
    pub fn bone(armature: &'a Armature, bone: &'a str, skinned: bool) -> Self {
        Self {
            armature: Some(armature),
            bone: Some(bone),
            skinned,
            ..Self::default()
        }
    }

    /// 解析骨架与骨骼索引
    fn resolve_bone(&self) -> Result<(&'a Armature, usize)> {
        let armature = self
            .armature
            .ok_or_else(|| WheelError::MissingRigContext("bone target without armature".into()))?;
        let name = self
            .bone
            .ok_or_else(|| WheelError::MissingRigContext("no bone selected".into()))?;
        let index = armature.find_bone(name).ok_or_else(|| {
            WheelError::MissingRigContext(format!(
                "bone '{}' not found in armature '{}'",
                name, armature.name
            ))
        })?;
        Ok((armature, index))
    }
}

// ============================================================================
// 轴偏移
// ============================================================================

/// 轴偏移：枢轴/接地坐标系相对于父级坐标系的固定本地变换
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisOffsetTransform(pub Mat4);

impl AxisOffsetTransform {
    #[inline]
    pub fn matrix(&self) -> &Mat4 {
        &self.0
    }
}

impl Default for AxisOffsetTransform {
    fn default() -> Self {
        Self(Mat4::IDENTITY)
    }
}

/// 可逆检查后的逆矩阵
///
/// 只拒绝真正奇异的矩阵，毫米单位场景的微小缩放照常求逆。
fn checked_inverse(matrix: &Mat4, what: &str) -> Result<Mat4> {
    let det = matrix.determinant();
    if det == 0.0 || !det.is_finite() {
        return Err(WheelError::DegenerateGeometry(format!(
            "{what} matrix is not invertible"
        )));
    }
    let inverse = matrix.inverse();
    if !inverse.is_finite() {
        return Err(WheelError::DegenerateGeometry(format!(
            "{what} matrix inverse is not finite"
        )));
    }
    Ok(inverse)
}

/// 只保留平移的矩阵
#[inline]
fn location_only(matrix: &Mat4) -> Mat4 {
    Mat4::from_translation(matrix.col(3).truncate())
}

/// 独立网格的虚拟父级：位于车轮正下方半径处
#[inline]
fn virtual_parent(wheel_world: &Mat4, radius: f32) -> Mat4 {
    location_only(wheel_world) * Mat4::from_translation(Vec3::new(0.0, 0.0, -radius))
}

/// 设置时的父级坐标系（与每帧 `WheelRig::parent_frame` 对应）
fn setup_parent_frame(
    kind: ObjectKind,
    wheel_world: &Mat4,
    context: &RigContext<'_>,
    radius: f32,
) -> Result<Mat4> {
    match kind {
        ObjectKind::FreeMesh => Ok(virtual_parent(wheel_world, radius)),
        ObjectKind::ParentedMesh => context
            .parent_world
            .ok_or_else(|| WheelError::MissingRigContext("parented mesh without parent".into())),
        ObjectKind::ConstrainedMesh => context.constraint_target_world.ok_or_else(|| {
            WheelError::MissingRigContext("constrained mesh without constraint target".into())
        }),
        ObjectKind::SkinnedBone | ObjectKind::ParentedBone => {
            let (armature, index) = context.resolve_bone()?;
            Ok(match armature.parent_of(index) {
                Some(parent) => armature.bone_world_matrix(parent),
                None => armature.world_matrix,
            })
        }
    }
}

/// 计算轴偏移
///
/// 所有分支都只取车轮的位置（不带旋转和缩放），再表达到父级本地空间：
/// - 独立网格：相对于虚拟父级（车轮位置下方半径处）
/// - 有父级 / 约束网格：相对于父级或约束目标
/// - 蒙皮骨骼：先求网格被骨骼带动后的实际位置，再相对于父骨骼（无父骨骼时为骨架）
/// - 普通骨骼：直接使用网格的世界位置
pub fn build_offset(
    kind: ObjectKind,
    wheel_world: &Mat4,
    context: &RigContext<'_>,
    radius: f32,
) -> Result<AxisOffsetTransform> {
    let wheel_location = match kind {
        ObjectKind::SkinnedBone => {
            let (armature, index) = context.resolve_bone()?;
            let bone = armature.get_bone(index).ok_or_else(|| {
                WheelError::MissingRigContext(format!("bone index {index} out of range"))
            })?;
            location_only(&armature.deformed_world_matrix(wheel_world, bone))
        }
        _ => location_only(wheel_world),
    };

    let parent = setup_parent_frame(kind, wheel_world, context, radius)?;
    let offset = checked_inverse(&parent, "parent")? * wheel_location;
    Ok(AxisOffsetTransform(offset))
}

// ============================================================================
// 每帧父级姿态
// ============================================================================

/// 每帧由宿主提供的父级姿态
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParentPose {
    /// 网格：父级（或约束目标、自动父级）的世界矩阵
    Object(Mat4),
    /// 骨骼：骨架世界矩阵与父骨骼姿态（骨架空间，无父骨骼时为 None）
    Bone {
        armature_world: Mat4,
        parent_pose: Option<Mat4>,
    },
}

impl ParentPose {
    /// 从骨架当前姿态读取
    pub fn from_armature(armature: &Armature, bone: &str) -> Result<Self> {
        let index = armature.find_bone(bone).ok_or_else(|| {
            WheelError::MissingRigContext(format!(
                "bone '{}' not found in armature '{}'",
                bone, armature.name
            ))
        })?;
        Ok(ParentPose::Bone {
            armature_world: armature.world_matrix,
            parent_pose: armature.parent_of(index).map(|parent| parent.pose_matrix),
        })
    }
}

// ============================================================================
// 车轮绑定
// ============================================================================

/// 车轮绑定（设置输出）
#[derive(Clone, Debug)]
pub struct WheelRig {
    /// 对象类型
    pub kind: ObjectKind,
    /// 几何信息
    pub geometry: WheelGeometryInfo,
    /// 本地旋转轴（骨骼目标时为骨骼的本地轴）
    pub local_axis: LocalAxis,
    /// 轴偏移
    pub offset: AxisOffsetTransform,
    /// 标志
    pub flags: RigFlags,
    /// 父骨骼名称
    pub parent_bone: Option<String>,
    /// 设置时的父级世界矩阵（独立网格时即自动父级的初始位置）
    pub setup_parent_world: Mat4,
}

impl WheelRig {
    /// 设置车轮绑定
    ///
    /// # 参数
    /// - `mesh`: 车轮网格（骨骼目标时为参考网格）
    /// - `wheel_world`: 网格世界矩阵
    /// - `mode`: 前进轴检测模式
    /// - `context`: 父级 / 约束 / 骨架上下文
    pub fn setup(
        mesh: &WheelMesh,
        wheel_world: &Mat4,
        mode: ForwardAxisMode,
        context: &RigContext<'_>,
    ) -> Result<Self> {
        let kind = ObjectKind::classify(context);

        // 骨骼上下文先校验，失败时不做任何分析
        let bone = if kind.is_bone() {
            Some(context.resolve_bone()?)
        } else {
            None
        };

        let geometry = WheelGeometryInfo::analyze(mesh, wheel_world, mode, context.skinned)?;

        let (local_axis, invert, parent_bone) = match bone {
            Some((armature, index)) => {
                let rig_bone = armature.get_bone(index).ok_or_else(|| {
                    WheelError::MissingRigContext(format!("bone index {index} out of range"))
                })?;
                let (axis, invert) = resolve_local_axis_bone(
                    &rig_bone.pose_matrix,
                    &armature.world_matrix,
                    geometry.rolling_axis,
                );
                let parent_bone = armature.parent_of(index).map(|p| p.name.clone());
                (axis, invert, parent_bone)
            }
            None => (geometry.local_rotation_axis, geometry.invert, None),
        };

        let offset = build_offset(kind, wheel_world, context, geometry.radius)?;
        let setup_parent_world = setup_parent_frame(kind, wheel_world, context, geometry.radius)?;

        let mut flags = RigFlags::empty();
        flags.set(RigFlags::BONE, kind.is_bone());
        flags.set(RigFlags::SKINNED, context.skinned);
        flags.set(RigFlags::CHILD_OF, kind == ObjectKind::ConstrainedMesh);
        flags.set(RigFlags::AUTO_PARENT, kind == ObjectKind::FreeMesh);
        flags.set(RigFlags::INVERT_ROTATION, invert);

        if get_config().debug_log {
            log::info!(
                "[wheel] '{}' 绑定: 类型={:?}, 本地轴={:?}, 反转={}, 父骨骼={:?}",
                geometry.name, kind, local_axis, invert, parent_bone
            );
        }

        Ok(Self {
            kind,
            geometry,
            local_axis,
            offset,
            flags,
            parent_bone,
            setup_parent_world,
        })
    }

    #[inline]
    pub fn forward_axis(&self) -> ForwardAxis {
        self.geometry.forward_axis
    }

    #[inline]
    pub fn is_bone(&self) -> bool {
        self.flags.contains(RigFlags::BONE)
    }

    /// 本地轴与世界滚动方向相反
    #[inline]
    pub fn invert(&self) -> bool {
        self.flags.contains(RigFlags::INVERT_ROTATION)
    }

    #[inline]
    pub fn needs_auto_parent(&self) -> bool {
        self.flags.contains(RigFlags::AUTO_PARENT)
    }

    /// 由每帧父级姿态求父级世界矩阵
    pub fn parent_frame(&self, pose: &ParentPose) -> Result<Mat4> {
        match (self.is_bone(), pose) {
            (false, ParentPose::Object(parent_world)) => Ok(*parent_world),
            (true, ParentPose::Bone { armature_world, parent_pose }) => {
                match (&self.parent_bone, parent_pose) {
                    (Some(_), Some(parent_pose)) => Ok(*armature_world * *parent_pose),
                    (None, None) => Ok(*armature_world),
                    (Some(name), None) => Err(WheelError::PoseMismatch(format!(
                        "parent bone '{name}' pose missing"
                    ))),
                    (None, Some(_)) => Err(WheelError::PoseMismatch(
                        "root bone given a parent pose".into(),
                    )),
                }
            }
            (true, ParentPose::Object(_)) => Err(WheelError::PoseMismatch(
                "bone wheel given an object pose".into(),
            )),
            (false, ParentPose::Bone { .. }) => Err(WheelError::PoseMismatch(
                "mesh wheel given a bone pose".into(),
            )),
        }
    }

    /// 锚点（接地点）世界矩阵
    #[inline]
    pub fn anchor_frame(&self, parent_world: &Mat4, radius: f32) -> Mat4 {
        ground_contact_frame(parent_world, self.offset.matrix(), radius)
    }

    /// 绕本地旋转轴的旋转，反转时取反
    pub fn local_rotation(&self, radians: f32) -> Quat {
        let angle = if self.invert() { -radians } else { radians };
        Quat::from_axis_angle(self.local_axis.unit(), angle)
    }

    /// 将旋转叠加在已有本地变换之后
    pub fn apply_to_local(&self, base: &Mat4, radians: f32) -> Mat4 {
        *base * Mat4::from_quat(self.local_rotation(radians))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn wheel_mesh() -> WheelMesh {
        WheelMesh::cylinder("wheel", 0.5, 0.3, 32)
    }

    fn wheel_world(location: Vec3) -> Mat4 {
        // 车轴沿世界 X
        Mat4::from_translation(location) * Mat4::from_rotation_y(FRAC_PI_2)
    }

    #[test]
    fn test_classify() {
        let armature = Armature::new("rig", Mat4::IDENTITY);
        assert_eq!(ObjectKind::classify(&RigContext::free()), ObjectKind::FreeMesh);
        assert_eq!(
            ObjectKind::classify(&RigContext::parented(Mat4::IDENTITY)),
            ObjectKind::ParentedMesh
        );
        assert_eq!(
            ObjectKind::classify(&RigContext::constrained(Mat4::IDENTITY)),
            ObjectKind::ConstrainedMesh
        );
        assert_eq!(
            ObjectKind::classify(&RigContext::bone(&armature, "b", true)),
            ObjectKind::SkinnedBone
        );
        assert_eq!(
            ObjectKind::classify(&RigContext::bone(&armature, "b", false)),
            ObjectKind::ParentedBone
        );
    }

    #[test]
    fn test_free_mesh_offset() {
        let world = wheel_world(Vec3::new(2.0, 1.0, 0.5));
        let offset = build_offset(ObjectKind::FreeMesh, &world, &RigContext::free(), 0.5).unwrap();
        // 虚拟父级在车轮下方半径处，偏移就是向上平移半径
        let t = offset.matrix().col(3).truncate();
        assert!((t - Vec3::new(0.0, 0.0, 0.5)).length() < 1e-6);
    }

    #[test]
    fn test_parented_mesh_offset() {
        let parent = Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0))
            * Mat4::from_rotation_z(FRAC_PI_2);
        let world = wheel_world(Vec3::new(1.0, 2.0, 0.5));
        let ctx = RigContext::parented(parent);
        let offset = build_offset(ObjectKind::ParentedMesh, &world, &ctx, 0.5).unwrap();

        // 父级 ∘ 偏移 还原出车轮位置
        let p = (parent * *offset.matrix()).col(3).truncate();
        assert!((p - Vec3::new(1.0, 2.0, 0.5)).length() < 1e-5);
    }

    #[test]
    fn test_small_scale_parent_offset() {
        // 毫米单位场景：父级缩放 0.001
        let parent = Mat4::from_scale(Vec3::splat(0.001));
        let world = Mat4::from_translation(Vec3::new(0.0, 0.0, 0.0005));
        let ctx = RigContext::parented(parent);
        let offset = build_offset(ObjectKind::ParentedMesh, &world, &ctx, 0.0005).unwrap();

        let t = offset.matrix().col(3).truncate();
        assert!((t - Vec3::new(0.0, 0.0, 0.5)).length() < 1e-4);
        let p = (parent * *offset.matrix()).col(3).truncate();
        assert!((p - Vec3::new(0.0, 0.0, 0.0005)).length() < 1e-7);
    }

    #[test]
    fn test_singular_parent_rejected() {
        let parent = Mat4::from_scale(Vec3::new(1.0, 0.0, 1.0));
        let world = wheel_world(Vec3::new(0.0, 0.0, 0.5));
        let ctx = RigContext::parented(parent);
        let result = build_offset(ObjectKind::ParentedMesh, &world, &ctx, 0.5);
        assert!(matches!(result, Err(WheelError::DegenerateGeometry(_))));
    }

    #[test]
    fn test_constrained_mesh_offset() {
        let target = Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0))
            * Mat4::from_rotation_z(FRAC_PI_2);
        let world = wheel_world(Vec3::new(1.0, 2.0, 0.5));
        let ctx = RigContext::constrained(target);
        let offset = build_offset(ObjectKind::ConstrainedMesh, &world, &ctx, 0.5).unwrap();

        // 约束目标 ∘ 偏移 还原出车轮位置
        let p = (target * *offset.matrix()).col(3).truncate();
        assert!((p - Vec3::new(1.0, 2.0, 0.5)).length() < 1e-5);

        let rig = WheelRig::setup(&wheel_mesh(), &world, ForwardAxisMode::Auto, &ctx).unwrap();
        assert_eq!(rig.kind, ObjectKind::ConstrainedMesh);
        assert!(rig.flags.contains(RigFlags::CHILD_OF));
        assert!(!rig.needs_auto_parent());
        assert_eq!(rig.setup_parent_world, target);
    }

    #[test]
    fn test_root_bone_offset_uses_armature() {
        let armature_world = Mat4::from_translation(Vec3::new(3.0, 4.0, 0.0));
        let mut armature = Armature::new("rig", armature_world);
        // 根骨骼，Y 轴指向世界 +X
        armature.add_bone(RigBone::new("wheel_bone").with_rest(Mat4::from_rotation_z(-FRAC_PI_2)));

        let world = wheel_world(Vec3::new(3.0, 4.0, 0.5));
        let ctx = RigContext::bone(&armature, "wheel_bone", false);
        let rig = WheelRig::setup(&wheel_mesh(), &world, ForwardAxisMode::Auto, &ctx).unwrap();
        assert!(rig.parent_bone.is_none());
        assert_eq!(rig.setup_parent_world, armature_world);

        let t = rig.offset.matrix().col(3).truncate();
        assert!((t - Vec3::new(0.0, 0.0, 0.5)).length() < 1e-5);

        let pose = ParentPose::from_armature(&armature, "wheel_bone").unwrap();
        let frame = rig.parent_frame(&pose).unwrap();
        assert!(frame.abs_diff_eq(armature_world, 1e-6));

        let anchor = rig.anchor_frame(&frame, rig.geometry.radius);
        let p = anchor.col(3).truncate();
        assert!((p - Vec3::new(3.0, 4.0, 0.0)).length() < 1e-4);

        // 根骨骼不接受父骨骼姿态
        let pose = ParentPose::Bone {
            armature_world,
            parent_pose: Some(Mat4::IDENTITY),
        };
        assert!(matches!(rig.parent_frame(&pose), Err(WheelError::PoseMismatch(_))));
    }

    #[test]
    fn test_missing_parent_context() {
        let world = wheel_world(Vec3::ZERO);
        let result = build_offset(ObjectKind::ParentedMesh, &world, &RigContext::free(), 0.5);
        assert!(matches!(result, Err(WheelError::MissingRigContext(_))));
    }

    #[test]
    fn test_bone_without_armature() {
        let ctx = RigContext {
            bone: Some("wheel"),
            ..RigContext::default()
        };
        let world = wheel_world(Vec3::ZERO);
        let result = WheelRig::setup(&wheel_mesh(), &world, ForwardAxisMode::Auto, &ctx);
        assert!(matches!(result, Err(WheelError::MissingRigContext(_))));
    }

    #[test]
    fn test_bone_not_found() {
        let armature = Armature::new("rig", Mat4::IDENTITY);
        let ctx = RigContext::bone(&armature, "missing", false);
        let world = wheel_world(Vec3::ZERO);
        let result = WheelRig::setup(&wheel_mesh(), &world, ForwardAxisMode::Auto, &ctx);
        assert!(matches!(result, Err(WheelError::MissingRigContext(_))));
    }

    #[test]
    fn test_skinned_bone_offset_uses_deformed_position() {
        let mut armature = Armature::new("rig", Mat4::IDENTITY);
        let body = armature.add_bone(RigBone::new("body"));
        armature.add_bone(
            RigBone::new("wheel_bone")
                .with_parent(body)
                .with_rest(Mat4::from_translation(Vec3::new(1.0, 0.0, 0.5)))
                .with_pose(Mat4::from_translation(Vec3::new(1.0, 3.0, 0.5))),
        );

        // 网格仍在绑定位置，骨骼已沿 Y 移动 3
        let world = wheel_world(Vec3::new(1.0, 0.0, 0.5));
        let ctx = RigContext::bone(&armature, "wheel_bone", true);
        let offset = build_offset(ObjectKind::SkinnedBone, &world, &ctx, 0.5).unwrap();
        let t = offset.matrix().col(3).truncate();
        assert!((t - Vec3::new(1.0, 3.0, 0.5)).length() < 1e-5);

        let ctx = RigContext::bone(&armature, "wheel_bone", false);
        let offset = build_offset(ObjectKind::ParentedBone, &world, &ctx, 0.5).unwrap();
        let t = offset.matrix().col(3).truncate();
        assert!((t - Vec3::new(1.0, 0.0, 0.5)).length() < 1e-5);
    }

    #[test]
    fn test_setup_free_mesh_anchor() {
        let world = wheel_world(Vec3::new(2.0, 1.0, 0.5));
        let rig =
            WheelRig::setup(&wheel_mesh(), &world, ForwardAxisMode::Auto, &RigContext::free())
                .unwrap();
        assert_eq!(rig.kind, ObjectKind::FreeMesh);
        assert!(rig.needs_auto_parent());
        assert_eq!(rig.local_axis, LocalAxis::Z);

        let parent = rig.parent_frame(&ParentPose::Object(rig.setup_parent_world)).unwrap();
        let anchor = rig.anchor_frame(&parent, rig.geometry.radius);
        let p = anchor.col(3).truncate();
        assert!((p - Vec3::new(2.0, 1.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_parent_pose_mismatch() {
        let world = wheel_world(Vec3::new(0.0, 0.0, 0.5));
        let rig =
            WheelRig::setup(&wheel_mesh(), &world, ForwardAxisMode::Auto, &RigContext::free())
                .unwrap();
        let pose = ParentPose::Bone {
            armature_world: Mat4::IDENTITY,
            parent_pose: None,
        };
        assert!(matches!(rig.parent_frame(&pose), Err(WheelError::PoseMismatch(_))));
    }

    #[test]
    fn test_bone_parent_frame() {
        let armature_world = Mat4::from_translation(Vec3::new(0.0, 5.0, 0.0));
        let mut armature = Armature::new("rig", armature_world);
        let body = armature.add_bone(
            RigBone::new("body").with_rest(Mat4::from_translation(Vec3::new(0.0, 0.0, 1.0))),
        );
        // 骨骼 Y 轴指向世界 +X（与车轴一致）
        armature.add_bone(
            RigBone::new("wheel_bone")
                .with_parent(body)
                .with_rest(Mat4::from_rotation_z(-FRAC_PI_2)),
        );

        let world = wheel_world(Vec3::new(0.0, 5.0, 0.5));
        let ctx = RigContext::bone(&armature, "wheel_bone", false);
        let rig = WheelRig::setup(&wheel_mesh(), &world, ForwardAxisMode::Auto, &ctx).unwrap();
        assert_eq!(rig.parent_bone.as_deref(), Some("body"));
        assert_eq!(rig.local_axis, LocalAxis::Y);
        assert!(!rig.invert());

        let pose = ParentPose::from_armature(&armature, "wheel_bone").unwrap();
        let frame = rig.parent_frame(&pose).unwrap();
        let p = frame.col(3).truncate();
        assert!((p - Vec3::new(0.0, 5.0, 1.0)).length() < 1e-5);
    }

    #[test]
    fn test_local_rotation_inversion() {
        let world = wheel_world(Vec3::new(0.0, 0.0, 0.5));
        let mut rig =
            WheelRig::setup(&wheel_mesh(), &world, ForwardAxisMode::Auto, &RigContext::free())
                .unwrap();
        let q = rig.local_rotation(0.5);
        rig.flags.insert(RigFlags::INVERT_ROTATION);
        let qi = rig.local_rotation(0.5);
        assert!((q * qi).is_near_identity());

        let m = rig.apply_to_local(&Mat4::IDENTITY, 0.0);
        assert!(m.abs_diff_eq(Mat4::IDENTITY, 1e-6));
    }
}
