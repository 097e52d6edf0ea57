//! Roll Engine - 运动驱动的车轮自动旋转引擎
//!
//! 根据物体自身的变换历史推断滚动距离，并转换为绕本地滚动轴的旋转。
//!
//! 模块划分：
//! - geometry: 网格快照、滚动轴/前向轴/本地轴解析
//! - contact: 接地高度、接地变换、定位器线框
//! - motion: 每帧增量滚动积分
//! - rig: 父级/偏移变换链（网格、约束、骨骼、蒙皮）
//! - registry: 自动化车轮集合、辅助对象 bundle、游离数据清理

pub mod config;
pub mod contact;
pub mod geometry;
pub mod motion;
pub mod registry;
pub mod rig;

pub use config::{get_config, reset_config, set_config, EngineConfig};
pub use contact::{contact_radius, ground_contact_frame, ground_elevation};
pub use geometry::{
    resolve_local_axis, resolve_rolling_axis, Dimensions, ForwardAxis, ForwardAxisMode,
    LocalAxis, MeshFace, WheelGeometryInfo, WheelMesh, WorldAxis,
};
pub use motion::{integrate, RollStep, RotationPower, WheelTransformState};
pub use registry::{
    AutomationState, BundleId, ReconcileReport, RollOutput, SetupRequest, StrayDataReconciler,
    TargetRef, WheelHandle, WheelRegistry,
};
pub use rig::{
    build_offset, Armature, AxisOffsetTransform, ObjectKind, ParentPose, RigBone, RigContext,
    RigFlags, WheelRig,
};

use thiserror::Error;

/// 引擎错误
#[derive(Debug, Error)]
pub enum WheelError {
    /// 包围盒在所有候选轴上尺寸为零，无法解析滚动轴
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// 骨骼设置缺少骨架或父骨骼
    #[error("Missing rig context: {0}")]
    MissingRigContext(String),

    /// 目标未被自动化
    #[error("Not automated: {0}")]
    NotAutomated(String),

    /// 每帧父级姿态与设置时的类型不符
    #[error("Parent pose mismatch: {0}")]
    PoseMismatch(String),

    /// 目标已被外部删除，只剩辅助数据
    #[error("Orphaned automation: {0}")]
    Orphaned(String),
}

/// 结果类型
pub type Result<T> = std::result::Result<T, WheelError>;

#[cfg(test)]
pub(crate) fn init_test_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
