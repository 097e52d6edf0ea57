//! 几何分析 - 从网格包围盒推断车轮的滚动轴
//!
//! 核心设计思想：
//! - WheelMesh: 设置时的网格快照（本地顶点、面）
//! - analyzer: 滚动轴（世界）、前向轴、本地旋转轴与反转标志
//! - 车轮只在水平面上滚动，世界滚动轴只可能是 X 或 Y

mod analyzer;
mod mesh;

pub use analyzer::{
    resolve_local_axis, resolve_local_axis_bone, resolve_rolling_axis, WheelGeometryInfo,
};
pub use mesh::{orientation_normalized, Dimensions, MeshFace, WheelMesh};

use glam::Vec3;

// ============================================================================
// 轴类型定义
// ============================================================================

/// 世界滚动轴（车轴方向）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WorldAxis {
    X,
    Y,
}

impl WorldAxis {
    /// 世界空间单位向量
    #[inline]
    pub fn unit(self) -> Vec3 {
        match self {
            WorldAxis::X => Vec3::X,
            WorldAxis::Y => Vec3::Y,
        }
    }

    /// 与滚动轴互补的前进轴
    #[inline]
    pub fn forward(self) -> ForwardAxis {
        match self {
            WorldAxis::X => ForwardAxis::Y,
            WorldAxis::Y => ForwardAxis::X,
        }
    }
}

/// 前进轴
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ForwardAxis {
    #[default]
    X,
    Y,
}

impl ForwardAxis {
    /// 与前进轴互补的滚动轴
    #[inline]
    pub fn rolling_axis(self) -> WorldAxis {
        match self {
            ForwardAxis::X => WorldAxis::Y,
            ForwardAxis::Y => WorldAxis::X,
        }
    }
}

/// 前进轴检测模式
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ForwardAxisMode {
    /// 根据几何自动检测（默认）
    #[default]
    Auto,
    /// 车轮沿世界 X 轴前进
    X,
    /// 车轮沿世界 Y 轴前进
    Y,
}

/// 物体本地坐标系中的旋转轴
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LocalAxis {
    X,
    Y,
    Z,
}

impl LocalAxis {
    pub const ALL: [LocalAxis; 3] = [LocalAxis::X, LocalAxis::Y, LocalAxis::Z];

    /// 轴索引 (0, 1, 2)
    #[inline]
    pub fn index(self) -> usize {
        match self {
            LocalAxis::X => 0,
            LocalAxis::Y => 1,
            LocalAxis::Z => 2,
        }
    }

    /// 本地单位向量
    #[inline]
    pub fn unit(self) -> Vec3 {
        match self {
            LocalAxis::X => Vec3::X,
            LocalAxis::Y => Vec3::Y,
            LocalAxis::Z => Vec3::Z,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_complements() {
        assert_eq!(WorldAxis::X.forward(), ForwardAxis::Y);
        assert_eq!(WorldAxis::Y.forward(), ForwardAxis::X);
        assert_eq!(ForwardAxis::X.rolling_axis(), WorldAxis::Y);
        assert_eq!(ForwardAxis::Y.rolling_axis(), WorldAxis::X);
    }

    #[test]
    fn test_local_axis_index() {
        for (i, axis) in LocalAxis::ALL.iter().enumerate() {
            assert_eq!(axis.index(), i);
        }
        assert_eq!(LocalAxis::Z.unit(), Vec3::Z);
    }
}
