//! 每个车轮的运动状态

use glam::Vec3;

use crate::config::get_config;

/// 车轮运动状态（每帧更新一次）
///
/// 第 n 帧的累积旋转只取决于第 n-1 帧的累积旋转和两帧锚点之间的位移。
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WheelTransformState {
    /// 上一次求值时的锚点世界位置
    pub previous_position: Vec3,
    /// 累积滚动旋转（弧度，不回绕）
    pub accumulated_rotation: f32,
}

impl WheelTransformState {
    /// 设置时创建：旋转归零，记录当前锚点位置
    pub fn new(anchor_position: Vec3) -> Self {
        Self {
            previous_position: anchor_position,
            accumulated_rotation: 0.0,
        }
    }

    /// 清零累积旋转，保留位置
    #[inline]
    pub fn clear_rotation(&mut self) {
        self.accumulated_rotation = 0.0;
    }
}

impl Default for WheelTransformState {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}

/// 旋转强度
///
/// 在换算成角度之前乘到滚动距离上。0 = 不旋转，负数 = 反向（与几何反转无关）。
/// 软范围 [-5, 5] 仅作提示，不做钳制。
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RotationPower(pub f32);

impl RotationPower {
    #[inline]
    pub fn value(self) -> f32 {
        self.0
    }

    /// 是否超出软范围
    pub fn is_beyond_soft_range(self) -> bool {
        !get_config().in_soft_power_range(self.0)
    }
}

impl Default for RotationPower {
    fn default() -> Self {
        Self(get_config().default_rotation_power)
    }
}

impl From<f32> for RotationPower {
    fn from(value: f32) -> Self {
        Self(value)
    }
}
