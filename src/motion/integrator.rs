//! 滚动积分器
//!
//! 纯函数，除携带的“上一位置/上一旋转”快照外没有任何状态。
//! 调用方必须保证每次世界更新只对同一车轮求值一次，
//! 位置不变时重复调用会重复累加。

use glam::{Mat4, Vec3};

use super::state::{RotationPower, WheelTransformState};
use crate::config::get_config;
use crate::geometry::ForwardAxis;

/// 单次积分结果
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RollStep {
    /// 本次增量（弧度）
    pub delta_radians: f32,
    /// 新的累积旋转（弧度）
    pub rotation: f32,
    /// 锚点移动距离
    pub traveled: f32,
    /// 位移方向与前进方向夹角的余弦（带符号）
    pub dot_scalar: f32,
}

/// 锚点矩阵中的前进向量：X 取第 0 列，Y 取第 1 列的负值
#[inline]
fn forward_column(anchor: &Mat4, forward: ForwardAxis) -> Vec3 {
    match forward {
        ForwardAxis::X => anchor.col(0).truncate(),
        ForwardAxis::Y => -anchor.col(1).truncate(),
    }
}

/// 积分一次滚动
///
/// # 参数
/// - `state`: 上一次的运动状态
/// - `anchor_world`: 锚点（接地点）世界矩阵
/// - `forward`: 前进轴
/// - `radius`: 半径，小于最小值时钳制
/// - `power`: 旋转强度
///
/// 前进列向量的长度保留了父级链上的缩放，缩放会按比例影响滚动速度。
pub fn integrate(
    state: &WheelTransformState,
    anchor_world: &Mat4,
    forward: ForwardAxis,
    radius: f32,
    power: RotationPower,
) -> (RollStep, WheelTransformState) {
    let config = get_config();

    let current_position = anchor_world.col(3).truncate();

    let forward_vector = forward_column(anchor_world, forward);
    let forward_mag = forward_vector.length().max(config.forward_epsilon);
    let forward_normalized = forward_vector / forward_mag;

    let displacement = current_position - state.previous_position;
    let traveled = displacement.length();

    // 静止时位移方向无定义，不累加距离
    let dot_scalar = if traveled == 0.0 {
        0.0
    } else {
        (displacement / traveled).dot(forward_normalized)
    };

    let distance = traveled * dot_scalar * power.value();
    let radius = config.clamp_radius(radius);
    let delta_radians = distance / (radius * forward_mag);
    let rotation = delta_radians + state.accumulated_rotation;

    let step = RollStep {
        delta_radians,
        rotation,
        traveled,
        dot_scalar,
    };
    let next = WheelTransformState {
        previous_position: current_position,
        accumulated_rotation: rotation,
    };
    (step, next)
}

impl WheelTransformState {
    /// 原地积分一次，返回本次结果
    pub fn advance(
        &mut self,
        anchor_world: &Mat4,
        forward: ForwardAxis,
        radius: f32,
        power: RotationPower,
    ) -> RollStep {
        let (step, next) = integrate(self, anchor_world, forward, radius, power);
        *self = next;
        step
    }
}
