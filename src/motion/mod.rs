//! 滚动积分
//!
//! 每次求值：锚点位移投影到前进方向 → 滚动距离 → 除以半径得到弧度 → 累加。
//! 累积旋转不做 ±π 回绕，反向运动时才能正确抵消。

mod integrator;
mod state;

pub use integrator::{integrate, RollStep};
pub use state::{RotationPower, WheelTransformState};
