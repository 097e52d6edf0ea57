//! 车轮引擎配置
//!
//! 所有参数扁平化，直接在代码中修改默认值即可。

use once_cell::sync::Lazy;
use std::sync::RwLock;

/// 引擎配置（扁平化，不嵌套）
#[derive(Debug, Clone)]
pub struct EngineConfig {
    // ========== 半径 ==========
    /// 最小半径，默认 0.001
    /// 小于此值的半径会被钳制，避免除零
    pub radius_min: f32,
    /// 前向列向量长度下限，默认 1e-6
    pub forward_epsilon: f32,

    // ========== 几何分析 ==========
    /// X/Y 尺寸相等判定容差，默认 1e-6（默认圆柱体的情况）
    pub extent_tolerance: f32,
    /// 端面最少顶点数，默认 5（多于 4 个顶点的面视为轮毂端面）
    pub cap_min_vertices: usize,
    /// 端面法线与轴对齐阈值（绝对点积），默认 0.5
    pub cap_axis_threshold: f32,
    /// 是否忽略 X/Y 尺寸差（假设车轮在水平面上滚动），默认 true
    pub ignore_vertical_pair: bool,

    // ========== 旋转强度 ==========
    /// 默认旋转强度，默认 1.0
    pub default_rotation_power: f32,
    /// 旋转强度软下限，默认 -5.0（仅用于 UI 提示，不做钳制）
    pub rotation_power_soft_min: f32,
    /// 旋转强度软上限，默认 5.0
    pub rotation_power_soft_max: f32,

    // ========== 可视化 ==========
    /// 接地定位器全局缩放，默认 1.0
    pub locator_scale: f32,

    // ========== 调试 ==========
    /// 是否输出调试日志，默认 false
    pub debug_log: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            // ====== 半径 ======
            // 与宿主属性的 min=0.001 一致
            radius_min: 0.001,
            forward_epsilon: 1e-6,

            // ====== 几何分析 ======
            extent_tolerance: 1e-6,
            cap_min_vertices: 5,
            cap_axis_threshold: 0.5,
            ignore_vertical_pair: true,

            // ====== 旋转强度 ======
            // 1 = 正常，0 = 不旋转，负数 = 反向
            default_rotation_power: 1.0,
            rotation_power_soft_min: -5.0,
            rotation_power_soft_max: 5.0,

            // ====== 可视化 ======
            locator_scale: 1.0,

            // ====== 调试 ======
            debug_log: false,
        }
    }
}

impl EngineConfig {
    /// 将半径钳制到最小值以上
    #[inline]
    pub fn clamp_radius(&self, radius: f32) -> f32 {
        if radius.is_nan() || radius < self.radius_min {
            self.radius_min
        } else {
            radius
        }
    }

    /// 旋转强度是否在软范围内
    #[inline]
    pub fn in_soft_power_range(&self, power: f32) -> bool {
        power >= self.rotation_power_soft_min && power <= self.rotation_power_soft_max
    }
}

/// 全局配置实例
static ENGINE_CONFIG: Lazy<RwLock<EngineConfig>> = Lazy::new(|| {
    RwLock::new(EngineConfig::default())
});

/// 获取当前配置（只读）
pub fn get_config() -> EngineConfig {
    ENGINE_CONFIG.read().unwrap_or_else(|e| e.into_inner()).clone()
}

/// 手动设置配置（用于运行时调试）
pub fn set_config(config: EngineConfig) {
    *ENGINE_CONFIG.write().unwrap_or_else(|e| e.into_inner()) = config;
}

/// 重置为默认配置
pub fn reset_config() {
    *ENGINE_CONFIG.write().unwrap_or_else(|e| e.into_inner()) = EngineConfig::default();
}
