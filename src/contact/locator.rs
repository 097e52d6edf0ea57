//! 接地定位器与自动父级的线框坐标
//!
//! 只生成坐标，绘制交给宿主。

use glam::{Mat4, Vec3};

use crate::geometry::{orientation_normalized, ForwardAxis};

/// 定位器十字线的竖直半长
const CROSS_HEIGHT: f32 = 0.125;
/// 定位器次轴半长
const CROSS_SECONDARY: f32 = 0.125;

/// 接地定位器的线段列表（每两个点一条线段）
///
/// 主轴沿前进方向，两端带箭头。
pub fn locator_lines(forward: ForwardAxis, scale: f32) -> Vec<Vec3> {
    let z = CROSS_HEIGHT;
    let a2 = CROSS_SECONDARY;

    // 以 X 前进为基准
    let base = [
        // 十字线
        (0.5, 0.0, 0.0), (-0.5, 0.0, 0.0),
        (0.0, 0.0, z), (0.0, 0.0, -z),
        (0.0, a2, 0.0), (0.0, -a2, 0.0),
        // 箭头
        (0.5, 0.0, 0.0), (0.35, -0.125, 0.0),
        (0.5, 0.0, 0.0), (0.35, 0.125, 0.0),
        (-0.5, 0.0, 0.0), (-0.35, -0.125, 0.0),
        (-0.5, 0.0, 0.0), (-0.35, 0.125, 0.0),
    ];

    base.iter()
        .map(|&(x, y, z)| {
            let p = match forward {
                ForwardAxis::X => Vec3::new(x, y, z),
                ForwardAxis::Y => Vec3::new(y, x, z),
            };
            p * scale
        })
        .collect()
}

/// 用去除缩放后的矩阵变换坐标
pub fn transform_coords(matrix: &Mat4, coords: &[Vec3]) -> Vec<Vec3> {
    let rotation = orientation_normalized(matrix);
    let translation = matrix.col(3).truncate();
    coords.iter().map(|c| rotation * *c + translation).collect()
}

/// 自动父级的箭头轮廓（闭合折线）
///
/// 尺寸随车轮宽度与长度缩放，箭头沿前进方向。
pub fn auto_parent_outline(forward: ForwardAxis, width: f32, length: f32) -> Vec<Vec3> {
    let outer_length = 1.3 * (length / 2.0);
    let outer_width = 1.1 * width;
    let inner_width = 0.7 * width;
    let inner_length = 0.4 * (length / 2.0);

    let points = [
        (outer_length, 0.0),
        (inner_length, -outer_width),
        (inner_length, -inner_width),
        (-inner_length, -inner_width),
        (-inner_length, -outer_width),
        (-outer_length, 0.0),
        (-inner_length, outer_width),
        (-inner_length, inner_width),
        (inner_length, inner_width),
        (inner_length, outer_width),
        (outer_length, 0.0),
    ];

    points
        .iter()
        .map(|&(a, b)| match forward {
            ForwardAxis::X => Vec3::new(a, b, 0.0),
            ForwardAxis::Y => Vec3::new(b, a, 0.0),
        })
        .collect()
}
