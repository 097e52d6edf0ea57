//! Bundle - 一个自动化目标及其所有辅助对象
//!
//! 同一 bundle 的对象共享唯一的 BundleId。

use std::fmt;

use glam::Vec3;

// ============================================================================
// 目标引用
// ============================================================================

/// 被驱动目标（宿主场景中的网格对象或骨骼）
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TargetRef {
    /// 网格对象
    Object(String),
    /// 骨架中的骨骼
    Bone { armature: String, bone: String },
}

impl TargetRef {
    pub fn object(name: impl Into<String>) -> Self {
        TargetRef::Object(name.into())
    }

    pub fn bone(armature: impl Into<String>, bone: impl Into<String>) -> Self {
        TargetRef::Bone {
            armature: armature.into(),
            bone: bone.into(),
        }
    }

    /// 对象名或骨骼名
    pub fn name(&self) -> &str {
        match self {
            TargetRef::Object(name) => name,
            TargetRef::Bone { bone, .. } => bone,
        }
    }

    #[inline]
    pub fn is_bone(&self) -> bool {
        matches!(self, TargetRef::Bone { .. })
    }
}

impl fmt::Display for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetRef::Object(name) => write!(f, "{name}"),
            TargetRef::Bone { armature, bone } => write!(f, "{armature}:{bone}"),
        }
    }
}

// ============================================================================
// Bundle 标识
// ============================================================================

/// Bundle 唯一标识：roll_<序号>_<目标名>
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BundleId(String);

impl BundleId {
    pub(crate) fn generate(sequence: u64, target: &TargetRef) -> Self {
        Self(format!("roll_{}_{}", sequence, target.name()))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BundleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// 辅助对象
// ============================================================================

/// 辅助对象类型
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AuxiliaryKind {
    /// 旋转辅助（承载输出旋转通道）
    Rotator,
    /// 自动生成的父级（独立网格）
    AutoParent,
}

impl AuxiliaryKind {
    /// 名称后缀
    pub fn suffix(self) -> &'static str {
        match self {
            AuxiliaryKind::Rotator => "roll_rotator",
            AuxiliaryKind::AutoParent => "roll_auto_parent",
        }
    }
}

/// 辅助对象
#[derive(Clone, Debug)]
pub struct Auxiliary {
    /// 名称：<目标名>.<后缀>
    pub name: String,
    /// 类型
    pub kind: AuxiliaryKind,
    /// 线框轮廓（闭合折线，空表示不绘制）
    pub outline: Vec<Vec3>,
}

impl Auxiliary {
    pub fn new(target: &TargetRef, kind: AuxiliaryKind) -> Self {
        Self {
            name: format!("{}.{}", target.name(), kind.suffix()),
            kind,
            outline: Vec::new(),
        }
    }

    pub fn with_outline(mut self, outline: Vec<Vec3>) -> Self {
        self.outline = outline;
        self
    }
}

/// 一个自动化目标的全部数据
#[derive(Clone, Debug)]
pub struct Bundle {
    pub id: BundleId,
    pub target: TargetRef,
    pub auxiliaries: Vec<Auxiliary>,
}

impl Bundle {
    pub fn auxiliary(&self, kind: AuxiliaryKind) -> Option<&Auxiliary> {
        self.auxiliaries.iter().find(|aux| aux.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundle_id_format() {
        let id = BundleId::generate(7, &TargetRef::bone("truck", "wheel_FL"));
        assert_eq!(id.as_str(), "roll_7_wheel_FL");
    }

    #[test]
    fn test_auxiliary_name() {
        let aux = Auxiliary::new(&TargetRef::object("Tire"), AuxiliaryKind::AutoParent);
        assert_eq!(aux.name, "Tire.roll_auto_parent");
        assert!(aux.outline.is_empty());
    }

    #[test]
    fn test_target_display() {
        assert_eq!(TargetRef::object("Tire").to_string(), "Tire");
        assert_eq!(TargetRef::bone("rig", "wheel").to_string(), "rig:wheel");
    }
}
