//! 游离数据清理
//!
//! 用户在宿主中直接删除了被驱动的网格或骨骼后，辅助对象会失去主目标。
//! 这里只负责找出它们，不能恢复已删除的目标。

use std::collections::BTreeMap;

use super::bundle::{AuxiliaryKind, BundleId, TargetRef};

/// 对象在 bundle 中的角色
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemRole {
    /// 主目标
    Target,
    /// 辅助对象
    Auxiliary(AuxiliaryKind),
}

/// 被跟踪的对象
#[derive(Clone, Debug)]
pub struct TrackedItem {
    pub bundle: BundleId,
    pub name: String,
    pub role: ItemRole,
}

/// 失去主目标的辅助对象
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StrayItem {
    pub bundle: BundleId,
    pub name: String,
    pub kind: AuxiliaryKind,
}

/// 指向不存在骨骼的驱动绑定
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaleBinding {
    pub armature: String,
    pub bone: String,
}

/// 清理报告
#[derive(Clone, Debug, Default)]
pub struct ReconcileReport {
    /// 需要删除的辅助对象
    pub removed: Vec<StrayItem>,
    /// 失去主目标的 bundle
    pub orphaned_bundles: Vec<BundleId>,
    /// 骨架上需要移除的失效绑定
    pub stale_bindings: Vec<StaleBinding>,
}

impl ReconcileReport {
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.removed.is_empty()
            && self.orphaned_bundles.is_empty()
            && self.stale_bindings.is_empty()
    }
}

/// 游离数据清理器
pub struct StrayDataReconciler;

impl StrayDataReconciler {
    /// 按 bundle 分组，没有主目标的 bundle 的所有辅助对象都是游离数据
    ///
    /// 结果按 bundle id 排序，与输入顺序无关。
    pub fn find_strays(items: &[TrackedItem]) -> Vec<StrayItem> {
        let mut bundles: BTreeMap<&BundleId, (bool, Vec<&TrackedItem>)> = BTreeMap::new();

        for item in items {
            let entry = bundles.entry(&item.bundle).or_insert_with(|| (false, Vec::new()));
            match item.role {
                ItemRole::Target => entry.0 = true,
                ItemRole::Auxiliary(_) => entry.1.push(item),
            }
        }

        bundles
            .into_iter()
            .filter(|(_, (has_target, _))| !has_target)
            .flat_map(|(_, (_, others))| others)
            .filter_map(|item| match item.role {
                ItemRole::Auxiliary(kind) => Some(StrayItem {
                    bundle: item.bundle.clone(),
                    name: item.name.clone(),
                    kind,
                }),
                ItemRole::Target => None,
            })
            .collect()
    }

    /// 找出骨骼已不存在的驱动绑定
    pub fn stale_bone_bindings<'a, I, F>(bindings: I, bone_exists: F) -> Vec<StaleBinding>
    where
        I: IntoIterator<Item = &'a TargetRef>,
        F: Fn(&str, &str) -> bool,
    {
        bindings
            .into_iter()
            .filter_map(|target| match target {
                TargetRef::Bone { armature, bone } if !bone_exists(armature, bone) => {
                    Some(StaleBinding {
                        armature: armature.clone(),
                        bone: bone.clone(),
                    })
                }
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(bundle: &BundleId, name: &str, role: ItemRole) -> TrackedItem {
        TrackedItem {
            bundle: bundle.clone(),
            name: name.to_string(),
            role,
        }
    }

    #[test]
    fn test_find_strays() {
        let alive = BundleId::generate(1, &TargetRef::object("A"));
        let dead = BundleId::generate(2, &TargetRef::object("B"));
        let items = vec![
            item(&dead, "B.roll_rotator", ItemRole::Auxiliary(AuxiliaryKind::Rotator)),
            item(&alive, "A", ItemRole::Target),
            item(&alive, "A.roll_rotator", ItemRole::Auxiliary(AuxiliaryKind::Rotator)),
            item(&dead, "B.roll_auto_parent", ItemRole::Auxiliary(AuxiliaryKind::AutoParent)),
        ];

        let strays = StrayDataReconciler::find_strays(&items);
        assert_eq!(strays.len(), 2);
        assert!(strays.iter().all(|s| s.bundle == dead));
        assert!(strays.iter().any(|s| s.kind == AuxiliaryKind::AutoParent));
    }

    #[test]
    fn test_no_strays_when_all_targets_present() {
        let id = BundleId::generate(1, &TargetRef::object("A"));
        let items = vec![
            item(&id, "A.roll_rotator", ItemRole::Auxiliary(AuxiliaryKind::Rotator)),
            item(&id, "A", ItemRole::Target),
        ];
        assert!(StrayDataReconciler::find_strays(&items).is_empty());
    }

    #[test]
    fn test_stale_bone_bindings() {
        let targets = vec![
            TargetRef::bone("rig", "wheel_L"),
            TargetRef::bone("rig", "wheel_R"),
            TargetRef::object("Tire"),
        ];
        let stale = StrayDataReconciler::stale_bone_bindings(&targets, |_, bone| bone == "wheel_L");
        assert_eq!(
            stale,
            vec![StaleBinding {
                armature: "rig".to_string(),
                bone: "wheel_R".to_string()
            }]
        );
    }
}
