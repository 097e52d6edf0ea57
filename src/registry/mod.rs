//! 车轮注册表 - 集成层持有的自动化车轮集合
//!
//! 设计原则：
//! - 集合由调用方显式持有，设置时加入、移除时删除，迭代顺序不影响结果
//! - 每个车轮的状态只属于自己，车轮之间没有求值顺序依赖
//! - 同一求值轮次内每个车轮最多积分一次，重复请求返回本轮结果

mod bundle;
mod reconcile;

pub use bundle::{Auxiliary, AuxiliaryKind, Bundle, BundleId, TargetRef};
pub use reconcile::{
    ItemRole, ReconcileReport, StaleBinding, StrayDataReconciler, StrayItem, TrackedItem,
};

use std::collections::HashMap;

use glam::{Mat4, Quat, Vec3};

use crate::config::get_config;
use crate::contact::{auto_parent_outline, locator_lines, transform_coords};
use crate::geometry::{ForwardAxisMode, WheelMesh};
use crate::motion::{RotationPower, WheelTransformState};
use crate::rig::{ParentPose, RigContext, WheelRig};
use crate::{Result, WheelError};

// ============================================================================
// 公共类型
// ============================================================================

/// 车轮句柄
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WheelHandle(u64);

impl WheelHandle {
    #[inline]
    pub fn id(self) -> u64 {
        self.0
    }
}

/// 目标的自动化状态
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AutomationState {
    /// 未自动化
    Unautomated,
    /// 已自动化
    Automated(WheelHandle),
    /// 目标已被外部删除，只剩辅助数据（等待清理）
    Orphaned(BundleId),
}

/// 用户可调参数
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WheelSettings {
    /// 半径（已钳制）
    pub radius: f32,
    /// 旋转强度
    pub rotation_power: RotationPower,
    /// 手动旋转偏移（弧度），只叠加在输出上，不参与积分
    pub manual_offset: f32,
}

/// 单次求值输出
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RollOutput {
    /// 累积自动旋转（弧度）
    pub rotation: f32,
    /// 本次增量（弧度）
    pub delta: f32,
    /// 自动旋转 + 手动偏移
    pub applied_rotation: f32,
    /// 绕本地旋转轴的旋转（已处理反转）
    pub local_rotation: Quat,
}

impl Default for RollOutput {
    fn default() -> Self {
        Self {
            rotation: 0.0,
            delta: 0.0,
            applied_rotation: 0.0,
            local_rotation: Quat::IDENTITY,
        }
    }
}

/// 设置请求
#[derive(Clone, Copy, Debug)]
pub struct SetupRequest<'a> {
    /// 被驱动目标
    pub target: &'a TargetRef,
    /// 车轮网格（骨骼目标时为参考网格）
    pub mesh: &'a WheelMesh,
    /// 网格世界矩阵
    pub wheel_world: Mat4,
    /// 前进轴检测模式
    pub forward_mode: ForwardAxisMode,
    /// 绑定上下文
    pub context: RigContext<'a>,
}

// ============================================================================
// 注册表条目
// ============================================================================

#[derive(Clone, Debug)]
struct WheelEntry {
    bundle: Bundle,
    rig: WheelRig,
    settings: WheelSettings,
    state: WheelTransformState,
    last_pass: Option<u64>,
    last_output: RollOutput,
    orphaned: bool,
}

impl WheelEntry {
    fn output(&self, delta: f32) -> RollOutput {
        let rotation = self.state.accumulated_rotation;
        let applied_rotation = rotation + self.settings.manual_offset;
        RollOutput {
            rotation,
            delta,
            applied_rotation,
            local_rotation: self.rig.local_rotation(applied_rotation),
        }
    }
}

// ============================================================================
// 注册表
// ============================================================================

/// 车轮注册表
#[derive(Debug, Default)]
pub struct WheelRegistry {
    entries: HashMap<WheelHandle, WheelEntry>,
    by_target: HashMap<TargetRef, WheelHandle>,
    next_id: u64,
    pass: u64,
}

impl WheelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 句柄按创建顺序排列
    pub fn handles(&self) -> Vec<WheelHandle> {
        let mut handles: Vec<WheelHandle> = self.entries.keys().copied().collect();
        handles.sort_unstable();
        handles
    }

    pub fn handle_of(&self, target: &TargetRef) -> Option<WheelHandle> {
        self.by_target.get(target).copied()
    }

    pub fn rig(&self, handle: WheelHandle) -> Option<&WheelRig> {
        self.entries.get(&handle).map(|e| &e.rig)
    }

    pub fn state(&self, handle: WheelHandle) -> Option<&WheelTransformState> {
        self.entries.get(&handle).map(|e| &e.state)
    }

    pub fn settings(&self, handle: WheelHandle) -> Option<&WheelSettings> {
        self.entries.get(&handle).map(|e| &e.settings)
    }

    pub fn bundle(&self, handle: WheelHandle) -> Option<&Bundle> {
        self.entries.get(&handle).map(|e| &e.bundle)
    }

    /// 目标的自动化状态
    pub fn automation_state(&self, target: &TargetRef) -> AutomationState {
        match self.by_target.get(target).and_then(|h| self.entries.get(h).map(|e| (h, e))) {
            Some((_, entry)) if entry.orphaned => {
                AutomationState::Orphaned(entry.bundle.id.clone())
            }
            Some((handle, _)) => AutomationState::Automated(*handle),
            None => AutomationState::Unautomated,
        }
    }

    // ========================================
    // 设置 / 移除
    // ========================================

    /// 自动化一个目标
    ///
    /// 目标已被自动化时移除旧的自动化，并返回旧 bundle，
    /// 宿主据此删除旧的辅助对象。
    /// 设置失败时不改动任何状态：未自动化的目标保持未自动化，
    /// 已自动化的目标保留原有自动化。
    pub fn automate(&mut self, request: SetupRequest<'_>) -> Result<(WheelHandle, Option<Bundle>)> {
        let config = get_config();
        let target = request.target;

        let rig = match WheelRig::setup(
            request.mesh,
            &request.wheel_world,
            request.forward_mode,
            &request.context,
        ) {
            Ok(rig) => rig,
            Err(e) => {
                log::warn!("[wheel] '{}' 自动化失败: {}", target, e);
                return Err(e);
            }
        };

        let replaced = if self.by_target.contains_key(target) {
            Some(self.remove_automation(target)?)
        } else {
            None
        };

        let radius = rig.geometry.radius;
        let anchor = rig.anchor_frame(&rig.setup_parent_world, radius);
        let state = WheelTransformState::new(anchor.col(3).truncate());

        let sequence = self.next_id;
        self.next_id += 1;
        let handle = WheelHandle(sequence);

        let mut auxiliaries = vec![Auxiliary::new(target, AuxiliaryKind::Rotator)];
        if rig.needs_auto_parent() {
            let outline =
                auto_parent_outline(rig.forward_axis(), rig.geometry.width, rig.geometry.length);
            auxiliaries
                .push(Auxiliary::new(target, AuxiliaryKind::AutoParent).with_outline(outline));
        }
        let bundle = Bundle {
            id: BundleId::generate(sequence, target),
            target: target.clone(),
            auxiliaries,
        };

        if let Some(old) = &replaced {
            log::info!("[wheel] '{}' 重新自动化，替换 {}", target, old.id);
        }
        if config.debug_log {
            log::info!(
                "[wheel] '{}' 自动化完成: bundle={}, 半径={:.4}, 辅助对象={}",
                target, bundle.id, radius, bundle.auxiliaries.len()
            );
        }

        let mut entry = WheelEntry {
            bundle,
            rig,
            settings: WheelSettings {
                radius,
                rotation_power: RotationPower(config.default_rotation_power),
                manual_offset: 0.0,
            },
            state,
            last_pass: None,
            last_output: RollOutput::default(),
            orphaned: false,
        };
        entry.last_output = entry.output(0.0);

        self.entries.insert(handle, entry);
        self.by_target.insert(target.clone(), handle);
        Ok((handle, replaced))
    }

    /// 移除自动化，返回其 bundle（宿主据此删除辅助对象）
    pub fn remove_automation(&mut self, target: &TargetRef) -> Result<Bundle> {
        let handle = self
            .by_target
            .remove(target)
            .ok_or_else(|| WheelError::NotAutomated(target.to_string()))?;
        let entry = self
            .entries
            .remove(&handle)
            .ok_or_else(|| WheelError::NotAutomated(target.to_string()))?;

        if get_config().debug_log {
            log::info!("[wheel] '{}' 已移除自动化 ({})", target, entry.bundle.id);
        }
        Ok(entry.bundle)
    }

    /// 标记目标已被外部删除
    pub fn mark_orphaned(&mut self, target: &TargetRef) -> Result<()> {
        let entry = self
            .by_target
            .get(target)
            .and_then(|h| self.entries.get_mut(h))
            .ok_or_else(|| WheelError::NotAutomated(target.to_string()))?;
        entry.orphaned = true;
        Ok(())
    }

    // ========================================
    // 求值
    // ========================================

    /// 开始新的求值轮次（一次世界更新）
    pub fn begin_pass(&mut self) -> u64 {
        self.pass += 1;
        self.pass
    }

    #[inline]
    pub fn current_pass(&self) -> u64 {
        self.pass
    }

    fn entry_mut(&mut self, handle: WheelHandle) -> Result<&mut WheelEntry> {
        let entry = self
            .entries
            .get_mut(&handle)
            .ok_or_else(|| WheelError::NotAutomated(format!("handle {}", handle.0)))?;
        if entry.orphaned {
            return Err(WheelError::Orphaned(entry.bundle.target.to_string()));
        }
        Ok(entry)
    }

    fn entry(&self, handle: WheelHandle) -> Result<&WheelEntry> {
        let entry = self
            .entries
            .get(&handle)
            .ok_or_else(|| WheelError::NotAutomated(format!("handle {}", handle.0)))?;
        if entry.orphaned {
            return Err(WheelError::Orphaned(entry.bundle.target.to_string()));
        }
        Ok(entry)
    }

    /// 求值一个车轮
    ///
    /// 本轮已求值过时直接返回本轮结果，不再积分。
    pub fn evaluate(&mut self, handle: WheelHandle, pose: &ParentPose) -> Result<RollOutput> {
        let pass = self.pass;
        let entry = self.entry_mut(handle)?;

        if entry.last_pass == Some(pass) {
            return Ok(entry.last_output);
        }

        let parent = entry.rig.parent_frame(pose)?;
        let anchor = entry.rig.anchor_frame(&parent, entry.settings.radius);
        let step = entry.state.advance(
            &anchor,
            entry.rig.forward_axis(),
            entry.settings.radius,
            entry.settings.rotation_power,
        );

        let output = entry.output(step.delta_radians);
        entry.last_pass = Some(pass);
        entry.last_output = output;
        Ok(output)
    }

    /// 按目标求值
    pub fn evaluate_target(&mut self, target: &TargetRef, pose: &ParentPose) -> Result<RollOutput> {
        let handle = self
            .handle_of(target)
            .ok_or_else(|| WheelError::NotAutomated(target.to_string()))?;
        self.evaluate(handle, pose)
    }

    // ========================================
    // 参数
    // ========================================

    /// 累积旋转清零
    pub fn clear_rotation(&mut self, handle: WheelHandle) -> Result<()> {
        let entry = self.entry_mut(handle)?;
        entry.state.clear_rotation();
        entry.last_pass = None;
        entry.last_output = entry.output(0.0);
        Ok(())
    }

    /// 设置半径（小于最小值时钳制）
    pub fn set_radius(&mut self, handle: WheelHandle, radius: f32) -> Result<f32> {
        let config = get_config();
        let entry = self.entry_mut(handle)?;
        let clamped = config.clamp_radius(radius);
        if clamped != radius {
            log::warn!(
                "[wheel] '{}' 半径 {} 无效，钳制为 {}",
                entry.bundle.target, radius, clamped
            );
        }
        entry.settings.radius = clamped;
        Ok(clamped)
    }

    pub fn set_rotation_power(&mut self, handle: WheelHandle, power: f32) -> Result<()> {
        let entry = self.entry_mut(handle)?;
        let power = RotationPower(power);
        if power.is_beyond_soft_range() {
            log::debug!(
                "[wheel] '{}' 旋转强度 {} 超出软范围",
                entry.bundle.target,
                power.value()
            );
        }
        entry.settings.rotation_power = power;
        Ok(())
    }

    pub fn set_manual_offset(&mut self, handle: WheelHandle, radians: f32) -> Result<()> {
        let entry = self.entry_mut(handle)?;
        entry.settings.manual_offset = radians;
        Ok(())
    }

    // ========================================
    // 可视化
    // ========================================

    /// 接地点世界矩阵（每次重绘重新计算）
    pub fn ground_frame(&self, handle: WheelHandle, pose: &ParentPose) -> Result<Mat4> {
        let entry = self.entry(handle)?;
        let parent = entry.rig.parent_frame(pose)?;
        Ok(entry.rig.anchor_frame(&parent, entry.settings.radius))
    }

    /// 所有车轮的接地定位器线段（世界空间）
    ///
    /// `pose_of` 返回 None 的车轮（例如当前不可见）不绘制。
    pub fn locator_segments<F>(&self, pose_of: F) -> Vec<Vec3>
    where
        F: Fn(WheelHandle, &TargetRef) -> Option<ParentPose>,
    {
        let scale = get_config().locator_scale;
        let mut segments = Vec::new();

        for handle in self.handles() {
            let Some(entry) = self.entries.get(&handle) else {
                continue;
            };
            if entry.orphaned {
                continue;
            }
            let Some(pose) = pose_of(handle, &entry.bundle.target) else {
                continue;
            };
            match self.ground_frame(handle, &pose) {
                Ok(frame) => {
                    let coords = locator_lines(entry.rig.forward_axis(), scale);
                    segments.extend(transform_coords(&frame, &coords));
                }
                Err(e) => log::debug!("[wheel] '{}' 定位器跳过: {}", entry.bundle.target, e),
            }
        }
        segments
    }

    // ========================================
    // 游离数据
    // ========================================

    /// 注册表中所有对象（目标 + 辅助对象），孤立条目不含目标
    pub fn tracked_items(&self) -> Vec<TrackedItem> {
        let mut items = Vec::new();
        for handle in self.handles() {
            let Some(entry) = self.entries.get(&handle) else {
                continue;
            };
            let bundle = &entry.bundle;
            if !entry.orphaned {
                items.push(TrackedItem {
                    bundle: bundle.id.clone(),
                    name: bundle.target.name().to_string(),
                    role: ItemRole::Target,
                });
            }
            items.extend(bundle.auxiliaries.iter().map(|aux| TrackedItem {
                bundle: bundle.id.clone(),
                name: aux.name.clone(),
                role: ItemRole::Auxiliary(aux.kind),
            }));
        }
        items
    }

    /// 清理失去主目标的自动化
    ///
    /// `target_exists` 判断目标是否仍在宿主场景中。
    /// 不存在的目标先转为孤立状态，然后删除其辅助对象和条目。
    pub fn remove_stray_data<F>(&mut self, target_exists: F) -> ReconcileReport
    where
        F: Fn(&TargetRef) -> bool,
    {
        for entry in self.entries.values_mut() {
            if !entry.orphaned && !target_exists(&entry.bundle.target) {
                entry.orphaned = true;
            }
        }

        let removed = StrayDataReconciler::find_strays(&self.tracked_items());

        let orphaned: Vec<(WheelHandle, TargetRef, BundleId)> = self
            .handles()
            .into_iter()
            .filter_map(|h| {
                self.entries
                    .get(&h)
                    .filter(|e| e.orphaned)
                    .map(|e| (h, e.bundle.target.clone(), e.bundle.id.clone()))
            })
            .collect();

        let orphaned_targets: Vec<&TargetRef> = orphaned.iter().map(|(_, t, _)| t).collect();
        let stale_bindings = StrayDataReconciler::stale_bone_bindings(
            orphaned_targets.iter().copied(),
            |armature, bone| target_exists(&TargetRef::bone(armature, bone)),
        );

        for item in &removed {
            log::warn!("[wheel] 删除游离辅助对象 '{}' ({})", item.name, item.bundle);
        }

        let mut orphaned_bundles = Vec::with_capacity(orphaned.len());
        for (handle, target, bundle) in orphaned {
            self.entries.remove(&handle);
            self.by_target.remove(&target);
            orphaned_bundles.push(bundle);
        }

        ReconcileReport {
            removed,
            orphaned_bundles,
            stale_bindings,
        }
    }
}
