//! 骨架与骨骼 - 参考骨骼层次设计的精简版本
//!
//! 只保存车轮求值需要的静态数据：父子关系、姿态矩阵、静止矩阵。
//! 所有矩阵都在骨架空间，乘以骨架世界矩阵得到世界空间。

use std::collections::HashMap;

use glam::Mat4;

// ============================================================================
// 骨骼
// ============================================================================

/// 骨骼节点
#[derive(Clone, Debug)]
pub struct RigBone {
    /// 骨骼名称
    pub name: String,

    /// 父骨骼索引 (-1 表示根骨骼)
    pub parent_index: i32,

    /// 当前姿态矩阵（骨架空间）
    pub pose_matrix: Mat4,

    /// 静止（绑定）矩阵（骨架空间）
    pub rest_matrix: Mat4,
}

impl RigBone {
    /// 创建新骨骼
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent_index: -1,
            pose_matrix: Mat4::IDENTITY,
            rest_matrix: Mat4::IDENTITY,
        }
    }

    pub fn with_parent(mut self, parent_index: usize) -> Self {
        self.parent_index = parent_index as i32;
        self
    }

    /// 姿态与静止矩阵相同的骨骼
    pub fn with_rest(mut self, matrix: Mat4) -> Self {
        self.rest_matrix = matrix;
        self.pose_matrix = matrix;
        self
    }

    pub fn with_pose(mut self, matrix: Mat4) -> Self {
        self.pose_matrix = matrix;
        self
    }

    /// 父骨骼索引
    #[inline]
    pub fn parent_id(&self) -> Option<usize> {
        if self.parent_index >= 0 {
            Some(self.parent_index as usize)
        } else {
            None
        }
    }

    /// 是否为根骨骼
    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent_index < 0
    }
}

// ============================================================================
// 骨架
// ============================================================================

/// 骨架 - 管理骨骼列表和名称索引
#[derive(Clone, Debug)]
pub struct Armature {
    /// 骨架名称
    pub name: String,
    /// 骨架世界矩阵
    pub world_matrix: Mat4,
    bones: Vec<RigBone>,
    name_index: HashMap<String, usize>,
}

impl Armature {
    pub fn new(name: impl Into<String>, world_matrix: Mat4) -> Self {
        Self {
            name: name.into(),
            world_matrix,
            bones: Vec::new(),
            name_index: HashMap::new(),
        }
    }

    /// 添加骨骼，返回其索引
    pub fn add_bone(&mut self, bone: RigBone) -> usize {
        let index = self.bones.len();
        self.name_index.insert(bone.name.clone(), index);
        self.bones.push(bone);
        index
    }

    #[inline]
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    #[inline]
    pub fn get_bone(&self, index: usize) -> Option<&RigBone> {
        self.bones.get(index)
    }

    #[inline]
    pub fn get_bone_mut(&mut self, index: usize) -> Option<&mut RigBone> {
        self.bones.get_mut(index)
    }

    /// 按名称查找骨骼索引
    #[inline]
    pub fn find_bone(&self, name: &str) -> Option<usize> {
        self.name_index.get(name).copied()
    }

    #[inline]
    pub fn contains_bone(&self, name: &str) -> bool {
        self.name_index.contains_key(name)
    }

    /// 父骨骼（不存在或越界时为 None）
    pub fn parent_of(&self, index: usize) -> Option<&RigBone> {
        self.bones
            .get(index)
            .and_then(RigBone::parent_id)
            .and_then(|parent| self.bones.get(parent))
    }

    /// 骨骼当前姿态的世界矩阵
    #[inline]
    pub fn bone_world_matrix(&self, bone: &RigBone) -> Mat4 {
        self.world_matrix * bone.pose_matrix
    }

    /// 骨骼静止姿态的世界矩阵
    #[inline]
    pub fn bone_rest_world_matrix(&self, bone: &RigBone) -> Mat4 {
        self.world_matrix * bone.rest_matrix
    }

    /// 被骨骼蒙皮的网格原点的实际世界矩阵
    ///
    /// 网格可能处于动画中途，已经被骨骼从绑定位置带走：
    /// deformed = bone_world_pose * inverse(bone_world_rest) * wheel_world
    pub fn deformed_world_matrix(&self, wheel_world: &Mat4, bone: &RigBone) -> Mat4 {
        let pose = self.bone_world_matrix(bone);
        let rest = self.bone_rest_world_matrix(bone);
        pose * rest.inverse() * *wheel_world
    }
}
