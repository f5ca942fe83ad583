// ==========================================
// 调拨单分配系统 - 任务行 / 分块 / 分配结果模型
// ==========================================
// 职责: 任务行(不透明键值记录)、不可拆分块、分配明细与汇总
// 红线: 每个输入行恰有一条 AssignmentItem；块不可跨员工拆分
// ==========================================

use crate::domain::types::AssignReason;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

// ==========================================
// TaskRow - 任务行
// ==========================================
// 任意列名 → 文本值；列识别由调用方完成
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskRow {
    fields: HashMap<String, String>,
}

impl TaskRow {
    pub fn new(fields: HashMap<String, String>) -> Self {
        Self { fields }
    }

    /// 按列名取值（列不存在返回 None）
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(column.into(), value.into());
    }

    pub fn fields(&self) -> &HashMap<String, String> {
        &self.fields
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TaskRow {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

// ==========================================
// TaskSheet - 任务表（表头顺序 + 行）
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskSheet {
    pub headers: Vec<String>,
    pub rows: Vec<TaskRow>,
}

// ==========================================
// GroupColumns - 已识别的分组列
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupColumns {
    pub voucher_key: Option<String>, // 单据号列
    pub export_key: Option<String>,  // 发货地(出库仓)列
    pub receive_key: Option<String>, // 收货地列（仅展示/排序）
    pub st_key: Option<String>,      // ST 列（仅展示/排序）
}

impl GroupColumns {
    /// 预览排序用的列（单据 → 发货地 → 收货地 → ST，缺失的跳过）
    pub fn sort_keys(&self) -> Vec<&str> {
        [
            &self.voucher_key,
            &self.export_key,
            &self.receive_key,
            &self.st_key,
        ]
        .into_iter()
        .filter_map(|k| k.as_deref())
        .collect()
    }
}

// ==========================================
// Block - 不可拆分块
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub key: String,                    // 分组键（单据+发货地，或单行占位键）
    pub row_indices: Vec<usize>,        // 行号（升序，0 起）
    pub export_keys: BTreeSet<String>,  // 块内出现的规范化发货地（空值不计）
    pub lead_export: Option<String>,    // 代表发货地（首行，规范化）
}

impl Block {
    pub fn size(&self) -> usize {
        self.row_indices.len()
    }

    pub fn first_index(&self) -> usize {
        self.row_indices.first().copied().unwrap_or(usize::MAX)
    }
}

// ==========================================
// AssignmentItem - 单行分配结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentItem {
    pub user_code: String,
    pub user_name: String,
    pub task_index: usize,
}

// ==========================================
// AllocationSummary - 每员工汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationSummary {
    pub user_code: String,
    pub user_name: String,
    pub weight_pct: f64,
    pub online: bool,
    pub count: u64,
}

// ==========================================
// BlockDecision - 单块决策记录（可解释性）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDecision {
    pub block_key: String,
    pub size: usize,
    pub user_code: String,
    pub reason: AssignReason,
    pub foreign_limit: usize, // 做出决策时的外仓上限
    pub escalated: bool,      // 是否超出基准阶梯（上限升级/超额/强制）
}

// ==========================================
// AllocationResult - 一次分配的完整输出
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub assignments: Vec<AssignmentItem>,
    pub summary: Vec<AllocationSummary>,
    pub quotas: BTreeMap<String, u64>,
    pub decisions: Vec<BlockDecision>,
    pub foreign_usage: BTreeMap<String, BTreeSet<String>>,
}

impl AllocationResult {
    /// 是否发生过外仓上限升级或强制分配
    pub fn escalated(&self) -> bool {
        self.decisions.iter().any(|d| d.escalated)
    }

    /// 按行号查找分配结果
    pub fn assignee_of(&self, task_index: usize) -> Option<&AssignmentItem> {
        self.assignments.iter().find(|a| a.task_index == task_index)
    }

    /// 按员工代码读取本次分配行数
    pub fn count_of(&self, user_code: &str) -> u64 {
        self.summary
            .iter()
            .find(|s| s.user_code == user_code)
            .map(|s| s.count)
            .unwrap_or(0)
    }
}
