// ==========================================
// 分配引擎 - 员工运行时台账
// ==========================================
// 以员工代码为键的单条可变记录（配额/已分配/实时欠额/外仓集合/超额额度）
// 红线: 两份不同顺序的员工列表不共享下标
// ==========================================

use crate::domain::staff::StaffMember;
use crate::engine::normalizer::{normalize, CodeVariants};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

// ==========================================
// StaffLedger - 单员工台账
// ==========================================
#[derive(Debug, Clone)]
pub(crate) struct StaffLedger {
    pub code: String,              // 规范化代码（台账键）
    pub display_code: String,      // 原始代码（输出用）
    pub name: String,
    pub weight_pct: f64,
    pub rank: usize,               // 参与者中的顺序（越小越优先）
    pub input_index: usize,        // 在原始员工列表中的下标（汇总回填用）
    owned: Vec<CodeVariants>,      // 归属仓库
    pub quota: u64,
    pub assigned: u64,
    pub deficit: i64,              // quota - assigned，可为负（已超额）
    pub foreign: BTreeSet<String>, // 已接触的非归属发货地
    pub overshoot_budget: bool,    // 受控超额额度（仅一次，不补充）
}

impl StaffLedger {
    pub fn new(staff: &StaffMember, rank: usize, quota: u64, overshoot_min_weight: f64) -> Self {
        let weight_pct = staff.effective_weight();
        Self {
            code: normalize(&staff.code),
            display_code: staff.code.clone(),
            name: staff.name.clone(),
            weight_pct,
            rank,
            input_index: rank,
            owned: staff
                .warehouses
                .iter()
                .map(|w| CodeVariants::of(w))
                .filter(|v| !v.is_empty())
                .collect(),
            quota,
            assigned: 0,
            deficit: quota as i64,
            foreign: BTreeSet::new(),
            overshoot_budget: weight_pct >= overshoot_min_weight,
        }
    }

    pub fn with_input_index(mut self, input_index: usize) -> Self {
        self.input_index = input_index;
        self
    }

    /// 是否归属该发货地（空发货地不归属任何人）
    pub fn owns(&self, export: &str) -> bool {
        let target = CodeVariants::of(export);
        !target.is_empty() && self.owned.iter().any(|w| w.matches(&target))
    }

    /// 块内对本员工而言的外仓集合
    pub fn foreign_keys_of<'a>(&self, export_keys: &'a BTreeSet<String>) -> Vec<&'a String> {
        export_keys.iter().filter(|e| !self.owns(e)).collect()
    }

    /// 接收该块后外仓数量是否仍在上限内（已用过的外仓不重复计数）
    pub fn within_foreign_limit(&self, export_keys: &BTreeSet<String>, limit: usize) -> bool {
        let new_keys = self
            .foreign_keys_of(export_keys)
            .into_iter()
            .filter(|e| !self.foreign.contains(*e))
            .count();
        self.foreign.len() + new_keys <= limit
    }

    /// 是否有容纳整块的剩余配额
    pub fn has_room(&self, size: usize) -> bool {
        self.deficit >= size as i64
    }

    /// 利用率 assigned / quota（零配额：未分配为 0，否则为无穷）
    pub fn utilization(&self) -> f64 {
        if self.quota == 0 {
            if self.assigned == 0 {
                0.0
            } else {
                f64::INFINITY
            }
        } else {
            self.assigned as f64 / self.quota as f64
        }
    }

    /// 记账：整块计入本员工
    pub fn record(&mut self, size: usize, export_keys: &BTreeSet<String>) {
        self.assigned += size as u64;
        self.deficit -= size as i64;
        let foreign: Vec<String> = self
            .foreign_keys_of(export_keys)
            .into_iter()
            .cloned()
            .collect();
        self.foreign.extend(foreign);
    }
}

/// 平衡分比较：欠额大者优先 → 利用率低者优先 → 输入顺序靠前者优先
pub(crate) fn balance_cmp(a: &StaffLedger, b: &StaffLedger) -> Ordering {
    b.deficit
        .cmp(&a.deficit)
        .then_with(|| a.utilization().total_cmp(&b.utilization()))
        .then_with(|| a.rank.cmp(&b.rank))
}

// ==========================================
// LedgerBook - 一次分配的全部台账
// ==========================================
#[derive(Debug, Default)]
pub(crate) struct LedgerBook {
    ledgers: HashMap<String, StaffLedger>,
    ranked: Vec<String>,
}

impl LedgerBook {
    pub fn push(&mut self, ledger: StaffLedger) {
        self.ranked.push(ledger.code.clone());
        self.ledgers.insert(ledger.code.clone(), ledger);
    }

    pub fn get(&self, code: &str) -> Option<&StaffLedger> {
        self.ledgers.get(code)
    }

    pub fn get_mut(&mut self, code: &str) -> Option<&mut StaffLedger> {
        self.ledgers.get_mut(code)
    }

    /// 按输入顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = &StaffLedger> {
        self.ranked.iter().filter_map(move |c| self.ledgers.get(c))
    }
}
