use super::ladder::{force_assign, LadderStep};
use super::ledger::{LedgerBook, StaffLedger};
use crate::config::AllocationConfig;
use crate::domain::staff::StaffMember;
use crate::domain::task::{
    AllocationResult, AllocationSummary, AssignmentItem, Block, BlockDecision, GroupColumns,
    TaskRow,
};
use crate::domain::types::AssignReason;
use crate::engine::grouper::BlockGrouper;
use crate::engine::normalizer::normalize;
use crate::engine::quota::compute_quota;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, instrument, warn};

// ==========================================
// BlockAllocator - 分块分配引擎
// ==========================================
pub struct BlockAllocator {
    config: AllocationConfig,
}

impl BlockAllocator {
    /// 构造函数
    ///
    /// # 参数
    /// - `config`: 分配参数（外仓上限、超额门槛、是否按发货地拆分）
    pub fn new(config: AllocationConfig) -> Self {
        Self {
            config: config.normalized(),
        }
    }

    pub fn config(&self) -> &AllocationConfig {
        &self.config
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 分配全部任务行
    ///
    /// # 参数
    /// - `staff`: 全部员工（顺序即平分时的优先级）
    /// - `rows`: 任务行
    /// - `columns`: 已识别的单据列/发货地列
    ///
    /// # 返回
    /// 分配明细（每行一条）+ 每员工汇总（含未参与者，count=0）
    #[instrument(skip(self, staff, rows, columns), fields(
        staff_count = staff.len(),
        rows_count = rows.len()
    ))]
    pub fn allocate(
        &self,
        staff: &[StaffMember],
        rows: &[TaskRow],
        columns: &GroupColumns,
    ) -> AllocationResult {
        let active = self.active_staff(staff);

        if rows.is_empty() || active.is_empty() {
            debug!(active = active.len(), "无任务或无参与员工，返回空分配");
            return AllocationResult {
                summary: build_summary(staff, &LedgerBook::default()),
                ..AllocationResult::default()
            };
        }

        let members: Vec<StaffMember> = active.iter().map(|(_, m)| m.clone()).collect();
        let quotas = compute_quota(&members, rows.len() as u64);
        let mut book = LedgerBook::default();
        for (rank, ((input_index, member), quota)) in active.iter().zip(quotas.iter()).enumerate() {
            book.push(
                StaffLedger::new(member, rank, *quota, self.config.overshoot_min_weight_pct)
                    .with_input_index(*input_index),
            );
        }

        let grouper = BlockGrouper::new(self.config.split_by_export);
        let blocks = grouper.group_rows(
            rows,
            columns.voucher_key.as_deref(),
            columns.export_key.as_deref(),
        );
        debug!(blocks = blocks.len(), "分块完成");

        let mut assignments: Vec<AssignmentItem> = Vec::with_capacity(rows.len());
        let mut decisions: Vec<BlockDecision> = Vec::with_capacity(blocks.len());

        for block in &blocks {
            let decision = self.decide(&book, block);
            let Some(ledger) = book.get_mut(&decision.user_code) else {
                // 决策只会返回台账内的代码
                continue;
            };
            ledger.record(block.size(), &block.export_keys);
            for &row_idx in &block.row_indices {
                assignments.push(AssignmentItem {
                    user_code: ledger.display_code.clone(),
                    user_name: ledger.name.clone(),
                    task_index: row_idx,
                });
            }
            // 一旦超出配额即视为额度已用
            if ledger.deficit < 0 {
                ledger.overshoot_budget = false;
            }
            decisions.push(BlockDecision {
                user_code: ledger.display_code.clone(),
                ..decision
            });
        }

        assignments.sort_by_key(|a| a.task_index);

        AllocationResult {
            summary: build_summary(staff, &book),
            quotas: book.iter().map(|l| (l.display_code.clone(), l.quota)).collect(),
            foreign_usage: book
                .iter()
                .map(|l| (l.display_code.clone(), l.foreign.clone()))
                .collect::<BTreeMap<_, _>>(),
            assignments,
            decisions,
        }
    }

    /// 单块决策：逐级外仓上限执行阶梯，全部失败则强制分配
    fn decide(&self, book: &LedgerBook, block: &Block) -> BlockDecision {
        let base = self.config.foreign_limit_base;
        // 上限达到「最多已用外仓 + 块内发货地数」后，再升级不会改变任何候选结果
        let saturated = book.iter().map(|l| l.foreign.len()).max().unwrap_or(0)
            + block.export_keys.len();
        let top = self.config.foreign_limit_max.max(base).min(saturated.max(base));

        for limit in base..=top {
            for step in LadderStep::SEQUENCE {
                if let Some(code) = step.select(book, block, limit) {
                    let reason = step.reason();
                    let escalated = limit > base || reason.is_overflow();
                    if escalated {
                        debug!(
                            block = %block.key,
                            size = block.size(),
                            user = %code,
                            reason = %reason,
                            foreign_limit = limit,
                            "阶梯升级后分配"
                        );
                    }
                    return BlockDecision {
                        block_key: block.key.clone(),
                        size: block.size(),
                        user_code: code,
                        reason,
                        foreign_limit: limit,
                        escalated,
                    };
                }
            }
        }

        let code = force_assign(book, block, self.config.overshoot_min_weight_pct)
            .or_else(|| book.iter().next().map(|l| l.code.clone()))
            .unwrap_or_default();
        warn!(
            block = %block.key,
            size = block.size(),
            user = %code,
            "阶梯全部失败，强制分配"
        );
        BlockDecision {
            block_key: block.key.clone(),
            size: block.size(),
            user_code: code,
            reason: AssignReason::ForceAssign,
            foreign_limit: top,
            escalated: true,
        }
    }

    /// 参与员工（附输入下标）：在岗 + 权重 > 0 + 代码非空；重复代码仅保留首个参与者
    fn active_staff(&self, staff: &[StaffMember]) -> Vec<(usize, StaffMember)> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut active = Vec::new();
        for (index, member) in staff.iter().enumerate().filter(|(_, s)| s.is_active()) {
            let code = normalize(&member.code);
            if code.is_empty() {
                continue;
            }
            if !seen.insert(code) {
                warn!(code = %member.code, "员工代码重复，后出现者不参与分配");
                continue;
            }
            active.push((index, member.clone()));
        }
        active
    }
}

impl Default for BlockAllocator {
    fn default() -> Self {
        Self::new(AllocationConfig::default())
    }
}

/// 汇总：覆盖全部输入员工（未参与者 count=0；重复代码只计实际参与的那一条）
fn build_summary(staff: &[StaffMember], book: &LedgerBook) -> Vec<AllocationSummary> {
    staff
        .iter()
        .enumerate()
        .map(|(index, s)| {
            let count = book
                .get(&normalize(&s.code))
                .filter(|l| l.input_index == index)
                .map(|l| l.assigned)
                .unwrap_or(0);
            AllocationSummary {
                user_code: s.code.clone(),
                user_name: s.name.clone(),
                weight_pct: s.weight_pct,
                online: s.online,
                count,
            }
        })
        .collect()
}
