// ==========================================
// 分配引擎 - 决策阶梯
// ==========================================
// 每个步骤是一个纯函数: (台账, 块, 外仓上限) → 候选员工 或 无候选
// 顺序:
//   对每个外仓上限 (基准 → 最大):
//     1) 归属 + 配额充足
//     2) 非归属 + 配额充足 + 外仓未超限
//     3) 归属 → 非归属 受控超额（权重达标且额度未用）
//   兜底: 强制分配
// ==========================================

use super::ledger::{balance_cmp, LedgerBook, StaffLedger};
use crate::domain::task::Block;
use crate::domain::types::AssignReason;

/// 阶梯步骤
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LadderStep {
    OwnerWithRoom,
    ForeignWithRoom,
    OwnerOvershoot,
    ForeignOvershoot,
}

impl LadderStep {
    /// 每个外仓上限下依次尝试的步骤
    pub const SEQUENCE: [LadderStep; 4] = [
        LadderStep::OwnerWithRoom,
        LadderStep::ForeignWithRoom,
        LadderStep::OwnerOvershoot,
        LadderStep::ForeignOvershoot,
    ];

    pub fn reason(&self) -> AssignReason {
        match self {
            LadderStep::OwnerWithRoom => AssignReason::OwnerWithRoom,
            LadderStep::ForeignWithRoom => AssignReason::ForeignWithRoom,
            LadderStep::OwnerOvershoot => AssignReason::OwnerOvershoot,
            LadderStep::ForeignOvershoot => AssignReason::ForeignOvershoot,
        }
    }

    fn wants_owner(&self) -> bool {
        matches!(self, LadderStep::OwnerWithRoom | LadderStep::OwnerOvershoot)
    }

    fn is_overshoot(&self) -> bool {
        matches!(self, LadderStep::OwnerOvershoot | LadderStep::ForeignOvershoot)
    }

    /// 执行一个步骤，返回选中员工代码
    pub fn select(&self, book: &LedgerBook, block: &Block, foreign_limit: usize) -> Option<String> {
        let size = block.size();
        pick_balanced(book.iter().filter(|s| {
            if is_owner(s, block) != self.wants_owner() {
                return false;
            }
            if !s.within_foreign_limit(&block.export_keys, foreign_limit) {
                return false;
            }
            if self.is_overshoot() {
                !s.has_room(size) && s.overshoot_budget
            } else {
                s.has_room(size)
            }
        }))
    }
}

/// 块的归属判定以代表发货地（首行）为准；无发货地的块无归属员工
pub(crate) fn is_owner(staff: &StaffLedger, block: &Block) -> bool {
    block
        .lead_export
        .as_deref()
        .map(|e| staff.owns(e))
        .unwrap_or(false)
}

/// 按平衡分选出最优员工
pub(crate) fn pick_balanced<'a>(candidates: impl Iterator<Item = &'a StaffLedger>) -> Option<String> {
    candidates.min_by(|a, b| balance_cmp(a, b)).map(|s| s.code.clone())
}

/// 兜底强制分配（忽略外仓上限与超额额度）
///
/// 先在归属员工中选，再在全部员工中选；每个范围内优先
/// 「权重低于超额门槛且仍有剩余配额」者，否则范围内任意员工。
pub(crate) fn force_assign(book: &LedgerBook, block: &Block, overshoot_min_weight: f64) -> Option<String> {
    for owners_only in [true, false] {
        let in_pool = |s: &&StaffLedger| !owners_only || is_owner(s, block);
        let preferred = pick_balanced(
            book.iter()
                .filter(in_pool)
                .filter(|s| s.weight_pct < overshoot_min_weight && s.deficit > 0),
        );
        if preferred.is_some() {
            return preferred;
        }
        let any = pick_balanced(book.iter().filter(in_pool));
        if any.is_some() {
            return any;
        }
    }
    None
}
