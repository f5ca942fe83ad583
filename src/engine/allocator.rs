// ==========================================
// 调拨单分配系统 - 分块分配引擎
// ==========================================
// 职责: 将每个不可拆分块整体分配给一名参与员工
// 输入: 员工列表 + 任务行 + 分组列
// 输出: 每行一条分配明细 + 每员工汇总 + 每块决策原因
// ==========================================
// 策略: 归属优先 → 配额约束 → 外仓上限 → 受控超额 → 上限升级 → 强制兜底
// 红线: 每个块恰好分配一次，任何输入都不会留下未分配行
// ==========================================

mod core;
mod ladder;
mod ledger;

#[cfg(test)]
mod tests;

pub use self::core::BlockAllocator;
