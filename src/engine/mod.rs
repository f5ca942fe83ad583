// ==========================================
// 调拨单分配系统 - 引擎层
// ==========================================
// 职责: 规范化 / 配额 / 分块 / 分配 / 月度结算 / 重排
// 红线: Engine 不拼 SQL, 每个分块决策都输出 reason
// ==========================================

pub mod allocator;
pub mod fairness;
pub mod grouper;
pub mod month_report;
pub mod normalizer;
pub mod orchestrator;
pub mod quota;
pub mod reorder;

// 重导出核心引擎
pub use allocator::BlockAllocator;
pub use fairness::FairnessLedger;
pub use grouper::{sort_rows_by_keys, BlockGrouper};
pub use month_report::aggregate_by_user;
pub use normalizer::{codes_match, normalize, CodeVariants};
pub use orchestrator::{AllocationOrchestrator, PersistenceStatus, RunOutcome};
pub use quota::compute_quota;
pub use reorder::ReorderStrategy;
