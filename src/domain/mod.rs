// ==========================================
// 调拨单分配系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod month;
pub mod staff;
pub mod task;
pub mod types;

// 重导出核心类型
pub use month::{month_key, MonthAggregate, MonthEntry, UserMonthTotal};
pub use staff::{StaffMember, BASELINE_WEIGHT_PCT};
pub use task::{
    AllocationResult, AllocationSummary, AssignmentItem, Block, BlockDecision, GroupColumns,
    TaskRow, TaskSheet,
};
pub use types::{AssignReason, PersistenceStage};
