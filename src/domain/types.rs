// ==========================================
// 调拨单分配系统 - 领域类型定义
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库/导出一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 分配原因 (Assign Reason)
// ==========================================
// 对应分配阶梯的各个步骤
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignReason {
    OwnerWithRoom,     // 归属员工，配额充足
    ForeignWithRoom,   // 非归属员工，配额充足且外仓未超限
    OwnerOvershoot,    // 归属员工，受控超额
    ForeignOvershoot,  // 非归属员工，受控超额
    ForceAssign,       // 兜底强制分配
}

impl AssignReason {
    /// 是否属于超额/兜底类决策
    pub fn is_overflow(&self) -> bool {
        matches!(
            self,
            AssignReason::OwnerOvershoot | AssignReason::ForeignOvershoot | AssignReason::ForceAssign
        )
    }
}

impl fmt::Display for AssignReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignReason::OwnerWithRoom => write!(f, "OWNER_WITH_ROOM"),
            AssignReason::ForeignWithRoom => write!(f, "FOREIGN_WITH_ROOM"),
            AssignReason::OwnerOvershoot => write!(f, "OWNER_OVERSHOOT"),
            AssignReason::ForeignOvershoot => write!(f, "FOREIGN_OVERSHOOT"),
            AssignReason::ForceAssign => write!(f, "FORCE_ASSIGN"),
        }
    }
}

// ==========================================
// 持久化阶段 (Persistence Stage)
// ==========================================
// 用于定位编排流程中失败的外部写入步骤
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PersistenceStage {
    LogEntries,     // 写入当日分配日志
    LoadMonthAgg,   // 读取月度汇总
    SaveMonthAgg,   // 写回月度汇总
    SaveOrdering,   // 写回员工排序
}

impl fmt::Display for PersistenceStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceStage::LogEntries => write!(f, "LOG_ENTRIES"),
            PersistenceStage::LoadMonthAgg => write!(f, "LOAD_MONTH_AGG"),
            PersistenceStage::SaveMonthAgg => write!(f, "SAVE_MONTH_AGG"),
            PersistenceStage::SaveOrdering => write!(f, "SAVE_ORDERING"),
        }
    }
}
