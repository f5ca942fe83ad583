// ==========================================
// 调拨单分配系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod error;
pub mod month_agg_repo;
pub mod month_entry_repo;
pub mod staff_repo;
pub mod store;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use month_agg_repo::MonthAggRepository;
pub use month_entry_repo::MonthEntryRepository;
pub use staff_repo::StaffRepository;
pub use store::{MonthStatsRepository, MonthStatsStore, StaffStore};
