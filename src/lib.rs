// ==========================================
// 调拨单分配系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 按权重、仓库归属与月度公平性分配调拨单明细
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 分配规则
pub mod engine;

// 导入层 - 表格文件
pub mod importer;

// 导出 - 分配结果表
pub mod exporter;

// 配置层 - 分配参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建库）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{AssignReason, PersistenceStage};

// 领域实体
pub use domain::{
    AllocationResult, AllocationSummary, AssignmentItem, Block, GroupColumns, MonthAggregate,
    MonthEntry, StaffMember, TaskRow, TaskSheet,
};

// 引擎
pub use engine::{
    AllocationOrchestrator, BlockAllocator, BlockGrouper, FairnessLedger, ReorderStrategy,
    RunOutcome,
};

// 配置
pub use config::AllocationConfig;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "调拨单分配系统";
