// ==========================================
// 调拨单分配系统 - 导入层
// ==========================================
// 职责: 表格文件 → TaskSheet；表头识别；员工表映射
// 支持: Excel (.xlsx), CSV
// ==========================================

pub mod error;
pub mod file_parser;
pub mod header_detector;
pub mod staff_mapper;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use file_parser::{build_sheet, CsvParser, ExcelParser, SheetParser, UniversalFileParser};
pub use header_detector::{detect_group_columns, find_header};
pub use staff_mapper::{map_staff_sheet, StaffColumns};
