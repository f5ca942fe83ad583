// ==========================================
// 调拨单分配系统 - 表格文件解析器
// ==========================================
// 支持: Excel (.xlsx/.xlsm/.xls) / CSV (.csv)
// 输出: TaskSheet（保留表头顺序；空白表头与 __EMPTY* 列丢弃；全空行跳过）
// ==========================================

use crate::domain::task::{TaskRow, TaskSheet};
use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook_auto, Reader};
use csv::ReaderBuilder;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// 表格解析接口
pub trait SheetParser {
    fn parse_sheet(&self, file_path: &Path) -> ImportResult<TaskSheet>;
}

/// 是否为无意义列（空白表头或电子表格自动生成的 __EMPTY 列）
pub fn is_junk_header(header: &str) -> bool {
    let h = header.trim();
    h.is_empty() || h.to_ascii_uppercase().starts_with("__EMPTY")
}

/// 由表头与原始单元格行构建 TaskSheet
///
/// 表头重复时保留首次出现的列。
pub fn build_sheet<I, R>(raw_headers: &[String], raw_rows: I) -> TaskSheet
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = String>,
{
    let mut kept: Vec<(usize, String)> = Vec::new();
    for (idx, header) in raw_headers.iter().enumerate() {
        let header = header.trim().to_string();
        if is_junk_header(&header) || kept.iter().any(|(_, h)| *h == header) {
            continue;
        }
        kept.push((idx, header));
    }

    let mut rows = Vec::new();
    for raw in raw_rows {
        let cells: Vec<String> = raw.into_iter().map(|c| c.trim().to_string()).collect();
        let row: TaskRow = kept
            .iter()
            .map(|(idx, header)| (header.clone(), cells.get(*idx).cloned().unwrap_or_default()))
            .collect();

        // 跳过完全空白的行
        if row.fields().values().all(|v| v.is_empty()) {
            continue;
        }
        rows.push(row);
    }

    TaskSheet {
        headers: kept.into_iter().map(|(_, h)| h).collect(),
        rows,
    }
}

fn check_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl CsvParser {
    /// 从任意读取源解析（供标准输入/内存数据复用）
    pub fn parse_reader<R: Read>(&self, reader: R) -> ImportResult<TaskSheet> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut raw_rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            raw_rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }

        Ok(build_sheet(&headers, raw_rows))
    }
}

impl SheetParser for CsvParser {
    fn parse_sheet(&self, file_path: &Path) -> ImportResult<TaskSheet> {
        check_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let file = File::open(file_path)?;
        self.parse_reader(file)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

const EXCEL_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls"];

impl SheetParser for ExcelParser {
    fn parse_sheet(&self, file_path: &Path) -> ImportResult<TaskSheet> {
        check_exists(file_path)?;

        let ext = extension_of(file_path);
        if !EXCEL_EXTENSIONS.contains(&ext.as_str()) {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(file_path)?;

        // 读取第一个 sheet
        let sheet_names = workbook.sheet_names();
        let Some(sheet_name) = sheet_names.first().cloned() else {
            return Err(ImportError::ExcelParseError("Excel 文件无工作表".to_string()));
        };
        let range = workbook.worksheet_range(&sheet_name)?;

        let mut rows = range.rows();
        let Some(header_row) = rows.next() else {
            return Ok(TaskSheet::default());
        };
        let headers: Vec<String> = header_row.iter().map(|cell| cell.to_string()).collect();

        let raw_rows: Vec<Vec<String>> = rows
            .map(|r| r.iter().map(|cell| cell.to_string()).collect())
            .collect();

        Ok(build_sheet(&headers, raw_rows))
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<TaskSheet> {
        let path = file_path.as_ref();
        match extension_of(path).as_str() {
            "csv" => CsvParser.parse_sheet(path),
            "xlsx" | "xlsm" | "xls" => ExcelParser.parse_sheet(path),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }
}
