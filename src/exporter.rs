// ==========================================
// 调拨单分配系统 - 分配结果导出
// ==========================================
// 输出: CSV，前两列为分配员工代码/姓名，其后为原表头顺序
// 未分配的行员工列为空
// ==========================================

use crate::domain::task::{AssignmentItem, TaskSheet};
use crate::importer::error::{ImportError, ImportResult};
use csv::WriterBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// 分配员工代码列名
pub const ASSIGNEE_CODE_HEADER: &str = "ma_nv_phan_cong";
/// 分配员工姓名列名
pub const ASSIGNEE_NAME_HEADER: &str = "ten_nv_phan_cong";

/// 写出到任意目标
pub fn write_assignments_csv<W: Write>(
    writer: W,
    sheet: &TaskSheet,
    assignments: &[AssignmentItem],
) -> ImportResult<usize> {
    let by_index: HashMap<usize, &AssignmentItem> =
        assignments.iter().map(|a| (a.task_index, a)).collect();

    let mut out = WriterBuilder::new().has_headers(false).from_writer(writer);

    let mut header_row: Vec<&str> = vec![ASSIGNEE_CODE_HEADER, ASSIGNEE_NAME_HEADER];
    header_row.extend(sheet.headers.iter().map(String::as_str));
    out.write_record(&header_row)?;

    for (idx, row) in sheet.rows.iter().enumerate() {
        let (code, name) = by_index
            .get(&idx)
            .map(|a| (a.user_code.as_str(), a.user_name.as_str()))
            .unwrap_or(("", ""));
        let mut record: Vec<&str> = vec![code, name];
        record.extend(sheet.headers.iter().map(|h| row.get(h).unwrap_or("")));
        out.write_record(&record)?;
    }

    out.flush()
        .map_err(|e| ImportError::CsvWriteError(e.to_string()))?;
    Ok(sheet.rows.len())
}

/// 写出到文件
pub fn export_assignments_csv<P: AsRef<Path>>(
    path: P,
    sheet: &TaskSheet,
    assignments: &[AssignmentItem],
) -> ImportResult<usize> {
    let file = File::create(path.as_ref())?;
    write_assignments_csv(file, sheet, assignments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::task::TaskRow;

    #[test]
    fn test_merged_columns_and_unassigned_rows() {
        let sheet = TaskSheet {
            headers: vec!["CT".to_string(), "Kho".to_string()],
            rows: vec![
                [("CT", "V1"), ("Kho", "W1")].into_iter().collect::<TaskRow>(),
                [("CT", "V2,x"), ("Kho", "W2")].into_iter().collect::<TaskRow>(),
            ],
        };
        let assignments = vec![AssignmentItem {
            user_code: "A".to_string(),
            user_name: "Anh".to_string(),
            task_index: 0,
        }];

        let mut buf = Vec::new();
        let written = write_assignments_csv(&mut buf, &sheet, &assignments).unwrap();
        assert_eq!(written, 2);
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "ma_nv_phan_cong,ten_nv_phan_cong,CT,Kho\nA,Anh,V1,W1\n,,\"V2,x\",W2\n"
        );
    }
}
