// ==========================================
// 导入/导出集成测试
// ==========================================
// 测试目标: 员工表 + 任务表(CSV) → 分配 → 导出 CSV
// ==========================================

mod test_helpers;

use std::fs;
use std::io::Write;
use tempfile::{tempdir, Builder, NamedTempFile};
use test_helpers::shared_memory_conn;
use voucher_alloc::exporter::{export_assignments_csv, ASSIGNEE_CODE_HEADER};
use voucher_alloc::importer::{
    detect_group_columns, map_staff_sheet, ImportError, UniversalFileParser,
};
use voucher_alloc::repository::StaffRepository;
use voucher_alloc::BlockAllocator;

fn csv_file(lines: &[&str]) -> NamedTempFile {
    let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file
}

fn staff_file() -> NamedTempFile {
    csv_file(&[
        "Mã NV,Tên,Tỉ lệ,Đi làm,Mã kho",
        "a,An,200,x,W1",
        "b,Bình,100%,x,w2",
        "c,Chi,100,x,",
        "d,Dũng,100,nghỉ,W1",
    ])
}

fn tasks_file() -> NamedTempFile {
    csv_file(&[
        "Số CT,Nơi xuất,Ghi chú",
        "CT1,W1,r1",
        "CT2,W2,r2",
        "CT1,W1,r3",
        "CT2,W2,r4",
        "CT1,W1,r5",
        "CT2,W2,r6",
        "CT1,W1,r7",
        "CT2,W2,r8",
    ])
}

#[test]
fn test_staff_sheet_mapping_from_csv() {
    let file = staff_file();
    let sheet = UniversalFileParser.parse(file.path()).unwrap();
    let staff = map_staff_sheet(&sheet);

    let rows: Vec<(&str, f64, bool)> = staff
        .iter()
        .map(|s| (s.code.as_str(), s.weight_pct, s.online))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("A", 200.0, true),
            ("B", 100.0, true),
            ("C", 100.0, true),
            ("D", 100.0, false),
        ]
    );
    assert_eq!(staff[1].name, "Bình");
    assert_eq!(staff[1].warehouses, vec!["W2"]);
    assert!(staff[2].warehouses.is_empty());
    assert_eq!(staff[3].order, 3);
}

#[test]
fn test_csv_files_to_exported_assignments() {
    let staff_sheet = UniversalFileParser.parse(staff_file().path()).unwrap();
    let staff = map_staff_sheet(&staff_sheet);

    // 经过登记表后再读取
    let repo = StaffRepository::from_connection(shared_memory_conn());
    repo.upsert_bulk(&staff).unwrap();
    let registered = repo.list(true).unwrap();
    assert_eq!(registered.len(), 4);

    let tasks = UniversalFileParser.parse(tasks_file().path()).unwrap();
    let columns = detect_group_columns(&tasks.headers);
    assert_eq!(columns.voucher_key.as_deref(), Some("Số CT"));
    assert_eq!(columns.export_key.as_deref(), Some("Nơi xuất"));

    let result = BlockAllocator::default().allocate(&registered, &tasks.rows, &columns);
    assert_eq!(result.count_of("A"), 4);
    assert_eq!(result.count_of("B"), 4);
    assert_eq!(result.count_of("C"), 0);
    assert_eq!(result.count_of("D"), 0);
    assert_eq!(result.assignee_of(1).map(|a| a.user_code.as_str()), Some("B"));

    let dir = tempdir().unwrap();
    let out = dir.path().join("assigned.csv");
    let written = export_assignments_csv(&out, &tasks, &result.assignments).unwrap();
    assert_eq!(written, 8);

    let text = fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 9);
    assert!(lines[0].starts_with(ASSIGNEE_CODE_HEADER));
    assert!(lines[0].ends_with("Số CT,Nơi xuất,Ghi chú"));
    // 原表行序保持不变
    assert_eq!(lines[1], "A,An,CT1,W1,r1");
    assert_eq!(lines[2], "B,Bình,CT2,W2,r2");
    assert_eq!(lines[8], "B,Bình,CT2,W2,r8");
}

#[test]
fn test_unknown_extension_is_rejected() {
    let file = Builder::new().suffix(".json").tempfile().unwrap();
    assert!(matches!(
        UniversalFileParser.parse(file.path()),
        Err(ImportError::UnsupportedFormat(ext)) if ext == "json"
    ));
}
