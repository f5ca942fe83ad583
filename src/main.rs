// ==========================================
// 调拨单分配系统 - 命令行入口
// ==========================================
// 用法:
//   voucher-alloc <员工表|-> <任务表> [--out PATH] [--date YYYY-MM-DD] [--db PATH] [--dry-run] [--log-json]
// 员工表为 "-" 时直接使用库中已登记的员工
// ==========================================

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Local, NaiveDate};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use voucher_alloc::config::{AllocationConfigReader, ConfigManager};
use voucher_alloc::db::{default_db_path, init_schema, open_sqlite_connection};
use voucher_alloc::domain::month::DATE_FORMAT;
use voucher_alloc::engine::PersistenceStatus;
use voucher_alloc::exporter::export_assignments_csv;
use voucher_alloc::importer::{detect_group_columns, map_staff_sheet, UniversalFileParser};
use voucher_alloc::repository::{MonthStatsRepository, StaffRepository};
use voucher_alloc::{logging, AllocationOrchestrator};

const USAGE: &str = "用法: voucher-alloc <员工表|-> <任务表> [--out PATH] [--date YYYY-MM-DD] [--db PATH] [--dry-run] [--log-json]";

#[derive(Debug)]
struct CliArgs {
    staff_file: Option<PathBuf>,
    tasks_file: PathBuf,
    out: Option<PathBuf>,
    date: NaiveDate,
    db_path: PathBuf,
    dry_run: bool,
    log_json: bool,
}

fn parse_args() -> Result<CliArgs> {
    let mut positional: Vec<String> = Vec::new();
    let mut out = None;
    let mut date = None;
    let mut db_path = None;
    let mut dry_run = false;
    let mut log_json = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--out" => out = Some(PathBuf::from(args.next().context("--out 缺少参数")?)),
            "--date" => {
                let raw = args.next().context("--date 缺少参数")?;
                date = Some(
                    NaiveDate::parse_from_str(&raw, DATE_FORMAT)
                        .with_context(|| format!("日期格式错误: {}", raw))?,
                );
            }
            "--db" => db_path = Some(PathBuf::from(args.next().context("--db 缺少参数")?)),
            "--dry-run" => dry_run = true,
            "--log-json" => log_json = true,
            "-h" | "--help" => bail!(USAGE),
            _ => positional.push(arg),
        }
    }

    if positional.len() != 2 {
        bail!(USAGE);
    }
    let tasks_file = PathBuf::from(positional.pop().context(USAGE)?);
    let staff_arg = positional.pop().context(USAGE)?;

    Ok(CliArgs {
        staff_file: (staff_arg != "-").then(|| PathBuf::from(staff_arg)),
        tasks_file,
        out,
        date: date.unwrap_or_else(|| Local::now().date_naive()),
        db_path: db_path.unwrap_or_else(default_db_path),
        dry_run,
        log_json,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args()?;
    if args.log_json {
        logging::init_json();
    } else {
        logging::init();
    }

    tracing::info!("==================================================");
    tracing::info!("{} v{}", voucher_alloc::APP_NAME, voucher_alloc::VERSION);
    tracing::info!("使用数据库: {}", args.db_path.display());
    tracing::info!("==================================================");

    if let Some(parent) = args.db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("无法创建数据目录: {}", parent.display()))?;
        }
    }
    let db_path = args.db_path.to_string_lossy().to_string();
    let conn = open_sqlite_connection(&db_path).context("无法打开数据库")?;
    init_schema(&conn).context("建库失败")?;
    let conn = Arc::new(Mutex::new(conn));

    let config_manager = ConfigManager::from_connection(conn.clone())
        .map_err(|e| anyhow!("配置管理器初始化失败: {}", e))?;
    let config = config_manager
        .get_allocation_config()
        .await
        .map_err(|e| anyhow!("读取分配参数失败: {}", e))?;
    match config_manager.get_config_snapshot() {
        Ok(snapshot) => tracing::info!(?config, snapshot = %snapshot, "分配参数"),
        Err(e) => tracing::warn!(?config, error = %e, "配置快照读取失败"),
    }

    let parser = UniversalFileParser;
    let staff_repo = Arc::new(StaffRepository::from_connection(conn.clone()));

    if let Some(staff_file) = &args.staff_file {
        let staff_sheet = parser
            .parse(staff_file)
            .with_context(|| format!("员工表解析失败: {}", staff_file.display()))?;
        let staff = map_staff_sheet(&staff_sheet);
        let written = staff_repo.upsert_bulk(&staff).context("员工登记失败")?;
        tracing::info!(written, "员工表已导入");
    }

    let sheet = parser
        .parse(&args.tasks_file)
        .with_context(|| format!("任务表解析失败: {}", args.tasks_file.display()))?;
    let columns = detect_group_columns(&sheet.headers);
    tracing::info!(
        rows = sheet.rows.len(),
        voucher = ?columns.voucher_key,
        export = ?columns.export_key,
        "任务表已读取"
    );

    let stats_repo = Arc::new(MonthStatsRepository::from_connection(conn.clone()));
    let orchestrator = AllocationOrchestrator::new(staff_repo, stats_repo, config);
    let outcome = orchestrator
        .run(&sheet, &columns, args.date, args.dry_run)
        .await
        .context("读取员工失败，未执行分配")?;

    if let Some(out) = &args.out {
        export_assignments_csv(out, &sheet, &outcome.result.assignments)
            .with_context(|| format!("导出失败: {}", out.display()))?;
        tracing::info!("分配结果已导出: {}", out.display());
    }

    println!("run_id={} date={}", outcome.run_id, outcome.for_date.format(DATE_FORMAT));
    println!("{:<12} {:<24} {:>8} {:>6} {:>6}", "code", "name", "weight", "online", "count");
    for line in &outcome.result.summary {
        println!(
            "{:<12} {:<24} {:>8.1} {:>6} {:>6}",
            line.user_code, line.user_name, line.weight_pct, line.online, line.count
        );
    }

    match &outcome.persistence {
        PersistenceStatus::Completed => println!("已保存日志、月度累计与次日顺序"),
        PersistenceStatus::Skipped => println!("试运行：未保存"),
        PersistenceStatus::Failed { stage, message } => {
            eprintln!("保存失败 ({}): {}", stage, message);
            std::process::exit(2);
        }
    }

    Ok(())
}
