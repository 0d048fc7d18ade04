//! 班级名单导入
//!
//! 读取表格的第一个工作表（或 CSV），第一行为表头。
//! 表头按别名解析（忽略大小写，支持越南语 / 英语写法），
//! 缺少 ID 或姓名的行被丢弃，重复 ID 只保留第一次出现的行。

use std::collections::HashSet;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use phf::phf_map;
use tracing::{debug, info, warn};

use crate::error::ImportError;
use crate::models::student::Student;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Id,
    Name,
    Class,
}

/// 规范化后的表头 → (列, 优先级)，优先级越小越优先
static HEADER_ALIASES: phf::Map<&'static str, (Column, u8)> = phf_map! {
    "id" => (Column::Id, 0),
    "số thứ tự" => (Column::Id, 1),
    "stt" => (Column::Id, 2),
    "student id" => (Column::Id, 3),
    "họ tên" => (Column::Name, 0),
    "họ và tên" => (Column::Name, 1),
    "name" => (Column::Name, 2),
    "fullname" => (Column::Name, 3),
    "full name" => (Column::Name, 4),
    "lớp" => (Column::Class, 0),
    "class" => (Column::Class, 1),
    "classname" => (Column::Class, 2),
};

/// 导入结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// 保留下来的学生（保持原表顺序）
    pub students: Vec<Student>,
    /// 因缺少 ID 或姓名被丢弃的行数
    pub dropped_incomplete: usize,
    /// 因 ID 重复被丢弃的行数
    pub dropped_duplicates: usize,
}

/// 从文件导入名单
///
/// 全有或全无：解析失败时返回错误，不会返回部分名单
pub async fn load_roster(path: &Path) -> Result<ImportReport, ImportError> {
    let path_buf = path.to_path_buf();
    let path_str = path.display().to_string();

    let rows = tokio::task::spawn_blocking(move || read_table(&path_buf))
        .await
        .map_err(|e| ImportError::unreadable(&path_str, e))??;

    debug!("读取到 {} 行（含表头）: {}", rows.len(), path_str);

    let report = students_from_rows(rows);
    info!(
        "✓ 名单解析完成: {} 名学生, 丢弃不完整行 {} 行, 丢弃重复 ID {} 行",
        report.students.len(),
        report.dropped_incomplete,
        report.dropped_duplicates
    );
    Ok(report)
}

/// 把表格行（第一行为表头）转换成学生列表
pub fn students_from_rows(rows: Vec<Vec<String>>) -> ImportReport {
    let mut rows = rows.into_iter();
    let Some(headers) = rows.next() else {
        warn!("⚠️ 表格为空");
        return ImportReport::default();
    };

    let id_cols = columns_for(&headers, Column::Id);
    let name_cols = columns_for(&headers, Column::Name);
    let class_cols = columns_for(&headers, Column::Class);

    if id_cols.is_empty() || name_cols.is_empty() {
        warn!("⚠️ 表头中找不到 ID 或姓名列: {:?}", headers);
    }

    let mut report = ImportReport::default();
    let mut seen = HashSet::new();

    for row in rows {
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let id = pick(&row, &id_cols);
        let name = pick(&row, &name_cols);
        if id.is_empty() || name.is_empty() {
            report.dropped_incomplete += 1;
            continue;
        }

        if !seen.insert(id.clone()) {
            warn!("⚠️ 重复的学生 ID {}，保留第一次出现的行", id);
            report.dropped_duplicates += 1;
            continue;
        }

        let class_name = pick(&row, &class_cols);
        report.students.push(Student::new(id, name, class_name));
    }

    report
}

// ========== 辅助函数 ==========

fn read_table(path: &Path) -> Result<Vec<Vec<String>>, ImportError> {
    let path_str = path.display().to_string();
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => read_csv_table(path),
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => read_workbook_table(path),
        _ => Err(ImportError::UnsupportedFormat { path: path_str }),
    }
}

fn read_csv_table(path: &Path) -> Result<Vec<Vec<String>>, ImportError> {
    let path_str = path.display().to_string();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| ImportError::unreadable(&path_str, e))?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ImportError::unreadable(&path_str, e))?;
        rows.push(record.iter().map(|cell| cell.trim().to_string()).collect());
    }
    Ok(rows)
}

fn read_workbook_table(path: &Path) -> Result<Vec<Vec<String>>, ImportError> {
    let path_str = path.display().to_string();
    let mut workbook =
        open_workbook_auto(path).map_err(|e| ImportError::unreadable(&path_str, e))?;

    let first_sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ImportError::NoSheet {
            path: path_str.clone(),
        })?;
    debug!("使用工作表: {}", first_sheet);

    let range = workbook
        .worksheet_range(&first_sheet)
        .map_err(|e| ImportError::unreadable(&path_str, e))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect())
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.is_finite() => format!("{}", *f as i64),
        other => other.to_string().trim().to_string(),
    }
}

fn normalize_header(header: &str) -> String {
    header
        .trim_start_matches('\u{feff}')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// 某一列对应的所有表头下标，按别名优先级排序
fn columns_for(headers: &[String], column: Column) -> Vec<usize> {
    let mut found: Vec<(u8, usize)> = headers
        .iter()
        .enumerate()
        .filter_map(|(idx, header)| match HEADER_ALIASES.get(normalize_header(header).as_str()) {
            Some(&(col, priority)) if col == column => Some((priority, idx)),
            _ => None,
        })
        .collect();
    found.sort();
    found.into_iter().map(|(_, idx)| idx).collect()
}

/// 取第一个非空的候选单元格
fn pick(row: &[String], indices: &[usize]) -> String {
    indices
        .iter()
        .filter_map(|&idx| row.get(idx))
        .map(|cell| cell.trim())
        .find(|cell| !cell.is_empty())
        .unwrap_or_default()
        .to_string()
}
