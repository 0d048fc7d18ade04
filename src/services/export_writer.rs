//! 结果导出服务 - 业务能力层
//!
//! 只负责"把结果写成工作簿"能力

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use tracing::{debug, info};

use crate::error::FileError;
use crate::models::student::StudentWithResult;

/// 导出工作表名称
pub const EXPORT_SHEET_NAME: &str = "Kết quả quét";

const EXPORT_HEADERS: [&str; 4] = ["ID", "Full name", "Class", "Result"];

const COLUMN_WIDTHS: [f64; 4] = [10.0, 28.0, 10.0, 12.0];

/// 导出服务
pub struct ExportWriter {
    export_dir: PathBuf,
}

impl ExportWriter {
    pub fn new(export_dir: impl Into<PathBuf>) -> Self {
        Self {
            export_dir: export_dir.into(),
        }
    }

    /// 导出文件名，带导出日期
    pub fn file_name(date: NaiveDate) -> String {
        format!("Ket_qua_quet_{}.xlsx", date.format("%Y-%m-%d"))
    }

    /// 写入导出文件
    ///
    /// # 参数
    /// - `rows`: 名单顺序的学生及结果
    /// - `date`: 导出日期（用于文件名）
    ///
    /// # 返回
    /// 返回写入的文件路径
    pub async fn write(
        &self,
        rows: &[StudentWithResult],
        date: NaiveDate,
    ) -> Result<PathBuf, FileError> {
        let path = self.export_dir.join(Self::file_name(date));
        let bytes = encode_rows(rows).map_err(|e| FileError::write_failed(path_str(&path), e))?;

        debug!("导出 {} 行, {} 字节", rows.len(), bytes.len());

        tokio::fs::create_dir_all(&self.export_dir)
            .await
            .map_err(|e| FileError::write_failed(path_str(&self.export_dir), e))?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| FileError::write_failed(path_str(&path), e))?;

        info!("📄 已导出 {} 名学生的结果: {}", rows.len(), path.display());
        Ok(path)
    }
}

/// 生成只有一个工作表的工作簿
fn encode_rows(rows: &[StudentWithResult]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(EXPORT_SHEET_NAME)?;

    for (col, (header, width)) in EXPORT_HEADERS.iter().zip(COLUMN_WIDTHS).enumerate() {
        let col = col as u16;
        worksheet.write_string_with_format(0, col, *header, &header_format)?;
        worksheet.set_column_width(col, width)?;
    }

    for (idx, row) in rows.iter().enumerate() {
        let line = idx as u32 + 1;
        worksheet.write_string(line, 0, row.student.id.as_str())?;
        worksheet.write_string(line, 1, row.student.name.as_str())?;
        worksheet.write_string(line, 2, row.student.class_name.as_str())?;
        worksheet.write_string(line, 3, row.answer.label())?;
    }

    workbook.save_to_buffer()
}

fn path_str(path: &Path) -> String {
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::answer::Bucket;
    use crate::models::student::Student;
    use calamine::{open_workbook_auto, Reader};

    fn read_back(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
        let mut workbook = open_workbook_auto(path).unwrap();
        let sheets = workbook.sheet_names();
        let range = workbook.worksheet_range(&sheets[0]).unwrap();
        let rows = range
            .rows()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect();
        (sheets, rows)
    }

    #[test]
    fn test_file_name_carries_date() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(ExportWriter::file_name(date), "Ket_qua_quet_2026-10-19.xlsx");
    }

    #[tokio::test]
    async fn test_write_rows_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ExportWriter::new(dir.path().join("out"));
        let rows = vec![
            StudentWithResult {
                student: Student::new("2", "Bình, Trần", "10A"),
                answer: Bucket::NoAnswer,
            },
            StudentWithResult {
                student: Student::new("1", "An", "10A"),
                answer: Bucket::C,
            },
        ];

        let date = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
        let path = writer.write(&rows, date).await.unwrap();
        assert!(path.ends_with("out/Ket_qua_quet_2026-01-02.xlsx"));

        let (sheets, content) = read_back(&path);
        assert_eq!(sheets, vec![EXPORT_SHEET_NAME.to_string()]);
        assert_eq!(content[0], vec!["ID", "Full name", "Class", "Result"]);
        assert_eq!(content[1], vec!["2", "Bình, Trần", "10A", "No Answer"]);
        assert_eq!(content[2], vec!["1", "An", "10A", "C"]);
        assert_eq!(content.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_roster_writes_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ExportWriter::new(dir.path());

        let date = NaiveDate::from_ymd_opt(2026, 3, 4).unwrap();
        let path = writer.write(&[], date).await.unwrap();

        let (_, content) = read_back(&path);
        assert_eq!(content, vec![vec!["ID", "Full name", "Class", "Result"]]);
    }
}
