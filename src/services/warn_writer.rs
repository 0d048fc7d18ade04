//! 警告写入服务 - 业务能力层
//!
//! 只负责"把无法识别的卡片写入 warn.txt"能力，不关心流程

use chrono::Local;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::FileError;
use crate::models::scan::RejectedCard;

/// 警告写入服务
///
/// 职责：
/// - 将被排除的卡片追加写入警告文件，方便老师事后核对
/// - 不修改结果映射
pub struct WarnWriter {
    warn_file_path: String,
}

impl WarnWriter {
    /// 创建新的警告写入服务
    pub fn new() -> Self {
        Self {
            warn_file_path: "warn.txt".to_string(),
        }
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            warn_file_path: path.into(),
        }
    }

    /// 写入一帧中被排除的卡片
    pub async fn write(&self, rejected: &[RejectedCard]) -> Result<(), FileError> {
        if rejected.is_empty() {
            return Ok(());
        }

        debug!(
            "写入警告: {} 张卡片 -> {}",
            rejected.len(),
            self.warn_file_path
        );

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let mut warn_msg = String::new();
        for card in rejected {
            warn_msg.push_str(&format!(
                "{} | 卡片: {} | 原因: {}\n",
                timestamp, card.raw, card.reason
            ));
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.warn_file_path)
            .await
            .map_err(|e| FileError::write_failed(&self.warn_file_path, e))?;

        file.write_all(warn_msg.as_bytes())
            .await
            .map_err(|e| FileError::write_failed(&self.warn_file_path, e))?;
        // tokio 的文件写入在后台线程完成，返回前必须 flush
        file.flush()
            .await
            .map_err(|e| FileError::write_failed(&self.warn_file_path, e))?;

        Ok(())
    }
}

impl Default for WarnWriter {
    fn default() -> Self {
        Self::new()
    }
}
