//! 扫描流程 - 流程层
//!
//! 核心职责：定义"一帧图像"的完整处理流程
//!
//! 流程顺序：
//! 1. 占用扫描开关（已有扫描在进行时直接返回 Busy）
//! 2. 拍照 → 模型读卡 → 解析 → 分类
//! 3. 被排除的卡片写入 warn.txt
//! 4. 释放扫描开关
//!
//! 合并结果由调用方完成；任何失败都不会产生部分批次。

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use crate::error::{AppError, ScanError};
use crate::infrastructure::{Camera, CameraSession};
use crate::models::scan::{RejectedCard, ScanBatch};
use crate::services::{classify_cards, parse_card_response, CardReader, WarnWriter};

/// 一帧图像的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    /// 可以合并的批次
    pub batch: ScanBatch,
    /// 被排除的卡片
    pub rejected: Vec<RejectedCard>,
}

impl ScanReport {
    /// 模型返回的卡片总数
    pub fn detected(&self) -> usize {
        self.batch.len() + self.rejected.len()
    }
}

/// 扫描结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// 扫描完成
    Completed(ScanReport),
    /// 已有扫描在进行，本次触发被忽略
    Busy,
}

/// 扫描开关，Drop 时自动释放
struct ScanGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> ScanGuard<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// 扫描流程
///
/// - 编排一帧图像的处理
/// - 保证同一时间只有一次扫描
/// - 不持有名单和结果
pub struct ScanFlow<R: CardReader> {
    reader: R,
    warn_writer: WarnWriter,
    scanning: AtomicBool,
}

impl<R: CardReader> ScanFlow<R> {
    pub fn new(reader: R, warn_writer: WarnWriter) -> Self {
        Self {
            reader,
            warn_writer,
            scanning: AtomicBool::new(false),
        }
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning.load(Ordering::Acquire)
    }

    /// 拍照并扫描
    pub async fn capture_and_scan<C: Camera>(
        &self,
        camera: &mut CameraSession<C>,
    ) -> Result<ScanOutcome, AppError> {
        let Some(_guard) = ScanGuard::try_acquire(&self.scanning) else {
            info!("⏳ 正在扫描中，忽略本次触发");
            return Ok(ScanOutcome::Busy);
        };

        let jpeg = camera.capture().await?;
        let report = self.process_frame(&jpeg).await?;
        Ok(ScanOutcome::Completed(report))
    }

    /// 扫描一张已拍好的 JPEG
    pub async fn scan_frame(&self, jpeg: &[u8]) -> Result<ScanOutcome, ScanError> {
        let Some(_guard) = ScanGuard::try_acquire(&self.scanning) else {
            info!("⏳ 正在扫描中，忽略本次触发");
            return Ok(ScanOutcome::Busy);
        };

        Ok(ScanOutcome::Completed(self.process_frame(jpeg).await?))
    }

    async fn process_frame(&self, jpeg: &[u8]) -> Result<ScanReport, ScanError> {
        info!("🔍 正在识别卡片...");

        let response = self.reader.read_cards(jpeg).await?;
        let (cards, mut rejected) = parse_card_response(&response)?;

        let classified = classify_cards(cards);
        rejected.extend(classified.rejected);

        let report = ScanReport {
            batch: classified.batch,
            rejected,
        };

        info!(
            "✓ 识别到 {} 张卡片，有效 {} 张，跳过 {} 张",
            report.detected(),
            report.batch.len(),
            report.rejected.len()
        );

        // 警告文件写失败不影响本次扫描
        if let Err(e) = self.warn_writer.write(&report.rejected).await {
            warn!("⚠️ 写入警告文件失败: {}", e);
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::answer::Answer;
    use crate::models::scan::ScanEntry;
    use std::sync::Arc;
    use tokio::sync::Notify;

    /// 返回固定响应的读卡器
    struct FixedReader(Result<String, String>);

    impl CardReader for FixedReader {
        async fn read_cards(&self, _jpeg: &[u8]) -> Result<String, ScanError> {
            self.0.clone().map_err(|_| ScanError::EmptyResponse {
                model: "test".to_string(),
            })
        }
    }

    /// 等待通知后才返回的读卡器
    struct SlowReader {
        release: Arc<Notify>,
    }

    impl CardReader for SlowReader {
        async fn read_cards(&self, _jpeg: &[u8]) -> Result<String, ScanError> {
            self.release.notified().await;
            Ok(r#"[{"id": 1, "direction": "Right"}]"#.to_string())
        }
    }

    fn warn_writer(dir: &tempfile::TempDir) -> WarnWriter {
        WarnWriter::with_path(dir.path().join("warn.txt").to_string_lossy())
    }

    #[tokio::test]
    async fn test_scan_classifies_cards() {
        let dir = tempfile::tempdir().unwrap();
        let flow = ScanFlow::new(
            FixedReader(Ok(
                r#"[{"id": 1, "direction": "Up"}, {"id": 2, "direction": "Down"}]"#.to_string(),
            )),
            warn_writer(&dir),
        );

        let outcome = flow.scan_frame(b"jpeg").await.unwrap();
        let ScanOutcome::Completed(report) = outcome else {
            panic!("应该完成扫描");
        };
        assert_eq!(
            report.batch,
            vec![ScanEntry::new("1", Answer::A), ScanEntry::new("2", Answer::C)]
        );
        assert!(!flow.is_scanning());
    }

    #[tokio::test]
    async fn test_no_cards_is_empty_batch() {
        let dir = tempfile::tempdir().unwrap();
        let flow = ScanFlow::new(FixedReader(Ok("[]".to_string())), warn_writer(&dir));

        let outcome = flow.scan_frame(b"jpeg").await.unwrap();
        assert_eq!(
            outcome,
            ScanOutcome::Completed(ScanReport {
                batch: Vec::new(),
                rejected: Vec::new(),
            })
        );
    }

    #[tokio::test]
    async fn test_failure_releases_gate() {
        let dir = tempfile::tempdir().unwrap();
        let flow = ScanFlow::new(FixedReader(Err("down".to_string())), warn_writer(&dir));

        assert!(flow.scan_frame(b"jpeg").await.is_err());
        assert!(!flow.is_scanning());
    }

    #[tokio::test]
    async fn test_malformed_response_fails_whole_frame() {
        let dir = tempfile::tempdir().unwrap();
        let flow = ScanFlow::new(
            FixedReader(Ok("Tôi thấy 3 thẻ".to_string())),
            warn_writer(&dir),
        );

        let err = flow.scan_frame(b"jpeg").await.unwrap_err();
        assert!(matches!(err, ScanError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_blank_response_is_not_an_empty_frame() {
        let dir = tempfile::tempdir().unwrap();
        let flow = ScanFlow::new(FixedReader(Ok("  ".to_string())), warn_writer(&dir));

        let err = flow.scan_frame(b"jpeg").await.unwrap_err();
        assert!(matches!(err, ScanError::BlankResponse));
        assert!(!flow.is_scanning());
    }

    #[tokio::test]
    async fn test_rejected_cards_go_to_warn_file() {
        let dir = tempfile::tempdir().unwrap();
        let flow = ScanFlow::new(
            FixedReader(Ok(
                r#"[{"id": 1, "direction": "Up"}, {"id": 2, "direction": "North"}]"#.to_string(),
            )),
            warn_writer(&dir),
        );

        let ScanOutcome::Completed(report) = flow.scan_frame(b"jpeg").await.unwrap() else {
            panic!("应该完成扫描");
        };
        assert_eq!(report.batch.len(), 1);
        assert_eq!(report.detected(), 2);

        let warn = std::fs::read_to_string(dir.path().join("warn.txt")).unwrap();
        assert!(warn.contains("North"));
    }

    #[tokio::test]
    async fn test_second_trigger_while_scanning_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let release = Arc::new(Notify::new());
        let flow = ScanFlow::new(
            SlowReader {
                release: release.clone(),
            },
            warn_writer(&dir),
        );

        let (first, second) = tokio::join!(flow.scan_frame(b"one"), async {
            let outcome = flow.scan_frame(b"two").await;
            release.notify_one();
            outcome
        });

        assert!(matches!(first.unwrap(), ScanOutcome::Completed(_)));
        assert_eq!(second.unwrap(), ScanOutcome::Busy);
        assert!(!flow.is_scanning());
    }
}
