//! 应用 - 编排层
//!
//! ## 职责
//!
//! 每个命令都按同一顺序执行：加锁 → 加载会话 → 调用能力 → 状态转换 → 保存会话 → 输出状态栏。
//! 任何失败都在这里被转换为提示信息，会话文件不会被部分写入。
//!
//! 会话锁跨进程生效：扫描进行中再次触发扫描会被忽略（busy），
//! 其他修改会话的命令则直接报错，不会覆盖扫描结果。

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::infrastructure::{CameraSession, ImageFileCamera};
use crate::models::{load_roster, load_session, save_session, try_lock_session, SessionLock};
use crate::services::report::{self, Filter};
use crate::services::{ExportWriter, LlmService, WarnWriter};
use crate::session::{AppState, SessionEvent, ViewState};
use crate::utils::logging;
use crate::workflow::{ScanFlow, ScanOutcome};

/// 一次 `scan` 命令的结果
#[derive(Debug, Clone, PartialEq)]
pub struct ScanSummary {
    /// 保存后的状态
    pub state: AppState,
    /// 失败的照片数（结果映射未受影响）
    pub failed: usize,
    /// 另一个扫描正在进行，本次触发被忽略
    pub busy: bool,
}

/// 应用主结构
pub struct App {
    config: Config,
    session_path: PathBuf,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Self {
        let session_path = PathBuf::from(&config.session_file);
        info!("📂 会话文件: {}", session_path.display());
        Self {
            config,
            session_path,
        }
    }

    /// 导入名单
    ///
    /// 解析失败时名单保持不变
    pub async fn import(&self, file: &Path) -> Result<AppState> {
        let _lock = self.lock()?;
        let state = self.load().await?;

        info!("📁 正在导入名单: {}", file.display());
        let imported = load_roster(file)
            .await
            .with_context(|| format!("无法导入名单，原名单保持不变: {}", file.display()))?;

        logging::log_import_summary(
            imported.students.len(),
            imported.dropped_incomplete,
            imported.dropped_duplicates,
        );
        if imported.students.is_empty() {
            warn!("⚠️ 文件中没有有效的学生行");
        }

        let state = state.apply(SessionEvent::RosterImported(imported.students));
        self.save(&state).await?;
        Ok(state)
    }

    /// 扫描一张或多张照片（按顺序逐张处理）
    ///
    /// 单张失败只影响这一张，结果映射不做部分合并；
    /// 失败数通过 `ScanSummary::failed` 返回，由调用方决定退出码
    pub async fn scan(&self, images: &[PathBuf]) -> Result<ScanSummary> {
        let Some(_lock) = self.try_lock()? else {
            println!("⏳ 另一个扫描正在进行，本次触发已忽略。");
            return Ok(ScanSummary {
                state: self.load().await?,
                failed: 0,
                busy: true,
            });
        };

        let mut state = self
            .load()
            .await?
            .apply(SessionEvent::Navigated(ViewState::Scan));

        if !state.scan_available() {
            println!("ℹ️ 还没有学生名单。请先使用 `import` 导入名单，再开始扫描。");
            self.save(&state).await?;
            return Ok(ScanSummary {
                state,
                failed: 0,
                busy: false,
            });
        }

        let llm_service = LlmService::new(&self.config)?;
        info!("🤖 使用模型: {}", llm_service.model_name());
        let flow = ScanFlow::new(llm_service, WarnWriter::with_path(&self.config.warn_file));

        let mut success = 0;
        let mut failed = 0;
        let mut merged = 0;

        for (idx, image) in images.iter().enumerate() {
            info!("[照片 {}/{}] {}", idx + 1, images.len(), image.display());

            let camera = match ImageFileCamera::open(image) {
                Ok(camera) => camera,
                Err(e) => {
                    error!("[照片 {}] ❌ 无法打开相机: {}", idx + 1, e);
                    failed += 1;
                    continue;
                }
            };
            let mut camera = CameraSession::new(camera);

            match flow.capture_and_scan(&mut camera).await {
                Ok(ScanOutcome::Completed(report)) => {
                    success += 1;
                    merged += report.batch.len();
                    println!(
                        "✓ 照片 {}: 识别 {} 张卡片，记录 {} 个答案",
                        idx + 1,
                        report.detected(),
                        report.batch.len()
                    );
                    state = state.apply(SessionEvent::ScanMerged {
                        batch: report.batch,
                        at: Local::now(),
                    });
                }
                Ok(ScanOutcome::Busy) => {
                    warn!("[照片 {}] 正在扫描中，已忽略", idx + 1);
                }
                Err(e) => {
                    error!("[照片 {}] ❌ 处理图像失败，请在光线充足处重新拍摄: {}", idx + 1, e);
                    failed += 1;
                }
            }
        }

        if images.len() > 1 {
            logging::print_scan_stats(success, failed, merged);
        }

        self.save(&state).await?;

        Ok(ScanSummary {
            state,
            failed,
            busy: false,
        })
    }

    /// 显示统计图和学生列表
    ///
    /// 会话被锁定时照常显示，只是不记录视图切换
    pub async fn results(&self, filter: Filter) -> Result<AppState> {
        let lock = self.try_lock()?;
        let state = self
            .load()
            .await?
            .apply(SessionEvent::Navigated(ViewState::Results));

        let counts = report::aggregate(&state.roster, &state.results);
        let rows = report::filter(&state.roster, &state.results, filter);

        println!("答案统计\n{}", "─".repeat(60));
        print!("{}", report::render_chart(&counts));
        println!();
        print!("{}", report::render_table(&rows, filter));

        if lock.is_some() {
            self.save(&state).await?;
        }
        Ok(state)
    }

    /// 导出结果表格
    pub async fn export(&self, export_dir: Option<&Path>) -> Result<PathBuf> {
        let state = self.load().await?;
        let dir = export_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(&self.config.export_dir));

        let rows = report::join(&state.roster, &state.results);
        let path = ExportWriter::new(dir)
            .write(&rows, Local::now().date_naive())
            .await
            .context("导出失败")?;

        println!("📄 已导出: {}", path.display());
        Ok(path)
    }

    /// 手动切换视图
    pub async fn navigate(&self, view: ViewState) -> Result<AppState> {
        let _lock = self.lock()?;
        let state = self.load().await?.apply(SessionEvent::Navigated(view));
        if view == ViewState::Scan && !state.scan_available() {
            println!("ℹ️ 还没有学生名单。请先使用 `import` 导入名单。");
        }
        self.save(&state).await?;
        Ok(state)
    }

    /// 清空名单和结果，回到导入页（调用方负责确认）
    pub async fn reset(&self) -> Result<AppState> {
        let _lock = self.lock()?;
        let state = self.load().await?.apply(SessionEvent::Reset);
        self.save(&state).await?;
        info!("🗑️ 已清空全部数据");
        Ok(state)
    }

    /// 当前状态
    pub async fn status(&self) -> Result<AppState> {
        self.load().await
    }

    fn try_lock(&self) -> Result<Option<SessionLock>> {
        try_lock_session(&self.session_path).context("无法锁定会话")
    }

    fn lock(&self) -> Result<SessionLock> {
        self.try_lock()?
            .ok_or_else(|| anyhow!("会话正被另一个命令使用（可能正在扫描），请稍后再试"))
    }

    async fn load(&self) -> Result<AppState> {
        load_session(&self.session_path)
            .await
            .context("无法加载会话")
    }

    async fn save(&self, state: &AppState) -> Result<()> {
        save_session(&self.session_path, state)
            .await
            .context("无法保存会话")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_app(dir: &tempfile::TempDir) -> App {
        App::initialize(Config {
            session_file: dir.path().join("session.toml").to_string_lossy().to_string(),
            export_dir: dir.path().join("out").to_string_lossy().to_string(),
            warn_file: dir.path().join("warn.txt").to_string_lossy().to_string(),
            ..Config::default()
        })
    }

    #[tokio::test]
    async fn test_import_then_export() {
        let dir = tempfile::tempdir().unwrap();
        let roster = dir.path().join("roster.csv");
        std::fs::write(&roster, "ID,Họ tên,Lớp\n1,An,10A\n2,Bình,10A\n").unwrap();

        let app = test_app(&dir);
        let state = app.import(&roster).await.unwrap();
        assert_eq!(state.view, ViewState::Scan);
        assert_eq!(state.roster.len(), 2);

        let path = app.export(None).await.unwrap();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("xlsx"));

        // 导出的工作簿可以作为名单重新导入
        let reimported = load_roster(&path).await.unwrap();
        assert_eq!(reimported.students, state.roster.students().to_vec());
    }

    #[tokio::test]
    async fn test_failed_import_keeps_roster() {
        let dir = tempfile::tempdir().unwrap();
        let roster = dir.path().join("roster.csv");
        std::fs::write(&roster, "ID,Name\n1,An\n").unwrap();

        let app = test_app(&dir);
        app.import(&roster).await.unwrap();

        let broken = dir.path().join("broken.xlsx");
        std::fs::write(&broken, "not a workbook").unwrap();
        assert!(app.import(&broken).await.is_err());

        let state = app.status().await.unwrap();
        assert_eq!(state.roster.len(), 1);
    }

    #[tokio::test]
    async fn test_scan_without_roster_shows_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir);

        // 没有名单时不需要 API 密钥，也不会打开相机
        let summary = app.scan(&[dir.path().join("missing.jpg")]).await.unwrap();
        assert_eq!(summary.state.view, ViewState::Scan);
        assert!(summary.state.results.is_empty());
        assert_eq!(summary.failed, 0);
    }

    #[tokio::test]
    async fn test_scan_requires_api_key() {
        let dir = tempfile::tempdir().unwrap();
        let roster = dir.path().join("roster.csv");
        std::fs::write(&roster, "ID,Name\n1,An\n").unwrap();

        let app = test_app(&dir);
        app.import(&roster).await.unwrap();
        assert!(app.scan(&[dir.path().join("photo.jpg")]).await.is_err());
    }

    #[tokio::test]
    async fn test_failed_frames_are_counted_and_state_saved() {
        let dir = tempfile::tempdir().unwrap();
        let roster = dir.path().join("roster.csv");
        std::fs::write(&roster, "ID,Name\n1,An\n").unwrap();

        let app = App::initialize(Config {
            llm_api_key: "test-key".to_string(),
            ..test_app(&dir).config
        });
        app.import(&roster).await.unwrap();

        // 相机打不开，不会发出任何请求
        let images = [dir.path().join("missing.jpg"), dir.path().join("also-missing.jpg")];
        let summary = app.scan(&images).await.unwrap();
        assert_eq!(summary.failed, 2);
        assert!(!summary.busy);
        assert_eq!(summary.state.view, ViewState::Scan);
        assert_eq!(app.status().await.unwrap(), summary.state);
    }

    #[tokio::test]
    async fn test_scan_while_session_locked_is_busy() {
        let dir = tempfile::tempdir().unwrap();
        let roster = dir.path().join("roster.csv");
        std::fs::write(&roster, "ID,Name\n1,An\n").unwrap();

        let app = test_app(&dir);
        app.import(&roster).await.unwrap();
        let before = app.status().await.unwrap();

        // 模拟另一个进程正在扫描
        let held = try_lock_session(&app.session_path).unwrap().unwrap();

        let summary = app.scan(&[dir.path().join("photo.jpg")]).await.unwrap();
        assert!(summary.busy);
        assert_eq!(summary.state, before);
        assert!(app.navigate(ViewState::Import).await.is_err());
        assert!(app.reset().await.is_err());

        // 查看结果不受影响，但不记录视图
        let shown = app.results(Filter::All).await.unwrap();
        assert_eq!(shown.view, ViewState::Results);
        assert_eq!(app.status().await.unwrap().view, ViewState::Scan);

        drop(held);
        assert_eq!(app.reset().await.unwrap(), AppState::default());
    }

    #[tokio::test]
    async fn test_reset_and_navigate() {
        let dir = tempfile::tempdir().unwrap();
        let roster = dir.path().join("roster.csv");
        std::fs::write(&roster, "ID,Name\n1,An\n").unwrap();

        let app = test_app(&dir);
        app.import(&roster).await.unwrap();
        let state = app.navigate(ViewState::Results).await.unwrap();
        assert_eq!(state.view, ViewState::Results);

        let state = app.reset().await.unwrap();
        assert_eq!(state, AppState::default());
        assert_eq!(app.status().await.unwrap(), AppState::default());
    }
}
