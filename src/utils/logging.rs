/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::session::AppState;

/// 初始化 tracing 日志
///
/// 优先使用 `RUST_LOG`，否则默认 `info`（详细模式为 `debug`）
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录导入结果
///
/// # 参数
/// - `imported`: 导入的学生数
/// - `dropped_incomplete`: 缺少 ID 或姓名的行数
/// - `dropped_duplicates`: 重复 ID 的行数
pub fn log_import_summary(imported: usize, dropped_incomplete: usize, dropped_duplicates: usize) {
    info!("{}", "=".repeat(60));
    info!("📋 导入完成: {} 名学生", imported);
    if dropped_incomplete > 0 {
        info!("⚠️ 丢弃缺少 ID 或姓名的行: {}", dropped_incomplete);
    }
    if dropped_duplicates > 0 {
        info!("⚠️ 丢弃重复 ID 的行: {}", dropped_duplicates);
    }
    info!("{}", "=".repeat(60));
}

/// 打印多帧扫描的统计信息
///
/// # 参数
/// - `success`: 成功帧数
/// - `failed`: 失败帧数
/// - `merged`: 合并的答案条数
pub fn print_scan_stats(success: usize, failed: usize, merged: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📊 扫描完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", success, success + failed);
    info!("❌ 失败: {}", failed);
    info!("📝 合并答案: {} 条", merged);
    info!("{}", "=".repeat(60));
}

/// 状态栏：名单人数、已扫描人数、当前视图
pub fn status_line(state: &AppState) -> String {
    let mut line = format!(
        "👥 {} 名学生 | ✅ {} 已扫描 | 🧭 视图: {}",
        state.roster.len(),
        state.results.len(),
        state.view
    );
    if let Some(at) = state.last_scan_at {
        line.push_str(&format!(" | 🕒 上次扫描: {}", at.format("%Y-%m-%d %H:%M:%S")));
    }
    line
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::student::Student;
    use crate::session::SessionEvent;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("abc", 5), "abc");
        assert_eq!(truncate_text("Nguyễn Văn An", 6), "Nguyễn...");
    }

    #[test]
    fn test_status_line() {
        let state = AppState::default()
            .apply(SessionEvent::RosterImported(vec![Student::new("1", "An", "10A")]));
        let line = status_line(&state);
        assert!(line.contains("1 名学生"));
        assert!(line.contains("0 已扫描"));
        assert!(line.contains("scan"));
    }
}
