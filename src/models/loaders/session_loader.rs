use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tokio::fs;
use tracing::{debug, info};

use crate::error::FileError;
use crate::session::AppState;

/// 会话锁
///
/// 持有期间其他进程无法"加载 → 修改 → 保存"同一个会话文件，
/// 释放（Drop）时解锁。锁在 `<会话文件>.lock` 上，不影响会话文件本身的重命名。
#[derive(Debug)]
pub struct SessionLock {
    file: std::fs::File,
    path: PathBuf,
}

impl Drop for SessionLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            debug!("释放会话锁失败 {}: {}", self.path.display(), e);
        }
    }
}

/// 尝试锁定会话文件
///
/// 已被其他进程（或同一进程中的另一个锁）持有时返回 `Ok(None)`，不等待
pub fn try_lock_session(session_file_path: &Path) -> Result<Option<SessionLock>, FileError> {
    let lock_path = lock_path(session_file_path);
    let path_str = lock_path.display().to_string();

    let file = std::fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)
        .map_err(|e| FileError::write_failed(&path_str, e))?;

    match file.try_lock_exclusive() {
        Ok(()) => {
            debug!("🔒 已锁定会话: {}", path_str);
            Ok(Some(SessionLock {
                file,
                path: lock_path,
            }))
        }
        Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
            debug!("会话已被锁定: {}", path_str);
            Ok(None)
        }
        Err(e) => Err(FileError::write_failed(&path_str, e)),
    }
}

fn lock_path(session_file_path: &Path) -> PathBuf {
    let mut name = OsString::from(session_file_path.as_os_str());
    name.push(".lock");
    PathBuf::from(name)
}

/// 从 TOML 会话文件加载状态，文件不存在时返回初始状态
pub async fn load_session(session_file_path: &Path) -> Result<AppState, FileError> {
    let path_str = session_file_path.display().to_string();

    let content = match fs::read_to_string(session_file_path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("会话文件不存在，使用初始状态: {}", path_str);
            return Ok(AppState::default());
        }
        Err(e) => {
            return Err(FileError::ReadFailed {
                path: path_str,
                source: e,
            })
        }
    };

    let state: AppState = toml::from_str(&content).map_err(|e| FileError::SessionParseFailed {
        path: path_str.clone(),
        source: e,
    })?;

    debug!(
        "已加载会话: {} 名学生, {} 条结果, 视图 {}",
        state.roster.len(),
        state.results.len(),
        state.view
    );
    Ok(state)
}

/// 保存状态到 TOML 会话文件
///
/// 先在同一目录写入唯一命名的临时文件再重命名，失败时原文件保持不变
pub async fn save_session(session_file_path: &Path, state: &AppState) -> Result<(), FileError> {
    let path_str = session_file_path.display().to_string();
    let content = toml::to_string(state)?;

    let target = session_file_path.to_path_buf();
    let target_str = path_str.clone();
    tokio::task::spawn_blocking(move || write_atomically(&target, &target_str, &content))
        .await
        .map_err(|e| FileError::write_failed(&path_str, e))??;

    info!("💾 会话已保存: {}", path_str);
    Ok(())
}

fn write_atomically(target: &Path, target_str: &str, content: &str) -> Result<(), FileError> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| FileError::write_failed(dir.display().to_string(), e))?;
    tmp.write_all(content.as_bytes())
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| FileError::write_failed(tmp.path().display().to_string(), e))?;
    tmp.persist(target)
        .map_err(|e| FileError::write_failed(target_str, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::answer::Answer;
    use crate::models::scan::ScanEntry;
    use crate::models::student::Student;
    use crate::session::{SessionEvent, ViewState};

    #[tokio::test]
    async fn test_missing_file_gives_initial_state() {
        let dir = tempfile::tempdir().unwrap();
        let state = load_session(&dir.path().join("none.toml")).await.unwrap();
        assert_eq!(state, AppState::default());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");

        let state = AppState::default()
            .apply(SessionEvent::RosterImported(vec![
                Student::new("1", "An", "10A"),
                Student::new("2", "Bình", "10A"),
            ]))
            .apply(SessionEvent::ScanMerged {
                batch: vec![ScanEntry::new("1", Answer::A), ScanEntry::new("99", Answer::D)],
                at: chrono::Local::now(),
            });

        save_session(&path, &state).await.unwrap();
        let loaded = load_session(&path).await.unwrap();

        assert_eq!(loaded.view, ViewState::Results);
        assert_eq!(loaded.roster, state.roster);
        assert_eq!(loaded.results, state.results);
        assert!(loaded.last_scan_at.is_some());
    }

    #[tokio::test]
    async fn test_save_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");

        save_session(&path, &AppState::default()).await.unwrap();
        save_session(&path, &AppState::default()).await.unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["session.toml".to_string()]);
    }

    #[tokio::test]
    async fn test_concurrent_saves_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");
        let first = AppState::default().apply(SessionEvent::Navigated(ViewState::Scan));
        let second = AppState::default().apply(SessionEvent::Navigated(ViewState::Results));

        let (a, b) = tokio::join!(save_session(&path, &first), save_session(&path, &second));
        a.unwrap();
        b.unwrap();

        let loaded = load_session(&path).await.unwrap();
        assert!(loaded == first || loaded == second);
    }

    #[test]
    fn test_session_lock_is_exclusive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");

        let held = try_lock_session(&path).unwrap();
        assert!(held.is_some());
        assert!(try_lock_session(&path).unwrap().is_none());

        drop(held);
        assert!(try_lock_session(&path).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");
        std::fs::write(&path, "view = [not toml").unwrap();

        let err = load_session(&path).await.unwrap_err();
        assert!(matches!(err, FileError::SessionParseFailed { .. }));
    }
}
