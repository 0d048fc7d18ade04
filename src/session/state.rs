//! 应用状态与状态转换
//!
//! 名单、结果映射和当前视图集中在一个 `AppState` 中，
//! 所有修改都通过纯函数 `reduce` 完成，命令行层只负责展示。

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::models::scan::ScanBatch;
use crate::models::student::Student;
use crate::session::results::ResultsMapping;
use crate::session::roster::Roster;
use crate::session::view::ViewState;

/// 应用状态
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    #[serde(default)]
    pub view: ViewState,
    /// 最近一次合并扫描结果的时间
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_scan_at: Option<DateTime<Local>>,
    #[serde(default)]
    pub roster: Roster,
    #[serde(default)]
    pub results: ResultsMapping,
}

/// 触发状态转换的事件
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// 名单导入成功（可能为空）
    RosterImported(Vec<Student>),
    /// 用户手动切换视图，任何视图都可达
    Navigated(ViewState),
    /// 一个扫描批次已成功返回
    ScanMerged { batch: ScanBatch, at: DateTime<Local> },
    /// 用户确认后的全部重置
    Reset,
}

/// 状态转换
pub fn reduce(mut state: AppState, event: SessionEvent) -> AppState {
    match event {
        SessionEvent::RosterImported(students) => {
            state.roster.replace(students);
            state.view = state.view.after_import(state.roster.len());
        }
        SessionEvent::Navigated(view) => {
            state.view = view;
        }
        SessionEvent::ScanMerged { batch, at } => {
            state.results.merge(&batch);
            state.last_scan_at = Some(at);
            state.view = state.view.after_scan_merged();
        }
        SessionEvent::Reset => {
            state = AppState::default();
        }
    }
    state
}

impl AppState {
    pub fn apply(self, event: SessionEvent) -> Self {
        reduce(self, event)
    }

    /// 扫描页在没有名单时只显示占位提示
    pub fn scan_available(&self) -> bool {
        !self.roster.is_empty()
    }
}
