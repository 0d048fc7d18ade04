//! # Plickers Scan
//!
//! 一个用于课堂答题卡扫描的 Rust 应用程序：导入班级名单，拍摄学生举卡的照片，
//! 交给视觉模型读取卡片编号和三角标记朝向，统计并导出每个学生的答案。
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（相机），只暴露能力
//! - `CameraSession` - 唯一的相机持有者，Drop 时释放
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `LlmService` - 看图读卡能力
//! - `classifier` - 朝向 → 答案
//! - `report` - 统计 / 筛选
//! - `ExportWriter` / `WarnWriter` - 写导出文件 / 写 warn.txt
//!
//! ### ③ 会话层（Session）
//! - `session/` - 名单、结果映射、当前视图，纯函数状态转换
//!
//! ### ④ 流程层（Workflow）
//! - `workflow/` - 定义"一帧图像"的完整处理流程（拍照 → 读卡 → 分类）
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/` - 命令调度、会话持久化
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod session;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{Answer, Bucket, Direction, ScanEntry, Student, StudentWithResult};
pub use orchestrator::{App, ScanSummary};
pub use services::{aggregate, classify, filter, Filter};
pub use session::{reduce, AppState, ResultsMapping, Roster, SessionEvent, ViewState};
pub use workflow::{ScanFlow, ScanOutcome, ScanReport};
