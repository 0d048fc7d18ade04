//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责命令调度和会话持久化，是整个系统的"指挥中心"。
//!
//! ## 层次关系
//!
//! ```text
//! orchestrator::App (每个命令：加载会话 → 执行 → 保存会话)
//!     ↓
//! workflow::ScanFlow (处理单帧图像)
//!     ↓
//! services (能力层：读卡 / 分类 / 统计 / 导出 / 警告)
//!     ↓
//! infrastructure (基础设施：相机)
//! ```
//!
//! ## 设计原则
//!
//! 1. **状态集中**：只有编排层读写会话文件，修改会话的命令持有会话锁
//! 2. **资源隔离**：相机只在单帧扫描期间存在
//! 3. **向下依赖**：编排层 → workflow → services → infrastructure
//! 4. **无业务逻辑**：状态转换交给 `session::reduce`

pub mod app;

pub use app::{App, ScanSummary};
