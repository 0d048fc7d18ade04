//! 会话层（Session）
//!
//! 持有全部可变状态：名单、结果映射、当前视图。
//! 不做任何 IO，所有转换都是纯函数，便于测试。

pub mod results;
pub mod roster;
pub mod state;
pub mod view;

pub use results::ResultsMapping;
pub use roster::Roster;
pub use state::{reduce, AppState, SessionEvent};
pub use view::ViewState;
