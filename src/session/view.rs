use serde::{Deserialize, Serialize};

/// 当前视图
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewState {
    #[default]
    Import,
    Scan,
    Results,
}

impl ViewState {
    pub fn name(self) -> &'static str {
        match self {
            ViewState::Import => "import",
            ViewState::Scan => "scan",
            ViewState::Results => "results",
        }
    }

    /// 导入完成后的视图：名单非空时自动进入扫描
    pub fn after_import(self, roster_len: usize) -> Self {
        if roster_len > 0 {
            ViewState::Scan
        } else {
            self
        }
    }

    /// 扫描批次合并成功后自动进入结果页
    pub fn after_scan_merged(self) -> Self {
        ViewState::Results
    }
}

impl std::fmt::Display for ViewState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ViewState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "import" => Ok(ViewState::Import),
            "scan" => Ok(ViewState::Scan),
            "results" => Ok(ViewState::Results),
            other => Err(format!("未知视图: {}", other)),
        }
    }
}
