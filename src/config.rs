use crate::error::ConfigError;

/// 默认使用 Gemini 的 OpenAI 兼容端点
const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 会话文件（名单 + 结果 + 当前视图）
    pub session_file: String,
    /// 导出目录
    pub export_dir: String,
    /// 无法识别的卡片写入的文件
    pub warn_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub llm_max_tokens: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session_file: "plickers_session.toml".to_string(),
            export_dir: ".".to_string(),
            warn_file: "warn.txt".to_string(),
            verbose_logging: false,
            llm_api_key: String::new(),
            llm_api_base_url: DEFAULT_API_BASE_URL.to_string(),
            llm_model_name: "gemini-3-flash-preview".to_string(),
            llm_max_tokens: 4096,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            session_file: std::env::var("SESSION_FILE").unwrap_or(default.session_file),
            export_dir: std::env::var("EXPORT_DIR").unwrap_or(default.export_dir),
            warn_file: std::env::var("WARN_FILE").unwrap_or(default.warn_file),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            llm_api_key: std::env::var("LLM_API_KEY")
                .or_else(|_| std::env::var("GEMINI_API_KEY"))
                .unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            llm_max_tokens: std::env::var("LLM_MAX_TOKENS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.llm_max_tokens),
        }
    }

    /// 扫描前检查密钥，导入 / 查看结果不需要
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        if self.llm_api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(&self.llm_api_key)
    }
}
