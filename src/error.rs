use thiserror::Error;

/// 应用程序错误类型
///
/// 每一类错误都在发生的边界被捕获并转换为用户可读的提示，不会让程序崩溃。
#[derive(Debug, Error)]
pub enum AppError {
    /// 名单导入错误
    #[error("导入错误: {0}")]
    Import(#[from] ImportError),
    /// 图像来源（相机）错误
    #[error("相机错误: {0}")]
    Camera(#[from] CameraError),
    /// 扫描 / 模型调用错误
    #[error("扫描错误: {0}")]
    Scan(#[from] ScanError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 名单导入错误
///
/// 导入是全有或全无的：任何一个错误都意味着本次导入零个学生。
#[derive(Debug, Error)]
pub enum ImportError {
    /// 不支持的文件类型
    #[error("不支持的文件类型: {path}（支持 .xlsx / .xls / .ods / .csv）")]
    UnsupportedFormat { path: String },
    /// 表格无法打开或解析
    #[error("无法解析表格 ({path}): {source}")]
    Unreadable {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 工作簿中没有任何工作表
    #[error("工作簿中没有工作表: {path}")]
    NoSheet { path: String },
}

/// 图像来源错误（相当于“无法打开相机”）
#[derive(Debug, Error)]
pub enum CameraError {
    /// 图像文件不存在
    #[error("找不到图像: {path}")]
    NotFound { path: String },
    /// 读取失败（权限等）
    #[error("无法读取图像 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 不是 JPEG 图像
    #[error("图像不是 JPEG 格式: {path}")]
    NotJpeg { path: String },
    /// 相机已被释放
    #[error("相机会话已释放")]
    Released,
}

/// 扫描错误
///
/// 任何一种都会让整帧扫描失败，不会产生部分结果。
#[derive(Debug, Error)]
pub enum ScanError {
    /// 模型 API 调用失败（网络、鉴权、请求构建）
    #[error("模型 API 调用失败 (模型: {model}): {source}")]
    ApiCallFailed {
        model: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 模型返回结果为空
    #[error("模型返回结果为空 (模型: {model})")]
    EmptyResponse { model: String },
    /// 返回内容为空白（拒答、内容过滤等），不能当作"没有卡片"
    #[error("模型返回了空内容，无法判断照片中是否有卡片")]
    BlankResponse,
    /// 返回内容不是合法 JSON
    #[error("无法解析模型返回的 JSON (响应: {response}): {source}")]
    MalformedResponse {
        response: String,
        #[source]
        source: serde_json::Error,
    },
    /// 返回的 JSON 不是数组
    #[error("模型返回的 JSON 不是数组 (响应: {response})")]
    NotAnArray { response: String },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 会话文件 TOML 解析失败
    #[error("会话文件解析失败 ({path}): {source}")]
    SessionParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 会话序列化失败
    #[error("会话序列化失败: {0}")]
    SessionSerializeFailed(#[from] toml::ser::Error),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 缺少 API 密钥
    #[error("未设置模型 API 密钥（请设置 LLM_API_KEY 或 GEMINI_API_KEY）")]
    MissingApiKey,
}

// ========== 便捷构造函数 ==========

impl ScanError {
    /// 创建模型 API 调用错误
    pub fn api_failed(
        model: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ScanError::ApiCallFailed {
            model: model.into(),
            source: Box::new(source),
        }
    }
}

impl ImportError {
    /// 创建表格解析错误
    pub fn unreadable(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ImportError::Unreadable {
            path: path.into(),
            source: Box::new(source),
        }
    }
}

impl FileError {
    /// 创建文件写入错误
    pub fn write_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        FileError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
