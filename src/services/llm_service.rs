//! LLM 服务 - 业务能力层
//!
//! 只负责"看图读卡"能力，不关心名单和结果
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 图片以 `data:image/jpeg;base64,...` 形式随用户消息发送
//! - 兼容 OpenAI API 的服务（如 Gemini, Azure 等）

use std::future::Future;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImage,
        ChatCompletionRequestMessageContentPartText, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContent,
        ChatCompletionRequestUserMessageContentPart, CreateChatCompletionRequestArgs, ImageDetail,
        ImageUrl,
    },
    Client,
};
use base64::{engine::general_purpose, Engine as _};
use regex::Regex;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{ConfigError, ScanError};
use crate::models::scan::{DetectedCard, RejectedCard};
use crate::utils::logging::truncate_text;

const CARD_SYSTEM_PROMPT: &str = "你是识别 Plickers 风格答题卡的专家。\
    每张卡片是一个正方形，上面印有一个唯一的整数编号，并在四条边之一上有一个小三角标记（▲）。\
    你只输出 JSON，不输出任何解释。";

const CARD_USER_PROMPT: &str = r#"分析这张学生举卡的照片。三角标记的朝向决定答案：
- 指向上方 (Up): 答案 A
- 指向右方 (Right): 答案 B
- 指向下方 (Down): 答案 C
- 指向左方 (Left): 答案 D

对每一张识别到的卡片，返回卡片编号和三角标记的朝向。
只返回一个合法的 JSON 数组，每个元素形如：
{"id": <整数编号>, "direction": "Up" | "Right" | "Down" | "Left"}
两个字段都必须存在，direction 只能是这四个值之一。
如果照片中没有卡片，返回 []。"#;

/// 读卡能力
///
/// 输入一张 JPEG，输出模型的原始响应文本；解析由 `parse_card_response` 完成
pub trait CardReader {
    fn read_cards(&self, jpeg: &[u8]) -> impl Future<Output = Result<String, ScanError>> + Send;
}

/// LLM 服务
///
/// 职责：
/// - 调用视觉模型识别照片中的卡片
/// - 提供通用的 LLM 调用接口
/// - 不出现学生名单
/// - 不修改结果映射
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
    max_tokens: u32,
}

impl LlmService {
    /// 创建新的 LLM 服务，缺少 API 密钥时返回配置错误
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let api_key = config.require_api_key()?;

        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(&config.llm_api_base_url);

        Ok(Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
            max_tokens: config.llm_max_tokens,
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// 通用的 LLM 调用函数
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    /// - `imgs`: 图片 URL 列表（可选，支持 data URL），会追加到用户消息中
    ///
    /// # 返回
    /// 返回 LLM 的响应内容（字符串）；没有 choice 或 content 为空时返回 `EmptyResponse`
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
        imgs: Option<&[String]>,
    ) -> Result<String, ScanError> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let build_failed = |e: OpenAIError| ScanError::api_failed(&self.model_name, e);

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()
                .map_err(build_failed)?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        // 构建用户消息内容（支持图片）
        let user_msg = match imgs {
            Some(img_urls) if !img_urls.is_empty() => {
                let mut content_parts: Vec<ChatCompletionRequestUserMessageContentPart> =
                    Vec::new();

                content_parts.push(ChatCompletionRequestUserMessageContentPart::Text(
                    ChatCompletionRequestMessageContentPartText {
                        text: user_message.to_string(),
                    },
                ));

                for url in img_urls.iter() {
                    content_parts.push(ChatCompletionRequestUserMessageContentPart::ImageUrl(
                        ChatCompletionRequestMessageContentPartImage {
                            image_url: ImageUrl {
                                url: url.clone(),
                                // 卡片编号很小，需要高清
                                detail: Some(ImageDetail::High),
                            },
                        },
                    ));
                }

                debug!("使用 Vision API，包含 {} 张图片", img_urls.len());

                ChatCompletionRequestUserMessageArgs::default()
                    .content(ChatCompletionRequestUserMessageContent::Array(
                        content_parts,
                    ))
                    .build()
                    .map_err(build_failed)?
            }
            _ => ChatCompletionRequestUserMessageArgs::default()
                .content(user_message)
                .build()
                .map_err(build_failed)?,
        };

        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.0)
            .max_tokens(self.max_tokens)
            .build()
            .map_err(build_failed)?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            ScanError::api_failed(&self.model_name, e)
        })?;

        debug!("LLM API 调用成功");

        let choice = response
            .choices
            .first()
            .ok_or_else(|| ScanError::EmptyResponse {
                model: self.model_name.clone(),
            })?;

        let content = choice
            .message
            .content
            .as_deref()
            .ok_or_else(|| ScanError::EmptyResponse {
                model: self.model_name.clone(),
            })?;

        Ok(content.trim().to_string())
    }
}

impl CardReader for LlmService {
    async fn read_cards(&self, jpeg: &[u8]) -> Result<String, ScanError> {
        let data_url = format!(
            "data:image/jpeg;base64,{}",
            general_purpose::STANDARD.encode(jpeg)
        );
        debug!("图片大小: {} 字节", jpeg.len());

        let response = self
            .send_to_llm(
                CARD_USER_PROMPT,
                Some(CARD_SYSTEM_PROMPT),
                Some(std::slice::from_ref(&data_url)),
            )
            .await?;

        debug!("模型响应: {}", truncate_text(&response, 200));
        Ok(response)
    }
}

/// 解析模型返回的卡片列表
///
/// - `[]` 表示没有卡片
/// - 允许外层包裹 Markdown 代码块
/// - 空白响应、不是 JSON 或不是数组时整帧失败
/// - 单个元素缺字段 / 编号非法时只跳过该元素
pub fn parse_card_response(
    response: &str,
) -> Result<(Vec<DetectedCard>, Vec<RejectedCard>), ScanError> {
    let body = strip_code_fence(response.trim());
    if body.is_empty() {
        return Err(ScanError::BlankResponse);
    }

    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| ScanError::MalformedResponse {
            response: truncate_text(response, 200),
            source: e,
        })?;

    let serde_json::Value::Array(elements) = value else {
        return Err(ScanError::NotAnArray {
            response: truncate_text(response, 200),
        });
    };

    let mut cards = Vec::new();
    let mut rejected = Vec::new();

    for element in elements {
        match serde_json::from_value::<DetectedCard>(element.clone()) {
            Ok(card) => cards.push(card),
            Err(e) => {
                warn!("⚠️ 无法解析卡片 {}: {}", element, e);
                rejected.push(RejectedCard {
                    raw: element.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok((cards, rejected))
}

/// 去掉 ```json ... ``` 包裹
fn strip_code_fence(text: &str) -> &str {
    if let Ok(re) = Regex::new(r"(?s)^```[A-Za-z]*\s*(.*?)\s*```$") {
        if let Some(inner) = re.captures(text).and_then(|caps| caps.get(1)) {
            return inner.as_str();
        }
    }
    text
}
