use serde::{Deserialize, Serialize};

use crate::models::answer::Answer;

/// 模型识别出的一张卡片（尚未分类）
///
/// `direction` 保留原始字符串，由分类器决定是否合法
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DetectedCard {
    #[serde(deserialize_with = "deserialize_card_id")]
    pub id: String,
    pub direction: String,
}

/// 一次扫描中的一条结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanEntry {
    pub id: String,
    pub answer: Answer,
}

impl ScanEntry {
    pub fn new(id: impl Into<String>, answer: Answer) -> Self {
        Self {
            id: id.into(),
            answer,
        }
    }
}

/// 一帧图像产生的扫描批次（有序，合并后即丢弃）
pub type ScanBatch = Vec<ScanEntry>;

/// 被排除在批次之外的卡片
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedCard {
    /// 原始 JSON 元素（截断前）
    pub raw: String,
    pub reason: String,
}

/// 卡片编号上限
const MAX_CARD_ID: u64 = u32::MAX as u64;

// 卡片 ID 约定为非负整数，但模型偶尔会返回字符串
fn deserialize_card_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Visitor;
    use std::fmt;

    struct CardIdVisitor;

    impl<'de> Visitor<'de> for CardIdVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("an integer or string card id")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            let value = value.trim();
            if value.is_empty() {
                return Err(E::custom("empty card id"));
            }
            Ok(value.to_string())
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            match u64::try_from(value) {
                Ok(value) => self.visit_u64(value),
                Err(_) => Err(E::custom(format!("negative card id {}", value))),
            }
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            if value > MAX_CARD_ID {
                return Err(E::custom(format!("card id {} out of range", value)));
            }
            Ok(value.to_string())
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            if !value.is_finite() || value.fract() != 0.0 {
                return Err(E::custom(format!("non-integer card id {}", value)));
            }
            if !(0.0..=MAX_CARD_ID as f64).contains(&value) {
                return Err(E::custom(format!("card id {} out of range", value)));
            }
            Ok((value as u64).to_string())
        }
    }

    deserializer.deserialize_any(CardIdVisitor)
}
