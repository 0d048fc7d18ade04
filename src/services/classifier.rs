//! 作答分类 - 业务能力层
//!
//! 三角标记朝向 → 答案字母，固定映射：
//! Up → A, Right → B, Down → C, Left → D

use tracing::warn;

use crate::models::answer::{Answer, Direction};
use crate::models::scan::{DetectedCard, RejectedCard, ScanBatch, ScanEntry};

/// 朝向 → 答案
pub fn classify(direction: Direction) -> Answer {
    match direction {
        Direction::Up => Answer::A,
        Direction::Right => Answer::B,
        Direction::Down => Answer::C,
        Direction::Left => Answer::D,
    }
}

/// 一帧图像的分类结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classified {
    pub batch: ScanBatch,
    /// 朝向无法识别的卡片，不进入批次
    pub rejected: Vec<RejectedCard>,
}

/// 对模型识别出的卡片逐张分类
///
/// 单张卡片的朝向非法只排除这一张，不影响整批
pub fn classify_cards(cards: Vec<DetectedCard>) -> Classified {
    let mut classified = Classified::default();

    for card in cards {
        match Direction::parse(&card.direction) {
            Some(direction) => classified
                .batch
                .push(ScanEntry::new(card.id, classify(direction))),
            None => {
                warn!(
                    "⚠️ 卡片 {} 的朝向无法识别: '{}'，已跳过",
                    card.id, card.direction
                );
                classified.rejected.push(RejectedCard {
                    raw: serde_json::json!({ "id": card.id, "direction": card.direction })
                        .to_string(),
                    reason: format!("未知朝向 '{}'", card.direction),
                });
            }
        }
    }

    classified
}
