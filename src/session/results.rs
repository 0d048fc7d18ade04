use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::answer::Answer;
use crate::models::scan::ScanEntry;

/// 结果映射：学生 ID → 最近一次扫描到的作答
///
/// 只通过 `merge` 修改。允许出现名单之外的 ID，统计时会被忽略。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultsMapping {
    answers: HashMap<String, Answer>,
}

impl ResultsMapping {
    /// 合并一个扫描批次
    ///
    /// 批次中出现的 ID 被覆盖，其余 ID 保持不变；同一批次内后出现的条目优先
    pub fn merge(&mut self, batch: &[ScanEntry]) {
        for entry in batch {
            self.answers.insert(entry.id.clone(), entry.answer);
        }
    }

    pub fn get(&self, id: &str) -> Option<Answer> {
        self.answers.get(id).copied()
    }

    pub fn clear(&mut self) {
        self.answers.clear();
    }

    /// 已扫描的 ID 数量（包括名单之外的 ID）
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

impl<const N: usize> From<[(&str, Answer); N]> for ResultsMapping {
    fn from(pairs: [(&str, Answer); N]) -> Self {
        Self {
            answers: pairs
                .into_iter()
                .map(|(id, answer)| (id.to_string(), answer))
                .collect(),
        }
    }
}
