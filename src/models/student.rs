use serde::{Deserialize, Serialize};

use crate::models::answer::Bucket;

/// 学生
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub name: String,
    pub class_name: String,
}

impl Student {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        class_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            class_name: class_name.into(),
        }
    }
}

/// 学生及其当前作答（用于展示和导出）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentWithResult {
    pub student: Student,
    pub answer: Bucket,
}

impl std::fmt::Display for StudentWithResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} | {} | {} | {}",
            self.student.id, self.student.name, self.student.class_name, self.answer
        )
    }
}
