use serde::{Deserialize, Serialize};

use crate::models::student::Student;

/// 班级名单
///
/// 只能整体替换或清空，不支持逐条修改
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    students: Vec<Student>,
}

impl Roster {
    pub fn new(students: Vec<Student>) -> Self {
        Self { students }
    }

    /// 整体替换名单
    pub fn replace(&mut self, students: Vec<Student>) {
        self.students = students;
    }

    pub fn clear(&mut self) {
        self.students.clear();
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }
}
