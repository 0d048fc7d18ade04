use serde::{Deserialize, Serialize};

/// 卡片上三角标记的朝向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    /// 所有合法朝向（顺序即 A/B/C/D）
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// 获取标准名称（与模型输出约束一致）
    pub fn name(self) -> &'static str {
        match self {
            Direction::Up => "Up",
            Direction::Right => "Right",
            Direction::Down => "Down",
            Direction::Left => "Left",
        }
    }

    /// 从模型返回的字符串解析朝向
    ///
    /// 只接受四个固定值（忽略大小写和首尾空白），其他值返回 None
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(s))
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 学生的作答（只存储 A-D，“未作答”由统计时推导）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Answer {
    A,
    B,
    C,
    D,
}

impl Answer {
    pub fn letter(self) -> &'static str {
        match self {
            Answer::A => "A",
            Answer::B => "B",
            Answer::C => "C",
            Answer::D => "D",
        }
    }
}

impl std::fmt::Display for Answer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// 统计分组：A / B / C / D / 未作答
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Bucket {
    A,
    B,
    C,
    D,
    NoAnswer,
}

impl Bucket {
    /// 所有分组，按展示顺序
    pub const ALL: [Bucket; 5] = [Bucket::A, Bucket::B, Bucket::C, Bucket::D, Bucket::NoAnswer];

    /// 导出和展示用的名称
    pub fn label(self) -> &'static str {
        match self {
            Bucket::A => "A",
            Bucket::B => "B",
            Bucket::C => "C",
            Bucket::D => "D",
            Bucket::NoAnswer => "No Answer",
        }
    }

    /// 把结果映射中的值（可能缺失）归入分组
    pub fn resolve(answer: Option<Answer>) -> Self {
        match answer {
            Some(Answer::A) => Bucket::A,
            Some(Answer::B) => Bucket::B,
            Some(Answer::C) => Bucket::C,
            Some(Answer::D) => Bucket::D,
            None => Bucket::NoAnswer,
        }
    }

    /// 解析命令行里的分组名
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "a" => Some(Bucket::A),
            "b" => Some(Bucket::B),
            "c" => Some(Bucket::C),
            "d" => Some(Bucket::D),
            "none" | "no answer" | "no-answer" | "noanswer" | "chưa quét" => Some(Bucket::NoAnswer),
            _ => None,
        }
    }
}

impl From<Answer> for Bucket {
    fn from(answer: Answer) -> Self {
        Bucket::resolve(Some(answer))
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
