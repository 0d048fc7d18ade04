//! 统计与筛选 - 业务能力层
//!
//! 每次都从名单 + 结果映射重新计算，不保存任何派生状态

use crate::models::answer::Bucket;
use crate::models::student::StudentWithResult;
use crate::session::{ResultsMapping, Roster};

/// 筛选条件
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Filter {
    #[default]
    All,
    Only(Bucket),
}

impl Filter {
    /// 解析命令行参数，`all` 表示全部
    pub fn parse(s: &str) -> Option<Self> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Some(Filter::All);
        }
        Bucket::parse(s).map(Filter::Only)
    }

    fn matches(self, bucket: Bucket) -> bool {
        match self {
            Filter::All => true,
            Filter::Only(wanted) => wanted == bucket,
        }
    }
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Filter::All => write!(f, "ALL"),
            Filter::Only(bucket) => write!(f, "{}", bucket),
        }
    }
}

/// 五个分组的人数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnswerCounts {
    counts: [usize; 5],
}

impl AnswerCounts {
    pub fn get(&self, bucket: Bucket) -> usize {
        self.counts[index_of(bucket)]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// 按展示顺序迭代 (分组, 人数)
    pub fn iter(&self) -> impl Iterator<Item = (Bucket, usize)> + '_ {
        Bucket::ALL.into_iter().map(|bucket| (bucket, self.get(bucket)))
    }
}

fn index_of(bucket: Bucket) -> usize {
    match bucket {
        Bucket::A => 0,
        Bucket::B => 1,
        Bucket::C => 2,
        Bucket::D => 3,
        Bucket::NoAnswer => 4,
    }
}

/// 把名单中每个学生和其当前作答拼在一起（保持名单顺序）
pub fn join(roster: &Roster, results: &ResultsMapping) -> Vec<StudentWithResult> {
    roster
        .students()
        .iter()
        .map(|student| StudentWithResult {
            student: student.clone(),
            answer: Bucket::resolve(results.get(&student.id)),
        })
        .collect()
}

/// 统计各分组人数，总和恒等于名单人数
pub fn aggregate(roster: &Roster, results: &ResultsMapping) -> AnswerCounts {
    let mut counts = AnswerCounts::default();
    for student in roster.students() {
        let bucket = Bucket::resolve(results.get(&student.id));
        counts.counts[index_of(bucket)] += 1;
    }
    counts
}

/// 按分组筛选学生
pub fn filter(
    roster: &Roster,
    results: &ResultsMapping,
    filter: Filter,
) -> Vec<StudentWithResult> {
    join(roster, results)
        .into_iter()
        .filter(|row| filter.matches(row.answer))
        .collect()
}

// ========== 文本渲染 ==========

const BAR_WIDTH: usize = 40;

/// 渲染分组柱状图
pub fn render_chart(counts: &AnswerCounts) -> String {
    let max = counts.iter().map(|(_, n)| n).max().unwrap_or(0);
    let mut out = String::new();
    for (bucket, n) in counts.iter() {
        let width = if max == 0 { 0 } else { n * BAR_WIDTH / max };
        out.push_str(&format!(
            "{:>9} | {:<pad$} {}\n",
            bucket.label(),
            "█".repeat(width),
            n,
            pad = BAR_WIDTH
        ));
    }
    out
}

/// 渲染学生列表
pub fn render_table(rows: &[StudentWithResult], filter: Filter) -> String {
    let title = match filter {
        Filter::All => "所有学生".to_string(),
        Filter::Only(bucket) => format!("选择 {} 的学生", bucket),
    };

    let mut out = format!("{}\n{}\n", title, "─".repeat(60));
    if rows.is_empty() {
        out.push_str("没有符合条件的学生。\n");
        return out;
    }

    out.push_str(&format!(
        "{:<10} {:<28} {:<10} {}\n",
        "ID", "姓名", "班级", "结果"
    ));
    for row in rows {
        out.push_str(&format!(
            "{:<10} {:<28} {:<10} {}\n",
            row.student.id, row.student.name, row.student.class_name, row.answer
        ));
    }
    out
}
