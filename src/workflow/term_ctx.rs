//! 词条处理上下文
//!
//! 封装"我正在处理查询中的第几个词条"这一信息

use std::fmt::Display;

use crate::models::SearchTerm;

/// 词条处理上下文
#[derive(Debug, Clone)]
pub struct TermCtx {
    /// 词条在查询中的位置（从1开始，仅用于日志显示）
    pub term_index: usize,

    /// 查询中的词条总数
    pub term_total: usize,

    pub term: SearchTerm,
}

impl TermCtx {
    pub fn new(term_index: usize, term_total: usize, term: SearchTerm) -> Self {
        Self {
            term_index,
            term_total,
            term,
        }
    }
}

impl Display for TermCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[词条 {}/{} \"{}\"]",
            self.term_index, self.term_total, self.term
        )
    }
}
