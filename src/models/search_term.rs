use std::fmt;
use std::ops::Deref;

use serde::Serialize;

/// 搜索词条
///
/// 由原始查询按逗号切分而来，保证去除首尾空白且非空。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SearchTerm(String);

impl SearchTerm {
    /// 创建词条，空白内容返回 None
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// 把查询切分为有序词条列表，丢弃空片段，保留重复项
    pub fn parse_query(query: &str) -> Vec<SearchTerm> {
        query.split(',').filter_map(SearchTerm::new).collect()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for SearchTerm {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SearchTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
