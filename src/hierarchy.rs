//! Per-API index over the category result sets.
//!
//! One pass per result set: rows are grouped under their `API代碼`, keeping
//! the order the source returned them in. A code with no rows for a category
//! simply has no entry; callers treat that the same as an empty group.

use crate::fetch::{col, CategorySets};
use crate::source::Record;
use std::collections::HashMap;
use std::fmt;

/// The attribute tables attached to each API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    ApiList,
    ParamValidation,
    WebService,
    IpPermission,
    OutputSetting,
}

impl Category {
    /// Section title, also the category name used in the document.
    pub fn name(self) -> &'static str {
        match self {
            Category::ApiList => "API清單",
            Category::ParamValidation => "參數驗證",
            Category::WebService => "WebService",
            Category::IpPermission => "IP權限設定",
            Category::OutputSetting => "輸出設定",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub type RowSet<'a> = Vec<Record<'a>>;

/// API code → category → rows.
#[derive(Debug, Default)]
pub struct Hierarchy<'a> {
    entries: HashMap<String, HashMap<Category, RowSet<'a>>>,
}

impl<'a> Hierarchy<'a> {
    pub fn build(sets: &'a CategorySets) -> Self {
        let mut hierarchy = Self::default();
        for (category, set) in sets.iter() {
            for record in set.records() {
                hierarchy.insert(category, record);
            }
        }
        hierarchy
    }

    /// File `record` under its API code. Rows without a code are dropped.
    pub fn insert(&mut self, category: Category, record: Record<'a>) {
        let Some(code) = record.get(col::API_CODE).text() else {
            return;
        };
        self.entries
            .entry(code)
            .or_default()
            .entry(category)
            .or_default()
            .push(record);
    }

    /// Rows for `code` under `category`; empty when either is absent.
    pub fn rows(&self, code: &str, category: Category) -> &[Record<'a>] {
        self.entries
            .get(code)
            .and_then(|by_category| by_category.get(&category))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, code: &str) -> bool {
        self.entries.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
