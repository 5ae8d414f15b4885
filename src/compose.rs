//! Lays out the report: batches → APIs → attribute sections.
//!
//! Every batch gets a heading and an API list table. Every API in it gets a
//! detail table of ten fixed parameters followed by the four attribute
//! sections. Missing data never fails the run; it shows up as a row of
//! [`PLACEHOLDER`] cells instead.

use crate::fetch::col;
use crate::hierarchy::{Category, Hierarchy};
use crate::properties::{decode_escapes, SyntaxMap};
use crate::report::{Cell, Report, Table, TableLayout, LABEL_FILL, PLACEHOLDER};
use crate::source::{Record, ResultSet, Value};
use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Shown in the `語法` row when the syntax key resolves to nothing.
pub const SQL_NOT_FOUND: &str = " 查無對應 SQL";

pub const API_LIST_LAYOUT: TableLayout = TableLayout {
    headers: &["順序", "API代碼", "API說明"],
    widths_cm: &[1.24, 7.0, 10.79],
};

pub const API_DETAIL_LAYOUT: TableLayout = TableLayout {
    headers: &["序", "參數", "設定值"],
    widths_cm: &[1.24, 3.5, 14.29],
};

/// Rows of the API detail table, in display order.
pub const DETAIL_PARAMS: [&str; 10] = [
    "API代碼",
    "API簡述",
    "API說明",
    "API行為類型",
    "資料庫連線名稱",
    "執行類型",
    "語法設定鍵值",
    "驗證金鑰",
    "是否編碼",
    SYNTAX_PARAM,
];

/// The one detail row resolved through the syntax map.
pub const SYNTAX_PARAM: &str = "語法";

/// An attribute section rendered under each API.
#[derive(Debug, Clone, Copy)]
pub struct Section {
    pub category: Category,
    pub layout: TableLayout,
}

pub const SECTIONS: [Section; 4] = [
    Section {
        category: Category::ParamValidation,
        layout: TableLayout {
            headers: &["序", "屬性名", "預設值", "說明"],
            widths_cm: &[1.24, 3.5, 8.89, 5.4],
        },
    },
    Section {
        category: Category::WebService,
        layout: TableLayout {
            headers: &["序", "主機代碼", "主機名稱", "主機IP", "啟用"],
            widths_cm: &[1.24, 3.5, 4.57, 4.32, 5.4],
        },
    },
    Section {
        category: Category::IpPermission,
        layout: TableLayout {
            headers: &["IP", "說明"],
            widths_cm: &[8.74, 10.25],
        },
    },
    Section {
        category: Category::OutputSetting,
        layout: TableLayout {
            headers: &["節點階層", "父階層關聯鍵值", "子階層關聯鍵值", "輸出參數"],
            widths_cm: &[3.24, 4.5, 5.89, 5.4],
        },
    },
];

/// Columns shown as integers when they hold whole numbers.
const INTEGRAL_COLUMNS: [&str; 2] = [col::SEQ, col::NODE_LEVEL];

/// The only content of a report when no batch matched `flow_prefix`.
pub fn no_data_message(flow_prefix: &str) -> String {
    format!("資料庫中找不到與 '{}' 相關的 API 資料。", flow_prefix)
}

pub fn compose_no_data(report: &mut Report, flow_prefix: &str) {
    report.paragraph(no_data_message(flow_prefix));
}

/// A distinct (code, description) pair from the ordering rows.
#[derive(Debug)]
struct Batch<'a> {
    code: Option<String>,
    desc: Option<String>,
    apis: Vec<Record<'a>>,
}

/// Group ordering rows into batches sorted by description.
///
/// APIs keep source order within a batch, then are stably sorted by
/// sequence. Non-numeric sequences sort after numeric ones and keep their
/// relative order.
fn batches(ordering: &ResultSet) -> Vec<Batch<'_>> {
    let mut batches: Vec<Batch<'_>> = Vec::new();
    let mut index: HashMap<(Option<String>, Option<String>), usize> = HashMap::new();
    for record in ordering.records() {
        let code = record.get(col::BATCH_CODE).text();
        let desc = record.get(col::BATCH_DESC).text();
        match index.entry((code, desc)) {
            Entry::Occupied(slot) => batches[*slot.get()].apis.push(record),
            Entry::Vacant(slot) => {
                let (code, desc) = slot.key().clone();
                slot.insert(batches.len());
                batches.push(Batch {
                    code,
                    desc,
                    apis: vec![record],
                });
            }
        }
    }

    batches.sort_by(|a, b| blank_last(a.desc.as_deref(), b.desc.as_deref()));
    for batch in &mut batches {
        batch
            .apis
            .sort_by(|a, b| sequence_order(a.get(col::API_SEQ), b.get(col::API_SEQ)));
    }
    batches
}

fn blank_last(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn sequence_order(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Append the full report body for `ordering` to `report`.
pub fn compose(
    report: &mut Report,
    hierarchy: &Hierarchy<'_>,
    syntax: &SyntaxMap,
    ordering: &ResultSet,
) {
    for batch in batches(ordering) {
        compose_batch(report, &batch, hierarchy, syntax);
    }
}

fn compose_batch(
    report: &mut Report,
    batch: &Batch<'_>,
    hierarchy: &Hierarchy<'_>,
    syntax: &SyntaxMap,
) {
    let code = batch.code.as_deref().unwrap_or(PLACEHOLDER);
    let desc = batch.desc.as_deref().unwrap_or(PLACEHOLDER);
    report.heading(2, format!("{} ({})", code, desc));

    let mut table = Table::new(API_LIST_LAYOUT);
    if batch.apis.is_empty() {
        table.push_placeholder_row();
        tracing::info!(batch = code, "batch has no APIs");
    }
    for api in &batch.apis {
        table.push_row(vec![
            Cell::or_placeholder(api.get(col::API_SEQ).whole_text()),
            Cell::or_placeholder(api.get(col::API_CODE).text()),
            Cell::or_placeholder(api.get(col::API_DESC).text()),
        ]);
    }
    report.table(table);
    report.spacer();

    for api in &batch.apis {
        match api.get(col::API_CODE).text() {
            Some(api_code) => compose_api(report, &api_code, hierarchy, syntax),
            None => tracing::warn!(batch = code, "skipping API with blank code"),
        }
    }
}

fn compose_api(report: &mut Report, code: &str, hierarchy: &Hierarchy<'_>, syntax: &SyntaxMap) {
    report.heading(4, code);

    let mut detail = Table::new(API_DETAIL_LAYOUT);
    match hierarchy.rows(code, Category::ApiList).first() {
        Some(descriptor) => {
            for (idx, param) in DETAIL_PARAMS.iter().enumerate() {
                let value = if *param == SYNTAX_PARAM {
                    let key = descriptor.get(col::SYNTAX_KEY);
                    let sql = resolve_syntax(key, syntax);
                    tracing::debug!(api = code, key = ?key.text(), "resolved syntax key");
                    sql
                } else {
                    descriptor
                        .get(param)
                        .text()
                        .unwrap_or_else(|| PLACEHOLDER.to_string())
                };
                detail.push_row(vec![
                    Cell::filled((idx + 1).to_string(), LABEL_FILL),
                    Cell::filled(*param, LABEL_FILL),
                    Cell::new(value),
                ]);
            }
        }
        None => {
            detail.push_placeholder_row();
            tracing::warn!(api = code, "missing {} data", Category::ApiList);
        }
    }
    report.table(detail);
    report.spacer();

    for section in &SECTIONS {
        compose_section(report, code, section, hierarchy.rows(code, section.category));
    }
}

fn compose_section(report: &mut Report, code: &str, section: &Section, rows: &[Record<'_>]) {
    report.heading(5, section.category.name());

    let mut table = Table::new(section.layout);
    if rows.is_empty() {
        table.push_placeholder_row();
        tracing::debug!(api = code, "missing {} data", section.category);
    }
    for row in rows {
        let cells = section
            .layout
            .headers
            .iter()
            .map(|header| {
                let value = row.get(header);
                if INTEGRAL_COLUMNS.contains(header) {
                    Cell::or_placeholder(value.integral_text())
                } else {
                    Cell::or_placeholder(value.text())
                }
            })
            .collect();
        table.push_row(cells);
    }
    report.table(table);
    report.spacer();
}

/// Look the syntax key up and decode its escapes.
///
/// Blank keys and keys missing from the map give [`SQL_NOT_FOUND`].
pub fn resolve_syntax(key: &Value, syntax: &SyntaxMap) -> String {
    let raw = key
        .text()
        .and_then(|k| syntax.get(&k))
        .map(String::as_str)
        .unwrap_or(SQL_NOT_FOUND);
    decode_escapes(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::CategorySets;
    use crate::report::Block;

    fn ordering(rows: &[(&str, &str, Value, &str, &str)]) -> ResultSet {
        let mut set = ResultSet::new([
            col::BATCH_CODE,
            col::BATCH_DESC,
            col::API_SEQ,
            col::API_CODE,
            col::API_DESC,
        ]);
        for (code, desc, seq, api, api_desc) in rows {
            set.push_row(vec![
                Value::from(*code),
                Value::from(*desc),
                seq.clone(),
                Value::from(*api),
                Value::from(*api_desc),
            ]);
        }
        set
    }

    fn descriptor(code: &str, key: &str) -> ResultSet {
        let mut set = ResultSet::new(DETAIL_PARAMS[..9].iter().copied());
        set.push_row(vec![
            Value::from(code),
            Value::from("brief"),
            Value::from("help"),
            Value::from("SQL"),
            Value::from("jdbc/main"),
            Value::from("Q"),
            Value::from(key),
            Value::from("DFMDB_authority"),
            Value::from("否"),
        ]);
        set
    }

    fn compose_with(ordering: &ResultSet, sets: &CategorySets, syntax: &SyntaxMap) -> Report {
        let hierarchy = Hierarchy::build(sets);
        let mut report = Report::default();
        compose(&mut report, &hierarchy, syntax, ordering);
        report
    }

    #[test]
    fn single_api_without_attributes() {
        let ordering = ordering(&[("FI_01", "daily", Value::Float(1.0), "A1", "first")]);
        let sets = CategorySets {
            api_list: descriptor("A1", "K1"),
            ..Default::default()
        };
        let syntax = SyntaxMap::from([("K1".to_string(), r"SELECT 1\nFROM t".to_string())]);
        let report = compose_with(&ordering, &sets, &syntax);

        assert_eq!(report.headings(2), vec!["FI_01 (daily)"]);
        assert_eq!(report.headings(4), vec!["A1"]);
        assert_eq!(
            report.headings(5),
            vec!["參數驗證", "WebService", "IP權限設定", "輸出設定"]
        );

        let tables = report.table_texts();
        assert_eq!(tables.len(), 6);
        assert_eq!(tables[0][1], vec!["1", "A1", "first"]);
        assert_eq!(tables[1].len(), 11);
        assert_eq!(tables[1][10], vec!["10", "語法", "SELECT 1\nFROM t"]);
        for section in &tables[2..] {
            assert_eq!(section.len(), 2);
            assert!(section[1].iter().all(|c| c == PLACEHOLDER));
        }
    }

    #[test]
    fn detail_table_lists_ten_parameters_with_label_fill() {
        let ordering = ordering(&[("FI_01", "daily", Value::Int(1), "A1", "first")]);
        let sets = CategorySets {
            api_list: descriptor("A1", "K1"),
            ..Default::default()
        };
        let report = compose_with(&ordering, &sets, &SyntaxMap::new());
        let detail = report.tables().nth(1).unwrap();
        let labels: Vec<_> = detail.rows.iter().map(|r| r[1].text.as_str()).collect();
        assert_eq!(labels, DETAIL_PARAMS.to_vec());
        assert_eq!(detail.rows[1][2].text, "brief");
        assert_eq!(detail.rows[9][2].text, SQL_NOT_FOUND);
        for row in &detail.rows {
            assert_eq!(row[0].fill, Some(LABEL_FILL));
            assert_eq!(row[1].fill, Some(LABEL_FILL));
            assert_eq!(row[2].fill, None);
        }
    }

    #[test]
    fn missing_descriptor_renders_placeholder_row() {
        let ordering = ordering(&[("FI_01", "daily", Value::Int(1), "A1", "first")]);
        let report = compose_with(&ordering, &CategorySets::default(), &SyntaxMap::new());
        let tables = report.table_texts();
        assert_eq!(tables[1], vec![
            vec!["序", "參數", "設定值"],
            vec![PLACEHOLDER, PLACEHOLDER, PLACEHOLDER],
        ]);
    }

    #[test]
    fn batches_sorted_by_description_and_apis_by_sequence() {
        let ordering = ordering(&[
            ("FI_02", "b-night", Value::Int(2), "N2", "n2"),
            ("FI_01", "a-day", Value::Float(3.0), "D3", "d3"),
            ("FI_02", "b-night", Value::Int(1), "N1", "n1"),
            ("FI_01", "a-day", Value::from("1"), "D1", "d1"),
        ]);
        let report = compose_with(&ordering, &CategorySets::default(), &SyntaxMap::new());
        assert_eq!(report.headings(2), vec!["FI_01 (a-day)", "FI_02 (b-night)"]);
        assert_eq!(report.headings(4), vec!["D1", "D3", "N1", "N2"]);
        let first = &report.table_texts()[0];
        assert_eq!(first[1], vec!["1", "D1", "d1"]);
        assert_eq!(first[2], vec!["3", "D3", "d3"]);
    }

    #[test]
    fn api_list_substitutes_placeholders() {
        let ordering = ordering(&[("FI_01", "daily", Value::Null, "A1", " ")]);
        let report = compose_with(&ordering, &CategorySets::default(), &SyntaxMap::new());
        assert_eq!(report.table_texts()[0][1], vec![PLACEHOLDER, "A1", PLACEHOLDER]);
    }

    #[test]
    fn fractional_sequence_shows_placeholder() {
        let ordering = ordering(&[
            ("FI_01", "daily", Value::Float(1.5), "A1", "x"),
            ("FI_01", "daily", Value::from("3.0"), "A2", "y"),
        ]);
        let report = compose_with(&ordering, &CategorySets::default(), &SyntaxMap::new());
        let list = &report.table_texts()[0];
        assert_eq!(list[1][0], PLACEHOLDER);
        assert_eq!(list[2][0], "3");
    }

    #[test]
    fn null_sequences_sort_after_numbered_apis() {
        let ordering = ordering(&[
            ("FI_01", "daily", Value::Int(3), "A3", "x"),
            ("FI_01", "daily", Value::Null, "N1", "x"),
            ("FI_01", "daily", Value::Int(1), "A1", "x"),
            ("FI_01", "daily", Value::from("n/a"), "N2", "x"),
            ("FI_01", "daily", Value::Float(2.0), "A2", "x"),
        ]);
        let report = compose_with(&ordering, &CategorySets::default(), &SyntaxMap::new());
        assert_eq!(report.headings(4), vec!["A1", "A2", "A3", "N1", "N2"]);
    }

    #[test]
    fn long_batches_with_gaps_stay_sorted() {
        let rows: Vec<(String, Value)> = (0..200)
            .rev()
            .map(|i| {
                let seq = if i % 3 == 0 { Value::Null } else { Value::Int(i) };
                (format!("A{}", i), seq)
            })
            .collect();
        let mut set = ordering(&[]);
        for (api, seq) in &rows {
            set.push_row(vec![
                Value::from("FI_01"),
                Value::from("daily"),
                seq.clone(),
                Value::from(api.as_str()),
                Value::from("x"),
            ]);
        }
        let batches = batches(&set);
        assert_eq!(batches.len(), 1);
        let seqs: Vec<Option<f64>> = batches[0]
            .apis
            .iter()
            .map(|api| api.get(col::API_SEQ).as_f64())
            .collect();
        let numbered: Vec<f64> = seqs.iter().map_while(|s| *s).collect();
        assert!(numbered.windows(2).all(|w| w[0] < w[1]));
        assert!(seqs[numbered.len()..].iter().all(Option::is_none));
    }

    #[test]
    fn interleaved_batches_group_in_one_pass() {
        let ordering = ordering(&[
            ("FI_01", "a", Value::Int(1), "A1", "x"),
            ("FI_02", "b", Value::Int(1), "B1", "x"),
            ("FI_01", "a", Value::Int(2), "A2", "x"),
            ("FI_02", "b", Value::Int(2), "B2", "x"),
        ]);
        let batches = batches(&ordering);
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].apis.len(), 2);
        assert_eq!(batches[1].apis.len(), 2);
    }

    #[test]
    fn blank_api_code_is_listed_but_not_detailed() {
        let ordering = ordering(&[
            ("FI_01", "daily", Value::Int(1), "", "orphan"),
            ("FI_01", "daily", Value::Int(2), "A2", "kept"),
        ]);
        let report = compose_with(&ordering, &CategorySets::default(), &SyntaxMap::new());
        assert_eq!(report.table_texts()[0].len(), 3);
        assert_eq!(report.headings(4), vec!["A2"]);
    }

    #[test]
    fn empty_batch_gets_one_placeholder_row_and_no_details() {
        let batch = Batch {
            code: Some("FI_09".into()),
            desc: None,
            apis: Vec::new(),
        };
        let hierarchy = Hierarchy::default();
        let mut report = Report::default();
        compose_batch(&mut report, &batch, &hierarchy, &SyntaxMap::new());
        assert_eq!(report.headings(2), vec!["FI_09 (NaN)"]);
        assert_eq!(report.table_texts(), vec![vec![
            vec!["順序", "API代碼", "API說明"],
            vec![PLACEHOLDER, PLACEHOLDER, PLACEHOLDER],
        ]]);
        assert!(report.headings(4).is_empty());
    }

    #[test]
    fn section_rows_coerce_sequence_columns() {
        let ordering = ordering(&[("FI_01", "daily", Value::Int(1), "A1", "x")]);
        let mut ws = ResultSet::new([col::API_CODE, "序", "主機代碼", "主機名稱", "主機IP", "啟用"]);
        ws.push_row(vec![
            Value::from("A1"),
            Value::Float(2.0),
            Value::from("WS01"),
            Value::from("Middle01"),
            Value::Null,
            Value::from("是"),
        ]);
        let mut out = ResultSet::new([col::API_CODE, "節點階層", "父階層關聯鍵值", "子階層關聯鍵值", "輸出參數"]);
        out.push_row(vec![
            Value::from("A1"),
            Value::from("1.0"),
            Value::from(""),
            Value::from("ID"),
            Value::from("NAME"),
        ]);
        out.push_row(vec![
            Value::from("A1"),
            Value::from("L2"),
            Value::from("ID"),
            Value::from("PID"),
            Value::from("CHILD"),
        ]);
        let sets = CategorySets {
            web_services: ws,
            output_settings: out,
            ..Default::default()
        };
        let report = compose_with(&ordering, &sets, &SyntaxMap::new());
        let tables = report.table_texts();
        assert_eq!(tables[3][1], vec!["2", "WS01", "Middle01", PLACEHOLDER, "是"]);
        assert_eq!(tables[5].len(), 3);
        assert_eq!(tables[5][1], vec!["1", PLACEHOLDER, "ID", "NAME"]);
        assert_eq!(tables[5][2][0], "L2");
    }

    #[test]
    fn each_section_is_followed_by_spacer() {
        let ordering = ordering(&[("FI_01", "daily", Value::Int(1), "A1", "x")]);
        let report = compose_with(&ordering, &CategorySets::default(), &SyntaxMap::new());
        let spacers = report
            .blocks
            .iter()
            .filter(|b| matches!(b, Block::Paragraph { text } if text.is_empty()))
            .count();
        // batch table, detail table, four sections
        assert_eq!(spacers, 6);
    }

    #[test]
    fn resolve_syntax_decodes_escapes() {
        let syntax = SyntaxMap::from([("K".to_string(), r"a\tb\=c".to_string())]);
        assert_eq!(resolve_syntax(&Value::from("K"), &syntax), "a\tb=c");
    }

    #[test]
    fn resolve_syntax_defaults_when_unresolved() {
        let syntax = SyntaxMap::new();
        assert_eq!(resolve_syntax(&Value::from("K"), &syntax), SQL_NOT_FOUND);
        assert_eq!(resolve_syntax(&Value::Null, &syntax), SQL_NOT_FOUND);
        assert_eq!(resolve_syntax(&Value::from("  "), &syntax), SQL_NOT_FOUND);
    }

    #[test]
    fn composing_twice_gives_identical_tables() {
        let ordering = ordering(&[
            ("FI_01", "daily", Value::Int(1), "A1", "x"),
            ("FI_01", "daily", Value::Int(2), "A2", "y"),
        ]);
        let sets = CategorySets {
            api_list: descriptor("A1", "K1"),
            ..Default::default()
        };
        let syntax = SyntaxMap::from([("K1".to_string(), "SELECT 1".to_string())]);
        let first = compose_with(&ordering, &sets, &syntax).table_texts();
        let second = compose_with(&ordering, &sets, &syntax).table_texts();
        assert_eq!(first, second);
    }

    #[test]
    fn no_data_message_names_prefix() {
        let mut report = Report::default();
        compose_no_data(&mut report, "FI_%");
        assert_eq!(report.blocks.len(), 1);
        assert_eq!(report.tables().count(), 0);
        assert!(matches!(
            &report.blocks[0],
            Block::Paragraph { text } if text == "資料庫中找不到與 'FI_%' 相關的 API 資料。"
        ));
    }
}
