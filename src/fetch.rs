//! The fixed queries behind a report.
//!
//! The relevant-code query runs first; its codes are embedded as a literal
//! `IN (...)` list in every later query. Codes come from the database, not
//! from the caller, and embedded quotes are doubled.

use crate::error::Result;
use crate::hierarchy::Category;
use crate::source::{Query, QueryKind, ResultSet, Session};

/// Column aliases produced by the queries below.
pub mod col {
    pub const CALL_CODE_ID: &str = "CALL_CODE_ID";

    pub const BATCH_CODE: &str = "批次代碼";
    pub const BATCH_DESC: &str = "批次說明";
    pub const API_SEQ: &str = "API順序";
    pub const API_CODE: &str = "API代碼";
    pub const API_DESC: &str = "API說明";

    pub const SYNTAX_KEY: &str = "語法設定鍵值";
    pub const SEQ: &str = "序";
    pub const NODE_LEVEL: &str = "節點階層";
}

/// Everything the renderer needs once relevant codes were found.
#[derive(Debug, Clone, Default)]
pub struct Fetched {
    pub codes: Vec<String>,
    /// Batch/API ordering rows, sorted by batch description then sequence.
    pub ordering: ResultSet,
    pub categories: CategorySets,
}

/// Per-API attribute tables, one result set per category.
#[derive(Debug, Clone, Default)]
pub struct CategorySets {
    pub api_list: ResultSet,
    pub param_validation: ResultSet,
    pub web_services: ResultSet,
    pub ip_permissions: ResultSet,
    pub output_settings: ResultSet,
}

impl CategorySets {
    pub fn iter(&self) -> impl Iterator<Item = (Category, &ResultSet)> {
        [
            (Category::ApiList, &self.api_list),
            (Category::OutputSetting, &self.output_settings),
            (Category::IpPermission, &self.ip_permissions),
            (Category::WebService, &self.web_services),
            (Category::ParamValidation, &self.param_validation),
        ]
        .into_iter()
    }
}

/// Run every query. Returns `None` when no API belongs to a matching batch.
pub fn fetch(session: &mut Session, flow_prefix: &str) -> Result<Option<Fetched>> {
    let codes_set = session.query(&relevant_codes_query(flow_prefix))?;
    let codes = distinct_codes(&codes_set);
    if codes.is_empty() {
        return Ok(None);
    }
    tracing::info!(count = codes.len(), "found relevant API codes");

    let ordering = session.query(&hierarchy_query(flow_prefix))?;
    let categories = CategorySets {
        api_list: session.query(&api_list_query(&codes))?,
        output_settings: session.query(&output_settings_query(&codes))?,
        ip_permissions: session.query(&ip_permissions_query(&codes))?,
        web_services: session.query(&web_services_query(&codes))?,
        param_validation: session.query(&param_validation_query(&codes))?,
    };

    Ok(Some(Fetched {
        codes,
        ordering,
        categories,
    }))
}

/// Non-blank codes, de-duplicated in first-seen order.
fn distinct_codes(set: &ResultSet) -> Vec<String> {
    let mut codes: Vec<String> = Vec::new();
    for record in set.records() {
        if let Some(code) = record.get(col::CALL_CODE_ID).text() {
            if !codes.contains(&code) {
                codes.push(code);
            }
        }
    }
    codes
}

/// SQL string literal with embedded quotes doubled.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn in_list(codes: &[String]) -> String {
    codes
        .iter()
        .map(|c| quote(c))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn relevant_codes_query(flow_prefix: &str) -> Query {
    Query {
        kind: QueryKind::RelevantCodes,
        sql: format!(
            "SELECT DISTINCT Y.CALL_CODE_ID
            FROM JH_WS02_FLOW_LIST X
                INNER JOIN JH_WS02_FLOW_SCHEDULE_LIST Y ON X.pk = Y.FLOW_ID_PK
                INNER JOIN JH_WS02_CODE_LIST Z ON Y.CALL_CODE_ID = Z.CODE_ID
            WHERE FLOW_ID LIKE {}",
            quote(flow_prefix)
        ),
    }
}

pub fn hierarchy_query(flow_prefix: &str) -> Query {
    Query {
        kind: QueryKind::Hierarchy,
        sql: format!(
            "SELECT
                a.FLOW_ID AS [批次代碼]
                ,a.FLOW_HELP AS [批次說明]
                ,b.CLASS_NUM AS [API順序]
                ,b.CALL_CODE_ID AS [API代碼]
                ,c.API_DESC AS [API說明]
            FROM JH_WS02_FLOW_LIST a
                INNER JOIN JH_WS02_FLOW_SCHEDULE_LIST b ON a.pk = b.FLOW_ID_PK
                INNER JOIN JH_WS02_CODE_LIST c ON b.CALL_CODE_ID = c.CODE_ID
            WHERE FLOW_ID LIKE {}
            ORDER BY a.FLOW_HELP, b.CLASS_NUM",
            quote(flow_prefix)
        ),
    }
}

pub fn api_list_query(codes: &[String]) -> Query {
    Query {
        kind: QueryKind::ApiList,
        sql: format!(
            "SELECT
                CODE_ID AS [API代碼]
                ,API_DESC AS [API簡述]
                ,REPLACE(REPLACE(CODE_HELP,CHAR(13)+CHAR(10),''),CHAR(10),'') AS [API說明]
                ,CASE EXEC_TYPE WHEN '0' THEN 'SQL' ELSE 'SSH' END AS [API行為類型]
                ,JNDI_USE AS [資料庫連線名稱]
                ,REPLACE(ACTION_TYPE,CHAR(13)+CHAR(10),'') AS [執行類型]
                ,REPLACE(SQL_PROP_KEY,CHAR(13)+CHAR(10),'') AS [語法設定鍵值]
                ,'DFMDB_authority' AS [驗證金鑰]
                ,CASE IS_ENCODE WHEN 'Y' THEN '是' ELSE '否' END AS [是否編碼]
            FROM JH_WS02_CODE_LIST
            WHERE CODE_ID IN ({})",
            in_list(codes)
        ),
    }
}

pub fn output_settings_query(codes: &[String]) -> Query {
    Query {
        kind: QueryKind::OutputSettings,
        sql: format!(
            "SELECT A.CODE_ID AS [API代碼]
                ,ISNULL(B.CLASS_NUM,'') AS [節點階層]
                ,ISNULL(B.UP_PK_FIELD,'') AS [父階層關聯鍵值]
                ,ISNULL(B.DOWN_PK_FIELD,'') AS [子階層關聯鍵值]
                ,ISNULL(B.OUTPUT_FIELD,'') AS [輸出參數]
            FROM JH_WS02_CODE_LIST A
                LEFT JOIN JH_WS02_CODE_FORMAT_LIST B ON A.PK = B.CODE_ID_PK
            WHERE CODE_ID IN ({})
            ORDER BY 1,2",
            in_list(codes)
        ),
    }
}

pub fn ip_permissions_query(codes: &[String]) -> Query {
    Query {
        kind: QueryKind::IpPermissions,
        sql: format!(
            "SELECT A.CODE_ID AS [API代碼]
                ,B.ACCESSED_IP AS [IP]
                ,ISNULL(B.ACCESSED_DESC,'') AS [說明]
            FROM JH_WS02_CODE_LIST A
                LEFT JOIN JH_WS02_CODE_IP_RELATION B ON A.PK = B.CODE_ID_PK
            WHERE CODE_ID IN ({})
            ORDER BY 1,2",
            in_list(codes)
        ),
    }
}

pub fn web_services_query(codes: &[String]) -> Query {
    Query {
        kind: QueryKind::WebServices,
        sql: format!(
            "SELECT A.CODE_ID AS [API代碼]
                ,B.CLASS_NUM AS [序]
                ,ISNULL(B.WEB_SERVICE_CODE,'') AS [主機代碼]
                ,CASE B.WEB_SERVICE_CODE WHEN 'WS01' THEN 'Middle01' WHEN 'WS02' THEN 'Middle02' END AS [主機名稱]
                ,CASE B.WEB_SERVICE_CODE WHEN 'WS01' THEN '192.168.222.136' WHEN 'WS02' THEN '192.168.222.138' END AS [主機IP]
                ,CASE B.IS_DOING WHEN 'Y' THEN '是' ELSE '否' END AS [啟用]
            FROM JH_WS02_CODE_LIST A
                LEFT JOIN JH_WS02_CODE_WS_RELATION B ON A.PK = B.CODE_ID_PK
            WHERE CODE_ID IN ({})
            ORDER BY 1,2",
            in_list(codes)
        ),
    }
}

pub fn param_validation_query(codes: &[String]) -> Query {
    Query {
        kind: QueryKind::ParamValidation,
        sql: format!(
            "SELECT A.CODE_ID AS [API代碼]
                ,ROW_NUMBER() OVER (PARTITION BY A.CODE_ID ORDER BY B.FORMAT_IDX) AS [序]
                ,ISNULL(B.INPUT_FIELD,'') AS [屬性名]
                ,ISNULL(B.INPUT_DEFAULT_VAL,'') AS [預設值]
                ,ISNULL(REPLACE(B.REG_DESC,CHAR(13)+CHAR(10),''),'') AS [說明]
            FROM JH_WS02_CODE_LIST A
                LEFT JOIN JH_WS02_CODE_RANGE_ANALYSIS B ON A.PK = B.CODE_ID_PK
            WHERE CODE_ID IN ({})
            ORDER BY 1,2",
            in_list(codes)
        ),
    }
}
