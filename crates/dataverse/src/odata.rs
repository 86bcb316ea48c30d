//! OData v4 encoding of [`QueryExpression`]s for the Dataverse Web API.

use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;

use solman_core::{
    ConditionOperator, EntityKind, QueryExpression, RawRecord, RemoteError, SolutionId,
    SortDirection,
};

/// Entity set name for a logical entity name (`solution` -> `solutions`).
pub fn entity_set_name(entity: &EntityKind) -> String {
    let name = entity.as_str();
    match name.strip_suffix('y') {
        Some(stem) if !stem.ends_with(['a', 'e', 'i', 'o', 'u']) => format!("{stem}ies"),
        _ => format!("{name}s"),
    }
}

/// OData literal for a filter value. Strings are single-quoted with `'` doubled.
pub fn literal(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        other => format!("'{}'", other.to_string().replace('\'', "''")),
    }
}

/// `$filter` expression; conditions are AND-ed. `None` when there are no conditions.
pub fn filter_expression(query: &QueryExpression) -> Option<String> {
    if query.conditions.is_empty() {
        return None;
    }
    let terms: Vec<String> = query
        .conditions
        .iter()
        .map(|c| {
            let op = match c.operator {
                ConditionOperator::Equal => "eq",
                ConditionOperator::NotEqual => "ne",
            };
            format!("{} {} {}", c.attribute, op, literal(&c.value))
        })
        .collect();
    Some(terms.join(" and "))
}

/// `$orderby` expression, `None` when unordered.
pub fn order_expression(query: &QueryExpression) -> Option<String> {
    if query.orders.is_empty() {
        return None;
    }
    let terms: Vec<String> = query
        .orders
        .iter()
        .map(|o| {
            let dir = match o.direction {
                SortDirection::Ascending => "asc",
                SortDirection::Descending => "desc",
            };
            format!("{} {}", o.attribute, dir)
        })
        .collect();
    Some(terms.join(","))
}

/// Collection URL with `$select`, `$filter` and `$orderby` applied.
pub fn query_url(api_root: &Url, query: &QueryExpression) -> Result<Url, RemoteError> {
    let mut url = api_root
        .join(&entity_set_name(&query.entity))
        .map_err(|e| RemoteError::Transport(format!("invalid query url: {e}")))?;
    {
        let mut pairs = url.query_pairs_mut();
        if !query.columns.is_empty() {
            pairs.append_pair("$select", &query.columns.join(","));
        }
        if let Some(filter) = filter_expression(query) {
            pairs.append_pair("$filter", &filter);
        }
        if let Some(order) = order_expression(query) {
            pairs.append_pair("$orderby", &order);
        }
    }
    Ok(url)
}

/// Single-record URL, e.g. `solutions(<guid>)`.
pub fn record_url(api_root: &Url, entity: &EntityKind, id: &SolutionId) -> Result<Url, RemoteError> {
    api_root
        .join(&format!("{}({})", entity_set_name(entity), id))
        .map_err(|e| RemoteError::Transport(format!("invalid record url: {e}")))
}

/// One page of a collection response.
#[derive(Debug, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub value: Vec<RawRecord>,
    #[serde(rename = "@odata.nextLink", default)]
    pub next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    code: Option<String>,
    message: String,
}

/// Best-effort human message from an error response body.
pub fn error_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    Some(match parsed.error.code {
        Some(code) if !code.is_empty() => format!("{} ({code})", parsed.error.message),
        _ => parsed.error.message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> Url {
        Url::parse("https://contoso.crm.dynamics.com/api/data/v9.2/").unwrap()
    }

    #[test]
    fn entity_set_names() {
        assert_eq!(entity_set_name(&EntityKind::solution()), "solutions");
        assert_eq!(entity_set_name(&EntityKind("entity".into())), "entities");
        assert_eq!(entity_set_name(&EntityKind("survey".into())), "surveys");
    }

    #[test]
    fn literals() {
        assert_eq!(literal(&Value::Bool(false)), "false");
        assert_eq!(literal(&Value::from("O'Brien")), "'O''Brien'");
        assert_eq!(literal(&Value::from(3)), "3");
        assert_eq!(literal(&Value::Null), "null");
    }

    #[test]
    fn unmanaged_solutions_url() {
        let url = query_url(&root(), &QueryExpression::unmanaged_solutions()).unwrap();
        assert_eq!(url.path(), "/api/data/v9.2/solutions");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                (
                    "$select".to_string(),
                    "description,friendlyname,uniquename,version,installedon".to_string()
                ),
                ("$filter".to_string(), "ismanaged eq false".to_string()),
                ("$orderby".to_string(), "friendlyname asc".to_string()),
            ]
        );
    }

    #[test]
    fn record_url_wraps_id() {
        let id: SolutionId = "0b1c2d3e-4f50-6172-8394-a5b6c7d8e9f0".parse().unwrap();
        let url = record_url(&root(), &EntityKind::solution(), &id).unwrap();
        assert_eq!(
            url.as_str(),
            "https://contoso.crm.dynamics.com/api/data/v9.2/solutions(0b1c2d3e-4f50-6172-8394-a5b6c7d8e9f0)"
        );
    }

    #[test]
    fn error_message_prefers_odata_body() {
        let body = r#"{"error":{"code":"0x8004f01f","message":"Solution is in use"}}"#;
        assert_eq!(
            error_message(body).as_deref(),
            Some("Solution is in use (0x8004f01f)")
        );
        assert_eq!(error_message("<html>"), None);
    }
}
