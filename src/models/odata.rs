//! OData-style list response wrapper

use serde::Deserialize;

/// One page of a list response with a `value` array.
///
/// Graph links the next page with `@odata.nextLink`, the management API with `nextLink`.
#[derive(Debug, Deserialize)]
pub struct ODataPage<T> {
    #[serde(rename = "value")]
    pub value: Vec<T>,

    #[serde(rename = "@odata.nextLink", alias = "nextLink", default)]
    pub next_link: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Item {
        id: String,
    }

    #[test]
    fn test_graph_next_link() {
        let page: ODataPage<Item> = serde_json::from_str(
            r#"{"value":[{"id":"a"}],"@odata.nextLink":"https://graph/next"}"#,
        )
        .unwrap();
        assert_eq!(page.value[0].id, "a");
        assert_eq!(page.next_link.as_deref(), Some("https://graph/next"));
    }

    #[test]
    fn test_management_next_link() {
        let page: ODataPage<Item> =
            serde_json::from_str(r#"{"value":[],"nextLink":"https://arm/next"}"#).unwrap();
        assert!(page.value.is_empty());
        assert_eq!(page.next_link.as_deref(), Some("https://arm/next"));
    }

    #[test]
    fn test_missing_value_is_rejected() {
        let result: Result<ODataPage<Item>, _> = serde_json::from_str(r#"{"error":{}}"#);
        assert!(result.is_err());
    }
}
