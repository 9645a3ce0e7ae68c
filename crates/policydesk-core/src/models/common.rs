use serde::{Deserialize, Deserializer, Serialize};

/// One page of a paginated listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Page<T> {
    /// The server sends `null` rather than `[]` when nothing matched
    #[serde(
        default,
        deserialize_with = "null_as_empty"
    )]
    pub data: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// "Page 2 of 5 (87 total)"
    pub fn summary(&self) -> String {
        format!(
            "Page {} of {} ({} total)",
            self.page,
            self.total_pages.max(1),
            self.total
        )
    }
}

/// Free-text search and pagination shared by every list endpoint.
/// The server defaults to page 1 with 20 rows and caps page size at 100.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(rename = "pageSize", skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

impl ListParams {
    pub fn search(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Self::default()
        }
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_navigation() {
        let page: Page<u32> = Page {
            data: vec![1, 2],
            total: 42,
            page: 1,
            page_size: 20,
            total_pages: 3,
        };
        assert!(page.has_next());
        assert_eq!(page.summary(), "Page 1 of 3 (42 total)");

        let empty: Page<u32> = Page {
            data: vec![],
            total: 0,
            page: 1,
            page_size: 20,
            total_pages: 0,
        };
        assert!(!empty.has_next());
        assert!(empty.is_empty());
        assert_eq!(empty.summary(), "Page 1 of 1 (0 total)");
    }

    #[test]
    fn test_null_data_is_an_empty_page() {
        let page: Page<u32> = serde_json::from_str(
            r#"{"data": null, "total": 0, "page": 1, "page_size": 20, "total_pages": 0}"#,
        )
        .unwrap();
        assert!(page.is_empty());

        let page: Page<u32> =
            serde_json::from_str(r#"{"total": 0, "page": 1, "page_size": 20, "total_pages": 0}"#)
                .unwrap();
        assert!(page.is_empty());
    }

    #[test]
    fn test_list_params_skip_unset() {
        let value = serde_json::to_value(ListParams::search("ali").page_size(50)).unwrap();
        assert_eq!(value, serde_json::json!({"query": "ali", "pageSize": 50}));
    }
}
