use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use super::{ApiError, Result};

/// Description of one outbound call, kept so it can be resubmitted after a
/// token refresh. `retried` flips once and is never reset.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) body: Option<Value>,
    pub(crate) retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        let value = serde_json::to_value(body).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to encode request body: {}", e))
        })?;
        self.body = Some(value);
        Ok(self)
    }

    /// Append query parameters from any struct that serializes to a flat map.
    /// `None` fields are skipped; nested values are sent as JSON text.
    pub fn query<Q: Serialize + ?Sized>(mut self, params: &Q) -> Result<Self> {
        let value = serde_json::to_value(params)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to encode query: {}", e)))?;
        match value {
            Value::Null => {}
            Value::Object(map) => {
                for (key, value) in map {
                    match value {
                        Value::Null => {}
                        Value::String(s) => self.query.push((key, s)),
                        other => self.query.push((key, other.to_string())),
                    }
                }
            }
            other => {
                return Err(ApiError::InvalidResponse(format!(
                    "Query parameters must be a map, got {}",
                    other
                )))
            }
        }
        Ok(self)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_retried(&self) -> bool {
        self.retried
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ListParams, PolicyFilter, PolicyStatus};

    #[test]
    fn test_query_flattens_filters() {
        let filter = PolicyFilter {
            list: ListParams::search("kasko").page(2),
            agent_id: Some(9),
            status: Some(PolicyStatus::Active),
            ..PolicyFilter::default()
        };
        let req = ApiRequest::get("/policies").query(&filter).unwrap();

        let mut pairs = req.query.clone();
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                ("agent_id".to_string(), "9".to_string()),
                ("page".to_string(), "2".to_string()),
                ("query".to_string(), "kasko".to_string()),
                ("status".to_string(), "active".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_rejects_non_map() {
        assert!(ApiRequest::get("/x").query(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_new_request_is_not_retried() {
        let req = ApiRequest::delete("/customers/4");
        assert_eq!(req.method(), &Method::DELETE);
        assert_eq!(req.path(), "/customers/4");
        assert!(!req.is_retried());
        assert!(req.body.is_none());
    }
}
