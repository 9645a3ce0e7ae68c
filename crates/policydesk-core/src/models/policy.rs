use std::fmt;

use serde::{Deserialize, Serialize};

use super::ListParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum PolicyStatus {
    Active,
    Expired,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl PolicyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyStatus::Active => "active",
            PolicyStatus::Expired => "expired",
            PolicyStatus::Cancelled => "cancelled",
            PolicyStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PolicyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct PolicyCustomer {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub tc_vkn: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct PolicyProduct {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct PolicyAgent {
    pub id: u64,
    pub email: String,
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Policy {
    pub id: u64,
    pub customer_id: u64,
    #[serde(default)]
    pub customer: Option<PolicyCustomer>,
    pub product_id: u64,
    #[serde(default)]
    pub product: Option<PolicyProduct>,
    pub agent_id: u64,
    #[serde(default)]
    pub agent: Option<PolicyAgent>,
    #[serde(default)]
    pub quote_id: Option<u64>,
    pub policy_number: String,
    pub company_name: String,
    pub premium: f64,
    pub status: PolicyStatus,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl Policy {
    pub fn customer_name(&self) -> &str {
        self.customer.as_ref().map(|c| c.name.as_str()).unwrap_or("-")
    }

    pub fn premium_display(&self) -> String {
        format!("{:.2}", self.premium)
    }
}

/// Body for create and update. Create requires customer, product, agent,
/// company, premium and both dates; update sends only what changed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct PolicyRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub premium: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PolicyStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PolicyFilter {
    #[serde(flatten)]
    pub list: ListParams,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PolicyStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_policy() {
        let json = r#"{
            "id": 3, "customer_id": 1,
            "customer": {"id": 1, "name": "Ali Veli", "tc_vkn": "12345678901"},
            "product_id": 2, "product": {"id": 2, "name": "Kasko", "type": "motor"},
            "agent_id": 5, "agent": {"id": 5, "email": "agent@x.com", "role": "agent"},
            "quote_id": null, "policy_number": "POL-0003", "company_name": "Allianz",
            "premium": 1260.5, "status": "active", "start_date": "2025-01-01",
            "end_date": "2026-01-01", "created_at": "2025-01-01 10:00:00",
            "updated_at": "2025-01-01 10:00:00"
        }"#;
        let p: Policy = serde_json::from_str(json).unwrap();
        assert_eq!(p.status, PolicyStatus::Active);
        assert_eq!(p.customer_name(), "Ali Veli");
        assert_eq!(p.product.as_ref().unwrap().kind, "motor");
        assert_eq!(p.premium_display(), "1260.50");
    }

    #[test]
    fn test_unknown_status_does_not_fail() {
        let status: PolicyStatus = serde_json::from_str(r#""suspended""#).unwrap();
        assert_eq!(status, PolicyStatus::Unknown);
    }

    #[test]
    fn test_filter_flattens_list_params() {
        let filter = PolicyFilter {
            list: ListParams::default().page(2),
            status: Some(PolicyStatus::Expired),
            ..PolicyFilter::default()
        };
        let value = serde_json::to_value(&filter).unwrap();
        assert_eq!(value, serde_json::json!({"page": 2, "status": "expired"}));
    }
}
