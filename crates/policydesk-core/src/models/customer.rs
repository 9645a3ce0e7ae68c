use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Customer {
    pub id: u64,
    /// National ID (TC) or tax number (VKN)
    pub tc_vkn: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub birth_date: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl Customer {
    /// Tax numbers (VKN) are 10 digits, national IDs (TC) are 11
    pub fn is_corporate(&self) -> bool {
        self.tc_vkn.len() == 10
    }

    /// "District / City", skipping whichever is missing
    pub fn location_display(&self) -> String {
        match (self.district.is_empty(), self.city.is_empty()) {
            (false, false) => format!("{} / {}", self.district, self.city),
            (true, false) => self.city.clone(),
            (false, true) => self.district.clone(),
            (true, true) => String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct CustomerRequest {
    pub tc_vkn: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_customer_with_missing_optionals() {
        let json = r#"{"id": 7, "tc_vkn": "12345678901", "name": "Ali Veli", "city": "Istanbul"}"#;
        let c: Customer = serde_json::from_str(json).unwrap();
        assert_eq!(c.id, 7);
        assert!(!c.is_corporate());
        assert_eq!(c.location_display(), "Istanbul");
        assert!(c.email.is_empty());
    }

    #[test]
    fn test_request_omits_unset_fields() {
        let req = CustomerRequest {
            tc_vkn: "1234567890".to_string(),
            name: "Acme Ltd".to_string(),
            city: Some("Ankara".to_string()),
            ..CustomerRequest::default()
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"tc_vkn": "1234567890", "name": "Acme Ltd", "city": "Ankara"})
        );
    }
}
