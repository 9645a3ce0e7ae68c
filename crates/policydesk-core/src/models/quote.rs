use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Quote {
    pub id: u64,
    pub customer_id: u64,
    pub product_id: u64,
    #[serde(default)]
    pub agent_id: Option<u64>,
    #[serde(default)]
    pub vehicle_plate: String,
    #[serde(default)]
    pub vehicle_year: Option<i32>,
    #[serde(default)]
    pub vehicle_brand: String,
    #[serde(default)]
    pub vehicle_model: String,
    /// kasko, trafik, dask, saglik
    #[serde(default)]
    pub coverage_type: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub additional_info: String,
    /// pending, processing, completed, approved
    pub status: String,
    #[serde(default)]
    pub created_at: String,
}

impl Quote {
    pub fn vehicle_display(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(year) = self.vehicle_year {
            parts.push(year.to_string());
        }
        for s in [&self.vehicle_brand, &self.vehicle_model] {
            if !s.is_empty() {
                parts.push(s.clone());
            }
        }
        if !self.vehicle_plate.is_empty() {
            parts.push(format!("({})", self.vehicle_plate));
        }
        parts.join(" ")
    }
}

/// An offer collected from one insurance company for a quote
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ScrapedQuote {
    pub id: u64,
    pub quote_id: u64,
    pub company_name: String,
    #[serde(default)]
    pub company_logo: String,
    pub premium: f64,
    #[serde(default)]
    pub coverage_amount: f64,
    #[serde(default)]
    pub discount: f64,
    pub final_price: f64,
    /// scraped or error
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub scraped_at: String,
}

impl ScrapedQuote {
    pub fn is_error(&self) -> bool {
        self.status == "error"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vehicle_display() {
        let quote: Quote = serde_json::from_str(
            r#"{"id": 1, "customer_id": 1, "product_id": 1, "vehicle_brand": "Toyota",
                "vehicle_model": "Corolla", "vehicle_year": 2020, "vehicle_plate": "34 ABC 123",
                "status": "pending"}"#,
        )
        .unwrap();
        assert_eq!(quote.vehicle_display(), "2020 Toyota Corolla (34 ABC 123)");
    }
}
