use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct DashboardStats {
    pub total_customers: i64,
    pub total_policies: i64,
    pub total_quotes: i64,
    pub total_premium: f64,
    pub active_policies: i64,
    pub expired_policies: i64,
    pub cancelled_policies: i64,
    pub monthly_premium: f64,
    pub yearly_premium: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct PolicyStats {
    pub status: String,
    pub count: i64,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct MonthlyStats {
    pub month: String,
    pub count: i64,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct BranchStats {
    pub branch_id: u64,
    pub branch_name: String,
    pub policy_count: i64,
    pub total_premium: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct AgentStats {
    pub agent_id: u64,
    pub agent_name: String,
    #[serde(default)]
    pub branch_name: String,
    pub policy_count: i64,
    pub total_premium: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Excel,
    Json,
}

/// Filters for the export endpoints. Dates are `YYYY-MM-DD`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<ExportFormat>,
}
