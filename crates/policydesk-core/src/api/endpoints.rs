//! Domain operations. Each one is a single `ApiRequest` sent through
//! [`ApiClient::request`], so all of them get the same token handling.

use crate::models::{
    Agent, AgentFilter, AgentRequest, AgentStats, Branch, BranchRequest, BranchStats, Customer,
    CustomerRequest, DashboardStats, ExportParams, ListParams, MessageResponse, MonthlyStats, Page,
    Policy, PolicyFilter, PolicyRequest, PolicyStats, Quote, ScrapedQuote,
};

use super::{ApiClient, ApiRequest, Result};

impl ApiClient {
    // ===== Customers =====

    pub async fn list_customers(&self, params: &ListParams) -> Result<Page<Customer>> {
        self.request(ApiRequest::get("/customers").query(params)?).await
    }

    pub async fn get_customer(&self, id: u64) -> Result<Customer> {
        self.request(ApiRequest::get(format!("/customers/{}", id))).await
    }

    pub async fn create_customer(&self, customer: &CustomerRequest) -> Result<Customer> {
        self.request(ApiRequest::post("/customers").json(customer)?).await
    }

    pub async fn update_customer(&self, id: u64, customer: &CustomerRequest) -> Result<Customer> {
        self.request(ApiRequest::put(format!("/customers/{}", id)).json(customer)?)
            .await
    }

    pub async fn delete_customer(&self, id: u64) -> Result<MessageResponse> {
        self.request(ApiRequest::delete(format!("/customers/{}", id))).await
    }

    // ===== Branches =====

    pub async fn list_branches(&self, params: &ListParams) -> Result<Page<Branch>> {
        self.request(ApiRequest::get("/branches").query(params)?).await
    }

    pub async fn get_branch(&self, id: u64) -> Result<Branch> {
        self.request(ApiRequest::get(format!("/branches/{}", id))).await
    }

    pub async fn create_branch(&self, branch: &BranchRequest) -> Result<Branch> {
        self.request(ApiRequest::post("/branches").json(branch)?).await
    }

    pub async fn update_branch(&self, id: u64, branch: &BranchRequest) -> Result<Branch> {
        self.request(ApiRequest::put(format!("/branches/{}", id)).json(branch)?)
            .await
    }

    pub async fn delete_branch(&self, id: u64) -> Result<MessageResponse> {
        self.request(ApiRequest::delete(format!("/branches/{}", id))).await
    }

    // ===== Agents =====

    pub async fn list_agents(&self, filter: &AgentFilter) -> Result<Page<Agent>> {
        self.request(ApiRequest::get("/agents").query(filter)?).await
    }

    pub async fn get_agent(&self, id: u64) -> Result<Agent> {
        self.request(ApiRequest::get(format!("/agents/{}", id))).await
    }

    pub async fn create_agent(&self, agent: &AgentRequest) -> Result<Agent> {
        self.request(ApiRequest::post("/agents").json(agent)?).await
    }

    pub async fn update_agent(&self, id: u64, agent: &AgentRequest) -> Result<Agent> {
        self.request(ApiRequest::put(format!("/agents/{}", id)).json(agent)?)
            .await
    }

    pub async fn delete_agent(&self, id: u64) -> Result<MessageResponse> {
        self.request(ApiRequest::delete(format!("/agents/{}", id))).await
    }

    // ===== Policies =====

    pub async fn list_policies(&self, filter: &PolicyFilter) -> Result<Page<Policy>> {
        self.request(ApiRequest::get("/policies").query(filter)?).await
    }

    pub async fn get_policy(&self, id: u64) -> Result<Policy> {
        self.request(ApiRequest::get(format!("/policies/{}", id))).await
    }

    pub async fn create_policy(&self, policy: &PolicyRequest) -> Result<Policy> {
        self.request(ApiRequest::post("/policies").json(policy)?).await
    }

    pub async fn update_policy(&self, id: u64, policy: &PolicyRequest) -> Result<Policy> {
        self.request(ApiRequest::put(format!("/policies/{}", id)).json(policy)?)
            .await
    }

    pub async fn delete_policy(&self, id: u64) -> Result<MessageResponse> {
        self.request(ApiRequest::delete(format!("/policies/{}", id))).await
    }

    // ===== Reports =====

    pub async fn dashboard_stats(&self) -> Result<DashboardStats> {
        self.request(ApiRequest::get("/reports/dashboard")).await
    }

    pub async fn policy_stats(&self) -> Result<Vec<PolicyStats>> {
        self.request(ApiRequest::get("/reports/policy-stats")).await
    }

    pub async fn monthly_stats(&self) -> Result<Vec<MonthlyStats>> {
        self.request(ApiRequest::get("/reports/monthly-stats")).await
    }

    pub async fn branch_stats(&self) -> Result<Vec<BranchStats>> {
        self.request(ApiRequest::get("/reports/branch-stats")).await
    }

    pub async fn agent_stats(&self) -> Result<Vec<AgentStats>> {
        self.request(ApiRequest::get("/reports/agent-stats")).await
    }

    /// Export policies in the requested format, returned verbatim
    pub async fn export_policies(&self, params: &ExportParams) -> Result<String> {
        self.request_text(ApiRequest::get("/reports/export/policies").query(params)?)
            .await
    }

    /// Export customers in the requested format. Branch and agent filters
    /// do not apply and are ignored by the server.
    pub async fn export_customers(&self, params: &ExportParams) -> Result<String> {
        self.request_text(ApiRequest::get("/reports/export/customers").query(params)?)
            .await
    }

    // ===== Quotes =====

    pub async fn get_quote(&self, id: u64) -> Result<Quote> {
        self.request(ApiRequest::get(format!("/quotes/{}", id))).await
    }

    /// Company offers collected for a quote, as returned by the server
    pub async fn scraped_quotes(&self, quote_id: u64) -> Result<Vec<ScrapedQuote>> {
        self.request(ApiRequest::get(format!("/quotes/{}/scraped", quote_id)))
            .await
    }
}
