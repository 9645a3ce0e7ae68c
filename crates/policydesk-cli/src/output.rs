//! Terminal rendering for API responses: fixed-width tables for listings,
//! labelled fields for single records, or pretty JSON with `--json`.

use anyhow::Result;
use serde::Serialize;

use policydesk_core::{
    Agent, AgentStats, Branch, BranchStats, Customer, DashboardStats, MonthlyStats, Page, Policy,
    PolicyStats, Quote, ScrapedQuote, User,
};

/// Print `value` as JSON when asked, otherwise through `print`
pub fn render<T: Serialize>(as_json: bool, value: &T, print: impl FnOnce(&T)) -> Result<()> {
    if as_json {
        return json(value);
    }
    print(value);
    Ok(())
}

pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Pad or cut `s` to exactly `width` columns, marking cuts with `~`
fn fit(s: &str, width: usize) -> String {
    let count = s.chars().count();
    if count <= width {
        format!("{}{}", s, " ".repeat(width - count))
    } else {
        let cut: String = s.chars().take(width.saturating_sub(1)).collect();
        format!("{}~", cut)
    }
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() {
        "-"
    } else {
        s
    }
}

fn field(label: &str, value: impl std::fmt::Display) {
    println!("{:<14}{}", format!("{}:", label), value);
}

fn footer<T>(page: &Page<T>) {
    if page.is_empty() {
        println!("No results.");
        return;
    }
    let more = if page.has_next() { "  (--page for more)" } else { "" };
    println!("{}{}", page.summary(), more);
}

// ===== Users =====

pub fn user(user: &User) {
    field("ID", user.id);
    field("Email", &user.email);
    field("Role", &user.role);
    field("2FA", if user.two_fa_enabled { "enabled" } else { "disabled" });
    field("Active", user.is_active);
}

// ===== Customers =====

pub fn customers(page: &Page<Customer>) {
    println!(
        "{:>6}  {}  {}  {}  {}",
        "ID",
        fit("TC/VKN", 11),
        fit("Name", 28),
        fit("Phone", 14),
        "Location"
    );
    for c in &page.data {
        println!(
            "{:>6}  {}  {}  {}  {}",
            c.id,
            fit(&c.tc_vkn, 11),
            fit(&c.name, 28),
            fit(or_dash(&c.phone), 14),
            or_dash(&c.location_display())
        );
    }
    footer(page);
}

pub fn customer(c: &Customer) {
    field("ID", c.id);
    field(if c.is_corporate() { "VKN" } else { "TC" }, &c.tc_vkn);
    field("Name", &c.name);
    field("Email", or_dash(&c.email));
    field("Phone", or_dash(&c.phone));
    field("Address", or_dash(&c.address));
    field("Location", or_dash(&c.location_display()));
    field("Created", or_dash(&c.created_at));
}

// ===== Branches =====

pub fn branches(page: &Page<Branch>) {
    println!(
        "{:>6}  {}  {}  {}  {}",
        "ID",
        fit("Name", 24),
        fit("City", 14),
        fit("Manager", 24),
        "Active"
    );
    for b in &page.data {
        println!(
            "{:>6}  {}  {}  {}  {}",
            b.id,
            fit(&b.name, 24),
            fit(or_dash(&b.city), 14),
            fit(b.manager_display(), 24),
            if b.is_active { "yes" } else { "no" }
        );
    }
    footer(page);
}

pub fn branch(b: &Branch) {
    field("ID", b.id);
    field("Name", &b.name);
    field("City", or_dash(&b.city));
    field("Address", or_dash(&b.address));
    field("Phone", or_dash(&b.phone));
    field("Email", or_dash(&b.email));
    field("Manager", b.manager_display());
    field("Active", b.is_active);
}

// ===== Agents =====

pub fn agents(page: &Page<Agent>) {
    println!(
        "{:>6}  {}  {}  {}  {}",
        "ID",
        fit("Name", 24),
        fit("Branch", 20),
        fit("License", 12),
        "Active"
    );
    for a in &page.data {
        println!(
            "{:>6}  {}  {}  {}  {}",
            a.id,
            fit(&a.name, 24),
            fit(a.branch_name(), 20),
            fit(or_dash(&a.license_no), 12),
            if a.is_active { "yes" } else { "no" }
        );
    }
    footer(page);
}

pub fn agent(a: &Agent) {
    field("ID", a.id);
    field("Name", &a.name);
    field("Branch", a.branch_name());
    field("Email", or_dash(&a.email));
    field("Phone", or_dash(&a.phone));
    field("License", or_dash(&a.license_no));
    field("Active", a.is_active);
}

// ===== Policies =====

pub fn policies(page: &Page<Policy>) {
    println!(
        "{:>6}  {}  {}  {}  {:>12}  {}  {}",
        "ID",
        fit("Number", 12),
        fit("Customer", 22),
        fit("Company", 14),
        "Premium",
        fit("Status", 9),
        "Ends"
    );
    for p in &page.data {
        println!(
            "{:>6}  {}  {}  {}  {:>12}  {}  {}",
            p.id,
            fit(&p.policy_number, 12),
            fit(p.customer_name(), 22),
            fit(&p.company_name, 14),
            p.premium_display(),
            fit(p.status.as_str(), 9),
            p.end_date
        );
    }
    footer(page);
}

pub fn policy(p: &Policy) {
    field("ID", p.id);
    field("Number", &p.policy_number);
    field("Status", p.status);
    field("Customer", p.customer_name());
    if let Some(ref product) = p.product {
        field("Product", format!("{} ({})", product.name, or_dash(&product.kind)));
    }
    if let Some(ref agent) = p.agent {
        field("Agent", &agent.email);
    }
    field("Company", &p.company_name);
    field("Premium", p.premium_display());
    field("Period", format!("{} to {}", p.start_date, p.end_date));
    if let Some(quote_id) = p.quote_id {
        field("Quote", quote_id);
    }
}

// ===== Quotes =====

pub fn quote(q: &Quote) {
    field("ID", q.id);
    field("Status", &q.status);
    field("Coverage", or_dash(&q.coverage_type));
    field("Vehicle", or_dash(&q.vehicle_display()));
    field("Customer", q.customer_id);
    if !q.start_date.is_empty() {
        field("Period", format!("{} to {}", q.start_date, or_dash(&q.end_date)));
    }
}

pub fn offers(offers: &[ScrapedQuote]) {
    if offers.is_empty() {
        println!("No offers collected yet.");
        return;
    }
    println!("{}  {:>12}  {:>10}  {:>12}", fit("Company", 20), "Premium", "Discount", "Final");
    for o in offers {
        if o.is_error() {
            println!(
                "{}  failed: {}",
                fit(&o.company_name, 20),
                o.error_message.as_deref().unwrap_or("unknown error")
            );
            continue;
        }
        println!(
            "{}  {:>12.2}  {:>10.2}  {:>12.2}",
            fit(&o.company_name, 20),
            o.premium,
            o.discount,
            o.final_price
        );
    }
}

// ===== Reports =====

pub fn dashboard(s: &DashboardStats) {
    field("Customers", s.total_customers);
    field("Policies", s.total_policies);
    field("  active", s.active_policies);
    field("  expired", s.expired_policies);
    field("  cancelled", s.cancelled_policies);
    field("Quotes", s.total_quotes);
    field("Premium", format!("{:.2}", s.total_premium));
    field("  month", format!("{:.2}", s.monthly_premium));
    field("  year", format!("{:.2}", s.yearly_premium));
}

pub fn policy_stats(rows: &[PolicyStats]) {
    println!("{}  {:>8}  {:>14}", fit("Status", 10), "Count", "Amount");
    for r in rows {
        println!("{}  {:>8}  {:>14.2}", fit(&r.status, 10), r.count, r.amount);
    }
}

pub fn monthly_stats(rows: &[MonthlyStats]) {
    println!("{}  {:>8}  {:>14}", fit("Month", 8), "Count", "Amount");
    for r in rows {
        println!("{}  {:>8}  {:>14.2}", fit(&r.month, 8), r.count, r.amount);
    }
}

pub fn branch_stats(rows: &[BranchStats]) {
    println!("{}  {:>8}  {:>14}", fit("Branch", 24), "Policies", "Premium");
    for r in rows {
        println!(
            "{}  {:>8}  {:>14.2}",
            fit(&r.branch_name, 24),
            r.policy_count,
            r.total_premium
        );
    }
}

pub fn agent_stats(rows: &[AgentStats]) {
    println!("{}  {}  {:>8}  {:>14}", fit("Agent", 24), fit("Branch", 18), "Policies", "Premium");
    for r in rows {
        println!(
            "{}  {}  {:>8}  {:>14.2}",
            fit(&r.agent_name, 24),
            fit(or_dash(&r.branch_name), 18),
            r.policy_count,
            r.total_premium
        );
    }
}
