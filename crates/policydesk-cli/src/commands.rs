//! CLI commands

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Args, Subcommand, ValueEnum};
use tracing::{debug, warn};

use policydesk_core::{
    AgentFilter, ApiClient, Config, ExportFormat, ExportParams, ListParams, PolicyFilter,
    PolicyRequest, PolicyStatus, User,
};

use crate::output;

/// Search and paging flags shared by every `list` subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Free-text search
    #[arg(short, long)]
    pub search: Option<String>,

    /// Page number (starts at 1)
    #[arg(long)]
    pub page: Option<u32>,

    /// Rows per page (server caps this at 100)
    #[arg(long)]
    pub page_size: Option<u32>,
}

impl ListArgs {
    pub fn params(&self) -> ListParams {
        ListParams {
            query: self.search.clone(),
            page: self.page,
            page_size: self.page_size,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and store the credential pair
    Login {
        /// Account email (defaults to the last one used)
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Sign out and forget stored credentials
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Show local session state without contacting the server
    Status,

    /// Customer records
    Customers {
        #[command(subcommand)]
        command: RecordCommands,
    },

    /// Branch offices
    Branches {
        #[command(subcommand)]
        command: RecordCommands,
    },

    /// Sales agents
    Agents {
        #[command(subcommand)]
        command: AgentCommands,
    },

    /// Insurance policies
    Policies {
        #[command(subcommand)]
        command: PolicyCommands,
    },

    /// Show a quote and, optionally, the company offers collected for it
    Quote {
        id: u64,

        /// Include offers gathered from insurance companies
        #[arg(long)]
        scraped: bool,
    },

    /// Show a report
    Reports {
        #[arg(value_enum)]
        kind: ReportKind,
    },

    /// Export policies or customers
    Export {
        #[arg(value_enum)]
        target: ExportTarget,

        #[arg(short, long, value_enum, default_value = "csv")]
        format: FormatArg,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Only this branch (policies only)
        #[arg(long)]
        branch: Option<u64>,

        /// Only this agent (policies only)
        #[arg(long)]
        agent: Option<u64>,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Two-factor authentication setup
    #[command(name = "2fa")]
    TwoFa {
        #[command(subcommand)]
        command: TwoFaCommands,
    },
}

#[derive(Subcommand)]
pub enum RecordCommands {
    /// List records
    List {
        #[command(flatten)]
        list: ListArgs,
    },

    /// Show one record
    Show { id: u64 },

    /// Delete a record
    Delete {
        id: u64,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum AgentCommands {
    /// List agents
    List {
        #[command(flatten)]
        list: ListArgs,

        /// Only agents of this branch
        #[arg(long)]
        branch: Option<u64>,
    },

    /// Show one agent
    Show { id: u64 },

    /// Delete an agent
    Delete {
        id: u64,

        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum PolicyCommands {
    /// List policies
    List {
        #[command(flatten)]
        list: ListArgs,

        #[arg(long, value_enum)]
        status: Option<StatusArg>,

        /// Only policies of this customer
        #[arg(long)]
        customer: Option<u64>,

        /// Only policies sold by this agent
        #[arg(long)]
        agent: Option<u64>,
    },

    /// Show one policy
    Show { id: u64 },

    /// Mark a policy cancelled
    Cancel { id: u64 },

    /// Delete a policy
    Delete {
        id: u64,

        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum TwoFaCommands {
    /// Start setup: prints the secret, then asks for a confirmation code
    Enable,

    /// Confirm setup with a code from the authenticator app
    Verify { code: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Active,
    Expired,
    Cancelled,
}

impl From<StatusArg> for PolicyStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Active => PolicyStatus::Active,
            StatusArg::Expired => PolicyStatus::Expired,
            StatusArg::Cancelled => PolicyStatus::Cancelled,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Csv,
    Excel,
    Json,
}

impl From<FormatArg> for ExportFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Csv => ExportFormat::Csv,
            FormatArg::Excel => ExportFormat::Excel,
            FormatArg::Json => ExportFormat::Json,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportKind {
    /// Totals plus the policy status breakdown
    Dashboard,
    Monthly,
    Branches,
    Agents,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExportTarget {
    Policies,
    Customers,
}

impl Commands {
    pub async fn execute(self, client: &ApiClient, config: &Config, json: bool) -> Result<()> {
        match self {
            Commands::Login { email } => login(client, config, email).await,
            Commands::Logout => {
                client.logout().await;
                println!("Logged out.");
                Ok(())
            }
            Commands::Whoami => {
                let user = client.me().await?;
                output::render(json, &user, output::user)
            }
            Commands::Status => status(client, config),
            Commands::Customers { command } => customers(client, command, json).await,
            Commands::Branches { command } => branches(client, command, json).await,
            Commands::Agents { command } => agents(client, command, json).await,
            Commands::Policies { command } => policies(client, command, json).await,
            Commands::Quote { id, scraped } => quote(client, id, scraped, json).await,
            Commands::Reports { kind } => report(client, kind, json).await,
            Commands::Export {
                target,
                format,
                from,
                to,
                branch,
                agent,
                output,
            } => {
                let params = ExportParams {
                    start_date: from,
                    end_date: to,
                    branch_id: branch,
                    agent_id: agent,
                    format: Some(format.into()),
                };
                export(client, target, &params, output).await
            }
            Commands::TwoFa { command } => two_factor(client, command).await,
        }
    }
}

// ============================================================================
// Prompts
// ============================================================================

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim().to_string())
}

fn confirm(question: &str) -> Result<bool> {
    let answer = prompt(&format!("{} [y/N] ", question))?;
    Ok(matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
}

// ============================================================================
// Session
// ============================================================================

async fn login(client: &ApiClient, config: &Config, email: Option<String>) -> Result<()> {
    let email = match email {
        Some(email) => email,
        None => match config.last_email.as_deref() {
            Some(last) => {
                let entered = prompt(&format!("Email [{}]: ", last))?;
                if entered.is_empty() {
                    last.to_string()
                } else {
                    entered
                }
            }
            None => prompt("Email: ")?,
        },
    };
    if email.is_empty() {
        bail!("Email is required");
    }

    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;
    let mut response = client.login(&email, &password).await?;

    if response.requires_2fa {
        let code = prompt("Two-factor code: ")?;
        match client.verify_2fa_login(&code).await {
            Ok(verified) => response = verified,
            Err(e) => {
                // Drop the provisional pair so a half-finished login is not reused
                client.session().clear();
                return Err(e.into());
            }
        }
    }

    remember_email(&email);
    print_signed_in(&response.user);
    Ok(())
}

/// Persist the email for the next login prompt. Only the file config is
/// rewritten so environment and flag overrides never leak into it.
fn remember_email(email: &str) {
    let mut stored = match Config::load() {
        Ok(stored) => stored,
        Err(e) => {
            warn!(error = %e, "Could not read config, not saving email");
            return;
        }
    };
    if stored.last_email.as_deref() == Some(email) {
        return;
    }
    stored.last_email = Some(email.to_string());
    if let Err(e) = stored.save() {
        warn!(error = %e, "Failed to save config");
    }
}

fn print_signed_in(user: &User) {
    println!("Logged in as {} ({})", user.email, user.role);
    if !user.two_fa_enabled && user.is_admin() {
        println!("Tip: enable two-factor authentication with `policydesk 2fa enable`.");
    }
}

fn status(client: &ApiClient, config: &Config) -> Result<()> {
    println!("API:        {}", client.base_url());
    println!("Store:      {:?}", config.store_kind());

    let Some(tokens) = client.session().tokens() else {
        println!("Signed in:  no");
        return Ok(());
    };
    println!("Signed in:  {}", if client.is_authenticated() { "yes" } else { "no" });
    match (tokens.expires_at, tokens.minutes_until_expiry()) {
        (Some(at), Some(minutes)) => println!(
            "Expires:    {} ({} min, renewed automatically)",
            at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            minutes
        ),
        _ => println!("Expires:    unknown"),
    }
    println!(
        "Refresh:    {}",
        if tokens.refresh_token.is_empty() { "none" } else { "held" }
    );
    Ok(())
}

async fn two_factor(client: &ApiClient, command: TwoFaCommands) -> Result<()> {
    match command {
        TwoFaCommands::Enable => {
            let password =
                rpassword::prompt_password("Password: ").context("Failed to read password")?;
            let setup = client.enable_2fa(&password).await?;
            println!("Secret:       {}", setup.secret);
            println!("Setup URL:    {}", setup.qr_code_url);
            println!();
            println!("Add the secret to your authenticator app, then enter a code.");
            let code = prompt("Code: ")?;
            let resp = client.verify_2fa_setup(&code).await?;
            println!("{}", resp.message);
        }
        TwoFaCommands::Verify { code } => {
            let resp = client.verify_2fa_setup(&code).await?;
            println!("{}", resp.message);
        }
    }
    Ok(())
}

// ============================================================================
// Records
// ============================================================================

async fn customers(client: &ApiClient, command: RecordCommands, json: bool) -> Result<()> {
    match command {
        RecordCommands::List { list } => {
            let page = client.list_customers(&list.params()).await?;
            output::render(json, &page, output::customers)
        }
        RecordCommands::Show { id } => {
            let customer = client.get_customer(id).await?;
            output::render(json, &customer, output::customer)
        }
        RecordCommands::Delete { id, yes } => {
            if !yes && !confirm(&format!("Delete customer {}?", id))? {
                return Ok(());
            }
            println!("{}", client.delete_customer(id).await?.message);
            Ok(())
        }
    }
}

async fn branches(client: &ApiClient, command: RecordCommands, json: bool) -> Result<()> {
    match command {
        RecordCommands::List { list } => {
            let page = client.list_branches(&list.params()).await?;
            output::render(json, &page, output::branches)
        }
        RecordCommands::Show { id } => {
            let branch = client.get_branch(id).await?;
            output::render(json, &branch, output::branch)
        }
        RecordCommands::Delete { id, yes } => {
            if !yes && !confirm(&format!("Delete branch {}?", id))? {
                return Ok(());
            }
            println!("{}", client.delete_branch(id).await?.message);
            Ok(())
        }
    }
}

async fn agents(client: &ApiClient, command: AgentCommands, json: bool) -> Result<()> {
    match command {
        AgentCommands::List { list, branch } => {
            let filter = AgentFilter {
                list: list.params(),
                branch_id: branch,
            };
            let page = client.list_agents(&filter).await?;
            output::render(json, &page, output::agents)
        }
        AgentCommands::Show { id } => {
            let agent = client.get_agent(id).await?;
            output::render(json, &agent, output::agent)
        }
        AgentCommands::Delete { id, yes } => {
            if !yes && !confirm(&format!("Delete agent {}?", id))? {
                return Ok(());
            }
            println!("{}", client.delete_agent(id).await?.message);
            Ok(())
        }
    }
}

async fn policies(client: &ApiClient, command: PolicyCommands, json: bool) -> Result<()> {
    match command {
        PolicyCommands::List {
            list,
            status,
            customer,
            agent,
        } => {
            let filter = PolicyFilter {
                list: list.params(),
                customer_id: customer,
                agent_id: agent,
                status: status.map(Into::into),
            };
            let page = client.list_policies(&filter).await?;
            output::render(json, &page, output::policies)
        }
        PolicyCommands::Show { id } => {
            let policy = client.get_policy(id).await?;
            output::render(json, &policy, output::policy)
        }
        PolicyCommands::Cancel { id } => {
            let update = PolicyRequest {
                status: Some(PolicyStatus::Cancelled),
                ..PolicyRequest::default()
            };
            let policy = client.update_policy(id, &update).await?;
            println!("Policy {} is now {}", policy.policy_number, policy.status);
            Ok(())
        }
        PolicyCommands::Delete { id, yes } => {
            if !yes && !confirm(&format!("Delete policy {}?", id))? {
                return Ok(());
            }
            println!("{}", client.delete_policy(id).await?.message);
            Ok(())
        }
    }
}

async fn quote(client: &ApiClient, id: u64, scraped: bool, json: bool) -> Result<()> {
    if !scraped {
        let quote = client.get_quote(id).await?;
        return output::render(json, &quote, output::quote);
    }

    let (quote, offers) = futures::try_join!(client.get_quote(id), client.scraped_quotes(id))?;
    if json {
        return output::json(&serde_json::json!({ "quote": quote, "offers": offers }));
    }
    output::quote(&quote);
    println!();
    output::offers(&offers);
    Ok(())
}

// ============================================================================
// Reports
// ============================================================================

async fn report(client: &ApiClient, kind: ReportKind, json: bool) -> Result<()> {
    match kind {
        ReportKind::Dashboard => {
            let (stats, by_status) =
                futures::try_join!(client.dashboard_stats(), client.policy_stats())?;
            if json {
                return output::json(&serde_json::json!({ "stats": stats, "by_status": by_status }));
            }
            output::dashboard(&stats);
            println!();
            output::policy_stats(&by_status);
            Ok(())
        }
        ReportKind::Monthly => {
            let rows = client.monthly_stats().await?;
            output::render(json, &rows, |rows| output::monthly_stats(rows))
        }
        ReportKind::Branches => {
            let rows = client.branch_stats().await?;
            output::render(json, &rows, |rows| output::branch_stats(rows))
        }
        ReportKind::Agents => {
            let rows = client.agent_stats().await?;
            output::render(json, &rows, |rows| output::agent_stats(rows))
        }
    }
}

async fn export(
    client: &ApiClient,
    target: ExportTarget,
    params: &ExportParams,
    path: Option<PathBuf>,
) -> Result<()> {
    let body = match target {
        ExportTarget::Policies => client.export_policies(params).await?,
        ExportTarget::Customers => client.export_customers(params).await?,
    };

    match path {
        Some(path) => {
            std::fs::write(&path, &body)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            debug!(path = %path.display(), bytes = body.len(), "Export written");
            eprintln!("Wrote {}", path.display());
        }
        None => print!("{}", body),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_args_map_to_params() {
        let args = ListArgs {
            search: Some("ali".to_string()),
            page: Some(3),
            page_size: None,
        };
        let params = args.params();
        assert_eq!(params.query.as_deref(), Some("ali"));
        assert_eq!(params.page, Some(3));
        assert_eq!(params.page_size, None);
    }

    #[test]
    fn test_status_arg_conversion() {
        assert_eq!(PolicyStatus::from(StatusArg::Expired), PolicyStatus::Expired);
        assert_eq!(ExportFormat::from(FormatArg::Excel), ExportFormat::Excel);
    }
}
