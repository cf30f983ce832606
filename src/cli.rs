//! Command-line surface.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "crmc")]
#[command(about = "A terminal client for the CRM REST backend")]
#[command(version)]
pub struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/crmc/config.yaml)
  #[arg(short, long)]
  pub config: Option<PathBuf>,

  #[command(subcommand)]
  pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Log in and store the session token (password from CRMC_PASSWORD)
  Login {
    email: String,
  },
  /// Create an account and log in (password from CRMC_PASSWORD)
  Signup {
    name: String,
    email: String,
    #[arg(long)]
    role_id: u64,
  },
  /// Discard the stored session
  Logout,
  /// Browse and edit leads
  Leads {
    #[command(subcommand)]
    action: LeadAction,
  },
  /// Browse customers (converted, active leads)
  Customers {
    #[command(subcommand)]
    action: CustomerAction,
  },
  /// Leads grouped by status, one column per pipeline stage
  Kanban,
  /// Browse and administer users
  Users {
    #[command(subcommand)]
    action: UserAction,
  },
  /// List the available roles
  Roles,
  /// Browse and edit work items
  WorkItems {
    #[command(subcommand)]
    action: WorkItemAction,
  },
  /// Browse and edit tasks
  Tasks {
    #[command(subcommand)]
    action: TaskAction,
  },
  /// Browse and edit the communication log
  Comms {
    #[command(subcommand)]
    action: CommAction,
  },
  /// Analytics summary over leads, work items, and tasks
  Dashboard,
}

#[derive(Subcommand, Debug)]
pub enum LeadAction {
  List,
  Show {
    id: u64,
  },
  Create(LeadFields),
  Update {
    id: u64,
    #[command(flatten)]
    fields: LeadUpdateFields,
  },
  Delete {
    id: u64,
  },
  /// Convert the lead into a customer
  Convert {
    id: u64,
  },
}

#[derive(ClapArgs, Debug)]
pub struct LeadFields {
  #[arg(long)]
  pub name: String,
  #[arg(long)]
  pub email: Option<String>,
  #[arg(long)]
  pub phone: Option<String>,
  #[arg(long)]
  pub status_id: u64,
  #[arg(long)]
  pub source_id: u64,
  #[arg(long)]
  pub assigned_to: Option<u64>,
  #[arg(long)]
  pub notes: Option<String>,
}

#[derive(ClapArgs, Debug)]
pub struct LeadUpdateFields {
  #[arg(long)]
  pub name: Option<String>,
  #[arg(long)]
  pub email: Option<String>,
  #[arg(long)]
  pub phone: Option<String>,
  #[arg(long)]
  pub status_id: Option<u64>,
  #[arg(long)]
  pub source_id: Option<u64>,
  #[arg(long)]
  pub assigned_to: Option<u64>,
  #[arg(long)]
  pub notes: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum CustomerAction {
  List,
  /// Create a lead that is already converted
  Add(LeadFields),
}

#[derive(Subcommand, Debug)]
pub enum UserAction {
  List,
  Show {
    id: u64,
  },
  Create {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    role_id: u64,
  },
  Update {
    id: u64,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    role_id: Option<u64>,
  },
  Delete {
    id: u64,
  },
}

#[derive(Subcommand, Debug)]
pub enum WorkItemAction {
  List {
    #[arg(long)]
    customer_id: Option<u64>,
    #[arg(long)]
    assigned_to: Option<u64>,
    #[arg(long)]
    status_id: Option<u64>,
  },
  Show {
    id: u64,
  },
  Create {
    #[arg(long)]
    title: String,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    customer_id: u64,
    #[arg(long)]
    assigned_to: Option<u64>,
    #[arg(long)]
    status_id: u64,
  },
  Update {
    id: u64,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    assigned_to: Option<u64>,
    #[arg(long)]
    status_id: Option<u64>,
  },
  Delete {
    id: u64,
  },
}

#[derive(Subcommand, Debug)]
pub enum TaskAction {
  List {
    #[arg(long)]
    customer_id: Option<u64>,
    #[arg(long)]
    work_item_id: Option<u64>,
    #[arg(long)]
    assigned_to: Option<u64>,
    #[arg(long)]
    status_id: Option<u64>,
  },
  Create {
    #[arg(long)]
    title: String,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    work_item_id: u64,
    #[arg(long)]
    customer_id: u64,
    #[arg(long)]
    assigned_to: Option<u64>,
    #[arg(long)]
    status_id: u64,
  },
  Update {
    id: u64,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    work_item_id: Option<u64>,
    #[arg(long)]
    assigned_to: Option<u64>,
    #[arg(long)]
    status_id: Option<u64>,
  },
  Delete {
    id: u64,
    /// Parent work item, so its task list refreshes too
    #[arg(long)]
    work_item_id: Option<u64>,
  },
}

#[derive(Subcommand, Debug)]
pub enum CommAction {
  /// List communications, optionally for one lead or author
  List {
    #[arg(long)]
    lead_id: Option<u64>,
    #[arg(long)]
    created_by: Option<u64>,
  },
  Add {
    #[arg(long)]
    lead_id: u64,
    #[arg(long)]
    message: String,
  },
  Update {
    id: u64,
    #[arg(long)]
    lead_id: u64,
    #[arg(long)]
    message: String,
  },
  Delete {
    id: u64,
    #[arg(long)]
    lead_id: u64,
  },
}
