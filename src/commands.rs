//! Command dispatch: wires the views together and renders their output.

use color_eyre::{eyre::eyre, Result};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;
use url::Url;

use crate::api::types::{
  Communication, CreateCommunication, CreateLead, CreateTask, CreateUser, CreateWorkItem, Lead,
  Task, UpdateCommunication, UpdateLead, UpdateTask, UpdateUser, UpdateWorkItem, User, WorkItem,
};
use crate::api::{
  AuthApi, CommsApi, CommunicationFilters, HttpClient, LeadsApi, LoginRequest, SignupRequest,
  TaskFilters, UsersApi, WorkApi, WorkItemFilters,
};
use crate::cache::{CacheClient, QueryKey, QueryOptions};
use crate::cli::{
  CommAction, Command, CustomerAction, LeadAction, LeadFields, LeadUpdateFields, TaskAction,
  UserAction, WorkItemAction,
};
use crate::config::Config;
use crate::error::ApiError;
use crate::messages;
use crate::notify::{Notice, Notifier};
use crate::session::Session;
use crate::views::{
  CommsView, CustomersView, DashboardView, LeadsView, UsersView, ViewData, WorkView,
};

/// Log in, store the session, and greet the user.
pub async fn login(config: &Config, email: String) -> Result<()> {
  let password = Config::get_password()?;
  let http = HttpClient::new(&config.api.url, None, None)?;
  let auth = AuthApi::new(http);

  match auth.login(&LoginRequest { email, password }).await {
    Ok(payload) => {
      let session = Session {
        token: payload.token,
        user: payload.user,
      };
      session.save()?;
      info!(user = %session.user.name, "logged in");
      println!("{}", messages::LOGIN_SUCCESS);
      Ok(())
    }
    Err(ApiError::Auth { .. } | ApiError::Client { .. }) => Err(eyre!(messages::LOGIN_ERROR)),
    Err(err) => Err(eyre!(err.user_message())),
  }
}

pub async fn signup(config: &Config, name: String, email: String, role_id: u64) -> Result<()> {
  let password = Config::get_password()?;
  let http = HttpClient::new(&config.api.url, None, None)?;
  let auth = AuthApi::new(http);

  let request = SignupRequest {
    name,
    email,
    password,
    role_id,
  };
  match auth.signup(&request).await {
    Ok(payload) => {
      let session = Session {
        token: payload.token,
        user: payload.user,
      };
      session.save()?;
      println!("{}", messages::SIGNUP_SUCCESS);
      Ok(())
    }
    Err(ApiError::Client { message, .. }) => Err(eyre!(message)),
    Err(_) => Err(eyre!(messages::SIGNUP_ERROR)),
  }
}

pub fn logout() -> Result<()> {
  Session::clear()?;
  println!("{}", messages::LOGOUT_SUCCESS);
  Ok(())
}

/// Everything that needs an authenticated session.
pub struct App {
  title: String,
  leads: LeadsView,
  customers: CustomersView,
  users: UsersView,
  work: WorkView,
  comms: CommsView,
  dashboard: DashboardView,
  notices: UnboundedReceiver<Notice>,
}

impl App {
  /// Restore the stored session, validate it against the backend, and wire
  /// up the views. An invalid session is cleared so the next run starts
  /// logged out.
  pub async fn new(config: &Config) -> Result<Self> {
    let session =
      Session::load().ok_or_else(|| eyre!("Not logged in. Run `crmc login <email>` first."))?;

    let http = HttpClient::new(
      &config.api.url,
      Some(session.token.clone()),
      Some(session.user.id),
    )?;

    let (notifier, notices) = Notifier::new();
    let cache = CacheClient::new(
      QueryOptions {
        stale_time: config.cache.stale_time(),
        gc_time: config.cache.gc_time(),
      },
      notifier,
    );

    // Validate the restored token through the same read path everything
    // else uses; a dead session gets cleared instead of failing every call.
    let auth = AuthApi::new(http.clone());
    let me = {
      let auth = auth.clone();
      cache
        .query::<User, _, _>(QueryKey::AuthMe, cache.defaults(), move || {
          let auth = auth.clone();
          async move { auth.me().await }
        })
        .await
    };
    if let Err(err) = me {
      if matches!(err, ApiError::Auth { .. }) {
        Session::clear()?;
        return Err(eyre!(messages::TOKEN_EXPIRED));
      }
      return Err(eyre!(err.user_message()));
    }

    let leads_api = LeadsApi::new(http.clone());
    Ok(Self {
      title: output_title(config),
      leads: LeadsView::new(cache.clone(), leads_api.clone()),
      customers: CustomersView::new(cache.clone(), leads_api),
      users: UsersView::new(cache.clone(), UsersApi::new(http.clone())),
      work: WorkView::new(cache.clone(), WorkApi::new(http.clone())),
      comms: CommsView::new(cache.clone(), CommsApi::new(http.clone())),
      dashboard: DashboardView::new(
        LeadsView::new(cache.clone(), LeadsApi::new(http.clone())),
        WorkView::new(cache, WorkApi::new(http)),
      ),
      notices,
    })
  }

  pub async fn run(mut self, command: Command) -> Result<()> {
    let outcome = self.dispatch(command).await;
    self.drain_notices();
    outcome.map_err(|err| eyre!(err.user_message()))
  }

  async fn dispatch(&mut self, command: Command) -> Result<(), ApiError> {
    match command {
      Command::Login { .. } | Command::Signup { .. } | Command::Logout => {
        // Handled in main before the app is constructed.
        Ok(())
      }
      Command::Leads { action } => self.leads(action).await,
      Command::Customers { action } => self.customers(action).await,
      Command::Kanban => self.kanban().await,
      Command::Users { action } => self.users(action).await,
      Command::Roles => {
        let roles = self.users.roles().await?;
        println!("{:<5} {:<20} DESCRIPTION", "ID", "NAME");
        for role in roles {
          println!(
            "{:<5} {:<20} {}",
            role.id,
            role.name,
            role.description.unwrap_or_default()
          );
        }
        Ok(())
      }
      Command::WorkItems { action } => self.work_items(action).await,
      Command::Tasks { action } => self.tasks(action).await,
      Command::Comms { action } => self.comms(action).await,
      Command::Dashboard => self.dashboard().await,
    }
  }

  async fn leads(&self, action: LeadAction) -> Result<(), ApiError> {
    match action {
      LeadAction::List => {
        let leads = self.leads.leads().await?;
        print_leads(&leads);
      }
      LeadAction::Show { id } => {
        let lead = self.leads.lead(id).await?;
        print_lead_detail(&lead);
      }
      LeadAction::Create(fields) => {
        let lead = self.leads.create(create_lead_payload(fields)).await?;
        println!("Created lead #{}", lead.id);
      }
      LeadAction::Update { id, fields } => {
        let lead = self.leads.update(id, update_lead_payload(fields)).await?;
        println!("Updated lead #{}", lead.id);
      }
      LeadAction::Delete { id } => {
        self.leads.delete(id).await?;
      }
      LeadAction::Convert { id } => {
        self.leads.convert(id).await?;
      }
    }
    Ok(())
  }

  async fn customers(&self, action: CustomerAction) -> Result<(), ApiError> {
    match action {
      CustomerAction::List => {
        let customers = self.customers.customers().await?;
        print_leads(&customers);
      }
      CustomerAction::Add(fields) => {
        let customer = self
          .customers
          .add_customer(create_lead_payload(fields))
          .await?;
        println!("Created customer #{}", customer.id);
      }
    }
    Ok(())
  }

  /// One column per pipeline status, fetched concurrently. A column that
  /// fails to load reports its error without blanking the rest of the board.
  async fn kanban(&self) -> Result<(), ApiError> {
    let statuses = self.leads.statuses().await?;
    let columns = futures::future::join_all(
      statuses.iter().map(|s| self.leads.leads_by_status(s.id)),
    )
    .await;

    for (status, column) in statuses.iter().zip(columns) {
      let column = ViewData::from_result(column);
      println!("== {} ({}) ==", status.name, column.items.len());
      for lead in column.items {
        println!("  #{:<5} {}", lead.id, lead.name);
      }
      if let Some(error) = column.error {
        eprintln!("error: {error}");
      }
    }
    Ok(())
  }

  async fn users(&self, action: UserAction) -> Result<(), ApiError> {
    match action {
      UserAction::List => {
        let users = self.users.active_users().await?;
        print_users(&users);
      }
      UserAction::Show { id } => {
        let user = self.users.user(id).await?;
        print_users(std::slice::from_ref(&user));
      }
      UserAction::Create {
        name,
        email,
        role_id,
      } => {
        let password = Config::get_password().map_err(|e| ApiError::Client {
          status: 400,
          message: e.to_string(),
        })?;
        let user = self
          .users
          .create(CreateUser {
            name,
            email,
            password,
            role_id,
          })
          .await?;
        println!("Created user #{}", user.id);
      }
      UserAction::Update {
        id,
        name,
        email,
        role_id,
      } => {
        let user = self
          .users
          .update(
            id,
            UpdateUser {
              name,
              email,
              role_id,
              ..UpdateUser::default()
            },
          )
          .await?;
        println!("Updated user #{}", user.id);
      }
      UserAction::Delete { id } => {
        self.users.delete(id).await?;
      }
    }
    Ok(())
  }

  async fn work_items(&self, action: WorkItemAction) -> Result<(), ApiError> {
    match action {
      WorkItemAction::List {
        customer_id,
        assigned_to,
        status_id,
      } => {
        let items = self
          .work
          .work_items(WorkItemFilters {
            customer_id,
            assigned_to,
            status_id,
          })
          .await?;
        print_work_items(&items);
      }
      WorkItemAction::Show { id } => {
        let item = self.work.work_item(id).await?;
        print_work_items(std::slice::from_ref(&item));
        // The task sub-list failing should not blank the item itself.
        let tasks = ViewData::from_result(self.work.tasks_for_work_item(id).await);
        if !tasks.items.is_empty() {
          println!();
          print_tasks(&tasks.items);
        }
        if let Some(error) = tasks.error {
          eprintln!("error: {error}");
        }
      }
      WorkItemAction::Create {
        title,
        description,
        customer_id,
        assigned_to,
        status_id,
      } => {
        let item = self
          .work
          .create_work_item(CreateWorkItem {
            title,
            description,
            customer_id,
            assigned_to,
            status_id,
          })
          .await?;
        println!("Created work item #{}", item.id);
      }
      WorkItemAction::Update {
        id,
        title,
        description,
        assigned_to,
        status_id,
      } => {
        let item = self
          .work
          .update_work_item(
            id,
            UpdateWorkItem {
              title,
              description,
              assigned_to,
              status_id,
              ..UpdateWorkItem::default()
            },
          )
          .await?;
        println!("Updated work item #{}", item.id);
      }
      WorkItemAction::Delete { id } => {
        self.work.delete_work_item(id).await?;
      }
    }
    Ok(())
  }

  async fn tasks(&self, action: TaskAction) -> Result<(), ApiError> {
    match action {
      TaskAction::List {
        customer_id,
        work_item_id,
        assigned_to,
        status_id,
      } => {
        let tasks = self
          .work
          .tasks(TaskFilters {
            customer_id,
            work_item_id,
            assigned_to,
            status_id,
          })
          .await?;
        print_tasks(&tasks);
      }
      TaskAction::Create {
        title,
        description,
        work_item_id,
        customer_id,
        assigned_to,
        status_id,
      } => {
        let task = self
          .work
          .create_task(CreateTask {
            title,
            description,
            work_item_id,
            customer_id,
            assigned_to,
            status_id,
          })
          .await?;
        println!("Created task #{}", task.id);
      }
      TaskAction::Update {
        id,
        title,
        description,
        work_item_id,
        assigned_to,
        status_id,
      } => {
        let task = self
          .work
          .update_task(
            id,
            UpdateTask {
              title,
              description,
              work_item_id,
              assigned_to,
              status_id,
              ..UpdateTask::default()
            },
          )
          .await?;
        println!("Updated task #{}", task.id);
      }
      TaskAction::Delete { id, work_item_id } => {
        self.work.delete_task(id, work_item_id).await?;
      }
    }
    Ok(())
  }

  async fn comms(&self, action: CommAction) -> Result<(), ApiError> {
    match action {
      CommAction::List {
        lead_id,
        created_by,
      } => {
        let comms = self
          .comms
          .communications(CommunicationFilters {
            lead_id,
            created_by,
          })
          .await?;
        print_comms(&comms);
      }
      CommAction::Add { lead_id, message } => {
        let comm = self
          .comms
          .create(CreateCommunication { lead_id, message })
          .await?;
        println!("Logged communication #{}", comm.id);
      }
      CommAction::Update {
        id,
        lead_id,
        message,
      } => {
        self
          .comms
          .update(
            id,
            lead_id,
            UpdateCommunication {
              message: Some(message),
              ..UpdateCommunication::default()
            },
          )
          .await?;
      }
      CommAction::Delete { id, lead_id } => {
        self.comms.delete(id, lead_id).await?;
      }
    }
    Ok(())
  }

  async fn dashboard(&self) -> Result<(), ApiError> {
    let stats = self.dashboard.stats().await?;

    println!("== {} ==", self.title);
    println!("Leads by status");
    for point in &stats.leads_by_status {
      println!("  {:<20} {}", point.name, point.count);
    }
    println!("Conversion ratio: {}%", stats.conversion_ratio);
    println!(
      "Average tasks per work item: {}",
      stats.average_tasks_per_work_item
    );
    println!(
      "Average task turnaround: {}h",
      stats.average_task_turnaround_hours
    );

    println!("Task turnaround");
    for bucket in &stats.turnaround_buckets {
      println!("  {:<8} {}", bucket.name, bucket.count);
    }
    println!("Tasks by status");
    for point in &stats.tasks_by_status {
      println!("  {:<20} {}", point.name, point.count);
    }
    if !stats.conversion_series.is_empty() {
      println!("Conversions by day");
      for point in &stats.conversion_series {
        println!("  {} {}", point.date, point.converted);
      }
    }
    Ok(())
  }

  /// Print every queued mutation notice to stderr, successes and failures
  /// alike, so tables on stdout stay machine-readable.
  fn drain_notices(&mut self) {
    while let Ok(notice) = self.notices.try_recv() {
      match notice {
        Notice::Success(message) => eprintln!("ok: {message}"),
        Notice::Error(message) => eprintln!("error: {message}"),
      }
    }
  }
}

/// Screen header: the configured title, else the API host.
fn output_title(config: &Config) -> String {
  if let Some(title) = &config.title {
    return title.clone();
  }
  Url::parse(&config.api.url)
    .ok()
    .and_then(|u| u.host_str().map(str::to_string))
    .unwrap_or_else(|| "CRM".to_string())
}

fn create_lead_payload(fields: LeadFields) -> CreateLead {
  CreateLead {
    name: fields.name,
    email: fields.email,
    phone: fields.phone,
    status_id: fields.status_id,
    source_id: fields.source_id,
    assigned_to: fields.assigned_to,
    notes: fields.notes,
    is_converted: None,
  }
}

fn update_lead_payload(fields: LeadUpdateFields) -> UpdateLead {
  UpdateLead {
    name: fields.name,
    email: fields.email,
    phone: fields.phone,
    status_id: fields.status_id,
    source_id: fields.source_id,
    assigned_to: fields.assigned_to,
    notes: fields.notes,
    is_converted: None,
  }
}

fn print_leads(leads: &[Lead]) {
  println!(
    "{:<6} {:<25} {:<25} {:<15} {:<10}",
    "ID", "NAME", "EMAIL", "STATUS", "CONVERTED"
  );
  for lead in leads {
    let status = lead
      .status
      .as_ref()
      .map(|s| s.name.as_str())
      .unwrap_or("-");
    println!(
      "{:<6} {:<25} {:<25} {:<15} {:<10}",
      lead.id,
      lead.name,
      lead.email.as_deref().unwrap_or("-"),
      status,
      if lead.is_converted { "yes" } else { "no" }
    );
  }
}

fn print_lead_detail(lead: &Lead) {
  println!("Lead #{}: {}", lead.id, lead.name);
  println!("  email:    {}", lead.email.as_deref().unwrap_or("-"));
  println!("  phone:    {}", lead.phone.as_deref().unwrap_or("-"));
  let status = lead.status.as_ref().map(|s| s.name.as_str()).unwrap_or("-");
  println!("  status:   {}", status);
  let source = lead.source.as_ref().map(|s| s.name.as_str()).unwrap_or("-");
  println!("  source:   {}", source);
  let assignee = lead
    .assigned_user
    .as_ref()
    .map(|u| u.name.as_str())
    .unwrap_or("-");
  println!("  assignee: {}", assignee);
  println!("  converted: {}", lead.is_converted);
  if let Some(notes) = &lead.notes {
    println!("  notes:    {}", notes);
  }
}

fn print_users(users: &[User]) {
  println!("{:<6} {:<25} {:<25} {:<15}", "ID", "NAME", "EMAIL", "ROLE");
  for user in users {
    println!(
      "{:<6} {:<25} {:<25} {:<15}",
      user.id,
      user.name,
      user.email.as_deref().unwrap_or("-"),
      user.role.name
    );
  }
}

fn print_work_items(items: &[WorkItem]) {
  println!(
    "{:<6} {:<30} {:<10} {:<15} {:<15}",
    "ID", "TITLE", "CUSTOMER", "STATUS", "ASSIGNEE"
  );
  for item in items {
    let status = item.status.as_ref().map(|s| s.name.as_str()).unwrap_or("-");
    let assignee = item
      .assigned_user
      .as_ref()
      .map(|u| u.name.as_str())
      .unwrap_or("-");
    println!(
      "{:<6} {:<30} {:<10} {:<15} {:<15}",
      item.id, item.title, item.customer_id, status, assignee
    );
  }
}

fn print_tasks(tasks: &[Task]) {
  println!(
    "{:<6} {:<30} {:<10} {:<15} {:<15}",
    "ID", "TITLE", "WORK ITEM", "STATUS", "ASSIGNEE"
  );
  for task in tasks {
    let status = task.status.as_ref().map(|s| s.name.as_str()).unwrap_or("-");
    let assignee = task
      .assigned_user
      .as_ref()
      .map(|u| u.name.as_str())
      .unwrap_or("-");
    println!(
      "{:<6} {:<30} {:<10} {:<15} {:<15}",
      task.id, task.title, task.work_item_id, status, assignee
    );
  }
}

fn print_comms(comms: &[Communication]) {
  println!("{:<6} {:<6} {:<20} MESSAGE", "ID", "LEAD", "WHEN");
  for comm in comms {
    println!(
      "{:<6} {:<6} {:<20} {}",
      comm.id,
      comm.lead_id,
      comm.created_at.format("%Y-%m-%d %H:%M"),
      comm.message
    );
  }
}
