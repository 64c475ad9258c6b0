use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use client_core::{
    AdminClient, AdminEvent, FetchOutcome, HttpGateway, ListController, ListResource, Session,
    SessionStore, StatsSnapshot,
};
use serde::Serialize;
use shared::{
    domain::{AccountType, KycId, TicketId, UserId, VehicleId},
    protocol::{
        ApiKeys, BioUpdate, LicenceDecision, NewStaff, PasswordReset, TicketReply, VehicleUpdate,
    },
};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod config;
mod render;

use config::{load_settings, Settings};

#[derive(Parser, Debug)]
#[command(name = "rideadmin", about = "Ride-share operations console")]
struct Cli {
    /// Settings file (defaults to ./rideadmin.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[arg(long, global = true)]
    session_file: Option<PathBuf>,
    /// Print raw JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    /// One-off dashboard summary.
    Stats,
    /// Keep the dashboard summary on screen, refreshing on the poll interval.
    Watch {
        #[arg(long)]
        interval_secs: Option<u64>,
    },
    Riders(PageArgs),
    Drivers(PageArgs),
    Bookings {
        #[command(flatten)]
        page: PageArgs,
        /// Booking status to list.
        #[arg(long)]
        filter: Option<String>,
    },
    Transactions(PageArgs),
    DeleteAccount {
        #[arg(long)]
        id: i64,
        #[arg(long = "type", value_enum, default_value_t = AccountArg::Passenger)]
        account_type: AccountArg,
    },
    #[command(subcommand)]
    Vehicle(VehicleCommand),
    #[command(subcommand)]
    Kyc(KycCommand),
    Broadcast {
        #[arg(long)]
        message: String,
    },
    /// Open support tickets from the dashboard summary.
    Tickets,
    ReplyTicket {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        message: String,
    },
    #[command(subcommand)]
    Staff(StaffCommand),
    #[command(subcommand)]
    Settings(SettingsCommand),
    #[command(subcommand)]
    Password(PasswordCommand),
}

#[derive(Args, Debug)]
struct PageArgs {
    #[arg(long, default_value_t = 1)]
    page: u32,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum AccountArg {
    Passenger,
    Driver,
}

impl From<AccountArg> for AccountType {
    fn from(value: AccountArg) -> Self {
        match value {
            AccountArg::Passenger => AccountType::Passenger,
            AccountArg::Driver => AccountType::Driver,
        }
    }
}

#[derive(Subcommand, Debug)]
enum VehicleCommand {
    /// Vehicles from the dashboard summary.
    List,
    Update {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        number: Option<String>,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        seats: Option<u32>,
    },
    Delete {
        #[arg(long)]
        id: i64,
    },
    Info {
        #[arg(long)]
        vin: String,
    },
}

#[derive(Subcommand, Debug)]
enum KycCommand {
    List,
    Approve {
        #[arg(long)]
        id: i64,
    },
    Reject {
        #[arg(long)]
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
enum StaffCommand {
    List,
    Add {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "admin")]
        role: String,
        #[arg(long, default_value = "")]
        country: String,
        #[arg(long, default_value = "")]
        phone: String,
    },
}

#[derive(Subcommand, Debug)]
enum SettingsCommand {
    ApiKeys {
        #[arg(long)]
        secret_key: String,
        #[arg(long)]
        publishable_key: String,
    },
    Bio {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
    },
}

#[derive(Subcommand, Debug)]
enum PasswordCommand {
    SendOtp {
        #[arg(long)]
        email: String,
    },
    Reset {
        #[arg(long)]
        email: String,
        #[arg(long)]
        otp: String,
        #[arg(long)]
        password: String,
    },
}

struct Console {
    client: AdminClient,
    sessions: SessionStore,
    settings: Settings,
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut settings = load_settings(cli.config.as_deref())?;
    settings.apply_overrides(cli.api_url.clone(), cli.session_file.clone());
    debug!(api = %settings.api_base_url, session = %settings.session_file.display(), "config: loaded");

    let gateway = HttpGateway::with_timeout(&settings.api_base_url, settings.request_timeout())?;
    let client = AdminClient::new(Arc::new(gateway));
    let mut events = client.subscribe_events();
    let console = Console {
        sessions: SessionStore::new(&settings.session_file),
        client,
        settings,
        json: cli.json,
    };

    let result = console.run(cli.command, &mut events).await;
    print_pending_notices(&mut events);
    result
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_pending_notices(events: &mut broadcast::Receiver<AdminEvent>) {
    loop {
        match events.try_recv() {
            Ok(event) => print_event(&event),
            Err(TryRecvError::Lagged(skipped)) => debug!(skipped, "console: notices dropped"),
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}

fn print_event(event: &AdminEvent) {
    match event {
        AdminEvent::Notice(notice) => eprintln!("{}", render::notice(notice)),
        AdminEvent::ListLoaded { resource, page, .. } => {
            debug!(resource, page = page.current_page, "console: list loaded");
        }
        AdminEvent::StatsRefreshed { fetched_at } => {
            debug!(%fetched_at, "console: stats refreshed");
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

impl Console {
    async fn run(
        &self,
        command: Command,
        events: &mut broadcast::Receiver<AdminEvent>,
    ) -> Result<()> {
        match command {
            Command::Login { email, password } => self.login(&email, &password).await,
            Command::Logout => {
                if self.sessions.clear()? {
                    println!("Signed out.");
                } else {
                    println!("No active session.");
                }
                Ok(())
            }
            Command::Stats => {
                let snapshot = self.fetch_stats().await?;
                self.show_stats(&snapshot)
            }
            Command::Watch { interval_secs } => self.watch(interval_secs, events).await,
            Command::Riders(args) => {
                self.session()?;
                self.show_list(self.client.riders(), args.page, None, render::user_row)
                    .await
            }
            Command::Drivers(args) => {
                self.session()?;
                self.show_list(self.client.drivers(), args.page, None, render::user_row)
                    .await
            }
            Command::Bookings { page, filter } => {
                self.session()?;
                self.show_list(self.client.bookings(), page.page, filter, render::booking_row)
                    .await
            }
            Command::Transactions(args) => {
                self.session()?;
                self.show_list(
                    self.client.transactions(),
                    args.page,
                    None,
                    render::transaction_row,
                )
                .await
            }
            Command::DeleteAccount { id, account_type } => {
                self.session()?;
                self.client
                    .delete_account(UserId(id), account_type.into())
                    .await?;
                Ok(())
            }
            Command::Vehicle(command) => self.vehicle(command).await,
            Command::Kyc(command) => self.kyc(command).await,
            Command::Broadcast { message } => {
                self.session()?;
                self.client.broadcast_message(&message).await?;
                Ok(())
            }
            Command::Tickets => {
                let snapshot = self.fetch_stats().await?;
                let reports = &snapshot.stats.reports;
                if self.json {
                    return print_json(reports);
                }
                if reports.is_empty() {
                    println!("No open tickets.");
                }
                for ticket in reports {
                    println!("{}", render::ticket_row(ticket));
                }
                Ok(())
            }
            Command::ReplyTicket { id, message } => {
                let snapshot = self.fetch_stats().await?;
                let Some(ticket) = snapshot.stats.find_ticket(TicketId(id)) else {
                    bail!("ticket #{id} is not among the open reports");
                };
                self.client
                    .reply_ticket(&TicketReply::to_ticket(ticket, message))
                    .await?;
                Ok(())
            }
            Command::Staff(StaffCommand::List) => {
                let snapshot = self.fetch_stats().await?;
                let stats = &snapshot.stats;
                if self.json {
                    return print_json(&stats.admins);
                }
                let current = stats.account.as_ref().map(|account| account.id);
                for admin in &stats.admins {
                    println!("{}", render::admin_row(admin, current == Some(admin.id)));
                }
                Ok(())
            }
            Command::Staff(StaffCommand::Add {
                first_name,
                last_name,
                email,
                password,
                role,
                country,
                phone,
            }) => {
                self.session()?;
                self.client
                    .add_staff(&NewStaff {
                        first_name,
                        last_name,
                        email,
                        password,
                        role,
                        country,
                        phone,
                    })
                    .await?;
                Ok(())
            }
            Command::Settings(command) => {
                self.session()?;
                match command {
                    SettingsCommand::ApiKeys {
                        secret_key,
                        publishable_key,
                    } => {
                        self.client
                            .update_api_keys(&ApiKeys {
                                stripe_secret_key: secret_key,
                                stripe_publishable_api_key: publishable_key,
                            })
                            .await?;
                    }
                    SettingsCommand::Bio { name, email, phone } => {
                        self.client
                            .update_bio(&BioUpdate { name, email, phone })
                            .await?;
                    }
                }
                Ok(())
            }
            Command::Password(PasswordCommand::SendOtp { email }) => {
                self.client.send_otp(&email).await?;
                Ok(())
            }
            Command::Password(PasswordCommand::Reset {
                email,
                otp,
                password,
            }) => {
                self.client
                    .reset_password(&PasswordReset {
                        email,
                        otp,
                        password,
                    })
                    .await?;
                Ok(())
            }
        }
    }

    fn session(&self) -> Result<Session> {
        self.sessions
            .require()
            .context("run `rideadmin login` first")
    }

    async fn login(&self, email: &str, password: &str) -> Result<()> {
        let admin_id = self.client.sign_in(email, password).await?;
        let session = Session::new(admin_id, email.trim());
        self.sessions
            .save(&session)
            .with_context(|| format!("failed to persist session for {email}"))?;
        if self.json {
            print_json(&session)
        } else {
            println!("Signed in as admin #{admin_id}.");
            Ok(())
        }
    }

    async fn fetch_stats(&self) -> Result<Arc<StatsSnapshot>> {
        let session = self.session()?;
        let poller = self
            .client
            .stats_poller(session.admin_id, self.settings.poll_interval());
        match poller.refresh().await {
            FetchOutcome::Applied => {}
            FetchOutcome::Failed { reason } => bail!(reason),
            other => bail!("dashboard summary was not applied: {other:?}"),
        }
        poller
            .handle()
            .snapshot()
            .context("dashboard summary missing after refresh")
    }

    fn show_stats(&self, snapshot: &StatsSnapshot) -> Result<()> {
        if self.json {
            return print_json(snapshot);
        }
        for line in render::stats(snapshot) {
            println!("{line}");
        }
        Ok(())
    }

    async fn watch(
        &self,
        interval_secs: Option<u64>,
        events: &mut broadcast::Receiver<AdminEvent>,
    ) -> Result<()> {
        let session = self.session()?;
        let interval = interval_secs
            .filter(|secs| *secs > 0)
            .map(std::time::Duration::from_secs)
            .unwrap_or_else(|| self.settings.poll_interval());
        let poller = self.client.stats_poller(session.admin_id, interval);
        let mut handle = poller.handle();
        poller.activate();
        info!(interval_secs = interval.as_secs(), "console: watching dashboard, ctrl-c to stop");

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                _ = handle.changed() => {
                    let state = handle.current();
                    if state.is_loading() {
                        continue;
                    }
                    if let Some(snapshot) = state.data() {
                        self.show_stats(snapshot)?;
                    }
                    if let Some(reason) = state.error() {
                        debug!(reason, "console: showing last good summary");
                    }
                    if !self.json {
                        println!();
                    }
                }
                event = events.recv() => {
                    if let Ok(event) = event {
                        print_event(&event);
                    }
                }
            }
        }

        poller.deactivate();
        Ok(())
    }

    async fn show_list<R, F>(
        &self,
        controller: ListController<R>,
        page: u32,
        filter: Option<String>,
        row: F,
    ) -> Result<()>
    where
        R: ListResource,
        R::Item: Serialize,
        F: Fn(&R::Item) -> String,
    {
        if let FetchOutcome::Failed { reason } = controller.fetch_page(page, filter).await {
            bail!(reason);
        }
        let view = controller.view().await;
        let Some(data) = view.data() else {
            bail!("no {} loaded", R::NAME);
        };

        if self.json {
            return print_json(&**data);
        }
        if data.items.is_empty() {
            println!("No {} found.", R::NAME);
        }
        for item in &data.items {
            println!("{}", row(item));
        }
        println!("{}", render::page_line(&data.page, self.settings.page_window));
        Ok(())
    }

    async fn vehicle(&self, command: VehicleCommand) -> Result<()> {
        self.session()?;
        match command {
            VehicleCommand::List => {
                let snapshot = self.fetch_stats().await?;
                let vehicles = &snapshot.stats.vehicles;
                if self.json {
                    return print_json(vehicles);
                }
                if vehicles.is_empty() {
                    println!("No vehicles uploaded.");
                }
                for vehicle in vehicles {
                    println!("{}", render::vehicle(vehicle));
                }
            }
            VehicleCommand::Update {
                id,
                name,
                number,
                model,
                color,
                seats,
            } => {
                self.client
                    .update_vehicle(&VehicleUpdate {
                        id: VehicleId(id),
                        car_name: name,
                        car_number: number,
                        car_model: model,
                        car_color: color,
                        seats,
                    })
                    .await?;
            }
            VehicleCommand::Delete { id } => {
                self.client.delete_vehicle(VehicleId(id)).await?;
            }
            VehicleCommand::Info { vin } => {
                let vehicle = self.client.vehicle_info(&vin).await?;
                if self.json {
                    print_json(&vehicle)?;
                } else {
                    println!("{}", render::vehicle(&vehicle));
                }
            }
        }
        Ok(())
    }

    async fn kyc(&self, command: KycCommand) -> Result<()> {
        self.session()?;
        let requests = self.client.kyc_requests().await?;
        match command {
            KycCommand::List => {
                if self.json {
                    return print_json(&requests);
                }
                if requests.is_empty() {
                    println!("No pending KYC requests.");
                }
                for doc in &requests {
                    println!("{}", render::kyc_row(doc));
                    for url in doc.files.documents() {
                        println!("        {url}");
                    }
                }
            }
            KycCommand::Approve { id } | KycCommand::Reject { id } => {
                let approve = matches!(command, KycCommand::Approve { .. });
                let Some(doc) = requests.iter().find(|doc| doc.id == KycId(id)) else {
                    bail!("KYC request #{id} is not pending");
                };
                let decision = LicenceDecision::from(doc);
                if approve {
                    self.client.approve_licence(&decision).await?;
                } else {
                    self.client.reject_licence(&decision).await?;
                }
            }
        }
        Ok(())
    }
}
