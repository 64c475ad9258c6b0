//! Scripted [`AdminGateway`] double shared by the unit tests.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use serde_json::json;
use shared::{
    domain::{
        AccountType, AdminId, Booking, KycDocument, Transaction, User, UserId, Vehicle, VehicleId,
    },
    protocol::{
        Ack, ApiKeys, BioUpdate, DashboardStats, LicenceDecision, ListPage, NewStaff, Pagination,
        PasswordReset, TicketReply, VehicleUpdate,
    },
};
use tokio::sync::oneshot;

use crate::{error::GatewayError, gateway::AdminGateway};

pub(crate) type Reply<T> = Result<T, GatewayError>;

pub(crate) fn rejected(message: &str) -> GatewayError {
    GatewayError::Rejected {
        message: message.to_string(),
    }
}

enum Step<T> {
    Ready(Reply<T>),
    Held(oneshot::Receiver<Reply<T>>),
}

/// Queue of answers for one gateway method. When the queue runs dry the
/// fallback answers, or the call is rejected as unscripted.
pub(crate) struct Script<T> {
    steps: Mutex<VecDeque<Step<T>>>,
    fallback: Mutex<Option<Result<T, String>>>,
    calls: AtomicUsize,
}

impl<T: Clone> Script<T> {
    fn new() -> Self {
        Self {
            steps: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn push_ok(&self, value: T) {
        self.steps.lock().unwrap().push_back(Step::Ready(Ok(value)));
    }

    pub(crate) fn push_err(&self, err: GatewayError) {
        self.steps.lock().unwrap().push_back(Step::Ready(Err(err)));
    }

    /// Queues an answer the test releases later through the returned sender.
    pub(crate) fn hold(&self) -> oneshot::Sender<Reply<T>> {
        let (tx, rx) = oneshot::channel();
        self.steps.lock().unwrap().push_back(Step::Held(rx));
        tx
    }

    pub(crate) fn always_ok(&self, value: T) {
        *self.fallback.lock().unwrap() = Some(Ok(value));
    }

    pub(crate) fn always_reject(&self, message: &str) {
        *self.fallback.lock().unwrap() = Some(Err(message.to_string()));
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn next(&self) -> Reply<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Ready(reply)) => reply,
            Some(Step::Held(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(rejected("held reply dropped"))),
            None => match self.fallback.lock().unwrap().clone() {
                Some(Ok(value)) => Ok(value),
                Some(Err(message)) => Err(rejected(&message)),
                None => Err(rejected("not scripted")),
            },
        }
    }
}

pub(crate) struct ScriptedGateway {
    pub(crate) login: Script<AdminId>,
    pub(crate) stats: Script<DashboardStats>,
    pub(crate) riders: Script<ListPage<User>>,
    pub(crate) bookings: Script<ListPage<Booking>>,
    pub(crate) mutations: Script<Ack>,
    /// One line per call: method name plus the arguments that matter.
    pub(crate) log: Mutex<Vec<String>>,
}

impl ScriptedGateway {
    pub(crate) fn new() -> Self {
        Self {
            login: Script::new(),
            stats: Script::new(),
            riders: Script::new(),
            bookings: Script::new(),
            mutations: Script::new(),
            log: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn record(&self, line: String) {
        self.log.lock().unwrap().push(line);
    }
}

pub(crate) fn rider(id: i64, name: &str) -> User {
    serde_json::from_value(json!({
        "id": id,
        "name": name,
        "email": format!("{}@example.com", name.to_lowercase()),
        "verified": 1,
        "account_balance": 0
    }))
    .unwrap()
}

pub(crate) fn booking(id: i64, status: &str) -> Booking {
    serde_json::from_value(json!({
        "id": id,
        "booking_code": format!("BK-{id}"),
        "place": "Airport",
        "destination_place": "Harbour",
        "status": status
    }))
    .unwrap()
}

pub(crate) fn page_of<T>(items: Vec<T>, current_page: u32, total_pages: u32) -> ListPage<T> {
    let total_items = items.len() as u64 * u64::from(total_pages);
    ListPage {
        items,
        pagination: Some(Pagination {
            current_page,
            total_pages,
            total_items,
        }),
    }
}

pub(crate) fn stats_with_users(users: u64) -> DashboardStats {
    DashboardStats {
        users,
        ..DashboardStats::default()
    }
}

/// Yields until `condition` holds; the scripted gateway answers synchronously
/// so a few scheduler turns are always enough.
pub(crate) async fn settle(mut condition: impl FnMut() -> bool) {
    for _ in 0..1_000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition never became true");
}

#[async_trait]
impl AdminGateway for ScriptedGateway {
    async fn login(&self, email: &str, _password: &str) -> Result<AdminId, GatewayError> {
        self.record(format!("login {email}"));
        self.login.next().await
    }

    async fn dashboard_stats(&self, admin_id: AdminId) -> Result<DashboardStats, GatewayError> {
        self.record(format!("stats {admin_id}"));
        self.stats.next().await
    }

    async fn riders(&self, page: u32) -> Result<ListPage<User>, GatewayError> {
        self.record(format!("riders page={page}"));
        self.riders.next().await
    }

    async fn drivers(&self, page: u32) -> Result<ListPage<User>, GatewayError> {
        self.record(format!("drivers page={page}"));
        Err(rejected("not scripted"))
    }

    async fn bookings(&self, page: u32, filter: &str) -> Result<ListPage<Booking>, GatewayError> {
        self.record(format!("bookings page={page} filter={filter}"));
        self.bookings.next().await
    }

    async fn transactions(&self, page: u32) -> Result<ListPage<Transaction>, GatewayError> {
        self.record(format!("transactions page={page}"));
        Err(rejected("not scripted"))
    }

    async fn kyc_requests(&self) -> Result<Vec<KycDocument>, GatewayError> {
        self.record("kyc".to_string());
        Err(rejected("not scripted"))
    }

    async fn vehicle_info(&self, vin: &str) -> Result<Vehicle, GatewayError> {
        self.record(format!("vehicle_info {vin}"));
        Err(rejected("not scripted"))
    }

    async fn delete_account(
        &self,
        id: UserId,
        account_type: AccountType,
    ) -> Result<Ack, GatewayError> {
        self.record(format!("delete_account {id} {}", account_type.as_str()));
        self.mutations.next().await
    }

    async fn update_vehicle(&self, update: &VehicleUpdate) -> Result<Ack, GatewayError> {
        self.record(format!("update_vehicle {}", update.id));
        self.mutations.next().await
    }

    async fn delete_vehicle(&self, id: VehicleId) -> Result<Ack, GatewayError> {
        self.record(format!("delete_vehicle {id}"));
        self.mutations.next().await
    }

    async fn approve_licence(&self, decision: &LicenceDecision) -> Result<Ack, GatewayError> {
        self.record(format!("approve_licence {}", decision.id));
        self.mutations.next().await
    }

    async fn reject_licence(&self, decision: &LicenceDecision) -> Result<Ack, GatewayError> {
        self.record(format!("reject_licence {}", decision.id));
        self.mutations.next().await
    }

    async fn broadcast_message(&self, message: &str) -> Result<Ack, GatewayError> {
        self.record(format!("broadcast {message}"));
        self.mutations.next().await
    }

    async fn reply_ticket(&self, reply: &TicketReply) -> Result<Ack, GatewayError> {
        self.record(format!("reply_ticket {}", reply.id));
        self.mutations.next().await
    }

    async fn add_staff(&self, staff: &NewStaff) -> Result<Ack, GatewayError> {
        self.record(format!("add_staff {}", staff.email));
        self.mutations.next().await
    }

    async fn update_api_keys(&self, _keys: &ApiKeys) -> Result<Ack, GatewayError> {
        self.record("update_api_keys".to_string());
        self.mutations.next().await
    }

    async fn update_bio(&self, bio: &BioUpdate) -> Result<Ack, GatewayError> {
        self.record(format!("update_bio {}", bio.email));
        self.mutations.next().await
    }

    async fn send_otp(&self, email: &str) -> Result<Ack, GatewayError> {
        self.record(format!("send_otp {email}"));
        self.mutations.next().await
    }

    async fn reset_password(&self, reset: &PasswordReset) -> Result<Ack, GatewayError> {
        self.record(format!("reset_password {}", reset.email));
        self.mutations.next().await
    }
}
