use std::{future::Future, sync::Arc, time::Duration};

use shared::{
    domain::{AccountType, AdminId, KycDocument, UserId, Vehicle, VehicleId},
    protocol::{
        Ack, ApiKeys, BioUpdate, LicenceDecision, NewStaff, PasswordReset, TicketReply,
        VehicleUpdate,
    },
};
use tokio::sync::broadcast;
use tracing::{info, warn};

pub mod error;
pub mod events;
pub mod fetch_status;
pub mod gateway;
pub mod list_controller;
pub mod paginator;
pub mod session;
pub mod stats_poller;

pub use error::{GatewayError, SessionError};
pub use events::{AdminEvent, Notice, NoticeLevel};
pub use fetch_status::{FetchOutcome, FetchStatus};
pub use gateway::{AdminGateway, HttpGateway};
pub use list_controller::{
    Bookings, Drivers, ListController, ListData, ListResource, ListView, Riders, Transactions,
};
pub use paginator::{compute_window, PageState, DEFAULT_WINDOW_SIZE};
pub use session::{Session, SessionStore};
pub use stats_poller::{
    StatsHandle, StatsPoller, StatsSnapshot, StatsState, DEFAULT_POLL_INTERVAL,
};

const EVENT_CAPACITY: usize = 256;

/// Entry point for the admin console.
///
/// Owns the gateway and the notice bus, hands out list controllers and the
/// stats poller, and runs every mutating call so that it reports a success or
/// failure notice.
pub struct AdminClient {
    gateway: Arc<dyn AdminGateway>,
    events: broadcast::Sender<AdminEvent>,
}

impl AdminClient {
    pub fn new(gateway: Arc<dyn AdminGateway>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { gateway, events }
    }

    pub fn gateway(&self) -> Arc<dyn AdminGateway> {
        Arc::clone(&self.gateway)
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<AdminEvent> {
        self.events.subscribe()
    }

    pub fn list<R: ListResource>(&self) -> ListController<R> {
        ListController::new(self.gateway(), self.events.clone())
    }

    pub fn riders(&self) -> ListController<Riders> {
        self.list()
    }

    pub fn drivers(&self) -> ListController<Drivers> {
        self.list()
    }

    pub fn bookings(&self) -> ListController<Bookings> {
        self.list()
    }

    pub fn transactions(&self) -> ListController<Transactions> {
        self.list()
    }

    pub fn stats_poller(&self, admin_id: AdminId, interval: Duration) -> StatsPoller {
        StatsPoller::new(self.gateway(), admin_id, self.events.clone(), interval)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AdminId, GatewayError> {
        self.validated(
            require_text("email", email).and_then(|()| require_text("password", password)),
        )?;
        match self.gateway.login(email.trim(), password).await {
            Ok(admin_id) => {
                info!(admin_id = admin_id.0, "auth: signed in");
                self.notify(Notice::success("Login successful", "Welcome back"));
                Ok(admin_id)
            }
            Err(err) => {
                warn!("auth: sign-in failed: {err}");
                self.notify(Notice::failure("Login failed", &err));
                Err(err)
            }
        }
    }

    pub async fn kyc_requests(&self) -> Result<Vec<KycDocument>, GatewayError> {
        let result = self.gateway.kyc_requests().await;
        if let Err(err) = &result {
            self.notify(Notice::failure("Failed to load KYC requests", err));
        }
        result
    }

    pub async fn vehicle_info(&self, vin: &str) -> Result<Vehicle, GatewayError> {
        self.validated(require_text("vin", vin))?;
        let result = self.gateway.vehicle_info(vin.trim()).await;
        if let Err(err) = &result {
            self.notify(Notice::failure("Failed to look up vehicle", err));
        }
        result
    }

    pub async fn delete_account(
        &self,
        id: UserId,
        account_type: AccountType,
    ) -> Result<Ack, GatewayError> {
        self.mutate(
            "Account deleted",
            "Failed to delete account",
            self.gateway.delete_account(id, account_type),
        )
        .await
    }

    pub async fn update_vehicle(&self, update: &VehicleUpdate) -> Result<Ack, GatewayError> {
        self.mutate(
            "Vehicle updated",
            "Failed to update vehicle",
            self.gateway.update_vehicle(update),
        )
        .await
    }

    pub async fn delete_vehicle(&self, id: VehicleId) -> Result<Ack, GatewayError> {
        self.mutate(
            "Vehicle deleted",
            "Failed to delete vehicle",
            self.gateway.delete_vehicle(id),
        )
        .await
    }

    pub async fn approve_licence(&self, decision: &LicenceDecision) -> Result<Ack, GatewayError> {
        self.mutate(
            "Approved",
            "Failed to approve KYC",
            self.gateway.approve_licence(decision),
        )
        .await
    }

    pub async fn reject_licence(&self, decision: &LicenceDecision) -> Result<Ack, GatewayError> {
        self.mutate(
            "Rejected",
            "Failed to reject KYC",
            self.gateway.reject_licence(decision),
        )
        .await
    }

    pub async fn broadcast_message(&self, message: &str) -> Result<Ack, GatewayError> {
        self.validated(require_text("message", message))?;
        self.mutate(
            "Message sent",
            "Failed to broadcast message",
            self.gateway.broadcast_message(message.trim()),
        )
        .await
    }

    pub async fn reply_ticket(&self, reply: &TicketReply) -> Result<Ack, GatewayError> {
        self.validated(require_text("message", &reply.message))?;
        self.mutate(
            "Reply sent",
            "Failed to send reply",
            self.gateway.reply_ticket(reply),
        )
        .await
    }

    pub async fn add_staff(&self, staff: &NewStaff) -> Result<Ack, GatewayError> {
        self.validated(
            require_text("email", &staff.email)
                .and_then(|()| require_text("password", &staff.password)),
        )?;
        self.mutate(
            "Staff added",
            "Failed to add staff",
            self.gateway.add_staff(staff),
        )
        .await
    }

    pub async fn update_api_keys(&self, keys: &ApiKeys) -> Result<Ack, GatewayError> {
        self.mutate(
            "API keys updated",
            "Failed to update API keys",
            self.gateway.update_api_keys(keys),
        )
        .await
    }

    pub async fn update_bio(&self, bio: &BioUpdate) -> Result<Ack, GatewayError> {
        self.mutate(
            "Profile updated",
            "Failed to update profile",
            self.gateway.update_bio(bio),
        )
        .await
    }

    pub async fn send_otp(&self, email: &str) -> Result<Ack, GatewayError> {
        self.validated(require_text("email", email))?;
        self.mutate(
            "OTP sent",
            "Failed to send OTP",
            self.gateway.send_otp(email.trim()),
        )
        .await
    }

    pub async fn reset_password(&self, reset: &PasswordReset) -> Result<Ack, GatewayError> {
        self.validated(
            require_text("otp", &reset.otp)
                .and_then(|()| require_text("password", &reset.password)),
        )?;
        self.mutate(
            "Password reset",
            "Failed to reset password",
            self.gateway.reset_password(reset),
        )
        .await
    }

    fn notify(&self, notice: Notice) {
        let _ = self.events.send(AdminEvent::Notice(notice));
    }

    fn validated(&self, check: Result<(), GatewayError>) -> Result<(), GatewayError> {
        if let Err(err) = &check {
            self.notify(Notice::failure("Please fix the form", err));
        }
        check
    }

    async fn mutate<F>(
        &self,
        success_title: &'static str,
        failure_description: &'static str,
        call: F,
    ) -> Result<Ack, GatewayError>
    where
        F: Future<Output = Result<Ack, GatewayError>>,
    {
        match call.await {
            Ok(ack) => {
                info!(action = success_title, "mutation: succeeded");
                let description = if ack.message.trim().is_empty() {
                    success_title.to_string()
                } else {
                    ack.message.clone()
                };
                self.notify(Notice::success(success_title, description));
                Ok(ack)
            }
            Err(err) => {
                warn!(action = failure_description, "mutation: failed: {err}");
                self.notify(Notice::failure(failure_description, &err));
                Err(err)
            }
        }
    }
}

fn require_text(field: &'static str, value: &str) -> Result<(), GatewayError> {
    if value.trim().is_empty() {
        Err(GatewayError::Validation { field })
    } else {
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
