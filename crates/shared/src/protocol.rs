use serde::{Deserialize, Serialize};

use crate::{
    domain::{
        Admin, AdminId, Booking, KycDocument, KycId, Ticket, TicketId, UserId, Vehicle, VehicleId,
    },
    error::{ApiException, ErrorCategory},
};

/// `{status, message, data, pagination}` wrapper returned by every endpoint.
///
/// List endpoints frequently omit `status`; an absent flag counts as success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<bool>,
    #[serde(default)]
    pub message: String,
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T> Envelope<T> {
    pub fn is_success(&self) -> bool {
        self.status.unwrap_or(true)
    }

    pub fn ensure_success(self) -> Result<Self, ApiException> {
        if self.is_success() {
            Ok(self)
        } else {
            let message = if self.message.trim().is_empty() {
                "request was rejected by the server".to_string()
            } else {
                self.message
            };
            Err(ApiException::new(ErrorCategory::Rejected, message))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub current_page: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_items: u64,
}

/// Body of the paged list endpoints. The item array is keyed by resource
/// (`users`, `bookings`, `transactions`).
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default)]
    pub status: Option<bool>,
    #[serde(default)]
    pub message: String,
    #[serde(default = "Vec::new", alias = "users", alias = "bookings", alias = "transactions")]
    pub items: Vec<T>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

impl<T> ListResponse<T> {
    pub fn ensure_success(self) -> Result<Self, ApiException> {
        match self.status {
            Some(false) => Err(ApiException::new(
                ErrorCategory::Rejected,
                if self.message.trim().is_empty() {
                    "request was rejected by the server".to_string()
                } else {
                    self.message
                },
            )),
            _ => Ok(self),
        }
    }
}

/// One fetched page of a list resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListPage<T> {
    pub items: Vec<T>,
    pub pagination: Option<Pagination>,
}

impl<T> From<ListResponse<T>> for ListPage<T> {
    fn from(value: ListResponse<T>) -> Self {
        Self {
            items: value.items,
            pagination: value.pagination,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginData {
    pub id: AdminId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleUpdate {
    pub id: VehicleId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub car_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub car_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub car_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub car_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seats: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleRef {
    pub id: VehicleId,
}

/// Approve/reject payload for a driver's licence submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenceDecision {
    pub id: KycId,
    pub driver_id: UserId,
    pub email: String,
}

impl From<&KycDocument> for LicenceDecision {
    fn from(value: &KycDocument) -> Self {
        Self {
            id: value.id,
            driver_id: value.driver_id,
            email: value.email.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastRequest {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketReply {
    pub name: String,
    pub email: String,
    pub message: String,
    pub id: TicketId,
}

impl TicketReply {
    pub fn to_ticket(ticket: &Ticket, message: impl Into<String>) -> Self {
        Self {
            name: ticket.name.clone(),
            email: ticket.email.clone(),
            message: message.into(),
            id: ticket.id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStaff {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub country: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeys {
    pub stripe_secret_key: String,
    pub stripe_publishable_api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BioUpdate {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordReset {
    pub email: String,
    pub otp: String,
    pub password: String,
}

/// Server acknowledgement of a mutating call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GrowthIndicator {
    #[default]
    Positive,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Performance {
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub percentage_performance: f64,
    #[serde(default)]
    pub growth_indicator: GrowthIndicator,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchStat {
    pub name: String,
    pub value: String,
}

/// Aggregate document behind the dashboard and every page that reads from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardStats {
    pub users: u64,
    pub drivers: u64,
    pub active_bookings: Vec<Booking>,
    pub uploaded_cars: u64,
    pub total_inflow: f64,
    pub total_outflow: f64,
    pub ride_share_in_progress: u64,
    pub stripe_publishable_api_key: String,
    pub stripe_secret_key: String,
    pub admins: Vec<Admin>,
    pub account: Option<Admin>,
    pub kyc: Vec<KycDocument>,
    pub vehicles: Vec<Vehicle>,
    pub total_driver_balance: f64,
    pub total_user_balance: f64,
    pub deposit_performance: Performance,
    pub payout_performance: Performance,
    pub cancel_charge_performance: Performance,
    pub reports: Vec<Ticket>,
    pub dispatch_stat: Vec<DispatchStat>,
    pub hourly_rides: Vec<u64>,
}

impl DashboardStats {
    pub fn net_flow(&self) -> f64 {
        self.total_inflow - self.total_outflow
    }

    pub fn pending_kyc(&self) -> usize {
        self.kyc.len()
    }

    pub fn find_ticket(&self, id: TicketId) -> Option<&Ticket> {
        self.reports.iter().find(|ticket| ticket.id == id)
    }

    pub fn find_kyc(&self, id: KycId) -> Option<&KycDocument> {
        self.kyc.iter().find(|doc| doc.id == id)
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
