use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use shared::{
    domain::{
        AccountType, AdminId, Booking, KycDocument, Transaction, User, UserId, Vehicle, VehicleId,
    },
    protocol::{
        Ack, ApiKeys, BioUpdate, BroadcastRequest, DashboardStats, Envelope, LicenceDecision,
        ListPage, ListResponse, LoginData, LoginRequest, NewStaff, OtpRequest, PasswordReset,
        TicketReply, VehicleRef, VehicleUpdate,
    },
};
use tracing::{debug, warn};
use url::Url;

use crate::error::GatewayError;

/// Every remote call the admin console makes.
#[async_trait]
pub trait AdminGateway: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<AdminId, GatewayError>;
    async fn dashboard_stats(&self, admin_id: AdminId) -> Result<DashboardStats, GatewayError>;
    async fn riders(&self, page: u32) -> Result<ListPage<User>, GatewayError>;
    async fn drivers(&self, page: u32) -> Result<ListPage<User>, GatewayError>;
    async fn bookings(&self, page: u32, filter: &str) -> Result<ListPage<Booking>, GatewayError>;
    async fn transactions(&self, page: u32) -> Result<ListPage<Transaction>, GatewayError>;
    async fn kyc_requests(&self) -> Result<Vec<KycDocument>, GatewayError>;
    async fn vehicle_info(&self, vin: &str) -> Result<Vehicle, GatewayError>;
    async fn delete_account(
        &self,
        id: UserId,
        account_type: AccountType,
    ) -> Result<Ack, GatewayError>;
    async fn update_vehicle(&self, update: &VehicleUpdate) -> Result<Ack, GatewayError>;
    async fn delete_vehicle(&self, id: VehicleId) -> Result<Ack, GatewayError>;
    async fn approve_licence(&self, decision: &LicenceDecision) -> Result<Ack, GatewayError>;
    async fn reject_licence(&self, decision: &LicenceDecision) -> Result<Ack, GatewayError>;
    async fn broadcast_message(&self, message: &str) -> Result<Ack, GatewayError>;
    async fn reply_ticket(&self, reply: &TicketReply) -> Result<Ack, GatewayError>;
    async fn add_staff(&self, staff: &NewStaff) -> Result<Ack, GatewayError>;
    async fn update_api_keys(&self, keys: &ApiKeys) -> Result<Ack, GatewayError>;
    async fn update_bio(&self, bio: &BioUpdate) -> Result<Ack, GatewayError>;
    async fn send_otp(&self, email: &str) -> Result<Ack, GatewayError>;
    async fn reset_password(&self, reset: &PasswordReset) -> Result<Ack, GatewayError>;
}

pub struct HttpGateway {
    http: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: &str) -> Result<Self, GatewayError> {
        Self::with_timeout(base_url, None)
    }

    /// `timeout` of `None` leaves reqwest's transport defaults in place.
    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> Result<Self, GatewayError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let parsed = Url::parse(trimmed).map_err(|err| GatewayError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: err.to_string(),
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(GatewayError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: "base url must start with http:// or https://".to_string(),
            });
        }

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|err| GatewayError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: format!("failed to build http client: {err}"),
        })?;

        Ok(Self {
            http,
            base_url: trimmed.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send(
        &self,
        endpoint: &'static str,
        request: RequestBuilder,
    ) -> Result<Value, GatewayError> {
        debug!(endpoint, "gateway: sending request");
        let response = request
            .send()
            .await
            .map_err(|source| GatewayError::Transport { endpoint, source })?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|source| GatewayError::Transport { endpoint, source })?;

        let body = match serde_json::from_slice::<Value>(&bytes) {
            Ok(body) => body,
            Err(_) if !status.is_success() => {
                warn!(endpoint, status = status.as_u16(), "gateway: non-json error response");
                return Err(GatewayError::HttpStatus {
                    endpoint,
                    status: status.as_u16(),
                });
            }
            Err(err) => return Err(GatewayError::malformed(endpoint, err)),
        };

        if !status.is_success() {
            warn!(endpoint, status = status.as_u16(), "gateway: error response");
            return match body.get("message").and_then(Value::as_str) {
                Some(message) if !message.trim().is_empty() => Err(GatewayError::Rejected {
                    message: message.to_string(),
                }),
                _ => Err(GatewayError::HttpStatus {
                    endpoint,
                    status: status.as_u16(),
                }),
            };
        }

        Ok(body)
    }

    async fn get(
        &self,
        endpoint: &'static str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Value, GatewayError> {
        self.send(endpoint, self.http.get(self.url(path)).query(query))
            .await
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        endpoint: &'static str,
        path: &str,
        body: &B,
    ) -> Result<Value, GatewayError> {
        self.send(endpoint, self.http.post(self.url(path)).json(body))
            .await
    }

    async fn list<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<ListPage<T>, GatewayError> {
        let body = self.get(endpoint, path, query).await?;
        let response: ListResponse<T> =
            serde_json::from_value(body).map_err(|err| GatewayError::malformed(endpoint, err))?;
        Ok(response.ensure_success()?.into())
    }

    async fn ack<B: Serialize + ?Sized>(
        &self,
        endpoint: &'static str,
        path: &str,
        body: &B,
    ) -> Result<Ack, GatewayError> {
        let body = self.post(endpoint, path, body).await?;
        envelope_ack(endpoint, body)
    }
}

fn decode_envelope<T: DeserializeOwned>(
    endpoint: &'static str,
    body: Value,
) -> Result<Envelope<T>, GatewayError> {
    let envelope: Envelope<T> =
        serde_json::from_value(body).map_err(|err| GatewayError::malformed(endpoint, err))?;
    Ok(envelope.ensure_success()?)
}

fn envelope_ack(endpoint: &'static str, body: Value) -> Result<Ack, GatewayError> {
    let envelope = decode_envelope::<Value>(endpoint, body)?;
    Ok(Ack {
        message: envelope.message,
    })
}

/// The summary endpoint answers with the bare stats document; some
/// deployments wrap it in an envelope instead. Both are accepted.
fn decode_stats(body: Value) -> Result<DashboardStats, GatewayError> {
    const ENDPOINT: &str = "management-summary";

    let Value::Object(mut map) = body else {
        return Err(GatewayError::malformed(ENDPOINT, "expected a json object"));
    };

    if map.get("status") == Some(&Value::Bool(false)) {
        let message = map
            .get("message")
            .and_then(Value::as_str)
            .filter(|message| !message.trim().is_empty())
            .unwrap_or("request was rejected by the server")
            .to_string();
        return Err(GatewayError::Rejected { message });
    }

    // A bare stats document is recognized by its top-level `users` count.
    let document = match map.remove("data") {
        Some(data @ Value::Object(_)) if !map.contains_key("users") => data,
        Some(other) => {
            map.insert("data".to_string(), other);
            Value::Object(map)
        }
        None => Value::Object(map),
    };

    serde_json::from_value(document).map_err(|err| GatewayError::malformed(ENDPOINT, err))
}

#[async_trait]
impl AdminGateway for HttpGateway {
    async fn login(&self, email: &str, password: &str) -> Result<AdminId, GatewayError> {
        let body = self
            .post(
                "admin/login",
                "/admin/login",
                &LoginRequest {
                    email: email.to_string(),
                    password: password.to_string(),
                },
            )
            .await?;
        let envelope = decode_envelope::<LoginData>("admin/login", body)?;
        envelope
            .data
            .map(|data| data.id)
            .ok_or_else(|| GatewayError::malformed("admin/login", "response is missing data.id"))
    }

    async fn dashboard_stats(&self, admin_id: AdminId) -> Result<DashboardStats, GatewayError> {
        let body = self
            .get(
                "management-summary",
                "/management-summary",
                &[("id", admin_id.to_string())],
            )
            .await?;
        decode_stats(body)
    }

    async fn riders(&self, page: u32) -> Result<ListPage<User>, GatewayError> {
        self.list(
            "admin/fetch-riders",
            "/admin/fetch-riders",
            &[("page", page.to_string())],
        )
        .await
    }

    async fn drivers(&self, page: u32) -> Result<ListPage<User>, GatewayError> {
        self.list(
            "admin/fetch-drivers",
            "/admin/fetch-drivers",
            &[("page", page.to_string())],
        )
        .await
    }

    async fn bookings(&self, page: u32, filter: &str) -> Result<ListPage<Booking>, GatewayError> {
        self.list(
            "admin/fetch-bookings",
            "/admin/fetch-bookings",
            &[("page", page.to_string()), ("filter", filter.to_string())],
        )
        .await
    }

    async fn transactions(&self, page: u32) -> Result<ListPage<Transaction>, GatewayError> {
        self.list(
            "admin/fetch-transaction",
            "/admin/fetch-transaction",
            &[("page", page.to_string())],
        )
        .await
    }

    async fn kyc_requests(&self) -> Result<Vec<KycDocument>, GatewayError> {
        let body = self
            .get("admin/kyc-requests", "/admin/kyc-requests", &[])
            .await?;
        let envelope = decode_envelope::<Vec<KycDocument>>("admin/kyc-requests", body)?;
        Ok(envelope.data.unwrap_or_default())
    }

    async fn vehicle_info(&self, vin: &str) -> Result<Vehicle, GatewayError> {
        let body = self
            .get(
                "get-vehicle-info",
                "/get-vehicle-info",
                &[("vin", vin.to_string())],
            )
            .await?;
        let envelope = decode_envelope::<Vehicle>("get-vehicle-info", body)?;
        envelope
            .data
            .ok_or_else(|| GatewayError::malformed("get-vehicle-info", "response has no vehicle"))
    }

    async fn delete_account(
        &self,
        id: UserId,
        account_type: AccountType,
    ) -> Result<Ack, GatewayError> {
        let body = self
            .get(
                "admin/delete-account",
                "/admin/delete-account",
                &[
                    ("id", id.to_string()),
                    ("type", account_type.as_str().to_string()),
                ],
            )
            .await?;
        envelope_ack("admin/delete-account", body)
    }

    async fn update_vehicle(&self, update: &VehicleUpdate) -> Result<Ack, GatewayError> {
        self.ack("update-vehicle", "/update-vehicle", update).await
    }

    async fn delete_vehicle(&self, id: VehicleId) -> Result<Ack, GatewayError> {
        self.ack(
            "admin/delete-vehicle",
            "/admin/delete-vehicle",
            &VehicleRef { id },
        )
        .await
    }

    async fn approve_licence(&self, decision: &LicenceDecision) -> Result<Ack, GatewayError> {
        self.ack("admin/approve-licence", "/admin/approve-licence", decision)
            .await
    }

    async fn reject_licence(&self, decision: &LicenceDecision) -> Result<Ack, GatewayError> {
        self.ack("admin/reject-licence", "/admin/reject-licence", decision)
            .await
    }

    async fn broadcast_message(&self, message: &str) -> Result<Ack, GatewayError> {
        self.ack(
            "admin/broadcast-message",
            "/admin/broadcast-message",
            &BroadcastRequest {
                message: message.to_string(),
            },
        )
        .await
    }

    async fn reply_ticket(&self, reply: &TicketReply) -> Result<Ack, GatewayError> {
        self.ack("reply-ticket", "/reply-ticket", reply).await
    }

    async fn add_staff(&self, staff: &NewStaff) -> Result<Ack, GatewayError> {
        self.ack("admin/add-new-staff", "/admin/add-new-staff", staff)
            .await
    }

    async fn update_api_keys(&self, keys: &ApiKeys) -> Result<Ack, GatewayError> {
        self.ack("admin/update-api", "/admin/update-api", keys).await
    }

    async fn update_bio(&self, bio: &BioUpdate) -> Result<Ack, GatewayError> {
        self.ack("admin/update-bio", "/admin/update-bio", bio).await
    }

    async fn send_otp(&self, email: &str) -> Result<Ack, GatewayError> {
        self.ack(
            "send-otp",
            "/send-otp",
            &OtpRequest {
                email: email.to_string(),
            },
        )
        .await
    }

    async fn reset_password(&self, reset: &PasswordReset) -> Result<Ack, GatewayError> {
        self.ack("admin/reset-password", "/admin/reset-password", reset)
            .await
    }
}

#[cfg(test)]
#[path = "tests/gateway_tests.rs"]
mod tests;
