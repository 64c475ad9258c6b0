use serde::{de, Deserialize, Deserializer, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

id_newtype!(AdminId);
id_newtype!(UserId);
id_newtype!(VehicleId);
id_newtype!(BookingId);
id_newtype!(TransactionId);
id_newtype!(TicketId);
id_newtype!(KycId);

/// Which side of the marketplace an account belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    #[default]
    Passenger,
    Driver,
}

impl AccountType {
    pub fn as_str(self) -> &'static str {
        match self {
            AccountType::Passenger => "passenger",
            AccountType::Driver => "driver",
        }
    }
}

/// Driver-only fields layered on top of a [`User`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverDetails {
    pub status: i64,
}

/// Rider or driver account. Driver-side fields, when the server sends them,
/// land in the `driver` extension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub verified: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stripe_customer_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub account_balance: f64,
    #[serde(flatten)]
    pub driver: Option<DriverDetails>,
}

impl User {
    pub fn is_verified(&self) -> bool {
        self.verified != 0
    }

    pub fn account_status(&self) -> Option<i64> {
        self.driver.as_ref().map(|details| details.status)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    #[serde(default)]
    pub car_name: String,
    #[serde(default)]
    pub car_number: String,
    #[serde(default)]
    pub car_model: String,
    #[serde(default)]
    pub car_color: String,
    #[serde(default)]
    pub seats: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<User>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    #[serde(default)]
    pub booking_code: String,
    // Older records spell it `pickuptype`.
    #[serde(default, alias = "pickuptype", skip_serializing_if = "Option::is_none")]
    pub pickup_type: Option<String>,
    #[serde(default)]
    pub place: String,
    #[serde(default)]
    pub destination_place: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_latitude: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_longitude: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_latitude: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_longitude: Option<String>,
}

impl Booking {
    pub fn has_status(&self, status: &str) -> bool {
        self.status.eq_ignore_ascii_case(status)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    #[serde(default)]
    pub transaction_id: String,
    #[serde(default)]
    pub transaction_type: String,
    #[serde(default)]
    pub intent: String,
    #[serde(default)]
    pub intent_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub transaction_date: String,
    #[serde(default)]
    pub charges: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Admin {
    pub id: AdminId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default)]
    pub role: String,
}

/// Uploaded licence documents attached to a KYC request.
///
/// The server sends these as a JSON document encoded inside a string field.
/// Anything that does not decode to a list of `{ "image": ... }` entries is
/// kept verbatim as [`KycFiles::Invalid`] so a single bad record never fails
/// the surrounding payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KycFiles {
    Documents(Vec<String>),
    Invalid { raw: String },
}

/// Shortest image reference treated as a real upload.
const MIN_KYC_IMAGE_LEN: usize = 5;

#[derive(Deserialize)]
struct KycFileEntry {
    #[serde(default)]
    image: Option<String>,
}

impl KycFiles {
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<Vec<Option<KycFileEntry>>>(raw) {
            Ok(entries) => KycFiles::Documents(
                entries
                    .into_iter()
                    .flatten()
                    .filter_map(|entry| entry.image)
                    .filter(|image| image.chars().count() >= MIN_KYC_IMAGE_LEN)
                    .collect(),
            ),
            Err(_) => KycFiles::Invalid {
                raw: raw.to_string(),
            },
        }
    }

    pub fn documents(&self) -> &[String] {
        match self {
            KycFiles::Documents(documents) => documents,
            KycFiles::Invalid { .. } => &[],
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, KycFiles::Invalid { .. })
    }
}

impl<'de> Deserialize<'de> for KycFiles {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(match value {
            serde_json::Value::String(raw) => KycFiles::parse(&raw),
            serde_json::Value::Null => KycFiles::Documents(Vec::new()),
            // Some deployments already send the decoded array.
            other @ serde_json::Value::Array(_) => KycFiles::parse(&other.to_string()),
            other => KycFiles::Invalid {
                raw: other.to_string(),
            },
        })
    }
}

impl Serialize for KycFiles {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            KycFiles::Documents(documents) => {
                let entries: Vec<serde_json::Value> = documents
                    .iter()
                    .map(|image| serde_json::json!({ "image": image }))
                    .collect();
                serializer.serialize_str(&serde_json::Value::Array(entries).to_string())
            }
            KycFiles::Invalid { raw } => serializer.serialize_str(raw),
        }
    }
}

impl Default for KycFiles {
    fn default() -> Self {
        KycFiles::Documents(Vec::new())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KycDocument {
    pub id: KycId,
    pub driver_id: UserId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub files: KycFiles,
}

/// Amounts arrive as numbers from some endpoints and numeric strings from others.
fn lenient_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => Ok(0.0),
        serde_json::Value::Number(number) => number
            .as_f64()
            .ok_or_else(|| de::Error::custom("amount out of range")),
        serde_json::Value::String(text) if text.trim().is_empty() => Ok(0.0),
        serde_json::Value::String(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("invalid amount: {text}"))),
        other => Err(de::Error::custom(format!("invalid amount: {other}"))),
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
