use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Status / Role enums
// ============================================================================

/// Lifecycle status of a record. Parsing is case-insensitive; values the
/// core does not know about are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecordStatus {
    Active,
    Inactive,
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Expired,
    Unsubscribed,
    Other(String),
}

impl RecordStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
            Self::Unsubscribed => "unsubscribed",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for RecordStatus {
    fn from(s: String) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "active" => Self::Active,
            "inactive" => Self::Inactive,
            "pending" => Self::Pending,
            "processing" => Self::Processing,
            "shipped" => Self::Shipped,
            "delivered" => Self::Delivered,
            "cancelled" | "canceled" => Self::Cancelled,
            "expired" => Self::Expired,
            "unsubscribed" => Self::Unsubscribed,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for RecordStatus {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<RecordStatus> for String {
    fn from(status: RecordStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role (or category) of a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    Moderator,
    Customer,
    User,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Admin => "admin",
            Self::Moderator => "moderator",
            Self::Customer => "customer",
            Self::User => "user",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Self::Admin,
            "moderator" => Self::Moderator,
            "customer" => Self::Customer,
            "user" => Self::User,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Record
// ============================================================================

/// One administered entity as held in the local cache.
///
/// Well-known attributes are typed; everything else lives in `fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RecordStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, rename = "isActive", skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    /// ISO-8601 string as sent by the server.
    #[serde(default, rename = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, rename = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: None,
            role: None,
            is_active: None,
            created_at: None,
            updated_at: None,
            fields: Map::new(),
        }
    }

    pub fn with_status(mut self, status: impl Into<RecordStatus>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<Role>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.is_active = Some(active);
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Current value of a field by wire name, typed attributes included.
    pub fn get(&self, name: &str) -> Option<Value> {
        match name {
            "id" | "_id" => Some(Value::String(self.id.clone())),
            "status" => self.status.as_ref().map(|s| Value::String(s.to_string())),
            "role" => self.role.as_ref().map(|r| Value::String(r.to_string())),
            "isActive" => self.is_active.map(Value::Bool),
            "createdAt" => self.created_at.clone().map(Value::String),
            "updatedAt" => self.updated_at.clone().map(Value::String),
            other => self.fields.get(other).cloned(),
        }
    }

    /// Whether a field holds something other than null or an empty string.
    pub fn has_value(&self, name: &str) -> bool {
        match self.get(name) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(_) => true,
        }
    }

    /// Set a field by wire name, routing well-known names to the typed
    /// attributes. Values of the wrong JSON type for a typed attribute are
    /// stored in `fields` instead of being dropped.
    pub fn set(&mut self, name: &str, value: Value) {
        match (name, value) {
            ("status", Value::String(s)) => self.status = Some(RecordStatus::from(s)),
            ("status", Value::Null) => self.status = None,
            ("role", Value::String(s)) => self.role = Some(Role::from(s)),
            ("role", Value::Null) => self.role = None,
            ("isActive", Value::Bool(b)) => self.is_active = Some(b),
            ("isActive", Value::Null) => self.is_active = None,
            ("createdAt", Value::String(s)) => self.created_at = Some(s),
            ("updatedAt", Value::String(s)) => self.updated_at = Some(s),
            (other, value) => {
                self.fields.insert(other.to_string(), value);
            }
        }
    }

    /// Read a monetary amount. Accepts JSON numbers and numeric strings;
    /// anything else reads as `None`.
    pub fn amount(&self, field: &str) -> Option<f64> {
        match self.fields.get(field)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }
}

// ============================================================================
// ResourceKind
// ============================================================================

/// The remote collections this core administers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Users,
    Orders,
    Coupons,
    Subscribers,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Users,
        ResourceKind::Orders,
        ResourceKind::Coupons,
        ResourceKind::Subscribers,
    ];

    /// Collection name; also the metrics category key.
    pub fn name(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Orders => "orders",
            Self::Coupons => "coupons",
            Self::Subscribers => "subscribers",
        }
    }

    /// Metric keys reported for this resource, in display order.
    pub fn metric_keys(self) -> &'static [&'static str] {
        match self {
            Self::Users => &["total", "active", "inactive", "admins"],
            Self::Orders => &["total", "totalRevenue", "pendingRevenue", "averageOrderValue"],
            Self::Coupons => &["total", "active", "expired"],
            Self::Subscribers => &["total", "active", "unsubscribed"],
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Decoded collaborator responses
// ============================================================================

/// One page of a list fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListPage {
    pub items: Vec<Record>,
    pub total: u64,
}

/// Server acknowledgement of a bulk action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkActionResponse {
    pub message: String,
    #[serde(default)]
    pub result: Value,
}

/// Server reply to a single-field save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldUpdateResponse {
    pub data: Record,
}

// ============================================================================
// Tests
// ============================================================================
