use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Payment status that blocks plan changes.
pub const PAYMENT_OVERDUE: &str = "Gecikmiş";
pub const DEFAULT_PACKAGE_GROUP: &str = "genel";
/// Bill status that can still take new charges, besides [`PAYMENT_OVERDUE`].
pub const BILL_PENDING: &str = "Beklemede";

pub const LINE_ACTIVE: &str = "aktif";
pub const LINE_PASSIVE: &str = "pasif";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub zip_code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    pub bill_id: String,
    #[serde(default)]
    pub bill_date: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub status: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Support ticket or field appointment attached to a subscriber.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_id: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorizedContact {
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subscriber {
    #[serde(default)]
    pub tc_no: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub current_package: Option<String>,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub contract_end_date: Option<String>,
    #[serde(default)]
    pub bills: Vec<Bill>,
    #[serde(default)]
    pub appointments: Vec<Appointment>,
    #[serde(default)]
    pub esim_active: bool,
    #[serde(default)]
    pub roaming_restricted: Option<bool>,
    #[serde(default)]
    pub network_mode: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub blocked_numbers: Vec<String>,
    /// Line status, [`LINE_ACTIVE`] or [`LINE_PASSIVE`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_mode_enabled: Option<bool>,
    #[serde(default)]
    pub authorized_contacts: Vec<AuthorizedContact>,
    #[serde(default)]
    pub usage_history: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Subscriber {
    /// Exact national id or customer id, or phone number ignoring spaces and
    /// dashes.
    pub fn matches(&self, identifier: &str) -> bool {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return false;
        }
        if self.tc_no.as_deref() == Some(identifier)
            || self.customer_id.as_deref() == Some(identifier)
        {
            return true;
        }
        self.phone_number
            .as_deref()
            .is_some_and(|phone| normalize_phone(phone) == normalize_phone(identifier))
    }

    pub fn is_overdue(&self) -> bool {
        self.payment_status.as_deref() == Some(PAYMENT_OVERDUE)
    }

    pub fn is_passive(&self) -> bool {
        self.status.as_deref() == Some(LINE_PASSIVE)
    }

    pub fn city(&self) -> Option<&str> {
        self.address
            .as_ref()
            .map(|a| a.city.as_str())
            .filter(|c| !c.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    #[serde(default = "default_groups")]
    pub allowed_groups: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_groups() -> Vec<String> {
    vec![DEFAULT_PACKAGE_GROUP.to_string()]
}

impl Package {
    pub fn allows(&self, group: &str) -> bool {
        self.allowed_groups
            .iter()
            .any(|g| normalize_place(g) == group)
    }
}

pub fn normalize_phone(number: &str) -> String {
    number.chars().filter(|c| *c != ' ' && *c != '-').collect()
}

/// Lowercase a place name so that dotted capitals compare equal to their
/// plain forms ("İzmir" matches "izmir").
pub fn normalize_place(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .filter(|c| *c != '\u{307}')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn subscriber() -> Subscriber {
        serde_json::from_value(json!({
            "tc_no": "12345678901",
            "customer_id": "CUST-1",
            "phone_number": "0532 123-45-67",
            "name": "Ayşe Yılmaz",
            "loyalty_points": 120
        }))
        .unwrap()
    }

    #[test]
    fn test_matching_identifiers() {
        let s = subscriber();
        assert!(s.matches("12345678901"));
        assert!(s.matches("CUST-1"));
        assert!(s.matches("05321234567"));
        assert!(s.matches("0532-123 45 67"));
        assert!(!s.matches("1234567890"));
        assert!(!s.matches(""));
    }

    #[test]
    fn test_unknown_fields_survive() {
        let s = subscriber();
        assert_eq!(s.extra.get("loyalty_points"), Some(&json!(120)));
        let value = serde_json::to_value(&s).unwrap();
        assert_eq!(value["loyalty_points"], 120);
    }

    #[test]
    fn test_package_default_group() {
        let package: Package = serde_json::from_value(json!({"name": "Genç 10GB"})).unwrap();
        assert_eq!(package.allowed_groups, vec!["genel"]);
        assert!(package.allows("genel"));
        assert!(!package.allows("öğrenci"));
    }

    #[test]
    fn test_normalize_place() {
        assert_eq!(normalize_place("İzmir"), "izmir");
        assert_eq!(normalize_place(" Ankara "), "ankara");
    }
}
