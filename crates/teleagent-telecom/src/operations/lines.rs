//! Line lifecycle: suspension, freezing, cancellation and number changes.

use std::collections::HashSet;

use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::{Value, json};
use teleagent_core::operation::{OperationError, OperationResult, ValidatedArgs};

use super::{UserArgs, not_found};
use crate::model::{LINE_ACTIVE, LINE_PASSIVE, Subscriber, normalize_phone};
use crate::store::SubscriberStore;

pub const SERVICE_ACTIVE: &str = "Active";
pub const SERVICE_SUSPENDED: &str = "Suspended";
pub const SERVICE_CANCELLED: &str = "Cancelled";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const CONTRACT_DATE_FORMAT: &str = "%Y-%m-%d";
const DEFAULT_FREEZE_REASON: &str = "Frozen at customer request";

/// Package bookkeeping dropped when a subscription is cancelled.
const PACKAGE_KEYS: [&str; 5] = [
    "package_start_date",
    "package_end_date",
    "remaining_data",
    "remaining_minutes",
    "remaining_sms",
];

#[derive(Deserialize)]
struct ReasonArgs {
    user_identifier: String,
    reason: String,
}

fn now() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

fn set_extra(subscriber: &mut Subscriber, key: &str, value: Value) {
    subscriber.extra.insert(key.to_string(), value);
}

pub fn suspend_line_due_to_loss(
    store: &SubscriberStore,
    args: &ValidatedArgs,
) -> Result<OperationResult, OperationError> {
    let ReasonArgs {
        user_identifier,
        reason,
    } = args.deserialize()?;
    let outcome = store.update(&user_identifier, |subscriber| {
        subscriber.status = Some(LINE_PASSIVE.to_string());
        subscriber.service_status = Some(SERVICE_SUSPENDED.to_string());
        set_extra(subscriber, "suspension_reason", Value::String(reason.clone()));
        OperationResult::ok().with_message(format!("Line suspended: {reason}."))
    });
    Ok(outcome.unwrap_or_else(not_found))
}

#[derive(Deserialize)]
struct FreezeArgs {
    user_identifier: String,
    #[serde(default)]
    reason: Option<String>,
}

pub fn freeze_line(
    store: &SubscriberStore,
    args: &ValidatedArgs,
) -> Result<OperationResult, OperationError> {
    let FreezeArgs {
        user_identifier,
        reason,
    } = args.deserialize()?;
    let reason = reason
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FREEZE_REASON.to_string());

    let outcome = store.update(&user_identifier, |subscriber| {
        if subscriber.is_passive() {
            return OperationResult::ok().with_message("The line is already passive.");
        }
        subscriber.status = Some(LINE_PASSIVE.to_string());
        set_extra(subscriber, "freeze_reason", Value::String(reason.clone()));
        OperationResult::ok().with_message(format!("Line frozen ({reason})."))
    });
    Ok(outcome.unwrap_or_else(not_found))
}

pub fn activate_line(
    store: &SubscriberStore,
    args: &ValidatedArgs,
) -> Result<OperationResult, OperationError> {
    let UserArgs { user_identifier } = args.deserialize()?;
    let outcome = store.update(&user_identifier, |subscriber| {
        let service_active = subscriber
            .service_status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case(SERVICE_ACTIVE));
        if subscriber.status.as_deref() == Some(LINE_ACTIVE) && service_active {
            return OperationResult::ok().with_message("The line is already active.");
        }
        subscriber.status = Some(LINE_ACTIVE.to_string());
        subscriber.service_status = Some(SERVICE_ACTIVE.to_string());
        OperationResult::ok().with_message("Line activated.")
    });
    Ok(outcome.unwrap_or_else(not_found))
}

pub fn cancel_subscription(
    store: &SubscriberStore,
    args: &ValidatedArgs,
) -> Result<OperationResult, OperationError> {
    let ReasonArgs {
        user_identifier,
        reason,
    } = args.deserialize()?;
    let cancelled_at = now();
    let outcome = store.update(&user_identifier, |subscriber| {
        subscriber.current_package = None;
        for key in PACKAGE_KEYS {
            subscriber.extra.remove(key);
        }
        subscriber.status = Some(LINE_PASSIVE.to_string());
        subscriber.service_status = Some(SERVICE_CANCELLED.to_string());
        set_extra(subscriber, "cancellation_reason", Value::String(reason.clone()));
        set_extra(subscriber, "cancellation_date", Value::String(cancelled_at.clone()));
        OperationResult::ok().with_message(format!("Subscription cancelled: {reason}."))
    });
    Ok(outcome.unwrap_or_else(not_found))
}

/// Closes the subscription but keeps the package on record, unlike
/// [`cancel_subscription`].
pub fn delete_subscription(
    store: &SubscriberStore,
    args: &ValidatedArgs,
) -> Result<OperationResult, OperationError> {
    let ReasonArgs {
        user_identifier,
        reason,
    } = args.deserialize()?;
    let outcome = store.update(&user_identifier, |subscriber| {
        subscriber.status = Some(LINE_PASSIVE.to_string());
        subscriber.service_status = Some(SERVICE_CANCELLED.to_string());
        set_extra(subscriber, "cancellation_reason", Value::String(reason.clone()));
        OperationResult::ok().with_message(format!("Subscription deleted: {reason}."))
    });
    Ok(outcome.unwrap_or_else(not_found))
}

pub fn check_service_status(
    store: &SubscriberStore,
    args: &ValidatedArgs,
) -> Result<OperationResult, OperationError> {
    let UserArgs { user_identifier } = args.deserialize()?;
    let Some(subscriber) = store.find(&user_identifier) else {
        return Ok(not_found());
    };

    let line = subscriber.status.as_deref().unwrap_or(LINE_ACTIVE);
    let service = subscriber.service_status.as_deref().unwrap_or(SERVICE_ACTIVE);
    Ok(OperationResult::ok()
        .with_message(format!("Line is {line}, service is {service}."))
        .with_field("status", json!(line))
        .with_field("service_status", json!(service)))
}

#[derive(Deserialize)]
struct PortingArgs {
    user_identifier: String,
    current_operator: String,
    reason: String,
}

pub fn request_number_porting(
    store: &SubscriberStore,
    args: &ValidatedArgs,
) -> Result<OperationResult, OperationError> {
    let PortingArgs {
        user_identifier,
        current_operator,
        reason,
    } = args.deserialize()?;
    if current_operator.trim().is_empty() {
        return Ok(OperationResult::failure("current_operator must not be empty."));
    }

    let request = json!({
        "current_operator": current_operator.trim(),
        "reason": reason,
        "requested_at": now(),
        "status": "Received",
    });
    let outcome = store.update(&user_identifier, |subscriber| {
        set_extra(subscriber, "number_porting_request", request.clone());
        OperationResult::ok()
            .with_message(format!(
                "Number porting request from {} received.",
                current_operator.trim()
            ))
            .with_field("request", request.clone())
    });
    Ok(outcome.unwrap_or_else(not_found))
}

/// First `05XXXXXXXXX` number, walking from `seed`, that nobody uses.
fn unused_number(seed: &str, taken: &HashSet<String>) -> Option<String> {
    const SPACE: u64 = 1_000_000_000;
    const STRIDE: u64 = 7_919;
    let start = seed
        .get(2..)
        .and_then(|digits| digits.parse::<u64>().ok())
        .unwrap_or(0);
    (1..=10_000u64)
        .map(|k| format!("05{:09}", (start + k * STRIDE) % SPACE))
        .find(|candidate| !taken.contains(candidate))
}

pub fn request_number_change(
    store: &SubscriberStore,
    args: &ValidatedArgs,
) -> Result<OperationResult, OperationError> {
    let ReasonArgs {
        user_identifier,
        reason,
    } = args.deserialize()?;

    let outcome = store.with_records(|records| {
        let taken: HashSet<String> = records
            .iter()
            .filter_map(|s| s.phone_number.as_deref())
            .map(normalize_phone)
            .collect();
        let subscriber = records.iter_mut().find(|s| s.matches(&user_identifier))?;
        let old = subscriber
            .phone_number
            .as_deref()
            .map(normalize_phone)
            .unwrap_or_default();
        let Some(new) = unused_number(&old, &taken) else {
            return Some(OperationResult::failure("No free number is available."));
        };
        subscriber.phone_number = Some(new.clone());
        subscriber.status = Some(LINE_ACTIVE.to_string());
        Some(
            OperationResult::ok()
                .with_message(format!("Number changed ({reason}). New: {new}. Old: {old}."))
                .with_field("new_number", json!(new))
                .with_field("old_number", json!(old)),
        )
    });
    Ok(outcome.unwrap_or_else(not_found))
}

pub fn check_contract_end_date(
    store: &SubscriberStore,
    args: &ValidatedArgs,
) -> Result<OperationResult, OperationError> {
    let UserArgs { user_identifier } = args.deserialize()?;
    let Some(subscriber) = store.find(&user_identifier) else {
        return Ok(not_found());
    };
    let Some(raw) = subscriber.contract_end_date.filter(|d| !d.trim().is_empty()) else {
        return Ok(OperationResult::failure("No contract end date on record."));
    };
    let Ok(end) = NaiveDate::parse_from_str(raw.trim(), CONTRACT_DATE_FORMAT) else {
        return Ok(OperationResult::failure(format!(
            "Unreadable contract end date '{raw}'."
        )));
    };

    let days_remaining = (end - Local::now().date_naive()).num_days();
    let message = if days_remaining >= 0 {
        format!("The contract ends on {end} ({days_remaining} days left).")
    } else {
        format!("The contract ended on {end}.")
    };
    Ok(OperationResult::ok()
        .with_message(message)
        .with_field("contract_end_date", json!(end.format(CONTRACT_DATE_FORMAT).to_string()))
        .with_field("days_remaining", json!(days_remaining)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::services::is_valid_mobile_number;
    use crate::test_support::{args, store};
    use chrono::Days;

    fn with_reason(id: &str, reason: &str) -> ValidatedArgs {
        args(json!({"user_identifier": id, "reason": reason}))
    }

    #[test]
    fn test_freeze_and_activate() {
        let store = store();
        let frozen = freeze_line(&store, &args(json!({"user_identifier": "CUST-1"}))).unwrap();
        assert!(frozen.success);
        let subscriber = store.find("CUST-1").unwrap();
        assert!(subscriber.is_passive());
        assert_eq!(subscriber.extra["freeze_reason"], DEFAULT_FREEZE_REASON);

        let again = freeze_line(&store, &with_reason("CUST-1", "travel")).unwrap();
        assert!(again.message.unwrap().contains("already"));

        assert!(activate_line(&store, &args(json!({"user_identifier": "CUST-1"}))).unwrap().success);
        let subscriber = store.find("CUST-1").unwrap();
        assert_eq!(subscriber.status.as_deref(), Some(LINE_ACTIVE));
        assert_eq!(subscriber.service_status.as_deref(), Some(SERVICE_ACTIVE));
        let again = activate_line(&store, &args(json!({"user_identifier": "CUST-1"}))).unwrap();
        assert!(again.message.unwrap().contains("already"));
    }

    #[test]
    fn test_suspend_due_to_loss() {
        let store = store();
        let result = suspend_line_due_to_loss(&store, &with_reason("CUST-1", "lost phone")).unwrap();
        assert!(result.success);
        let subscriber = store.find("CUST-1").unwrap();
        assert_eq!(subscriber.service_status.as_deref(), Some(SERVICE_SUSPENDED));
        assert!(subscriber.is_passive());

        let status = check_service_status(&store, &args(json!({"user_identifier": "CUST-1"}))).unwrap();
        assert_eq!(status.extra["status"], LINE_PASSIVE);
        assert_eq!(status.extra["service_status"], SERVICE_SUSPENDED);
    }

    #[test]
    fn test_cancel_drops_package() {
        let store = store();
        store.update("CUST-1", |s| {
            s.extra.insert("remaining_data".into(), json!("4GB"));
        });
        let result = cancel_subscription(&store, &with_reason("CUST-1", "moving abroad")).unwrap();
        assert!(result.success);

        let subscriber = store.find("CUST-1").unwrap();
        assert_eq!(subscriber.current_package, None);
        assert!(!subscriber.extra.contains_key("remaining_data"));
        assert_eq!(subscriber.service_status.as_deref(), Some(SERVICE_CANCELLED));
        assert_eq!(subscriber.extra["cancellation_reason"], "moving abroad");
        assert!(subscriber.extra.contains_key("cancellation_date"));
    }

    #[test]
    fn test_delete_keeps_package() {
        let store = store();
        assert!(delete_subscription(&store, &with_reason("98765432109", "price")).unwrap().success);
        let subscriber = store.find("98765432109").unwrap();
        assert!(subscriber.is_passive());
        assert_eq!(subscriber.current_package.as_deref(), Some("Standart 5GB"));
        assert!(!delete_subscription(&store, &with_reason("nobody", "x")).unwrap().success);
    }

    #[test]
    fn test_service_status_defaults_to_active() {
        let store = store();
        let status = check_service_status(&store, &args(json!({"user_identifier": "98765432109"}))).unwrap();
        assert_eq!(status.extra["status"], LINE_ACTIVE);
        assert_eq!(status.extra["service_status"], SERVICE_ACTIVE);
    }

    #[test]
    fn test_number_change_picks_free_number() {
        let store = store();
        let result = request_number_change(&store, &with_reason("CUST-1", "spam calls")).unwrap();
        assert!(result.success);
        let new = result.extra["new_number"].as_str().unwrap().to_string();
        assert_eq!(result.extra["old_number"], "05321234567");
        assert!(is_valid_mobile_number(&new));
        assert_ne!(new, "05321234567");
        assert_ne!(new, "05559876543");
        assert!(store.find(&new).is_some());
        assert!(store.find("05321234567").is_none());
    }

    #[test]
    fn test_unused_number_skips_taken() {
        let first = unused_number("05000000000", &HashSet::new()).unwrap();
        assert_eq!(first, "05000007919");
        let taken = HashSet::from([first.clone()]);
        assert_eq!(unused_number("05000000000", &taken).as_deref(), Some("05000015838"));
    }

    #[test]
    fn test_number_porting_is_recorded() {
        let store = store();
        let result = request_number_porting(
            &store,
            &args(json!({"user_identifier": "CUST-1", "current_operator": "Other GSM", "reason": "coverage"})),
        )
        .unwrap();
        assert!(result.success);
        let subscriber = store.find("CUST-1").unwrap();
        assert_eq!(subscriber.extra["number_porting_request"]["current_operator"], "Other GSM");

        let blank = request_number_porting(
            &store,
            &args(json!({"user_identifier": "CUST-1", "current_operator": " ", "reason": "x"})),
        )
        .unwrap();
        assert!(!blank.success);
    }

    #[test]
    fn test_contract_end_date() {
        let store = store();
        let end = Local::now().date_naive().checked_add_days(Days::new(30)).unwrap();
        store.update("CUST-1", |s| {
            s.contract_end_date = Some(end.format("%Y-%m-%d").to_string());
        });
        let result = check_contract_end_date(&store, &args(json!({"user_identifier": "CUST-1"}))).unwrap();
        assert!(result.success);
        assert_eq!(result.extra["days_remaining"], 30);

        // Mehmet has no contract date
        let result = check_contract_end_date(&store, &args(json!({"user_identifier": "98765432109"}))).unwrap();
        assert!(!result.success);
    }
}
