use chrono::{Days, Local};
use serde::Deserialize;
use serde_json::{Value, json};
use teleagent_core::operation::{OperationError, OperationResult, ValidatedArgs};

use super::{UserArgs, not_found};
use crate::model::{DEFAULT_PACKAGE_GROUP, normalize_place};
use crate::store::SubscriberStore;

pub fn get_user_info(
    store: &SubscriberStore,
    args: &ValidatedArgs,
) -> Result<OperationResult, OperationError> {
    let UserArgs { user_identifier } = args.deserialize()?;
    let Some(subscriber) = store.find(&user_identifier) else {
        return Ok(not_found());
    };

    Ok(OperationResult::ok().with_data(json!({
        "tc_no": subscriber.tc_no,
        "name": subscriber.name,
        "current_package": subscriber.current_package,
        "contract_end_date": subscriber.contract_end_date,
    })))
}

/// Packages open to the subscriber's occupation group, excluding the one
/// they already have.
pub fn get_available_packages(
    store: &SubscriberStore,
    args: &ValidatedArgs,
) -> Result<OperationResult, OperationError> {
    let UserArgs { user_identifier } = args.deserialize()?;
    let Some(subscriber) = store.find(&user_identifier) else {
        return Ok(OperationResult::failure(
            "Customer not found. No package suggestions available.",
        ));
    };

    let group = subscriber
        .occupation
        .as_deref()
        .map(normalize_place)
        .filter(|g| !g.is_empty())
        .unwrap_or_else(|| DEFAULT_PACKAGE_GROUP.to_string());
    let current = subscriber.current_package.unwrap_or_default();

    let offers = store
        .packages()
        .iter()
        .filter(|p| p.allows(&group) && p.name != current)
        .map(serde_json::to_value)
        .collect::<Result<Vec<Value>, _>>()?;

    let message = if offers.is_empty() {
        format!("No packages found for the '{group}' group.")
    } else {
        format!("{} packages found for the '{group}' group.", offers.len())
    };
    Ok(OperationResult::ok()
        .with_data(Value::Array(offers))
        .with_message(message))
}

#[derive(Deserialize)]
struct PackageChangeArgs {
    user_identifier: String,
    new_package_name: String,
}

pub fn initiate_package_change(
    store: &SubscriberStore,
    args: &ValidatedArgs,
) -> Result<OperationResult, OperationError> {
    let PackageChangeArgs {
        user_identifier,
        new_package_name,
    } = args.deserialize()?;

    let outcome = store.update(&user_identifier, |subscriber| {
        if subscriber.is_overdue() {
            return OperationResult::failure(
                "Package change is not possible while a bill is overdue.",
            );
        }
        let old = subscriber
            .current_package
            .replace(new_package_name.clone())
            .unwrap_or_else(|| "unspecified".to_string());
        OperationResult::ok()
            .with_message(format!("Package updated: {old} → {new_package_name}"))
            .with_field("new_package", Value::String(new_package_name.clone()))
    });

    Ok(outcome.unwrap_or_else(|| {
        OperationResult::failure("Customer not found. Package was not changed.")
    }))
}

#[derive(Deserialize)]
struct PauseArgs {
    user_identifier: String,
    duration_days: i64,
    reason: String,
}

pub fn pause_package_temporarily(
    store: &SubscriberStore,
    args: &ValidatedArgs,
) -> Result<OperationResult, OperationError> {
    let PauseArgs {
        user_identifier,
        duration_days,
        reason,
    } = args.deserialize()?;

    let days = match u64::try_from(duration_days) {
        Ok(days) if days > 0 => days,
        _ => {
            return Ok(OperationResult::failure(
                "duration_days must be a positive number of days.",
            ));
        }
    };
    let Some(until) = Local::now().date_naive().checked_add_days(Days::new(days)) else {
        return Ok(OperationResult::failure("duration_days is too large."));
    };
    let until = until.format("%Y-%m-%d").to_string();

    let outcome = store.update(&user_identifier, |subscriber| {
        subscriber
            .extra
            .insert("package_paused_until".to_string(), Value::String(until.clone()));
        subscriber
            .extra
            .insert("package_pause_reason".to_string(), Value::String(reason.clone()));
        OperationResult::ok()
            .with_message(format!("Package paused for {days} days."))
            .with_data(json!({"paused_until": until}))
    });

    Ok(outcome.unwrap_or_else(not_found))
}
