use serde::Deserialize;
use serde_json::{Value, json};
use teleagent_core::operation::{OperationError, OperationResult, ValidatedArgs};

use super::{UserArgs, not_found};
use crate::model::{AuthorizedContact, normalize_phone, normalize_place};
use crate::store::SubscriberStore;

/// Cities with 5G coverage.
pub const FIVE_G_CITIES: [&str; 3] = ["ankara", "izmir", "istanbul"];

/// `05XXXXXXXXX` once spaces and dashes are removed.
pub fn is_valid_mobile_number(number: &str) -> bool {
    let digits = normalize_phone(number);
    digits.len() == 11 && digits.starts_with("05") && digits.chars().all(|c| c.is_ascii_digit())
}

pub fn activate_esim(
    store: &SubscriberStore,
    args: &ValidatedArgs,
) -> Result<OperationResult, OperationError> {
    let UserArgs { user_identifier } = args.deserialize()?;
    let outcome = store.update(&user_identifier, |subscriber| {
        if subscriber.esim_active {
            return OperationResult::failure("eSIM is already active.");
        }
        subscriber.esim_active = true;
        OperationResult::ok().with_message("eSIM activated.")
    });
    Ok(outcome.unwrap_or_else(not_found))
}

pub fn deactivate_esim(
    store: &SubscriberStore,
    args: &ValidatedArgs,
) -> Result<OperationResult, OperationError> {
    let UserArgs { user_identifier } = args.deserialize()?;
    let outcome = store.update(&user_identifier, |subscriber| {
        if !subscriber.esim_active {
            return OperationResult::failure("eSIM is not active.");
        }
        subscriber.esim_active = false;
        OperationResult::ok().with_message("eSIM deactivated.")
    });
    Ok(outcome.unwrap_or_else(not_found))
}

pub fn activate_international_roaming(
    store: &SubscriberStore,
    args: &ValidatedArgs,
) -> Result<OperationResult, OperationError> {
    let UserArgs { user_identifier } = args.deserialize()?;
    let outcome = store.update(&user_identifier, |subscriber| {
        if subscriber.roaming_restricted == Some(false) {
            return OperationResult::ok().with_message("International roaming is already active.");
        }
        subscriber.roaming_restricted = Some(false);
        OperationResult::ok().with_message("International roaming activated.")
    });
    Ok(outcome.unwrap_or_else(not_found))
}

pub fn enable_5g(
    store: &SubscriberStore,
    args: &ValidatedArgs,
) -> Result<OperationResult, OperationError> {
    let UserArgs { user_identifier } = args.deserialize()?;
    let outcome = store.update(&user_identifier, |subscriber| {
        if subscriber.network_mode.as_deref() == Some("5G") {
            return OperationResult::failure("5G is already enabled.");
        }
        let Some(city) = subscriber.city().map(normalize_place) else {
            return OperationResult::failure("No address on record to check 5G coverage.");
        };
        if !FIVE_G_CITIES.contains(&city.as_str()) {
            return OperationResult::failure(format!("5G is not available in {city}."));
        }
        subscriber.network_mode = Some("5G".to_string());
        OperationResult::ok()
            .with_message("5G enabled.")
            .with_data(json!({"network_mode": "5G"}))
    });
    Ok(outcome.unwrap_or_else(not_found))
}

#[derive(Deserialize)]
struct NumberArgs {
    user_identifier: String,
    target_number: String,
}

pub fn block_incoming_number(
    store: &SubscriberStore,
    args: &ValidatedArgs,
) -> Result<OperationResult, OperationError> {
    let NumberArgs {
        user_identifier,
        target_number,
    } = args.deserialize()?;
    if !is_valid_mobile_number(&target_number) {
        return Ok(OperationResult::failure(
            "Phone number must be in 05XXXXXXXXX format.",
        ));
    }
    let number = normalize_phone(&target_number);

    let outcome = store.update(&user_identifier, |subscriber| {
        if subscriber
            .blocked_numbers
            .iter()
            .any(|n| normalize_phone(n) == number)
        {
            return OperationResult::failure(format!("{number} is already blocked."));
        }
        subscriber.blocked_numbers.push(number.clone());
        OperationResult::ok()
            .with_message(format!("{number} blocked."))
            .with_field("blocked_number", Value::String(number.clone()))
    });
    Ok(outcome.unwrap_or_else(not_found))
}

pub fn unblock_incoming_number(
    store: &SubscriberStore,
    args: &ValidatedArgs,
) -> Result<OperationResult, OperationError> {
    let NumberArgs {
        user_identifier,
        target_number,
    } = args.deserialize()?;
    if !is_valid_mobile_number(&target_number) {
        return Ok(OperationResult::failure(
            "Phone number must be in 05XXXXXXXXX format.",
        ));
    }
    let number = normalize_phone(&target_number);

    let outcome = store.update(&user_identifier, |subscriber| {
        let before = subscriber.blocked_numbers.len();
        subscriber
            .blocked_numbers
            .retain(|n| normalize_phone(n) != number);
        if subscriber.blocked_numbers.len() == before {
            return OperationResult::failure(format!("{number} is not blocked."));
        }
        OperationResult::ok().with_message(format!("{number} unblocked."))
    });
    Ok(outcome.unwrap_or_else(not_found))
}

pub fn remove_data_restriction(
    store: &SubscriberStore,
    args: &ValidatedArgs,
) -> Result<OperationResult, OperationError> {
    let UserArgs { user_identifier } = args.deserialize()?;
    let outcome = store.update(&user_identifier, |subscriber| {
        if subscriber.roaming_restricted != Some(true) {
            return OperationResult::failure("There is no active data restriction.");
        }
        subscriber.roaming_restricted = Some(false);
        OperationResult::ok().with_message("International data restriction removed.")
    });
    Ok(outcome.unwrap_or_else(not_found))
}

fn set_child_profile(
    store: &SubscriberStore,
    args: &ValidatedArgs,
    enabled: bool,
) -> Result<OperationResult, OperationError> {
    let UserArgs { user_identifier } = args.deserialize()?;
    let state = if enabled { "active" } else { "inactive" };
    let outcome = store.update(&user_identifier, |subscriber| {
        if subscriber.child_mode_enabled == Some(enabled) {
            return OperationResult::ok().with_message(format!("Child profile is already {state}."));
        }
        subscriber.child_mode_enabled = Some(enabled);
        OperationResult::ok()
            .with_message(format!("Child profile is now {state}."))
            .with_field("child_mode_enabled", Value::Bool(enabled))
    });
    Ok(outcome.unwrap_or_else(not_found))
}

pub fn activate_child_profile(
    store: &SubscriberStore,
    args: &ValidatedArgs,
) -> Result<OperationResult, OperationError> {
    set_child_profile(store, args, true)
}

pub fn deactivate_child_profile(
    store: &SubscriberStore,
    args: &ValidatedArgs,
) -> Result<OperationResult, OperationError> {
    set_child_profile(store, args, false)
}

#[derive(Deserialize)]
struct ContactArgs {
    user_identifier: String,
    name: String,
    phone: String,
}

/// Contacts are unique by phone number, compared without spaces and dashes.
pub fn add_authorized_contact(
    store: &SubscriberStore,
    args: &ValidatedArgs,
) -> Result<OperationResult, OperationError> {
    let ContactArgs {
        user_identifier,
        name,
        phone,
    } = args.deserialize()?;
    let phone = normalize_phone(phone.trim());
    let name = name.trim().to_string();
    if name.is_empty() || phone.is_empty() {
        return Ok(OperationResult::failure("Contact name and phone are required."));
    }

    let outcome = store.update(&user_identifier, |subscriber| {
        if subscriber
            .authorized_contacts
            .iter()
            .any(|c| normalize_phone(&c.phone) == phone)
        {
            return OperationResult::failure(format!("{phone} is already an authorized contact."));
        }
        subscriber.authorized_contacts.push(AuthorizedContact {
            name: name.clone(),
            phone: phone.clone(),
        });
        OperationResult::ok().with_message(format!("{name} ({phone}) added as an authorized contact."))
    });
    Ok(outcome.unwrap_or_else(not_found))
}
