//! Usage records, call history and gift packages.

use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use teleagent_core::operation::{OperationError, OperationResult, ValidatedArgs};

use super::billing::BILL_DATE_FORMAT;
use super::{UserArgs, not_found};
use crate::model::{BILL_PENDING, Bill, PAYMENT_OVERDUE, Subscriber, normalize_phone};
use crate::store::SubscriberStore;

pub const GIFT_PRICE_PER_GB: u32 = 50;
pub const MAX_GIFT_GB: i64 = 10;
const GIFT_TYPE_INTERNET: &str = "internet";
const CALL_HISTORY_LIMIT: usize = 5;
const DEFAULT_USAGE_PERIOD: &str = "last 3 months";
const INTERNET_USED_KEY: &str = "internet_gb_used_monthly";

fn extra_list(subscriber: &Subscriber, key: &str) -> Vec<Value> {
    match subscriber.extra.get(key) {
        Some(Value::Array(items)) => items.clone(),
        _ => Vec::new(),
    }
}

#[derive(Deserialize)]
struct UsageArgs {
    user_identifier: String,
    #[serde(default)]
    period: Option<String>,
}

pub fn get_usage_history(
    store: &SubscriberStore,
    args: &ValidatedArgs,
) -> Result<OperationResult, OperationError> {
    let UsageArgs {
        user_identifier,
        period,
    } = args.deserialize()?;
    let Some(subscriber) = store.find(&user_identifier) else {
        return Ok(not_found());
    };

    let period = period
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_USAGE_PERIOD.to_string());
    let message = if subscriber.usage_history.is_empty() {
        format!("No usage history found for {}.", subscriber.name)
    } else {
        format!("Usage history for {} ({period}).", subscriber.name)
    };
    Ok(OperationResult::ok()
        .with_data(Value::Object(subscriber.usage_history))
        .with_message(message)
        .with_field("period", Value::String(period)))
}

/// The most recent call records, oldest first.
pub fn get_call_history(
    store: &SubscriberStore,
    args: &ValidatedArgs,
) -> Result<OperationResult, OperationError> {
    let UserArgs { user_identifier } = args.deserialize()?;
    let Some(subscriber) = store.find(&user_identifier) else {
        return Ok(not_found());
    };

    let calls = extra_list(&subscriber, "call_history");
    let recent = calls[calls.len().saturating_sub(CALL_HISTORY_LIMIT)..].to_vec();
    Ok(OperationResult::ok()
        .with_message(format!(
            "{} recent call records for {}.",
            recent.len(),
            subscriber.name
        ))
        .with_field("call_history", Value::Array(recent)))
}

pub fn get_received_gifts(
    store: &SubscriberStore,
    args: &ValidatedArgs,
) -> Result<OperationResult, OperationError> {
    let UserArgs { user_identifier } = args.deserialize()?;
    let Some(subscriber) = store.find(&user_identifier) else {
        return Ok(not_found());
    };

    let gifts = extra_list(&subscriber, "received_gifts");
    let message = if gifts.is_empty() {
        "No gifts received.".to_string()
    } else {
        format!("{} gifts received.", gifts.len())
    };
    Ok(OperationResult::ok()
        .with_message(message)
        .with_field("gifts", Value::Array(gifts)))
}

#[derive(Deserialize)]
struct GiftArgs {
    sender_id: String,
    receiver_number: String,
    package_type: String,
    amount: i64,
}

/// Latest pending or overdue bill; unreadable dates sort first.
fn open_bill(bills: &mut [Bill]) -> Option<&mut Bill> {
    bills
        .iter_mut()
        .filter(|b| b.status == BILL_PENDING || b.status == PAYMENT_OVERDUE)
        .max_by_key(|b| NaiveDate::parse_from_str(&b.bill_date, BILL_DATE_FORMAT).ok())
}

fn charge_gift(bill: &mut Bill, amount_gb: i64, total: f64) {
    bill.amount += total;

    let breakdown = bill
        .extra
        .entry("breakdown")
        .or_insert_with(|| Value::Object(Map::new()));
    if !breakdown.is_object() {
        *breakdown = Value::Object(Map::new());
    }
    if let Value::Object(breakdown) = breakdown {
        let base = match breakdown.get("base") {
            Some(Value::String(text)) => text.trim_end_matches("TL").trim().parse().unwrap_or(0.0),
            Some(value) => value.as_f64().unwrap_or(0.0),
            None => 0.0,
        };
        breakdown.insert("base".to_string(), json!(format!("{:.2} TL", base + total)));
    }

    let line = format!("{amount_gb} GB gift internet");
    let details = match bill.extra.get("details").and_then(Value::as_str) {
        Some(existing) if !existing.is_empty() => format!("{existing} + {line}"),
        _ => line,
    };
    bill.extra.insert("details".to_string(), Value::String(details));
}

fn credit_gift(receiver: &mut Subscriber, amount_gb: i64, sender: &str) {
    let used = match receiver.usage_history.get(INTERNET_USED_KEY) {
        Some(value) if value.is_i64() => json!(value.as_i64().unwrap_or(0) + amount_gb),
        Some(value) => json!(value.as_f64().unwrap_or(0.0) + amount_gb as f64),
        None => json!(amount_gb),
    };
    receiver.usage_history.insert(INTERNET_USED_KEY.to_string(), used);

    let mut gifts = extra_list(receiver, "received_gifts");
    gifts.push(json!({
        "type": GIFT_TYPE_INTERNET,
        "amount": format!("{amount_gb}GB"),
        "sender": sender,
        "date": Local::now().format(BILL_DATE_FORMAT).to_string(),
    }));
    receiver
        .extra
        .insert("received_gifts".to_string(), Value::Array(gifts));
}

/// Sends internet data to another subscriber and charges the sender's latest
/// open bill.
pub fn send_gift_package(
    store: &SubscriberStore,
    args: &ValidatedArgs,
) -> Result<OperationResult, OperationError> {
    let GiftArgs {
        sender_id,
        receiver_number,
        package_type,
        amount,
    } = args.deserialize()?;
    if !package_type.trim().eq_ignore_ascii_case(GIFT_TYPE_INTERNET) {
        return Ok(OperationResult::failure(
            "Only internet packages can be sent as gifts.",
        ));
    }
    if !(1..=MAX_GIFT_GB).contains(&amount) {
        return Ok(OperationResult::failure(format!(
            "Gift amount must be between 1 and {MAX_GIFT_GB} GB."
        )));
    }
    let total = f64::from(GIFT_PRICE_PER_GB) * amount as f64;
    let receiver_number = normalize_phone(&receiver_number);

    store.with_records(|records| -> Result<OperationResult, OperationError> {
        let Some(sender) = records.iter().position(|s| s.matches(&sender_id)) else {
            return Ok(OperationResult::failure("Sender not found."));
        };
        let Some(receiver) = records.iter().position(|s| {
            s.phone_number
                .as_deref()
                .is_some_and(|p| normalize_phone(p) == receiver_number)
        }) else {
            return Ok(OperationResult::failure("Receiver not found."));
        };

        let sender_name = records[sender].name.clone();
        let Some(bill) = open_bill(&mut records[sender].bills) else {
            return Ok(OperationResult::failure("No open bill to charge the gift to."));
        };
        charge_gift(bill, amount, total);
        let updated_bill = serde_json::to_value(&*bill)?;

        let receiver = &mut records[receiver];
        credit_gift(receiver, amount, &sender_name);
        Ok(OperationResult::ok()
            .with_message(format!(
                "{amount} GB sent to {}. {total:.2} TL added to the bill.",
                receiver.name
            ))
            .with_field("updated_bill", updated_bill))
    })
}
