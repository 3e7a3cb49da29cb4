use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use teleagent_core::operation::{OperationError, OperationResult, ValidatedArgs};

use super::not_found;
use crate::model::Bill;
use crate::store::SubscriberStore;

pub(crate) const BILL_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Deserialize)]
struct BillArgs {
    user_identifier: String,
    #[serde(default)]
    bill_id: Option<String>,
    #[serde(default)]
    period: Option<String>,
}

fn wants_latest(period: Option<&str>) -> bool {
    period.is_some_and(|p| {
        let p = p.trim().to_lowercase();
        p == "son" || p == "latest"
    })
}

/// The bill with the most recent `bill_date`.
fn latest_bill(bills: &[Bill]) -> Result<Option<&Bill>, String> {
    let mut latest: Option<(NaiveDate, &Bill)> = None;
    for bill in bills {
        let date = NaiveDate::parse_from_str(&bill.bill_date, BILL_DATE_FORMAT)
            .map_err(|_| format!("Unreadable bill date '{}'.", bill.bill_date))?;
        if latest.is_none_or(|(current, _)| date > current) {
            latest = Some((date, bill));
        }
    }
    Ok(latest.map(|(_, bill)| bill))
}

pub fn get_bill_details(
    store: &SubscriberStore,
    args: &ValidatedArgs,
) -> Result<OperationResult, OperationError> {
    let BillArgs {
        user_identifier,
        bill_id,
        period,
    } = args.deserialize()?;
    let Some(subscriber) = store.find(&user_identifier) else {
        return Ok(not_found());
    };

    if let Some(bill_id) = bill_id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
        return Ok(match subscriber.bills.iter().find(|b| b.bill_id == bill_id) {
            Some(bill) => OperationResult::ok().with_data(serde_json::to_value(bill)?),
            None => OperationResult::failure(format!("Bill '{bill_id}' not found.")),
        });
    }

    if subscriber.bills.is_empty() {
        return Ok(OperationResult::failure("No bills on record."));
    }

    if wants_latest(period.as_deref()) {
        return Ok(match latest_bill(&subscriber.bills) {
            Ok(Some(bill)) => OperationResult::ok().with_data(serde_json::to_value(bill)?),
            Ok(None) => OperationResult::failure("No bills on record."),
            Err(message) => OperationResult::failure(message),
        });
    }

    Ok(OperationResult::ok().with_data(serde_json::to_value(&subscriber.bills)?))
}

#[derive(Deserialize)]
struct InstallmentArgs {
    user_identifier: String,
    total_amount: f64,
    installments: i64,
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

pub fn request_installment_plan(
    store: &SubscriberStore,
    args: &ValidatedArgs,
) -> Result<OperationResult, OperationError> {
    let InstallmentArgs {
        user_identifier,
        total_amount,
        installments,
    } = args.deserialize()?;

    if store.find(&user_identifier).is_none() {
        return Ok(not_found());
    }
    if !total_amount.is_finite() || total_amount <= 0.0 {
        return Ok(OperationResult::failure("total_amount must be positive."));
    }
    if installments < 1 {
        return Ok(OperationResult::failure(
            "installments must be at least 1.",
        ));
    }

    let monthly = round_cents(total_amount / installments as f64);
    Ok(OperationResult::ok()
        .with_message(format!(
            "Installment plan created: {installments} payments of {monthly:.2}."
        ))
        .with_data(json!({
            "total_amount": total_amount,
            "installments": installments,
            "monthly_amount": monthly,
        })))
}
