use chrono::{Datelike, Local, NaiveDateTime, Timelike, Weekday};
use serde::Deserialize;
use serde_json::{Value, json};
use teleagent_core::operation::{OperationError, OperationResult, ValidatedArgs};

use super::{UserArgs, not_found};
use crate::model::{Address, Appointment, normalize_place};
use crate::store::SubscriberStore;

const APPOINTMENT_FORMAT: &str = "%Y-%m-%d %H:%M";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Cities with fiber coverage; everything else is served over VDSL.
pub const FIBER_CITIES: [&str; 3] = ["ankara", "izmir", "istanbul"];

pub const RELOCATION_TICKET: &str = "internet_relocation";
pub const SUPPORT_TICKET_PREFIX: &str = "support-";
/// Technicians work weekdays from 09:00 until 17:00.
pub const SUPPORT_HOURS: std::ops::Range<u32> = 9..17;
const DEFAULT_SERVICE_TYPE: &str = "Fiber Internet";
pub const STATUS_PLANNED: &str = "Planned";

/// Latest appointment by date and time. Entries without a slot (relocation
/// requests) only count when nothing else is scheduled.
fn latest_appointment(appointments: &[Appointment]) -> Result<Option<&Appointment>, String> {
    let mut latest: Option<(NaiveDateTime, &Appointment)> = None;
    for appointment in appointments {
        let (Some(date), Some(time)) = (&appointment.date, &appointment.time) else {
            continue;
        };
        let slot = format!("{date} {time}");
        let at = NaiveDateTime::parse_from_str(&slot, APPOINTMENT_FORMAT)
            .map_err(|_| format!("Unreadable appointment slot '{slot}'."))?;
        if latest.is_none_or(|(current, _)| at > current) {
            latest = Some((at, appointment));
        }
    }
    Ok(latest.map(|(_, a)| a).or_else(|| appointments.last()))
}

pub fn get_support_ticket_status(
    store: &SubscriberStore,
    args: &ValidatedArgs,
) -> Result<OperationResult, OperationError> {
    let UserArgs { user_identifier } = args.deserialize()?;
    let Some(subscriber) = store.find(&user_identifier) else {
        return Ok(not_found());
    };

    let ticket = match latest_appointment(&subscriber.appointments) {
        Ok(Some(ticket)) => ticket,
        Ok(None) => return Ok(OperationResult::failure("No support tickets on record.")),
        Err(message) => return Ok(OperationResult::failure(message)),
    };

    Ok(OperationResult::ok()
        .with_message("Latest support ticket.")
        .with_field(
            "ticket",
            json!({
                "ticket_id": ticket.appointment_id,
                "type": ticket.kind,
                "status": ticket.status,
                "created_at": ticket.created_at,
                "description": ticket.issue,
            }),
        ))
}

#[derive(Deserialize)]
struct InfrastructureArgs {
    address: String,
}

pub fn check_infrastructure(
    _store: &SubscriberStore,
    args: &ValidatedArgs,
) -> Result<OperationResult, OperationError> {
    let InfrastructureArgs { address } = args.deserialize()?;
    let place = normalize_place(&address);
    if place.is_empty() {
        return Ok(OperationResult::failure("Address must not be empty."));
    }

    let infrastructure = if FIBER_CITIES.iter().any(|city| place.contains(city)) {
        "fiber"
    } else {
        "vdsl"
    };
    Ok(OperationResult::ok()
        .with_message(format!("{infrastructure} infrastructure is available."))
        .with_field("infrastructure", json!(infrastructure)))
}

#[derive(Deserialize)]
struct RelocationArgs {
    user_identifier: String,
    new_address: Address,
}

pub fn schedule_internet_relocation(
    store: &SubscriberStore,
    args: &ValidatedArgs,
) -> Result<OperationResult, OperationError> {
    let RelocationArgs {
        user_identifier,
        new_address,
    } = args.deserialize()?;

    let missing: Vec<&str> = [
        ("street", &new_address.street),
        ("city", &new_address.city),
        ("zip_code", &new_address.zip_code),
    ]
    .into_iter()
    .filter(|(_, value)| value.trim().is_empty())
    .map(|(field, _)| field)
    .collect();
    if !missing.is_empty() {
        return Ok(OperationResult::failure(format!(
            "new_address is missing: {}",
            missing.join(", ")
        )));
    }

    let requested_at = Local::now().format(TIMESTAMP_FORMAT).to_string();
    let outcome = store.update(&user_identifier, |subscriber| {
        let old_address = subscriber.address.replace(new_address.clone());

        let mut ticket = Appointment {
            kind: Some(RELOCATION_TICKET.to_string()),
            status: STATUS_PLANNED.to_string(),
            created_at: Some(requested_at.clone()),
            ..Appointment::default()
        };
        ticket
            .extra
            .insert("old_address".to_string(), json!(old_address));
        ticket
            .extra
            .insert("new_address".to_string(), json!(new_address));
        subscriber.appointments.push(ticket);

        OperationResult::ok().with_message(format!(
            "Internet relocation scheduled. New address: {}, {} ({})",
            new_address.street, new_address.city, new_address.zip_code
        ))
    });

    Ok(outcome.unwrap_or_else(|| {
        OperationResult::failure("Customer not found. Relocation was not scheduled.")
    }))
}

/// Next `support-N` id, one past the highest number already on record.
fn next_ticket_id(appointments: &[Appointment]) -> String {
    let highest = appointments
        .iter()
        .filter_map(|a| a.appointment_id.as_deref())
        .filter_map(|id| id.rsplit('-').next()?.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    format!("{SUPPORT_TICKET_PREFIX}{}", highest + 1)
}

#[derive(Deserialize)]
struct TechnicalSupportArgs {
    user_identifier: String,
    issue_description: String,
    preferred_date: String,
    preferred_time: String,
}

pub fn schedule_technical_support(
    store: &SubscriberStore,
    args: &ValidatedArgs,
) -> Result<OperationResult, OperationError> {
    let TechnicalSupportArgs {
        user_identifier,
        issue_description,
        preferred_date,
        preferred_time,
    } = args.deserialize()?;
    let (date, time) = (preferred_date.trim(), preferred_time.trim());

    let Ok(slot) = NaiveDateTime::parse_from_str(&format!("{date} {time}"), APPOINTMENT_FORMAT)
    else {
        return Ok(OperationResult::failure(
            "Date and time must be YYYY-MM-DD and HH:MM.",
        ));
    };
    if slot < Local::now().naive_local() {
        return Ok(OperationResult::failure(
            "Appointments cannot be booked in the past.",
        ));
    }
    if matches!(slot.weekday(), Weekday::Sat | Weekday::Sun) || !SUPPORT_HOURS.contains(&slot.hour())
    {
        return Ok(OperationResult::failure(
            "Appointments are available on weekdays between 09:00 and 17:00.",
        ));
    }

    let created_at = Local::now().format(TIMESTAMP_FORMAT).to_string();
    let outcome = store.update(&user_identifier, |subscriber| {
        let taken = subscriber.appointments.iter().any(|a| {
            a.date.as_deref() == Some(date) && a.time.as_deref() == Some(time)
        });
        if taken {
            return OperationResult::failure("An appointment already exists for this slot.");
        }

        let id = next_ticket_id(&subscriber.appointments);
        let mut appointment = Appointment {
            appointment_id: Some(id.clone()),
            issue: Some(issue_description.clone()),
            date: Some(date.to_string()),
            time: Some(time.to_string()),
            status: STATUS_PLANNED.to_string(),
            created_at: Some(created_at.clone()),
            ..Appointment::default()
        };
        appointment
            .extra
            .insert("active".to_string(), Value::Bool(true));
        let record = json!(appointment);
        subscriber.appointments.push(appointment);

        OperationResult::ok()
            .with_message(format!("Appointment booked. Tracking id: {id}"))
            .with_field("appointment", record)
    });
    Ok(outcome.unwrap_or_else(not_found))
}

#[derive(Deserialize)]
struct AvailabilityArgs {
    #[serde(default)]
    address_street: Option<String>,
    #[serde(default)]
    address_city: Option<String>,
    #[serde(default)]
    address_zip_code: Option<String>,
    #[serde(default)]
    user_identifier: Option<String>,
    #[serde(default)]
    service_type: Option<String>,
}

/// Fiber needs a fiber city; other services are offered everywhere. The city
/// comes from the arguments, or from the subscriber's address on record.
pub fn check_service_availability(
    store: &SubscriberStore,
    args: &ValidatedArgs,
) -> Result<OperationResult, OperationError> {
    let AvailabilityArgs {
        address_street,
        address_city,
        address_zip_code,
        user_identifier,
        service_type,
    } = args.deserialize()?;
    let service_type = service_type
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SERVICE_TYPE.to_string());

    let from_record = || {
        let subscriber = store.find(user_identifier.as_deref()?)?;
        subscriber.city().map(str::to_string)
    };
    let city = address_city
        .filter(|c| !c.trim().is_empty())
        .or_else(from_record)
        .map(|c| normalize_place(&c));
    let Some(city) = city else {
        return Ok(OperationResult::failure(
            "A city or a known subscriber is needed to check availability.",
        ));
    };

    let needs_fiber = service_type.to_lowercase().contains("fiber");
    let available = !needs_fiber || FIBER_CITIES.contains(&city.as_str());
    let address = [address_street, Some(city.clone()), address_zip_code]
        .into_iter()
        .flatten()
        .filter(|part| !part.trim().is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    let message = if available {
        format!("{service_type} is available at {address}.")
    } else {
        format!("{service_type} is not available at {address}.")
    };
    Ok(OperationResult::ok()
        .with_message(message)
        .with_field("available", Value::Bool(available))
        .with_field("service_type", Value::String(service_type)))
}
