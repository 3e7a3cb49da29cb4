use serde_json::{Value, json};
use teleagent_core::operation::{OperationSpec, ParamKind, ParamSpec, ValidatedArgs, validate_args};

use crate::model::{Package, Subscriber};
use crate::store::SubscriberStore;

pub(crate) fn subscribers() -> Value {
    json!([
        {
            "tc_no": "12345678901",
            "customer_id": "CUST-1",
            "phone_number": "0532 123 45 67",
            "name": "Ayşe Yılmaz",
            "occupation": "Öğrenci",
            "current_package": "Genç 10GB",
            "payment_status": "Ödendi",
            "contract_end_date": "2025-12-31",
            "address": {"street": "Kıbrıs Şehitleri Cd. 12", "city": "İzmir", "zip_code": "35220"},
            "bills": [
                {"bill_id": "B-1", "bill_date": "2024-05-01", "amount": 150.5, "status": "Ödendi"},
                {"bill_id": "B-2", "bill_date": "2024-06-01", "amount": 180.0, "status": "Beklemede"}
            ],
            "appointments": [
                {"appointment_id": "support-41", "issue": "slow internet", "date": "2024-05-10", "time": "10:00", "status": "Done"},
                {"appointment_id": "support-42", "issue": "no signal", "date": "2024-06-02", "time": "14:30", "status": "Planned"}
            ]
        },
        {
            "tc_no": "98765432109",
            "phone_number": "05559876543",
            "name": "Mehmet Kaya",
            "current_package": "Standart 5GB",
            "payment_status": "Gecikmiş",
            "address": {"street": "İskele Cd. 3", "city": "Van", "zip_code": "65000"}
        }
    ])
}

pub(crate) fn packages() -> Value {
    json!([
        {"name": "Genç 10GB", "allowed_groups": ["öğrenci"], "price": 150},
        {"name": "Öğrenci 20GB", "allowed_groups": ["Öğrenci"], "price": 200},
        {"name": "Standart 5GB", "price": 120},
        {"name": "Ekonomik 3GB", "price": 90},
        {"name": "Esnaf 50GB", "allowed_groups": ["esnaf"], "price": 400}
    ])
}

pub(crate) fn store() -> SubscriberStore {
    let subscribers: Vec<Subscriber> = serde_json::from_value(subscribers()).unwrap();
    let packages: Vec<Package> = serde_json::from_value(packages()).unwrap();
    SubscriberStore::new(subscribers, packages)
}

fn kind_of(value: &Value) -> ParamKind {
    match value {
        Value::Bool(_) => ParamKind::Boolean,
        Value::Number(n) if n.is_f64() => ParamKind::Number,
        Value::Number(_) => ParamKind::Integer,
        Value::Object(_) => ParamKind::Object,
        Value::Array(_) => ParamKind::array(ParamKind::String),
        _ => ParamKind::String,
    }
}

/// Arguments validated against a spec that declares exactly the given keys.
pub(crate) fn args(value: Value) -> ValidatedArgs {
    let Value::Object(map) = value else {
        panic!("test arguments must be an object");
    };
    let spec = map.iter().fold(OperationSpec::new("test", ""), |spec, (name, value)| {
        spec.with_param(ParamSpec::optional(name.clone(), kind_of(value), ""))
    });
    validate_args(&spec, &map).unwrap()
}
