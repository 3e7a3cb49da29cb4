//! Declarative table of telecom operations.

use std::sync::Arc;

use log::debug;
use teleagent_core::operation::{
    OperationRegistry, OperationSpec, ParamKind, ParamSpec, RegistryError,
};

use crate::operations::{
    Handler, TelecomOperation, account, billing, lines, services, support, usage,
};
use crate::store::SubscriberStore;

const USER_IDENTIFIER: &str = "user_identifier";

fn user_param() -> ParamSpec {
    ParamSpec::required(
        USER_IDENTIFIER,
        ParamKind::String,
        "National id number, customer id or phone number of the subscriber.",
    )
}

fn user_op(name: &str, description: &str) -> OperationSpec {
    OperationSpec::new(name, description).with_param(user_param())
}

fn reason_op(name: &str, description: &str) -> OperationSpec {
    user_op(name, description).with_param(ParamSpec::required(
        "reason",
        ParamKind::String,
        "Reason given by the subscriber.",
    ))
}

fn optional_text(name: &str, description: &str) -> ParamSpec {
    ParamSpec::optional(name, ParamKind::String, description)
}

/// Every telecom operation with its handler, in registration order.
pub fn catalog() -> Vec<(OperationSpec, Handler)> {
    vec![
        (
            user_op(
                "getUserInfo",
                "Looks up a subscriber by national id, customer id or phone number.",
            ),
            account::get_user_info,
        ),
        (
            user_op(
                "getAvailablePackages",
                "Lists packages available for the subscriber's occupation group.",
            ),
            account::get_available_packages,
        ),
        (
            user_op(
                "initiatePackageChange",
                "Switches the subscriber to a new package. Refused while a bill is overdue.",
            )
            .with_param(ParamSpec::required(
                "new_package_name",
                ParamKind::String,
                "Name of the new package.",
            )),
            account::initiate_package_change,
        ),
        (
            user_op(
                "getBillDetails",
                "Returns the subscriber's bills, optionally filtered by bill id or period.",
            )
            .with_param(ParamSpec::optional(
                "bill_id",
                ParamKind::String,
                "Bill id to look up.",
            ))
            .with_param(ParamSpec::optional(
                "period",
                ParamKind::String,
                "'son' or 'latest' for the most recent bill, anything else for all bills.",
            )),
            billing::get_bill_details,
        ),
        (
            user_op("activateEsim", "Activates eSIM on the subscriber's line."),
            services::activate_esim,
        ),
        (
            user_op("deactivateEsim", "Deactivates eSIM on the subscriber's line."),
            services::deactivate_esim,
        ),
        (
            user_op(
                "activateInternationalRoaming",
                "Enables international roaming.",
            ),
            services::activate_international_roaming,
        ),
        (
            user_op(
                "enable5G",
                "Switches the line to 5G (Istanbul, Ankara and Izmir only).",
            ),
            services::enable_5g,
        ),
        (
            user_op(
                "blockIncomingNumber",
                "Blocks calls from a number.",
            )
            .with_param(ParamSpec::required(
                "target_number",
                ParamKind::String,
                "Number to block, 05XXXXXXXXX.",
            )),
            services::block_incoming_number,
        ),
        (
            user_op(
                "unblockIncomingNumber",
                "Removes a number from the block list.",
            )
            .with_param(ParamSpec::required(
                "target_number",
                ParamKind::String,
                "Number to unblock, 05XXXXXXXXX.",
            )),
            services::unblock_incoming_number,
        ),
        (
            user_op(
                "getSupportTicketStatus",
                "Returns the status of the subscriber's latest support ticket.",
            ),
            support::get_support_ticket_status,
        ),
        (
            user_op(
                "pausePackageTemporarily",
                "Pauses the current package for a number of days.",
            )
            .with_param(ParamSpec::required(
                "duration_days",
                ParamKind::Integer,
                "Pause length in days.",
            ))
            .with_param(ParamSpec::required(
                "reason",
                ParamKind::String,
                "Reason for the pause.",
            )),
            account::pause_package_temporarily,
        ),
        (
            user_op(
                "requestInstallmentPlan",
                "Splits an amount into monthly installments.",
            )
            .with_param(ParamSpec::required(
                "total_amount",
                ParamKind::Number,
                "Total amount.",
            ))
            .with_param(ParamSpec::required(
                "installments",
                ParamKind::Integer,
                "Number of installments.",
            )),
            billing::request_installment_plan,
        ),
        (
            OperationSpec::new(
                "checkInfrastructure",
                "Reports which infrastructure is available at an address.",
            )
            .with_param(ParamSpec::required(
                "address",
                ParamKind::String,
                "Full address.",
            )),
            support::check_infrastructure,
        ),
        (
            user_op(
                "scheduleInternetRelocation",
                "Moves the internet service to a new address.",
            )
            .with_param(ParamSpec::required(
                "new_address",
                ParamKind::Object,
                "New address with street, city and zip_code.",
            )),
            support::schedule_internet_relocation,
        ),
        (
            OperationSpec::new(
                "checkServiceAvailability",
                "Checks whether a service is offered at an address or at the subscriber's address.",
            )
            .with_param(optional_text("address_street", "Street."))
            .with_param(optional_text("address_city", "City."))
            .with_param(optional_text("address_zip_code", "Postal code."))
            .with_param(optional_text(
                USER_IDENTIFIER,
                "Subscriber whose address is used when no city is given.",
            ))
            .with_param(optional_text(
                "service_type",
                "Service to check, e.g. 'Fiber Internet'.",
            )),
            support::check_service_availability,
        ),
        (
            user_op(
                "scheduleTechnicalSupport",
                "Books a technician visit on a weekday between 09:00 and 17:00.",
            )
            .with_param(ParamSpec::required(
                "issue_description",
                ParamKind::String,
                "Description of the problem.",
            ))
            .with_param(ParamSpec::required(
                "preferred_date",
                ParamKind::String,
                "YYYY-MM-DD.",
            ))
            .with_param(ParamSpec::required(
                "preferred_time",
                ParamKind::String,
                "HH:MM.",
            )),
            support::schedule_technical_support,
        ),
        (
            reason_op(
                "cancelSubscription",
                "Cancels the subscription and removes the current package.",
            ),
            lines::cancel_subscription,
        ),
        (
            user_op("getUsageHistory", "Returns the subscriber's usage history.")
                .with_param(optional_text("period", "Period, e.g. 'last 3 months'.")),
            usage::get_usage_history,
        ),
        (
            reason_op(
                "suspendLineDueToLoss",
                "Suspends the line after the phone or SIM is lost or stolen.",
            ),
            lines::suspend_line_due_to_loss,
        ),
        (
            user_op(
                "removeDataRestriction",
                "Lifts the international data restriction.",
            ),
            services::remove_data_restriction,
        ),
        (
            user_op("activateChildProfile", "Turns on the child profile."),
            services::activate_child_profile,
        ),
        (
            user_op("deactivateChildProfile", "Turns off the child profile."),
            services::deactivate_child_profile,
        ),
        (
            user_op("getCallHistory", "Returns the most recent call records."),
            usage::get_call_history,
        ),
        (
            user_op(
                "checkServiceStatus",
                "Reports the line and service status.",
            ),
            lines::check_service_status,
        ),
        (
            user_op(
                "addAuthorizedContact",
                "Adds a person allowed to act on the subscriber's behalf.",
            )
            .with_param(ParamSpec::required(
                "name",
                ParamKind::String,
                "Contact name.",
            ))
            .with_param(ParamSpec::required(
                "phone",
                ParamKind::String,
                "Contact phone number.",
            )),
            services::add_authorized_contact,
        ),
        (
            user_op(
                "requestNumberPorting",
                "Records a request to port the number in from another operator.",
            )
            .with_param(ParamSpec::required(
                "current_operator",
                ParamKind::String,
                "Operator the number is ported from.",
            ))
            .with_param(ParamSpec::required(
                "reason",
                ParamKind::String,
                "Reason given by the subscriber.",
            )),
            lines::request_number_porting,
        ),
        (
            reason_op(
                "requestNumberChange",
                "Assigns the subscriber a new, unused phone number.",
            ),
            lines::request_number_change,
        ),
        (
            OperationSpec::new(
                "sendGiftPackage",
                "Sends internet data to another subscriber, charged to the sender's open bill.",
            )
            .with_param(ParamSpec::required(
                "sender_id",
                ParamKind::String,
                "National id, customer id or phone number of the sender.",
            ))
            .with_param(ParamSpec::required(
                "receiver_number",
                ParamKind::String,
                "Phone number of the receiver.",
            ))
            .with_param(ParamSpec::required(
                "package_type",
                ParamKind::String,
                "Only 'internet' is supported.",
            ))
            .with_param(ParamSpec::required(
                "amount",
                ParamKind::Integer,
                "Gigabytes to send, at most 10.",
            )),
            usage::send_gift_package,
        ),
        (
            user_op("getReceivedGifts", "Lists gift packages the subscriber received."),
            usage::get_received_gifts,
        ),
        (
            user_op(
                "checkContractEndDate",
                "Returns the contract end date and the days left.",
            ),
            lines::check_contract_end_date,
        ),
        (
            user_op("freezeLine", "Freezes the line.")
                .with_param(optional_text("reason", "Reason for freezing.")),
            lines::freeze_line,
        ),
        (
            user_op("activateLine", "Reactivates a frozen or suspended line."),
            lines::activate_line,
        ),
        (
            reason_op(
                "deleteSubscription",
                "Closes the subscription.",
            ),
            lines::delete_subscription,
        ),
    ]
}

/// Register the whole catalog against `store`.
pub fn register_all(
    registry: &mut OperationRegistry,
    store: Arc<SubscriberStore>,
) -> Result<(), RegistryError> {
    for (spec, handler) in catalog() {
        debug!("Registering telecom operation {}", spec.name);
        registry.register(TelecomOperation::new(spec, Arc::clone(&store), handler))?;
    }
    Ok(())
}

pub fn telecom_registry(store: Arc<SubscriberStore>) -> Result<OperationRegistry, RegistryError> {
    let mut registry = OperationRegistry::new();
    register_all(&mut registry, store)?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::store;
    use serde_json::json;

    fn registry() -> OperationRegistry {
        telecom_registry(Arc::new(store())).unwrap()
    }

    #[test]
    fn test_catalog_is_complete() {
        let registry = registry();
        assert_eq!(registry.len(), 34);
        assert_eq!(registry.tool_names()[0], "getUserInfo");
        assert!(registry.resolve("enable5G").is_ok());
    }

    #[test]
    fn test_registering_twice_fails() {
        let mut registry = registry();
        let err = register_all(&mut registry, Arc::new(store())).unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate(name) if name == "getUserInfo"));
    }

    #[test]
    fn test_invoke_through_registry() {
        let registry = registry();
        let args = registry
            .validate("enable5G", &json!({"user_identifier": "CUST-1"}))
            .unwrap();
        let result = registry.operation("enable5G").unwrap().invoke(&args).unwrap();
        assert!(result.success);
    }

    #[test]
    fn test_bare_string_binds_to_single_param() {
        let registry = registry();
        let args = registry.validate("getUserInfo", &json!("12345678901")).unwrap();
        assert_eq!(args.str(USER_IDENTIFIER), Some("12345678901"));
    }

    #[test]
    fn test_bare_string_binds_when_rest_is_optional() {
        let registry = registry();
        let args = registry.validate("getBillDetails", &json!("12345678901")).unwrap();
        assert_eq!(args.str(USER_IDENTIFIER), Some("12345678901"));
        assert_eq!(args.len(), 1);
        let result = registry.operation("getBillDetails").unwrap().invoke(&args).unwrap();
        assert!(result.success);

        // a second required parameter still needs an object
        let err = registry
            .validate("initiatePackageChange", &json!("12345678901"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::Validation(_)));
    }

    #[test]
    fn test_reason_is_optional_only_for_freeze() {
        let registry = registry();
        for name in ["cancelSubscription", "suspendLineDueToLoss", "deleteSubscription"] {
            assert!(registry.resolve(name).unwrap().param("reason").unwrap().required);
        }
        assert!(!registry.resolve("freezeLine").unwrap().param("reason").unwrap().required);
        assert_eq!(
            registry
                .resolve("checkServiceAvailability")
                .unwrap()
                .required_params()
                .count(),
            0
        );
    }

    #[test]
    fn test_gift_through_registry() {
        let registry = registry();
        let args = registry
            .validate(
                "sendGiftPackage",
                &json!({
                    "sender_id": "CUST-1",
                    "receiver_number": "05559876543",
                    "package_type": "internet",
                    "amount": 3
                }),
            )
            .unwrap();
        let result = registry.operation("sendGiftPackage").unwrap().invoke(&args).unwrap();
        assert!(result.success);

        let err = registry
            .validate(
                "sendGiftPackage",
                &json!({
                    "sender_id": "CUST-1",
                    "receiver_number": "05559876543",
                    "package_type": "internet",
                    "amount": "3"
                }),
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::Validation(_)));
    }

    #[test]
    fn test_relocation_needs_object() {
        let registry = registry();
        let err = registry
            .validate(
                "scheduleInternetRelocation",
                &json!({"user_identifier": "CUST-1", "new_address": "Ankara"}),
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::Validation(_)));
    }
}
