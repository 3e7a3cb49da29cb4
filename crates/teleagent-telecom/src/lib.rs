//! Telecom self-service operations backed by an in-memory subscriber store.

pub mod catalog;
pub mod model;
pub mod operations;
pub mod store;

#[cfg(test)]
mod test_support;

pub use catalog::{catalog, register_all, telecom_registry};
pub use model::{Address, Appointment, AuthorizedContact, Bill, Package, Subscriber};
pub use operations::TelecomOperation;
pub use store::{StoreError, SubscriberStore};
