pub mod services;
pub mod subscriptions;
