pub mod enums;
pub mod plans;
pub mod services;
pub mod subscriptions;
