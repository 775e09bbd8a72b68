pub mod cancellation_reasons;
pub mod subscription_statuses;
