pub mod cancellations;
pub mod plan_transitions;
pub mod quota_remediation;
pub mod subscription_overview;
