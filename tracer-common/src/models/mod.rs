pub mod job_registry_item;
pub mod password_reset_otp;
pub mod throttleable_attempt;
pub mod user;
