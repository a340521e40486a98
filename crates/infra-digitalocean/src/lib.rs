// tfdeploy DigitalOcean Adapter
// Quota pre-flight against the provider's account API

mod quota_guard;
mod types;

pub use quota_guard::{DigitalOceanQuotaGuard, DEFAULT_API_URL, MAX_PAGES};
