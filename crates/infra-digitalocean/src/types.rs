// DigitalOcean API response shapes (only the fields the quota check reads)

use serde::de::IgnoredAny;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct AccountResponse {
    pub account: Account,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Account {
    pub droplet_limit: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DropletsPage {
    #[serde(default)]
    pub droplets: Vec<IgnoredAny>,
    #[serde(default)]
    pub links: Links,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Links {
    #[serde(default)]
    pub pages: Option<Pages>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Pages {
    #[serde(default)]
    pub next: Option<String>,
}

impl DropletsPage {
    pub fn next_url(&self) -> Option<&str> {
        self.links.pages.as_ref()?.next.as_deref()
    }
}
