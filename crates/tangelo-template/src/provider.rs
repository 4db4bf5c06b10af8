//! External bank data provider boundary.

use std::collections::HashMap;
use std::time::Duration;

/// How long a single bank fetch may take before the engine gives up.
pub const DEFAULT_BANK_TIMEOUT: Duration = Duration::from_secs(2);

/// Request types the bank protocol defines. Anything else a template asks
/// for is still fetched, but a conforming provider answers `None`.
pub const RECOGNIZED_REQUESTS: [&str; 5] = [
    "ob_balance",
    "ob_deposited",
    "ob_networth",
    "ob_level",
    "ob_xp",
];

pub fn is_recognized_request(request: &str) -> bool {
    RECOGNIZED_REQUESTS.contains(&request)
}

/// One round trip to the external bank service.
///
/// `fetch` blocks for at most `timeout`. `None` covers every failure shape
/// (unreachable, late, or malformed response); the engine substitutes
/// `"N/A"` for it and keeps going.
pub trait BankProvider {
    fn fetch(&self, identity: u64, request: &str, timeout: Duration) -> Option<String>;
}

/// A provider with no backing service. Every fetch comes back empty.
pub struct NoBank;

impl BankProvider for NoBank {
    fn fetch(&self, _identity: u64, _request: &str, _timeout: Duration) -> Option<String> {
        None
    }
}

/// Fixed-table provider backed by an in-memory map, for tests and offline
/// operation.
#[derive(Default)]
pub struct StaticBank {
    entries: HashMap<(u64, String), String>,
}

impl StaticBank {
    pub fn new() -> Self {
        StaticBank::default()
    }

    pub fn insert(&mut self, identity: u64, request: &str, value: &str) {
        self.entries
            .insert((identity, request.to_string()), value.to_string());
    }
}

impl BankProvider for StaticBank {
    fn fetch(&self, identity: u64, request: &str, _timeout: Duration) -> Option<String> {
        if !is_recognized_request(request) {
            log::debug!("unrecognized bank request type: {request}");
            return None;
        }
        self.entries.get(&(identity, request.to_string())).cloned()
    }
}
