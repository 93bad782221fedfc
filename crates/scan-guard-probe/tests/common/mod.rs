//! Shared probe backends for probe-layer integration tests.

use std::sync::Mutex;
use std::time::Duration;

use scan_guard_core::ProbeResult;
use scan_guard_probe::{ProbeBackend, ProbeError, ProbeRequest};

/// Backend that never answers within any sane bound.
#[allow(dead_code)]
pub struct HangingBackend;

impl ProbeBackend for HangingBackend {
    async fn probe(&self, _request: ProbeRequest) -> Result<ProbeResult, ProbeError> {
        tokio::time::sleep(Duration::from_secs(3_600)).await;
        Ok(ProbeResult::clean())
    }
}

/// Backend failing with a scripted error for the first `failures` attempts.
#[allow(dead_code)]
pub struct FlakyBackend {
    pub failures: u32,
    pub error: ProbeError,
    pub attempts: Mutex<u32>,
    pub result: ProbeResult,
}

#[allow(dead_code)]
impl FlakyBackend {
    pub fn new(failures: u32, error: ProbeError, result: ProbeResult) -> Self {
        Self {
            failures,
            error,
            attempts: Mutex::new(0),
            result,
        }
    }

    pub fn attempts(&self) -> u32 {
        *self.attempts.lock().expect("attempt lock should work")
    }
}

impl ProbeBackend for FlakyBackend {
    async fn probe(&self, _request: ProbeRequest) -> Result<ProbeResult, ProbeError> {
        let attempt = {
            let mut attempts = self.attempts.lock().expect("attempt lock should work");
            *attempts += 1;
            *attempts
        };
        if attempt <= self.failures {
            Err(self.error.clone())
        } else {
            Ok(self.result.clone())
        }
    }
}
