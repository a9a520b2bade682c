//! Recording executor used as the database stand-in in tests

use adrev_common::{AdrevError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Mutex;

use super::{ProcedureCall, ProcedureExecutor};

/// Records every call and answers queries from canned results
#[derive(Default)]
pub struct RecordingExecutor {
    calls: Mutex<Vec<ProcedureCall>>,
    text_results: HashMap<&'static str, Vec<String>>,
    date_results: HashMap<&'static str, NaiveDate>,
    /// Remaining failures per procedure; `None` fails forever
    failures: Mutex<HashMap<&'static str, Option<usize>>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text_rows(mut self, procedure: &'static str, rows: Vec<String>) -> Self {
        self.text_results.insert(procedure, rows);
        self
    }

    pub fn with_date(mut self, procedure: &'static str, date: NaiveDate) -> Self {
        self.date_results.insert(procedure, date);
        self
    }

    /// Every call to `procedure` fails with a database error
    pub fn failing(self, procedure: &'static str) -> Self {
        self.set_failure(procedure, None);
        self
    }

    /// The next `times` calls to `procedure` fail, later calls succeed
    pub fn failing_times(self, procedure: &'static str, times: usize) -> Self {
        self.set_failure(procedure, Some(times));
        self
    }

    /// Stop failing `procedure`
    pub fn recover(&self, procedure: &'static str) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.remove(procedure);
        }
    }

    fn set_failure(&self, procedure: &'static str, times: Option<usize>) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.insert(procedure, times);
        }
    }

    pub fn calls(&self) -> Vec<ProcedureCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn calls_to(&self, procedure: &str) -> Vec<ProcedureCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.name == procedure)
            .collect()
    }

    pub fn count(&self, procedure: &str) -> usize {
        self.calls_to(procedure).len()
    }

    fn record(&self, call: &ProcedureCall) -> Result<()> {
        self.calls
            .lock()
            .map_err(|_| AdrevError::Database("recording poisoned".into()))?
            .push(call.clone());

        let mut failures = self
            .failures
            .lock()
            .map_err(|_| AdrevError::Database("recording poisoned".into()))?;

        match failures.get_mut(call.name) {
            Some(None) => Err(AdrevError::Database(format!("{} failed", call.name))),
            Some(Some(remaining)) if *remaining > 0 => {
                *remaining -= 1;
                Err(AdrevError::Database(format!("{} failed", call.name)))
            },
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl ProcedureExecutor for RecordingExecutor {
    async fn execute(&self, call: &ProcedureCall) -> Result<u64> {
        self.record(call)?;
        Ok(1)
    }

    async fn query_text(&self, call: &ProcedureCall) -> Result<Vec<String>> {
        self.record(call)?;
        Ok(self.text_results.get(call.name).cloned().unwrap_or_default())
    }

    async fn query_date(&self, call: &ProcedureCall) -> Result<Option<NaiveDate>> {
        self.record(call)?;
        Ok(self.date_results.get(call.name).copied())
    }
}
