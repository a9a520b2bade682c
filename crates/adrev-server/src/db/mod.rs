//! Stored procedure access
//!
//! Everything the service writes to SQL Server goes through a named stored
//! procedure. A call is described by a [`ProcedureCall`] (procedure name plus
//! ordered, named parameters) and run by a [`ProcedureExecutor`]. The
//! production executor is [`sqlserver::SqlServerExecutor`]; the tests use
//! [`recording::RecordingExecutor`].

use adrev_common::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

pub mod recording;
pub mod sqlserver;

pub use recording::RecordingExecutor;
pub use sqlserver::SqlServerExecutor;

/// A typed stored procedure argument
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Date(NaiveDate),
    Int(i64),
    Decimal(f64),
}

/// One stored procedure invocation
#[derive(Debug, Clone, PartialEq)]
pub struct ProcedureCall {
    pub name: &'static str,
    pub params: Vec<(&'static str, SqlParam)>,
}

impl ProcedureCall {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            params: Vec::new(),
        }
    }

    pub fn text(mut self, param: &'static str, value: impl Into<String>) -> Self {
        self.params.push((param, SqlParam::Text(value.into())));
        self
    }

    pub fn date(mut self, param: &'static str, value: NaiveDate) -> Self {
        self.params.push((param, SqlParam::Date(value)));
        self
    }

    pub fn int(mut self, param: &'static str, value: i64) -> Self {
        self.params.push((param, SqlParam::Int(value)));
        self
    }

    pub fn decimal(mut self, param: &'static str, value: f64) -> Self {
        self.params.push((param, SqlParam::Decimal(value)));
        self
    }

    /// Look up a parameter by name
    pub fn param(&self, name: &str) -> Option<&SqlParam> {
        self.params
            .iter()
            .find(|(param, _)| *param == name)
            .map(|(_, value)| value)
    }

    /// Render as `EXEC name @A = @P1, @B = @P2`
    ///
    /// Values are always bound positionally; only the procedure and parameter
    /// names appear in the statement text.
    pub fn sql(&self) -> String {
        if self.params.is_empty() {
            return format!("EXEC {}", self.name);
        }

        let bindings = self
            .params
            .iter()
            .enumerate()
            .map(|(i, (param, _))| format!("@{} = @P{}", param, i + 1))
            .collect::<Vec<_>>()
            .join(", ");

        format!("EXEC {} {}", self.name, bindings)
    }
}

/// Runs stored procedures
#[async_trait]
pub trait ProcedureExecutor: Send + Sync {
    /// Execute a procedure for its side effects, returning the affected row count
    async fn execute(&self, call: &ProcedureCall) -> Result<u64>;

    /// First column of the first result set, as text
    async fn query_text(&self, call: &ProcedureCall) -> Result<Vec<String>>;

    /// First column of the first row, as a date
    async fn query_date(&self, call: &ProcedureCall) -> Result<Option<NaiveDate>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_without_params() {
        let call = ProcedureCall::new("PlaceExchangeCommitCatchup");
        assert_eq!(call.sql(), "EXEC PlaceExchangeCommitCatchup");
    }

    #[test]
    fn test_sql_binds_named_params_positionally() {
        let call = ProcedureCall::new("VStar_setFilename")
            .text("Filename", "daily/vstar_2024-03-15.csv")
            .int("Attempt", 1);

        assert_eq!(call.sql(), "EXEC VStar_setFilename @Filename = @P1, @Attempt = @P2");
        assert_eq!(
            call.param("Filename"),
            Some(&SqlParam::Text("daily/vstar_2024-03-15.csv".to_string()))
        );
        assert_eq!(call.param("Missing"), None);
    }
}
