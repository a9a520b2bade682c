//! SpringServe stored procedure contract

use adrev_common::{AdrevError, Result};
use chrono::NaiveDate;
use std::sync::Arc;

use crate::db::{ProcedureCall, ProcedureExecutor};
use crate::ingest::framework::ToProcedure;

use super::models::SpringServeRecord;

pub const UPSERT_PROCEDURE: &str = "SpringserveReportDays_set";
pub const LAST_DAY_PROCEDURE: &str = "SpringserveReportDays_LastDay";

/// eCPM from revenue and impressions; zero when there were no impressions
pub fn ecpm(revenue: f64, impressions: i64) -> f64 {
    if impressions == 0 {
        0.0
    } else {
        revenue / impressions as f64 * 1000.0
    }
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate> {
    // The API may append a time component
    let day = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|e| AdrevError::decode(format!("{} {:?}: {}", field, value, e)))
}

// Exact f64 bounds of i64: [-2^63, 2^63)
const I64_LOWER: f64 = -9_223_372_036_854_775_808.0;
const I64_UPPER: f64 = 9_223_372_036_854_775_808.0;

fn parse_int(field: &str, value: &str) -> Result<i64> {
    if let Ok(n) = value.parse::<i64>() {
        return Ok(n);
    }
    match value.parse::<f64>() {
        Ok(f) if f.fract() == 0.0 && (I64_LOWER..I64_UPPER).contains(&f) => Ok(f as i64),
        _ => Err(AdrevError::decode(format!("{} {:?} is not an integer", field, value))),
    }
}

fn parse_decimal(field: &str, value: &str) -> Result<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .ok_or_else(|| AdrevError::decode(format!("{} {:?} is not a number", field, value)))
}

impl ToProcedure for SpringServeRecord {
    fn to_procedure(&self, procedure: &'static str) -> Result<ProcedureCall> {
        let report_date = parse_date("date", &self.report_date)?;
        let supply_tag_id = parse_int("supply_tag_id", &self.supply_tag_id)?;
        let demand_tag_id = parse_int("demand_tag_id", &self.demand_tag_id)?;
        let impressions = parse_int("impressions", &self.impressions)?;
        let revenue = parse_decimal("revenue", &self.revenue)?;

        Ok(ProcedureCall::new(procedure)
            .date("ReportDate", report_date)
            .int("SupplyTagId", supply_tag_id)
            .text("SupplyTagName", &self.supply_tag_name)
            .int("DemandTagId", demand_tag_id)
            .text("DemandTagName", &self.demand_tag_name)
            .text("VenueId", &self.venue)
            .text("ScreenId", &self.screen)
            .int("Impressions", impressions)
            .decimal("Revenue", revenue)
            .decimal("ECPM", ecpm(revenue, impressions)))
    }
}

/// Report-day persistence
pub struct SpringServeSink {
    executor: Arc<dyn ProcedureExecutor>,
}

impl SpringServeSink {
    pub fn new(executor: Arc<dyn ProcedureExecutor>) -> Self {
        Self { executor }
    }

    /// Most recent report day already stored
    pub async fn last_day(&self) -> Result<Option<NaiveDate>> {
        self.executor
            .query_date(&ProcedureCall::new(LAST_DAY_PROCEDURE))
            .await
    }

    pub async fn upsert(&self, record: &SpringServeRecord) -> Result<()> {
        let call = record.to_procedure(UPSERT_PROCEDURE)?;
        self.executor.execute(&call).await?;
        Ok(())
    }
}
