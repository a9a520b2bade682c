//! Shared fixtures for adrev server integration tests
//!
//! Nothing here needs a database or cloud account: SQL Server is replaced by
//! [`RecordingExecutor`] and object stores by [`MemoryStore`] or a wiremock
//! server speaking the Blob REST API.

#![allow(dead_code)]

use adrev_server::db::{ProcedureCall, RecordingExecutor, SqlParam};

pub const PLACEEXCHANGE_HEADER: &str = "Organization,Network,Ad Unit Name,Ad Unit ID,\
    Venue Type,Deal ID,Deal Name,Buyer,Advertiser,Brand,Creative ID,Plays,Impressions,\
    Revenue,eCPM,Currency";

pub const VSTAR_HEADER: &str = "Date,Network,Venue ID,Venue Name,Advertiser,Campaign ID,\
    Campaign Name,Creative ID,Creative Name,Spots,Impressions,Revenue,eCPM";

/// Initialize tracing for tests
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,adrev_server=debug")),
        )
        .with_test_writer()
        .try_init();
}

/// One PlaceExchange CSV row in the 16-column layout
pub fn placeexchange_row(organization: &str, ad_unit: &str, impressions: &str) -> String {
    format!(
        "{},Adrev DOOH,{},AU-{},Gym,D-1,Spring Deal,Buyer Co,Acme,Acme Cola,CR-9,120,\"{}\",14.40,12.00,USD",
        organization, ad_unit, ad_unit, impressions
    )
}

/// A whole PlaceExchange CSV export
pub fn placeexchange_csv(rows: &[String]) -> Vec<u8> {
    let mut content = String::from(PLACEEXCHANGE_HEADER);
    for row in rows {
        content.push('\n');
        content.push_str(row);
    }
    content.push('\n');
    content.into_bytes()
}

/// Text value of a named parameter, panicking if it is missing or not text
pub fn text_param<'a>(call: &'a ProcedureCall, name: &str) -> &'a str {
    match call.param(name) {
        Some(SqlParam::Text(value)) => value,
        other => panic!("{} on {} is {:?}", name, call.name, other),
    }
}

/// Filenames passed to a `*_setFilename` procedure, in call order
pub fn marked_filenames(executor: &RecordingExecutor, procedure: &str) -> Vec<String> {
    executor
        .calls_to(procedure)
        .iter()
        .map(|call| text_param(call, "Filename").to_string())
        .collect()
}
