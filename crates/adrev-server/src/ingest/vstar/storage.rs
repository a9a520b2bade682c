//! VStar stored procedure contract

use adrev_common::{AdrevError, Result};
use chrono::NaiveDate;

use crate::db::ProcedureCall;
use crate::ingest::framework::{FeedProcedures, ToProcedure};

use super::models::VStarRecord;

pub const PROCEDURES: FeedProcedures = FeedProcedures {
    upsert: "VStar_Set",
    get_filenames: "VStar_getFilename",
    set_filename: "VStar_setFilename",
    commit_catchup: "Vstar_CommitCatchup",
};

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// Parse a report date in any of the formats VStar exports use
pub fn parse_report_date(value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .ok_or_else(|| AdrevError::decode(format!("unrecognized report date {:?}", value)))
}

impl ToProcedure for VStarRecord {
    fn to_procedure(&self, procedure: &'static str) -> Result<ProcedureCall> {
        let report_date = parse_report_date(&self.report_date)?;

        Ok(ProcedureCall::new(procedure)
            .date("ReportDate", report_date)
            .text("Network", &self.network)
            .text("VenueId", &self.venue_id)
            .text("VenueName", &self.venue_name)
            .text("Advertiser", &self.advertiser)
            .text("CampaignId", &self.campaign_id)
            .text("CampaignName", &self.campaign_name)
            .text("CreativeId", &self.creative_id)
            .text("CreativeName", &self.creative_name)
            .text("Spots", &self.spots)
            .text("Impressions", &self.impressions)
            .text("Revenue", &self.revenue)
            .text("ECPM", &self.ecpm)
            .text("Filename", &self.filename))
    }
}
