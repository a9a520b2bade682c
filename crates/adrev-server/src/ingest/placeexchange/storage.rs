//! PlaceExchange stored procedure contract

use adrev_common::Result;

use crate::db::ProcedureCall;
use crate::ingest::framework::{FeedProcedures, ToProcedure};

use super::models::PlaceExchangeRecord;

pub const PROCEDURES: FeedProcedures = FeedProcedures {
    upsert: "PlaceExchangeFeed_Set",
    get_filenames: "PlaceExchange_getFilename",
    set_filename: "PlaceExchange_setFilename",
    commit_catchup: "PlaceExchangeCommitCatchup",
};

impl ToProcedure for PlaceExchangeRecord {
    fn to_procedure(&self, procedure: &'static str) -> Result<ProcedureCall> {
        Ok(ProcedureCall::new(procedure)
            .date("PlayDate", self.play_date)
            .text("Organization", &self.organization)
            .text("Network", &self.network)
            .text("AdUnitName", &self.ad_unit_name)
            .text("AdUnitId", &self.ad_unit_id)
            .text("VenueType", &self.venue_type)
            .text("DealId", &self.deal_id)
            .text("DealName", &self.deal_name)
            .text("Buyer", &self.buyer)
            .text("Advertiser", &self.advertiser)
            .text("Brand", &self.brand)
            .text("CreativeId", &self.creative_id)
            .text("Plays", &self.plays)
            .text("Impressions", &self.impressions)
            .text("Revenue", &self.revenue)
            .text("ECPM", &self.ecpm)
            .text("Currency", &self.currency)
            .text("Filename", &self.filename))
    }
}
