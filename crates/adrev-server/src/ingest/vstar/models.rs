//! VStar record and column layout

use serde::Serialize;

/// Columns in a VStar export
pub const COLUMN_COUNT: usize = 13;

pub(crate) mod column {
    pub const DATE: usize = 0;
    pub const NETWORK: usize = 1;
    pub const VENUE_ID: usize = 2;
    pub const VENUE_NAME: usize = 3;
    pub const ADVERTISER: usize = 4;
    pub const CAMPAIGN_ID: usize = 5;
    pub const CAMPAIGN_NAME: usize = 6;
    pub const CREATIVE_ID: usize = 7;
    pub const CREATIVE_NAME: usize = 8;
    pub const SPOTS: usize = 9;
    pub const IMPRESSIONS: usize = 10;
    pub const REVENUE: usize = 11;
    pub const ECPM: usize = 12;
}

/// One accepted VStar row, all text until the procedure call is built
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VStarRecord {
    pub report_date: String,
    pub network: String,
    pub venue_id: String,
    pub venue_name: String,
    pub advertiser: String,
    pub campaign_id: String,
    pub campaign_name: String,
    pub creative_id: String,
    pub creative_name: String,
    pub spots: String,
    pub impressions: String,
    pub revenue: String,
    pub ecpm: String,
    pub filename: String,
}
