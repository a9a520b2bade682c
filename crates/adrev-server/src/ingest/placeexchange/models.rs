//! PlaceExchange record

use chrono::NaiveDate;
use serde::Serialize;

/// One accepted report row
///
/// Numeric columns stay as text; the procedure takes them as strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaceExchangeRecord {
    pub play_date: NaiveDate,
    pub organization: String,
    pub network: String,
    pub ad_unit_name: String,
    pub ad_unit_id: String,
    pub venue_type: String,
    pub deal_id: String,
    pub deal_name: String,
    pub buyer: String,
    pub advertiser: String,
    pub brand: String,
    /// Empty when the export has no `Creative ID` column
    pub creative_id: String,
    pub plays: String,
    pub impressions: String,
    pub revenue: String,
    pub ecpm: String,
    pub currency: String,
    /// Object key the row came from
    pub filename: String,
}
