//! SpringServe report-day record

use serde::Serialize;
use serde_json::Value;

use super::client::ReportRow;

pub const DEFAULT_VENUE_DIMENSION: &str = "venue_id";
pub const DEFAULT_SCREEN_DIMENSION: &str = "screen_id";

const DATE_KEY: &str = "date";
const SUPPLY_TAG_ID: &str = "supply_tag_id";
const SUPPLY_TAG_NAME: &str = "supply_tag_name";
const DEMAND_TAG_ID: &str = "demand_tag_id";
const DEMAND_TAG_NAME: &str = "demand_tag_name";
const IMPRESSIONS: &str = "impressions";
const REVENUE: &str = "revenue";

/// Names of the two custom dimensions every stored row must carry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomDimensions {
    pub venue: String,
    pub screen: String,
}

impl Default for CustomDimensions {
    fn default() -> Self {
        Self {
            venue: DEFAULT_VENUE_DIMENSION.to_string(),
            screen: DEFAULT_SCREEN_DIMENSION.to_string(),
        }
    }
}

impl CustomDimensions {
    /// Dimension list sent with every report request
    pub fn report_dimensions(&self) -> Vec<String> {
        vec![
            SUPPLY_TAG_ID.to_string(),
            SUPPLY_TAG_NAME.to_string(),
            DEMAND_TAG_ID.to_string(),
            DEMAND_TAG_NAME.to_string(),
            self.venue.clone(),
            self.screen.clone(),
        ]
    }
}

/// One report row, all text until the procedure call is built
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpringServeRecord {
    pub report_date: String,
    pub supply_tag_id: String,
    pub supply_tag_name: String,
    pub demand_tag_id: String,
    pub demand_tag_name: String,
    pub venue: String,
    pub screen: String,
    pub impressions: String,
    pub revenue: String,
}

impl SpringServeRecord {
    /// Map a report row, or `None` when either custom dimension is absent,
    /// null or blank
    pub fn from_row(row: &ReportRow, dimensions: &CustomDimensions) -> Option<Self> {
        let venue = text(row, &dimensions.venue).filter(|v| !v.is_empty())?;
        let screen = text(row, &dimensions.screen).filter(|v| !v.is_empty())?;
        let field = |key: &str| text(row, key).unwrap_or_default();

        Some(Self {
            report_date: field(DATE_KEY),
            supply_tag_id: field(SUPPLY_TAG_ID),
            supply_tag_name: field(SUPPLY_TAG_NAME),
            demand_tag_id: field(DEMAND_TAG_ID),
            demand_tag_name: field(DEMAND_TAG_NAME),
            venue,
            screen,
            impressions: field(IMPRESSIONS),
            revenue: field(REVENUE),
        })
    }
}

/// Trimmed text of a JSON value; `None` for absent or null
fn text(row: &ReportRow, key: &str) -> Option<String> {
    match row.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.trim().to_string()),
        other => Some(other.to_string()),
    }
}
