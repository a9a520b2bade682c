//! PlaceExchange column layouts
//!
//! Exports come in two shapes that differ only by a `Creative ID` column
//! between `Brand` and `Plays`. The layout is chosen once per file and rows are
//! mapped through the matching index table.

use crate::ingest::framework::csv_line::split_line;

pub const CREATIVE_ID_HEADER: &str = "Creative ID";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnLayout {
    /// 16 columns
    WithCreativeId,
    /// 15 columns
    WithoutCreativeId,
}

/// Column position of every field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldIndex {
    pub organization: usize,
    pub network: usize,
    pub ad_unit_name: usize,
    pub ad_unit_id: usize,
    pub venue_type: usize,
    pub deal_id: usize,
    pub deal_name: usize,
    pub buyer: usize,
    pub advertiser: usize,
    pub brand: usize,
    pub creative_id: Option<usize>,
    pub plays: usize,
    pub impressions: usize,
    pub revenue: usize,
    pub ecpm: usize,
    pub currency: usize,
}

const WITH_CREATIVE_ID: FieldIndex = FieldIndex {
    organization: 0,
    network: 1,
    ad_unit_name: 2,
    ad_unit_id: 3,
    venue_type: 4,
    deal_id: 5,
    deal_name: 6,
    buyer: 7,
    advertiser: 8,
    brand: 9,
    creative_id: Some(10),
    plays: 11,
    impressions: 12,
    revenue: 13,
    ecpm: 14,
    currency: 15,
};

const WITHOUT_CREATIVE_ID: FieldIndex = FieldIndex {
    organization: 0,
    network: 1,
    ad_unit_name: 2,
    ad_unit_id: 3,
    venue_type: 4,
    deal_id: 5,
    deal_name: 6,
    buyer: 7,
    advertiser: 8,
    brand: 9,
    creative_id: None,
    plays: 10,
    impressions: 11,
    revenue: 12,
    ecpm: 13,
    currency: 14,
};

impl ColumnLayout {
    /// CSV: `Creative ID` anywhere in the header selects the wider layout
    pub fn from_header(header: &str) -> Self {
        let has_creative_id = split_line(header)
            .iter()
            .any(|column| column.eq_ignore_ascii_case(CREATIVE_ID_HEADER));

        if has_creative_id {
            ColumnLayout::WithCreativeId
        } else {
            ColumnLayout::WithoutCreativeId
        }
    }

    /// XLSX: decided by the sheet width
    pub fn from_width(width: usize) -> Self {
        if width >= ColumnLayout::WithCreativeId.column_count() {
            ColumnLayout::WithCreativeId
        } else {
            ColumnLayout::WithoutCreativeId
        }
    }

    pub fn column_count(&self) -> usize {
        match self {
            ColumnLayout::WithCreativeId => 16,
            ColumnLayout::WithoutCreativeId => 15,
        }
    }

    pub fn fields(&self) -> &'static FieldIndex {
        match self {
            ColumnLayout::WithCreativeId => &WITH_CREATIVE_ID,
            ColumnLayout::WithoutCreativeId => &WITHOUT_CREATIVE_ID,
        }
    }
}
