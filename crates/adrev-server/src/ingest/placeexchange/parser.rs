//! PlaceExchange CSV and XLSX decoding

use adrev_common::{AdrevError, Result};
use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use chrono::NaiveDate;
use std::io::Cursor;
use tracing::{debug, warn};

use crate::ingest::framework::csv_line::{header_and_rows, split_line};
use crate::ingest::framework::decoder::utf8;
use crate::ingest::framework::{Decoded, RecordDecoder};
use crate::storage::SourceObject;

use super::filename::{play_date_from_filename, DEFAULT_FILENAME_PREFIX};
use super::layout::ColumnLayout;
use super::models::PlaceExchangeRecord;

pub const DEFAULT_ORGANIZATION: &str = "Adrev";

/// Decodes PlaceExchange exports
///
/// `.xlsx` objects are read as workbooks, anything else as CSV. Rows are kept
/// only when their organization column equals the configured marker.
#[derive(Debug, Clone)]
pub struct PlaceExchangeDecoder {
    organization: String,
    filename_prefix: String,
}

impl Default for PlaceExchangeDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_ORGANIZATION, DEFAULT_FILENAME_PREFIX)
    }
}

impl PlaceExchangeDecoder {
    pub fn new(organization: impl Into<String>, filename_prefix: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
            filename_prefix: filename_prefix.into(),
        }
    }

    fn decode_csv(
        &self,
        object: &SourceObject,
        data: &[u8],
        play_date: NaiveDate,
    ) -> Result<Decoded<PlaceExchangeRecord>> {
        let mut decoded = Decoded::default();
        let Some((header, rows)) = header_and_rows(utf8(object, data)?) else {
            return Ok(decoded);
        };

        let layout = ColumnLayout::from_header(header);
        debug!(key = %object.key, ?layout, "Decoding CSV");

        for (line, text) in rows {
            self.push_row(&mut decoded, layout, split_line(text), object, play_date, line);
        }

        Ok(decoded)
    }

    fn decode_xlsx(
        &self,
        object: &SourceObject,
        data: &[u8],
        play_date: NaiveDate,
    ) -> Result<Decoded<PlaceExchangeRecord>> {
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(data))
            .map_err(|e| AdrevError::decode(format!("{} is not a readable workbook: {}", object.key, e)))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| AdrevError::decode(format!("{} has no worksheets", object.key)))?
            .map_err(|e| AdrevError::decode(format!("failed to read first sheet of {}: {}", object.key, e)))?;

        let layout = ColumnLayout::from_width(range.width());
        debug!(key = %object.key, ?layout, rows = range.height(), "Decoding workbook");

        let mut decoded = Decoded::default();
        for (i, row) in range.rows().enumerate() {
            if row.iter().all(|cell| matches!(cell, Data::Empty)) {
                continue;
            }
            let fields = row.iter().map(cell_text).collect();
            self.push_row(&mut decoded, layout, fields, object, play_date, i + 1);
        }

        Ok(decoded)
    }

    fn push_row(
        &self,
        decoded: &mut Decoded<PlaceExchangeRecord>,
        layout: ColumnLayout,
        fields: Vec<String>,
        object: &SourceObject,
        play_date: NaiveDate,
        line: usize,
    ) {
        if fields.len() < layout.column_count() {
            warn!(
                key = %object.key,
                line,
                expected = layout.column_count(),
                found = fields.len(),
                "Skipping short row"
            );
            decoded.malformed += 1;
            return;
        }

        let idx = layout.fields();
        if fields[idx.organization] != self.organization {
            decoded.rejected += 1;
            return;
        }

        let field = |i: usize| fields[i].clone();
        decoded.records.push(PlaceExchangeRecord {
            play_date,
            organization: field(idx.organization),
            network: field(idx.network),
            ad_unit_name: field(idx.ad_unit_name),
            ad_unit_id: field(idx.ad_unit_id),
            venue_type: field(idx.venue_type),
            deal_id: field(idx.deal_id),
            deal_name: field(idx.deal_name),
            buyer: field(idx.buyer),
            advertiser: field(idx.advertiser),
            brand: field(idx.brand),
            creative_id: idx.creative_id.map(field).unwrap_or_default(),
            plays: field(idx.plays),
            impressions: field(idx.impressions),
            revenue: field(idx.revenue),
            ecpm: field(idx.ecpm),
            currency: field(idx.currency),
            filename: object.key.clone(),
        });
    }
}

impl RecordDecoder for PlaceExchangeDecoder {
    type Record = PlaceExchangeRecord;

    fn decode(&self, object: &SourceObject, data: &[u8]) -> Result<Decoded<PlaceExchangeRecord>> {
        let play_date = play_date_from_filename(object.filename(), &self.filename_prefix)?;

        match object.extension().as_deref() {
            Some("xlsx") => self.decode_xlsx(object, data, play_date),
            _ => self.decode_csv(object, data, play_date),
        }
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}
