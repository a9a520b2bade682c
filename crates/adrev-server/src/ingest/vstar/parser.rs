//! VStar CSV decoding

use adrev_common::Result;
use tracing::warn;

use crate::ingest::framework::csv_line::{header_and_rows, split_line};
use crate::ingest::framework::decoder::utf8;
use crate::ingest::framework::{Decoded, RecordDecoder};
use crate::storage::SourceObject;

use super::models::{column, VStarRecord, COLUMN_COUNT};

pub const DEFAULT_NETWORK: &str = "Adrev";

/// Skips the header and keeps rows whose network equals the marker
#[derive(Debug, Clone)]
pub struct VStarDecoder {
    network: String,
}

impl Default for VStarDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_NETWORK)
    }
}

impl VStarDecoder {
    pub fn new(network: impl Into<String>) -> Self {
        Self {
            network: network.into(),
        }
    }
}

impl RecordDecoder for VStarDecoder {
    type Record = VStarRecord;

    fn decode(&self, object: &SourceObject, data: &[u8]) -> Result<Decoded<VStarRecord>> {
        let mut decoded = Decoded::default();
        let Some((_, rows)) = header_and_rows(utf8(object, data)?) else {
            return Ok(decoded);
        };

        for (line, text) in rows {
            let mut fields = split_line(text);
            if fields.len() < COLUMN_COUNT {
                warn!(
                    key = %object.key,
                    line,
                    expected = COLUMN_COUNT,
                    found = fields.len(),
                    "Skipping short row"
                );
                decoded.malformed += 1;
                continue;
            }

            if fields[column::NETWORK] != self.network {
                decoded.rejected += 1;
                continue;
            }

            let mut take = |i: usize| std::mem::take(&mut fields[i]);
            decoded.records.push(VStarRecord {
                report_date: take(column::DATE),
                network: take(column::NETWORK),
                venue_id: take(column::VENUE_ID),
                venue_name: take(column::VENUE_NAME),
                advertiser: take(column::ADVERTISER),
                campaign_id: take(column::CAMPAIGN_ID),
                campaign_name: take(column::CAMPAIGN_NAME),
                creative_id: take(column::CREATIVE_ID),
                creative_name: take(column::CREATIVE_NAME),
                spots: take(column::SPOTS),
                impressions: take(column::IMPRESSIONS),
                revenue: take(column::REVENUE),
                ecpm: take(column::ECPM),
                filename: object.key.clone(),
            });
        }

        Ok(decoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Date,Network,Venue ID,Venue Name,Advertiser,Campaign ID,Campaign Name,\
        Creative ID,Creative Name,Spots,Impressions,Revenue,eCPM";

    #[test]
    fn test_maps_every_column() {
        let content = format!(
            "{}\n2024-03-14,Adrev,V-1,Main St Gym,Acme,C-5,Spring Push,CR-2,Spot 15s,\"1,200\",\"3,400\",17.00,5.00\n",
            HEADER
        );
        let object = SourceObject::new("vstar", "exports/vstar_0314.csv");
        let decoded = VStarDecoder::default().decode(&object, content.as_bytes()).unwrap();

        assert_eq!(decoded.records.len(), 1);
        let r = &decoded.records[0];
        assert_eq!(r.report_date, "2024-03-14");
        assert_eq!(r.network, "Adrev");
        assert_eq!(r.venue_id, "V-1");
        assert_eq!(r.venue_name, "Main St Gym");
        assert_eq!(r.advertiser, "Acme");
        assert_eq!(r.campaign_id, "C-5");
        assert_eq!(r.campaign_name, "Spring Push");
        assert_eq!(r.creative_id, "CR-2");
        assert_eq!(r.creative_name, "Spot 15s");
        assert_eq!(r.spots, "1200");
        assert_eq!(r.impressions, "3400");
        assert_eq!(r.revenue, "17.00");
        assert_eq!(r.ecpm, "5.00");
        assert_eq!(r.filename, "exports/vstar_0314.csv");
    }

    #[test]
    fn test_filters_by_network_marker() {
        let content = format!(
            "{}\n2024-03-14,Adrev,V,N,A,C,CN,CR,CRN,1,2,3,4\n2024-03-14,Elsewhere,V,N,A,C,CN,CR,CRN,1,2,3,4\n2024-03-14,Adrev\n",
            HEADER
        );
        let object = SourceObject::new("vstar", "vstar.csv");
        let decoded = VStarDecoder::default().decode(&object, content.as_bytes()).unwrap();

        assert_eq!(decoded.records.len(), 1);
        assert_eq!(decoded.rejected, 1);
        assert_eq!(decoded.malformed, 1);
    }

    #[test]
    fn test_invalid_utf8_fails_the_object() {
        let object = SourceObject::new("vstar", "vstar.csv");
        assert!(VStarDecoder::default().decode(&object, &[0xff, 0xfe, 0x00]).is_err());
    }
}
