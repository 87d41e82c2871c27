use std::net::IpAddr;

use gblock_common::address::{encode_address, RangeBounds};
use gblock_db_entities::GlobalBlock;
use tracing::debug;

/// Splits an `X-Forwarded-For` style header into its entries, in order.
pub fn parse_forwarded_for(header: &str) -> Vec<String> {
    header
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Chain entries that parse as addresses. Anything else is skipped.
pub(crate) fn valid_addresses(chain: &[String]) -> Vec<IpAddr> {
    chain
        .iter()
        .filter_map(|entry| match entry.trim().parse::<IpAddr>() {
            Ok(ip) => Some(ip),
            Err(_) => {
                debug!(entry = %entry, "Skipping unparseable forwarded-for entry");
                None
            }
        })
        .collect()
}

/// The first address in chain order that falls inside any of `blocks`,
/// together with that block.
pub(crate) fn first_covered<'a>(
    addresses: &[IpAddr],
    blocks: &'a [GlobalBlock::Model],
) -> Option<(IpAddr, &'a GlobalBlock::Model)> {
    addresses.iter().find_map(|ip| {
        let encoded = encode_address(*ip);
        blocks
            .iter()
            .find(|block| {
                RangeBounds {
                    start: block.range_start.clone(),
                    end: block.range_end.clone(),
                }
                .contains(&encoded)
            })
            .map(|block| (*ip, block))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::block_row;

    fn model(address: &str, id: i32) -> GlobalBlock::Model {
        let row = block_row(address, None, None);
        GlobalBlock::Model {
            id,
            address: address.to_owned(),
            target_central_id: None,
            by_name: "Steward".into(),
            by_central_id: None,
            by_site: "meta".into(),
            reason: "abuse".into(),
            created_at: chrono::Utc::now(),
            expires_at: None,
            anon_only: false,
            range_start: row.range_start.unwrap(),
            range_end: row.range_end.unwrap(),
        }
    }

    #[test]
    fn test_parse_header() {
        assert_eq!(
            parse_forwarded_for(" 198.51.100.9, 203.0.113.5 ,,unknown"),
            vec!["198.51.100.9", "203.0.113.5", "unknown"]
        );
        assert!(parse_forwarded_for("").is_empty());
    }

    #[test]
    fn test_garbage_entries_are_skipped() {
        let chain = parse_forwarded_for("unknown, 203.0.113.5, 999.1.1.1");
        assert_eq!(
            valid_addresses(&chain),
            vec!["203.0.113.5".parse::<IpAddr>().unwrap()]
        );
    }

    #[test]
    fn test_chain_order_wins_over_specificity() {
        let blocks = vec![model("203.0.113.0/24", 1), model("198.51.100.9", 2)];
        let addresses: Vec<IpAddr> = vec![
            "192.0.2.1".parse().unwrap(),
            "203.0.113.5".parse().unwrap(),
            "198.51.100.9".parse().unwrap(),
        ];
        let (ip, block) = first_covered(&addresses, &blocks).unwrap();
        assert_eq!(ip, "203.0.113.5".parse::<IpAddr>().unwrap());
        assert_eq!(block.id, 1);
    }

    #[test]
    fn test_nothing_covered() {
        let blocks = vec![model("203.0.113.0/24", 1)];
        let addresses: Vec<IpAddr> = vec!["192.0.2.1".parse().unwrap()];
        assert!(first_covered(&addresses, &blocks).is_none());
    }
}
