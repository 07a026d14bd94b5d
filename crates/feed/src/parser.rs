//! Depth frame normalization
//!
//! Accepts Binance-style depth payloads (`{"a": [[p, q], ...], "b": [...]}`),
//! optionally wrapped in a combined-stream envelope `{"stream": .., "data": ..}`.
//! Price and size may arrive as strings or numbers.

use log::debug;
use serde_json::Value;
use tcsim_core::{OrderBookSnapshot, PriceLevel};

use crate::error::ParseError;

/// Turns raw text frames into order book snapshots
#[derive(Debug, Clone, Copy)]
pub struct DepthFrameParser {
    levels: usize,
}

impl DepthFrameParser {
    /// Parser keeping the best `levels` per side
    pub fn new(levels: usize) -> Self {
        Self { levels }
    }

    /// Parse one frame.
    ///
    /// `Ok(None)` means the frame carries no book content (heartbeats,
    /// subscription acks, frames lacking either side) and should be ignored.
    /// Zero-size levels are removals in a diff stream and are skipped.
    pub fn parse(&self, text: &str, received_at_ms: i64) -> Result<Option<OrderBookSnapshot>, ParseError> {
        let value: Value = serde_json::from_str(text)?;

        let payload = match (value.get("stream"), value.get("data")) {
            (Some(_), Some(data)) => data,
            _ => &value,
        };

        let (Some(asks), Some(bids)) = (payload.get("a"), payload.get("b")) else {
            debug!("Frame has no book sides, ignoring: {}", truncate(text));
            return Ok(None);
        };

        let asks = parse_price_levels(asks, "a")?;
        let bids = parse_price_levels(bids, "b")?;

        Ok(OrderBookSnapshot::new(bids, asks, received_at_ms).map(|book| book.truncated(self.levels)))
    }
}

impl Default for DepthFrameParser {
    fn default() -> Self {
        Self::new(20)
    }
}

fn parse_price_levels(value: &Value, side: &'static str) -> Result<Vec<PriceLevel>, ParseError> {
    let entries = value.as_array().ok_or(ParseError::NotAnArray(side))?;
    let mut levels = Vec::with_capacity(entries.len());

    for entry in entries {
        let invalid = || ParseError::InvalidLevel {
            side,
            level: entry.to_string(),
        };

        let pair = entry.as_array().filter(|p| p.len() >= 2).ok_or_else(invalid)?;
        let price = parse_number(&pair[0]).ok_or_else(invalid)?;
        let size = parse_number(&pair[1]).ok_or_else(invalid)?;
        let level = PriceLevel::new(price, size).map_err(|_| invalid())?;

        if level.size > 0.0 {
            levels.push(level);
        }
    }

    Ok(levels)
}

fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

fn truncate(text: &str) -> &str {
    match text.char_indices().nth(120) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TS: i64 = 1_700_000_000_000;

    #[test]
    fn test_parse_binance_depth() {
        let frame = r#"{"e":"depthUpdate","E":1,"s":"BTCUSDT","U":1,"u":2,
            "b":[["100.0","2.0"],["99.5","1.0"]],
            "a":[["100.5","3.0"],["101.0","4.0"]]}"#;

        let book = DepthFrameParser::default().parse(frame, TS).unwrap().unwrap();
        assert_eq!(book.best_bid().unwrap().price, 100.0);
        assert_eq!(book.best_ask().unwrap().price, 100.5);
        assert_eq!(book.asks.len(), 2);
        assert_eq!(book.timestamp, TS);
    }

    #[test]
    fn test_combined_stream_envelope() {
        let frame = r#"{"stream":"btcusdt@depth","data":{"b":[[100.0,1.0]],"a":[[101.0,1.0]]}}"#;
        let book = DepthFrameParser::default().parse(frame, TS).unwrap().unwrap();
        assert_eq!(book.spread(), Some(1.0));
    }

    #[test]
    fn test_missing_side_is_ignored() {
        let parser = DepthFrameParser::default();
        assert!(parser.parse(r#"{"b":[["1","1"]]}"#, TS).unwrap().is_none());
        assert!(parser.parse(r#"{"result":null,"id":1}"#, TS).unwrap().is_none());
        assert!(parser.parse("[1,2,3]", TS).unwrap().is_none());
        assert!(parser.parse(r#"{"a":[],"b":[]}"#, TS).unwrap().is_none());
    }

    #[test]
    fn test_malformed_frames_are_errors() {
        let parser = DepthFrameParser::default();
        assert!(matches!(parser.parse("not json", TS), Err(ParseError::InvalidJson(_))));
        assert!(matches!(
            parser.parse(r#"{"a":"x","b":[]}"#, TS),
            Err(ParseError::NotAnArray("a"))
        ));
        assert!(matches!(
            parser.parse(r#"{"a":[["abc","1"]],"b":[]}"#, TS),
            Err(ParseError::InvalidLevel { side: "a", .. })
        ));
        assert!(matches!(
            parser.parse(r#"{"a":[["-1","1"]],"b":[]}"#, TS),
            Err(ParseError::InvalidLevel { .. })
        ));
    }

    #[test]
    fn test_zero_size_levels_dropped_and_truncated() {
        let frame = r#"{"a":[["101","0"],["102","1"],["103","1"],["104","1"]],"b":[["100","1"]]}"#;
        let book = DepthFrameParser::new(2).parse(frame, TS).unwrap().unwrap();
        assert_eq!(book.asks.len(), 2);
        assert_eq!(book.best_ask().unwrap().price, 102.0);
    }
}
