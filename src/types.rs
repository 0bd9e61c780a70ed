//! Common wire and domain types

use serde::{Deserialize, Serialize};

use crate::bar::{Bar, Timeframe};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Time-condition flag forwarded verbatim to the execution gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Limit,
    FillAndKill,
    FillOrKill,
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderType::Limit => write!(f, "LIMIT"),
            OrderType::FillAndKill => write!(f, "FAK"),
            OrderType::FillOrKill => write!(f, "FOK"),
        }
    }
}

/// One raw market-data callback from the feed collaborator.
///
/// `volume` (cumulative session volume) is carried on the wire but plays no
/// part in the change-significance rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tick {
    pub instrument: String,
    pub time: u64,
    pub last_price: f64,
    #[serde(default)]
    pub volume: i64,
    pub ask: f64,
    pub ask_size: i32,
    pub bid: f64,
    pub bid_size: i32,
}

/// Events delivered by the external feed, one JSON object per line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedEvent {
    Tick(Tick),
    Bar {
        instrument: String,
        timeframe: Timeframe,
        #[serde(flatten)]
        bar: Bar,
    },
}
