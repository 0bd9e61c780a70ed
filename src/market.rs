//! Market snapshot store — latest quote per tracked instrument.
//!
//! One slot per instrument in the configured universe, addressed by a stable
//! integer index assigned once at construction. The store only compares and
//! replaces quotes; fan-out to strategies and the limited-market latch belong
//! to the engine.

use crate::types::Tick;

/// Latest depth quote for one instrument. Replaced wholesale on every update.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Quote {
    pub time: u64,
    pub last_price: f64,
    pub ask: f64,
    pub ask_size: i32,
    pub bid: f64,
    pub bid_size: i32,
}

impl Quote {
    /// A slot that has never received data stays all-zero; strategies must
    /// not derive spreads from it.
    pub fn is_valid(&self) -> bool {
        self.ask > 0.0 && self.bid > 0.0
    }

    /// Book-change significance: bid/ask price or size moved. Last-trade
    /// price moves without a book change are not significant, and feed
    /// volume never participates.
    pub fn significant_change(&self, new: &Quote) -> bool {
        self.ask != new.ask
            || self.ask_size != new.ask_size
            || self.bid != new.bid
            || self.bid_size != new.bid_size
    }
}

impl From<&Tick> for Quote {
    fn from(tick: &Tick) -> Self {
        Self {
            time: tick.time,
            last_price: tick.last_price,
            ask: tick.ask,
            ask_size: tick.ask_size,
            bid: tick.bid,
            bid_size: tick.bid_size,
        }
    }
}

pub struct MarketSnapshotStore {
    instruments: Vec<String>,
    quotes: Vec<Quote>,
}

impl MarketSnapshotStore {
    /// Build the store from the full configured universe. Identifiers are
    /// sorted and deduplicated; index assignment is fixed from here on.
    pub fn new(mut instruments: Vec<String>) -> Self {
        instruments.sort();
        instruments.dedup();
        let quotes = vec![Quote::default(); instruments.len()];
        Self { instruments, quotes }
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    /// Index lookup over the fixed universe. Unknown identifiers are routine
    /// (unconfigured instruments in the feed) and yield `None`, not an error.
    pub fn index_of(&self, instrument: &str) -> Option<usize> {
        self.instruments
            .binary_search_by(|probe| probe.as_str().cmp(instrument))
            .ok()
    }

    pub fn instrument(&self, idx: usize) -> &str {
        &self.instruments[idx]
    }

    pub fn quote(&self, idx: usize) -> &Quote {
        &self.quotes[idx]
    }

    /// Compare against the stored quote, then replace it unconditionally so
    /// the next comparison is always against the immediately preceding quote.
    /// Returns whether the change was significant.
    pub fn update(&mut self, idx: usize, quote: Quote) -> bool {
        let significant = self.quotes[idx].significant_change(&quote);
        self.quotes[idx] = quote;
        significant
    }
}
