//! Weighted-leg spread evaluation — shared core of the arbitrage strategies.
//!
//! A spread is priced two ways from the current snapshot: what selling it
//! fetches right now (positive-weight legs hit the bid, negative-weight legs
//! lift the ask) and what buying it costs (the reverse crossing). Divergence
//! is judged on the executable side, so the open and close tests already
//! include the cost of crossing every leg's book.

use crate::market::Quote;
use crate::strategy::{Strategy, StrategyContext};
use crate::types::OrderType;

/// One instrument within the spread. `weight` is signed lots per spread lot
/// (pair: +1/-1, butterfly: +1/-2/+1).
#[derive(Debug, Clone)]
pub struct Leg {
    pub index: usize,
    pub instrument: String,
    pub weight: i32,
}

pub struct SpreadEngine {
    id: String,
    legs: Vec<Leg>,
    position: i32,
    min_position: i32,
    max_position: i32,
    open_threshold: f64,
    close_threshold: f64,
    open_volume: i32,
}

impl SpreadEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        legs: Vec<Leg>,
        position: i32,
        min_position: i32,
        max_position: i32,
        open_threshold: f64,
        close_threshold: f64,
        open_volume: i32,
    ) -> Self {
        Self {
            id: id.into(),
            legs,
            position,
            min_position,
            max_position,
            open_threshold,
            close_threshold,
            open_volume: open_volume.max(1),
        }
    }

    fn subscribes_to(&self, idx: usize) -> bool {
        self.legs.iter().any(|leg| leg.index == idx)
    }

    /// Proceeds of selling one spread lot against the current books.
    fn sell_value(&self, quotes: &[Quote]) -> f64 {
        self.legs
            .iter()
            .zip(quotes)
            .map(|(leg, q)| {
                let w = leg.weight as f64;
                if leg.weight > 0 { w * q.bid } else { w * q.ask }
            })
            .sum()
    }

    /// Cost of buying one spread lot against the current books.
    fn buy_value(&self, quotes: &[Quote]) -> f64 {
        self.legs
            .iter()
            .zip(quotes)
            .map(|(leg, q)| {
                let w = leg.weight as f64;
                if leg.weight > 0 { w * q.ask } else { w * q.bid }
            })
            .sum()
    }

    /// Issue one order per leg. `sign` +1 buys the spread, -1 sells it.
    /// Atomic in intent only — partial fills across legs are the gateway's
    /// and operator's to reconcile.
    fn place_spread(&self, sign: i32, volume: i32, quotes: &[Quote], ctx: &mut StrategyContext<'_>) {
        for (leg, q) in self.legs.iter().zip(quotes) {
            let effective = leg.weight * sign;
            let lots = leg.weight.abs() * volume;
            if effective > 0 {
                ctx.gateway.buy_limit(&leg.instrument, lots, q.ask, OrderType::FillAndKill);
            } else {
                ctx.gateway.sell_limit(&leg.instrument, lots, q.bid, OrderType::FillAndKill);
            }
        }
    }

    fn evaluate(&mut self, ctx: &mut StrategyContext<'_>) {
        let quotes: Vec<Quote> = self.legs.iter().map(|leg| *ctx.markets.quote(leg.index)).collect();
        if quotes.iter().any(|q| !q.is_valid()) {
            // at least one leg has never quoted
            return;
        }

        let sell = self.sell_value(&quotes);
        let buy = self.buy_value(&quotes);

        if sell >= self.open_threshold && self.position > self.min_position {
            // spread rich: sell it, clamped to remaining headroom
            let volume = self.open_volume.min(self.position - self.min_position);
            self.place_spread(-1, volume, &quotes, ctx);
            self.position -= volume;
            tracing::info!(strategy = %self.id, sell, position = self.position, "spread sold");
        } else if -buy >= self.open_threshold && self.position < self.max_position {
            // spread cheap: buy it
            let volume = self.open_volume.min(self.max_position - self.position);
            self.place_spread(1, volume, &quotes, ctx);
            self.position += volume;
            tracing::info!(strategy = %self.id, buy, position = self.position, "spread bought");
        } else if self.position < 0 && sell <= self.close_threshold {
            // divergence gone: unwind the short side to flat
            let volume = -self.position;
            self.place_spread(1, volume, &quotes, ctx);
            self.position = 0;
            tracing::info!(strategy = %self.id, sell, "short spread closed");
        } else if self.position > 0 && -buy <= self.close_threshold {
            let volume = self.position;
            self.place_spread(-1, volume, &quotes, ctx);
            self.position = 0;
            tracing::info!(strategy = %self.id, buy, "long spread closed");
        }
    }
}

impl Strategy for SpreadEngine {
    fn name(&self) -> &str {
        &self.id
    }

    fn on_instrument_changed(&mut self, idx: usize, ctx: &mut StrategyContext<'_>) {
        if !self.subscribes_to(idx) {
            return;
        }
        self.evaluate(ctx);
    }

    fn position(&self) -> i32 {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::RecordingGateway;
    use crate::market::{MarketSnapshotStore, Quote};
    use crate::types::Side;

    fn quote(mid: f64) -> Quote {
        Quote {
            time: 1,
            last_price: mid,
            ask: mid + 0.5,
            ask_size: 10,
            bid: mid - 0.5,
            bid_size: 10,
        }
    }

    fn setup(mids: &[f64]) -> (MarketSnapshotStore, Vec<usize>) {
        let names: Vec<String> = (0..mids.len()).map(|i| format!("LEG{i}")).collect();
        let mut store = MarketSnapshotStore::new(names.clone());
        let indices: Vec<usize> = names.iter().map(|n| store.index_of(n).unwrap()).collect();
        for (idx, mid) in indices.iter().zip(mids) {
            store.update(*idx, quote(*mid));
        }
        (store, indices)
    }

    fn legs(indices: &[usize], weights: &[i32]) -> Vec<Leg> {
        indices
            .iter()
            .zip(weights)
            .map(|(i, w)| Leg {
                index: *i,
                instrument: format!("LEG{i}"),
                weight: *w,
            })
            .collect()
    }

    #[test]
    fn test_open_volume_clamped_to_headroom() {
        let (store, indices) = setup(&[110.0, 100.0]);
        let mut gw = RecordingGateway::default();
        // wants 5 lots, but only 2 of headroom down to min_position
        let mut engine =
            SpreadEngine::new("pt", legs(&indices, &[1, -1]), 0, -2, 2, 5.0, 1.0, 5);

        let mut ctx = StrategyContext { markets: &store, gateway: &mut gw };
        engine.on_instrument_changed(indices[0], &mut ctx);

        assert_eq!(engine.position(), -2);
        assert_eq!(gw.intents.len(), 2);
        assert!(gw.intents.iter().all(|i| i.volume == 2));
    }

    #[test]
    fn test_butterfly_weights_scale_leg_volumes() {
        // fly trading rich: wings 100/100, body 90 → sell_value =
        // bid1 - 2*ask2 + bid3 = 99.5 - 181 + 99.5 = 18
        let (store, indices) = setup(&[100.0, 90.0, 100.0]);
        let mut gw = RecordingGateway::default();
        let mut engine =
            SpreadEngine::new("bf", legs(&indices, &[1, -2, 1]), 0, -1, 1, 5.0, 1.0, 1);

        let mut ctx = StrategyContext { markets: &store, gateway: &mut gw };
        engine.on_instrument_changed(indices[1], &mut ctx);

        assert_eq!(engine.position(), -1);
        let volumes: Vec<i32> = gw.intents.iter().map(|i| i.volume).collect();
        assert_eq!(volumes, vec![1, 2, 1]);
        // selling the spread: sell the wings, buy back the body
        assert_eq!(gw.intents[0].side, Side::Sell);
        assert_eq!(gw.intents[1].side, Side::Buy);
        assert_eq!(gw.intents[2].side, Side::Sell);
    }

    #[test]
    fn test_unrelated_instrument_ignored() {
        let mut store =
            MarketSnapshotStore::new(vec!["LEG0".into(), "LEG1".into(), "ZZZ".into()]);
        let i0 = store.index_of("LEG0").unwrap();
        let i1 = store.index_of("LEG1").unwrap();
        let zzz = store.index_of("ZZZ").unwrap();
        store.update(i0, quote(110.0));
        store.update(i1, quote(100.0));
        store.update(zzz, quote(50.0));

        let mut gw = RecordingGateway::default();
        let mut engine =
            SpreadEngine::new("pt", legs(&[i0, i1], &[1, -1]), 0, -1, 1, 5.0, 1.0, 1);
        let mut ctx = StrategyContext { markets: &store, gateway: &mut gw };
        engine.on_instrument_changed(zzz, &mut ctx);

        assert_eq!(engine.position(), 0);
        assert!(gw.intents.is_empty());
    }

    #[test]
    fn test_never_quoted_leg_blocks_evaluation() {
        let names = vec!["LEG0".to_string(), "LEG1".to_string()];
        let mut store = MarketSnapshotStore::new(names);
        let i0 = store.index_of("LEG0").unwrap();
        let i1 = store.index_of("LEG1").unwrap();
        store.update(i0, quote(110.0)); // LEG1 never quotes

        let mut gw = RecordingGateway::default();
        let mut engine = SpreadEngine::new(
            "pt",
            legs(&[i0, i1], &[1, -1]),
            0,
            -1,
            1,
            5.0,
            1.0,
            1,
        );
        let mut ctx = StrategyContext { markets: &store, gateway: &mut gw };
        engine.on_instrument_changed(i0, &mut ctx);

        assert_eq!(engine.position(), 0);
        assert!(gw.intents.is_empty());
    }
}
