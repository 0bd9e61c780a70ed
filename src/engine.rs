//! Top-level engine — owns the snapshot store, the strategies, and the
//! limited-market latch, and fans events out in arrival order.
//!
//! Single-threaded and synchronous: a tick is fully processed (significance
//! test, strategy evaluations, order dispatch) before the next one is looked
//! at, so strategies never observe reentrancy.

use crate::bar::{Bar, Timeframe};
use crate::config::{AppConfig, StrategyEntry};
use crate::error::Result;
use crate::gateway::ExecutionGateway;
use crate::indicator::IndicatorSource;
use crate::market::{MarketSnapshotStore, Quote};
use crate::strategy::{
    Butterfly, DblMaPsarStrategy, PairTrade, Strategy, StrategyContext,
    trend::DblMaPsarParams,
};
use crate::types::Tick;

pub struct Engine {
    markets: MarketSnapshotStore,
    strategies: Vec<Box<dyn Strategy>>,
    indicators: Box<dyn IndicatorSource>,
    gateway: Box<dyn ExecutionGateway>,
    /// One-way latch: set when any tracked instrument reports a locked book
    /// (zero resting size on either side). Never reset within the process.
    limited: bool,
}

impl Engine {
    /// Build the engine from configuration. The instrument universe is the
    /// sorted, deduplicated union of every entry's legs; entries with an
    /// unknown kind or unresolvable parameters are reported and skipped, and
    /// the remaining strategies keep running.
    pub fn from_config(
        config: &AppConfig,
        mut indicators: Box<dyn IndicatorSource>,
        gateway: Box<dyn ExecutionGateway>,
    ) -> Result<Self> {
        let universe: Vec<String> = config
            .strategies
            .iter()
            .flat_map(|entry| entry.instruments.iter().cloned())
            .collect();
        let markets = MarketSnapshotStore::new(universe);
        tracing::info!(instruments = markets.len(), "market snapshot store ready");

        let mut strategies: Vec<Box<dyn Strategy>> = Vec::new();
        for entry in &config.strategies {
            match build_strategy(entry, &markets, indicators.as_mut()) {
                Ok(Some(strategy)) => {
                    tracing::info!(strategy = %strategy.name(), kind = %entry.kind, "strategy ready");
                    strategies.push(strategy);
                }
                Ok(None) => {
                    // forward-compatible: unknown kinds are skipped, not fatal
                    tracing::warn!(strategy = %entry.id, kind = %entry.kind,
                        "unknown strategy kind, skipping");
                }
                Err(e) => {
                    tracing::error!(strategy = %entry.id, error = %e,
                        "strategy configuration rejected, skipping");
                }
            }
        }

        Ok(Self {
            markets,
            strategies,
            indicators,
            gateway,
            limited: false,
        })
    }

    pub fn markets(&self) -> &MarketSnapshotStore {
        &self.markets
    }

    pub fn strategies(&self) -> &[Box<dyn Strategy>] {
        &self.strategies
    }

    pub fn is_limited(&self) -> bool {
        self.limited
    }

    /// One market-data callback. Returns whether the update was significant
    /// and fanned out.
    pub fn on_tick(&mut self, tick: &Tick) -> bool {
        if self.limited {
            return false;
        }
        if tick.ask_size <= 0 || tick.bid_size <= 0 {
            tracing::warn!(instrument = %tick.instrument,
                "locked market detected, halting all further processing");
            self.limited = true;
            return false;
        }

        // unconfigured instruments are routine, not an error
        let Some(idx) = self.markets.index_of(&tick.instrument) else {
            return false;
        };

        let significant = self.markets.update(idx, Quote::from(tick));
        if significant {
            let mut ctx = StrategyContext {
                markets: &self.markets,
                gateway: self.gateway.as_mut(),
            };
            for strategy in &mut self.strategies {
                strategy.on_instrument_changed(idx, &mut ctx);
            }
        }
        significant
    }

    /// One completed bar. Indicator lines are extended first so strategies
    /// read current values.
    pub fn on_bar(&mut self, instrument: &str, timeframe: Timeframe, bar: &Bar) {
        if self.limited {
            return;
        }
        self.indicators.on_bar(instrument, timeframe, bar);
        let mut ctx = StrategyContext {
            markets: &self.markets,
            gateway: self.gateway.as_mut(),
        };
        for strategy in &mut self.strategies {
            strategy.on_new_bar(instrument, timeframe, bar, &mut ctx);
        }
    }
}

fn build_strategy(
    entry: &StrategyEntry,
    markets: &MarketSnapshotStore,
    indicators: &mut dyn IndicatorSource,
) -> Result<Option<Box<dyn Strategy>>> {
    let strategy: Box<dyn Strategy> = match entry.kind.as_str() {
        "PairTrade" => Box::new(PairTrade::new(
            &entry.id,
            &entry.instruments,
            markets,
            entry.position,
            entry.min_position,
            entry.max_position,
            entry.open_threshold,
            entry.close_threshold,
            entry.open_volume,
        )?),
        "Butterfly" => Box::new(Butterfly::new(
            &entry.id,
            &entry.instruments,
            markets,
            entry.position,
            entry.min_position,
            entry.max_position,
            entry.open_threshold,
            entry.close_threshold,
            entry.open_volume,
        )?),
        "DblMaPsar" => {
            let instrument = entry.instruments.first().ok_or_else(|| {
                crate::error::Error::Config(format!("{}: missing instrument", entry.id))
            })?;
            let params = DblMaPsarParams::from_values(&entry.param_values()?)?;
            Box::new(DblMaPsarStrategy::new(
                &entry.id,
                instrument,
                entry.timeframe()?,
                params,
                indicators,
            )?)
        }
        _ => return Ok(None),
    };
    Ok(Some(strategy))
}
