//! Pair trade — two-leg spread, weights [+1, -1].

use crate::error::{Error, Result};
use crate::market::MarketSnapshotStore;
use crate::strategy::spread::{Leg, SpreadEngine};
use crate::strategy::{Strategy, StrategyContext};

pub struct PairTrade {
    engine: SpreadEngine,
}

impl PairTrade {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        instruments: &[String],
        markets: &MarketSnapshotStore,
        position: i32,
        min_position: i32,
        max_position: i32,
        open_threshold: f64,
        close_threshold: f64,
        open_volume: i32,
    ) -> Result<Self> {
        let id = id.into();
        if instruments.len() != 2 {
            return Err(Error::Config(format!(
                "pair trade {id} needs exactly 2 instruments, got {}",
                instruments.len()
            )));
        }

        let legs = instruments
            .iter()
            .zip([1, -1])
            .map(|(name, weight)| {
                let index = markets.index_of(name).ok_or_else(|| {
                    Error::Config(format!("pair trade {id}: instrument {name} not in universe"))
                })?;
                Ok(Leg { index, instrument: name.clone(), weight })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            engine: SpreadEngine::new(
                id,
                legs,
                position,
                min_position,
                max_position,
                open_threshold,
                close_threshold,
                open_volume,
            ),
        })
    }
}

impl Strategy for PairTrade {
    fn name(&self) -> &str {
        self.engine.name()
    }

    fn on_instrument_changed(&mut self, idx: usize, ctx: &mut StrategyContext<'_>) {
        self.engine.on_instrument_changed(idx, ctx);
    }

    fn position(&self) -> i32 {
        self.engine.position()
    }
}
