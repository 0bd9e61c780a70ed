//! Strategy framework — event entry points and dispatch context.

pub mod butterfly;
pub mod pair;
pub mod spread;
pub mod trend;

pub use butterfly::Butterfly;
pub use pair::PairTrade;
pub use spread::SpreadEngine;
pub use trend::DblMaPsarStrategy;

use crate::bar::{Bar, Timeframe};
use crate::gateway::ExecutionGateway;
use crate::market::MarketSnapshotStore;

/// Read access to the shared market snapshot plus the order path, lent to a
/// strategy for the duration of one event.
pub struct StrategyContext<'a> {
    pub markets: &'a MarketSnapshotStore,
    pub gateway: &'a mut dyn ExecutionGateway,
}

/// Common interface the engine multiplexes events through. Strategies ignore
/// events outside their instrument/timeframe set; position is mutated only by
/// the strategy's own decision logic.
pub trait Strategy {
    fn name(&self) -> &str;

    /// The quote at `idx` in the snapshot store changed significantly.
    fn on_instrument_changed(&mut self, _idx: usize, _ctx: &mut StrategyContext<'_>) {}

    /// A bar completed for (instrument, timeframe).
    fn on_new_bar(
        &mut self,
        _instrument: &str,
        _timeframe: Timeframe,
        _bar: &Bar,
        _ctx: &mut StrategyContext<'_>,
    ) {
    }

    /// Current signed position (lots).
    fn position(&self) -> i32;
}
