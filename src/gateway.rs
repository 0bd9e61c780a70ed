//! Execution gateway boundary — order intents out, nothing back.
//!
//! The core resolves an instrument identifier (underlying or constructed
//! option contract), hands the intent to the gateway, and moves on. Fills,
//! rejections, and cross-leg reconciliation are the gateway's problem.

use uuid::Uuid;

use crate::types::{OrderType, Side};

/// One order the core wants placed. Fire-and-forget.
#[derive(Debug, Clone)]
pub struct OrderIntent {
    pub id: Uuid,
    pub instrument: String,
    pub side: Side,
    pub volume: i32,
    pub price: f64,
    pub order_type: OrderType,
}

impl OrderIntent {
    pub fn new(instrument: &str, side: Side, volume: i32, price: f64, order_type: OrderType) -> Self {
        Self {
            id: Uuid::new_v4(),
            instrument: instrument.to_string(),
            side,
            volume,
            price,
            order_type,
        }
    }
}

pub trait ExecutionGateway {
    fn buy_limit(&mut self, instrument: &str, volume: i32, price: f64, order_type: OrderType);

    fn sell_limit(&mut self, instrument: &str, volume: i32, price: f64, order_type: OrderType);
}

/// Option contract kind for constructed identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Call,
    Put,
}

/// Build an option-contract identifier from its underlying, kind, and strike
/// index, e.g. `m1907-C-2700`.
pub fn option_contract_id(underlying: &str, kind: OptionKind, strike: u32) -> String {
    let tag = match kind {
        OptionKind::Call => 'C',
        OptionKind::Put => 'P',
    };
    format!("{underlying}-{tag}-{strike}")
}

/// Gateway that only logs intents. Default wiring for dry runs.
#[derive(Default)]
pub struct PaperGateway;

impl ExecutionGateway for PaperGateway {
    fn buy_limit(&mut self, instrument: &str, volume: i32, price: f64, order_type: OrderType) {
        let intent = OrderIntent::new(instrument, Side::Buy, volume, price, order_type);
        tracing::info!(id = %intent.id, %instrument, volume, price, %order_type, "BUY intent");
    }

    fn sell_limit(&mut self, instrument: &str, volume: i32, price: f64, order_type: OrderType) {
        let intent = OrderIntent::new(instrument, Side::Sell, volume, price, order_type);
        tracing::info!(id = %intent.id, %instrument, volume, price, %order_type, "SELL intent");
    }
}

/// Captures intents in order. Test double shared by the strategy tests.
#[derive(Default)]
pub struct RecordingGateway {
    pub intents: Vec<OrderIntent>,
}

impl ExecutionGateway for RecordingGateway {
    fn buy_limit(&mut self, instrument: &str, volume: i32, price: f64, order_type: OrderType) {
        self.intents
            .push(OrderIntent::new(instrument, Side::Buy, volume, price, order_type));
    }

    fn sell_limit(&mut self, instrument: &str, volume: i32, price: f64, order_type: OrderType) {
        self.intents
            .push(OrderIntent::new(instrument, Side::Sell, volume, price, order_type));
    }
}
