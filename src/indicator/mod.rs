//! Indicator adapter layer — handles, parameter binding, and the contract
//! with the external indicator-computation collaborator.
//!
//! The math that fills buffers lives behind [`IndicatorSource`]; strategies
//! only ever read output lines through the time-series buffer contract.

pub mod engine;

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::bar::{Bar, Timeframe};
use crate::error::{Error, Result};
use crate::series::TimeSeriesBuffer;

/// Moving-average smoothing method. Closed enumeration: unrecognized names
/// are a configuration fault, never a silent default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaMethod {
    Sma,
    Ema,
    Smma,
    Lwma,
}

impl std::str::FromStr for MaMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "Sma" => Ok(MaMethod::Sma),
            "Ema" => Ok(MaMethod::Ema),
            "Smma" => Ok(MaMethod::Smma),
            "Lwma" => Ok(MaMethod::Lwma),
            other => Err(Error::UnknownName {
                what: "ma_method",
                name: other.to_string(),
            }),
        }
    }
}

/// Which bar price an indicator consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppliedPrice {
    Close,
    Open,
    High,
    Low,
    Median,
    Typical,
    Weighted,
}

impl AppliedPrice {
    pub fn apply(&self, bar: &Bar) -> f64 {
        match self {
            AppliedPrice::Close => bar.close,
            AppliedPrice::Open => bar.open,
            AppliedPrice::High => bar.high,
            AppliedPrice::Low => bar.low,
            AppliedPrice::Median => (bar.high + bar.low) / 2.0,
            AppliedPrice::Typical => (bar.high + bar.low + bar.close) / 3.0,
            AppliedPrice::Weighted => (bar.high + bar.low + 2.0 * bar.close) / 4.0,
        }
    }
}

impl std::str::FromStr for AppliedPrice {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "Close" => Ok(AppliedPrice::Close),
            "Open" => Ok(AppliedPrice::Open),
            "High" => Ok(AppliedPrice::High),
            "Low" => Ok(AppliedPrice::Low),
            "Median" => Ok(AppliedPrice::Median),
            "Typical" => Ok(AppliedPrice::Typical),
            "Weighted" => Ok(AppliedPrice::Weighted),
            other => Err(Error::UnknownName {
                what: "applied_price",
                name: other.to_string(),
            }),
        }
    }
}

/// Generic variant-typed parameter, for config-driven late binding of
/// strategy parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    pub fn as_int(&self) -> Result<i64> {
        match self {
            ParamValue::Int(v) => Ok(*v),
            other => Err(Error::Config(format!("expected integer parameter, got {other:?}"))),
        }
    }

    pub fn as_float(&self) -> Result<f64> {
        match self {
            ParamValue::Float(v) => Ok(*v),
            ParamValue::Int(v) => Ok(*v as f64),
            other => Err(Error::Config(format!("expected float parameter, got {other:?}"))),
        }
    }

    pub fn as_text(&self) -> Result<&str> {
        match self {
            ParamValue::Text(v) => Ok(v),
            other => Err(Error::Config(format!("expected string parameter, got {other:?}"))),
        }
    }
}

impl TryFrom<&toml::Value> for ParamValue {
    type Error = Error;

    fn try_from(value: &toml::Value) -> Result<Self> {
        match value {
            toml::Value::Integer(v) => Ok(ParamValue::Int(*v)),
            toml::Value::Float(v) => Ok(ParamValue::Float(*v)),
            toml::Value::String(v) => Ok(ParamValue::Text(v.clone())),
            other => Err(Error::Config(format!("unsupported parameter value: {other}"))),
        }
    }
}

/// Indicator family plus its bound parameters. Validated at construction,
/// closed for runtime string dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorKind {
    MovingAverage {
        period: usize,
        shift: usize,
        method: MaMethod,
        applied: AppliedPrice,
    },
    ParabolicSar {
        step: f64,
        maximum: f64,
    },
}

impl IndicatorKind {
    /// Number of output lines this indicator exposes.
    pub fn lines(&self) -> usize {
        match self {
            IndicatorKind::MovingAverage { .. } => 1,
            IndicatorKind::ParabolicSar { .. } => 1,
        }
    }
}

/// Identity of one indicator instance: (instrument, timeframe, kind+params).
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSpec {
    pub instrument: String,
    pub timeframe: Timeframe,
    pub kind: IndicatorKind,
}

/// Output-line storage shared between the computing engine and the reading
/// strategy. Single-threaded: engine writes on bar completion, strategies
/// read in their event handlers, never concurrently.
#[derive(Default)]
pub struct IndicatorState {
    pub lines: Vec<TimeSeriesBuffer<f64>>,
}

/// Read handle over one indicator's output lines.
///
/// Created once per strategy at parameter-set time; the external engine keeps
/// the lines current as bars complete. Cloning the handle clones the `Rc`,
/// not the buffers.
#[derive(Clone)]
pub struct IndicatorHandle {
    spec: IndicatorSpec,
    state: Rc<RefCell<IndicatorState>>,
}

impl IndicatorHandle {
    pub fn new(spec: IndicatorSpec, state: Rc<RefCell<IndicatorState>>) -> Self {
        Self { spec, state }
    }

    pub fn spec(&self) -> &IndicatorSpec {
        &self.spec
    }

    /// Borrow one output line. Panics if `line` is out of range for the
    /// indicator kind (contract violation).
    pub fn line(&self, line: usize) -> Ref<'_, TimeSeriesBuffer<f64>> {
        Ref::map(self.state.borrow(), |s| &s.lines[line])
    }

    /// Stored length of line 0; strategies use this as their warm-up guard.
    pub fn len(&self) -> usize {
        self.state.borrow().lines.first().map_or(0, |l| l.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The indicator-computation collaborator. `attach` binds a parameter set and
/// returns a handle; `on_bar` is the engine's cue to extend every matching
/// indicator by one completed bar.
pub trait IndicatorSource {
    fn attach(&mut self, spec: IndicatorSpec) -> Result<IndicatorHandle>;

    fn on_bar(&mut self, instrument: &str, timeframe: Timeframe, bar: &Bar);
}
