//! Dual moving-average + parabolic-stop trend strategy.
//!
//! Flat/Long/Short state machine. Transitions happen only in the new-bar
//! handler: a strict fast/slow cross between bars 2 and 1, confirmed by the
//! parabolic stop sitting outside bar 1's range. Unconfirmed or ambiguous
//! signals are a deliberate no-op.

use crate::bar::{Bar, Timeframe};
use crate::error::{Error, Result};
use crate::indicator::{
    AppliedPrice, IndicatorHandle, IndicatorKind, IndicatorSource, IndicatorSpec, MaMethod,
    ParamValue,
};
use crate::series::TimeSeriesBuffer;
use crate::strategy::{Strategy, StrategyContext};

#[derive(Debug, Clone, PartialEq)]
pub struct DblMaPsarParams {
    pub fast_period: usize,
    pub slow_period: usize,
    pub method: MaMethod,
    pub applied: AppliedPrice,
    pub sar_step: f64,
    pub sar_maximum: f64,
}

impl DblMaPsarParams {
    /// Bind from a generic variant-typed parameter list (config-driven path):
    /// `[fast, slow, ma_method, applied_price, sar_step, sar_maximum]`.
    /// Enum names resolve against their closed enumerations; an unrecognized
    /// name is a fault, never a silent default.
    pub fn from_values(values: &[ParamValue]) -> Result<Self> {
        if values.len() != 6 {
            return Err(Error::Config(format!(
                "DblMaPsar takes 6 parameters, got {}",
                values.len()
            )));
        }
        Ok(Self {
            fast_period: values[0].as_int()? as usize,
            slow_period: values[1].as_int()? as usize,
            method: values[2].as_text()?.parse()?,
            applied: values[3].as_text()?.parse()?,
            sar_step: values[4].as_float()?,
            sar_maximum: values[5].as_float()?,
        })
    }
}

pub struct DblMaPsarStrategy {
    id: String,
    instrument: String,
    timeframe: Timeframe,
    bars: TimeSeriesBuffer<Bar>,
    fast_ma: IndicatorHandle,
    slow_ma: IndicatorHandle,
    psar: IndicatorHandle,
    position: i32,
}

impl DblMaPsarStrategy {
    pub fn new(
        id: impl Into<String>,
        instrument: impl Into<String>,
        timeframe: Timeframe,
        params: DblMaPsarParams,
        indicators: &mut dyn IndicatorSource,
    ) -> Result<Self> {
        let id = id.into();
        let instrument = instrument.into();
        tracing::debug!(strategy = %id, ?params, "binding DblMaPsar parameters");

        let ma = |period| IndicatorSpec {
            instrument: instrument.clone(),
            timeframe,
            kind: IndicatorKind::MovingAverage {
                period,
                shift: 0,
                method: params.method,
                applied: params.applied,
            },
        };
        let fast_ma = indicators.attach(ma(params.fast_period))?;
        let slow_ma = indicators.attach(ma(params.slow_period))?;
        let psar = indicators.attach(IndicatorSpec {
            instrument: instrument.clone(),
            timeframe,
            kind: IndicatorKind::ParabolicSar {
                step: params.sar_step,
                maximum: params.sar_maximum,
            },
        })?;

        Ok(Self {
            id,
            instrument,
            timeframe,
            bars: TimeSeriesBuffer::new(),
            fast_ma,
            slow_ma,
            psar,
            position: 0,
        })
    }
}

impl Strategy for DblMaPsarStrategy {
    fn name(&self) -> &str {
        &self.id
    }

    fn on_new_bar(
        &mut self,
        instrument: &str,
        timeframe: Timeframe,
        bar: &Bar,
        _ctx: &mut StrategyContext<'_>,
    ) {
        if instrument != self.instrument || timeframe != self.timeframe {
            return;
        }
        self.bars.push(bar.clone());

        // indexes 1 and 2 must be addressable on every line
        if self.bars.len() < 2
            || self.fast_ma.len() < 2
            || self.slow_ma.len() < 2
            || self.psar.len() < 2
        {
            return;
        }

        let (fast1, fast2, slow1, slow2, psar1) = {
            let fast = self.fast_ma.line(0);
            let slow = self.slow_ma.line(0);
            let psar = self.psar.line(0);
            fast.set_series_mode(true);
            slow.set_series_mode(true);
            psar.set_series_mode(true);
            (*fast.get(1), *fast.get(2), *slow.get(1), *slow.get(2), *psar.get(1))
        };
        let prev_bar = self.bars.get(1);

        // NaN warm-up values fail every comparison, keeping the machine silent.
        if fast1 > slow1 && fast2 <= slow2 && psar1 < prev_bar.low && self.position != 1 {
            self.position = 1;
            tracing::info!(strategy = %self.id, instrument = %self.instrument,
                fast1, slow1, psar1, "cross up confirmed, going long");
        }

        if fast1 < slow1 && fast2 >= slow2 && psar1 > prev_bar.high && self.position != -1 {
            self.position = -1;
            tracing::info!(strategy = %self.id, instrument = %self.instrument,
                fast1, slow1, psar1, "cross down confirmed, going short");
        }
    }

    fn position(&self) -> i32 {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::RecordingGateway;
    use crate::indicator::IndicatorState;
    use crate::market::MarketSnapshotStore;
    use chrono::{DateTime, Utc};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Indicator source that replays canned line values, one per bar, in
    /// attach order (fast, slow, psar for this strategy).
    struct ScriptedSource {
        scripts: Vec<Vec<f64>>,
        attached: Vec<(Rc<RefCell<IndicatorState>>, Vec<f64>, usize)>,
    }

    impl ScriptedSource {
        fn new(scripts: Vec<Vec<f64>>) -> Self {
            let mut scripts = scripts;
            scripts.reverse(); // pop() hands them out in attach order
            Self { scripts, attached: Vec::new() }
        }
    }

    impl IndicatorSource for ScriptedSource {
        fn attach(&mut self, spec: IndicatorSpec) -> Result<IndicatorHandle> {
            let script = self.scripts.pop().expect("script for every attach");
            let state = Rc::new(RefCell::new(IndicatorState {
                lines: vec![TimeSeriesBuffer::new()],
            }));
            let handle = IndicatorHandle::new(spec, Rc::clone(&state));
            self.attached.push((state, script, 0));
            Ok(handle)
        }

        fn on_bar(&mut self, _instrument: &str, _timeframe: Timeframe, _bar: &Bar) {
            for (state, script, cursor) in &mut self.attached {
                if let Some(value) = script.get(*cursor) {
                    state.borrow_mut().lines[0].push(*value);
                    *cursor += 1;
                }
            }
        }
    }

    fn bar(i: i64, low: f64, high: f64) -> Bar {
        Bar {
            time: DateTime::<Utc>::from_timestamp(i * 300, 0).unwrap(),
            open: (low + high) / 2.0,
            high,
            low,
            close: (low + high) / 2.0,
            volume: 0,
        }
    }

    /// Drive the strategy bar by bar, returning it plus the position
    /// observed after every evaluation.
    fn run(scripts: Vec<Vec<f64>>, bars: &[Bar]) -> (DblMaPsarStrategy, Vec<i32>) {
        let mut source = ScriptedSource::new(scripts);
        let params = DblMaPsarParams {
            fast_period: 2,
            slow_period: 3,
            method: MaMethod::Sma,
            applied: AppliedPrice::Close,
            sar_step: 0.02,
            sar_maximum: 0.2,
        };
        let mut strategy =
            DblMaPsarStrategy::new("dmp1", "cu1907", Timeframe::M5, params, &mut source).unwrap();

        let store = MarketSnapshotStore::new(vec!["cu1907".into()]);
        let mut gw = RecordingGateway::default();
        let mut positions = Vec::with_capacity(bars.len());
        for b in bars {
            source.on_bar("cu1907", Timeframe::M5, b);
            let mut ctx = StrategyContext { markets: &store, gateway: &mut gw };
            strategy.on_new_bar("cu1907", Timeframe::M5, b, &mut ctx);
            positions.push(strategy.position());
        }
        (strategy, positions)
    }

    #[test]
    fn test_confirmed_cross_up_goes_long_once() {
        // chronological: fast crosses above slow on the third bar, psar below
        let bars = [bar(0, 6.0, 12.0), bar(1, 6.0, 12.0), bar(2, 6.0, 12.0), bar(3, 6.0, 12.0)];
        let (strategy, positions) = run(
            vec![
                vec![8.0, 9.0, 10.0, 10.0], // fast
                vec![9.0, 9.0, 9.0, 9.0],   // slow
                vec![5.0, 5.0, 5.0, 5.0],   // psar
            ],
            &bars,
        );
        assert_eq!(strategy.position(), 1);
        // flat until the cross confirms, then long; the fourth bar repeats
        // the same values and must not produce a fresh transition
        assert_eq!(positions, vec![0, 0, 1, 1]);
        let transitions = positions
            .windows(2)
            .filter(|w| w[0] != w[1])
            .count()
            + usize::from(positions[0] != 0);
        assert_eq!(transitions, 1);
    }

    #[test]
    fn test_cross_without_psar_confirmation_is_silent() {
        let bars = [bar(0, 6.0, 12.0), bar(1, 6.0, 12.0), bar(2, 6.0, 12.0)];
        let (_, positions) = run(
            vec![
                vec![8.0, 9.0, 10.0],
                vec![9.0, 9.0, 9.0],
                vec![7.0, 7.0, 7.0], // inside the bar range: no confirmation
            ],
            &bars,
        );
        assert_eq!(positions, vec![0, 0, 0]);
    }

    #[test]
    fn test_confirmed_cross_down_goes_short() {
        let bars = [bar(0, 6.0, 12.0), bar(1, 6.0, 12.0), bar(2, 6.0, 12.0)];
        let (strategy, _) = run(
            vec![
                vec![10.0, 9.0, 8.0],
                vec![9.0, 9.0, 9.0],
                vec![14.0, 14.0, 14.0], // above the highs
            ],
            &bars,
        );
        assert_eq!(strategy.position(), -1);
    }

    #[test]
    fn test_warm_up_nans_stay_silent() {
        let bars = [bar(0, 6.0, 12.0), bar(1, 6.0, 12.0), bar(2, 6.0, 12.0)];
        let (_, positions) = run(
            vec![
                vec![f64::NAN, 9.0, 10.0],
                vec![f64::NAN, f64::NAN, 9.0],
                vec![5.0, 5.0, 5.0],
            ],
            &bars,
        );
        assert_eq!(positions, vec![0, 0, 0]);
    }

    #[test]
    fn test_variant_parameters_resolve_by_name() {
        let params = DblMaPsarParams::from_values(&[
            ParamValue::Int(3),
            ParamValue::Int(5),
            ParamValue::Text("Ema".into()),
            ParamValue::Text("Close".into()),
            ParamValue::Float(0.02),
            ParamValue::Float(0.2),
        ])
        .unwrap();
        assert_eq!(params.method, MaMethod::Ema);
        assert_eq!(params.applied, AppliedPrice::Close);
    }

    #[test]
    fn test_unknown_enum_name_reported() {
        let err = DblMaPsarParams::from_values(&[
            ParamValue::Int(3),
            ParamValue::Int(5),
            ParamValue::Text("Hull".into()),
            ParamValue::Text("Close".into()),
            ParamValue::Float(0.02),
            ParamValue::Float(0.2),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::UnknownName { what: "ma_method", .. }));
    }
}
