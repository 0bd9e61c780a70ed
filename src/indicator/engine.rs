//! Built-in indicator computation — incremental MA family and Parabolic SAR.
//!
//! Reference implementation of the [`IndicatorSource`](super::IndicatorSource)
//! contract. Values for bars inside the warm-up window are `f64::NAN`, which
//! keeps strategy comparisons silently false until lines are populated.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::bar::{Bar, Timeframe};
use crate::error::Result;
use crate::indicator::{
    IndicatorHandle, IndicatorKind, IndicatorSource, IndicatorSpec, IndicatorState, MaMethod,
};
use crate::series::TimeSeriesBuffer;

pub struct BuiltinIndicatorEngine {
    registrations: Vec<Registration>,
}

struct Registration {
    spec: IndicatorSpec,
    state: Rc<RefCell<IndicatorState>>,
    calc: Calc,
}

enum Calc {
    Ma(MaCalc),
    Sar(SarCalc),
}

impl BuiltinIndicatorEngine {
    pub fn new() -> Self {
        Self {
            registrations: Vec::new(),
        }
    }
}

impl Default for BuiltinIndicatorEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl IndicatorSource for BuiltinIndicatorEngine {
    fn attach(&mut self, spec: IndicatorSpec) -> Result<IndicatorHandle> {
        let calc = match &spec.kind {
            IndicatorKind::MovingAverage { period, method, applied, .. } => Calc::Ma(MaCalc {
                period: (*period).max(1),
                method: *method,
                applied: *applied,
                window: VecDeque::new(),
                seed_sum: 0.0,
                count: 0,
                prev: f64::NAN,
            }),
            IndicatorKind::ParabolicSar { step, maximum } => Calc::Sar(SarCalc {
                step: *step,
                maximum: *maximum,
                prev_bar: None,
                trend: None,
            }),
        };

        let lines = (0..spec.kind.lines()).map(|_| TimeSeriesBuffer::new()).collect();
        let state = Rc::new(RefCell::new(IndicatorState { lines }));
        let handle = IndicatorHandle::new(spec.clone(), Rc::clone(&state));

        tracing::debug!(instrument = %spec.instrument, timeframe = %spec.timeframe,
            kind = ?spec.kind, "indicator attached");
        self.registrations.push(Registration { spec, state, calc });
        Ok(handle)
    }

    fn on_bar(&mut self, instrument: &str, timeframe: Timeframe, bar: &Bar) {
        for reg in &mut self.registrations {
            if reg.spec.instrument != instrument || reg.spec.timeframe != timeframe {
                continue;
            }
            let value = match &mut reg.calc {
                Calc::Ma(calc) => calc.step(bar),
                Calc::Sar(calc) => calc.step(bar),
            };
            let mut state = reg.state.borrow_mut();
            let line = &mut state.lines[0];
            line.push(value);
            line.set_current(value);
        }
    }
}

struct MaCalc {
    period: usize,
    method: MaMethod,
    applied: crate::indicator::AppliedPrice,
    window: VecDeque<f64>,
    seed_sum: f64,
    count: usize,
    prev: f64,
}

impl MaCalc {
    fn step(&mut self, bar: &Bar) -> f64 {
        let price = self.applied.apply(bar);
        self.count += 1;

        match self.method {
            MaMethod::Sma => {
                self.window.push_back(price);
                if self.window.len() > self.period {
                    self.window.pop_front();
                }
                if self.window.len() < self.period {
                    f64::NAN
                } else {
                    self.window.iter().sum::<f64>() / self.period as f64
                }
            }
            MaMethod::Lwma => {
                self.window.push_back(price);
                if self.window.len() > self.period {
                    self.window.pop_front();
                }
                if self.window.len() < self.period {
                    f64::NAN
                } else {
                    let mut num = 0.0;
                    let mut den = 0.0;
                    for (i, p) in self.window.iter().enumerate() {
                        let w = (i + 1) as f64;
                        num += w * p;
                        den += w;
                    }
                    num / den
                }
            }
            // Ema and Smma seed with the SMA of the first full window, then
            // recurse on the previous value.
            MaMethod::Ema => {
                if self.count < self.period {
                    self.seed_sum += price;
                    f64::NAN
                } else if self.count == self.period {
                    self.seed_sum += price;
                    self.prev = self.seed_sum / self.period as f64;
                    self.prev
                } else {
                    let k = 2.0 / (self.period as f64 + 1.0);
                    self.prev += k * (price - self.prev);
                    self.prev
                }
            }
            MaMethod::Smma => {
                if self.count < self.period {
                    self.seed_sum += price;
                    f64::NAN
                } else if self.count == self.period {
                    self.seed_sum += price;
                    self.prev = self.seed_sum / self.period as f64;
                    self.prev
                } else {
                    self.prev = (self.prev * (self.period as f64 - 1.0) + price) / self.period as f64;
                    self.prev
                }
            }
        }
    }
}

struct SarCalc {
    step: f64,
    maximum: f64,
    prev_bar: Option<Bar>,
    trend: Option<SarTrend>,
}

struct SarTrend {
    rising: bool,
    af: f64,
    ep: f64,
    sar: f64,
}

impl SarCalc {
    fn step(&mut self, bar: &Bar) -> f64 {
        let Some(prev) = self.prev_bar.take() else {
            // first bar: no direction yet
            self.prev_bar = Some(bar.clone());
            return f64::NAN;
        };

        let value = match &mut self.trend {
            None => {
                // establish the initial direction from the first two bars
                let rising = bar.close >= prev.close;
                let trend = SarTrend {
                    rising,
                    af: self.step,
                    ep: if rising { bar.high } else { bar.low },
                    sar: if rising { prev.low } else { prev.high },
                };
                let sar = trend.sar;
                self.trend = Some(trend);
                sar
            }
            Some(t) => {
                let mut sar = t.sar + t.af * (t.ep - t.sar);
                if t.rising {
                    // never rises into the previous bar's range
                    sar = sar.min(prev.low);
                    if bar.low < sar {
                        // reversal: flip below → SAR jumps to the extreme point
                        sar = t.ep;
                        t.rising = false;
                        t.af = self.step;
                        t.ep = bar.low;
                    } else if bar.high > t.ep {
                        t.ep = bar.high;
                        t.af = (t.af + self.step).min(self.maximum);
                    }
                } else {
                    sar = sar.max(prev.high);
                    if bar.high > sar {
                        sar = t.ep;
                        t.rising = true;
                        t.af = self.step;
                        t.ep = bar.high;
                    } else if bar.low < t.ep {
                        t.ep = bar.low;
                        t.af = (t.af + self.step).min(self.maximum);
                    }
                }
                t.sar = sar;
                sar
            }
        };

        self.prev_bar = Some(bar.clone());
        value
    }
}
