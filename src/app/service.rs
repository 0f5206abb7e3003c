//! Probe service: the hexagonal core.
//!
//! [`ProbeService`] owns every piece of mutable sampling state: the duty
//! cycle controller, the frequency filter, the flow estimator and the two
//! periodic timers.  All I/O flows through port traits injected at call
//! sites.
//!
//! ```text
//!  IntervalPort ──▶ ┌─────────────────────────────┐ ──▶ TelemetrySink(s)
//!  PulsePort    ──▶ │        ProbeService         │ ──▶ EventSink
//!  ClockPort    ──▶ │ duty · filter · flow · TDS  │
//!  PowerControl ◀── └─────────────────────────────┘
//! ```
//!
//! One [`tick`](ProbeService::tick):
//!
//! 1. advance the duty cycle from the clock; on entering MEASURE, flush
//!    whatever warm-up intervals are still queued;
//! 2. unless OFF, wait briefly for one interval: filter it in MEASURE,
//!    discard it in WARMUP;
//! 3. on a flow epoch boundary, drain the pulse count and recompute flow;
//! 4. on a report boundary, format a record and hand it to every ready
//!    sink and to the event sink.

use log::{debug, info, warn};

use crate::config::{FilterResetPolicy, ProbeConfig};
use crate::fsm::{DutyCycleController, DutyState};
use crate::scheduler::Periodic;
use crate::sensors::flow::FlowRateEstimator;
use crate::sensors::frequency::FrequencyFilter;
use crate::tds::TdsModel;
use crate::telemetry::{Measurement, TelemetryFrame, TelemetryRecord, format_record};

use super::events::AppEvent;
use super::ports::{ClockPort, EventSink, IntervalPort, PowerControl, PulsePort, TelemetrySink};

/// Running counters since [`ProbeService::start`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbeStats {
    /// Intervals fed to the filter.
    pub samples_filtered: u32,
    /// Intervals dequeued during warm-up, or still queued on entering
    /// MEASURE, and thrown away.
    pub samples_discarded: u32,
    /// Intervals refused by the filter (zero length).
    pub samples_rejected: u32,
    /// Intervals lost to a full channel, as reported by the hand-off.
    pub intervals_dropped: u32,
    pub records_emitted: u32,
    /// Ready sinks that failed to take a record.
    pub sink_failures: u32,
    /// Sinks skipped because they were not ready.
    pub sinks_not_ready: u32,
    /// MEASURE → OFF transitions.
    pub cycles_completed: u32,
}

pub struct ProbeService {
    duty: DutyCycleController,
    filter: FrequencyFilter,
    flow: FlowRateEstimator,
    model: TdsModel,
    filter_reset: FilterResetPolicy,
    interval_wait_us: u32,
    flow_epoch: Periodic,
    report: Periodic,
    stats: ProbeStats,
}

impl ProbeService {
    /// Build the service.  `config` must already be validated.
    ///
    /// Does **not** touch hardware; call [`start`](Self::start) next.
    pub fn new(config: &ProbeConfig) -> Self {
        Self {
            duty: DutyCycleController::new(config),
            filter: FrequencyFilter::new(config.alpha),
            flow: FlowRateEstimator::from_config(config),
            model: config.model,
            filter_reset: config.filter_reset,
            interval_wait_us: config.interval_wait_ms.saturating_mul(1_000),
            flow_epoch: Periodic::from_millis(config.flow_epoch_ms),
            report: Periodic::from_millis(config.report_interval_ms),
            stats: ProbeStats::default(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Enter OFF with the sensor powered down and start both timers.
    pub fn start(&mut self, hw: &mut (impl ClockPort + PowerControl), events: &mut impl EventSink) {
        let now = hw.now_us();
        self.duty.start(now, hw);
        self.flow_epoch.reset(now);
        self.report.reset(now);
        self.stats = ProbeStats::default();
        events.emit(&AppEvent::Started(self.duty.state()));
        info!("ProbeService started in {}", self.duty.state());
    }

    /// Power the sensor down.  The service can be started again afterwards.
    pub fn shutdown(&mut self, power: &mut impl PowerControl, events: &mut impl EventSink) {
        self.duty.shutdown(power);
        events.emit(&AppEvent::Stopped);
        info!(
            "ProbeService stopped after {} records, {} cycles",
            self.stats.records_emitted, self.stats.cycles_completed
        );
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one scheduler iteration.
    ///
    /// `hw` satisfies every hardware port at once, which avoids a double
    /// mutable borrow while keeping the port boundary explicit.
    pub fn tick(
        &mut self,
        hw: &mut (impl ClockPort + PowerControl + IntervalPort + PulsePort),
        sinks: &mut [&mut dyn TelemetrySink],
        events: &mut impl EventSink,
    ) {
        // 1. Duty cycle
        let now = hw.now_us();
        if let Some(t) = self.duty.advance(now, hw) {
            events.emit(&AppEvent::StateChanged {
                from: t.from,
                to: t.to,
            });
            if t.to == DutyState::Measure {
                let stale = hw.discard_pending();
                self.stats.samples_discarded += stale;
                if stale > 0 {
                    debug!("measure: flushed {} warm-up intervals", stale);
                }
            }
            if t.to == DutyState::Off {
                self.stats.cycles_completed = self.duty.cycles();
                if self.filter_reset == FilterResetPolicy::ResetOnPowerDown {
                    self.filter.reset();
                    debug!("filter reset on power down");
                }
            }
        }

        // 2. Interval hand-off
        let state = self.duty.state();
        if state.is_powered() {
            if let Some(interval) = hw.recv_interval(self.interval_wait_us) {
                self.consume_interval(state, interval, events);
            }
        }
        self.stats.intervals_dropped = hw.dropped_intervals();

        // 3. Flow epoch
        if self.flow_epoch.poll(now) {
            let reading = self.flow.update(hw.drain_pulses());
            debug!(
                "flow epoch: {} pulses, {:.3} L/min",
                reading.pulse_count, reading.flow_rate
            );
        }

        // 4. Report
        if self.report.poll(now) {
            let record = format_record(&self.frame());
            self.publish(&record, sinks, events);
        }
    }

    fn consume_interval(&mut self, state: DutyState, interval: u32, events: &mut impl EventSink) {
        if !state.accepts_samples() {
            self.stats.samples_discarded += 1;
            debug!("warm-up: discarded {}us interval", interval);
            return;
        }
        match self.filter.observe(interval) {
            Ok(sample) => {
                self.stats.samples_filtered += 1;
                debug!(
                    "sample {}us: raw {:.2} Hz, filtered {:.2} Hz",
                    interval, sample.raw_hz, sample.filtered_hz
                );
            }
            Err(e) => {
                self.stats.samples_rejected += 1;
                events.emit(&AppEvent::SampleRejected(e));
            }
        }
    }

    fn publish(
        &mut self,
        record: &TelemetryRecord,
        sinks: &mut [&mut dyn TelemetrySink],
        events: &mut impl EventSink,
    ) {
        self.stats.records_emitted += 1;
        for sink in sinks.iter_mut() {
            if !sink.is_ready() {
                self.stats.sinks_not_ready += 1;
                debug!("{}: not ready, record skipped", sink.name());
                continue;
            }
            if let Err(error) = sink.send(record) {
                self.stats.sink_failures += 1;
                warn!("{}: send failed: {}", sink.name(), error);
                events.emit(&AppEvent::SinkFailed {
                    sink: sink.name(),
                    error,
                });
            }
        }
        events.emit(&AppEvent::Report(record.clone()));
    }

    // ── Queries ───────────────────────────────────────────────

    /// What a report taken now would contain.  Before the filter's first
    /// sample the frequencies read as zero.
    pub fn frame(&self) -> TelemetryFrame {
        match self.duty.state() {
            DutyState::Off => TelemetryFrame::Off,
            DutyState::Warmup => TelemetryFrame::Warmup,
            DutyState::Measure => {
                let filtered_hz = self.filter.filtered_hz().unwrap_or(0.0);
                let flow_rate = self.flow.rate();
                TelemetryFrame::Measure(Measurement {
                    raw_hz: self.filter.last_raw_hz().unwrap_or(0.0),
                    filtered_hz,
                    flow_rate,
                    tds: self.model.estimate(filtered_hz, flow_rate),
                })
            }
        }
    }

    pub fn state(&self) -> DutyState {
        self.duty.state()
    }

    pub fn filtered_hz(&self) -> Option<f32> {
        self.filter.filtered_hz()
    }

    pub fn flow_rate(&self) -> f32 {
        self.flow.rate()
    }

    pub fn stats(&self) -> ProbeStats {
        self.stats
    }
}
