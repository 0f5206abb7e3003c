//! Edge capture → frequency filter → flow → record, tick by tick.

use std::cell::Cell;
use std::rc::Rc;

use tdsprobe::app::events::AppEvent;
use tdsprobe::app::ports::{ClockPort, IntervalPort, PowerControl, PulsePort};
use tdsprobe::app::service::ProbeService;
use tdsprobe::config::ProbeConfig;
use tdsprobe::error::SensorError;
use tdsprobe::fsm::DutyState;
use tdsprobe::sensors::edge_timer::{EdgeOutcome, EdgeTimer};
use tdsprobe::sensors::flow::FlowCounter;

use crate::mock_hw::{RecordingEvents, S, SimHardware};

const TICK_US: u64 = 10_000;

struct Probe {
    svc: ProbeService,
    hw: SimHardware,
    events: RecordingEvents,
}

impl Probe {
    fn started() -> Self {
        let mut hw = SimHardware::new(Rc::new(Cell::new(0)));
        let mut events = RecordingEvents::default();
        let mut svc = ProbeService::new(&ProbeConfig::default());
        svc.start(&mut hw, &mut events);
        Self { svc, hw, events }
    }

    fn tick(&mut self) {
        self.hw.clock.set(self.hw.clock.get() + TICK_US);
        self.svc.tick(&mut self.hw, &mut [], &mut self.events);
    }

    fn run_until(&mut self, t: u64) {
        while self.hw.clock.get() < t {
            self.tick();
        }
    }

    /// Straight into MEASURE with nothing filtered yet.
    fn measuring() -> Self {
        let mut probe = Self::started();
        probe.run_until(25 * S);
        assert_eq!(probe.svc.state(), DutyState::Measure);
        assert_eq!(probe.svc.filtered_hz(), None);
        probe
    }
}

#[test]
fn measure_before_any_sample_reports_zero_frequency() {
    let mut probe = Probe::measuring();
    probe.run_until(26 * S);
    assert_eq!(
        probe.events.reports().last().map(String::as_str),
        Some("0.00,0.00,0.000,3.57\n")
    );
}

#[test]
fn filter_smooths_toward_a_frequency_step() {
    let mut probe = Probe::measuring();
    probe.hw.scripted.extend([2_000, 1_000]);
    probe.tick();
    assert_eq!(probe.svc.filtered_hz(), Some(500.0));
    probe.tick();
    let filtered = probe.svc.filtered_hz().unwrap();
    assert!((filtered - 550.0).abs() < 1e-3, "filtered {filtered}");
    assert_eq!(probe.svc.stats().samples_filtered, 2);
}

#[test]
fn zero_interval_leaves_filter_unchanged() {
    let mut probe = Probe::measuring();
    probe.hw.scripted.extend([2_000, 0, 2_500]);
    probe.tick();
    probe.tick();
    assert_eq!(probe.svc.filtered_hz(), Some(500.0));
    assert!(
        probe
            .events
            .0
            .contains(&AppEvent::SampleRejected(SensorError::ZeroInterval))
    );
    probe.tick();
    let filtered = probe.svc.filtered_hz().unwrap();
    assert!((filtered - 490.0).abs() < 1e-3, "filtered {filtered}");
    assert_eq!(probe.svc.stats().samples_rejected, 1);
}

#[test]
fn dropped_intervals_are_counted_not_filtered() {
    let mut probe = Probe::measuring();
    probe.hw.scripted.push_back(2_000);
    probe.tick();
    probe.hw.dropped = 7;
    probe.tick();
    assert_eq!(probe.svc.stats().intervals_dropped, 7);
    assert_eq!(probe.svc.filtered_hz(), Some(500.0));
}

#[test]
fn warmup_samples_never_reach_the_filter() {
    let mut probe = Probe::started();
    probe.hw.oscillator_us = Some(1_000);
    probe.run_until(25 * S - TICK_US);
    assert_eq!(probe.svc.state(), DutyState::Warmup);
    assert_eq!(probe.svc.filtered_hz(), None);
    assert_eq!(probe.svc.stats().samples_discarded, 20 * 100);

    probe.hw.oscillator_us = Some(2_000);
    probe.tick();
    assert_eq!(probe.svc.filtered_hz(), Some(500.0));
}

#[test]
fn edge_timer_intervals_drive_the_filter() {
    let edges: EdgeTimer<8> = EdgeTimer::new();
    assert_eq!(edges.on_rising_edge(10_000), EdgeOutcome::Seeded);
    for i in 1..=3u64 {
        assert_eq!(
            edges.on_rising_edge(10_000 + i * 4_000),
            EdgeOutcome::Queued(4_000)
        );
    }

    let mut probe = Probe::measuring();
    while let Some(interval) = edges.try_take() {
        probe.hw.scripted.push_back(interval);
    }
    for _ in 0..3 {
        probe.tick();
    }
    assert_eq!(probe.svc.filtered_hz(), Some(250.0));
    assert_eq!(probe.svc.stats().samples_filtered, 3);
}

#[test]
fn flow_counter_pulses_become_flow_rate() {
    let counter = FlowCounter::new();
    for _ in 0..30 {
        counter.on_rising_edge();
    }

    let mut probe = Probe::measuring();
    probe.hw.pulses_per_drain = counter.drain();
    assert_eq!(counter.drain(), 0);
    probe.run_until(26 * S);
    assert!((probe.svc.flow_rate() - 0.4).abs() < 1e-6);
}

/// Service ports backed by a real edge timer, with a clock advanced by hand.
struct EdgeBench {
    now: u64,
    powered: bool,
    edges: EdgeTimer,
    next_edge_us: u64,
}

impl EdgeBench {
    /// Fire every edge of a square wave up to `now`.  The period is 1 ms
    /// before `switch_at` and 2 ms from then on.
    fn emit_edges(&mut self, switch_at: u64) {
        while self.next_edge_us <= self.now {
            self.edges.on_rising_edge(self.next_edge_us);
            let period = if self.next_edge_us < switch_at { 1_000 } else { 2_000 };
            self.next_edge_us += period;
        }
    }
}

impl ClockPort for EdgeBench {
    fn now_us(&self) -> u64 {
        self.now
    }
}

impl PowerControl for EdgeBench {
    fn assert_power(&mut self) {
        self.powered = true;
    }
    fn deassert_power(&mut self) {
        self.powered = false;
    }
}

impl IntervalPort for EdgeBench {
    fn recv_interval(&mut self, _timeout_us: u32) -> Option<u32> {
        self.edges.try_take()
    }
    fn discard_pending(&mut self) -> u32 {
        self.edges.clear() as u32
    }
    fn dropped_intervals(&self) -> u32 {
        self.edges.dropped()
    }
}

impl PulsePort for EdgeBench {
    fn drain_pulses(&mut self) -> u32 {
        0
    }
}

#[test]
fn warmup_backlog_is_flushed_before_measuring() {
    let mut bench = EdgeBench {
        now: 0,
        powered: false,
        edges: EdgeTimer::new(),
        next_edge_us: 5 * S,
    };
    let mut events = RecordingEvents::default();
    let mut svc = ProbeService::new(&ProbeConfig::default());
    svc.start(&mut bench, &mut events);

    // 1 kHz through warm-up, 500 Hz once the last warm-up edge has passed.
    let switch_at = 25 * S - 1_000;
    while bench.now < 25 * S {
        bench.now += TICK_US;
        if bench.powered {
            bench.emit_edges(switch_at);
        }
        svc.tick(&mut bench, &mut [], &mut events);
    }
    assert_eq!(svc.state(), DutyState::Measure);
    assert_eq!(svc.filtered_hz(), None, "warm-up interval reached the filter");
    assert_eq!(bench.edges.pending(), 0);

    bench.now += TICK_US;
    bench.emit_edges(switch_at);
    svc.tick(&mut bench, &mut [], &mut events);
    assert_eq!(svc.filtered_hz(), Some(500.0));
    assert!(svc.stats().intervals_dropped > 0);
}
