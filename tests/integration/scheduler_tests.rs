//! The scheduler loop driven end to end in simulated time.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use tdsprobe::app::events::AppEvent;
use tdsprobe::app::ports::TelemetrySink;
use tdsprobe::app::service::ProbeService;
use tdsprobe::config::ProbeConfig;
use tdsprobe::error::SinkError;
use tdsprobe::fsm::DutyState;
use tdsprobe::scheduler;
use tdsprobe::telemetry::{TelemetryFrame, parse_record};

use crate::mock_hw::{RecordingEvents, RecordingSink, S, SimDelay, SimHardware};

const TICK_MS: u32 = 10;

struct Run {
    hw: SimHardware,
    events: RecordingEvents,
    service: ProbeService,
    ticks: u64,
    heartbeats: u64,
}

/// Run the scheduler from t=0 through a final tick at `secs`.
fn run_for(
    config: &ProbeConfig,
    secs: u64,
    setup: impl FnOnce(&mut SimHardware),
    sinks: &mut [&mut dyn TelemetrySink],
) -> Run {
    let clock = Rc::new(Cell::new(0));
    let stop = Arc::new(AtomicBool::new(false));
    let mut hw = SimHardware::new(clock.clone());
    setup(&mut hw);
    let mut delay = SimDelay {
        clock,
        stop: stop.clone(),
        stop_at_us: secs * S + u64::from(TICK_MS) * 1_000,
    };
    let mut events = RecordingEvents::default();
    let mut service = ProbeService::new(config);
    let mut heartbeats = 0;

    let ticks = scheduler::run(
        &mut service,
        &mut hw,
        sinks,
        &mut events,
        &mut delay,
        TICK_MS,
        &stop,
        || heartbeats += 1,
    );

    Run {
        hw,
        events,
        service,
        ticks,
        heartbeats,
    }
}

#[test]
fn first_measurement_record_matches_steady_500hz() {
    let run = run_for(
        &ProbeConfig::default(),
        25,
        |hw| hw.oscillator_us = Some(2_000),
        &mut [],
    );
    let reports = run.events.reports();
    assert_eq!(reports.len(), 25);
    assert!(reports[..4].iter().all(|r| r == "-,-,-,-\n"));
    assert!(reports[4..24].iter().all(|r| r == "warmup,warmup,warmup,warmup\n"));
    assert_eq!(reports[24], "500.00,500.00,0.000,37.95\n");
}

#[test]
fn flow_pulses_reach_the_record_and_switch_regime() {
    let run = run_for(
        &ProbeConfig::default(),
        26,
        |hw| {
            hw.oscillator_us = Some(2_000);
            hw.pulses_per_drain = 60;
        },
        &mut [],
    );
    let reports = run.events.reports();
    let Ok(TelemetryFrame::Measure(m)) = parse_record(&reports[25]) else {
        panic!("expected a measurement, got {:?}", reports[25]);
    };
    assert_eq!(m.flow_rate, 0.8);
    // High-flow branch: 0.0901·500 + 501.9·0.8 − 266.8
    assert!((m.tds - 179.77).abs() < 0.02, "tds {}", m.tds);
    assert_eq!(run.hw.drains, 26);
}

#[test]
fn stop_flag_ends_loop_and_powers_down() {
    let run = run_for(
        &ProbeConfig::default(),
        30,
        |hw| hw.oscillator_us = Some(2_000),
        &mut [],
    );
    assert_eq!(run.ticks, 30 * 100 + 1);
    assert_eq!(run.heartbeats, run.ticks);
    assert!(!run.hw.powered);
    assert_eq!(run.events.0.first(), Some(&AppEvent::Started(DutyState::Off)));
    assert_eq!(run.events.0.last(), Some(&AppEvent::Stopped));
    // Shutdown leaves the state where it was.
    assert_eq!(run.service.state(), DutyState::Measure);
}

#[test]
fn every_ready_sink_gets_every_record() {
    let mut a = RecordingSink::new("a");
    let mut b = RecordingSink::new("b");
    let mut sinks: [&mut dyn TelemetrySink; 2] = [&mut a, &mut b];
    let run = run_for(&ProbeConfig::default(), 10, |_| {}, &mut sinks);

    assert_eq!(a.received.len(), 10);
    assert_eq!(a.received, b.received);
    assert_eq!(a.received, run.events.reports());
    assert_eq!(run.service.stats().records_emitted, 10);
}

#[test]
fn unready_and_failing_sinks_do_not_block_the_others() {
    let mut good = RecordingSink::new("good");
    let mut down = RecordingSink::not_ready("down");
    let mut broken = RecordingSink::failing("broken", SinkError::Io);
    let mut sinks: [&mut dyn TelemetrySink; 3] = [&mut down, &mut broken, &mut good];
    let run = run_for(&ProbeConfig::default(), 3, |_| {}, &mut sinks);

    assert_eq!(good.received.len(), 3);
    assert!(down.received.is_empty());
    assert!(broken.received.is_empty());

    let stats = run.service.stats();
    assert_eq!(stats.records_emitted, 3);
    assert_eq!(stats.sinks_not_ready, 3);
    assert_eq!(stats.sink_failures, 3);

    let failures = run
        .events
        .0
        .iter()
        .filter(|e| {
            matches!(
                e,
                AppEvent::SinkFailed {
                    sink: "broken",
                    error: SinkError::Io
                }
            )
        })
        .count();
    assert_eq!(failures, 3);
}

#[test]
fn every_record_parses_back_to_its_state() {
    let run = run_for(
        &ProbeConfig::default(),
        40,
        |hw| hw.oscillator_us = Some(1_250),
        &mut [],
    );
    for (i, record) in run.events.reports().iter().enumerate() {
        let t = i + 1;
        let frame = parse_record(record).unwrap();
        match t {
            1..=4 => assert_eq!(frame, TelemetryFrame::Off),
            5..=24 => assert_eq!(frame, TelemetryFrame::Warmup),
            _ => match frame {
                TelemetryFrame::Measure(m) => {
                    assert_eq!(m.raw_hz, 800.0);
                    assert_eq!(m.filtered_hz, 800.0);
                }
                other => panic!("t={t}s: expected measurement, got {other:?}"),
            },
        }
    }
}
