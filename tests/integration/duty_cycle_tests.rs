//! Duty cycle timing and power sequencing through the full service.

use std::cell::Cell;
use std::rc::Rc;

use tdsprobe::app::events::AppEvent;
use tdsprobe::app::service::ProbeService;
use tdsprobe::config::ProbeConfig;
use tdsprobe::fsm::DutyState;

use crate::mock_hw::{RecordingEvents, S, SimHardware};

const TICK_US: u64 = 10_000;

fn started(config: &ProbeConfig) -> (ProbeService, SimHardware, RecordingEvents) {
    let mut hw = SimHardware::new(Rc::new(Cell::new(0)));
    let mut events = RecordingEvents::default();
    let mut service = ProbeService::new(config);
    service.start(&mut hw, &mut events);
    (service, hw, events)
}

fn tick_until(service: &mut ProbeService, hw: &mut SimHardware, events: &mut RecordingEvents, t: u64) {
    while hw.clock.get() < t {
        hw.clock.set(hw.clock.get() + TICK_US);
        service.tick(hw, &mut [], events);
    }
}

fn transitions(events: &RecordingEvents) -> Vec<(DutyState, DutyState)> {
    events
        .0
        .iter()
        .filter_map(|e| match e {
            AppEvent::StateChanged { from, to } => Some((*from, *to)),
            _ => None,
        })
        .collect()
}

#[test]
fn two_full_cycles_follow_the_nominal_schedule() {
    let (mut svc, mut hw, mut events) = started(&ProbeConfig::default());
    tick_until(&mut svc, &mut hw, &mut events, 380 * S);

    assert_eq!(hw.power_on_times(), vec![5 * S, 190 * S, 375 * S]);
    assert_eq!(hw.power_off_times(), vec![0, 185 * S, 370 * S]);
    assert_eq!(
        transitions(&events),
        vec![
            (DutyState::Off, DutyState::Warmup),
            (DutyState::Warmup, DutyState::Measure),
            (DutyState::Measure, DutyState::Off),
            (DutyState::Off, DutyState::Warmup),
            (DutyState::Warmup, DutyState::Measure),
            (DutyState::Measure, DutyState::Off),
            (DutyState::Off, DutyState::Warmup),
        ]
    );
    assert_eq!(svc.stats().cycles_completed, 2);
}

#[test]
fn state_boundaries_are_inclusive() {
    let (mut svc, mut hw, mut events) = started(&ProbeConfig::default());

    tick_until(&mut svc, &mut hw, &mut events, 5 * S - TICK_US);
    assert_eq!(svc.state(), DutyState::Off);
    tick_until(&mut svc, &mut hw, &mut events, 5 * S);
    assert_eq!(svc.state(), DutyState::Warmup);

    tick_until(&mut svc, &mut hw, &mut events, 25 * S - TICK_US);
    assert_eq!(svc.state(), DutyState::Warmup);
    tick_until(&mut svc, &mut hw, &mut events, 25 * S);
    assert_eq!(svc.state(), DutyState::Measure);

    tick_until(&mut svc, &mut hw, &mut events, 185 * S - TICK_US);
    assert_eq!(svc.state(), DutyState::Measure);
    tick_until(&mut svc, &mut hw, &mut events, 185 * S);
    assert_eq!(svc.state(), DutyState::Off);
}

#[test]
fn power_tracks_state_on_every_tick() {
    let (mut svc, mut hw, mut events) = started(&ProbeConfig::default());
    while hw.clock.get() < 200 * S {
        let next = hw.clock.get() + TICK_US;
        tick_until(&mut svc, &mut hw, &mut events, next);
        assert_eq!(hw.powered, svc.state().is_powered(), "at {}us", hw.clock.get());
    }
}

#[test]
fn late_tick_moves_one_state_per_tick() {
    let (mut svc, mut hw, mut events) = started(&ProbeConfig::default());

    // A stall long enough to cover OFF and WARMUP together.
    hw.clock.set(40 * S);
    svc.tick(&mut hw, &mut [], &mut events);
    assert_eq!(svc.state(), DutyState::Warmup);

    // Warm-up is timed from the late entry, not from the nominal one.
    tick_until(&mut svc, &mut hw, &mut events, 60 * S - TICK_US);
    assert_eq!(svc.state(), DutyState::Warmup);
    tick_until(&mut svc, &mut hw, &mut events, 60 * S);
    assert_eq!(svc.state(), DutyState::Measure);
}

#[test]
fn custom_timing_is_honoured() {
    let config = ProbeConfig {
        off_secs: 2,
        warmup_secs: 3,
        sensor_on_secs: 10,
        ..ProbeConfig::default()
    };
    config.validate().unwrap();
    let (mut svc, mut hw, mut events) = started(&config);
    tick_until(&mut svc, &mut hw, &mut events, 24 * S);

    assert_eq!(hw.power_on_times(), vec![2 * S, 14 * S]);
    assert_eq!(hw.power_off_times(), vec![0, 12 * S, 24 * S]);
    assert_eq!(svc.stats().cycles_completed, 2);
}
