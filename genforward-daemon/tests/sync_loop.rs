//! End-to-end sync loop behaviour against the in-memory bus.

use std::time::Duration;

use genforward_core::ManualStartCommand;
use genforward_daemon::memory::{MemoryBus, MemoryStatusSink, RecordedWrite};
use genforward_daemon::{SyncLoop, TickReport};

const INPUT: &str = "com.victronenergy.digitalinput.input01";
const CONTROLLER: &str = "com.victronenergy.generator.startstop0";
const MANUAL_START: &str = "/Generator0/ManualStart";
const RUNNING_CONDITION: &str = "/Generator0/RunningByConditionCode";

struct Harness {
    bus: MemoryBus,
    sink: MemoryStatusSink,
    sync_loop: SyncLoop<MemoryBus, MemoryStatusSink>,
}

impl Harness {
    fn new(bus: MemoryBus) -> Self {
        let sink = MemoryStatusSink::new();
        let sync_loop = SyncLoop::new(bus.clone(), sink.clone(), Duration::from_millis(500));
        Self {
            bus,
            sink,
            sync_loop,
        }
    }

    async fn tick(&mut self) -> TickReport {
        self.sync_loop.tick().await
    }

    async fn ticks(&mut self, n: usize) -> Vec<TickReport> {
        let mut reports = Vec::with_capacity(n);
        for _ in 0..n {
            reports.push(self.tick().await);
        }
        reports
    }

    fn input(&self, state: i64) {
        self.bus.set_int(INPUT, "/State", state);
    }

    fn controller(&self, manual: i64, condition: i64) {
        self.bus.set_int(CONTROLLER, MANUAL_START, manual);
        self.bus.set_int(CONTROLLER, RUNNING_CONDITION, condition);
    }
}

fn add_input(bus: &MemoryBus, state: i64) {
    bus.add_service(INPUT, &[("/Type", 9), ("/State", state)]);
}

fn add_controller(bus: &MemoryBus, manual: i64, condition: i64) {
    bus.add_service(
        CONTROLLER,
        &[(MANUAL_START, manual), (RUNNING_CONDITION, condition)],
    );
}

fn full_bus(state: i64, manual: i64, condition: i64) -> MemoryBus {
    let bus = MemoryBus::new();
    add_input(&bus, state);
    add_controller(&bus, manual, condition);
    bus
}

fn manual_start_write(value: i64) -> RecordedWrite {
    RecordedWrite {
        service: CONTROLLER.to_string(),
        path: MANUAL_START.to_string(),
        value,
    }
}

// ---------------------------------------------------------------------------
// 1. Forwarding
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn start_edge_writes_manual_start_once() {
    let mut h = Harness::new(full_bus(10, 0, 0));

    let first = h.tick().await;
    assert_eq!(first.forwarded, Some(ManualStartCommand::Start));
    assert_eq!(h.sync_loop.state().last_input_state, 10);

    // The controller reacts: manual run is now the active condition.
    h.controller(1, 1);
    let held = h.ticks(8).await;
    assert!(held.iter().all(|report| report.forwarded.is_none()));
    assert_eq!(h.bus.writes(), vec![manual_start_write(1)]);
}

#[tokio::test(start_paused = true)]
async fn stop_edge_tears_down_manual_run() {
    let mut h = Harness::new(full_bus(10, 1, 1));
    h.tick().await;

    h.input(11);
    let report = h.tick().await;
    assert_eq!(report.forwarded, Some(ManualStartCommand::Stop));
    assert_eq!(h.bus.writes(), vec![manual_start_write(0)]);
}

#[tokio::test(start_paused = true)]
async fn toggle_cycle_forwards_each_edge() {
    let mut h = Harness::new(full_bus(0, 0, 0));
    h.tick().await;

    h.input(10);
    h.tick().await;
    h.controller(1, 1);
    h.tick().await;
    h.input(11);
    h.tick().await;
    h.controller(0, 0);
    h.tick().await;
    h.input(10);
    h.tick().await;

    assert_eq!(
        h.bus.writes(),
        vec![manual_start_write(1), manual_start_write(0), manual_start_write(1)]
    );
}

// ---------------------------------------------------------------------------
// 2. Stop sync error
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn automatic_run_with_stopped_input_raises_sync_error_after_debounce() {
    let mut h = Harness::new(full_bus(11, 0, 3));

    let reports = h.ticks(7).await;
    let flags: Vec<bool> = reports.iter().map(|r| r.status.stop_sync_error).collect();
    assert_eq!(flags, vec![false, false, false, false, false, true, true]);
    assert!(h.bus.writes().is_empty(), "automatic runs are never stopped");

    h.controller(0, 0);
    let cleared = h.tick().await;
    assert!(!cleared.status.stop_sync_error);
    assert_eq!(h.sink.last().map(|s| s.stop_sync_error), Some(false));
}

#[tokio::test(start_paused = true)]
async fn brief_mismatch_does_not_raise_sync_error() {
    let mut h = Harness::new(full_bus(11, 0, 3));
    h.ticks(4).await;
    h.controller(0, 0);
    h.tick().await;
    h.controller(0, 3);
    let reports = h.ticks(5).await;
    assert!(reports.iter().all(|r| !r.status.stop_sync_error));
}

// ---------------------------------------------------------------------------
// 3. Discovery
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn discovery_runs_every_ten_ticks() {
    let mut h = Harness::new(full_bus(0, 0, 0));
    h.ticks(25).await;
    // Ticks 1, 11 and 21.
    assert_eq!(h.bus.list_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn late_controller_is_picked_up_on_next_discovery() {
    let bus = MemoryBus::new();
    add_input(&bus, 10);
    let mut h = Harness::new(bus);

    let early = h.ticks(3).await;
    assert!(early.iter().all(|r| !r.status.forwarding_active));
    assert!(early.iter().all(|r| r.status.input_state == 10));
    assert_eq!(h.sync_loop.state().last_input_state, 0);

    add_controller(&h.bus, 0, 0);
    let before = h.ticks(7).await;
    assert!(before.iter().all(|r| !r.status.forwarding_active));

    // Tick 11 rediscovers; the held switch now reads as a fresh edge.
    let report = h.tick().await;
    assert!(report.status.forwarding_active);
    assert_eq!(report.status.generator_service, CONTROLLER);
    assert_eq!(report.forwarded, Some(ManualStartCommand::Start));
}

#[tokio::test(start_paused = true)]
async fn only_one_side_present_never_forwards() {
    let bus = MemoryBus::new();
    add_controller(&bus, 1, 1);
    let mut h = Harness::new(bus);

    let reports = h.ticks(12).await;
    assert!(reports.iter().all(|r| r.forwarded.is_none()));
    let status = &reports[0].status;
    assert!(!status.forwarding_active);
    assert_eq!(status.digital_input_service, "");
    assert_eq!(status.manual_start, 1);
    assert!(h.bus.writes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn non_generator_input_is_ignored() {
    let bus = full_bus(10, 0, 0);
    bus.set_int(INPUT, "/Type", 3);
    let mut h = Harness::new(bus);

    let report = h.tick().await;
    assert!(h.sync_loop.discovered().input.is_none());
    assert!(!report.status.forwarding_active);
    assert_eq!(report.status.input_state, 0);
}

// ---------------------------------------------------------------------------
// 4. Transport faults
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn fault_mid_mismatch_resets_sync_error_and_discovery() {
    let mut h = Harness::new(full_bus(11, 0, 3));
    let reports = h.ticks(6).await;
    assert!(reports[5].status.stop_sync_error);

    h.bus.set_failing(true);
    let fault = h.tick().await;
    assert!(fault.fault.is_some());
    assert!(!fault.status.stop_sync_error);
    assert!(!fault.status.forwarding_active);
    assert_eq!(fault.status.input_state, 0);
    assert_eq!(h.sync_loop.state().debounce_count, 0);
    assert_eq!(h.sync_loop.discovered().input, None);
    assert_eq!(h.sink.last(), Some(fault.status.clone()));

    // Recovery waits for the next discovery pass at tick 11.
    h.bus.set_failing(false);
    let waiting = h.ticks(3).await;
    assert!(waiting.iter().all(|r| !r.status.forwarding_active && r.fault.is_none()));
    let resumed = h.tick().await;
    assert!(resumed.status.forwarding_active);

    // The mismatch restarts its debounce from zero.
    let mut flags = vec![resumed.status.stop_sync_error];
    flags.extend(h.ticks(5).await.iter().map(|r| r.status.stop_sync_error));
    assert_eq!(flags, vec![false, false, false, false, false, true]);
}

#[tokio::test(start_paused = true)]
async fn fault_during_discovery_is_not_retried_before_next_cycle() {
    let bus = full_bus(10, 0, 0);
    bus.set_failing(true);
    let mut h = Harness::new(bus);

    let first = h.tick().await;
    assert!(first.fault.is_some());

    h.bus.set_failing(false);
    let quiet = h.ticks(9).await;
    assert!(quiet.iter().all(|r| !r.status.forwarding_active));
    assert!(h.bus.writes().is_empty());

    let found = h.tick().await;
    assert!(found.status.forwarding_active);
    assert_eq!(found.forwarded, Some(ManualStartCommand::Start));
}

#[tokio::test(start_paused = true)]
async fn stalled_bus_times_out_instead_of_blocking_the_tick() {
    let mut h = Harness::new(full_bus(10, 0, 0));
    h.tick().await;

    h.bus.set_hanging(true);
    let started = tokio::time::Instant::now();
    let report = h.tick().await;
    assert!(started.elapsed() <= Duration::from_secs(1));
    let fault = report.fault.expect("timeout is a fault");
    assert!(fault.contains("timed out"), "got: {fault}");
    assert!(!report.status.forwarding_active);
}

#[tokio::test(start_paused = true)]
async fn input_edge_is_refired_after_a_fault() {
    let mut h = Harness::new(full_bus(10, 0, 0));
    h.tick().await;
    assert_eq!(h.bus.writes().len(), 1);

    // The controller dropped the request and then the bus hiccuped.
    h.controller(0, 0);
    h.bus.set_failing(true);
    h.tick().await;
    h.bus.set_failing(false);
    for _ in 0..9 {
        h.tick().await;
    }

    assert_eq!(h.bus.writes(), vec![manual_start_write(1), manual_start_write(1)]);
}
