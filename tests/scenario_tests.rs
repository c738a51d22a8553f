//! End-to-end driver scenarios running on a tokio runtime.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tickstate::{ExitHookPolicy, Machine, MachineBuilder, MachineConfig, StateHooks};

fn counting() -> (Arc<AtomicUsize>, impl Fn(&tickstate::State) + Send + Sync + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let inner = Arc::clone(&count);
    (count, move |_: &tickstate::State| {
        inner.fetch_add(1, Ordering::SeqCst);
    })
}

#[tokio::test]
async fn idle_then_running() {
    let machine = Machine::init().unwrap();
    let (i, idle) = counting();
    let (r, running) = counting();

    machine.create_state("Idle", idle).unwrap();
    machine.create_state("Running", running).unwrap();

    machine.shift_state("Idle").unwrap();
    machine.wait_ticks(3).await.unwrap();

    assert!(i.load(Ordering::SeqCst) >= 3);
    assert_eq!(r.load(Ordering::SeqCst), 0);

    machine.shift_state("Running").unwrap();
    machine.wait_ticks(3).await.unwrap();

    assert!(r.load(Ordering::SeqCst) >= 3);
    assert_eq!(machine.history().path(), vec!["Idle", "Running"]);

    machine.dispose();
}

#[tokio::test]
async fn exit_hook_tracks_entry_on_every_tick() {
    let machine = Machine::init().unwrap();
    let (entries, entry) = counting();
    let (exits, exit) = counting();

    machine
        .create_state_with_hooks("Idle", entry, StateHooks::new().on_exit(exit))
        .unwrap();
    machine.shift_state("Idle").unwrap();
    machine.wait_ticks(10).await.unwrap();

    // entry and exit run within the same tick, so they are observed equal
    let observed = entries.load(Ordering::SeqCst);
    assert!(observed >= 10);
    assert_eq!(exits.load(Ordering::SeqCst), observed);
}

#[tokio::test]
async fn transition_only_exit_hooks() {
    let config = MachineConfig::default().with_exit_hook_policy(ExitHookPolicy::OnTransition);
    let machine = Machine::with_config(config).unwrap();
    let (exits, exit) = counting();

    machine
        .create_state_with_hooks("Idle", |_| {}, StateHooks::new().on_exit(exit))
        .unwrap();
    machine.create_state("Running", |_| {}).unwrap();

    machine.shift_state("Idle").unwrap();
    machine.wait_ticks(5).await.unwrap();
    assert_eq!(exits.load(Ordering::SeqCst), 0);

    machine.shift_state("Running").unwrap();
    machine.wait_ticks(5).await.unwrap();
    assert_eq!(exits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn state_driven_transitions() {
    let machine = Machine::init().unwrap();
    let handle = machine.clone();
    let (done, finished) = counting();

    machine
        .create_state("Start", move |_| {
            let _ = handle.shift_state("Finish");
        })
        .unwrap();
    machine.create_state("Finish", finished).unwrap();

    machine.shift_state("Start").unwrap();
    machine.wait_ticks(3).await.unwrap();

    assert_eq!(machine.current_state().as_deref(), Some("Finish"));
    assert!(done.load(Ordering::SeqCst) >= 2);
    machine.dispose();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn driver_on_multi_thread_runtime() {
    let (runs, entry) = counting();
    let activations = Arc::new(AtomicUsize::new(0));
    let activated = Arc::clone(&activations);

    let machine = MachineBuilder::new()
        .label("worker")
        .state("Busy", entry)
        .on_activate(move |_| {
            activated.fetch_add(1, Ordering::SeqCst);
        })
        .initial("Busy")
        .build()
        .unwrap();

    machine.wait_ticks(20).await.unwrap();
    machine.dispose();

    // the activate hook runs before the entry callback within a tick
    let ran = runs.load(Ordering::SeqCst);
    assert!(ran >= 20);
    assert!(activations.load(Ordering::SeqCst) >= ran);
}
