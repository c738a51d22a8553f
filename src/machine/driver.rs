//! Background task that ticks a machine until it is disposed or dropped.

use super::{Machine, MachineError, Shared, TickOutcome};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tracing::{debug, error, info, info_span, Instrument};

pub(super) fn spawn(handle: &Handle, shared: &Arc<Shared>) {
    let span = info_span!(
        "driver",
        machine = %shared.id,
        label = shared.config.label.as_deref().unwrap_or(""),
    );
    let task = run(
        Arc::downgrade(shared),
        Arc::clone(&shared.wake),
        shared.config.tick_interval(),
    );

    handle.spawn(task.instrument(span));
}

async fn run(shared: Weak<Shared>, wake: Arc<Notify>, interval: Option<Duration>) {
    info!("driver started");

    loop {
        // Only hold a strong reference for the duration of one tick.
        let Some(strong) = shared.upgrade() else {
            debug!("machine dropped");
            break;
        };

        match tick(Machine { shared: strong }) {
            Some(TickOutcome::Ran { .. }) => pause(interval).await,
            Some(TickOutcome::Idle) => wake.notified().await,
            None => break,
        }
    }

    info!("driver stopped");
}

fn tick(machine: Machine) -> Option<TickOutcome> {
    match machine.step() {
        Ok(outcome) => Some(outcome),
        Err(MachineError::Disposed) => None,
        Err(err) => {
            error!(%err, "driver halted");
            machine.dispose();
            None
        }
    }
}

async fn pause(interval: Option<Duration>) {
    match interval {
        Some(interval) => tokio::time::sleep(interval).await,
        None => tokio::task::yield_now().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MachineConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn tick_interval_paces_the_driver() {
        let config = MachineConfig::default().with_tick_interval(Duration::from_millis(20));
        let machine = Machine::with_config(config).unwrap();
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        machine
            .create_state("Slow", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        let started = tokio::time::Instant::now();
        machine.shift_state("Slow").unwrap();
        machine.wait_ticks(3).await.unwrap();

        // two full pauses separate the first and third tick
        assert!(started.elapsed() >= Duration::from_millis(40));
        assert!(runs.load(Ordering::SeqCst) >= 3);
    }

    #[tokio::test]
    async fn driver_stops_after_dispose() {
        let machine = Machine::init().unwrap();
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        machine
            .create_state("Idle", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        machine.shift_state("Idle").unwrap();
        machine.wait_ticks(2).await.unwrap();

        machine.dispose();
        let settled = runs.load(Ordering::SeqCst);
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }

        assert_eq!(runs.load(Ordering::SeqCst), settled);
        assert!(machine.wait_ticks(1).await.is_err());
    }

    #[tokio::test]
    async fn driver_resumes_after_idling() {
        let machine = Machine::init().unwrap();
        machine.create_state("A", |_| {}).unwrap();
        machine.create_state("B", |_| {}).unwrap();

        machine.shift_state("A").unwrap();
        machine.wait_ticks(2).await.unwrap();

        machine.remove_state("A").unwrap();
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        let idle_ticks = machine.ticks();
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        assert_eq!(machine.ticks(), idle_ticks);

        machine.shift_state("B").unwrap();
        let reached = machine.wait_ticks(2).await.unwrap();
        assert!(reached >= idle_ticks + 2);
    }
}
