//! Idle / Running Machine
//!
//! This example drives a two-state machine with the background driver.
//!
//! Key concepts:
//! - Registering named states with entry callbacks
//! - Shifting between states by name
//! - The per-tick exit hook
//! - Waiting on the driver's tick count
//!
//! Run with: cargo run --example idle_running

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tickstate::{Machine, MachineError, StateHooks};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), MachineError> {
    println!("=== Idle / Running Machine ===\n");

    let machine = Machine::init()?;
    let idle = Arc::new(AtomicUsize::new(0));
    let running = Arc::new(AtomicUsize::new(0));
    let exits = Arc::new(AtomicUsize::new(0));

    let idle_count = Arc::clone(&idle);
    machine.create_state("Idle", move |_| {
        idle_count.fetch_add(1, Ordering::SeqCst);
    })?;

    let running_count = Arc::clone(&running);
    let exit_count = Arc::clone(&exits);
    machine.create_state_with_hooks(
        "Running",
        move |_| {
            running_count.fetch_add(1, Ordering::SeqCst);
        },
        StateHooks::new().on_exit(move |_| {
            exit_count.fetch_add(1, Ordering::SeqCst);
        }),
    )?;

    println!("States: {:?}", machine.state_names());

    machine.shift_state("Idle")?;
    machine.wait_ticks(3).await?;
    println!(
        "After 3 ticks in Idle:    idle={} running={}",
        idle.load(Ordering::SeqCst),
        running.load(Ordering::SeqCst)
    );

    machine.shift_state("Running")?;
    machine.wait_ticks(3).await?;
    println!(
        "After 3 ticks in Running: idle={} running={} exit hook runs={}",
        idle.load(Ordering::SeqCst),
        running.load(Ordering::SeqCst),
        exits.load(Ordering::SeqCst)
    );

    println!("\nPath: {:?}", machine.history().path());
    println!("Total ticks: {}", machine.ticks());

    machine.dispose();
    println!("\n=== Example Complete ===");
    Ok(())
}
