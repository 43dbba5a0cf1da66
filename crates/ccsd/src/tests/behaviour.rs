//! Behavioural tests for the service bootstrap sequence.

use std::cell::RefCell;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use crate::cache::PreloadSummary;

use super::support::{self, HealthEvent, TestWorld};

#[fixture]
fn world() -> RefCell<TestWorld> {
    support::world()
}

#[given("a healthy configuration loader")]
fn given_healthy_loader(world: &RefCell<TestWorld>) {
    world.borrow_mut().use_successful_loader();
}

#[given("a failing configuration loader")]
fn given_failing_loader(world: &RefCell<TestWorld>) {
    world.borrow_mut().use_failing_loader();
}

#[given("a library with {sources} sources and {externs} externs")]
fn given_library(world: &RefCell<TestWorld>, sources: usize, externs: usize) {
    world.borrow_mut().use_library(sources, externs);
}

#[given("a preload root that does not exist")]
fn given_missing_library(world: &RefCell<TestWorld>) {
    world.borrow_mut().use_missing_library();
}

#[when("the service bootstrap runs")]
fn when_bootstrap_runs(world: &RefCell<TestWorld>) {
    world.borrow_mut().bootstrap();
}

#[when("the listener starts")]
fn when_listener_starts(world: &RefCell<TestWorld>) {
    world.borrow_mut().start_listener();
}

#[then("bootstrap succeeds")]
fn then_bootstrap_succeeds(world: &RefCell<TestWorld>) {
    let world = world.borrow();
    assert!(
        world.bootstrap_error().is_none(),
        "bootstrap error: {:?}",
        world.bootstrap_error()
    );
    assert!(world.daemon().is_some(), "daemon should have been built");
}

#[then("bootstrap fails")]
fn then_bootstrap_fails(world: &RefCell<TestWorld>) {
    assert!(
        world.borrow().bootstrap_error().is_some(),
        "bootstrap succeeded unexpectedly"
    );
}

#[then("the source cache holds {count} entries")]
fn then_source_cache_holds(world: &RefCell<TestWorld>, count: usize) {
    let world = world.borrow();
    let daemon = world.daemon().expect("daemon");
    assert_eq!(daemon.state().sources().len(), count);
}

#[then("the extern cache holds {count} entries")]
fn then_extern_cache_holds(world: &RefCell<TestWorld>, count: usize) {
    let world = world.borrow();
    let daemon = world.daemon().expect("daemon");
    assert_eq!(daemon.state().externs().len(), count);
}

#[then("the reporter recorded bootstrap start")]
fn then_reporter_start(world: &RefCell<TestWorld>) {
    let events = world.borrow().reporter.events();
    assert_eq!(events.first(), Some(&HealthEvent::BootstrapStarting));
}

#[then("the reporter recorded bootstrap success")]
fn then_reporter_success(world: &RefCell<TestWorld>) {
    let events = world.borrow().reporter.events();
    assert!(
        events.contains(&HealthEvent::BootstrapSucceeded),
        "bootstrap success event missing: {events:?}"
    );
}

#[then("the reporter recorded bootstrap failure")]
fn then_reporter_failure(world: &RefCell<TestWorld>) {
    let events = world.borrow().reporter.events();
    let failed = events
        .iter()
        .any(|event| matches!(event, HealthEvent::BootstrapFailed(_)));
    assert!(failed, "bootstrap failure event missing: {events:?}");
    assert!(!events.contains(&HealthEvent::BootstrapSucceeded));
}

#[then("the reporter recorded a preload of {sources} sources and {externs} externs")]
fn then_reporter_preload(world: &RefCell<TestWorld>, sources: usize, externs: usize) {
    let expected = HealthEvent::PreloadCompleted(PreloadSummary {
        sources,
        externs,
        failures: 0,
    });
    let events = world.borrow().reporter.events();
    assert!(events.contains(&expected), "preload event missing: {events:?}");
}

#[then("the reporter recorded the listener start")]
fn then_reporter_listener(world: &RefCell<TestWorld>) {
    let world = world.borrow();
    let local_addr = world.listener().expect("listener").local_addr();
    let started = world.reporter.events().iter().any(|event| {
        matches!(event, HealthEvent::ListenerStarted { local_addr: addr, .. } if *addr == local_addr)
    });
    assert!(started, "listener start event missing");
}

#[scenario(path = "tests/features/service_bootstrap.feature")]
fn service_bootstrap(#[from(world)] world: RefCell<TestWorld>) {
    drop(world);
}
