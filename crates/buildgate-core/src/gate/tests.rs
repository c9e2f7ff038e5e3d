//! Tests for gated execution

use super::{GateObserver, NamedGate, DEFAULT_RETRY_INTERVAL};
use crate::config::GateConfig;
use crate::lock::{hold, LockError, NamedLock};
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Wait(u32, String),
    Acquired(String),
    Timeout(String, Duration),
}

/// Observer that records every notification with its timestamp
#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<(Event, Instant)>>,
}

impl Recorder {
    fn push(&self, event: Event) {
        self.events.lock().unwrap().push((event, Instant::now()));
    }

    fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().iter().map(|(e, _)| e.clone()).collect()
    }

    fn wait_times(&self) -> Vec<Instant> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(e, _)| matches!(e, Event::Wait(..)))
            .map(|(_, t)| *t)
            .collect()
    }

    fn waits(&self) -> usize {
        self.wait_times().len()
    }

    fn timeouts(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Event::Timeout(..)))
            .count()
    }

    fn acquired(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Event::Acquired(..)))
            .count()
    }
}

impl GateObserver for Recorder {
    fn on_wait(&self, attempt: u32, name: &str) {
        self.push(Event::Wait(attempt, name.to_string()));
    }

    fn on_acquired(&self, name: &str, _elapsed: Duration) {
        self.push(Event::Acquired(name.to_string()));
    }

    fn on_timeout(&self, name: &str, timeout: Duration) {
        self.push(Event::Timeout(name.to_string(), timeout));
    }
}

/// Lock that reports busy for the first `busy_probes` probes
struct ScriptedLock {
    busy_probes: u32,
    probes: u32,
    releases: u32,
}

impl ScriptedLock {
    fn busy_for(busy_probes: u32) -> Self {
        Self {
            busy_probes,
            probes: 0,
            releases: 0,
        }
    }
}

impl NamedLock for ScriptedLock {
    fn name(&self) -> &str {
        "scripted"
    }

    fn try_acquire(&mut self) -> Result<bool, LockError> {
        self.probes += 1;
        Ok(self.probes > self.busy_probes)
    }

    fn release(&mut self) -> Result<(), LockError> {
        self.releases += 1;
        Ok(())
    }
}

/// Lock whose probe always fails at the OS level
struct BrokenLock;

impl NamedLock for BrokenLock {
    fn name(&self) -> &str {
        "broken"
    }

    fn try_acquire(&mut self) -> Result<bool, LockError> {
        Err(LockError::Io {
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            name: "broken".to_string(),
            path: "/locks/broken.lock".into(),
            operation: "probe",
        })
    }

    fn release(&mut self) -> Result<(), LockError> {
        Ok(())
    }
}

fn gate(lock_dir: &Path, name: &str, timeout: Duration, recorder: &Arc<Recorder>) -> NamedGate {
    NamedGate::new(name, timeout)
        .with_lock_dir(lock_dir)
        .with_observer(recorder.clone())
}

/// Holds `name` on a background thread for `duration`; returns once it is held
fn hold_in_background(lock_dir: &Path, name: &str, duration: Duration) -> thread::JoinHandle<()> {
    let lock_dir = lock_dir.to_path_buf();
    let name = name.to_string();
    let barrier = Arc::new(Barrier::new(2));
    let barrier_clone = barrier.clone();

    let handle = thread::spawn(move || {
        let _guard = hold(&lock_dir, &name, Duration::from_secs(5)).unwrap();
        barrier_clone.wait();
        thread::sleep(duration);
    });

    barrier.wait();
    handle
}

#[test]
fn test_immediate_success_runs_work_once() {
    let temp = TempDir::new().unwrap();
    let recorder = Arc::new(Recorder::default());
    let calls = AtomicU32::new(0);

    let result = gate(temp.path(), "free", Duration::from_secs(1), &recorder).execute(|| {
        calls.fetch_add(1, Ordering::SeqCst);
        42
    });

    assert_eq!(result.unwrap(), 42);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(recorder.waits(), 0);
    assert_eq!(recorder.timeouts(), 0);
    assert_eq!(recorder.acquired(), 1);
}

#[test]
fn test_contention_then_success() {
    let temp = TempDir::new().unwrap();
    let recorder = Arc::new(Recorder::default());
    let calls = AtomicU32::new(0);

    let holder = hold_in_background(temp.path(), "build-lock-A", Duration::from_millis(250));

    let start = Instant::now();
    let result = gate(temp.path(), "build-lock-A", Duration::from_millis(500), &recorder)
        .execute(|| calls.fetch_add(1, Ordering::SeqCst) + 1);
    let elapsed = start.elapsed();

    assert_eq!(result.unwrap(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(
        (1..=4).contains(&recorder.waits()),
        "Expected a handful of waits, got {}",
        recorder.waits()
    );
    assert_eq!(recorder.timeouts(), 0);
    assert!(
        elapsed >= Duration::from_millis(200) && elapsed < Duration::from_millis(600),
        "Should pass once the holder releases, elapsed: {:?}",
        elapsed
    );

    holder.join().unwrap();
}

#[test]
fn test_timeout_never_runs_work() {
    let temp = TempDir::new().unwrap();
    let recorder = Arc::new(Recorder::default());
    let _guard = hold(temp.path(), "busy", Duration::from_secs(5)).unwrap();
    let calls = AtomicU32::new(0);

    let start = Instant::now();
    let result = gate(temp.path(), "busy", Duration::from_millis(300), &recorder).execute(|| {
        calls.fetch_add(1, Ordering::SeqCst);
    });
    let elapsed = start.elapsed();

    match result {
        Err(LockError::Timeout { name, timeout }) => {
            assert_eq!(name, "busy");
            assert_eq!(timeout, Duration::from_millis(300));
        }
        other => panic!("Expected timeout, got {:?}", other),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(recorder.acquired(), 0);
    assert_eq!(
        recorder.events().last(),
        Some(&Event::Timeout("busy".to_string(), Duration::from_millis(300)))
    );
    assert_eq!(recorder.timeouts(), 1);
    assert!(
        elapsed > Duration::from_millis(300) && elapsed < Duration::from_millis(700),
        "Should give up one retry interval after the timeout at most, elapsed: {:?}",
        elapsed
    );
}

#[test]
fn test_zero_timeout_probes_exactly_once() {
    let recorder = Arc::new(Recorder::default());
    let gate = NamedGate::new("scripted", Duration::ZERO)
        .with_retry_interval(Duration::from_millis(10))
        .with_observer(recorder.clone());
    let mut lock = ScriptedLock::busy_for(u32::MAX);

    let result = gate.execute_on(&mut lock, || unreachable!("work must not run"));

    assert!(matches!(result, Err(LockError::Timeout { .. })));
    assert_eq!(lock.probes, 1);
    assert_eq!(lock.releases, 0);
    assert_eq!(
        recorder.events(),
        vec![
            Event::Wait(1, "scripted".to_string()),
            Event::Timeout("scripted".to_string(), Duration::ZERO),
        ]
    );
}

#[test]
fn test_zero_timeout_still_admits_when_free() {
    let temp = TempDir::new().unwrap();
    let recorder = Arc::new(Recorder::default());

    let result = gate(temp.path(), "free-now", Duration::ZERO, &recorder).execute(|| "ran");

    assert_eq!(result.unwrap(), "ran");
    assert_eq!(recorder.waits(), 0);
}

#[test]
fn test_zero_timeout_against_real_holder() {
    let temp = TempDir::new().unwrap();
    let recorder = Arc::new(Recorder::default());
    let _guard = hold(temp.path(), "held", Duration::from_secs(5)).unwrap();

    let result = gate(temp.path(), "held", Duration::ZERO, &recorder).execute(|| ());

    assert!(result.unwrap_err().is_timeout());
    assert_eq!(recorder.waits(), 1);
    assert_eq!(recorder.timeouts(), 1);
}

#[test]
fn test_long_non_ascii_name_is_admitted() {
    let temp = TempDir::new().unwrap();
    let recorder = Arc::new(Recorder::default());
    let name = "сборка-".repeat(15);

    let result = gate(temp.path(), &name, Duration::from_secs(1), &recorder).execute(|| 1);

    assert_eq!(result.unwrap(), 1);
    assert_eq!(recorder.waits(), 0);
}

#[test]
fn test_long_name_is_blocked_by_its_holder() {
    let temp = TempDir::new().unwrap();
    let recorder = Arc::new(Recorder::default());
    let name = "сборка-".repeat(15);
    let _guard = hold(temp.path(), &name, Duration::from_secs(5)).unwrap();

    let result = gate(temp.path(), &name, Duration::ZERO, &recorder).execute(|| ());

    assert!(result.unwrap_err().is_timeout());
}

#[test]
fn test_attempts_are_numbered_from_one() {
    let recorder = Arc::new(Recorder::default());
    let gate = NamedGate::new("scripted", Duration::from_secs(5))
        .with_retry_interval(Duration::from_millis(1))
        .with_observer(recorder.clone());
    let mut lock = ScriptedLock::busy_for(3);

    let result = gate.execute_on(&mut lock, || "done");

    assert_eq!(result.unwrap(), "done");
    assert_eq!(lock.probes, 4);
    assert_eq!(lock.releases, 1);
    assert_eq!(
        recorder.events(),
        vec![
            Event::Wait(1, "scripted".to_string()),
            Event::Wait(2, "scripted".to_string()),
            Event::Wait(3, "scripted".to_string()),
            Event::Acquired("scripted".to_string()),
        ]
    );
}

#[test]
fn test_lock_is_released_before_work_starts() {
    let temp = TempDir::new().unwrap();
    let recorder = Arc::new(Recorder::default());
    let lock_dir = temp.path().to_path_buf();

    let other_caller_got_in = gate(temp.path(), "shared", Duration::from_secs(1), &recorder)
        .execute(|| {
            let lock_dir = lock_dir.clone();
            thread::spawn(move || hold(&lock_dir, "shared", Duration::ZERO).is_ok())
                .join()
                .unwrap()
        })
        .unwrap();

    assert!(
        other_caller_got_in,
        "A concurrent caller should acquire the name while the work runs"
    );
}

#[test]
fn test_two_gates_can_run_work_concurrently() {
    let temp = TempDir::new().unwrap();
    let lock_dir = temp.path().to_path_buf();
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let lock_dir = lock_dir.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                NamedGate::new("admission-only", Duration::from_secs(2))
                    .with_lock_dir(lock_dir)
                    // Both works must be inside at once for the barrier to open
                    .execute(|| barrier.wait())
                    .is_ok()
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
}

#[test]
fn test_sequential_calls_leave_no_state_behind() {
    let temp = TempDir::new().unwrap();
    let recorder = Arc::new(Recorder::default());
    let gate = gate(temp.path(), "repeat", Duration::from_millis(200), &recorder);

    assert!(gate.execute(|| true).unwrap());
    assert!(gate.execute(|| true).unwrap());

    assert_eq!(recorder.waits(), 0);
    assert_eq!(recorder.acquired(), 2);
    assert!(hold(temp.path(), "repeat", Duration::ZERO).is_ok());
}

#[test]
fn test_waits_are_spaced_by_retry_interval() {
    let temp = TempDir::new().unwrap();
    let recorder = Arc::new(Recorder::default());
    let interval = Duration::from_millis(50);
    let _guard = hold(temp.path(), "cadence", Duration::from_secs(5)).unwrap();

    let result = gate(temp.path(), "cadence", Duration::from_millis(300), &recorder)
        .with_retry_interval(interval)
        .execute(|| ());
    assert!(result.unwrap_err().is_timeout());

    let times = recorder.wait_times();
    assert!(times.len() >= 3, "Expected several waits, got {}", times.len());
    for pair in times.windows(2) {
        assert!(
            pair[1] - pair[0] >= interval,
            "Waits closer than the retry interval: {:?}",
            pair[1] - pair[0]
        );
    }
}

#[test]
fn test_shorter_interval_waits_more_often() {
    let temp = TempDir::new().unwrap();
    let held_for = Duration::from_millis(300);

    let count_waits = |interval: Duration| {
        let recorder = Arc::new(Recorder::default());
        let holder = hold_in_background(temp.path(), "cadence-ratio", held_for);
        let result = gate(temp.path(), "cadence-ratio", Duration::from_secs(2), &recorder)
            .with_retry_interval(interval)
            .execute(|| ());
        holder.join().unwrap();
        assert!(result.is_ok());
        recorder.waits()
    };

    let slow = count_waits(DEFAULT_RETRY_INTERVAL);
    let fast = count_waits(Duration::from_millis(10));

    assert!(slow >= 2, "Expected at least two slow waits, got {}", slow);
    assert!(
        fast >= slow * 4,
        "10ms interval should wait far more often: slow={}, fast={}",
        slow,
        fast
    );
}

#[test]
fn test_set_retry_interval_updates_existing_gate() {
    let mut gate = NamedGate::new("cadence", Duration::from_secs(1));
    assert_eq!(gate.retry_interval(), DEFAULT_RETRY_INTERVAL);

    gate.set_retry_interval(Duration::from_millis(10));
    assert_eq!(gate.retry_interval(), Duration::from_millis(10));
}

#[test]
fn test_zero_retry_interval_is_rejected_without_probing() {
    let mut lock = ScriptedLock::busy_for(0);
    let gate = NamedGate::new("scripted", Duration::from_secs(1)).with_retry_interval(Duration::ZERO);

    let result = gate.execute_on(&mut lock, || unreachable!("work must not run"));

    assert!(matches!(result, Err(LockError::InvalidRetryInterval { .. })));
    assert_eq!(lock.probes, 0);
}

#[test]
fn test_empty_name_is_rejected() {
    let temp = TempDir::new().unwrap();
    let result = NamedGate::new("", Duration::from_secs(1))
        .with_lock_dir(temp.path())
        .execute(|| unreachable!("work must not run"));

    assert!(matches!(result, Err(LockError::InvalidName)));
}

#[test]
fn test_primitive_error_is_not_a_timeout() {
    let recorder = Arc::new(Recorder::default());
    let gate = NamedGate::new("broken", Duration::from_secs(1)).with_observer(recorder.clone());

    let err = gate
        .execute_on(&mut BrokenLock, || unreachable!("work must not run"))
        .unwrap_err();

    assert!(!err.is_timeout());
    assert!(matches!(err, LockError::Io { operation: "probe", .. }));
    assert!(recorder.events().is_empty());
}

#[test]
fn test_from_config_applies_gate_settings() {
    let temp = TempDir::new().unwrap();
    let config = GateConfig {
        lock_dir: Some(temp.path().to_path_buf()),
        timeout_ms: 750,
        retry_interval_ms: 25,
    };

    let gate = NamedGate::from_config("configured", &config);

    assert_eq!(gate.name(), "configured");
    assert_eq!(gate.timeout(), Duration::from_millis(750));
    assert_eq!(gate.retry_interval(), Duration::from_millis(25));
    assert_eq!(gate.lock_dir(), temp.path());
}
