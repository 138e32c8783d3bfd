//! Concurrency tests for the timer manager.
//!
//! Commands, polls and snapshots are issued from many OS threads at once
//! against a shared manager, and the outcomes are checked for the
//! at-most-once and consistency guarantees:
//! - Concurrent polling completes each timer exactly once
//! - Delete racing expiration ends in exactly one terminal state
//! - Snapshots never show out-of-range or half-applied timers
//! - Commands on different timers do not interfere

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use pomo::notification::MockNotifier;
use pomo::timer::{ManualClock, TimerManager};
use pomo::todo::MockTodoStore;
use pomo::types::{TimerId, TimerStatus};

const MIN: Duration = Duration::from_secs(60);
const THREADS: usize = 8;

fn create_manager() -> (TimerManager, Arc<ManualClock>, Arc<MockNotifier>, Arc<MockTodoStore>) {
    let clock = Arc::new(ManualClock::new());
    let notifier = Arc::new(MockNotifier::new());
    let store = Arc::new(MockTodoStore::new());
    let manager = TimerManager::new()
        .with_clock(clock.clone())
        .with_notifier(notifier.clone())
        .with_todo_store(store.clone());
    (manager, clock, notifier, store)
}

// ============================================================================
// At-most-once Completion
// ============================================================================

#[test]
fn concurrent_polling_completes_each_timer_once() {
    let (manager, clock, notifier, store) = create_manager();
    for i in 0..20 {
        let todo_id = format!("todo-{}", i);
        store.insert(&todo_id, "task");
        manager.add(MIN, "task", Some(todo_id)).unwrap();
    }
    clock.advance(MIN);

    let barrier = Arc::new(Barrier::new(THREADS));
    let completed: usize = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let manager = manager.clone();
                let barrier = barrier.clone();
                s.spawn(move || {
                    barrier.wait();
                    (0..5).map(|_| manager.poll_expired().len()).sum::<usize>()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).sum()
    });

    assert_eq!(completed, 20);
    assert_eq!(notifier.notification_count(), 20);

    let mut calls = store.calls();
    calls.sort();
    calls.dedup();
    assert_eq!(calls.len(), 20);
    assert_eq!(store.calls().len(), 20);
}

#[test]
fn delete_racing_expiration_has_one_winner() {
    for _ in 0..50 {
        let (manager, clock, notifier, store) = create_manager();
        store.insert("t1", "task");
        let id = manager.add(MIN, "task", Some("t1".to_string())).unwrap();
        clock.advance(MIN);

        let barrier = Arc::new(Barrier::new(2));
        let (deleted, reports) = thread::scope(|s| {
            let deleter = {
                let manager = manager.clone();
                let barrier = barrier.clone();
                let id = id.clone();
                s.spawn(move || {
                    barrier.wait();
                    manager.delete(id.as_str())
                })
            };
            let poller = {
                let manager = manager.clone();
                let barrier = barrier.clone();
                s.spawn(move || {
                    barrier.wait();
                    manager.poll_expired()
                })
            };
            (deleter.join().unwrap(), poller.join().unwrap())
        });

        // The loser raises no error either way.
        let view = deleted.unwrap();
        let status = manager.get(id.as_str()).unwrap().status;
        assert_eq!(view.status, status);

        match status {
            TimerStatus::Completed => {
                assert_eq!(reports.len(), 1);
                assert_eq!(notifier.notification_count(), 1);
                assert!(store.is_completed("t1"));
            }
            TimerStatus::Cancelled => {
                assert!(reports.is_empty());
                assert_eq!(notifier.notification_count(), 0);
                assert!(store.calls().is_empty());
            }
            other => panic!("Unexpected final status {:?}", other),
        }
    }
}

// ============================================================================
// Snapshot Consistency
// ============================================================================

#[test]
fn snapshots_stay_in_range_under_concurrent_commands() {
    let (manager, clock, _notifier, _store) = create_manager();
    let ids: Vec<TimerId> = (0..THREADS)
        .map(|i| manager.add(MIN * (i as u32 + 1), "t", None).unwrap())
        .collect();

    thread::scope(|s| {
        for id in &ids {
            let manager = manager.clone();
            s.spawn(move || {
                for _ in 0..200 {
                    let _ = manager.pause(id.as_str());
                    let _ = manager.resume(id.as_str());
                }
                let _ = manager.delete(id.as_str());
            });
        }

        {
            let clock = clock.clone();
            s.spawn(move || {
                for _ in 0..200 {
                    clock.advance(Duration::from_millis(500));
                }
            });
        }

        for _ in 0..2 {
            let manager = manager.clone();
            s.spawn(move || {
                for _ in 0..200 {
                    let _ = manager.poll_expired();
                }
            });
        }

        for _ in 0..2 {
            let manager = manager.clone();
            s.spawn(move || {
                for _ in 0..200 {
                    let snapshot = manager.snapshot();
                    assert_eq!(snapshot.len(), THREADS);
                    for view in &snapshot {
                        assert!(view.remaining <= view.total);
                        if view.status == TimerStatus::Completed {
                            assert_eq!(view.remaining, Duration::ZERO);
                        }
                    }
                }
            });
        }
    });

    for view in manager.snapshot() {
        assert!(view.status.is_terminal());
    }
}

#[test]
fn concurrent_adds_get_unique_ids() {
    let (manager, _clock, _notifier, _store) = create_manager();

    let ids: Vec<TimerId> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let manager = manager.clone();
                s.spawn(move || {
                    (0..25)
                        .map(|_| manager.add(MIN, "t", None).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    });

    let mut shorts: Vec<&str> = ids.iter().map(TimerId::short).collect();
    shorts.sort_unstable();
    shorts.dedup();
    assert_eq!(shorts.len(), THREADS * 25);
    assert_eq!(manager.len(), THREADS * 25);
}

#[test]
fn commands_on_different_timers_do_not_interfere() {
    let (manager, clock, _notifier, _store) = create_manager();
    let ids: Vec<TimerId> = (0..THREADS)
        .map(|_| manager.add(MIN * 10, "t", None).unwrap())
        .collect();
    clock.advance(MIN);

    thread::scope(|s| {
        for (i, id) in ids.iter().enumerate() {
            let manager = manager.clone();
            s.spawn(move || {
                if i % 2 == 0 {
                    manager.pause(id.as_str()).unwrap();
                } else {
                    manager.delete(id.as_str()).unwrap();
                }
            });
        }
    });

    for (i, id) in ids.iter().enumerate() {
        let view = manager.get(id.as_str()).unwrap();
        let expected = if i % 2 == 0 {
            TimerStatus::Paused
        } else {
            TimerStatus::Cancelled
        };
        assert_eq!(view.status, expected);
        assert_eq!(view.remaining, MIN * 9);
    }
}
