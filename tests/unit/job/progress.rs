use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;

#[test]
fn every_subscriber_receives_events_in_order() {
    let hub = ProgressHub::new();
    let a = hub.subscribe();
    let b = hub.subscribe();

    for fraction in [Some(0.0), Some(0.5), None] {
        hub.publish(ProgressEvent {
            job: JobId(1),
            fraction,
        });
    }

    for rx in [a, b] {
        let got: Vec<_> = rx.try_iter().map(|e| e.fraction).collect();
        assert_eq!(got, vec![Some(0.0), Some(0.5), None]);
    }
}

#[test]
fn dropped_subscribers_are_pruned() {
    let hub = ProgressHub::new();
    let keep = hub.subscribe();
    drop(hub.subscribe());
    assert_eq!(hub.subscriber_count(), 2);

    hub.publish(ProgressEvent {
        job: JobId(3),
        fraction: None,
    });
    assert_eq!(hub.subscriber_count(), 1);
    assert!(keep.try_recv().unwrap().is_terminal());
}

#[test]
fn listeners_see_every_event_without_a_receiver() {
    let hub = ProgressHub::new();
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    hub.add_listener(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    for fraction in [Some(0.0), None] {
        hub.publish(ProgressEvent {
            job: JobId(7),
            fraction,
        });
    }
    assert_eq!(seen.load(Ordering::SeqCst), 2);
    assert_eq!(hub.subscriber_count(), 0);
}
