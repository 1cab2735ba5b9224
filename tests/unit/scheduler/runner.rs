use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;

use super::*;

fn counting_loop(interval: Duration, visible: bool) -> (TickLoop, mpsc::Receiver<()>, Arc<AtomicUsize>) {
    let (tx, rx) = mpsc::channel();
    let count = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&count);
    let l = TickLoop::spawn(interval, visible, move || {
        c.fetch_add(1, Ordering::SeqCst);
        let _ = tx.send(());
    })
    .unwrap();
    (l, rx, count)
}

#[test]
fn visible_loop_ticks_repeatedly() {
    let (mut l, rx, _) = counting_loop(Duration::from_millis(2), true);
    for _ in 0..5 {
        rx.recv_timeout(Duration::from_secs(10)).unwrap();
    }
    l.shutdown();
}

#[test]
fn hidden_loop_does_not_tick_until_shown() {
    let (mut l, rx, count) = counting_loop(Duration::from_millis(1), false);
    assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    assert_eq!(count.load(Ordering::SeqCst), 0);

    // A long interval proves the tick after showing is immediate, not scheduled.
    l.set_interval(Duration::from_secs(3600));
    l.set_visible(true);
    rx.recv_timeout(Duration::from_secs(10)).unwrap();
    l.shutdown();
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn hiding_stops_ticks() {
    let (mut l, rx, count) = counting_loop(Duration::from_millis(1), true);
    rx.recv_timeout(Duration::from_secs(10)).unwrap();
    l.set_visible(false);
    assert!(!l.is_visible());

    // Drain anything already in flight, then expect silence.
    std::thread::sleep(Duration::from_millis(20));
    let settled = count.load(Ordering::SeqCst);
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(count.load(Ordering::SeqCst), settled);
    l.shutdown();
}

#[test]
fn shutdown_interrupts_a_long_wait() {
    let (mut l, rx, _) = counting_loop(Duration::from_secs(3600), true);
    rx.recv_timeout(Duration::from_secs(10)).unwrap();
    let started = Instant::now();
    l.shutdown();
    assert!(started.elapsed() < Duration::from_secs(5));
    l.shutdown();
}

#[test]
fn panicking_tick_keeps_the_loop_alive() {
    let (tx, rx) = mpsc::channel();
    let mut n = 0;
    let mut l = TickLoop::spawn(Duration::from_millis(1), true, move || {
        n += 1;
        if n == 1 {
            panic!("first tick fails");
        }
        let _ = tx.send(n);
    })
    .unwrap();
    assert_eq!(rx.recv_timeout(Duration::from_secs(10)).unwrap(), 2);
    l.shutdown();
}

#[test]
fn interval_change_keeps_the_pending_deadline() {
    let (mut l, rx, count) = counting_loop(Duration::from_secs(3600), true);
    rx.recv_timeout(Duration::from_secs(10)).unwrap();

    // The hour-long wait already started; a shorter interval only applies after the next tick.
    l.set_interval(Duration::from_millis(1));
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(l.interval(), Duration::from_millis(1));
    l.shutdown();
}
