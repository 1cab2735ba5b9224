use super::*;
use crate::config::settings::Configuration;
use crate::foundation::core::{Extent, PixelBuffer};

fn frames_with(len: usize, ready: &[usize]) -> FrameSet {
    let frames = FrameSet::new(len, Extent::new(2, 2).unwrap()).unwrap();
    for &i in ready {
        frames.fill(i, PixelBuffer::new(2, 2).unwrap()).unwrap();
    }
    frames
}

fn run(s: &mut AnimationScheduler, frames: &FrameSet, ticks: usize) -> Vec<Option<usize>> {
    (0..ticks).map(|_| s.tick(frames)).collect()
}

#[test]
fn complete_set_cycles_through_every_slot() {
    let frames = frames_with(3, &[0, 1, 2]);
    let mut s = AnimationScheduler::new(Duration::from_millis(10));
    assert_eq!(
        run(&mut s, &frames, 7),
        vec![Some(0), Some(1), Some(2), Some(0), Some(1), Some(2), Some(0)]
    );
}

#[test]
fn partial_set_loops_over_written_prefix() {
    let frames = frames_with(5, &[0, 1]);
    let mut s = AnimationScheduler::new(Duration::from_millis(10));
    assert_eq!(
        run(&mut s, &frames, 5),
        vec![Some(0), Some(1), Some(0), Some(1), Some(0)]
    );
}

#[test]
fn pending_current_slot_falls_back_to_zero() {
    let frames = frames_with(4, &[0]);
    let mut s = AnimationScheduler::new(Duration::from_millis(10));
    s.current = 2;
    assert_eq!(s.tick(&frames), Some(0));
    assert_eq!(s.current_index(), 0);
}

#[test]
fn nothing_renders_before_slot_zero_is_written() {
    let frames = frames_with(3, &[]);
    let mut s = AnimationScheduler::new(Duration::from_millis(10));
    assert_eq!(s.tick(&frames), None);
    assert_eq!(s.current_index(), 0);
}

#[test]
fn hidden_scheduler_does_not_advance() {
    let frames = frames_with(2, &[0, 1]);
    let mut s = AnimationScheduler::new(Duration::from_millis(10));
    assert!(s.set_visible(false));
    assert!(!s.set_visible(false));
    assert_eq!(s.tick(&frames), None);
    assert_eq!(s.current_index(), 0);

    s.set_visible(true);
    assert_eq!(s.tick(&frames), Some(0));
    assert_eq!(s.current_index(), 1);
}

#[test]
fn cursor_past_a_shrunken_set_restarts() {
    let frames = frames_with(2, &[0, 1]);
    let mut s = AnimationScheduler::new(Duration::from_millis(10));
    s.current = 9;
    assert_eq!(s.tick(&frames), Some(0));
}

#[test]
fn interval_comes_from_frame_rate() {
    let config = Configuration {
        fps: 24,
        ..Configuration::default()
    };
    let mut s = AnimationScheduler::new(config.frame_interval());
    let ms = s.frame_interval().as_secs_f64() * 1000.0;
    assert!((ms - 41.67).abs() < 0.01, "{ms}");

    s.set_frame_interval(Duration::from_millis(5));
    assert_eq!(s.frame_interval(), Duration::from_millis(5));
}
