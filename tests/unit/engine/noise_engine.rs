use std::time::Duration;

use super::*;
use crate::config::settings::ConfigKey;
use crate::render::sink::{InMemorySink, PresentedFrame, SharedSink};

fn config() -> Configuration {
    Configuration {
        fps: 3,
        loop_seconds: 1,
        ..Configuration::default()
    }
}

fn manual(config: Configuration, sink: SharedSink) -> NoiseEngine {
    NoiseEngine::new(
        config,
        sink,
        EngineOpts {
            seed: Some(11),
            worker_threads: Some(2),
            manual_tick: true,
        },
    )
    .unwrap()
}

struct FailingSink;

impl RenderSink for FailingSink {
    fn present(&mut self, _frame: &PresentedFrame) -> NoiseResult<()> {
        Err(NoiseError::render("surface lost"))
    }
}

#[test]
fn nothing_renders_before_a_surface_is_known() {
    let sink = SharedSink::new();
    let engine = manual(config(), sink.clone());
    assert_eq!(engine.job_state(), JobState::Idle);
    assert!(engine.frame_set().is_empty());
    assert_eq!(engine.render_now().unwrap(), None);
    assert!(sink.is_empty());
}

#[test]
fn manual_ticks_cycle_through_generated_frames() {
    let sink = SharedSink::new();
    let mut engine = manual(config(), sink.clone());
    engine.surface_changed(24, 16).unwrap();
    assert_eq!(engine.wait_for_generation().unwrap(), JobState::Completed);

    let slots: Vec<_> = (0..4).map(|_| engine.render_now().unwrap()).collect();
    assert_eq!(slots, vec![Some(0), Some(1), Some(2), Some(0)]);
    assert_eq!(sink.slots(), vec![0, 1, 2, 0]);

    let last = sink.last().unwrap();
    assert_eq!(last.frame.extent(), Extent::new(24, 16).unwrap());
    assert!(Arc::ptr_eq(&last.background, &engine.background().unwrap()));
}

#[test]
fn unchanged_surface_keeps_the_frame_set() {
    let mut engine = manual(config(), SharedSink::new());
    engine.surface_changed(20, 20).unwrap();
    let first = engine.frame_set();
    engine.surface_changed(20, 20).unwrap();
    assert!(Arc::ptr_eq(&first, &engine.frame_set()));

    engine.surface_changed(21, 20).unwrap();
    assert!(!Arc::ptr_eq(&first, &engine.frame_set()));
}

#[test]
fn rotated_surface_with_rotation_support_keeps_frames() {
    let cfg = Configuration {
        rotation_support: true,
        ..config()
    };
    let mut engine = manual(cfg, SharedSink::new());
    engine.surface_changed(30, 50).unwrap();
    let frames = engine.frame_set();
    assert_eq!(frames.frame_extent(), Extent::new(50, 50).unwrap());

    engine.surface_changed(50, 30).unwrap();
    assert!(Arc::ptr_eq(&frames, &engine.frame_set()));
    assert_eq!(
        engine.background().unwrap().extent(),
        Extent::new(50, 30).unwrap()
    );
}

#[test]
fn blend_mode_change_rebuilds_nothing() {
    let mut engine = manual(config(), SharedSink::new());
    engine.surface_changed(16, 16).unwrap();
    let frames = engine.frame_set();
    let background = engine.background().unwrap();

    let next = Configuration {
        blend_mode: BlendMode::Multiply,
        ..config()
    };
    engine
        .reconfigure(ConfigEvent::new(ConfigKey::BlendMode, next))
        .unwrap();
    assert!(Arc::ptr_eq(&frames, &engine.frame_set()));
    assert!(Arc::ptr_eq(&background, &engine.background().unwrap()));
    assert_eq!(engine.shared.render().blend_mode, BlendMode::Multiply);

    let composed = engine.shared.render().composed.clone().unwrap();
    assert_eq!(composed.mode(), BlendMode::Multiply);
    assert!(Arc::ptr_eq(composed.frames(), &frames));
}

#[test]
fn later_loops_present_cached_composites() {
    let sink = SharedSink::new();
    let mut engine = manual(config(), sink.clone());
    engine.surface_changed(24, 16).unwrap();
    assert_eq!(engine.wait_for_generation().unwrap(), JobState::Completed);

    for _ in 0..6 {
        engine.render_now().unwrap();
    }
    let presented = sink.frames();
    assert_eq!(sink.slots(), vec![0, 1, 2, 0, 1, 2]);
    for slot in 0..3 {
        assert!(Arc::ptr_eq(&presented[slot].frame, &presented[slot + 3].frame));
    }
}

#[test]
fn reapplied_configuration_keeps_cached_composites() {
    let mut engine = manual(config(), SharedSink::new());
    engine.surface_changed(16, 16).unwrap();
    engine.wait_for_generation().unwrap();
    engine.render_now().unwrap();
    let before = engine.shared.render().composed.clone().unwrap();

    engine
        .reconfigure(ConfigEvent::new(ConfigKey::BlendMode, config()))
        .unwrap();
    let after = engine.shared.render().composed.clone().unwrap();
    assert!(Arc::ptr_eq(&before, &after));
    assert!(after.is_composed(0));
}

#[test]
fn compositor_thread_fills_the_cache_ahead_of_ticks() {
    let sink = SharedSink::new();
    let mut engine = NoiseEngine::new(
        config(),
        sink,
        EngineOpts {
            seed: Some(3),
            worker_threads: Some(2),
            manual_tick: false,
        },
    )
    .unwrap();
    engine.visibility_changed(false);
    engine.surface_changed(12, 12).unwrap();
    assert_eq!(engine.wait_for_generation().unwrap(), JobState::Completed);

    let deadline = std::time::Instant::now() + Duration::from_secs(10);
    loop {
        let composed = engine.shared.render().composed.clone().unwrap();
        if composed.composed_count() == composed.frames().len() {
            break;
        }
        assert!(std::time::Instant::now() < deadline, "compositor never caught up");
        std::thread::sleep(Duration::from_millis(5));
    }
    engine.shutdown();
    assert!(engine.shared.render().composed.is_none());
}

#[test]
fn colour_change_rebuilds_only_the_background() {
    let mut engine = manual(config(), SharedSink::new());
    engine.surface_changed(16, 16).unwrap();
    let frames = engine.frame_set();
    let background = engine.background().unwrap();

    let next = Configuration {
        secondary_color: None,
        ..config()
    };
    engine
        .reconfigure(ConfigEvent::new(ConfigKey::SecondaryColor, next))
        .unwrap();
    assert!(Arc::ptr_eq(&frames, &engine.frame_set()));
    assert!(!Arc::ptr_eq(&background, &engine.background().unwrap()));
}

#[test]
fn frame_rate_change_regenerates_and_updates_interval() {
    let mut engine = manual(config(), SharedSink::new());
    engine.surface_changed(16, 16).unwrap();
    let frames = engine.frame_set();

    let next = Configuration {
        fps: 24,
        ..config()
    };
    engine
        .reconfigure(ConfigEvent::new(ConfigKey::Fps, next))
        .unwrap();
    assert!(!Arc::ptr_eq(&frames, &engine.frame_set()));
    assert_eq!(engine.frame_set().len(), 24);
    assert_eq!(
        engine.shared.render().scheduler.frame_interval(),
        Duration::from_nanos(1_000_000_000 / 24)
    );
}

#[test]
fn reconfigure_clamps_incoming_snapshots() {
    let mut engine = manual(config(), SharedSink::new());
    let wild = Configuration {
        fps: 0,
        min_noise_brightness: 90,
        max_noise_brightness: 10,
        ..config()
    };
    engine
        .reconfigure(ConfigEvent::new(ConfigKey::Fps, wild))
        .unwrap();
    assert_eq!(engine.config().fps, 1);
    assert_eq!(engine.config().min_noise_brightness, 10);
    assert_eq!(engine.config().max_noise_brightness, 90);
}

#[test]
fn hidden_engine_presents_nothing() {
    let sink = SharedSink::new();
    let mut engine = manual(config(), sink.clone());
    engine.surface_changed(8, 8).unwrap();
    engine.wait_for_generation().unwrap();

    engine.visibility_changed(false);
    assert_eq!(engine.render_now().unwrap(), None);
    engine.visibility_changed(true);
    assert_eq!(engine.render_now().unwrap(), Some(0));
    assert_eq!(sink.len(), 1);
}

#[test]
fn sink_failures_surface_from_render_now() {
    let mut engine = NoiseEngine::new(
        config(),
        FailingSink,
        EngineOpts {
            manual_tick: true,
            ..EngineOpts::default()
        },
    )
    .unwrap();
    engine.surface_changed(8, 8).unwrap();
    engine.wait_for_generation().unwrap();
    let err = engine.render_now().unwrap_err();
    assert!(matches!(err, NoiseError::Render(_)));
}

#[test]
fn shutdown_releases_frames_and_rejects_further_events() {
    let mut engine = manual(config(), SharedSink::new());
    engine.surface_changed(8, 8).unwrap();
    engine.shutdown();
    engine.shutdown();

    assert!(engine.frame_set().is_empty());
    assert!(engine.background().is_none());
    assert!(engine.surface_changed(9, 9).is_err());
    assert!(engine.render_now().is_err());
}

#[test]
fn boxed_sinks_are_accepted() {
    let boxed: Box<dyn RenderSink> = Box::new(InMemorySink::new());
    let engine = NoiseEngine::new(
        config(),
        boxed,
        EngineOpts {
            manual_tick: true,
            ..EngineOpts::default()
        },
    );
    assert!(engine.is_ok());
}
