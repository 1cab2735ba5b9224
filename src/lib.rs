//! Noisewall renders animated procedural-noise backgrounds.
//!
//! A loop of grayscale noise frames is synthesized in parallel, amplified by tiling and
//! nearest-neighbour scaling, and blended over a two-colour linear gradient with a Porter-Duff
//! operator. The entry point for live use is [`NoiseEngine`]:
//!
//! - Build a [`Configuration`] (defaults, JSON, or your own settings store)
//! - Create a [`NoiseEngine`] with a [`RenderSink`] that puts frames on screen
//! - Forward surface size, visibility and [`ConfigEvent`]s from the host
//! - Watch generation through [`NoiseEngine::subscribe_progress`]
//!
//! The building blocks ([`NoiseSynthesizer`], [`tile`], [`scale`], [`build_gradient`],
//! [`composite`], [`FrameSet`], [`FrameGenerator`], [`AnimationScheduler`]) are public for hosts
//! that drive the pipeline themselves.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod composite;
pub(crate) mod config;
pub(crate) mod engine;
pub(crate) mod frames;
pub(crate) mod job;
pub(crate) mod noise;
pub(crate) mod render;
pub(crate) mod scheduler;

pub use crate::foundation::core::{Argb, Extent, PixelBuffer, Rgba8Premul};
pub use crate::foundation::error::{NoiseError, NoiseResult};

pub use crate::composite::blend::{BlendMode, blend, blend_in_place, composite};
pub use crate::composite::gradient::{PercentPoint, build_gradient};
pub use crate::composite::scale::{ScaleFilter, scale};
pub use crate::composite::tile::tile;
pub use crate::config::color::parse_hex;
pub use crate::config::settings::{
    ConfigEvent, ConfigKey, Configuration, DEFAULT_PRIMARY_COLOR, DEFAULT_SECONDARY_COLOR,
    GradientParams, NoiseParams, limits,
};
pub use crate::engine::noise_engine::{EngineOpts, NoiseEngine};
pub use crate::frames::frame_set::{FrameSet, Slot};
pub use crate::job::cancel::CancellationToken;
pub use crate::job::generation::{FrameGenerator, GenerationJob, JobState, build_thread_pool};
pub use crate::job::plan::GenerationPlan;
pub use crate::job::progress::{JobId, ProgressEvent, ProgressHub};
pub use crate::noise::synth::{MAX_BRIGHTNESS, NoiseSynthesizer};
pub use crate::render::pipeline::{ComposedFrames, build_background, compose_slot};
pub use crate::render::sink::{
    InMemorySink, PngSequenceSink, PresentedFrame, RenderSink, SharedSink, unpremultiply,
    write_png,
};
pub use crate::scheduler::animation::AnimationScheduler;
pub use crate::scheduler::runner::TickLoop;
