pub(crate) mod noise_engine;
