pub mod classifier;
pub mod fetcher;
pub mod locator;
pub mod naming;
pub mod pipeline;
pub mod resolver;
pub mod tagger;
pub mod transcoder;
