pub mod models;
pub mod rules;
pub mod generator;
pub mod stream;

pub use models::{CombinationKey, TripCombination};
pub use generator::{CombinationEngine, Combinations};
pub use stream::{
    ChannelSink, EventSink, StreamEvent, StreamOutcome, StreamState, StreamWriteError,
    StreamingCoordinator,
};
