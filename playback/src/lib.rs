pub mod clock;
pub mod estimator;

pub use clock::PlaybackClock;
pub use estimator::{ElapsedEstimator, SyncPoint};
