pub mod admission;
pub mod density;

pub use admission::{accept_timeline, is_super_story, story_admission, MIN_CLUSTER_SIZE};
pub use density::DensityClusterer;
