pub mod bootstrap;
pub mod controller;
pub mod embedder;
pub mod images;
pub mod rundowns;
pub mod stories;
pub mod summarise;
pub mod timelines;

pub use controller::{DigestController, DigestLifecycle};
pub use summarise::Summariser;
