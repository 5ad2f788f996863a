mod articles;
mod client;
mod digests;
mod embeddings;
mod error;
mod images;
mod keywords;
pub mod migrate;
mod rows;
mod stories;
mod timelines;

pub use client::Store;
pub use rows::{
    ArticleRow, DigestRow, ImageRow, NewArticle, NewImage, NewTimeline, NewTimelineEvent,
    ProviderRow, RundownRow, StoryRow, TimelineRow,
};
