pub mod canon;
pub mod collector;
pub mod fetch;
pub mod filter;
pub mod homepage;
pub mod parse;
pub mod timezone;
pub mod validate;

pub use collector::{CollectStats, Collector};
pub use fetch::{FetchError, HttpFetcher, PageFetcher};
pub use parse::{ArticleParser, MetaArticleParser, ParsedArticle};
