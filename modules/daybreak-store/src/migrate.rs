use tracing::info;

use daybreak_common::DigestError;

use crate::error::store_err;
use crate::Store;

/// Table creation statements, ordered so foreign keys resolve.
/// Every statement is idempotent.
const TABLES: &[(&str, &str)] = &[
    (
        "providers",
        "create table if not exists providers (
            id bigserial primary key,
            name text not null unique,
            url text not null,
            favicon_url text not null,
            country text not null,
            timezone text not null
        )",
    ),
    (
        "articles",
        "create table if not exists articles (
            id bigserial primary key,
            provider_id bigint not null references providers(id),
            ts timestamptz not null,
            date date not null,
            title text not null,
            subtitle text not null,
            url text not null unique,
            body text not null,
            image_url text,
            image_urls text
        )",
    ),
    (
        "article_embeddings",
        "create table if not exists article_embeddings (
            article_id bigint primary key references articles(id),
            embedding text not null
        )",
    ),
    (
        "digests",
        "create table if not exists digests (
            id bigint primary key,
            status text not null,
            ts timestamptz not null
        )",
    ),
    (
        "stories",
        "create table if not exists stories (
            id bigserial primary key,
            ts timestamptz not null,
            digest_id bigint not null references digests(id),
            digest_description text not null,
            title text not null,
            summary text not null,
            coverage text not null
        )",
    ),
    (
        "story_articles",
        "create table if not exists story_articles (
            story_id bigint not null references stories(id),
            article_id bigint not null references articles(id),
            unique (story_id, article_id)
        )",
    ),
    (
        "story_embeddings",
        "create table if not exists story_embeddings (
            story_id bigint primary key references stories(id),
            embedding text not null
        )",
    ),
    (
        "keywords",
        "create table if not exists keywords (
            id bigserial primary key,
            keyword text not null,
            type text not null,
            unique (keyword, type)
        )",
    ),
    (
        "story_keywords",
        "create table if not exists story_keywords (
            story_id bigint not null references stories(id),
            keyword_id bigint not null references keywords(id),
            unique (story_id, keyword_id)
        )",
    ),
    (
        "digest_rundowns",
        "create table if not exists digest_rundowns (
            digest_id bigint not null references digests(id),
            rundown_type text not null,
            rundown text not null,
            unique (digest_id, rundown_type)
        )",
    ),
    (
        "timelines",
        "create table if not exists timelines (
            id bigserial primary key,
            ts timestamptz not null,
            digest_id bigint not null references digests(id),
            subject text not null,
            headline text not null,
            summary text not null,
            unique (digest_id, subject)
        )",
    ),
    (
        "timeline_events",
        "create table if not exists timeline_events (
            timeline_id bigint not null references timelines(id),
            story_id bigint not null references stories(id),
            description text not null,
            date date not null,
            date_type text not null,
            unique (timeline_id, description)
        )",
    ),
    (
        "timeline_stories",
        "create table if not exists timeline_stories (
            timeline_id bigint not null references timelines(id),
            story_id bigint not null references stories(id),
            unique (timeline_id, story_id)
        )",
    ),
    (
        "timeline_keywords",
        "create table if not exists timeline_keywords (
            timeline_id bigint not null references timelines(id),
            keyword_id bigint not null references keywords(id),
            unique (timeline_id, keyword_id)
        )",
    ),
    (
        "images",
        "create table if not exists images (
            id bigserial primary key,
            story_id bigint not null references stories(id),
            title text,
            url text not null,
            source_page text,
            height int,
            width int,
            format text
        )",
    ),
];

/// Provider seed: (name, homepage, favicon, country, IANA timezone).
const PROVIDER_SEED: &[(&str, &str, &str, &str, &str)] = &[
    (
        "ABC",
        "https://www.abc.net.au/news",
        "https://www.abc.net.au/favicon.ico",
        "AU",
        "Australia/Sydney",
    ),
    (
        "Al Jazeera",
        "https://www.aljazeera.com",
        "https://www.aljazeera.com/favicon.ico",
        "QA",
        "Asia/Qatar",
    ),
    (
        "BBC",
        "https://www.bbc.com/news",
        "https://www.bbc.com/favicon.ico",
        "UK",
        "Europe/London",
    ),
    (
        "CNN",
        "https://edition.cnn.com",
        "https://edition.cnn.com/favicon.ico",
        "US",
        "America/New_York",
    ),
    (
        "Fox News",
        "https://www.foxnews.com",
        "https://www.foxnews.com/favicon.ico",
        "US",
        "America/New_York",
    ),
    (
        "NPR",
        "https://www.npr.org",
        "https://www.npr.org/favicon.ico",
        "US",
        "America/New_York",
    ),
    (
        "SBS",
        "https://www.sbs.com.au/news",
        "https://www.sbs.com.au/favicon.ico",
        "AU",
        "Australia/Sydney",
    ),
    (
        "The Guardian",
        "https://www.theguardian.com",
        "https://www.theguardian.com/favicon.ico",
        "UK",
        "Europe/London",
    ),
    (
        "The New York Times",
        "https://www.nytimes.com",
        "https://www.nytimes.com/favicon.ico",
        "US",
        "America/New_York",
    ),
    (
        "The Sydney Morning Herald",
        "https://www.smh.com.au",
        "https://www.smh.com.au/favicon.ico",
        "AU",
        "Australia/Sydney",
    ),
    (
        "The Washington Post",
        "https://www.washingtonpost.com",
        "https://www.washingtonpost.com/favicon.ico",
        "US",
        "America/New_York",
    ),
    (
        "9 News",
        "https://www.9news.com.au",
        "https://www.9news.com.au/favicon.ico",
        "AU",
        "Australia/Sydney",
    ),
];

/// Create every table and seed missing providers. Safe to run on every start.
pub async fn migrate(store: &Store) -> Result<(), DigestError> {
    for (table, ddl) in TABLES {
        sqlx::query(ddl)
            .execute(&store.pool)
            .await
            .map_err(store_err(table))?;
    }

    for (name, url, favicon_url, country, timezone) in PROVIDER_SEED {
        sqlx::query(
            "insert into providers (name, url, favicon_url, country, timezone)
             values ($1, $2, $3, $4, $5)
             on conflict (name) do nothing",
        )
        .bind(name)
        .bind(url)
        .bind(favicon_url)
        .bind(country)
        .bind(timezone)
        .execute(&store.pool)
        .await
        .map_err(store_err("providers"))?;
    }

    info!(tables = TABLES.len(), providers = PROVIDER_SEED.len(), "Store migrated");
    Ok(())
}
