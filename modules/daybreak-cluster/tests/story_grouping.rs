use std::collections::{HashMap, HashSet};

use daybreak_cluster::{story_admission, DensityClusterer, MIN_CLUSTER_SIZE};

/// Minimal stand-in for an embedded article: provider, country, vector.
struct SeededArticle {
    provider: &'static str,
    country: &'static str,
    embedding: Vec<f32>,
}

/// Embedding dimensionality for the synthetic vectors.
const DIM: usize = 24;

/// A topic blob: `spread` vectors around a shared centre, each nudged along
/// its own axis so every within-topic pair sits at the same small distance
/// while topics stay far apart.
fn topic(centre_axis: usize, spread: usize) -> Vec<Vec<f32>> {
    (0..spread)
        .map(|i| {
            let mut v = vec![0.0f32; DIM];
            v[centre_axis] = 10.0;
            v[(centre_axis + 1 + i) % DIM] += 0.1;
            v
        })
        .collect()
}

fn admitted_clusters(articles: &[SeededArticle]) -> Vec<Vec<usize>> {
    let vectors: Vec<Vec<f32>> = articles.iter().map(|a| a.embedding.clone()).collect();
    let labels = DensityClusterer::new(MIN_CLUSTER_SIZE).fit(&vectors);

    let mut clusters: HashMap<usize, Vec<usize>> = HashMap::new();
    for (index, label) in labels.iter().enumerate() {
        if let Some(label) = label {
            clusters.entry(*label).or_default().push(index);
        }
    }

    let mut admitted: Vec<Vec<usize>> = clusters
        .into_values()
        .filter(|members| {
            let providers: HashSet<&str> =
                members.iter().map(|&i| articles[i].provider).collect();
            let countries: HashSet<&str> =
                members.iter().map(|&i| articles[i].country).collect();
            story_admission(providers.len(), countries.len())
        })
        .collect();
    admitted.sort();
    admitted
}

/// A broadly covered control topic so the clusterer always has a second
/// dense region to separate the topic under test from.
fn control_topic(articles: &mut Vec<SeededArticle>) {
    let providers = [
        ("The Guardian", "UK"),
        ("BBC", "UK"),
        ("CNN", "US"),
        ("NPR", "US"),
        ("ABC", "AU"),
        ("SBS", "AU"),
    ];
    for (vector, (provider, country)) in topic(20, 6).into_iter().zip(providers) {
        articles.push(SeededArticle {
            provider,
            country,
            embedding: vector,
        });
    }
}

#[test]
fn single_provider_cluster_is_not_admitted() {
    // Six articles about one event, all from one provider: the cluster
    // forms but admission rejects it.
    let mut articles: Vec<SeededArticle> = topic(0, 6)
        .into_iter()
        .map(|embedding| SeededArticle {
            provider: "The Guardian",
            country: "UK",
            embedding,
        })
        .collect();
    control_topic(&mut articles);

    let admitted = admitted_clusters(&articles);

    assert_eq!(admitted.len(), 1, "only the control topic is admitted");
    assert!(
        admitted[0].iter().all(|&i| i >= 6),
        "no single-provider article admitted"
    );
}

#[test]
fn five_provider_cluster_is_admitted_whole() {
    // Three articles each from five distinct providers, same story: one
    // admitted cluster with all fifteen members.
    let providers = [
        ("The Guardian", "UK"),
        ("BBC", "UK"),
        ("CNN", "US"),
        ("The New York Times", "US"),
        ("ABC", "AU"),
    ];
    let mut articles = Vec::new();
    for (vector, i) in topic(0, 15).into_iter().zip(0..15) {
        let (provider, country) = providers[i % 5];
        articles.push(SeededArticle {
            provider,
            country,
            embedding: vector,
        });
    }
    control_topic(&mut articles);

    let admitted = admitted_clusters(&articles);

    assert_eq!(admitted.len(), 2, "seeded topic and control both admitted");
    assert!(
        admitted.iter().any(|members| members.len() == 15
            && members.iter().all(|&i| i < 15)),
        "the five-provider story keeps all fifteen article mappings"
    );
}

#[test]
fn two_country_four_provider_cluster_is_admitted() {
    // Two articles from each of four providers across two countries.
    let providers = [
        ("The Guardian", "UK"),
        ("BBC", "UK"),
        ("CNN", "US"),
        ("NPR", "US"),
    ];
    let mut articles = Vec::new();
    for (vector, i) in topic(0, 8).into_iter().zip(0..8) {
        let (provider, country) = providers[i % 4];
        articles.push(SeededArticle {
            provider,
            country,
            embedding: vector,
        });
    }
    control_topic(&mut articles);

    let admitted = admitted_clusters(&articles);

    assert_eq!(admitted.len(), 2);
    assert!(admitted
        .iter()
        .any(|members| members.len() == 8 && members.iter().all(|&i| i < 8)));
}

#[test]
fn three_country_four_provider_cluster_is_rejected() {
    // Four providers over three countries: fails every admission arm.
    let providers = [
        ("The Guardian", "UK"),
        ("CNN", "US"),
        ("ABC", "AU"),
        ("SBS", "AU"),
    ];
    let mut articles = Vec::new();
    for (vector, i) in topic(0, 8).into_iter().zip(0..8) {
        let (provider, country) = providers[i % 4];
        articles.push(SeededArticle {
            provider,
            country,
            embedding: vector,
        });
    }

    control_topic(&mut articles);

    let admitted = admitted_clusters(&articles);
    assert_eq!(admitted.len(), 1);
    assert!(admitted[0].iter().all(|&i| i >= 8));
}
