use tracing::debug;

/// Guards 1/distance when duplicate points produce zero distances.
const MIN_DISTANCE: f64 = 1e-10;

/// Density-based clusterer over embedding vectors.
///
/// The pipeline is the classic mutual-reachability construction: core
/// distances at `min_cluster_size` neighbours, a minimum spanning tree over
/// the mutual-reachability graph, single-linkage merges, a condensed tree
/// that drops components smaller than `min_cluster_size`, and
/// excess-of-mass cluster selection on stability. The root component is
/// never selected: a grouping must outlive some split to count.
///
/// Points outside every selected cluster are noise.
pub struct DensityClusterer {
    min_cluster_size: usize,
}

/// One record in the condensed-tree arena. Parent/child links are indices
/// into the arena, never owning references.
#[derive(Debug)]
struct CondensedCluster {
    parent: Option<usize>,
    children: Vec<usize>,
    /// 1/distance at which this cluster separated from its parent.
    birth_lambda: f64,
    /// Points that fall out of this cluster directly, with their 1/distance.
    points: Vec<(usize, f64)>,
    /// Points in the merge subtree at birth.
    size: usize,
}

/// A single-linkage merge. Nodes `0..n` are points; merge `i` creates node
/// `n + i`.
#[derive(Debug, Clone, Copy)]
struct Merge {
    left: usize,
    right: usize,
    distance: f64,
}

impl DensityClusterer {
    pub fn new(min_cluster_size: usize) -> Self {
        // Below 2 the condensed tree degenerates to single points.
        Self {
            min_cluster_size: min_cluster_size.max(2),
        }
    }

    /// Cluster `points`, returning one label per point; `None` is noise.
    /// Labels are dense and start at 0 but carry no further meaning.
    pub fn fit(&self, points: &[Vec<f32>]) -> Vec<Option<usize>> {
        let n = points.len();
        if n < self.min_cluster_size || n < 2 {
            return vec![None; n];
        }

        let distances = distance_matrix(points);
        let core = core_distances(&distances, self.min_cluster_size);
        let mst = mutual_reachability_mst(&distances, &core);
        let merges = single_linkage(n, mst);
        let clusters = self.condense(n, &merges);
        let selected = select_excess_of_mass(&clusters);
        let labels = label_points(n, &clusters, &selected);

        debug!(
            points = n,
            clusters = selected.len(),
            noise = labels.iter().filter(|l| l.is_none()).count(),
            "Density clustering complete"
        );
        labels
    }

    /// Build the condensed tree from the merge tree, walking top-down.
    /// Splits that shed fewer than `min_cluster_size` points keep the parent
    /// cluster alive; splits into two large components create two children.
    fn condense(&self, n: usize, merges: &[Merge]) -> Vec<CondensedCluster> {
        let m = self.min_cluster_size;
        let size_of = |node: usize| {
            if node < n {
                1
            } else {
                subtree_size(n, merges, node)
            }
        };

        let mut clusters = vec![CondensedCluster {
            parent: None,
            children: Vec::new(),
            birth_lambda: 0.0,
            points: Vec::new(),
            size: n,
        }];

        let root_node = n + merges.len() - 1;
        let mut stack: Vec<(usize, usize)> = vec![(root_node, 0)];

        while let Some((node, cluster)) = stack.pop() {
            let merge = merges[node - n];
            let lambda = 1.0 / merge.distance.max(MIN_DISTANCE);
            let left_size = size_of(merge.left);
            let right_size = size_of(merge.right);

            match (left_size >= m, right_size >= m) {
                (true, true) => {
                    for (child, child_size) in
                        [(merge.left, left_size), (merge.right, right_size)]
                    {
                        let id = clusters.len();
                        clusters[cluster].children.push(id);
                        clusters.push(CondensedCluster {
                            parent: Some(cluster),
                            children: Vec::new(),
                            birth_lambda: lambda,
                            points: Vec::new(),
                            size: child_size,
                        });
                        stack.push((child, id));
                    }
                }
                (true, false) => {
                    shed_points(n, merges, merge.right, lambda, &mut clusters[cluster]);
                    stack.push((merge.left, cluster));
                }
                (false, true) => {
                    shed_points(n, merges, merge.left, lambda, &mut clusters[cluster]);
                    stack.push((merge.right, cluster));
                }
                (false, false) => {
                    shed_points(n, merges, merge.left, lambda, &mut clusters[cluster]);
                    shed_points(n, merges, merge.right, lambda, &mut clusters[cluster]);
                }
            }
        }

        clusters
    }
}

fn euclidean(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = f64::from(*x) - f64::from(*y);
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

fn distance_matrix(points: &[Vec<f32>]) -> Vec<Vec<f64>> {
    let n = points.len();
    let mut dist = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d = euclidean(&points[i], &points[j]);
            dist[i][j] = d;
            dist[j][i] = d;
        }
    }
    dist
}

/// Distance to the `k`-th nearest neighbour, the point itself included.
fn core_distances(distances: &[Vec<f64>], k: usize) -> Vec<f64> {
    distances
        .iter()
        .map(|row| {
            let mut sorted = row.clone();
            sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            sorted[k - 1]
        })
        .collect()
}

/// Prim's MST over the implicit mutual-reachability graph:
/// `mr(a, b) = max(core(a), core(b), d(a, b))`.
fn mutual_reachability_mst(
    distances: &[Vec<f64>],
    core: &[f64],
) -> Vec<(usize, usize, f64)> {
    let n = core.len();
    let mut in_tree = vec![false; n];
    let mut best = vec![f64::INFINITY; n];
    let mut best_from = vec![0usize; n];
    let mut edges = Vec::with_capacity(n.saturating_sub(1));

    let mut current = 0;
    in_tree[0] = true;

    for _ in 1..n {
        for j in 0..n {
            if in_tree[j] {
                continue;
            }
            let weight = distances[current][j].max(core[current]).max(core[j]);
            if weight < best[j] {
                best[j] = weight;
                best_from[j] = current;
            }
        }

        let mut next = usize::MAX;
        let mut next_weight = f64::INFINITY;
        for j in 0..n {
            if !in_tree[j] && best[j] < next_weight {
                next = j;
                next_weight = best[j];
            }
        }

        edges.push((best_from[next], next, next_weight));
        in_tree[next] = true;
        current = next;
    }

    edges
}

/// Merge MST edges in ascending weight order into a dendrogram.
fn single_linkage(n: usize, mut edges: Vec<(usize, usize, f64)>) -> Vec<Merge> {
    edges.sort_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal));

    // Union-find over point and merge nodes; each component's root is its
    // newest merge node.
    let mut parent: Vec<usize> = (0..(2 * n - 1)).collect();
    fn find(parent: &mut [usize], mut x: usize) -> usize {
        while parent[x] != x {
            parent[x] = parent[parent[x]];
            x = parent[x];
        }
        x
    }

    let mut merges = Vec::with_capacity(n - 1);
    for (u, v, distance) in edges {
        let ru = find(&mut parent, u);
        let rv = find(&mut parent, v);
        let node = n + merges.len();
        merges.push(Merge {
            left: ru,
            right: rv,
            distance,
        });
        parent[ru] = node;
        parent[rv] = node;
    }
    merges
}

/// Number of points under a merge-tree node.
fn subtree_size(n: usize, merges: &[Merge], node: usize) -> usize {
    let mut count = 0;
    let mut stack = vec![node];
    while let Some(x) = stack.pop() {
        if x < n {
            count += 1;
        } else {
            let merge = merges[x - n];
            stack.push(merge.left);
            stack.push(merge.right);
        }
    }
    count
}

/// Drop every point under `node` out of `cluster` at `lambda`.
fn shed_points(n: usize, merges: &[Merge], node: usize, lambda: f64, cluster: &mut CondensedCluster) {
    let mut stack = vec![node];
    while let Some(x) = stack.pop() {
        if x < n {
            cluster.points.push((x, lambda));
        } else {
            let merge = merges[x - n];
            stack.push(merge.left);
            stack.push(merge.right);
        }
    }
}

/// Stability of each condensed cluster: how long its points persisted past
/// the cluster's birth, in lambda terms.
fn stabilities(clusters: &[CondensedCluster]) -> Vec<f64> {
    clusters
        .iter()
        .map(|c| {
            let from_points: f64 = c
                .points
                .iter()
                .map(|(_, lambda)| lambda - c.birth_lambda)
                .sum();
            let from_children: f64 = c
                .children
                .iter()
                .map(|&child| {
                    (clusters[child].birth_lambda - c.birth_lambda) * clusters[child].size as f64
                })
                .sum();
            from_points + from_children
        })
        .collect()
}

/// Excess-of-mass selection: a cluster is kept when it is at least as
/// stable as its selected descendants combined. The root (index 0) is
/// excluded. Returns the selected cluster ids.
fn select_excess_of_mass(clusters: &[CondensedCluster]) -> Vec<usize> {
    let k = clusters.len();
    let stability = stabilities(clusters);
    let mut selected = vec![false; k];
    let mut subtree_stability = vec![0.0; k];

    // Children always carry higher ids than their parent, so a reverse scan
    // visits children first.
    for id in (0..k).rev() {
        let child_sum: f64 = clusters[id]
            .children
            .iter()
            .map(|&c| subtree_stability[c])
            .sum();

        if id == 0 {
            subtree_stability[id] = child_sum;
        } else if clusters[id].children.is_empty() || stability[id] >= child_sum {
            selected[id] = true;
            subtree_stability[id] = stability[id];
        } else {
            subtree_stability[id] = child_sum;
        }
    }

    // A selected ancestor absorbs its selected descendants.
    (0..k)
        .filter(|&id| {
            if !selected[id] {
                return false;
            }
            let mut up = clusters[id].parent;
            while let Some(p) = up {
                if selected[p] {
                    return false;
                }
                up = clusters[p].parent;
            }
            true
        })
        .collect()
}

/// Assign each point the selected cluster it fell out of (directly or via a
/// descendant); everything else is noise.
fn label_points(
    n: usize,
    clusters: &[CondensedCluster],
    selected: &[usize],
) -> Vec<Option<usize>> {
    let label_of: std::collections::HashMap<usize, usize> = selected
        .iter()
        .enumerate()
        .map(|(label, &id)| (id, label))
        .collect();

    let mut labels = vec![None; n];
    for (id, cluster) in clusters.iter().enumerate() {
        // Nearest selected ancestor-or-self, if any.
        let mut at = Some(id);
        let owner = loop {
            match at {
                Some(c) => {
                    if let Some(&label) = label_of.get(&c) {
                        break Some(label);
                    }
                    at = clusters[c].parent;
                }
                None => break None,
            }
        };

        if let Some(label) = owner {
            for &(point, _) in &cluster.points {
                labels[point] = Some(label);
            }
        }
    }
    labels
}
