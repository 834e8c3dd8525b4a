//! Accumulation, pairwise querying, and clustering of page digests.

use std::collections::{BTreeMap, HashMap};

use rayon::prelude::*;

use crate::blocking;
use crate::config::{IndexConfig, IndexError};
use crate::types::{PageDigest, PageKey, SimilarityCluster, SimilarityRecord};

/// In-memory similarity index over page digests.
///
/// Usage is two-phase: an accumulation phase of [`insert`] calls, then a
/// read phase of [`query`] and [`cluster`] calls. Read results depend only
/// on the accumulated set, never on insertion order.
///
/// [`insert`]: SimilarityIndex::insert
/// [`query`]: SimilarityIndex::query
/// [`cluster`]: SimilarityIndex::cluster
pub struct SimilarityIndex {
    config: IndexConfig,
    records: Vec<PageDigest>,
}

impl SimilarityIndex {
    /// Creates an empty index with the given configuration.
    pub fn new(config: IndexConfig) -> Result<Self, IndexError> {
        config.validate()?;
        Ok(Self {
            config,
            records: Vec::new(),
        })
    }

    /// Appends one page digest.
    pub fn insert(&mut self, record: PageDigest) {
        self.records.push(record);
    }

    /// Number of accumulated digests.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the index holds no digests.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The threshold used when the caller does not supply one.
    pub fn default_threshold(&self) -> u32 {
        self.config.default_threshold
    }

    /// All unordered pairs scoring at or above `threshold`.
    ///
    /// Pairs sharing an identical key are skipped; two pages of the same
    /// document are compared like any others. Output is sorted by
    /// `(a, b, score)` and does not depend on insertion order.
    pub fn query(&self, threshold: u32) -> Vec<SimilarityRecord> {
        let records = self.sorted_records();

        let mut matches: Vec<SimilarityRecord> = if self.config.blocking.enabled {
            let pairs = blocking::candidate_pairs(&records, self.config.blocking.prefix_len);
            if self.config.use_parallel {
                pairs
                    .par_iter()
                    .filter_map(|&(i, j)| score_pair(&records, i, j, threshold))
                    .collect()
            } else {
                pairs
                    .iter()
                    .filter_map(|&(i, j)| score_pair(&records, i, j, threshold))
                    .collect()
            }
        } else if self.config.use_parallel {
            (0..records.len())
                .into_par_iter()
                .flat_map_iter(|i| {
                    let records = &records;
                    ((i + 1)..records.len())
                        .filter_map(move |j| score_pair(records, i, j, threshold))
                })
                .collect()
        } else {
            let mut out = Vec::new();
            for i in 0..records.len() {
                for j in (i + 1)..records.len() {
                    if let Some(record) = score_pair(&records, i, j, threshold) {
                        out.push(record);
                    }
                }
            }
            out
        };

        matches.sort();
        matches
    }

    /// Connected components of the `query(threshold)` match graph.
    ///
    /// Every accumulated page appears in exactly one cluster; a page with
    /// no qualifying match forms a singleton. Members are sorted by key,
    /// clusters by their first member, and ids number clusters in that
    /// order.
    pub fn cluster(&self, threshold: u32) -> Vec<SimilarityCluster> {
        let records = self.sorted_records();
        let mut keys: Vec<PageKey> = records.into_iter().map(|r| r.key).collect();
        keys.dedup();

        let position: HashMap<PageKey, usize> = keys
            .iter()
            .enumerate()
            .map(|(i, k)| (k.clone(), i))
            .collect();

        let mut components = UnionFind::new(keys.len());
        for record in self.query(threshold) {
            if let (Some(&i), Some(&j)) = (position.get(&record.a), position.get(&record.b)) {
                components.union(i, j);
            }
        }

        let mut groups: BTreeMap<usize, Vec<PageKey>> = BTreeMap::new();
        for (i, key) in keys.iter().enumerate() {
            groups.entry(components.find(i)).or_default().push(key.clone());
        }

        let mut member_lists: Vec<Vec<PageKey>> = groups.into_values().collect();
        member_lists.sort_by(|x, y| x[0].cmp(&y[0]));

        member_lists
            .into_iter()
            .enumerate()
            .map(|(id, members)| SimilarityCluster { id, members })
            .collect()
    }

    /// Accumulated records in key order, the basis for every read.
    fn sorted_records(&self) -> Vec<PageDigest> {
        let mut records = self.records.clone();
        records.sort_by(|x, y| x.key.cmp(&y.key));
        records
    }
}

/// Scores one candidate pair against the threshold.
fn score_pair(
    records: &[PageDigest],
    i: usize,
    j: usize,
    threshold: u32,
) -> Option<SimilarityRecord> {
    let a = &records[i];
    let b = &records[j];
    if a.key == b.key {
        return None;
    }
    let score = ctph::compare(&a.digest, &b.digest);
    if score >= threshold {
        Some(SimilarityRecord {
            a: a.key.clone(),
            b: b.key.clone(),
            score,
        })
    } else {
        None
    }
}

/// Scores two digest strings on the 0-100 scale.
///
/// A digest that fails to parse fails this comparison only.
pub fn compare(a: &str, b: &str) -> Result<u32, IndexError> {
    Ok(ctph::compare_strs(a, b)?)
}

/// Union-find over record positions, smallest root wins.
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[hi] = lo;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BlockingConfig;
    use ctph::CtphConfig;

    fn key(document: &str, page_index: usize) -> PageKey {
        PageKey {
            document: document.into(),
            page_index,
        }
    }

    fn record(document: &str, page_index: usize, digest: &str) -> PageDigest {
        PageDigest {
            key: key(document, page_index),
            digest: digest.parse().unwrap(),
        }
    }

    fn pseudo_bytes(seed: u64, len: usize) -> Vec<u8> {
        let mut state = seed;
        let mut out = Vec::with_capacity(len + 8);
        while out.len() < len {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            out.extend_from_slice(&state.to_le_bytes());
        }
        out.truncate(len);
        out
    }

    fn digest_of(seed: u64) -> ctph::FuzzyHash {
        let cfg = CtphConfig::new().with_min_input_bytes(64);
        ctph::digest(&pseudo_bytes(seed, 16 * 1024), &cfg).unwrap()
    }

    fn patched_digest_of(seed: u64) -> ctph::FuzzyHash {
        let cfg = CtphConfig::new().with_min_input_bytes(64);
        let mut data = pseudo_bytes(seed, 16 * 1024);
        for (i, byte) in data[4096..4128].iter_mut().enumerate() {
            *byte = (i as u8).wrapping_mul(53);
        }
        ctph::digest(&data, &cfg).unwrap()
    }

    // ==================== Insert Tests ====================

    #[test]
    fn test_insert_and_len() {
        let mut index = SimilarityIndex::new(IndexConfig::new()).unwrap();
        assert!(index.is_empty());
        index.insert(record("a.pdf", 0, "3:ABC:DE"));
        index.insert(record("a.pdf", 1, "3:FGH:IJ"));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = IndexConfig::new().with_default_threshold(150);
        assert!(matches!(
            SimilarityIndex::new(config),
            Err(IndexError::InvalidConfigThreshold { .. })
        ));
    }

    // ==================== Query Tests ====================

    #[test]
    fn test_query_finds_near_duplicates() {
        let mut index = SimilarityIndex::new(IndexConfig::new()).unwrap();
        index.insert(PageDigest {
            key: key("a.pdf", 2),
            digest: digest_of(1),
        });
        index.insert(PageDigest {
            key: key("b.pdf", 5),
            digest: patched_digest_of(1),
        });
        index.insert(PageDigest {
            key: key("c.pdf", 0),
            digest: digest_of(99),
        });

        let matches = index.query(70);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].a, key("a.pdf", 2));
        assert_eq!(matches[0].b, key("b.pdf", 5));
        assert!(matches[0].score >= 70);
    }

    #[test]
    fn test_query_is_insertion_order_independent() {
        let records = vec![
            PageDigest {
                key: key("x.pdf", 0),
                digest: digest_of(3),
            },
            PageDigest {
                key: key("y.pdf", 1),
                digest: patched_digest_of(3),
            },
            PageDigest {
                key: key("z.pdf", 2),
                digest: digest_of(4),
            },
        ];

        let mut forward = SimilarityIndex::new(IndexConfig::new()).unwrap();
        for r in records.iter().cloned() {
            forward.insert(r);
        }
        let mut reversed = SimilarityIndex::new(IndexConfig::new()).unwrap();
        for r in records.iter().rev().cloned() {
            reversed.insert(r);
        }

        assert_eq!(forward.query(0), reversed.query(0));
    }

    #[test]
    fn test_query_skips_identical_keys() {
        let mut index = SimilarityIndex::new(IndexConfig::new()).unwrap();
        index.insert(record("a.pdf", 0, "6:ABCDEFGHIJ:KLMNOPQRST"));
        index.insert(record("a.pdf", 0, "6:ABCDEFGHIJ:KLMNOPQRST"));
        assert!(index.query(0).is_empty());
    }

    #[test]
    fn test_query_compares_pages_of_same_document() {
        let mut index = SimilarityIndex::new(IndexConfig::new()).unwrap();
        index.insert(PageDigest {
            key: key("a.pdf", 0),
            digest: digest_of(5),
        });
        index.insert(PageDigest {
            key: key("a.pdf", 7),
            digest: patched_digest_of(5),
        });

        let matches = index.query(70);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].a, key("a.pdf", 0));
        assert_eq!(matches[0].b, key("a.pdf", 7));
    }

    #[test]
    fn test_query_serial_matches_parallel() {
        let mut serial =
            SimilarityIndex::new(IndexConfig::new().with_use_parallel(false)).unwrap();
        let mut parallel = SimilarityIndex::new(IndexConfig::new()).unwrap();
        for seed in 0..6 {
            let digest = if seed % 2 == 0 {
                digest_of(seed / 2)
            } else {
                patched_digest_of(seed / 2)
            };
            let record = PageDigest {
                key: key(&format!("doc{seed}.pdf"), 0),
                digest,
            };
            serial.insert(record.clone());
            parallel.insert(record);
        }

        assert_eq!(serial.query(50), parallel.query(50));
    }

    #[test]
    fn test_query_with_blocking_keeps_identical_digests() {
        let config = IndexConfig::new().with_blocking(BlockingConfig {
            enabled: true,
            prefix_len: 7,
        });
        let mut index = SimilarityIndex::new(config).unwrap();
        index.insert(PageDigest {
            key: key("a.pdf", 0),
            digest: digest_of(8),
        });
        index.insert(PageDigest {
            key: key("b.pdf", 0),
            digest: digest_of(8),
        });
        index.insert(PageDigest {
            key: key("c.pdf", 0),
            digest: digest_of(9),
        });

        let matches = index.query(80);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].score, 100);
    }

    #[test]
    fn test_query_threshold_filters() {
        let mut index = SimilarityIndex::new(IndexConfig::new()).unwrap();
        index.insert(record("a.pdf", 0, "6:ABCDEFGHIJ:QRSTUVWXYZ"));
        index.insert(record("b.pdf", 0, "6:ABCDEFGHIJ:0123456789"));

        // This crafted pair scores exactly 20.
        assert_eq!(index.query(20).len(), 1);
        assert!(index.query(21).is_empty());
    }

    // ==================== Cluster Tests ====================

    #[test]
    fn test_cluster_transitive_chain() {
        // h1~h2 scores 40, h2~h3 scores 80, h1~h3 scores 0: one component
        // through the shared middle page.
        let mut index = SimilarityIndex::new(IndexConfig::new()).unwrap();
        index.insert(record("a.pdf", 0, "6:ABCDEFGHIJ:KLMNOPQRST"));
        index.insert(record("b.pdf", 0, "12:KLMNOPQRST:UVWXYZabcd"));
        index.insert(record("c.pdf", 0, "24:UVWXYZabcd:efghijklmn"));

        let clusters = index.cluster(40);
        assert_eq!(clusters.len(), 1);
        assert_eq!(
            clusters[0].members,
            vec![key("a.pdf", 0), key("b.pdf", 0), key("c.pdf", 0)]
        );

        // Above the weaker edge the chain breaks in two.
        let clusters = index.cluster(50);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].members, vec![key("a.pdf", 0)]);
        assert_eq!(
            clusters[1].members,
            vec![key("b.pdf", 0), key("c.pdf", 0)]
        );
    }

    #[test]
    fn test_cluster_unmatched_pages_are_singletons() {
        let mut index = SimilarityIndex::new(IndexConfig::new()).unwrap();
        index.insert(PageDigest {
            key: key("a.pdf", 0),
            digest: digest_of(20),
        });
        index.insert(PageDigest {
            key: key("b.pdf", 0),
            digest: digest_of(21),
        });
        index.insert(PageDigest {
            key: key("c.pdf", 0),
            digest: digest_of(22),
        });

        let clusters = index.cluster(80);
        assert_eq!(clusters.len(), 3);
        for (i, cluster) in clusters.iter().enumerate() {
            assert_eq!(cluster.id, i);
            assert!(cluster.is_singleton());
        }
    }

    #[test]
    fn test_cluster_covers_every_page_once() {
        let mut index = SimilarityIndex::new(IndexConfig::new()).unwrap();
        for seed in 0..5 {
            index.insert(PageDigest {
                key: key("docs/corpus.pdf", seed as usize),
                digest: digest_of(seed),
            });
            index.insert(PageDigest {
                key: key("docs/copy.pdf", seed as usize),
                digest: patched_digest_of(seed),
            });
        }

        let clusters = index.cluster(70);
        let mut seen: Vec<PageKey> = clusters
            .iter()
            .flat_map(|c| c.members.iter().cloned())
            .collect();
        assert_eq!(seen.len(), 10);
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 10);
    }

    #[test]
    fn test_cluster_ids_follow_first_member_order() {
        let mut index = SimilarityIndex::new(IndexConfig::new()).unwrap();
        index.insert(record("z.pdf", 0, "6:ABCDEFGHIJ:KLMNOPQRST"));
        index.insert(record("m.pdf", 0, "3:ZZZYYYXXX:WWW"));
        index.insert(record("a.pdf", 0, "6:ABCDEFGHIJ:KLMNOPQRST"));

        let clusters = index.cluster(80);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].id, 0);
        assert_eq!(
            clusters[0].members,
            vec![key("a.pdf", 0), key("z.pdf", 0)]
        );
        assert_eq!(clusters[1].members, vec![key("m.pdf", 0)]);
    }

    // ==================== Compare Tests ====================

    #[test]
    fn test_compare_delegates_to_digest_layer() {
        assert_eq!(compare("3:ABC:DE", "3:ABC:DE").unwrap(), 100);
        assert!(matches!(
            compare("3:ABC:DE", "junk"),
            Err(IndexError::Digest(_))
        ));
    }

    // ==================== Union-Find Tests ====================

    #[test]
    fn test_union_find_components() {
        let mut uf = UnionFind::new(5);
        uf.union(0, 1);
        uf.union(3, 4);
        uf.union(1, 3);
        assert_eq!(uf.find(4), uf.find(0));
        assert_ne!(uf.find(2), uf.find(0));
    }

    #[test]
    fn test_union_find_smallest_root_wins() {
        let mut uf = UnionFind::new(4);
        uf.union(3, 2);
        uf.union(2, 1);
        assert_eq!(uf.find(3), 1);
        uf.union(0, 3);
        assert_eq!(uf.find(2), 0);
    }
}
