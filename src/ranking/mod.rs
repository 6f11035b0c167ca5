pub mod levenshtein;

pub use levenshtein::levenshtein_distance;

/// Candidate with its edit distance to the query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedCandidate<T> {
    pub item: T,
    pub name: String,
    pub distance: usize,
}

/// Keeps the candidate closest to a query while candidates stream in
/// (e.g. across catalog pages). Ties keep the first candidate offered.
#[derive(Debug)]
pub struct ClosestMatch<'q, T> {
    query: &'q str,
    best: Option<RankedCandidate<T>>,
}

impl<'q, T> ClosestMatch<'q, T> {
    pub fn new(query: &'q str) -> Self {
        Self { query, best: None }
    }

    /// Offer a candidate; returns its distance to the query
    pub fn offer(&mut self, item: T, name: &str) -> usize {
        let distance = levenshtein_distance(self.query, name);
        let better = self
            .best
            .as_ref()
            .map_or(true, |best| distance < best.distance);

        if better {
            self.best = Some(RankedCandidate {
                item,
                name: name.to_string(),
                distance,
            });
        }
        distance
    }

    pub fn best(&self) -> Option<&RankedCandidate<T>> {
        self.best.as_ref()
    }

    pub fn into_best(self) -> Option<RankedCandidate<T>> {
        self.best
    }
}

/// Closest candidate to `query`, ties keep the earliest
pub fn closest_match<T, S, I>(query: &str, candidates: I) -> Option<RankedCandidate<T>>
where
    S: AsRef<str>,
    I: IntoIterator<Item = (T, S)>,
{
    let mut closest = ClosestMatch::new(query);
    for (item, name) in candidates {
        closest.offer(item, name.as_ref());
    }
    closest.into_best()
}
