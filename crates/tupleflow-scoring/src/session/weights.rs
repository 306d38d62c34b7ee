// Constraint weight overrides applied when a session is built.

use std::fmt::Debug;

use indexmap::IndexMap;
use tupleflow_core::Score;

// Replacement weights keyed by full constraint name (`package/name`, or just
// `name` for constraints without a package).
//
// Names keep the order they were first put in, so a build that rejects an
// unknown name always reports the same one.
#[derive(Clone, PartialEq, Eq)]
pub struct ConstraintWeightOverrides<Sc: Score> {
    weights: IndexMap<String, Sc>,
}

impl<Sc: Score> Debug for ConstraintWeightOverrides<Sc> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.weights.iter()).finish()
    }
}

impl<Sc: Score> Default for ConstraintWeightOverrides<Sc> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Sc: Score> ConstraintWeightOverrides<Sc> {
    pub fn new() -> Self {
        Self {
            weights: IndexMap::new(),
        }
    }

    // Later pairs win over earlier pairs with the same name.
    pub fn from_pairs<I, N>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, Sc)>,
        N: Into<String>,
    {
        let mut overrides = Self::new();
        for (name, weight) in pairs {
            overrides.put(name, weight);
        }
        overrides
    }

    pub fn put<N: Into<String>>(&mut self, name: N, weight: Sc) {
        self.weights.insert(name.into(), weight);
    }

    // Weight in effect for `name`: the override if any, else `declared`.
    pub fn get_or_default(&self, name: &str, declared: Sc) -> Sc {
        self.weights.get(name).copied().unwrap_or(declared)
    }

    pub fn get(&self, name: &str) -> Option<&Sc> {
        self.weights.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.weights.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.weights.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}
