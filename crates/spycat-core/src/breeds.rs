use std::collections::HashSet;

/// Answers whether a breed name is known. Consulted before a cat is stored.
pub trait BreedCatalog: Send + Sync {
    fn is_valid_breed(&self, name: &str) -> bool;
}

/// Catalog backed by a fixed list of names, matched case-insensitively.
/// An empty list accepts any non-blank name.
#[derive(Debug, Clone, Default)]
pub struct StaticBreedCatalog {
    known: HashSet<String>,
}

impl StaticBreedCatalog {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let known = names
            .into_iter()
            .map(|name| normalize(name.as_ref()))
            .filter(|name| !name.is_empty())
            .collect();
        Self { known }
    }

    pub fn permissive() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}

impl BreedCatalog for StaticBreedCatalog {
    fn is_valid_breed(&self, name: &str) -> bool {
        let name = normalize(name);
        if name.is_empty() {
            return false;
        }
        self.known.is_empty() || self.known.contains(&name)
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}
