use std::collections::HashMap;

const SEQUENCE_WIDTH: usize = 3;

/// Hands out tenant-local ids like `ACME001`, one counter per domain
#[derive(Debug, Clone, Default)]
pub struct TenantIdAllocator {
    prefixes: HashMap<String, String>,
    counters: HashMap<String, u32>,
}

impl TenantIdAllocator {
    pub fn new(prefixes: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            prefixes: prefixes
                .into_iter()
                .map(|(domain, prefix)| (domain.to_ascii_lowercase(), prefix))
                .collect(),
            counters: HashMap::new(),
        }
    }

    pub fn allocate(&mut self, domain: &str) -> String {
        let key = domain.to_ascii_lowercase();
        let prefix = self
            .prefixes
            .get(&key)
            .cloned()
            .unwrap_or_else(|| fallback_prefix(&key));
        let counter = self.counters.entry(key).or_insert(0);
        *counter += 1;
        format!("{}{:0width$}", prefix, counter, width = SEQUENCE_WIDTH)
    }
}

// first DNS label, upper-cased
fn fallback_prefix(domain: &str) -> String {
    domain
        .split('.')
        .next()
        .unwrap_or(domain)
        .to_ascii_uppercase()
}

/// First word and the remaining words; the remainder may be empty
pub fn split_name(full: &str) -> (String, String) {
    let mut parts = full.split_whitespace();
    let first = parts.next().unwrap_or_default().to_string();
    let rest = parts.collect::<Vec<_>>().join(" ");
    (first, rest)
}
