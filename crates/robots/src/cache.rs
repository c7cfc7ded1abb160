use dashmap::DashMap;

/// Port for the robots.txt body cache. String-keyed, string-valued; the
/// subsystem owns serialization. A single instance lives for the duration
/// of one crawl run.
pub trait RobotsCache: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn put(&self, key: &str, value: String);
}

/// In-process cache backing a single crawl run.
#[derive(Default)]
pub struct InMemoryRobotsCache(DashMap<String, String>);

impl InMemoryRobotsCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RobotsCache for InMemoryRobotsCache {
    fn get(&self, key: &str) -> Option<String> {
        self.0.get(key).map(|v| v.clone())
    }

    fn put(&self, key: &str, value: String) {
        self.0.insert(key.to_string(), value);
    }
}
