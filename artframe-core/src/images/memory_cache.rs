use std::collections::HashMap;

/// Bounded URL → data URI map in front of the persistent image partition.
///
/// Eviction is positional rather than recency based: each URL is mapped to
/// its catalog index (see [`MemoryCache::index_catalog`]) and on overflow the
/// resident entry circularly furthest from the anchor goes first. The anchor
/// is the position of the last `get` hit or the last [`MemoryCache::focus`].
/// Inserts never move it, so look-ahead loads cannot push out the image the
/// user is looking at; an insert further away than every resident entry is
/// itself the one dropped.
#[derive(Debug)]
pub struct MemoryCache {
    capacity: usize,
    entries: HashMap<String, String>,
    positions: HashMap<String, usize>,
    ring_len: usize,
    anchor: Option<usize>,
}

impl MemoryCache {
    /// A capacity of 0 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            positions: HashMap::new(),
            ring_len: 0,
            anchor: None,
        }
    }

    /// Maximum number of resident entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of resident entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// No resident entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Catalog index eviction distances are measured from.
    pub fn anchor(&self) -> Option<usize> {
        self.anchor
    }

    /// Record the catalog order of image URLs. The first occurrence of a
    /// duplicated URL wins.
    pub fn index_catalog<I, S>(&mut self, urls: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.positions.clear();
        let mut len = 0;
        for (index, url) in urls.into_iter().enumerate() {
            self.positions.entry(url.into()).or_insert(index);
            len = index + 1;
        }
        self.ring_len = len;
        if self.anchor.is_some_and(|anchor| anchor >= len) {
            self.anchor = None;
        }
    }

    /// Look up `key`; a hit moves the anchor to its position.
    pub fn get(&mut self, key: &str) -> Option<String> {
        let value = self.entries.get(key).cloned()?;
        if let Some(&position) = self.positions.get(key) {
            self.anchor = Some(position);
        }
        Some(value)
    }

    /// Residency check that leaves the anchor alone.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert or replace `key`, evicting if over capacity. Returns the evicted
    /// key, if any.
    pub fn put(&mut self, key: String, value: String) -> Option<String> {
        self.entries.insert(key.clone(), value);
        if self.entries.len() <= self.capacity {
            return None;
        }

        let victim = self.pick_victim(&key)?;
        self.entries.remove(&victim);
        Some(victim)
    }

    /// Move the anchor to an explicit catalog position.
    pub fn focus(&mut self, index: usize) {
        if index < self.ring_len {
            self.anchor = Some(index);
        }
    }

    /// Drops every entry. The catalog index and anchor are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// The inserted key competes like any other entry, so an image further
    /// from the anchor than everything resident is dropped straight away.
    /// Among equal ranks the inserted key stays.
    fn pick_victim(&self, inserted: &str) -> Option<String> {
        self.entries
            .keys()
            .max_by(|a, b| {
                self.eviction_rank(a)
                    .cmp(&self.eviction_rank(b))
                    .then_with(|| {
                        (a.as_str() != inserted).cmp(&(b.as_str() != inserted))
                    })
                    // Deterministic among equals.
                    .then_with(|| b.cmp(a))
            })
            .cloned()
    }

    /// Higher ranks are evicted first: unknown positions, then circular
    /// distance from the anchor, then entries behind the anchor.
    fn eviction_rank(&self, key: &str) -> (bool, usize, bool) {
        let Some(&position) = self.positions.get(key) else {
            return (true, usize::MAX, false);
        };
        let Some(anchor) = self.anchor.filter(|_| self.ring_len > 0) else {
            return (false, 0, false);
        };

        let n = self.ring_len;
        let ahead = (position + n - anchor) % n;
        let behind = (anchor + n - position) % n;
        (false, ahead.min(behind), behind < ahead)
    }
}
