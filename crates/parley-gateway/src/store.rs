use parking_lot::RwLock;
use serde_json::Value;

/// Process-wide single-slot store behind the staging endpoint.
///
/// Empty at start. Every write replaces the previous value; a read returns
/// the last write.
#[derive(Default)]
pub struct StagingStore {
    slot: RwLock<Option<Value>>,
}

impl StagingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&self, value: Value) {
        *self.slot.write() = Some(value);
    }

    pub fn latest(&self) -> Option<Value> {
        self.slot.read().clone()
    }

    pub fn clear(&self) {
        *self.slot.write() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn starts_empty() {
        assert!(StagingStore::new().latest().is_none());
    }

    #[test]
    fn last_write_wins() {
        let store = StagingStore::new();
        store.write(json!({"name": "Ana"}));
        store.write(json!({"name": "Bea"}));
        assert_eq!(store.latest(), Some(json!({"name": "Bea"})));
        store.clear();
        assert!(store.latest().is_none());
    }
}
