use std::sync::{Arc, Mutex, OnceLock, Weak};

use fnv::FnvHashMap;

use crate::plan::FourierPlans;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PlanKey {
    pub resolution: [usize; 2],
    pub aliased: bool,
}

/// Process-wide, resolution-keyed cache of transform plans.
///
/// Fields hold an `Arc<FourierPlans>` handle; the registry only keeps a
/// `Weak`, so the plans for a resolution are built once, shared by every
/// field of that resolution, and freed exactly when the last holding field
/// is dropped. Acquire is the single contended path across threads and is
/// serialized by the mutex; a use-after-free of destroyed plans is
/// unrepresentable by construction.
pub struct TransformRegistry {
    entries: Mutex<FnvHashMap<PlanKey, Weak<FourierPlans>>>,
}

static GLOBAL: OnceLock<TransformRegistry> = OnceLock::new();

impl TransformRegistry {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(FnvHashMap::default()),
        }
    }

    pub fn global() -> &'static TransformRegistry {
        GLOBAL.get_or_init(TransformRegistry::new)
    }

    /// Returns the shared plans for `(resolution, aliased)`, constructing
    /// them on first use. Entries whose last handle has been dropped are
    /// purged on the way.
    pub fn acquire(&self, resolution: [usize; 2], aliased: bool) -> Arc<FourierPlans> {
        let mut entries = self
            .entries
            .lock()
            .expect("transform registry lock poisoned");
        entries.retain(|_, weak| weak.strong_count() > 0);

        let key: PlanKey = PlanKey {
            resolution,
            aliased,
        };
        if let Some(plans) = entries.get(&key).and_then(Weak::upgrade) {
            return plans;
        }

        let plans: Arc<FourierPlans> = Arc::new(FourierPlans::create(resolution, aliased));
        entries.insert(key, Arc::downgrade(&plans));
        plans
    }

    /// Number of plan families currently kept alive by at least one field.
    pub fn live_plans(&self) -> usize {
        self.entries
            .lock()
            .expect("transform registry lock poisoned")
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}

impl Default for TransformRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plans_are_shared_per_resolution() {
        let registry: TransformRegistry = TransformRegistry::new();
        let a = registry.acquire([8, 8], false);
        let b = registry.acquire([8, 8], false);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.live_plans(), 1);
    }

    #[test]
    fn aliased_family_is_keyed_separately() {
        let registry: TransformRegistry = TransformRegistry::new();
        let plain = registry.acquire([12, 12], false);
        let padded = registry.acquire([12, 12], true);
        assert!(!Arc::ptr_eq(&plain, &padded));
        assert_eq!(registry.live_plans(), 2);
    }

    #[test]
    fn entry_dies_with_its_last_handle() {
        let registry: TransformRegistry = TransformRegistry::new();
        let a = registry.acquire([16, 8], false);
        let b = registry.acquire([16, 8], false);
        drop(a);
        assert_eq!(registry.live_plans(), 1);
        drop(b);
        assert_eq!(registry.live_plans(), 0);

        // A later acquire rebuilds rather than resurrecting a dead entry.
        let c = registry.acquire([16, 8], false);
        assert_eq!(registry.live_plans(), 1);
        drop(c);
    }

    #[test]
    fn concurrent_acquire_release() {
        let registry: &'static TransformRegistry = Box::leak(Box::new(TransformRegistry::new()));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        let plans = registry.acquire([8, 8], t % 2 == 0);
                        assert_eq!(plans.resolution(), [8, 8]);
                        drop(plans);
                    }
                })
            })
            .collect();
        handles.into_iter().for_each(|h| h.join().unwrap());
        assert_eq!(registry.live_plans(), 0);
    }
}
