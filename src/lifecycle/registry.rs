use super::Schedulable;
use std::sync::Arc;

/// Ordered, fixed collection of schedulables. Insertion order is stop order;
/// the same handle may appear more than once.
#[derive(Clone, Default)]
pub struct SchedulableSet {
    schedulables: Vec<Arc<dyn Schedulable>>,
}

impl SchedulableSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, schedulable: Arc<dyn Schedulable>) {
        tracing::debug!(name = schedulable.name(), "Registering schedulable");
        self.schedulables.push(schedulable);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Schedulable>> {
        self.schedulables.iter()
    }

    pub fn len(&self) -> usize {
        self.schedulables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schedulables.is_empty()
    }
}

impl FromIterator<Arc<dyn Schedulable>> for SchedulableSet {
    fn from_iter<I: IntoIterator<Item = Arc<dyn Schedulable>>>(iter: I) -> Self {
        let mut set = Self::new();
        for schedulable in iter {
            set.register(schedulable);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{CallLog, MockSchedulable};

    #[test]
    fn test_preserves_order_and_duplicates() {
        let log = CallLog::new();
        let a: Arc<dyn Schedulable> = Arc::new(MockSchedulable::ok("a", &log));
        let b: Arc<dyn Schedulable> = Arc::new(MockSchedulable::ok("b", &log));

        let set: SchedulableSet = vec![a.clone(), b, a].into_iter().collect();

        let names: Vec<_> = set.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["a", "b", "a"]);
        assert_eq!(set.len(), 3);
        assert!(SchedulableSet::new().is_empty());
    }
}
