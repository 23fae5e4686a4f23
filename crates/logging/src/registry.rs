//! crates/logging/src/registry.rs
//! Registry of package prefixes whose frames are never reported as the caller.
//!
//! The registry is read on every attributed log call and written rarely,
//! typically once at startup when a host registers its own wrapper layers.
//! Readers load an immutable [`PrefixSet`] snapshot; writers copy the current
//! snapshot, append, and publish the copy with a single atomic swap. The set
//! only grows, so a reader racing a writer at worst misses the newest prefix.

use std::sync::{Arc, LazyLock};

use arc_swap::ArcSwap;

/// Crates treated as internal before any host registration.
///
/// The list covers this workspace and the engine crates a record can travel
/// through before it reaches the resolver. Seeded names are bare crate names,
/// so they only match demangled function paths and versioned dependency
/// directories; an application's own `src/logging/` module stays external.
pub const DEFAULT_INTERNAL_PACKAGES: &[&str] = &[
    "logging",
    "logging_sink",
    "sitelog",
    "tracing",
    "tracing_core",
    "tracing_subscriber",
    "arc_swap",
];

/// Immutable snapshot of registered prefixes, in registration order.
///
/// The first [`seeded_len`](Self::seeded_len) entries come from
/// [`DEFAULT_INTERNAL_PACKAGES`]; the rest were registered by the host.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PrefixSet {
    prefixes: Arc<Vec<String>>,
    seeded: usize,
}

impl PrefixSet {
    /// Builds a snapshot from an explicit list, mostly useful in tests.
    pub fn from_prefixes<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Vec::new();
        for prefix in prefixes {
            if let Some(prefix) = normalize(prefix.into()) {
                if !set.contains(&prefix) {
                    set.push(prefix);
                }
            }
        }
        Self {
            prefixes: Arc::new(set),
            seeded: 0,
        }
    }

    /// Iterates over every prefix, seeded ones first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.prefixes.iter().map(String::as_str)
    }

    /// Iterates over the prefixes registered by the host.
    pub fn registered(&self) -> impl Iterator<Item = &str> {
        self.prefixes[self.seeded..].iter().map(String::as_str)
    }

    /// Number of leading entries seeded from [`DEFAULT_INTERNAL_PACKAGES`].
    pub fn seeded_len(&self) -> usize {
        self.seeded
    }

    /// Reports whether `prefix` is part of the snapshot.
    pub fn contains(&self, prefix: &str) -> bool {
        self.prefixes.iter().any(|p| p == prefix)
    }

    /// Number of prefixes.
    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    /// Reports whether the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// Borrows the prefixes as a slice.
    pub fn as_slice(&self) -> &[String] {
        &self.prefixes
    }
}

/// Growable, concurrently readable set of internal package prefixes.
#[derive(Debug)]
pub struct InternalPackages {
    current: ArcSwap<Vec<String>>,
    seeded: usize,
}

impl InternalPackages {
    /// Creates a registry with no prefixes.
    pub fn empty() -> Self {
        Self {
            current: ArcSwap::from_pointee(Vec::new()),
            seeded: 0,
        }
    }

    /// Creates an isolated registry seeded with [`DEFAULT_INTERNAL_PACKAGES`].
    pub fn with_defaults() -> Self {
        let defaults: Vec<String> = DEFAULT_INTERNAL_PACKAGES
            .iter()
            .map(|name| (*name).to_owned())
            .collect();
        Self {
            seeded: defaults.len(),
            current: ArcSwap::from_pointee(defaults),
        }
    }

    /// Returns the latest published snapshot.
    pub fn snapshot(&self) -> PrefixSet {
        PrefixSet {
            prefixes: self.current.load_full(),
            seeded: self.seeded,
        }
    }

    /// Appends unseen prefixes and publishes the result.
    ///
    /// Returns how many prefixes were new. Blank entries are ignored and a
    /// prefix that is already present does not grow the set.
    pub fn register<I, S>(&self, prefixes: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let additions: Vec<String> = prefixes
            .into_iter()
            .filter_map(|prefix| normalize(prefix.into()))
            .collect();
        if additions.is_empty() {
            return 0;
        }

        let current = self.current.load();
        if additions.iter().all(|prefix| current.contains(prefix)) {
            return 0;
        }
        drop(current);

        let mut added = 0;
        self.current.rcu(|current| {
            let mut next = Vec::with_capacity(current.len() + additions.len());
            next.extend(current.iter().cloned());
            added = 0;
            for prefix in &additions {
                if !next.contains(prefix) {
                    next.push(prefix.clone());
                    added += 1;
                }
            }
            next
        });

        tracing::debug!(
            target: "logging::registry",
            added,
            prefixes = ?additions,
            "registered internal packages"
        );
        added
    }
}

impl Default for InternalPackages {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn normalize(prefix: String) -> Option<String> {
    let trimmed = prefix
        .trim()
        .trim_end_matches("::")
        .trim_end_matches('/')
        .trim_start_matches('/');
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == prefix.len() {
        Some(prefix)
    } else {
        Some(trimmed.to_owned())
    }
}

static GLOBAL: LazyLock<Arc<InternalPackages>> =
    LazyLock::new(|| Arc::new(InternalPackages::with_defaults()));

/// Returns the process-wide registry used by [`resolve_caller`](crate::resolve_caller)
/// and by loggers built without an explicit registry.
pub fn global() -> &'static Arc<InternalPackages> {
    &GLOBAL
}

/// Registers prefixes in the process-wide registry.
pub fn register_internal_packages<I, S>(prefixes: I) -> usize
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    global().register(prefixes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn defaults_seed_the_registry() {
        let registry = InternalPackages::with_defaults();
        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), DEFAULT_INTERNAL_PACKAGES.len());
        assert!(snapshot.contains("logging"));
        assert!(snapshot.contains("tracing_core"));
        assert_eq!(snapshot.seeded_len(), DEFAULT_INTERNAL_PACKAGES.len());
        assert_eq!(snapshot.registered().count(), 0);
    }

    #[test]
    fn host_registrations_follow_the_seeded_defaults() {
        let registry = InternalPackages::with_defaults();
        registry.register(["app::wrapper", "logging"]);
        let snapshot = registry.snapshot();
        assert_eq!(snapshot.registered().collect::<Vec<_>>(), ["app::wrapper"]);
        assert_eq!(snapshot.len(), DEFAULT_INTERNAL_PACKAGES.len() + 1);
    }

    #[test]
    fn register_appends_in_order() {
        let registry = InternalPackages::empty();
        assert_eq!(registry.register(["app::wrapper", "app::adapter"]), 2);
        let snapshot = registry.snapshot();
        assert_eq!(snapshot.as_slice(), ["app::wrapper", "app::adapter"]);
    }

    #[test]
    fn empty_registration_is_a_no_op() {
        let registry = InternalPackages::empty();
        let before = registry.snapshot();
        assert_eq!(registry.register(Vec::<String>::new()), 0);
        assert_eq!(registry.register(["  ", "::"]), 0);
        assert_eq!(registry.snapshot(), before);
    }

    #[test]
    fn duplicate_registration_does_not_grow_the_set() {
        let registry = InternalPackages::empty();
        registry.register(["github.com/test/wrapper"]);
        assert_eq!(registry.register(["github.com/test/wrapper"]), 0);
        assert_eq!(registry.snapshot().len(), 1);
    }

    #[test]
    fn trailing_separators_are_normalized() {
        let registry = InternalPackages::empty();
        registry.register(["app::wrapper::", "pkg/"]);
        let snapshot = registry.snapshot();
        assert!(snapshot.contains("app::wrapper"));
        assert!(snapshot.contains("pkg"));
    }

    #[test]
    fn published_snapshots_are_immutable() {
        let registry = InternalPackages::empty();
        registry.register(["first"]);
        let old = registry.snapshot();
        registry.register(["second"]);
        assert_eq!(old.as_slice(), ["first"]);
        assert_eq!(registry.snapshot().as_slice(), ["first", "second"]);
    }

    #[test]
    fn concurrent_writers_never_lose_prefixes() {
        let registry = Arc::new(InternalPackages::empty());
        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    for n in 0..16 {
                        registry.register([format!("pkg{worker}_{n}")]);
                        assert!(registry.snapshot().len() >= n + 1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("worker completes");
        }
        assert_eq!(registry.snapshot().len(), 8 * 16);
    }

    #[test]
    fn prefix_set_from_prefixes_deduplicates() {
        let set = PrefixSet::from_prefixes(["a", "b", "a", ""]);
        assert_eq!(set.as_slice(), ["a", "b"]);
        assert!(!set.is_empty());
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
