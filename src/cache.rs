use std::fmt::{self, Debug, Display};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

/// Content fingerprint of a journal source: the MD5 digest of its raw
/// bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 16]);

impl Fingerprint {
    pub fn of(content: impl AsRef<[u8]>) -> Fingerprint {
        Fingerprint(*md5::compute(content))
    }
}

impl Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.iter().try_for_each(|b| write!(f, "{:02x}", b))
    }
}

impl Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Fingerprint({})", self)
    }
}

/// Holds the last value computed from a source, along with the
/// fingerprint of the source it was computed from.
///
/// The slot is replaced wholesale whenever a different fingerprint is
/// requested. Safe to share between threads.
pub struct FingerprintCache<T> {
    slot: Mutex<Option<(Fingerprint, Arc<T>)>>,
}

impl<T> Default for FingerprintCache<T> {
    fn default() -> Self {
        FingerprintCache {
            slot: Mutex::new(None),
        }
    }
}

impl<T> FingerprintCache<T> {
    pub fn new() -> FingerprintCache<T> {
        Self::default()
    }

    /// Returns the cached value if it was computed for `fp`, otherwise
    /// computes it with `producer` and stores it.
    ///
    /// On error the previous value is kept.
    pub fn get_or_try_insert<E>(
        &self,
        fp: Fingerprint,
        producer: impl FnOnce() -> Result<T, E>,
    ) -> Result<Arc<T>, E> {
        // the lock can only be poisoned by `producer`, before the slot is written
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some((cached, value)) = slot.as_ref() {
            if *cached == fp {
                debug!(%fp, "cache hit");
                return Ok(Arc::clone(value));
            }
        }

        debug!(%fp, "cache miss");
        let value = Arc::new(producer()?);
        *slot = Some((fp, Arc::clone(&value)));
        Ok(value)
    }

    /// Fingerprint of the cached value, if any.
    pub fn fingerprint(&self) -> Option<Fingerprint> {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref().map(|(fp, _)| *fp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::Cell;

    use pretty_assertions::assert_eq;

    #[test]
    fn test_fingerprint() {
        assert_eq!(
            Fingerprint::of("").to_string(),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
        assert_eq!(Fingerprint::of("abc"), Fingerprint::of(b"abc"));
        assert!(Fingerprint::of("abc") != Fingerprint::of("abd"));
    }

    #[test]
    fn test_recompute_on_change() {
        let cache = FingerprintCache::new();
        let calls = Cell::new(0);
        let produce = |v: u32| {
            calls.set(calls.get() + 1);
            Ok::<_, ()>(v)
        };

        let a = Fingerprint::of("journal v1");
        let b = Fingerprint::of("journal v2");

        assert_eq!(*cache.get_or_try_insert(a, || produce(1)).unwrap(), 1);
        assert_eq!(*cache.get_or_try_insert(a, || produce(2)).unwrap(), 1);
        assert_eq!(calls.get(), 1);

        assert_eq!(*cache.get_or_try_insert(b, || produce(3)).unwrap(), 3);
        assert_eq!(calls.get(), 2);
        assert_eq!(cache.fingerprint(), Some(b));

        // going back to an older content recomputes too
        assert_eq!(*cache.get_or_try_insert(a, || produce(4)).unwrap(), 4);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_error_keeps_previous_value() {
        let cache = FingerprintCache::new();
        let a = Fingerprint::of("a");
        let b = Fingerprint::of("b");

        assert_eq!(*cache.get_or_try_insert(a, || Ok::<_, &str>(1)).unwrap(), 1);
        assert_eq!(cache.get_or_try_insert(b, || Err("boom")), Err("boom"));
        assert_eq!(cache.fingerprint(), Some(a));
        assert_eq!(*cache.get_or_try_insert(a, || Ok::<_, &str>(2)).unwrap(), 1);
    }
}
