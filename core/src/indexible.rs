use std::collections::HashMap;
use std::hash::Hash;

use crate::error::{LazyError, Result};

/// Uniform get/set over positional and named argument containers.
pub trait Indexible<K, V> {
    fn get(&self, key: &K) -> Option<&V>;

    /// Stores `value` under `key`. Positional containers only replace
    /// existing slots.
    fn set(&mut self, key: K, value: V) -> Result<()>;
}

impl<V> Indexible<usize, V> for Vec<V> {
    fn get(&self, key: &usize) -> Option<&V> {
        self.as_slice().get(*key)
    }

    fn set(&mut self, key: usize, value: V) -> Result<()> {
        let len = self.len();
        let slot = self
            .get_mut(key)
            .ok_or(LazyError::IndexOutOfBounds { index: key, len })?;
        *slot = value;
        Ok(())
    }
}

impl<K: Eq + Hash, V> Indexible<K, V> for HashMap<K, V> {
    fn get(&self, key: &K) -> Option<&V> {
        HashMap::get(self, key)
    }

    fn set(&mut self, key: K, value: V) -> Result<()> {
        self.insert(key, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replace_first<C: Indexible<K, i32>, K: Clone>(container: &mut C, key: K) -> Option<i32> {
        let old = *container.get(&key)?;
        container.set(key, old * 10).ok()?;
        Some(old)
    }

    #[test]
    fn test_vec_and_map_share_interface() {
        let mut positional = vec![1, 2, 3];
        assert_eq!(replace_first(&mut positional, 1usize), Some(2));
        assert_eq!(positional, vec![1, 20, 3]);
        assert_eq!(Indexible::get(&positional, &5), None);

        let mut named = HashMap::from([("x".to_string(), 4)]);
        assert_eq!(replace_first(&mut named, "x".to_string()), Some(4));
        assert_eq!(named["x"], 40);
        assert_eq!(replace_first(&mut named, "y".to_string()), None);
    }

    #[test]
    fn test_vec_set_past_end_fails() {
        let mut positional = vec![1, 2];
        assert_eq!(
            Indexible::set(&mut positional, 2, 9),
            Err(LazyError::IndexOutOfBounds { index: 2, len: 2 })
        );
        assert_eq!(positional, vec![1, 2]);

        let mut named: HashMap<String, i32> = HashMap::new();
        assert!(Indexible::set(&mut named, "z".to_string(), 1).is_ok());
        assert_eq!(named["z"], 1);
    }
}
