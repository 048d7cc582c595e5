//! Label tables: integer keys mapped to a name and a color.

use std::collections::BTreeMap;

use tracing::debug;

/// Name of the entry every dictionary carries for unlabeled voxels.
pub const UNASSIGNED_LABEL_NAME: &str = "???";

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub name: String,
    /// Red, green, blue and alpha in `[0, 1]`.
    pub rgba: [f32; 4],
}

impl Label {
    pub fn new(name: impl Into<String>, rgba: [f32; 4]) -> Self {
        Self {
            name: name.into(),
            rgba,
        }
    }
}

/// Ordered `key -> label` mapping with a reserved "unassigned" key.
///
/// Keys are unique; names need not be. The unassigned entry is always present
/// and cannot be removed.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelDictionary {
    labels: BTreeMap<i32, Label>,
    unassigned_key: i32,
}

/// Old-key to new-key table produced by [`LabelDictionary::merge`].
///
/// Only keys that actually changed are present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyRemap {
    map: BTreeMap<i32, i32>,
}

impl KeyRemap {
    /// Remapped key, or `key` itself when it was not remapped.
    #[inline]
    pub fn apply(&self, key: i32) -> i32 {
        self.map.get(&key).copied().unwrap_or(key)
    }

    pub fn get(&self, key: i32) -> Option<i32> {
        self.map.get(&key).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.map.iter().map(|(&from, &to)| (from, to))
    }

    fn insert(&mut self, from: i32, to: i32) {
        if from != to {
            self.map.insert(from, to);
        }
    }
}

/// Later entries replace earlier ones for the same key.
impl Extend<(i32, i32)> for KeyRemap {
    fn extend<T: IntoIterator<Item = (i32, i32)>>(&mut self, iter: T) {
        for (from, to) in iter {
            self.insert(from, to);
        }
    }
}

impl FromIterator<(i32, i32)> for KeyRemap {
    fn from_iter<T: IntoIterator<Item = (i32, i32)>>(iter: T) -> Self {
        let mut remap = Self::default();
        remap.extend(iter);
        remap
    }
}

impl Default for LabelDictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl LabelDictionary {
    /// Dictionary holding only the unassigned entry at key 0.
    pub fn new() -> Self {
        Self::with_unassigned(0, Label::new(UNASSIGNED_LABEL_NAME, [1.0, 1.0, 1.0, 0.0]))
    }

    pub fn with_unassigned(key: i32, label: Label) -> Self {
        let mut labels = BTreeMap::new();
        labels.insert(key, label);
        Self {
            labels,
            unassigned_key: key,
        }
    }

    pub fn unassigned_key(&self) -> i32 {
        self.unassigned_key
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Always false; the unassigned entry is never removed.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn contains_key(&self, key: i32) -> bool {
        self.labels.contains_key(&key)
    }

    pub fn label(&self, key: i32) -> Option<&Label> {
        self.labels.get(&key)
    }

    /// Lowest key whose label has this name.
    pub fn key_for_name(&self, name: &str) -> Option<i32> {
        self.labels
            .iter()
            .find(|(_, label)| label.name == name)
            .map(|(&key, _)| key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, &Label)> + '_ {
        self.labels.iter().map(|(&key, label)| (key, label))
    }

    pub fn keys(&self) -> impl Iterator<Item = i32> + '_ {
        self.labels.keys().copied()
    }

    pub fn max_key(&self) -> i32 {
        self.labels
            .keys()
            .next_back()
            .copied()
            .unwrap_or(self.unassigned_key)
    }

    /// Sets the label at `key`, returning the label it replaced.
    pub fn insert(&mut self, key: i32, label: Label) -> Option<Label> {
        self.labels.insert(key, label)
    }

    /// Removes a label; the unassigned entry stays.
    pub fn remove(&mut self, key: i32) -> Option<Label> {
        if key == self.unassigned_key {
            return None;
        }
        self.labels.remove(&key)
    }

    /// Adds a label by name. An existing label of that name gets the new color
    /// and keeps its key; otherwise the label goes to a fresh key.
    pub fn add_label(&mut self, name: &str, rgba: [f32; 4]) -> i32 {
        if let Some(key) = self.key_for_name(name) {
            if let Some(label) = self.labels.get_mut(&key) {
                label.rgba = rgba;
            }
            return key;
        }
        let key = self.generate_unused_key(self.max_key().max(0).checked_add(1));
        self.labels.insert(key, Label::new(name, rgba));
        key
    }

    /// Merges `other` into this dictionary and returns how `other`'s keys map
    /// onto the merged table.
    ///
    /// Keys of `self` keep their labels. A key of `other` that is free here is
    /// taken as-is; one holding an identical label is shared; one holding a
    /// different label is moved to an existing identical label if there is one,
    /// otherwise to a new key above every key of both tables. The unassigned
    /// entry of `other` always maps to the unassigned entry of `self`.
    pub fn merge(&mut self, other: &LabelDictionary) -> KeyRemap {
        let mut remap = KeyRemap::default();
        let mut next_key = self.max_key().max(other.max_key()).checked_add(1);

        for (&key, label) in &other.labels {
            if key == other.unassigned_key {
                remap.insert(key, self.unassigned_key);
                continue;
            }
            match self.labels.get(&key) {
                None => {
                    self.labels.insert(key, label.clone());
                }
                Some(existing) if existing == label => {}
                Some(_) => {
                    let new_key = match self.key_for_label(label) {
                        Some(found) => found,
                        None => {
                            let allocated = self.generate_unused_key(next_key);
                            next_key = allocated.checked_add(1);
                            self.labels.insert(allocated, label.clone());
                            allocated
                        }
                    };
                    remap.insert(key, new_key);
                }
            }
        }

        if !remap.is_empty() {
            debug!(remapped = remap.len(), "label table merge reassigned keys");
        }
        remap
    }

    fn key_for_label(&self, label: &Label) -> Option<i32> {
        self.labels
            .iter()
            .find(|(_, existing)| *existing == label)
            .map(|(&key, _)| key)
    }

    fn generate_unused_key(&self, candidate: Option<i32>) -> i32 {
        match candidate {
            Some(key) if !self.labels.contains_key(&key) => key,
            // Key space above the maximum is exhausted; take the lowest gap.
            _ => (0..=i32::MAX)
                .chain((i32::MIN..0).rev())
                .find(|key| !self.labels.contains_key(key))
                .unwrap_or(self.unassigned_key),
        }
    }
}
