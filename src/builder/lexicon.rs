//! Interning of small integer sets.
//!
//! Every output edge carries the set of input edges that snapped to it, and
//! every input edge carries a set of labels. Most of these sets are empty or
//! have one element, so singletons are encoded directly in the id and only
//! larger sets are stored.

use rustc_hash::FxHashMap;

const NO_IDS: &[u32] = &[];

/// Handle for an interned set.
///
/// Non-negative values are singletons `{value}`, `i32::MIN` is the empty set,
/// and other negative values index stored sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IdSetId(i32);

impl IdSetId {
    pub const EMPTY: IdSetId = IdSetId(i32::MIN);

    #[inline]
    pub fn singleton(id: u32) -> Self {
        Self(id as i32)
    }
}

/// A borrowed view of an interned set, in increasing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdSet<'a> {
    Empty,
    Single(u32),
    Many(&'a [u32]),
}

impl<'a> IdSet<'a> {
    pub fn len(&self) -> usize {
        match self {
            IdSet::Empty => 0,
            IdSet::Single(_) => 1,
            IdSet::Many(ids) => ids.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The smallest element.
    pub fn first(&self) -> Option<u32> {
        match self {
            IdSet::Empty => None,
            IdSet::Single(id) => Some(*id),
            IdSet::Many(ids) => ids.first().copied(),
        }
    }

    pub fn iter(&self) -> IdSetIter<'a> {
        match *self {
            IdSet::Empty => IdSetIter {
                single: None,
                rest: NO_IDS.iter(),
            },
            IdSet::Single(id) => IdSetIter {
                single: Some(id),
                rest: NO_IDS.iter(),
            },
            IdSet::Many(ids) => IdSetIter {
                single: None,
                rest: ids.iter(),
            },
        }
    }

    pub fn to_vec(&self) -> Vec<u32> {
        self.iter().collect()
    }
}

impl<'a> IntoIterator for IdSet<'a> {
    type Item = u32;
    type IntoIter = IdSetIter<'a>;

    fn into_iter(self) -> IdSetIter<'a> {
        self.iter()
    }
}

#[derive(Debug, Clone)]
pub struct IdSetIter<'a> {
    single: Option<u32>,
    rest: std::slice::Iter<'a, u32>,
}

impl Iterator for IdSetIter<'_> {
    type Item = u32;

    #[inline]
    fn next(&mut self) -> Option<u32> {
        self.single.take().or_else(|| self.rest.next().copied())
    }
}

/// Interns sets of non-negative integers (at most `i32::MAX`).
#[derive(Debug, Clone)]
pub struct IdSetLexicon {
    values: Vec<u32>,
    begins: Vec<u32>,
    index: FxHashMap<Box<[u32]>, u32>,
    tmp: Vec<u32>,
}

impl Default for IdSetLexicon {
    fn default() -> Self {
        Self::new()
    }
}

impl IdSetLexicon {
    pub fn new() -> Self {
        Self {
            values: Vec::new(),
            begins: vec![0],
            index: FxHashMap::default(),
            tmp: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.begins.truncate(1);
        self.index.clear();
    }

    /// Intern the set of the given ids (duplicates are removed).
    pub fn add(&mut self, ids: impl IntoIterator<Item = u32>) -> IdSetId {
        let mut tmp = std::mem::take(&mut self.tmp);
        tmp.clear();
        tmp.extend(ids);
        tmp.sort_unstable();
        tmp.dedup();
        let id = match tmp.len() {
            0 => IdSetId::EMPTY,
            1 => IdSetId::singleton(tmp[0]),
            _ => {
                let next = (self.begins.len() - 1) as u32;
                let seq = match self.index.get(tmp.as_slice()) {
                    Some(&seq) => seq,
                    None => {
                        self.values.extend_from_slice(&tmp);
                        self.begins.push(self.values.len() as u32);
                        self.index.insert(tmp.clone().into_boxed_slice(), next);
                        next
                    }
                };
                IdSetId(!(seq as i32))
            }
        };
        self.tmp = tmp;
        id
    }

    pub fn id_set(&self, id: IdSetId) -> IdSet<'_> {
        if id.0 >= 0 {
            return IdSet::Single(id.0 as u32);
        }
        if id == IdSetId::EMPTY {
            return IdSet::Empty;
        }
        let seq = (!id.0) as usize;
        let (lo, hi) = (self.begins[seq] as usize, self.begins[seq + 1] as usize);
        IdSet::Many(&self.values[lo..hi])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singletons_and_empty_are_not_stored() {
        let mut lex = IdSetLexicon::new();
        assert_eq!(lex.add([]), IdSetId::EMPTY);
        assert_eq!(lex.add([7, 7]), IdSetId::singleton(7));
        assert_eq!(lex.id_set(IdSetId::singleton(7)).to_vec(), vec![7]);
        assert!(lex.id_set(IdSetId::EMPTY).is_empty());
        assert!(lex.values.is_empty());
    }

    #[test]
    fn test_sets_are_interned_in_sorted_order() {
        let mut lex = IdSetLexicon::new();
        let a = lex.add([5, 1, 3]);
        let b = lex.add([3, 5, 1, 1]);
        let c = lex.add([1, 2]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(lex.id_set(a).to_vec(), vec![1, 3, 5]);
        assert_eq!(lex.id_set(c).first(), Some(1));
        assert_eq!(lex.id_set(c).len(), 2);
    }
}
