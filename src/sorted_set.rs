use std::collections::HashMap;

use crate::border::ScoreBorder;
use crate::error::{Error, Result};
use crate::skiplist::{Element, Node, Skiplist, Stats};

/// SortedSet pairs a [`Skiplist`] with a member to score table, giving
/// O(1) score lookup by member and O(log n) ordered access. Each member
/// appears exactly once; changing its score re-positions its entry.
///
/// Ranks accepted and returned here are 0-based, as seen by clients of
/// a sorted-set store.
#[derive(Clone)]
pub struct SortedSet {
    name: String,
    dict: HashMap<String, f64>,
    skiplist: Skiplist,
}

/// Different ways to construct a new SortedSet instance.
impl SortedSet {
    /// Create an empty instance of SortedSet, identified by `name`.
    /// Applications can choose unique names.
    pub fn new<S>(name: S) -> SortedSet
    where
        S: AsRef<str>,
    {
        SortedSet {
            name: name.as_ref().to_string(),
            dict: Default::default(),
            skiplist: Skiplist::new(),
        }
    }

    /// Same as new(), but node heights follow a deterministic sequence
    /// derived from `seed`.
    pub fn with_seed<S>(name: S, seed: u64) -> SortedSet
    where
        S: AsRef<str>,
    {
        SortedSet {
            name: name.as_ref().to_string(),
            dict: Default::default(),
            skiplist: Skiplist::with_seed(seed),
        }
    }

    /// Create a new instance of SortedSet and load it with (member, score)
    /// entries from `iter`. Later entries for the same member override
    /// earlier ones.
    pub fn load_from<S, I>(name: S, iter: I) -> Result<SortedSet>
    where
        S: AsRef<str>,
        I: Iterator<Item = (String, f64)>,
    {
        let mut zset = SortedSet::new(name);
        for (member, score) in iter {
            zset.add(member, score)?;
        }
        Ok(zset)
    }
}

/// Maintenance API.
impl SortedSet {
    /// Identify this instance. Applications can choose unique names while
    /// creating SortedSet instances.
    #[inline]
    pub fn id(&self) -> String {
        self.name.clone()
    }

    /// Return number of members in this instance.
    #[inline]
    pub fn len(&self) -> usize {
        self.dict.len()
    }

    /// Check whether this set is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dict.is_empty()
    }

    /// Read-only access to the underlying index.
    #[inline]
    pub fn skiplist(&self) -> &Skiplist {
        &self.skiplist
    }

    /// Validate the underlying index, refer to [`Skiplist::validate`],
    /// and check that the member table agrees with it entry by entry.
    pub fn validate(&self) -> Result<Stats> {
        let stats = self.skiplist.validate()?;
        if self.dict.len() != self.skiplist.len() {
            return Err(Error::LengthMismatch(self.dict.len(), self.skiplist.len()));
        }
        for node in self.skiplist.iter() {
            match self.dict.get(node.member()) {
                Some(&score) if score == node.score() => (),
                _ => return Err(Error::TableMismatch(node.member().to_string())),
            }
        }
        Ok(stats)
    }
}

/// Write operations on SortedSet instance.
impl SortedSet {
    /// Set score for member. Return true if member is new to the set;
    /// an existing member with a different score is moved to its new
    /// position.
    pub fn add<S>(&mut self, member: S, score: f64) -> Result<bool>
    where
        S: Into<String>,
    {
        let member: String = member.into();
        if score.is_nan() {
            return Err(Error::NotANumber(member));
        }

        match self.dict.get(&member).cloned() {
            Some(old) if old == score => Ok(false),
            Some(old) => {
                let found = self.skiplist.remove(&member, old);
                debug_assert!(found, "add(): {:?} missing from index", member);
                self.skiplist.insert(member.clone(), score);
                self.dict.insert(member, score);
                Ok(false)
            }
            None => {
                self.skiplist.insert(member.clone(), score);
                self.dict.insert(member, score);
                Ok(true)
            }
        }
    }

    /// Remove member from this set, return whether it was present.
    pub fn remove(&mut self, member: &str) -> bool {
        match self.dict.remove(member) {
            Some(score) => self.skiplist.remove(member, score),
            None => false,
        }
    }

    /// Remove members with score within `min` and `max`, return the
    /// number of members removed.
    pub fn remove_by_score(&mut self, min: &ScoreBorder, max: &ScoreBorder) -> usize {
        let removed = self.skiplist.remove_range_by_score(min, max, None);
        self.forget(&removed);
        removed.len()
    }

    /// Remove members with 0-based rank in `[start, stop)`, return the
    /// number of members removed.
    pub fn remove_by_rank(&mut self, start: usize, stop: usize) -> usize {
        let (start, stop) = (start.saturating_add(1), stop.saturating_add(1));
        let removed = self.skiplist.remove_range_by_rank(start, stop);
        self.forget(&removed);
        removed.len()
    }

    /// Remove and return up to `count` members with the lowest scores.
    pub fn pop_min(&mut self, count: usize) -> Vec<Element> {
        let (min, max) = (ScoreBorder::NEG_INF, ScoreBorder::POS_INF);
        let removed = self.skiplist.remove_range_by_score(&min, &max, Some(count));
        self.forget(&removed);
        removed
    }

    fn forget(&mut self, removed: &[Element]) {
        for elem in removed.iter() {
            self.dict.remove(&elem.member);
        }
    }
}

/// Read operations on SortedSet instance.
impl SortedSet {
    /// Get member and its score.
    pub fn get(&self, member: &str) -> Option<Element> {
        self.dict.get(member).map(|&score| Element {
            member: member.to_string(),
            score,
        })
    }

    /// Return 0-based rank of member, counting from the highest score
    /// when `desc` is set.
    pub fn get_rank(&self, member: &str, desc: bool) -> Option<usize> {
        let score = *self.dict.get(member)?;
        match self.skiplist.get_rank(member, score) {
            0 => None,
            rank if desc => Some(self.skiplist.len() - rank),
            rank => Some(rank - 1),
        }
    }

    /// Visit members with 0-based rank in `[start, stop)`, in descending
    /// order when `desc` is set, until `consumer` returns false.
    pub fn for_each<F>(&self, start: usize, stop: usize, desc: bool, mut consumer: F) -> Result<()>
    where
        F: FnMut(&Node) -> bool,
    {
        let size = self.skiplist.len();
        if start > stop || stop > size {
            return Err(Error::RankOutOfRange(start, stop, size));
        }
        if start == stop {
            return Ok(());
        }

        let iter = if desc {
            self.skiplist.iter_from_rank(size - start, true)
        } else {
            self.skiplist.iter_from_rank(start + 1, false)
        };
        for node in iter.take(stop - start) {
            if !consumer(node) {
                break;
            }
        }
        Ok(())
    }

    /// Return members with 0-based rank in `[start, stop)`.
    pub fn range(&self, start: usize, stop: usize, desc: bool) -> Result<Vec<Element>> {
        let mut acc = vec![];
        self.for_each(start, stop, desc, |node| {
            acc.push(node.to_element());
            true
        })?;
        Ok(acc)
    }

    /// Count members with score within `min` and `max`.
    pub fn range_count(&self, min: &ScoreBorder, max: &ScoreBorder) -> usize {
        let first = match self.skiplist.get_first_in_range(min, max) {
            Some(node) => self.skiplist.get_rank(node.member(), node.score()),
            None => return 0,
        };
        let last = match self.skiplist.get_last_in_range(min, max) {
            Some(node) => self.skiplist.get_rank(node.member(), node.score()),
            None => return 0,
        };
        last - first + 1
    }

    /// Visit members with score within `min` and `max`, skipping the
    /// first `offset` of them and visiting at most `limit`, until
    /// `consumer` returns false.
    pub fn for_each_by_score<F>(
        &self,
        min: &ScoreBorder,
        max: &ScoreBorder,
        offset: usize,
        limit: Option<usize>,
        desc: bool,
        mut consumer: F,
    ) where
        F: FnMut(&Node) -> bool,
    {
        let iter = self.skiplist.range(*min, *max, desc).skip(offset);
        for node in iter.take(limit.unwrap_or(usize::MAX)) {
            if !consumer(node) {
                break;
            }
        }
    }

    /// Return members with score within `min` and `max`, refer to
    /// [`SortedSet::for_each_by_score`] for `offset` and `limit`.
    pub fn range_by_score(
        &self,
        min: &ScoreBorder,
        max: &ScoreBorder,
        offset: usize,
        limit: Option<usize>,
        desc: bool,
    ) -> Vec<Element> {
        let mut acc = vec![];
        self.for_each_by_score(min, max, offset, limit, desc, |node| {
            acc.push(node.to_element());
            true
        });
        acc
    }
}
