use std::mem;

use rand::{rngs::SmallRng, Rng, SeedableRng};

use crate::border::ScoreBorder;
use crate::error::Error;
use crate::heights::Heights;

/// Maximum height of any node, header included.
pub const MAX_LEVEL: usize = 32;

/// Probability that a node reaching level `L` also reaches `L+1`.
pub const P: f64 = 0.25;

// per-level predecessors of a position, `None` being the header.
type Update = [Option<usize>; MAX_LEVEL];

/// Skiplist manage a single instance of in-memory ordered index using a
/// [skip list][skiplist], where every level link also records its span,
/// the number of level-0 hops it jumps over, so that rank queries are
/// answered in O(log n).
///
/// Entries are ordered by score, ties broken by member in byte-wise
/// order. Nodes live in an arena owned by the list; forward and backward
/// links are arena handles.
///
/// [skiplist]: https://en.wikipedia.org/wiki/Skip_list
#[derive(Clone)]
pub struct Skiplist {
    head: [Link; MAX_LEVEL],
    nodes: Vec<Option<Node>>,
    free: Vec<usize>, // vacant slots in `nodes`.
    tail: Option<usize>,
    length: usize, // number of entries in the list.
    level: usize,  // height of the tallest node, at least 1.
    rng: SmallRng,
}

/// Different ways to construct a new Skiplist instance.
impl Skiplist {
    /// Create an empty Skiplist, level generator seeded from OS entropy.
    pub fn new() -> Skiplist {
        Skiplist::with_rng(SmallRng::from_entropy())
    }

    /// Create an empty Skiplist whose node heights are a deterministic
    /// function of `seed`.
    pub fn with_seed(seed: u64) -> Skiplist {
        Skiplist::with_rng(SmallRng::seed_from_u64(seed))
    }

    fn with_rng(rng: SmallRng) -> Skiplist {
        Skiplist {
            head: [Link::default(); MAX_LEVEL],
            nodes: Default::default(),
            free: Default::default(),
            tail: None,
            length: 0,
            level: 1,
            rng,
        }
    }
}

impl Default for Skiplist {
    fn default() -> Skiplist {
        Skiplist::new()
    }
}

/// Maintenance API.
impl Skiplist {
    /// Return number of entries in this instance.
    #[inline]
    pub fn len(&self) -> usize {
        self.length
    }

    /// Check whether this index is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Return the number of levels currently in use.
    #[inline]
    pub fn level(&self) -> usize {
        self.level
    }

    /// Return quickly with basic statisics, heights are only computed
    /// by [`Skiplist::validate`].
    pub fn stats(&self) -> Stats {
        Stats::new(self.length, self.level, mem::size_of::<Node>())
    }

    /// Validate the list with following rules:
    ///
    /// * Entries are in (score, member) order, without duplicates.
    /// * Every span equals the level-0 hop count to its forward node,
    ///   or to the end of the list when there is none.
    /// * Backward links mirror the level-0 chain and tail is its end.
    /// * Length counts the level-0 chain, level is the tallest height.
    ///
    /// Additionally return full statistics on the list. Refer to [`Stats`]
    /// for more information.
    pub fn validate(&self) -> Result<Stats, Error> {
        let mut stats = self.stats();
        let mut heights = Heights::new();

        // position of every reachable node, 1-based, indexed by handle.
        let mut positions: Vec<Option<usize>> = vec![None; self.nodes.len()];
        let (mut prev, mut cursor, mut n) = (None, self.head[0].forward, 0);
        while let Some(id) = cursor {
            let node = match self.nodes.get(id) {
                Some(Some(node)) if positions[id].is_none() => node,
                _ => return Err(Error::DanglingLink(0)),
            };
            n += 1;
            positions[id] = Some(n);
            if node.backward != prev {
                return Err(Error::BackwardMismatch(node.member.clone()));
            }
            if let Some(prev) = prev {
                let prev = self.node(prev);
                if !prev.precedes(node.score, &node.member) {
                    let (a, b) = (prev.member.clone(), node.member.clone());
                    return Err(Error::SortError(a, b));
                }
            }
            heights.sample(node.height());
            prev = cursor;
            cursor = node.levels[0].forward;
        }

        if self.tail != prev {
            return Err(Error::TailMismatch);
        }
        if n != self.length {
            return Err(Error::LengthMismatch(self.length, n));
        }
        let tallest = heights.max().max(1);
        if tallest != self.level {
            return Err(Error::LevelMismatch(self.level, tallest));
        }
        if let Some(i) = (self.level..MAX_LEVEL).find(|&i| self.head[i].forward.is_some()) {
            return Err(Error::DanglingLink(i));
        }

        for i in 0..self.level {
            let (mut x, mut at) = (None, 0);
            loop {
                let link = self.link(x, i);
                let expected = match link.forward {
                    Some(next) => match positions.get(next).cloned().flatten() {
                        Some(pos) if pos > at && self.node(next).height() > i => pos - at,
                        _ => return Err(Error::DanglingLink(i)),
                    },
                    None => self.length - at,
                };
                if link.span != expected {
                    return Err(Error::SpanMismatch {
                        level: i,
                        member: x.map(|id| self.node(id).member.clone()).unwrap_or_default(),
                        expected,
                        found: link.span,
                    });
                }
                match link.forward {
                    Some(next) => {
                        x = Some(next);
                        at += expected;
                    }
                    None => break,
                }
            }
        }

        stats.set_heights(heights);
        Ok(stats)
    }
}

/// Write operations on Skiplist instance.
impl Skiplist {
    /// Insert a new entry and return its node. Caller must make sure
    /// that the exact (member, score) pair is not already present.
    pub fn insert<S>(&mut self, member: S, score: f64) -> &Node
    where
        S: Into<String>,
    {
        let member: String = member.into();
        let (mut update, mut rank) = self.find_update(score, &member);

        let height = self.random_level();
        if height > self.level {
            for i in self.level..height {
                update[i] = None;
                rank[i] = 0;
                self.head[i].span = self.length;
            }
            self.level = height;
        }

        let id = self.alloc(Node::new(height, score, member));
        for i in 0..height {
            let prev = self.link(update[i], i);
            let hops = rank[0] - rank[i];
            self.node_mut(id).levels[i] = Link {
                forward: prev.forward,
                span: prev.span - hops,
            };
            *self.link_mut(update[i], i) = Link {
                forward: Some(id),
                span: hops + 1,
            };
        }
        for i in height..self.level {
            self.link_mut(update[i], i).span += 1;
        }

        self.node_mut(id).backward = update[0];
        let next = self.node(id).levels[0].forward;
        match next {
            Some(next) => self.node_mut(next).backward = Some(id),
            None => self.tail = Some(id),
        }
        self.length += 1;
        self.node(id)
    }

    /// Remove the entry matching both `member` and `score`. Return
    /// false, leaving the list untouched, when there is no such entry.
    pub fn remove(&mut self, member: &str, score: f64) -> bool {
        let (update, _) = self.find_update(score, member);
        match self.link(update[0], 0).forward {
            Some(id) if self.node(id).matches(score, member) => {
                self.unlink(id, &update);
                self.release(id);
                true
            }
            _ => false,
        }
    }

    /// Remove entries whose score lies within `min` and `max`, in
    /// ascending order, stopping after `limit` removals if specified.
    pub fn remove_range_by_score(
        &mut self,
        min: &ScoreBorder,
        max: &ScoreBorder,
        limit: Option<usize>,
    ) -> Vec<Element> {
        let mut removed = vec![];
        if ScoreBorder::is_empty_range(min, max) {
            return removed;
        }

        let mut update: Update = [None; MAX_LEVEL];
        let mut x = None;
        for i in (0..self.level).rev() {
            while let Some(next) = self.link(x, i).forward {
                if min.is_below(self.node(next).score) {
                    break;
                }
                x = Some(next);
            }
            update[i] = x;
        }

        let mut cursor = self.link(x, 0).forward;
        while let Some(id) = cursor {
            if limit.map_or(false, |limit| removed.len() >= limit) {
                break;
            }
            let node = self.node(id);
            if !max.is_above(node.score) {
                break;
            }
            cursor = node.levels[0].forward;
            self.unlink(id, &update);
            removed.push(self.release(id).into_element());
        }
        removed
    }

    /// Remove entries with 1-based rank in `[start, stop)`.
    pub fn remove_range_by_rank(&mut self, start: usize, stop: usize) -> Vec<Element> {
        let mut removed = vec![];
        if start == 0 || start >= stop {
            return removed;
        }

        let mut update: Update = [None; MAX_LEVEL];
        let (mut x, mut traversed) = (None, 0);
        for i in (0..self.level).rev() {
            loop {
                let link = self.link(x, i);
                match link.forward {
                    Some(next) if traversed + link.span < start => {
                        traversed += link.span;
                        x = Some(next);
                    }
                    _ => break,
                }
            }
            update[i] = x;
        }

        let (mut cursor, mut rank) = (self.link(x, 0).forward, traversed + 1);
        while let Some(id) = cursor {
            if rank >= stop {
                break;
            }
            cursor = self.node(id).levels[0].forward;
            self.unlink(id, &update);
            removed.push(self.release(id).into_element());
            rank += 1;
        }
        removed
    }
}

/// Read operations on Skiplist instance.
impl Skiplist {
    /// Return the first entry in order.
    pub fn first(&self) -> Option<&Node> {
        self.head[0].forward.map(|id| self.node(id))
    }

    /// Return the last entry in order.
    pub fn last(&self) -> Option<&Node> {
        self.tail.map(|id| self.node(id))
    }

    /// Return the 1-based rank of the entry matching both `member` and
    /// `score`, or 0 if there is no such entry.
    pub fn get_rank(&self, member: &str, score: f64) -> usize {
        let (update, rank) = self.find_update(score, member);
        match self.link(update[0], 0).forward {
            Some(id) if self.node(id).matches(score, member) => rank[0] + 1,
            _ => 0,
        }
    }

    /// Return the entry at 1-based `rank`. Ranks 0 and beyond `len()`
    /// have no entry.
    pub fn get_by_rank(&self, rank: usize) -> Option<&Node> {
        self.find_by_rank(rank).map(|id| self.node(id))
    }

    /// Check whether any entry has its score within `min` and `max`.
    pub fn has_in_range(&self, min: &ScoreBorder, max: &ScoreBorder) -> bool {
        if ScoreBorder::is_empty_range(min, max) {
            return false;
        }
        match self.find_last_within(max) {
            Some(id) => min.is_below(self.node(id).score),
            None => false,
        }
    }

    /// Return the lowest ordered entry with score within `min` and `max`.
    pub fn get_first_in_range(&self, min: &ScoreBorder, max: &ScoreBorder) -> Option<&Node> {
        self.first_in_range(min, max).map(|id| self.node(id))
    }

    /// Return the highest ordered entry with score within `min` and `max`.
    pub fn get_last_in_range(&self, min: &ScoreBorder, max: &ScoreBorder) -> Option<&Node> {
        self.last_in_range(min, max).map(|id| self.node(id))
    }

    /// Return an iterator over all entries in ascending order.
    pub fn iter(&self) -> Iter<'_> {
        Iter::new(self, self.head[0].forward, false)
    }

    /// Return an iterator over all entries in descending order.
    pub fn iter_rev(&self) -> Iter<'_> {
        Iter::new(self, self.tail, true)
    }

    /// Return an iterator starting at 1-based `rank`, walking forward or
    /// backward from there. Empty if there is no entry at `rank`.
    pub fn iter_from_rank(&self, rank: usize, reverse: bool) -> Iter<'_> {
        Iter::new(self, self.find_by_rank(rank), reverse)
    }

    /// Range over entries with score within `min` and `max`, ascending,
    /// or descending when `reverse` is set.
    pub fn range(&self, min: ScoreBorder, max: ScoreBorder, reverse: bool) -> Range<'_> {
        let start = if reverse {
            self.last_in_range(&min, &max)
        } else {
            self.first_in_range(&min, &max)
        };
        Range {
            iter: Iter::new(self, start, reverse),
            min,
            max,
        }
    }
}

impl Skiplist {
    pub(crate) fn random_level(&mut self) -> usize {
        let mut level = 1;
        while level < MAX_LEVEL && self.rng.gen::<f64>() < P {
            level += 1;
        }
        level
    }

    // Descend from the header, recording per level the last node that
    // sorts strictly before (score, member) and its 1-based position.
    fn find_update(&self, score: f64, member: &str) -> (Update, [usize; MAX_LEVEL]) {
        let mut update: Update = [None; MAX_LEVEL];
        let mut rank = [0_usize; MAX_LEVEL];
        let (mut x, mut traversed) = (None, 0);
        for i in (0..self.level).rev() {
            loop {
                let link = self.link(x, i);
                match link.forward {
                    Some(next) if self.node(next).precedes(score, member) => {
                        traversed += link.span;
                        x = Some(next);
                    }
                    _ => break,
                }
            }
            update[i] = x;
            rank[i] = traversed;
        }
        (update, rank)
    }

    fn find_by_rank(&self, rank: usize) -> Option<usize> {
        if rank == 0 || rank > self.length {
            return None;
        }
        let (mut x, mut traversed) = (None, 0);
        for i in (0..self.level).rev() {
            loop {
                let link = self.link(x, i);
                match link.forward {
                    Some(next) if traversed + link.span <= rank => {
                        traversed += link.span;
                        x = Some(next);
                    }
                    _ => break,
                }
            }
            if traversed == rank {
                return x;
            }
        }
        None
    }

    // last node whose score satisfies `max`, whatever its lower side.
    fn find_last_within(&self, max: &ScoreBorder) -> Option<usize> {
        let mut x = None;
        for i in (0..self.level).rev() {
            while let Some(next) = self.link(x, i).forward {
                if !max.is_above(self.node(next).score) {
                    break;
                }
                x = Some(next);
            }
        }
        x
    }

    fn first_in_range(&self, min: &ScoreBorder, max: &ScoreBorder) -> Option<usize> {
        if ScoreBorder::is_empty_range(min, max) {
            return None;
        }
        let mut x = None;
        for i in (0..self.level).rev() {
            while let Some(next) = self.link(x, i).forward {
                if min.is_below(self.node(next).score) {
                    break;
                }
                x = Some(next);
            }
        }
        let id = self.link(x, 0).forward?;
        if max.is_above(self.node(id).score) {
            Some(id)
        } else {
            None
        }
    }

    fn last_in_range(&self, min: &ScoreBorder, max: &ScoreBorder) -> Option<usize> {
        if ScoreBorder::is_empty_range(min, max) {
            return None;
        }
        let id = self.find_last_within(max)?;
        if min.is_below(self.node(id).score) {
            Some(id)
        } else {
            None
        }
    }

    // Detach node `id` from every level, `update` holding its
    // predecessors as computed by a descending walk.
    fn unlink(&mut self, id: usize, update: &Update) {
        for i in 0..self.level {
            let prev = self.link(update[i], i);
            if prev.forward == Some(id) {
                let removed = self.node(id).levels[i];
                *self.link_mut(update[i], i) = Link {
                    forward: removed.forward,
                    span: prev.span + removed.span - 1,
                };
            } else {
                self.link_mut(update[i], i).span -= 1;
            }
        }

        let (backward, next) = {
            let node = self.node(id);
            (node.backward, node.levels[0].forward)
        };
        match next {
            Some(next) => self.node_mut(next).backward = backward,
            None => self.tail = backward,
        }

        while self.level > 1 && self.head[self.level - 1].forward.is_none() {
            self.level -= 1;
        }
        self.length -= 1;
    }

    fn alloc(&mut self, node: Node) -> usize {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id] = Some(node);
                id
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        }
    }

    fn release(&mut self, id: usize) -> Node {
        match self.nodes.get_mut(id).and_then(Option::take) {
            Some(node) => {
                self.free.push(id);
                node
            }
            None => panic!("release(): dangling handle {}, call the programmer", id),
        }
    }

    #[inline]
    fn node(&self, id: usize) -> &Node {
        match self.nodes.get(id) {
            Some(Some(node)) => node,
            _ => panic!("node(): dangling handle {}, call the programmer", id),
        }
    }

    #[inline]
    fn node_mut(&mut self, id: usize) -> &mut Node {
        match self.nodes.get_mut(id) {
            Some(Some(node)) => node,
            _ => panic!("node_mut(): dangling handle {}, call the programmer", id),
        }
    }

    // `None` refers to the header.
    #[inline]
    fn link(&self, at: Option<usize>, level: usize) -> Link {
        match at {
            None => self.head[level],
            Some(id) => self.node(id).levels[level],
        }
    }

    #[inline]
    fn link_mut(&mut self, at: Option<usize>, level: usize) -> &mut Link {
        match at {
            None => &mut self.head[level],
            Some(id) => &mut self.node_mut(id).levels[level],
        }
    }
}

/// Iterator over skip list entries, following level-0 forward links or
/// backward links.
pub struct Iter<'a> {
    list: &'a Skiplist,
    cursor: Option<usize>,
    reverse: bool,
}

impl<'a> Iter<'a> {
    fn new(list: &'a Skiplist, cursor: Option<usize>, reverse: bool) -> Iter<'a> {
        Iter {
            list,
            cursor,
            reverse,
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.list.node(self.cursor?);
        self.cursor = if self.reverse {
            node.backward
        } else {
            node.levels[0].forward
        };
        Some(node)
    }
}

/// Iterator over entries within a pair of score borders.
pub struct Range<'a> {
    iter: Iter<'a>,
    min: ScoreBorder,
    max: ScoreBorder,
}

impl<'a> Iterator for Range<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.iter.next()?;
        let ok = if self.iter.reverse {
            self.min.is_below(node.score)
        } else {
            self.max.is_above(node.score)
        };
        if ok {
            Some(node)
        } else {
            self.iter.cursor = None;
            None
        }
    }
}

/// Member and score of an entry, detached from the index.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    pub member: String,
    pub score: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Link {
    forward: Option<usize>,
    span: usize, // level-0 hops to forward, or to the end.
}

/// Node corresponds to a single entry in Skiplist instance.
#[derive(Clone, Debug)]
pub struct Node {
    member: String,
    score: f64,
    levels: Vec<Link>,
    backward: Option<usize>,
}

impl Node {
    pub(crate) fn new(height: usize, score: f64, member: String) -> Node {
        Node {
            member,
            score,
            levels: vec![Link::default(); height],
            backward: None,
        }
    }

    #[inline]
    pub fn member(&self) -> &str {
        &self.member
    }

    #[inline]
    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn to_element(&self) -> Element {
        Element {
            member: self.member.clone(),
            score: self.score,
        }
    }

    #[inline]
    pub(crate) fn height(&self) -> usize {
        self.levels.len()
    }

    fn into_element(self) -> Element {
        Element {
            member: self.member,
            score: self.score,
        }
    }

    // strictly before (score, member) in index order.
    #[inline]
    fn precedes(&self, score: f64, member: &str) -> bool {
        self.score < score || (self.score == score && self.member.as_str() < member)
    }

    #[inline]
    fn matches(&self, score: f64, member: &str) -> bool {
        self.score == score && self.member == member
    }
}

/// Statistics on [`Skiplist`]. Serves two purpose:
///
/// * To get partial but quick statistics via [`Skiplist::stats`] method.
/// * To get full statisics via [`Skiplist::validate`] method.
#[derive(Default, Debug)]
pub struct Stats {
    entries: usize, // number of entries in the list.
    level: usize,
    node_size: usize,
    heights: Option<Heights>,
}

impl Stats {
    fn new(entries: usize, level: usize, node_size: usize) -> Stats {
        Stats {
            entries,
            level,
            node_size,
            heights: Default::default(),
        }
    }

    #[inline]
    fn set_heights(&mut self, heights: Heights) {
        self.heights = Some(heights)
    }

    /// Return number entries in [`Skiplist`] instance.
    #[inline]
    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Return number of levels in use.
    #[inline]
    pub fn level(&self) -> usize {
        self.level
    }

    /// Return node-size, not counting the member's heap allocation and
    /// the per-level links, which vary from node to node.
    #[inline]
    pub fn node_size(&self) -> usize {
        self.node_size
    }

    /// Return [`Heights`] statistics, available only from validate()
    /// on a non-empty list.
    pub fn heights(&self) -> Option<Heights> {
        match &self.heights {
            Some(heights) if heights.samples() > 0 => Some(heights.clone()),
            _ => None,
        }
    }
}
