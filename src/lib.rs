mod border;
mod error;
mod heights;
mod skiplist;
mod sorted_set;

pub use crate::border::ScoreBorder;
pub use crate::error::{Error, Result};
pub use crate::heights::Heights;
pub use crate::skiplist::{Element, Iter, Node, Range, Skiplist, Stats, MAX_LEVEL, P};
pub use crate::sorted_set::SortedSet;

#[cfg(test)]
mod sorted_set_test;
