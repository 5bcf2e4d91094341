//! Lazy, composable pipelines over any iterator.
//!
//! A [`Pipeline`] wraps an iterator and adds stream-style stages. Every
//! stage consumes the pipeline and returns a new one; nothing is pulled
//! from the source until a terminal action (`for_each`, `collect`,
//! `count`, ...) drains it.
//!
//! ```
//! use stream_demos::{Pipeline, sample_employees};
//!
//! let names: Vec<String> = Pipeline::new(sample_employees().into_iter())
//!     .filter(|e| e.age() > 35)
//!     .map(|e| e.name().to_string())
//!     .collect();
//!
//! assert_eq!(names, vec!["Tom", "Luo"]);
//! ```

use std::cmp::Ordering;
use std::collections::HashSet;
use std::hash::Hash;
use std::iter::{Filter, FlatMap, Inspect, Map, Skip, Take};

/// A lazily evaluated chain of stages over an iterator.
#[derive(Debug, Clone)]
pub struct Pipeline<I> {
    iter: I,
}

impl<I: Iterator> Pipeline<I> {
    /// Create a new pipeline from an iterator.
    pub fn new(iter: I) -> Self {
        Self { iter }
    }

    /// Keep only elements matching the predicate.
    pub fn filter<P>(self, predicate: P) -> Pipeline<Filter<I, P>>
    where
        P: FnMut(&I::Item) -> bool,
    {
        Pipeline::new(self.iter.filter(predicate))
    }

    /// Keep at most the first `n` elements.
    pub fn limit(self, n: usize) -> Pipeline<Take<I>> {
        Pipeline::new(self.iter.take(n))
    }

    /// Drop the first `n` elements. Skipping past the end yields nothing.
    pub fn skip(self, n: usize) -> Pipeline<Skip<I>> {
        Pipeline::new(self.iter.skip(n))
    }

    /// One page of `page_size` elements, with `page` counted from 1.
    ///
    /// Page 0 is read as page 1.
    pub fn page(self, page: usize, page_size: usize) -> Pipeline<Take<Skip<I>>> {
        let offset = page.saturating_sub(1).saturating_mul(page_size);
        self.skip(offset).limit(page_size)
    }

    /// Drop structural duplicates, keeping the first occurrence.
    pub fn distinct(self) -> Pipeline<Distinct<I>>
    where
        I::Item: Eq + Hash + Clone,
    {
        Pipeline::new(Distinct {
            iter: self.iter,
            seen: HashSet::new(),
        })
    }

    /// Transform each element.
    pub fn map<U, F>(self, transform: F) -> Pipeline<Map<I, F>>
    where
        F: FnMut(I::Item) -> U,
    {
        Pipeline::new(self.iter.map(transform))
    }

    /// Transform each element into a sequence and flatten the results.
    pub fn flat_map<U, F>(self, transform: F) -> Pipeline<FlatMap<I, U, F>>
    where
        U: IntoIterator,
        F: FnMut(I::Item) -> U,
    {
        Pipeline::new(self.iter.flat_map(transform))
    }

    /// Observe each element as it passes, without changing it.
    pub fn peek<F>(self, action: F) -> Pipeline<Inspect<I, F>>
    where
        F: FnMut(&I::Item),
    {
        Pipeline::new(self.iter.inspect(action))
    }

    /// Sort by natural ordering.
    pub fn sorted(self) -> Pipeline<Sorted<I, fn(&I::Item, &I::Item) -> Ordering>>
    where
        I::Item: Ord,
    {
        self.sorted_by(<I::Item as Ord>::cmp as fn(&I::Item, &I::Item) -> Ordering)
    }

    /// Sort with a comparator. The sort is stable.
    ///
    /// Sorting needs the whole input, so the first pull drains upstream.
    pub fn sorted_by<F>(self, compare: F) -> Pipeline<Sorted<I, F>>
    where
        F: FnMut(&I::Item, &I::Item) -> Ordering,
    {
        Pipeline::new(Sorted {
            pending: Some((self.iter, compare)),
            sorted: Vec::new().into_iter(),
        })
    }

    /// Sort by a derived key. The sort is stable.
    pub fn sorted_by_key<K, F>(
        self,
        mut key: F,
    ) -> Pipeline<Sorted<I, impl FnMut(&I::Item, &I::Item) -> Ordering>>
    where
        K: Ord,
        F: FnMut(&I::Item) -> K,
    {
        self.sorted_by(move |a: &I::Item, b: &I::Item| key(a).cmp(&key(b)))
    }

    /// Terminal: run `action` on every element in order.
    pub fn for_each<F>(self, action: F)
    where
        F: FnMut(I::Item),
    {
        self.iter.for_each(action)
    }

    /// Terminal: run a fallible `action` on each element, stopping at the
    /// first error.
    pub fn try_for_each<E, F>(self, mut action: F) -> Result<(), E>
    where
        F: FnMut(I::Item) -> Result<(), E>,
    {
        for item in self.iter {
            action(item)?;
        }
        Ok(())
    }

    /// Terminal: gather every element.
    pub fn collect<B: FromIterator<I::Item>>(self) -> B {
        self.iter.collect()
    }

    /// Terminal: number of elements.
    pub fn count(self) -> usize {
        self.iter.count()
    }

    /// Unwrap the underlying iterator.
    pub fn into_inner(self) -> I {
        self.iter
    }
}

impl<I, U, E> Pipeline<I>
where
    I: Iterator<Item = Result<U, E>>,
{
    /// Terminal: gather `Ok` values, or return the first error.
    ///
    /// Elements after the first error are never pulled.
    pub fn try_collect(self) -> Result<Vec<U>, E> {
        self.iter.collect()
    }
}

impl<I: Iterator> Iterator for Pipeline<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

/// Iterator adapter behind [`Pipeline::distinct`].
pub struct Distinct<I: Iterator> {
    iter: I,
    seen: HashSet<I::Item>,
}

impl<I> Iterator for Distinct<I>
where
    I: Iterator,
    I::Item: Eq + Hash + Clone,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let item = self.iter.next()?;
            if self.seen.insert(item.clone()) {
                return Some(item);
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (_, upper) = self.iter.size_hint();
        (0, upper)
    }
}

/// Iterator adapter behind [`Pipeline::sorted_by`].
///
/// Holds the source and comparator until the first pull, then buffers and
/// sorts everything.
pub struct Sorted<I: Iterator, F> {
    pending: Option<(I, F)>,
    sorted: std::vec::IntoIter<I::Item>,
}

impl<I, F> Iterator for Sorted<I, F>
where
    I: Iterator,
    F: FnMut(&I::Item, &I::Item) -> Ordering,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some((iter, mut compare)) = self.pending.take() {
            let mut buffer: Vec<I::Item> = iter.collect();
            buffer.sort_by(&mut compare);
            self.sorted = buffer.into_iter();
        }
        self.sorted.next()
    }
}
