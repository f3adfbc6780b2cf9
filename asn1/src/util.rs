use std::{collections::VecDeque, fmt::Display, ops::Deref};

/// Iterator extension trait for peekable iterators
pub trait Peek: Iterator
where
    Self: Sized,
{
    /// Create a peekable version of the iterator
    fn n_peekable(self) -> Peekable<Self>;
}

/// Iterator that can look any number of items ahead
#[derive(Debug, Clone)]
pub struct Peekable<I: Iterator> {
    /// Source iterator
    iter: I,

    /// Cached items peeked but not output
    cache: VecDeque<I::Item>,
}

impl<I: Iterator> Peek for I {
    fn n_peekable(self) -> Peekable<Self> {
        Peekable {
            iter: self,
            cache: VecDeque::new(),
        }
    }
}

impl<I: Iterator> Iterator for Peekable<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        self.cache.pop_front().or_else(|| self.iter.next())
    }
}

impl<I: Iterator> Peekable<I> {
    /// Peek n items ahead of the iterator.  Peek with n == 0 returns the same
    /// item that `iter.next()` would return, but without consuming it.
    pub fn peek(&mut self, n: usize) -> Option<&I::Item> {
        while self.cache.len() <= n {
            self.cache.push_back(self.iter.next()?);
        }

        Some(&self.cache[n])
    }
}

/// Version of std's cow specialised for slices
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CowVec<T: 'static> {
    Borrowed(&'static [T]),
    Owned(Vec<T>),
}

impl<T> From<Vec<T>> for CowVec<T> {
    fn from(value: Vec<T>) -> Self {
        Self::Owned(value)
    }
}

impl<T> From<&'static [T]> for CowVec<T> {
    fn from(value: &'static [T]) -> Self {
        Self::Borrowed(value)
    }
}

impl<const N: usize, T> From<&'static [T; N]> for CowVec<T> {
    fn from(value: &'static [T; N]) -> Self {
        Self::Borrowed(value)
    }
}

impl<T> Deref for CowVec<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        match self {
            CowVec::Borrowed(b) => b,
            CowVec::Owned(o) => o,
        }
    }
}

impl<T: Display> CowVec<T> {
    /// Human readable list of the items, `a`, `a or b`, `a, b or c`
    pub fn describe(&self) -> String {
        match &**self {
            [] => String::new(),
            [one] => one.to_string(),
            [init @ .., last] => {
                let init: Vec<_> = init.iter().map(ToString::to_string).collect();
                format!("{} or {last}", init.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peek_ahead() {
        let mut iter = [1, 2, 3].into_iter().n_peekable();
        assert_eq!(iter.peek(2), Some(&3));
        assert_eq!(iter.peek(3), None);
        assert_eq!(iter.next(), Some(1));
        assert_eq!(iter.peek(0), Some(&2));
    }

    #[test]
    fn describe_lists() {
        assert_eq!(CowVec::from(&["a"]).describe(), "a");
        assert_eq!(CowVec::from(vec!["a", "b", "c"]).describe(), "a, b or c");
    }
}
