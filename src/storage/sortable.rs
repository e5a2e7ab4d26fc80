use crate::errors::Error;
use std::cmp::Ordering;

/// Minimal indexed access a generic in-place sort needs.
///
/// `set` may only write back items obtained from `get` on the same collection.
pub trait Sortable {
    type Item: Clone;

    fn len(&self) -> usize;

    fn get(&self, index: usize) -> Result<Self::Item, Error>;

    fn set(&mut self, item: Self::Item, index: usize) -> Result<(), Error>;
}

/// Stable insertion sort over any [`Sortable`].
///
/// The comparator receives the collection so it can look items up.
pub fn insertion_sort<S, F>(items: &mut S, mut cmp: F) -> Result<(), Error>
where
    S: Sortable,
    F: FnMut(&S, &S::Item, &S::Item) -> Ordering,
{
    for i in 1..items.len() {
        let key = items.get(i)?;
        let mut j = i;
        while j > 0 {
            let prev = items.get(j - 1)?;
            if cmp(items, &prev, &key) != Ordering::Greater {
                break;
            }
            items.set(prev, j)?;
            j -= 1;
        }
        items.set(key, j)?;
    }
    Ok(())
}
