//! A doubly-linked registry of values, addressed by generational handles.
//!
//! See the [`Registry`] type for details.
use crate::error::RegistryError;
use alloc::vec::Vec;
use core::fmt;

/// A doubly-linked list of values stored in an arena, with a rotating
/// cursor.
///
/// Values are [attached](Registry::attach) to the tail of the list in O(1)
/// and may be [detached](Registry::detach) from any position in O(1). Each
/// attached value is named by a [`Handle`], which stays valid until that
/// value is detached. Handles carry a generation counter, so a handle to a
/// detached value is never confused with a value later attached into the
/// same slot.
///
/// The list links are stored alongside each value in the arena, rather than
/// as raw pointers inside the values, so a `Registry` owns its values and
/// cannot dangle when one is removed. The links are *acyclic*: the tail has
/// no `next` and the head has no `prev`. Callers that want to treat the
/// list as a ring (such as the [`Scheduler`]) wrap around explicitly, using
/// [`Registry::next`] and [`Registry::first`].
///
/// In addition to its head and tail, a `Registry` tracks a *cursor*: a
/// position that rotates through the list for round-robin fairness. The
/// cursor is set to the first value attached to an empty registry, and is
/// repaired when the value it names is detached.
///
/// Iteration ([`Registry::iter`]) visits values in attach order.
///
/// [`Scheduler`]: crate::Scheduler
pub struct Registry<T> {
    slots: Vec<Slot<T>>,
    /// Indices of vacant slots, reused before the arena grows.
    free: Vec<u32>,
    head: Link,
    tail: Link,
    cursor: Link,
    len: usize,
}

/// Names a value attached to a [`Registry`].
///
/// A `Handle` is an arena index paired with the generation of the slot at
/// the time the value was attached.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Handle {
    index: u32,
    generation: u32,
}

/// Iterates over the values in a [`Registry`] by reference, in attach order.
pub struct Iter<'a, T> {
    registry: &'a Registry<T>,
    curr: Link,
    remaining: usize,
}

type Link = Option<u32>;

struct Slot<T> {
    generation: u32,
    node: Option<Node<T>>,
}

struct Node<T> {
    value: T,
    links: Links,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
struct Links {
    next: Link,
    prev: Link,
}

#[cfg(test)]
mod tests;

// === impl Registry ===

impl<T> Registry<T> {
    /// Returns a new empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            cursor: None,
            len: 0,
        }
    }

    /// Returns a new empty registry with space for at least `capacity`
    /// values before reallocating.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            ..Self::new()
        }
    }

    /// Returns the number of values attached to this registry.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if this registry has no attached values.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        if self.head.is_none() {
            debug_assert!(
                self.tail.is_none(),
                "inconsistent state: a registry had a tail but no head!"
            );
            debug_assert_eq!(self.len, 0, "inconsistent state: no head but len > 0");
            return true;
        }

        false
    }

    /// Attaches `value` to the tail of the registry, returning a [`Handle`]
    /// naming it.
    ///
    /// If the registry was empty, the cursor is set to the new value. Slots
    /// freed by [`Registry::detach`] are reused before new ones are allocated.
    ///
    /// # Panics
    ///
    /// If every slot is occupied and the registry already has `u32::MAX`
    /// slots, since a [`Handle`] index is 32 bits wide.
    pub fn attach(&mut self, value: T) -> Handle {
        let links = Links {
            next: None,
            prev: self.tail,
        };
        let node = Node { value, links };

        let index = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                debug_assert!(slot.node.is_none(), "free slot {index} was occupied!");
                slot.node = Some(node);
                index
            }
            None => {
                let index = u32::try_from(self.slots.len())
                    .expect("a registry cannot hold more than u32::MAX values");
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                index
            }
        };

        match self.tail {
            Some(tail) => self.links_mut(tail).next = Some(index),
            None => {
                self.head = Some(index);
                self.cursor = Some(index);
            }
        }
        self.tail = Some(index);
        self.len += 1;

        let handle = self.handle(index);
        tracing::trace!(?handle, len = self.len, "registry.attach");
        handle
    }

    /// Detaches the value named by `handle` from the registry, returning it.
    ///
    /// If the cursor named the detached value, it is moved to the detached
    /// value's predecessor in the ring (the previous value, or the new tail
    /// if the head was detached), so that advancing the cursor next visits
    /// the value that followed the detached one. Detaching the only value
    /// clears the cursor.
    ///
    /// # Returns
    ///
    /// - [`Ok`]`(T)` with the detached value.
    /// - [`Err`]`(`[`RegistryError::Empty`]`)` if the registry is empty.
    /// - [`Err`]`(`[`RegistryError::NotAttached`]`)` if `handle` does not
    ///   name a value currently attached to this registry.
    pub fn detach(&mut self, handle: Handle) -> Result<T, RegistryError> {
        if self.is_empty() {
            return Err(RegistryError::Empty);
        }

        let index = handle.index;
        let slot = self
            .slots
            .get_mut(index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .ok_or(RegistryError::NotAttached(handle))?;
        let Node { value, links } = slot.node.take().ok_or(RegistryError::NotAttached(handle))?;
        slot.generation = slot.generation.wrapping_add(1);

        match (links.prev, links.next) {
            // sole value
            (None, None) => {
                self.head = None;
                self.tail = None;
            }
            // head
            (None, Some(next)) => {
                self.links_mut(next).prev = None;
                self.head = Some(next);
            }
            // tail
            (Some(prev), None) => {
                self.links_mut(prev).next = None;
                self.tail = Some(prev);
            }
            // interior
            (Some(prev), Some(next)) => {
                self.links_mut(prev).next = Some(next);
                self.links_mut(next).prev = Some(prev);
            }
        }

        if self.cursor == Some(index) {
            self.cursor = links.prev.or(self.tail);
        }

        self.free.push(index);
        self.len -= 1;
        tracing::trace!(?handle, len = self.len, cursor = ?self.cursor, "registry.detach");
        Ok(value)
    }

    /// Returns `true` if `handle` names a value attached to this registry.
    #[must_use]
    pub fn contains(&self, handle: Handle) -> bool {
        self.node(handle).is_some()
    }

    /// Borrows the value named by `handle`, if it is attached.
    #[must_use]
    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.node(handle).map(|node| &node.value)
    }

    /// Mutably borrows the value named by `handle`, if it is attached.
    #[must_use]
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)?
            .node
            .as_mut()
            .map(|node| &mut node.value)
    }

    /// Returns the handle of the first (oldest) attached value.
    #[must_use]
    pub fn first(&self) -> Option<Handle> {
        self.head.map(|index| self.handle(index))
    }

    /// Returns the handle of the last (newest) attached value.
    #[must_use]
    pub fn last(&self) -> Option<Handle> {
        self.tail.map(|index| self.handle(index))
    }

    /// Returns the handle of the value attached after `handle`.
    ///
    /// This does *not* wrap around: the last value has no next value.
    /// Returns [`None`] as well if `handle` is not attached.
    #[must_use]
    pub fn next(&self, handle: Handle) -> Option<Handle> {
        let next = self.node(handle)?.links.next?;
        Some(self.handle(next))
    }

    /// Returns the handle of the value attached before `handle`.
    ///
    /// This does *not* wrap around: the first value has no previous value.
    #[must_use]
    pub fn prev(&self, handle: Handle) -> Option<Handle> {
        let prev = self.node(handle)?.links.prev?;
        Some(self.handle(prev))
    }

    /// Returns the current cursor position.
    ///
    /// The cursor is [`None`] only when the registry is empty.
    #[must_use]
    pub fn cursor(&self) -> Option<Handle> {
        self.cursor.map(|index| self.handle(index))
    }

    /// Moves the cursor to `handle`.
    ///
    /// # Returns
    ///
    /// - [`Ok`]`(())` if the cursor was moved.
    /// - [`Err`]`(`[`RegistryError::NotAttached`]`)` if `handle` is not
    ///   attached, in which case the cursor is left where it was.
    pub fn set_cursor(&mut self, handle: Handle) -> Result<(), RegistryError> {
        if !self.contains(handle) {
            return Err(RegistryError::NotAttached(handle));
        }
        self.cursor = Some(handle.index);
        Ok(())
    }

    /// Returns an iterator over `(handle, &value)` pairs, in attach order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            registry: self,
            curr: self.head,
            remaining: self.len,
        }
    }

    /// Asserts as many of the registry's invariants as possible.
    ///
    /// # Panics
    ///
    /// If any link is inconsistent: a walk forwards from the head does not
    /// reach the tail, a walk backwards from the tail does not reach the
    /// head, either walk visits a different number of values than
    /// [`Registry::len`], or the cursor does not name an attached value.
    #[track_caller]
    pub fn assert_valid(&self) {
        let Some(head) = self.head else {
            assert!(
                self.tail.is_none(),
                "if the registry's head is null, the tail must also be null"
            );
            assert!(
                self.cursor.is_none(),
                "if the registry's head is null, the cursor must also be null"
            );
            assert_eq!(self.len, 0, "an empty registry must have a length of 0");
            return;
        };
        let tail = self
            .tail
            .expect("if the registry has a head, it must also have a tail");

        assert_eq!(
            self.links(head).prev,
            None,
            "head node must not have a prev link"
        );
        assert_eq!(
            self.links(tail).next,
            None,
            "tail node must not have a next link"
        );

        let mut forward = 0;
        let mut curr = Some(head);
        let mut last = head;
        while let Some(index) = curr {
            forward += 1;
            assert!(
                forward <= self.len,
                "forward walk visited more than {} nodes; the links contain a cycle",
                self.len
            );
            let links = self.links(index);
            if let Some(next) = links.next {
                assert_ne!(next, index, "node {index}'s next link cannot be to itself");
                assert_eq!(
                    self.links(next).prev,
                    Some(index),
                    "node {next}'s prev link must point back at node {index}"
                );
            }
            last = index;
            curr = links.next;
        }
        assert_eq!(last, tail, "a forward walk from the head must end at the tail");
        assert_eq!(forward, self.len, "forward walk length must equal len");

        let mut backward = 0;
        let mut curr = Some(tail);
        let mut first = tail;
        while let Some(index) = curr {
            backward += 1;
            assert!(
                backward <= self.len,
                "backward walk visited more than {} nodes; the links contain a cycle",
                self.len
            );
            first = index;
            curr = self.links(index).prev;
        }
        assert_eq!(first, head, "a backward walk from the tail must end at the head");
        assert_eq!(backward, self.len, "backward walk length must equal len");

        let cursor = self
            .cursor
            .expect("a non-empty registry must have a cursor");
        assert!(
            self.slots[cursor as usize].node.is_some(),
            "the cursor must name an attached node"
        );
        assert_eq!(
            self.slots.len() - self.free.len(),
            self.len,
            "every slot must be either occupied or free"
        );
    }

    #[inline]
    fn handle(&self, index: u32) -> Handle {
        Handle {
            index,
            generation: self.slots[index as usize].generation,
        }
    }

    fn node(&self, handle: Handle) -> Option<&Node<T>> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)?
            .node
            .as_ref()
    }

    #[track_caller]
    fn links(&self, index: u32) -> &Links {
        match self.slots[index as usize].node {
            Some(ref node) => &node.links,
            None => panic!("linked to vacant slot {index}"),
        }
    }

    #[track_caller]
    fn links_mut(&mut self, index: u32) -> &mut Links {
        match self.slots[index as usize].node {
            Some(ref mut node) => &mut node.links,
            None => panic!("linked to vacant slot {index}"),
        }
    }
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            slots: _,
            free,
            head,
            tail,
            cursor,
            len,
        } = self;
        f.debug_struct("Registry")
            .field("len", len)
            .field("head", head)
            .field("tail", tail)
            .field("cursor", cursor)
            .field("free", &free.len())
            .field("values", &DebugValues(self))
            .finish()
    }
}

struct DebugValues<'a, T>(&'a Registry<T>);

impl<T: fmt::Debug> fmt::Debug for DebugValues<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}

impl<'a, T> IntoIterator for &'a Registry<T> {
    type Item = (Handle, &'a T);
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T> Extend<T> for Registry<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.attach(value);
        }
    }
}

impl<T> FromIterator<T> for Registry<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut registry = Self::new();
        registry.extend(iter);
        registry
    }
}

// === impl Handle ===

impl Handle {
    /// Returns the arena index this handle refers to.
    #[must_use]
    #[inline]
    pub fn index(self) -> u32 {
        self.index
    }

    /// Returns the generation of the slot when this handle was created.
    #[must_use]
    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

// === impl Iter ===

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (Handle, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.curr?;
        let Some(ref node) = self.registry.slots[index as usize].node else {
            unreachable!("linked to vacant slot {index}")
        };
        self.curr = node.links.next;
        self.remaining -= 1;
        Some((self.registry.handle(index), &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
