//! Observable ordered collection.
//!
//! The collection is the subject and views subscribe to it. `reset` replaces
//! the contents wholesale and notifies every reset listener synchronously, in
//! subscription order, before returning.

/// Handle returned by [`Collection::on_reset`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type ResetListener<T> = Box<dyn FnMut(&[T]) + Send>;

pub struct Collection<T> {
    items: Vec<T>,
    listeners: Vec<(ListenerId, ResetListener<T>)>,
    next_listener: u64,
}

impl<T> Collection<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    /// Current contents in order
    pub fn data(&self) -> &[T] {
        &self.items
    }

    /// Replaces all items and notifies reset listeners
    pub fn reset(&mut self, items: Vec<T>) {
        self.items = items;
        log::debug!(
            "collection reset to {} item(s), notifying {} listener(s)",
            self.items.len(),
            self.listeners.len()
        );
        for (_, listener) in self.listeners.iter_mut() {
            listener(&self.items);
        }
    }

    /// Subscribes to reset notifications
    pub fn on_reset<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&[T]) + Send + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener; returns whether it was subscribed
    pub fn off(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("items", &self.items)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
