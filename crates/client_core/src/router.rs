//! Selection routing, decoupled from any platform navigation primitive.

use tokio::sync::broadcast;

const CHANGE_EVENT_CAPACITY: usize = 64;

/// Owns the navigable fragment and an in-memory back/forward history. The
/// fragment is the selected list id as a string; empty means no selection.
/// Every position change is announced on a broadcast channel.
#[derive(Debug)]
pub struct Router {
    history: Vec<String>,
    position: usize,
    changes: broadcast::Sender<String>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_EVENT_CAPACITY);
        Self {
            history: vec![String::new()],
            position: 0,
            changes,
        }
    }

    /// Fragment currently in view, verbatim.
    pub fn current(&self) -> &str {
        &self.history[self.position]
    }

    pub fn selection(&self) -> Option<&str> {
        let current = self.current();
        (!current.is_empty()).then_some(current)
    }

    /// Moves to `fragment`, dropping any forward history. Navigating to the
    /// fragment already in view is a no-op and fires no change event,
    /// matching hashchange semantics.
    pub fn navigate(&mut self, fragment: &str) -> bool {
        if fragment == self.current() {
            return false;
        }
        self.history.truncate(self.position + 1);
        self.history.push(fragment.to_string());
        self.position += 1;
        self.announce();
        true
    }

    pub fn back(&mut self) -> bool {
        if self.position == 0 {
            return false;
        }
        self.position -= 1;
        self.announce();
        true
    }

    pub fn forward(&mut self) -> bool {
        if self.position + 1 >= self.history.len() {
            return false;
        }
        self.position += 1;
        self.announce();
        true
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.changes.subscribe()
    }

    fn announce(&self) {
        let _ = self.changes.send(self.current().to_string());
    }
}
