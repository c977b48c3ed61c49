use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic generation counter guarding a piece of shared display state.
///
/// Each new operation on the state takes a [`Ticket`]; only the holder of the
/// latest ticket may publish its result. Older holders drop theirs silently.
#[derive(Debug, Default)]
pub struct Generation {
    latest: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    pub fn seq(self) -> u64 {
        self.0
    }
}

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new operation, superseding every earlier ticket.
    pub fn advance(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    pub fn current(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_latest_ticket_is_current() {
        let generation = Generation::new();
        let first = generation.advance();
        assert!(generation.is_current(first));
        let second = generation.advance();
        assert!(!generation.is_current(first));
        assert!(generation.is_current(second));
        assert!(second > first);
        assert_eq!(generation.current(), second.seq());
    }
}
