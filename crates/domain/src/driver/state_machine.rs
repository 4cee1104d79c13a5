use std::sync::{Mutex, MutexGuard};

use super::{ConnectionState, ConnectionStateChanged, StateNotifier, Subscription};
use crate::error::{DomainError, Result};

/// Owner of a driver's [`ConnectionState`].
///
/// Only legal edges are accepted. Each accepted transition publishes exactly
/// one [`ConnectionStateChanged`] after the state lock is released, so
/// handlers may read the state back.
#[derive(Debug, Default)]
pub struct ConnectionStateMachine {
    state: Mutex<ConnectionState>,
    notifier: StateNotifier,
}

impl ConnectionStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ConnectionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn state(&self) -> ConnectionState {
        *self.lock()
    }

    pub fn notifier(&self) -> &StateNotifier {
        &self.notifier
    }

    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&ConnectionStateChanged) + Send + Sync + 'static,
    {
        self.notifier.subscribe(handler)
    }

    /// Move to `next`, returning the previous state.
    pub fn transition(&self, next: ConnectionState, reason: Option<String>) -> Result<ConnectionState> {
        let event = {
            let mut state = self.lock();
            let current = *state;
            if !current.can_transition_to(next) {
                return Err(DomainError::InvalidTransition {
                    from: current,
                    to: next,
                });
            }
            *state = next;
            ConnectionStateChanged::new(current, next, reason)
        };

        tracing::debug!(%event, "Connection state changed");
        self.notifier.publish(&event);
        Ok(event.old_state)
    }

    /// Transition only if the current state is `from`. Returns whether it moved.
    pub fn transition_from(
        &self,
        from: ConnectionState,
        next: ConnectionState,
        reason: Option<String>,
    ) -> bool {
        let event = {
            let mut state = self.lock();
            if *state != from || !from.can_transition_to(next) {
                return false;
            }
            *state = next;
            ConnectionStateChanged::new(from, next, reason)
        };

        tracing::debug!(%event, "Connection state changed");
        self.notifier.publish(&event);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn recorder(machine: &ConnectionStateMachine) -> (Subscription, Arc<Mutex<Vec<ConnectionStateChanged>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let subscription = machine.subscribe(move |e| sink.lock().unwrap().push(e.clone()));
        (subscription, events)
    }

    #[test]
    fn test_full_lifecycle_fires_one_event_per_transition() {
        let machine = ConnectionStateMachine::new();
        let (_sub, events) = recorder(&machine);

        machine.transition(ConnectionState::Connecting, None).unwrap();
        machine.transition(ConnectionState::Connected, None).unwrap();
        machine.transition(ConnectionState::Disconnecting, None).unwrap();
        machine.transition(ConnectionState::Disconnected, Some("requested".into())).unwrap();

        let events = events.lock().unwrap();
        let pairs: Vec<_> = events.iter().map(|e| (e.old_state, e.new_state)).collect();
        assert_eq!(
            pairs,
            vec![
                (ConnectionState::Disconnected, ConnectionState::Connecting),
                (ConnectionState::Connecting, ConnectionState::Connected),
                (ConnectionState::Connected, ConnectionState::Disconnecting),
                (ConnectionState::Disconnecting, ConnectionState::Disconnected),
            ]
        );
        assert_eq!(events[3].reason.as_deref(), Some("requested"));
        assert!(events.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn test_illegal_transition_is_rejected_silently() {
        let machine = ConnectionStateMachine::new();
        let (_sub, events) = recorder(&machine);

        let err = machine.transition(ConnectionState::Connected, None).unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidTransition {
                from: ConnectionState::Disconnected,
                to: ConnectionState::Connected
            }
        );
        assert_eq!(machine.state(), ConnectionState::Disconnected);
        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_transition_from_requires_matching_state() {
        let machine = ConnectionStateMachine::new();
        assert!(!machine.transition_from(
            ConnectionState::Connecting,
            ConnectionState::Disconnected,
            None
        ));
        machine.transition(ConnectionState::Connecting, None).unwrap();
        assert!(machine.transition_from(
            ConnectionState::Connecting,
            ConnectionState::Disconnected,
            None
        ));
        assert_eq!(machine.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_panicking_subscriber_does_not_corrupt_state() {
        let machine = ConnectionStateMachine::new();
        let _bad = machine.subscribe(|_| panic!("boom"));

        machine.transition(ConnectionState::Connecting, None).unwrap();
        machine.transition(ConnectionState::Faulted, None).unwrap();
        assert_eq!(machine.state(), ConnectionState::Faulted);
        machine.transition(ConnectionState::Connecting, None).unwrap();
        assert_eq!(machine.state(), ConnectionState::Connecting);
    }

    #[test]
    fn test_subscriber_can_read_state() {
        let machine = Arc::new(ConnectionStateMachine::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (inner, sink) = (Arc::downgrade(&machine), Arc::clone(&seen));
        let _sub = machine.subscribe(move |_| {
            if let Some(m) = inner.upgrade() {
                sink.lock().unwrap().push(m.state());
            }
        });

        machine.transition(ConnectionState::Connecting, None).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![ConnectionState::Connecting]);
    }
}
