//! # Connectivity State Machine
//!
//! Tracks the outbound network path for the telemetry streamer. The
//! reference design rides a WiFi station interface: the link comes up in
//! stages (station start, association, address acquisition) and can drop
//! at any time, at which point the firmware immediately issues another
//! connect attempt with no backoff.
//!
//! [`LinkMonitor`] is that machine lifted out of any particular network
//! stack's callback ABI: transition events arrive through a single typed
//! entry point, the reconnect side effect goes through the
//! [`LinkControl`] seam, and the current state is published through a
//! shared [`LinkStateHandle`] that the telemetry streamer reads before
//! each send. The machine has no terminal state; it runs for process
//! lifetime.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// State of the outbound network path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkState {
    /// No connectivity
    Down = 0,
    /// Connect attempt in flight; association alone does not leave this
    /// state, address acquisition does
    Starting = 1,
    /// Address acquired, sends may be attempted
    Up = 2,
}

/// Asynchronous network-stack events driving the machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkEvent {
    /// The station interface started
    StationStart,
    /// Associated with the access point (informational only)
    Connected,
    /// Address acquisition completed
    GotAddress,
    /// The link dropped
    Disconnected,
}

/// Side-effect seam for connect attempts.
///
/// The monitor calls `connect` once per station start and once per
/// disconnect; the implementation issues the actual (asynchronous)
/// connect request against whatever stack is in use.
pub trait LinkControl {
    fn connect(&mut self);
}

/// Shared, lock-free view of the current link state.
///
/// Cloneable; reads are tolerant of concurrent transitions (a send may be
/// attempted mid-transition, by design of the reference behavior).
#[derive(Clone)]
pub struct LinkStateHandle {
    state: Arc<AtomicU8>,
}

impl LinkStateHandle {
    fn new(initial: LinkState) -> Self {
        Self {
            state: Arc::new(AtomicU8::new(initial as u8)),
        }
    }

    fn store(&self, state: LinkState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Current state at the moment of the read.
    pub fn get(&self) -> LinkState {
        match self.state.load(Ordering::Acquire) {
            0 => LinkState::Down,
            1 => LinkState::Starting,
            _ => LinkState::Up,
        }
    }

    /// True if the link is fully up.
    pub fn is_up(&self) -> bool {
        self.get() == LinkState::Up
    }
}

/// The connectivity state machine.
pub struct LinkMonitor<C: LinkControl> {
    state: LinkState,
    control: C,
    shared: LinkStateHandle,
}

impl<C: LinkControl> LinkMonitor<C> {
    /// Create a monitor in the `Down` state and the shared handle
    /// consumers read from.
    pub fn new(control: C) -> (Self, LinkStateHandle) {
        let shared = LinkStateHandle::new(LinkState::Down);
        (
            Self {
                state: LinkState::Down,
                control,
                shared: shared.clone(),
            },
            shared,
        )
    }

    /// Current state.
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Feed one network-stack event through the machine.
    pub fn handle_event(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::StationStart => {
                info!("station started, issuing connect attempt");
                self.control.connect();
                self.transition(LinkState::Starting);
            }
            LinkEvent::Connected => {
                // Associated but no address yet; stay in Starting.
                info!("link associated");
            }
            LinkEvent::GotAddress => {
                info!("address acquired, link up");
                self.transition(LinkState::Up);
            }
            LinkEvent::Disconnected => {
                warn!("link lost, reconnecting");
                self.transition(LinkState::Down);
                // Unconditional retry, no backoff.
                self.control.connect();
                self.transition(LinkState::Starting);
            }
        }
    }

    fn transition(&mut self, next: LinkState) {
        self.state = next;
        self.shared.store(next);
    }
}
