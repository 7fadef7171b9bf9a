//! Process-wide registry of TCP ports handed out by `port` symbols.
//!
//! Two resolutions running side by side must never receive the same port.
//! The registry claims a candidate atomically before probing it, so the claim
//! and the uniqueness check are a single step.

use dashmap::DashSet;
use rand::Rng;
use std::net::TcpListener;

/// Ports claimed so far. Share it between resolvers with an `Arc`.
#[derive(Debug, Default)]
pub struct PortRegistry {
    claimed: DashSet<u16>,
}

impl PortRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `port`. Returns `false` when it was already claimed.
    pub fn try_claim(&self, port: u16) -> bool {
        self.claimed.insert(port)
    }

    /// Give a claimed port back. Returns `false` when it was not claimed.
    pub fn release(&self, port: u16) -> bool {
        self.claimed.remove(&port).is_some()
    }

    pub fn is_claimed(&self, port: u16) -> bool {
        self.claimed.contains(&port)
    }

    /// Claimed ports in ascending order.
    pub fn claimed(&self) -> Vec<u16> {
        let mut ports: Vec<u16> = self.claimed.iter().map(|p| *p).collect();
        ports.sort_unstable();
        ports
    }

    /// Pick an unclaimed port in `low..=high` that can currently be bound on
    /// the loopback interface, trying at most `attempts` random candidates.
    ///
    /// A candidate that turns out to be in use by another process is released
    /// again. Returns `None` when no candidate succeeded.
    pub fn allocate(&self, low: u16, high: u16, attempts: usize) -> Option<u16> {
        let low = low.max(1);
        if low > high {
            return None;
        }

        let mut rng = rand::rng();
        for _ in 0..attempts {
            let port = rng.random_range(low..=high);
            if !self.try_claim(port) {
                continue;
            }
            if is_bindable(port) {
                tracing::debug!("Allocated port {}", port);
                return Some(port);
            }
            self.release(port);
        }

        // Narrow ranges are walked exhaustively once random probing gives up.
        if usize::from(high - low) < attempts {
            for port in low..=high {
                if self.try_claim(port) {
                    if is_bindable(port) {
                        return Some(port);
                    }
                    self.release(port);
                }
            }
        }
        None
    }
}

fn is_bindable(port: u16) -> bool {
    TcpListener::bind(("127.0.0.1", port)).is_ok()
}
