//! Places: named marking cells with an optional capacity and an optional
//! side-effecting task invoked on token arrival.

use crate::error::EngineError;
use crate::uri::Uri;
use std::fmt;
use std::sync::Mutex;

/// A place's side-effecting task. Invoked once per `produce` call (not once
/// per token produced), and always outside the place's lock so a blocking
/// task cannot stall concurrent reads of the token count.
pub type Task = Box<dyn Fn() + Send + Sync>;

/// The common interface a node in the arc table exposes for token
/// manipulation, regardless of whether it is a place this net defined
/// itself or a place borrowed from an embedded sub-net.
///
/// Every place-like thing — local or forwarded through a child net's public
/// interface — implements this one small trait, and `Net` dispatches to it
/// by ordinary polymorphism rather than by name lookup through a registry.
pub trait TokenHolder: Send + Sync + fmt::Debug {
    /// The current token count.
    fn get_tokens(&self) -> usize;
    /// Deposits `n` tokens, pre-checking capacity. Invokes the attached
    /// task exactly once if the resulting count is positive.
    fn produce(&self, n: usize) -> Result<(), EngineError>;
    /// Withdraws `n` tokens. The caller (the net's enabling check) must
    /// already have guaranteed `n <= get_tokens()`; this is re-asserted
    /// here as a backstop against scheduler bugs.
    fn consume(&self, n: usize) -> Result<(), EngineError>;
    /// True iff the token count equals the declared capacity. Places with
    /// no capacity are never considered at their limit.
    fn is_capacity_reached(&self) -> bool;
    /// Restores the token count to its initial value.
    fn reset(&self);
    /// The declared capacity, if any.
    fn capacity(&self) -> Option<usize>;
}

/// A place defined directly by this net (as opposed to one borrowed from an
/// embedded sub-net — see [`crate::petri_net::net::Net::embed`]).
pub struct Place {
    uri: Uri,
    label: String,
    init_tokens: usize,
    tokens: Mutex<usize>,
    capacity: Option<usize>,
    task: Option<Task>,
}

impl fmt::Debug for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Place")
            .field("uri", &self.uri)
            .field("label", &self.label)
            .field("tokens", &*self.tokens.lock().unwrap())
            .field("capacity", &self.capacity)
            .field("has_task", &self.task.is_some())
            .finish()
    }
}

impl Place {
    pub fn new(
        uri: Uri,
        label: impl Into<String>,
        init_tokens: usize,
        capacity: Option<usize>,
        task: Option<Task>,
    ) -> Self {
        Place {
            uri,
            label: label.into(),
            init_tokens,
            tokens: Mutex::new(init_tokens),
            capacity,
            task,
        }
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl TokenHolder for Place {
    fn get_tokens(&self) -> usize {
        *self.tokens.lock().unwrap()
    }

    fn produce(&self, n: usize) -> Result<(), EngineError> {
        let new_count = {
            let mut guard = self.tokens.lock().unwrap();
            let candidate = *guard + n;
            if let Some(capacity) = self.capacity {
                if candidate > capacity {
                    return Err(EngineError::CapacityOverflow {
                        place: self.uri.clone(),
                        amount: n,
                        capacity,
                    });
                }
            }
            *guard = candidate;
            candidate
        };
        // The lock is released above; the task runs without it held so a
        // blocking task (e.g. a timed sub-net's idle routine) cannot stall
        // concurrent reads of this place's token count.
        if new_count > 0 {
            if let Some(task) = &self.task {
                tracing::trace!(place = %self.uri, "running place task");
                task();
            }
        }
        Ok(())
    }

    fn consume(&self, n: usize) -> Result<(), EngineError> {
        let mut guard = self.tokens.lock().unwrap();
        if n > *guard {
            return Err(EngineError::Underflow {
                place: self.uri.clone(),
                amount: n,
                available: *guard,
            });
        }
        *guard -= n;
        Ok(())
    }

    fn is_capacity_reached(&self) -> bool {
        match self.capacity {
            Some(capacity) => self.get_tokens() == capacity,
            None => false,
        }
    }

    fn reset(&self) {
        *self.tokens.lock().unwrap() = self.init_tokens;
    }

    fn capacity(&self) -> Option<usize> {
        self.capacity
    }
}
