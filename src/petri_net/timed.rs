//! The canonical timed sub-net: `T_IN -> P(capacity 1, idle task) -> T_OUT`.
//!
//! Because `P`'s capacity is 1 and the enabling rule forbids production
//! into a place that has reached its capacity, once a token lands on `P`
//! no further firing of `T_IN` can push in another token until `T_OUT`
//! consumes the one present. `P`'s task — the idle routine — blocks for
//! the configured interval before the place's lock-free `produce` call
//! returns, so the earliest `T_OUT` can fire is one interval after the
//! token arrived. That is the whole mechanism; nothing else enforces the
//! spacing.

use crate::petri_net::net::Net;
use crate::petri_net::place::Task;
use crate::uri::Uri;
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_micros(100);

/// A ready-to-embed sub-net realizing a fixed inter-event delay.
pub struct TimedSubnet {
    net: Arc<Net>,
    input_transition: Uri,
    output_transition: Uri,
}

impl TimedSubnet {
    /// `label` becomes the sub-net label used when this is embedded — it
    /// must be unique among the sub-nets embedded into the same parent, so
    /// multiple timers in one net need distinct labels.
    pub fn new(label: impl Into<String>, interval: Duration) -> Self {
        let net = Net::new(label);
        let input_transition = net
            .create_transition(Some("T_IN"))
            .expect("fresh net, T_IN cannot collide");

        // The idle task holds a per-timer mutex for its whole wait so that
        // overlapping embeddings of the *same* timer instance cannot race;
        // each `TimedSubnet` has its own lock, so distinct timers never
        // contend with one another.
        let timer_lock = Arc::new(Mutex::new(()));
        let idle_task: Task = {
            let timer_lock = timer_lock.clone();
            Box::new(move || {
                let _guard = timer_lock.lock().unwrap();
                let start = Instant::now();
                tracing::trace!(interval_ms = interval.as_millis(), "timed sub-net: waiting");
                while start.elapsed() < interval {
                    std::thread::sleep(POLL_INTERVAL);
                }
                tracing::trace!("timed sub-net: wait complete");
            })
        };

        let gate = net
            .create_place(Some("P"), 0, Some(idle_task), Some(1))
            .expect("fresh net, P cannot collide");
        let output_transition = net
            .create_transition(Some("T_OUT"))
            .expect("fresh net, T_OUT cannot collide");

        let one = NonZeroU32::new(1).unwrap();
        net.connect(&input_transition, &gate, one)
            .expect("fresh net, arcs cannot already exist");
        net.connect(&gate, &output_transition, one)
            .expect("fresh net, arcs cannot already exist");

        TimedSubnet {
            net: Arc::new(net),
            input_transition,
            output_transition,
        }
    }

    /// The net to pass to [`Net::embed`]. Consumes nothing — the returned
    /// `Arc` is the same one this `TimedSubnet` holds, so `input_transition`
    /// and `output_transition` remain valid parent-side accessors after
    /// minting (via `Uri::mint`) once embedded.
    pub fn net(&self) -> Arc<Net> {
        self.net.clone()
    }

    pub fn input_transition(&self) -> &Uri {
        &self.input_transition
    }

    pub fn output_transition(&self) -> &Uri {
        &self.output_transition
    }

    /// The transition URIs as they will read once embedded under
    /// `parent.embed(timed.net())` — i.e. with `.{label}` appended.
    pub fn embedded_input_transition(&self) -> Uri {
        self.input_transition.mint(self.net.label())
    }

    pub fn embedded_output_transition(&self) -> Uri {
        self.output_transition.mint(self.net.label())
    }
}
