//! An executable Petri-net engine.
//!
//! A net is a bipartite graph of *places* (token holders) and
//! *transitions* (events), connected by weighted arcs. Firing a transition
//! atomically withdraws tokens from its input places and deposits tokens
//! into its output places, running each affected place's attached task as
//! the deposit happens. Nets compose: a whole net can be embedded as a
//! sub-net of another, with its places and transitions renamed under a
//! dotted URI suffix so identifiers never collide.
//!
//! ```
//! use petri_nets::Net;
//! use std::num::NonZeroU32;
//!
//! let net = Net::new("ProducerConsumer");
//! let p0 = net.create_place(Some("P0"), 1, None, None).unwrap();
//! let t0 = net.create_transition(Some("T0")).unwrap();
//! let p1 = net.create_place(Some("P1"), 0, None, None).unwrap();
//! net.connect(&p0, &t0, NonZeroU32::new(1).unwrap()).unwrap();
//! net.connect(&t0, &p1, NonZeroU32::new(1).unwrap()).unwrap();
//!
//! let fired = net.step().unwrap().expect("T0 is enabled");
//! assert_eq!(fired.transition, t0);
//! assert_eq!(net.tokens(&p1).unwrap(), 1);
//! ```
//!
//! See `README`-level detail in the crate's design documents for the
//! enabling rule, the firing/scheduling semantics, and sub-net embedding.

pub mod driver;
pub mod error;
pub mod petri_net;
pub mod pnml;
pub mod uri;

pub use driver::{AsyncDriver, SyncDriver};
pub use error::EngineError;
pub use petri_net::net::{FireResult, Marking, Net};
pub use petri_net::place::{Place, Task, TokenHolder};
pub use petri_net::timed::TimedSubnet;
pub use petri_net::transition::Transition;
pub use uri::Uri;
