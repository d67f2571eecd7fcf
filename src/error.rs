//! Error kinds for structural operations and firing-path assertions.
//!
//! Structural errors (`DuplicateUri`, `ArcExists`, `KindMismatch`,
//! `UnknownUri`, `DuplicateSubnet`) are raised synchronously at the
//! offending call and never leave the engine partially mutated.
//! `CapacityOverflow`/`Underflow` are runtime assertions on the firing path;
//! they should never trigger from a correctly-scheduled `step()`, since the
//! enabling check forbids both, but `Place` asserts them anyway to catch
//! scheduler bugs rather than silently corrupt the marking.

use crate::uri::Uri;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("URI `{0}` is already registered in this net")]
    DuplicateUri(Uri),

    #[error("an arc already exists between `{src}` and `{dst}`")]
    ArcExists { src: Uri, dst: Uri },

    #[error("arc endpoints `{src}` and `{dst}` are not a (place, transition) pair")]
    KindMismatch { src: Uri, dst: Uri },

    #[error("URI `{0}` is not registered in this net")]
    UnknownUri(Uri),

    #[error("sub-net `{0}` is already embedded")]
    DuplicateSubnet(String),

    #[error("producing {amount} token(s) on `{place}` would exceed its capacity of {capacity}")]
    CapacityOverflow {
        place: Uri,
        amount: usize,
        capacity: usize,
    },

    #[error("consuming {amount} token(s) from `{place}` which only holds {available}")]
    Underflow {
        place: Uri,
        amount: usize,
        available: usize,
    },
}
