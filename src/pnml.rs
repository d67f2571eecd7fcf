//! Structural import/export in a PNML-flavored XML shape.
//!
//! This is a one-shot (re)definition mechanism, not a replay log: it
//! captures places, transitions, and arc weights (and, as the exported
//! "initial" marking, whatever tokens are on each place *at export time*),
//! and reconstructs a fresh [`Net`] from that description by replaying the
//! ordinary `create_place`/`create_transition`/`connect` calls, so every
//! invariant is re-validated on import rather than merely deserialized.
//!
//! Task callbacks are not data and cannot be serialized; places imported
//! from PNML never have a task attached.

use crate::error::EngineError;
use crate::petri_net::net::Net;
use crate::uri::Uri;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PnmlError {
    #[error("PNML XML error: {0}")]
    Xml(String),
    #[error("arc {source} -> {target} has weight 0, which is not a valid arc weight")]
    InvalidWeight { source: String, target: String },
    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename = "pnml")]
struct PnmlDocument {
    net: PnmlNet,
}

#[derive(Debug, Serialize, Deserialize)]
struct PnmlNet {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "place", default)]
    places: Vec<PnmlPlace>,
    #[serde(rename = "transition", default)]
    transitions: Vec<PnmlTransition>,
    #[serde(rename = "arc", default)]
    arcs: Vec<PnmlArc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PnmlPlace {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@initialMarking", default)]
    initial_marking: usize,
    #[serde(rename = "@capacity", skip_serializing_if = "Option::is_none", default)]
    capacity: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PnmlTransition {
    #[serde(rename = "@id")]
    id: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct PnmlArc {
    #[serde(rename = "@source")]
    source: String,
    #[serde(rename = "@target")]
    target: String,
    #[serde(rename = "@weight", default = "default_weight")]
    weight: u32,
}

fn default_weight() -> u32 {
    1
}

/// Serializes `net`'s current structural definition — places (with their
/// present token count as the exported initial marking, and capacity if
/// any), transitions, and weighted arcs — to a PNML-like XML document.
pub fn to_pnml(net: &Net) -> Result<String, PnmlError> {
    let mut places = Vec::new();
    for uri in net.place_order() {
        places.push(PnmlPlace {
            id: uri.as_str().to_owned(),
            initial_marking: net.tokens(&uri)?,
            capacity: net.place_capacity(&uri)?,
        });
    }
    let transitions = net
        .transition_order()
        .into_iter()
        .map(|uri| PnmlTransition {
            id: uri.as_str().to_owned(),
        })
        .collect();
    let arcs = net
        .arcs()
        .into_iter()
        .map(|(src, dst, weight)| PnmlArc {
            source: src.as_str().to_owned(),
            target: dst.as_str().to_owned(),
            weight,
        })
        .collect();

    let document = PnmlDocument {
        net: PnmlNet {
            id: net.label().to_owned(),
            places,
            transitions,
            arcs,
        },
    };
    quick_xml::se::to_string(&document).map_err(|e| PnmlError::Xml(e.to_string()))
}

/// Parses a PNML-like XML document into a fresh [`Net`] labeled `label`,
/// re-validating every invariant by issuing ordinary `create_place`/
/// `create_transition`/`connect` calls rather than deserializing structural
/// state directly.
pub fn from_pnml(xml: &str, label: impl Into<String>) -> Result<Net, PnmlError> {
    let document: PnmlDocument =
        quick_xml::de::from_str(xml).map_err(|e| PnmlError::Xml(e.to_string()))?;
    let net = Net::new(label);
    for place in &document.net.places {
        net.create_place(Some(&place.id), place.initial_marking, None, place.capacity)?;
    }
    for transition in &document.net.transitions {
        net.create_transition(Some(&transition.id))?;
    }
    for arc in &document.net.arcs {
        let weight = NonZeroU32::new(arc.weight).ok_or_else(|| PnmlError::InvalidWeight {
            source: arc.source.clone(),
            target: arc.target.clone(),
        })?;
        net.connect(&Uri::new(&arc.source), &Uri::new(&arc.target), weight)?;
    }
    Ok(net)
}
