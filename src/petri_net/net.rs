//! `Net`: the container of places and transitions, the enabling predicate,
//! the firing step, the nondeterministic scheduler, and compositional
//! embedding of sub-nets.

use crate::error::EngineError;
use crate::petri_net::arc_table::{ArcTable, Edge};
use crate::petri_net::matrix::Matrices;
use crate::petri_net::place::{Place, Task, TokenHolder};
use crate::petri_net::transition::Transition;
use crate::uri::Uri;
use ahash::AHashMap;
use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroU32;
use std::sync::{Arc, RwLock};

/// A place this net borrows from an embedded sub-net. Dispatches every
/// operation through the child net's public interface — never by reaching
/// into the child's private tables — so a borrowed place may itself be a
/// nested embedding.
#[derive(Clone)]
struct EmbeddedPlace {
    net: Arc<Net>,
    child_uri: Uri,
}

impl fmt::Debug for EmbeddedPlace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddedPlace")
            .field("subnet", &self.net.label)
            .field("child_uri", &self.child_uri)
            .finish()
    }
}

impl TokenHolder for EmbeddedPlace {
    fn get_tokens(&self) -> usize {
        self.net.tokens(&self.child_uri).unwrap_or(0)
    }

    fn produce(&self, n: usize) -> Result<(), EngineError> {
        self.net.produce_at(&self.child_uri, n)
    }

    fn consume(&self, n: usize) -> Result<(), EngineError> {
        self.net.consume_at(&self.child_uri, n)
    }

    fn is_capacity_reached(&self) -> bool {
        self.net.is_capacity_reached_at(&self.child_uri).unwrap_or(false)
    }

    fn reset(&self) {
        let _ = self.net.reset_at(&self.child_uri);
    }

    fn capacity(&self) -> Option<usize> {
        self.net.capacity_at(&self.child_uri).ok().flatten()
    }
}

/// A transition this net either defines itself or borrows from an embedded
/// sub-net. Transitions are stateless, so embedding only needs to remember
/// the label to forward to for introspection; firing never routes through
/// a transition, only through its incident places.
#[derive(Clone)]
enum TransitionEntry {
    Local(Transition),
    Embedded { net: Arc<Net>, child_uri: Uri },
}

impl TransitionEntry {
    fn label(&self) -> String {
        match self {
            TransitionEntry::Local(t) => t.label().to_owned(),
            TransitionEntry::Embedded { net, child_uri } => net
                .transition_label(child_uri)
                .unwrap_or_else(|| child_uri.as_str().to_owned()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Place,
    Transition,
}

/// The snapshot of token counts over all places, as `(uri, count)` pairs
/// sorted by URI.
pub type Marking = Vec<(Uri, usize)>;

/// The result of one `fire`: which transition fired and the marking
/// immediately after (synchronous semantics: after all production tasks
/// have completed).
#[derive(Debug, Clone)]
pub struct FireResult {
    pub transition: Uri,
    pub marking: Marking,
}

/// A container of places and transitions; see the module docs.
pub struct Net {
    label: String,
    places: RwLock<HashMap<Uri, Arc<dyn TokenHolder>, ahash::RandomState>>,
    transitions: RwLock<HashMap<Uri, TransitionEntry, ahash::RandomState>>,
    arcs: RwLock<ArcTable>,
    /// `sub_label -> (parent_uri -> child_uri)`, recorded at embed time so
    /// later operations addressed at the parent's URI can be forwarded to
    /// the child's original URI. Read concurrently during firing; must be
    /// immutable after the embedding that created it completes.
    subnets: RwLock<HashMap<String, AHashMap<Uri, Uri>, ahash::RandomState>>,
    matrices: RwLock<Matrices>,
}

impl fmt::Debug for Net {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Net")
            .field("label", &self.label)
            .field("places", &self.places.read().unwrap().len())
            .field("transitions", &self.transitions.read().unwrap().len())
            .finish()
    }
}

impl fmt::Display for Net {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} places, {} transitions, {} arcs",
            self.label,
            self.places.read().unwrap().len(),
            self.transitions.read().unwrap().len(),
            self.arcs.read().unwrap().len()
        )
    }
}

impl Net {
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        tracing::debug!(net = %label, "creating net");
        Net {
            label,
            places: RwLock::new(HashMap::with_hasher(ahash::RandomState::new())),
            transitions: RwLock::new(HashMap::with_hasher(ahash::RandomState::new())),
            arcs: RwLock::new(ArcTable::new()),
            subnets: RwLock::new(HashMap::with_hasher(ahash::RandomState::new())),
            matrices: RwLock::new(Matrices::default()),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    fn kind_of(&self, uri: &Uri) -> Option<Kind> {
        if self.places.read().unwrap().contains_key(uri) {
            return Some(Kind::Place);
        }
        if self.transitions.read().unwrap().contains_key(uri) {
            return Some(Kind::Transition);
        }
        None
    }

    fn check_uri_free(&self, uri: &Uri) -> Result<(), EngineError> {
        match self.kind_of(uri) {
            Some(_) => Err(EngineError::DuplicateUri(uri.clone())),
            None => Ok(()),
        }
    }

    fn rebuild_matrices(&self) {
        let place_uris: Vec<Uri> = self.places.read().unwrap().keys().cloned().collect();
        let transition_uris: Vec<Uri> = self.transitions.read().unwrap().keys().cloned().collect();
        let matrices = Matrices::rebuild(&place_uris, &transition_uris, &self.arcs.read().unwrap());
        *self.matrices.write().unwrap() = matrices;
    }

    /// Creates a place owned by this net. `label` defaults to `P{n}` where
    /// `n` is the current place count.
    pub fn create_place(
        &self,
        label: Option<&str>,
        init_tokens: usize,
        task: Option<Task>,
        capacity: Option<usize>,
    ) -> Result<Uri, EngineError> {
        let label = label
            .map(str::to_owned)
            .unwrap_or_else(|| format!("P{}", self.places.read().unwrap().len()));
        let uri = Uri::new(&label);
        self.check_uri_free(&uri)?;
        let place: Arc<dyn TokenHolder> =
            Arc::new(Place::new(uri.clone(), label, init_tokens, capacity, task));
        self.places.write().unwrap().insert(uri.clone(), place);
        self.rebuild_matrices();
        tracing::debug!(net = %self.label, place = %uri, "created place");
        Ok(uri)
    }

    /// Creates a transition owned by this net. `label` defaults to `T{n}`
    /// where `n` is the current transition count.
    pub fn create_transition(&self, label: Option<&str>) -> Result<Uri, EngineError> {
        let label = label
            .map(str::to_owned)
            .unwrap_or_else(|| format!("T{}", self.transitions.read().unwrap().len()));
        let uri = Uri::new(&label);
        self.check_uri_free(&uri)?;
        self.transitions
            .write()
            .unwrap()
            .insert(uri.clone(), TransitionEntry::Local(Transition::new(uri.clone(), label)));
        self.rebuild_matrices();
        tracing::debug!(net = %self.label, transition = %uri, "created transition");
        Ok(uri)
    }

    fn classify_edge(&self, src: &Uri, dst: &Uri) -> Result<Edge, EngineError> {
        let src_kind = self.kind_of(src).ok_or_else(|| EngineError::UnknownUri(src.clone()))?;
        let dst_kind = self.kind_of(dst).ok_or_else(|| EngineError::UnknownUri(dst.clone()))?;
        match (src_kind, dst_kind) {
            (Kind::Place, Kind::Transition) => Ok(Edge::PlaceToTransition(src.clone(), dst.clone())),
            (Kind::Transition, Kind::Place) => Ok(Edge::TransitionToPlace(src.clone(), dst.clone())),
            _ => Err(EngineError::KindMismatch {
                src: src.clone(),
                dst: dst.clone(),
            }),
        }
    }

    /// Connects `src` to `dst` with the given weight. `src`/`dst` must be
    /// one place and one transition, in either direction; re-adding an arc
    /// between the same ordered pair is an error.
    pub fn connect(&self, src: &Uri, dst: &Uri, weight: NonZeroU32) -> Result<(), EngineError> {
        let edge = self.classify_edge(src, dst)?;
        let (src, dst) = edge.endpoints();
        let mut arcs = self.arcs.write().unwrap();
        if arcs.contains(src, dst) {
            return Err(EngineError::ArcExists {
                src: src.clone(),
                dst: dst.clone(),
            });
        }
        arcs.insert(src.clone(), dst.clone(), weight.get());
        drop(arcs);
        self.rebuild_matrices();
        tracing::debug!(net = %self.label, src = %src, dst = %dst, weight = weight.get(), "connected");
        Ok(())
    }

    /// Embeds `child`'s places, transitions, and arcs into this net under
    /// `child`'s label as a URI suffix. One-shot: the child retains its own
    /// structural description for introspection, and its nodes are from
    /// then on indistinguishable from this net's own.
    pub fn embed(&self, child: Arc<Net>) -> Result<(), EngineError> {
        let subnet_label = child.label.clone();
        if self.subnets.read().unwrap().contains_key(&subnet_label) {
            return Err(EngineError::DuplicateSubnet(subnet_label));
        }

        let child_place_uris: Vec<Uri> = child.places.read().unwrap().keys().cloned().collect();
        let child_transition_uris: Vec<Uri> =
            child.transitions.read().unwrap().keys().cloned().collect();

        let minted_places: Vec<(Uri, Uri)> = child_place_uris
            .iter()
            .map(|child_uri| (child_uri.mint(&subnet_label), child_uri.clone()))
            .collect();
        let minted_transitions: Vec<(Uri, Uri)> = child_transition_uris
            .iter()
            .map(|child_uri| (child_uri.mint(&subnet_label), child_uri.clone()))
            .collect();

        // Validate every minted URI in the batch against both of this
        // net's tables before mutating anything — a collision discovered
        // partway through a large sub-net must never leave the earlier
        // nodes of that same embed call committed (spec.md §7).
        {
            let places = self.places.read().unwrap();
            let transitions = self.transitions.read().unwrap();
            for (minted, _) in minted_places.iter().chain(minted_transitions.iter()) {
                if places.contains_key(minted) || transitions.contains_key(minted) {
                    return Err(EngineError::DuplicateUri(minted.clone()));
                }
            }
        }

        let mut mapping: AHashMap<Uri, Uri> = AHashMap::new();

        {
            let mut places = self.places.write().unwrap();
            for (minted, child_uri) in &minted_places {
                places.insert(
                    minted.clone(),
                    Arc::new(EmbeddedPlace {
                        net: child.clone(),
                        child_uri: child_uri.clone(),
                    }),
                );
                mapping.insert(minted.clone(), child_uri.clone());
            }
        }

        {
            let mut transitions = self.transitions.write().unwrap();
            for (minted, child_uri) in &minted_transitions {
                transitions.insert(
                    minted.clone(),
                    TransitionEntry::Embedded {
                        net: child.clone(),
                        child_uri: child_uri.clone(),
                    },
                );
                mapping.insert(minted.clone(), child_uri.clone());
            }
        }

        {
            let child_arcs: Vec<((Uri, Uri), u32)> = child
                .arcs
                .read()
                .unwrap()
                .iter()
                .map(|(k, v)| (k.clone(), *v))
                .collect();
            let mut arcs = self.arcs.write().unwrap();
            for ((src, dst), weight) in child_arcs {
                arcs.insert(src.mint(&subnet_label), dst.mint(&subnet_label), weight);
            }
        }

        self.subnets.write().unwrap().insert(subnet_label.clone(), mapping);
        self.rebuild_matrices();
        tracing::debug!(net = %self.label, subnet = %subnet_label, "embedded sub-net");
        Ok(())
    }

    // --- Uniform dispatch through TokenHolder, used both for this net's own
    // public API and by EmbeddedPlace to forward into a child net. ---

    pub fn tokens(&self, uri: &Uri) -> Result<usize, EngineError> {
        self.places
            .read()
            .unwrap()
            .get(uri)
            .map(|h| h.get_tokens())
            .ok_or_else(|| EngineError::UnknownUri(uri.clone()))
    }

    /// Deposits `n` tokens directly onto the named place, outside of any
    /// firing. Exposed at the net's own level because `produce`/`consume`
    /// are the stable operation set a place-like thing supports, and a
    /// net's boundary places are how external stimulus enters — feeding a
    /// source place or seeding a scenario works the same way a firing's
    /// production step does internally.
    pub fn produce(&self, uri: &Uri, n: usize) -> Result<(), EngineError> {
        self.produce_at(uri, n)
    }

    /// Withdraws `n` tokens directly from the named place, outside of any
    /// firing. See [`Net::produce`].
    pub fn consume(&self, uri: &Uri, n: usize) -> Result<(), EngineError> {
        self.consume_at(uri, n)
    }

    pub(crate) fn produce_at(&self, uri: &Uri, n: usize) -> Result<(), EngineError> {
        let holder = self
            .places
            .read()
            .unwrap()
            .get(uri)
            .cloned()
            .ok_or_else(|| EngineError::UnknownUri(uri.clone()))?;
        holder.produce(n)
    }

    pub(crate) fn consume_at(&self, uri: &Uri, n: usize) -> Result<(), EngineError> {
        let holder = self
            .places
            .read()
            .unwrap()
            .get(uri)
            .cloned()
            .ok_or_else(|| EngineError::UnknownUri(uri.clone()))?;
        holder.consume(n)
    }

    pub(crate) fn is_capacity_reached_at(&self, uri: &Uri) -> Result<bool, EngineError> {
        self.places
            .read()
            .unwrap()
            .get(uri)
            .map(|h| h.is_capacity_reached())
            .ok_or_else(|| EngineError::UnknownUri(uri.clone()))
    }

    pub(crate) fn reset_at(&self, uri: &Uri) -> Result<(), EngineError> {
        self.places
            .read()
            .unwrap()
            .get(uri)
            .map(|h| h.reset())
            .ok_or_else(|| EngineError::UnknownUri(uri.clone()))
    }

    pub(crate) fn capacity_at(&self, uri: &Uri) -> Result<Option<usize>, EngineError> {
        self.places
            .read()
            .unwrap()
            .get(uri)
            .map(|h| h.capacity())
            .ok_or_else(|| EngineError::UnknownUri(uri.clone()))
    }

    fn transition_label(&self, uri: &Uri) -> Option<String> {
        self.transitions.read().unwrap().get(uri).map(TransitionEntry::label)
    }

    /// Resets every place (local and embedded) to its initial token count.
    pub fn reset(&self) {
        for holder in self.places.read().unwrap().values() {
            holder.reset();
        }
    }

    /// The current marking as sorted `"uri=count"` strings.
    pub fn state(&self) -> Vec<String> {
        self.marking().into_iter().map(|(u, c)| format!("{u}={c}")).collect()
    }

    /// The current marking as sorted `(uri, count)` pairs.
    pub fn marking(&self) -> Marking {
        let places = self.matrices.read().unwrap().places().to_vec();
        places.into_iter().map(|p| {
            let tokens = self.tokens(&p).unwrap_or(0);
            (p, tokens)
        }).collect()
    }

    /// The input matrix `I`, indexed by `(place_order(), transition_order())`.
    pub fn input_matrix(&self) -> Vec<Vec<u32>> {
        self.matrices.read().unwrap().input().to_vec()
    }

    /// The output matrix `O`.
    pub fn output_matrix(&self) -> Vec<Vec<u32>> {
        self.matrices.read().unwrap().output().to_vec()
    }

    /// The incidence matrix `C = O - I`.
    pub fn incidence_matrix(&self) -> Vec<Vec<i64>> {
        self.matrices.read().unwrap().incidence().to_vec()
    }

    pub fn place_order(&self) -> Vec<Uri> {
        self.matrices.read().unwrap().places().to_vec()
    }

    pub fn transition_order(&self) -> Vec<Uri> {
        self.matrices.read().unwrap().transitions().to_vec()
    }

    /// Every arc currently in this net's table, as `(src, dst, weight)`.
    pub fn arcs(&self) -> Vec<(Uri, Uri, u32)> {
        self.arcs
            .read()
            .unwrap()
            .iter()
            .map(|((src, dst), weight)| (src.clone(), dst.clone(), *weight))
            .collect()
    }

    /// The declared capacity of a place, if any. `Err(UnknownUri)` if `uri`
    /// does not name a place in this net.
    pub fn place_capacity(&self, uri: &Uri) -> Result<Option<usize>, EngineError> {
        self.capacity_at(uri)
    }

    fn is_enabled(&self, t: &Uri) -> bool {
        let matrices = self.matrices.read().unwrap();
        if matrices.input_column_sum(t) == 0 {
            return false;
        }
        if matrices.output_column_sum(t) == 0 {
            return false;
        }
        let places = self.places.read().unwrap();
        for p in matrices.places() {
            let required = matrices.input_weight(p, t);
            if required == 0 {
                continue;
            }
            match places.get(p) {
                Some(holder) if (holder.get_tokens() as u32) >= required => {}
                _ => return false,
            }
        }
        for p in matrices.places() {
            let produced = matrices.output_weight(t, p);
            if produced == 0 {
                continue;
            }
            match places.get(p) {
                Some(holder) if !holder.is_capacity_reached() => {}
                _ => return false,
            }
        }
        true
    }

    /// The transitions enabled in the current marking.
    pub fn enabled_transitions(&self) -> Vec<Uri> {
        let transition_uris = self.matrices.read().unwrap().transitions().to_vec();
        transition_uris.into_iter().filter(|t| self.is_enabled(t)).collect()
    }

    /// Consumes synchronously, then spawns one production thread per place
    /// with a positive delta. When `join` is true, every spawned thread is
    /// awaited before returning and the resulting marking is reported
    /// (the synchronous semantics `step()`/`fire()` rely on). When `join`
    /// is false, the spawned threads are deliberately *not* waited on —
    /// they are left to run to completion in the background, which is what
    /// lets the asynchronous driver observe a step returning immediately
    /// while a slow task (e.g. a timed sub-net's idle wait) is still
    /// running, per spec.md §4.5/§4.9. `Ok(None)` is returned in that case
    /// since there is no completed marking to report yet.
    fn fire_transition(&self, t: &Uri, join: bool) -> Result<Option<FireResult>, EngineError> {
        let matrices = self.matrices.read().unwrap();
        let deltas = matrices.places().to_vec();
        let deltas: Vec<(Uri, i64)> = deltas
            .into_iter()
            .map(|p| {
                let delta = matrices.output_weight(t, &p) as i64 - matrices.input_weight(&p, t) as i64;
                (p, delta)
            })
            .collect();
        drop(matrices);

        let mut pending = Vec::new();
        {
            let places = self.places.read().unwrap();
            for (p, delta) in deltas {
                if delta < 0 {
                    let holder = places
                        .get(&p)
                        .ok_or_else(|| EngineError::UnknownUri(p.clone()))?;
                    holder.consume((-delta) as usize)?;
                } else if delta > 0 {
                    let holder = places
                        .get(&p)
                        .cloned()
                        .ok_or_else(|| EngineError::UnknownUri(p.clone()))?;
                    let amount = delta as usize;
                    pending.push(std::thread::spawn(move || holder.produce(amount)));
                }
            }
        }

        if !join {
            // Dropping the handles detaches the threads: they keep running
            // to completion on their own, just unobserved by this call.
            drop(pending);
            return Ok(None);
        }

        let mut first_err = None;
        for handle in pending {
            match handle.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    if first_err.is_none() {
                        first_err = Some(e);
                    }
                }
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
        if let Some(e) = first_err {
            return Err(e);
        }

        Ok(Some(FireResult {
            transition: t.clone(),
            marking: self.marking(),
        }))
    }

    /// Computes the enabled set, picks one uniformly at random, and fires
    /// it. Returns `Ok(None)` when no transition is enabled. Synchronous:
    /// all production tasks have completed by the time this returns.
    pub fn step(&self) -> Result<Option<FireResult>, EngineError> {
        let mut enabled = self.enabled_transitions();
        if enabled.is_empty() {
            tracing::trace!(net = %self.label, "quiescent");
            return Ok(None);
        }
        enabled.shuffle(&mut rand::thread_rng());
        let chosen = enabled.into_iter().next().expect("checked non-empty above");
        tracing::debug!(net = %self.label, transition = %chosen, "firing");
        self.fire_transition(&chosen, true)
    }

    /// Calls `step()` until no transition is enabled.
    pub fn run_until_quiescent(&self) -> Result<(), EngineError> {
        while self.step()?.is_some() {}
        Ok(())
    }

    /// Fires `transition` directly, bypassing the scheduler's enabled-set
    /// scan and random pick. The caller is responsible for knowing
    /// `transition` is actually enabled; firing one that is not surfaces
    /// the same `Underflow`/`CapacityOverflow` errors the firing-path
    /// assertions raise for a scheduler bug, since from here there is no
    /// way to tell the two apart.
    pub fn fire(&self, transition: &Uri) -> Result<FireResult, EngineError> {
        self.fire_transition(transition, true)
            .map(|result| result.expect("join=true always yields a completed marking"))
    }

    /// Computes the enabled set, picks one uniformly at random, and fires
    /// it *without* awaiting its production threads — genuinely
    /// asynchronous, per spec.md §4.5's "production may be delayed by a
    /// task...so it is parallelized" and §4.9's "Asynchronous: step
    /// returns without awaiting." Returns `Ok(true)` if a transition fired,
    /// `Ok(false)` if the net was quiescent. Used by [`crate::driver::AsyncDriver`];
    /// no intermediate marking is available since production may still be
    /// in flight when this returns.
    pub(crate) fn step_detached(&self) -> Result<bool, EngineError> {
        let mut enabled = self.enabled_transitions();
        if enabled.is_empty() {
            tracing::trace!(net = %self.label, "quiescent");
            return Ok(false);
        }
        enabled.shuffle(&mut rand::thread_rng());
        let chosen = enabled.into_iter().next().expect("checked non-empty above");
        tracing::debug!(net = %self.label, transition = %chosen, "firing (detached)");
        self.fire_transition(&chosen, false)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    #[test]
    fn a_transition_with_no_inputs_or_outputs_is_never_enabled() {
        let net = Net::new("N");
        let t = net.create_transition(None).unwrap();
        assert!(!net.enabled_transitions().contains(&t));
        let p = net.create_place(None, 1, None, None).unwrap();
        net.connect(&p, &t, w(1)).unwrap();
        // Input-only: still not enabled, it has no output.
        assert!(!net.enabled_transitions().contains(&t));
    }

    #[test]
    fn capacity_bounded_place_blocks_enabling() {
        let net = Net::new("N");
        let p = net.create_place(None, 1, None, Some(1)).unwrap();
        let t_out = net.create_transition(None).unwrap();
        let t_in = net.create_transition(None).unwrap();
        net.connect(&p, &t_out, w(1)).unwrap();
        net.connect(&t_out, &p, w(1)).unwrap();
        // A second producer into the already-full place is never enabled.
        let seed = net.create_place(None, 1, None, None).unwrap();
        net.connect(&seed, &t_in, w(1)).unwrap();
        net.connect(&t_in, &p, w(1)).unwrap();
        assert!(!net.enabled_transitions().contains(&t_in));
        assert!(net.enabled_transitions().contains(&t_out));
    }

    #[test]
    fn connect_rejects_duplicate_arcs_and_kind_mismatches() {
        let net = Net::new("N");
        let p = net.create_place(None, 0, None, None).unwrap();
        let t = net.create_transition(None).unwrap();
        let p2 = net.create_place(None, 0, None, None).unwrap();
        net.connect(&p, &t, w(1)).unwrap();
        assert!(matches!(
            net.connect(&p, &t, w(1)),
            Err(EngineError::ArcExists { .. })
        ));
        assert!(matches!(
            net.connect(&p, &p2, w(1)),
            Err(EngineError::KindMismatch { .. })
        ));
    }

    #[test]
    fn embed_namespaces_child_uris_with_a_dotted_suffix() {
        let child = Arc::new(Net::new("Child"));
        let cp = child.create_place(Some("P0"), 1, None, None).unwrap();
        let ct = child.create_transition(Some("T0")).unwrap();
        child.connect(&cp, &ct, w(1)).unwrap();

        let parent = Net::new("Parent");
        parent.embed(child).unwrap();
        assert_eq!(parent.tokens(&Uri::new("P0.Child")).unwrap(), 1);
        assert!(parent.enabled_transitions().is_empty()); // T0 has no output
        assert!(parent.place_order().contains(&Uri::new("P0.Child")));
        let _ = ct; // silence unused in case of future refactors
    }

    #[test]
    fn embedding_the_same_subnet_label_twice_is_rejected() {
        let make_child = || {
            let c = Net::new("Child");
            c.create_place(Some("P0"), 0, None, None).unwrap();
            Arc::new(c)
        };
        let parent = Net::new("Parent");
        parent.embed(make_child()).unwrap();
        assert!(matches!(
            parent.embed(make_child()),
            Err(EngineError::DuplicateSubnet(_))
        ));
    }

    #[test]
    fn a_collision_partway_through_embed_leaves_nothing_committed() {
        // "A.Child" is pre-minted: the parent already owns it, so it will
        // collide with the child's place of the same name, but only once
        // the embed loop reaches it. "Z0.Child" mints first (Z0 is first
        // alphabetically is irrelevant; what matters is that at least one
        // other child place/transition is processed in the same call).
        let parent = Net::new("Parent");
        parent.create_place(Some("A.Child"), 0, None, None).unwrap();

        let child = Arc::new(Net::new("Child"));
        child.create_place(Some("Z0"), 5, None, None).unwrap();
        child.create_place(Some("A"), 1, None, None).unwrap();
        child.create_transition(Some("T0")).unwrap();

        assert!(matches!(
            parent.embed(child),
            Err(EngineError::DuplicateUri(_))
        ));

        // None of the child's nodes made it in, not even the ones whose
        // minted URI didn't collide.
        assert!(!parent.place_order().contains(&Uri::new("Z0.Child")));
        assert!(!parent.transition_order().contains(&Uri::new("T0.Child")));
        // And the parent's own pre-existing place is untouched.
        assert_eq!(parent.tokens(&Uri::new("A.Child")).unwrap(), 0);
    }

    #[test]
    fn firing_conserves_tokens_by_incidence() {
        let net = Net::new("N");
        let p0 = net.create_place(None, 1, None, None).unwrap();
        let t = net.create_transition(None).unwrap();
        let p1 = net.create_place(None, 0, None, None).unwrap();
        net.connect(&p0, &t, w(1)).unwrap();
        net.connect(&t, &p1, w(1)).unwrap();
        let result = net.step().unwrap().expect("one transition is enabled");
        assert_eq!(result.transition, t);
        assert_eq!(net.tokens(&p0).unwrap(), 0);
        assert_eq!(net.tokens(&p1).unwrap(), 1);
    }

    #[test]
    fn step_detached_returns_before_a_slow_production_task_completes() {
        use std::time::{Duration, Instant};

        let net = Net::new("N");
        let p0 = net.create_place(None, 1, None, None).unwrap();
        let t = net.create_transition(None).unwrap();
        let slow_task: Task = Box::new(|| std::thread::sleep(Duration::from_millis(200)));
        let p1 = net.create_place(None, 0, Some(slow_task), None).unwrap();
        net.connect(&p0, &t, w(1)).unwrap();
        net.connect(&t, &p1, w(1)).unwrap();

        let start = Instant::now();
        assert!(net.step_detached().unwrap());
        assert!(
            start.elapsed() < Duration::from_millis(100),
            "step_detached must not wait for the production task's sleep"
        );
        // The consumption side is still synchronous: the source is already
        // drained even though the slow task may not have finished yet.
        assert_eq!(net.tokens(&p0).unwrap(), 0);

        // Eventually the detached task does complete.
        std::thread::sleep(Duration::from_millis(300));
        assert_eq!(net.tokens(&p1).unwrap(), 1);
    }
}
