//! Cue aggregation: the coordinate-wise mean of the local vector and every
//! peer vector of the same length.
//!
//! Peers that answered a previous question with a different answer count stay
//! in the map but are skipped here; vectors are never padded or truncated.

use std::collections::HashMap;

/// Latest weight vector per peer, keyed by participant id.
pub type PeerMap = HashMap<String, Vec<f64>>;

/// Peer vectors that can be combined with `local`.
pub fn usable_peers<'a>(local: &'a [f64], peers: &'a PeerMap) -> impl Iterator<Item = &'a [f64]> + 'a {
    peers.values().map(Vec::as_slice).filter(move |v| v.len() == local.len())
}

/// Mean of `local` and every usable peer vector.
///
/// The divisor is one plus the number of usable peers, so an empty peer map
/// returns `local` unchanged.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn compute_cue(local: &[f64], peers: &PeerMap) -> Vec<f64> {
    let mut sum = local.to_vec();
    let mut count = 1usize;
    for peer in usable_peers(local, peers) {
        for (acc, w) in sum.iter_mut().zip(peer) {
            *acc += w;
        }
        count += 1;
    }
    let divisor = count as f64;
    sum.iter_mut().for_each(|w| *w /= divisor);
    sum
}

#[cfg(test)]
#[path = "aggregate_test.rs"]
mod tests;
