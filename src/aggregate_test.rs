use super::*;

fn peers(entries: &[(&str, &[f64])]) -> PeerMap {
    entries.iter().map(|(id, v)| ((*id).to_owned(), v.to_vec())).collect()
}

fn assert_close(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len(), "{actual:?} vs {expected:?}");
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 1e-4, "{actual:?} vs {expected:?}");
    }
}

#[test]
fn mean_of_local_and_two_peers() {
    let map = peers(&[("a", &[1.0, 0.0, 0.0]), ("b", &[0.0, 1.0, 0.0])]);
    let cue = compute_cue(&[1.0, 0.0, 0.0], &map);
    assert_close(&cue, &[0.6667, 0.3333, 0.0]);
}

#[test]
fn mismatched_length_peer_is_excluded() {
    let map = peers(&[("a", &[0.0, 1.0, 0.0]), ("stale", &[1.0, 1.0])]);
    let cue = compute_cue(&[1.0, 0.0, 0.0], &map);
    assert_close(&cue, &[0.5, 0.5, 0.0]);
    assert_eq!(usable_peers(&[1.0, 0.0, 0.0], &map).count(), 1);
}

#[test]
fn no_peers_returns_local() {
    let cue = compute_cue(&[0.25, 0.75], &PeerMap::new());
    assert_close(&cue, &[0.25, 0.75]);
}

#[test]
fn empty_local_ignores_non_empty_peers() {
    let map = peers(&[("a", &[1.0])]);
    assert!(compute_cue(&[], &map).is_empty());
    assert_eq!(usable_peers(&[], &map).count(), 0);
}
