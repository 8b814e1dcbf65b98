//! Arrival-time vector utilities.
//!
//! Vectors are indexed by transfer count: component `i` is the best arrival
//! time using at most `i` transfers.

use crate::domain::Timestamp;

use super::profile::ProfileEntry;

/// A vector of `len` infinite arrival times.
pub fn infinity_vector(len: usize) -> Vec<Timestamp> {
    vec![Timestamp::INFINITY; len]
}

/// Component-wise minimum of two vectors.
///
/// The result has the length of the shorter input.
pub fn min_vector(a: &[Timestamp], b: &[Timestamp]) -> Vec<Timestamp> {
    a.iter().zip(b).map(|(x, y)| (*x).min(*y)).collect()
}

/// Shift right by one: infinity enters at index 0 and the last component is
/// dropped.
///
/// Boarding a connection before a transfer costs one transfer, so the option
/// that used `i` transfers now needs `i + 1`.
pub fn shift_vector(v: &[Timestamp]) -> Vec<Timestamp> {
    if v.is_empty() {
        return Vec::new();
    }
    let mut shifted = Vec::with_capacity(v.len());
    shifted.push(Timestamp::INFINITY);
    shifted.extend_from_slice(&v[..v.len() - 1]);
    shifted
}

/// Returns true if every component of `a` is at most the matching component
/// of `b`.
pub fn dominates(a: &[Timestamp], b: &[Timestamp]) -> bool {
    a.iter().zip(b).all(|(x, y)| x <= y)
}

/// Index of the entry to use when departing no earlier than `time`.
///
/// `entries` is sorted by strictly decreasing departure time; this is the
/// entry with the smallest departure time still `>= time`.
pub fn entry_index_at(entries: &[ProfileEntry], time: Timestamp) -> Option<usize> {
    entries.iter().rposition(|e| e.departure_time >= time)
}

/// Evaluate a stop's profile at `time`.
///
/// Falls back to all-infinity when no entry departs late enough.
pub fn eval_profile(entries: &[ProfileEntry], time: Timestamp, len: usize) -> Vec<Timestamp> {
    match entry_index_at(entries, time) {
        Some(i) => entries[i].arrival_times.clone(),
        None => infinity_vector(len),
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn ts(secs: i64) -> Timestamp {
        Timestamp::from_unix_seconds(secs)
    }

    fn v(secs: &[i64]) -> Vec<Timestamp> {
        secs.iter().map(|&s| ts(s)).collect()
    }

    const INF: Timestamp = Timestamp::INFINITY;

    fn entry(dep: Timestamp, arrivals: Vec<Timestamp>) -> ProfileEntry {
        let len = arrivals.len();
        ProfileEntry {
            departure_time: dep,
            arrival_times: arrivals,
            enter_connections: vec![None; len],
            exit_connections: vec![None; len],
        }
    }

    #[test]
    fn min_vector_is_componentwise() {
        assert_eq!(min_vector(&v(&[3, 8, 9]), &v(&[4, 4, 4])), v(&[3, 4, 4]));
        assert_eq!(
            min_vector(&[INF, ts(5)], &[ts(7), INF]),
            vec![ts(7), ts(5)]
        );
    }

    #[test]
    fn shift_vector_inserts_infinity() {
        assert_eq!(shift_vector(&v(&[1, 2, 3])), vec![INF, ts(1), ts(2)]);
        assert_eq!(shift_vector(&v(&[1])), vec![INF]);
        assert!(shift_vector(&[]).is_empty());
    }

    #[test]
    fn dominance() {
        assert!(dominates(&v(&[1, 2]), &v(&[1, 3])));
        assert!(dominates(&v(&[1, 2]), &v(&[1, 2])));
        assert!(!dominates(&v(&[1, 4]), &v(&[2, 3])));
        assert!(dominates(&v(&[1]), &[INF]));
    }

    #[test]
    fn eval_profile_picks_earliest_sufficient_entry() {
        let entries = vec![
            entry(INF, vec![INF, INF]),
            entry(ts(500), v(&[900, 800])),
            entry(ts(300), v(&[700, 600])),
        ];

        assert_eq!(eval_profile(&entries, ts(200), 2), v(&[700, 600]));
        assert_eq!(eval_profile(&entries, ts(300), 2), v(&[700, 600]));
        assert_eq!(eval_profile(&entries, ts(301), 2), v(&[900, 800]));
        assert_eq!(eval_profile(&entries, ts(501), 2), vec![INF, INF]);
        assert_eq!(entry_index_at(&entries, ts(400)), Some(1));
    }

    #[test]
    fn eval_empty_profile() {
        assert_eq!(eval_profile(&[], ts(0), 3), infinity_vector(3));
        assert_eq!(entry_index_at(&[], ts(0)), None);
    }

    fn timestamps(len: usize) -> impl Strategy<Value = Vec<Timestamp>> {
        prop::collection::vec(
            prop_oneof![4 => (0i64..10_000).prop_map(Timestamp::from_unix_seconds), 1 => Just(INF)],
            len,
        )
    }

    proptest! {
        #[test]
        fn min_vector_dominates_both(a in timestamps(5), b in timestamps(5)) {
            let m = min_vector(&a, &b);
            prop_assert!(dominates(&m, &a));
            prop_assert!(dominates(&m, &b));
            for i in 0..5 {
                prop_assert!(m[i] == a[i] || m[i] == b[i]);
            }
        }

        #[test]
        fn shift_preserves_length(a in timestamps(4)) {
            let s = shift_vector(&a);
            prop_assert_eq!(s.len(), a.len());
            prop_assert_eq!(s[0], INF);
            prop_assert_eq!(&s[1..], &a[..3]);
        }

        #[test]
        fn dominance_is_transitive(a in timestamps(3), b in timestamps(3), c in timestamps(3)) {
            if dominates(&a, &b) && dominates(&b, &c) {
                prop_assert!(dominates(&a, &c));
            }
        }
    }
}
