//! Derangement generation: every participant gives to exactly one other
//! participant and receives from exactly one other participant.
//!
//! Receivers are drawn with a Fisher–Yates shuffle and the draw is rejected
//! whenever any giver would be paired with themself. The probability that a
//! uniform permutation is a derangement tends to `1/e`, so the expected
//! number of attempts is below three for every `N >= 2`.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::participant::Participant;

/// Minimum number of participants for which a derangement exists.
pub const MIN_PARTICIPANTS: usize = 2;

/// Safety bound on shuffle attempts before giving up.
pub const MAX_SHUFFLE_ATTEMPTS: u32 = 1000;

/// A single giver → receiver pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Assignment {
    /// The participant buying the gift.
    pub giver: Participant,
    /// The participant receiving the gift.
    pub receiver: Participant,
}

impl Assignment {
    /// Pair a giver with a receiver.
    #[must_use]
    pub fn new(giver: Participant, receiver: Participant) -> Self {
        Self { giver, receiver }
    }
}

/// Generate a random derangement using the thread-local CSPRNG.
///
/// The returned list is ordered like `participants`: entry `i` has
/// `participants[i]` as giver.
///
/// # Errors
/// Returns [`CoreError::InsufficientParticipants`] if fewer than two
/// participants are given, or [`CoreError::AssignmentGeneration`] if the retry
/// bound is exhausted.
pub fn generate(participants: &[Participant]) -> Result<Vec<Assignment>, CoreError> {
    generate_with_rng(participants, &mut rand::thread_rng())
}

/// Generate a random derangement drawing randomness from `rng`.
///
/// # Errors
/// See [`generate`].
pub fn generate_with_rng<R: Rng + ?Sized>(
    participants: &[Participant],
    rng: &mut R,
) -> Result<Vec<Assignment>, CoreError> {
    generate_with(participants, MAX_SHUFFLE_ATTEMPTS, |indices| indices.shuffle(&mut *rng))
}

/// Core retry loop, parameterised over the permutation source.
fn generate_with(
    participants: &[Participant],
    max_attempts: u32,
    mut permute: impl FnMut(&mut [usize]),
) -> Result<Vec<Assignment>, CoreError> {
    let n = participants.len();
    if n < MIN_PARTICIPANTS {
        return Err(CoreError::InsufficientParticipants { required: MIN_PARTICIPANTS, actual: n });
    }

    let mut receivers: Vec<usize> = (0..n).collect();
    for _ in 0..max_attempts {
        permute(&mut receivers);
        if is_derangement(&receivers) {
            return Ok(receivers
                .iter()
                .enumerate()
                .map(|(giver, &receiver)| {
                    Assignment::new(participants[giver].clone(), participants[receiver].clone())
                })
                .collect());
        }
    }
    Err(CoreError::AssignmentGeneration { attempts: max_attempts })
}

/// `true` if no position maps to itself.
#[must_use]
pub fn is_derangement(permutation: &[usize]) -> bool {
    permutation.iter().enumerate().all(|(i, &p)| i != p)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn people(n: usize) -> Vec<Participant> {
        (0..n)
            .map(|i| match Participant::new(&format!("Person {i}"), &format!("p{i}@x.com"), i == 0) {
                Ok(p) => p,
                Err(e) => panic!("fixture participant invalid: {e}"),
            })
            .collect()
    }

    #[test]
    fn generate_rejects_zero_and_one_participant() {
        for n in 0..MIN_PARTICIPANTS {
            let result = generate(&people(n));
            assert!(
                matches!(result, Err(CoreError::InsufficientParticipants { actual, .. }) if actual == n),
                "N={n} must be rejected"
            );
        }
    }

    #[test]
    fn generate_two_participants_is_mutual_swap() {
        let group = people(2);
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let assignments = match generate_with_rng(&group, &mut rng) {
                Ok(a) => a,
                Err(e) => panic!("unexpected error: {e}"),
            };
            assert_eq!(assignments[0].giver, group[0]);
            assert_eq!(assignments[0].receiver, group[1]);
            assert_eq!(assignments[1].giver, group[1]);
            assert_eq!(assignments[1].receiver, group[0]);
        }
    }

    #[test]
    fn generate_with_identity_permutation_exhausts_retry_bound() {
        let result = generate_with(&people(3), 5, |_| {});
        assert!(
            matches!(result, Err(CoreError::AssignmentGeneration { attempts: 5 })),
            "an identity permutation source must hit the retry bound"
        );
    }

    #[test]
    fn is_derangement_detects_fixed_points() {
        assert!(is_derangement(&[1, 0]));
        assert!(is_derangement(&[1, 2, 0]));
        assert!(!is_derangement(&[0, 2, 1]));
        assert!(is_derangement(&[]));
    }

    proptest::proptest! {
        #[test]
        fn proptest_generate_is_fixed_point_free_bijection(
            n in MIN_PARTICIPANTS..40usize,
            seed in proptest::prelude::any::<u64>(),
        ) {
            let group = people(n);
            let mut rng = StdRng::seed_from_u64(seed);
            let assignments = generate_with_rng(&group, &mut rng);
            proptest::prop_assert!(assignments.is_ok());
            let assignments = assignments.unwrap_or_default();

            proptest::prop_assert_eq!(assignments.len(), n);
            let givers: HashSet<_> = assignments.iter().map(|a| a.giver.name.clone()).collect();
            let receivers: HashSet<_> = assignments.iter().map(|a| a.receiver.name.clone()).collect();
            proptest::prop_assert_eq!(givers.len(), n, "every participant gives exactly once");
            proptest::prop_assert_eq!(receivers.len(), n, "every participant receives exactly once");
            for a in &assignments {
                proptest::prop_assert_ne!(&a.giver, &a.receiver, "nobody may draw themself");
            }
            for (i, a) in assignments.iter().enumerate() {
                proptest::prop_assert_eq!(&a.giver, &group[i], "givers keep input order");
            }
        }
    }
}
