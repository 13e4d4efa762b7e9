//! Fuzz target: derangement generation for arbitrary group sizes and seeds.
//!
//! Every result must be a bijection with no participant giving to themself.

#![no_main]

use libfuzzer_sys::fuzz_target;
use rand::rngs::StdRng;
use rand::SeedableRng;
use wichtel_core::{generate_with_rng, Participant};

fuzz_target!(|data: &[u8]| {
    let Some((&size, seed_bytes)) = data.split_first() else {
        return;
    };
    let n = usize::from(size % 64);
    let mut seed = [0u8; 8];
    for (slot, byte) in seed.iter_mut().zip(seed_bytes) {
        *slot = *byte;
    }
    let mut rng = StdRng::seed_from_u64(u64::from_le_bytes(seed));

    let people: Vec<Participant> = (0..n)
        .filter_map(|i| Participant::new(&format!("Person {i}"), &format!("p{i}@example.com"), i == 0).ok())
        .collect();

    match generate_with_rng(&people, &mut rng) {
        Ok(assignments) => {
            assert_eq!(assignments.len(), people.len());
            let mut receivers: Vec<&str> = assignments.iter().map(|a| a.receiver.name.as_str()).collect();
            receivers.sort_unstable();
            receivers.dedup();
            assert_eq!(receivers.len(), people.len(), "receivers must be distinct");
            assert!(assignments.iter().all(|a| a.giver != a.receiver));
        }
        Err(_) => assert!(people.len() < 2),
    }
});
