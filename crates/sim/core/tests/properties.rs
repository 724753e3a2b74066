use std::time::Duration;

use proptest::prelude::*;
use sim_core::{
    Advance, EventPriority, ModifierGroup, ModifierSet, Scheduler, SimTime, trial_seed,
};

fn build(additive: &[f64], multiplicative: &[f64], flat: f64) -> ModifierSet {
    let mut set = ModifierSet::new();
    set.add_flat(flat);
    for &value in additive {
        set.add_additive(value);
    }
    for &value in multiplicative {
        set.add_multiplicative(value);
    }
    set
}

proptest! {
    #[test]
    fn modifier_order_within_a_group_does_not_matter(
        additive in prop::collection::vec(-0.5f64..2.0, 0..8),
        multiplicative in prop::collection::vec(0.1f64..3.0, 0..8),
        flat in 0.0f64..500.0,
        base in 0.0f64..5_000.0,
        rotate in 0usize..8,
    ) {
        let forward = build(&additive, &multiplicative, flat);

        let mut additive_shuffled = additive.clone();
        additive_shuffled.reverse();
        let mut multiplicative_shuffled = multiplicative.clone();
        if !multiplicative_shuffled.is_empty() {
            let len = multiplicative_shuffled.len();
            multiplicative_shuffled.rotate_left(rotate % len);
        }
        let shuffled = build(&additive_shuffled, &multiplicative_shuffled, flat);

        // Bit-identical, not merely close.
        prop_assert_eq!(forward.resolve(base).to_bits(), shuffled.resolve(base).to_bits());
    }

    #[test]
    fn groups_resolve_add_then_multiply_however_they_are_interleaved(
        modifiers in prop::collection::vec((any::<bool>(), 0.0f64..2.0), 0..12),
        flat in 0.0f64..500.0,
        base in 0.0f64..5_000.0,
    ) {
        let mut interleaved = ModifierSet::new();
        interleaved.add_flat(flat);
        let mut additive = Vec::new();
        let mut multiplicative = Vec::new();
        for &(is_additive, value) in &modifiers {
            if is_additive {
                interleaved.add(ModifierGroup::Additive, value);
                additive.push(value);
            } else {
                interleaved.add(ModifierGroup::Multiplicative, 1.0 + value);
                multiplicative.push(1.0 + value);
            }
        }
        let grouped = build(&additive, &multiplicative, flat);
        prop_assert_eq!(interleaved.resolve(base).to_bits(), grouped.resolve(base).to_bits());

        let expected = (base + flat)
            * (1.0 + interleaved.additive_sum())
            * interleaved.multiplicative_product();
        prop_assert!((interleaved.resolve(base) - expected).abs() <= 1e-9 * expected.max(1.0));
    }

    #[test]
    fn additive_bonuses_do_not_compound_like_multipliers(
        first in 0.01f64..1.0,
        second in 0.01f64..1.0,
        multiplier in 1.1f64..3.0,
        base in 1.0f64..5_000.0,
    ) {
        let summed = build(&[first, second], &[multiplier], 0.0).resolve(base);
        let compounded = build(&[], &[1.0 + first, 1.0 + second, multiplier], 0.0).resolve(base);
        prop_assert!(summed < compounded);

        // Swapping one bonus between groups changes the outcome too.
        let moved = build(&[first], &[1.0 + second, multiplier], 0.0).resolve(base);
        prop_assert!(summed < moved);
    }

    #[test]
    fn scheduler_never_runs_backwards(
        delays in prop::collection::vec((0u64..10_000, -20i32..20), 1..64),
    ) {
        let mut scheduler = Scheduler::new();
        for (index, &(millis, priority)) in delays.iter().enumerate() {
            scheduler.schedule(Duration::from_millis(millis), EventPriority(priority), index);
        }

        let mut last: Option<(SimTime, EventPriority)> = None;
        let mut fired = 0;
        while let Advance::Fired(event) = scheduler.advance() {
            if let Some(previous) = last {
                prop_assert!(previous <= (event.fires_at, event.priority));
            }
            last = Some((event.fires_at, event.priority));
            fired += 1;
        }
        prop_assert_eq!(fired, delays.len());
    }

    #[test]
    fn neighbouring_trials_get_distinct_seeds(master in any::<u64>(), index in 0u64..u64::MAX) {
        prop_assert_ne!(trial_seed(master, index), trial_seed(master, index + 1));
    }
}
