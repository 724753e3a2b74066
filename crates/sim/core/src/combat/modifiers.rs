//! Modifier composition.
//!
//! Every magnitude in the simulator (direct damage, periodic ticks, heals,
//! resource restores) goes through the same stack:
//!
//! ```text
//! result = (base + flat) × (1 + Σ additive) × Π multiplicative
//! ```
//!
//! Additive entries model bonuses from the same source stacking linearly
//! (several talent ranks of one kind); multiplicative entries model
//! independent systems stacking geometrically. The two groups never commute:
//! the additive sum is always collapsed before multiplicative factors apply.
//!
//! Within each group the result does not depend on insertion order. Entries
//! are folded in sorted order, so two sets holding the same values produce the
//! same bits regardless of the order the values were pushed.

/// Which modifier group a contribution belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModifierGroup {
    /// `+0.1` means +10%, summed with the rest of the group.
    Additive,
    /// `1.1` means ×1.1, multiplied with the rest of the group.
    Multiplicative,
}

/// How a critical multiplier joins the modifier stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CritOrdering {
    /// `(base + flat) × crit × (1 + Σ additive) × Π multiplicative`
    #[default]
    BeforeModifiers,
    /// `(base + flat) × (1 + Σ additive + (crit − 1)) × Π multiplicative`
    WithAdditive,
}

/// A collection of modifiers applied in the fixed composition order.
///
/// # Example
/// ```
/// # use sim_core::combat::ModifierSet;
/// let mut mods = ModifierSet::new();
/// mods.add_additive(0.1);
/// mods.add_additive(0.2);
/// mods.add_multiplicative(1.5);
///
/// // (100) × (1 + 0.3) × 1.5
/// assert!((mods.resolve(100.0) - 195.0).abs() < 1e-9);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModifierSet {
    flat: f64,
    additive: Vec<f64>,
    multiplicative: Vec<f64>,
}

impl ModifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_flat(&mut self, value: f64) {
        self.flat += value;
    }

    pub fn add_additive(&mut self, value: f64) {
        self.additive.push(value);
    }

    pub fn add_multiplicative(&mut self, factor: f64) {
        self.multiplicative.push(factor);
    }

    pub fn add(&mut self, group: ModifierGroup, value: f64) {
        match group {
            ModifierGroup::Additive => self.add_additive(value),
            ModifierGroup::Multiplicative => self.add_multiplicative(value),
        }
    }

    /// Merges another set into this one.
    pub fn extend(&mut self, other: &ModifierSet) {
        self.flat += other.flat;
        self.additive.extend_from_slice(&other.additive);
        self.multiplicative.extend_from_slice(&other.multiplicative);
    }

    pub fn flat(&self) -> f64 {
        self.flat
    }

    /// Σ additive, folded in sorted order.
    pub fn additive_sum(&self) -> f64 {
        sorted(&self.additive).into_iter().sum()
    }

    /// Π multiplicative, folded in sorted order.
    pub fn multiplicative_product(&self) -> f64 {
        sorted(&self.multiplicative).into_iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.flat == 0.0 && self.additive.is_empty() && self.multiplicative.is_empty()
    }

    /// Applies the stack to `base`.
    pub fn resolve(&self, base: f64) -> f64 {
        resolve(base, &self.additive, &self.multiplicative, self.flat)
    }

    /// Applies the stack to `base` with a critical multiplier folded in
    /// according to `ordering`.
    pub fn resolve_critical(&self, base: f64, crit_multiplier: f64, ordering: CritOrdering) -> f64 {
        let scaled = base + self.flat;
        match ordering {
            CritOrdering::BeforeModifiers => {
                scaled * crit_multiplier * (1.0 + self.additive_sum()) * self.multiplicative_product()
            }
            CritOrdering::WithAdditive => {
                scaled
                    * (1.0 + self.additive_sum() + (crit_multiplier - 1.0))
                    * self.multiplicative_product()
            }
        }
    }
}

/// `(base + flat) × (1 + Σ additive) × Π multiplicative`.
///
/// The order of operations is a hard contract; reordering the groups changes
/// numeric outcomes.
pub fn resolve(base: f64, additive: &[f64], multiplicative: &[f64], flat: f64) -> f64 {
    let additive_sum: f64 = sorted(additive).into_iter().sum();
    let product: f64 = sorted(multiplicative).into_iter().product();
    (base + flat) * (1.0 + additive_sum) * product
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut values = values.to_vec();
    values.sort_by(f64::total_cmp);
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn reference_composition() {
        let value = resolve(100.0, &[0.1, 0.2], &[1.5], 0.0);
        assert!(approx(value, 195.0), "got {value}");
    }

    #[test]
    fn flat_bonus_applies_before_both_groups() {
        // (80 + 20) × 1.3 × 1.5
        let value = resolve(80.0, &[0.3], &[1.5], 20.0);
        assert!(approx(value, 195.0));
    }

    #[test]
    fn groups_do_not_commute() {
        // Treating ×1.5 as +0.5 gives a different answer than the contract.
        let contract = resolve(100.0, &[0.2], &[1.5], 0.0);
        let wrong = resolve(100.0, &[0.2, 0.5], &[], 0.0);
        assert!(approx(contract, 180.0));
        assert!(approx(wrong, 170.0));
    }

    #[test]
    fn empty_set_is_identity() {
        let mods = ModifierSet::new();
        assert!(mods.is_empty());
        assert_eq!(mods.resolve(42.5), 42.5);
    }

    #[test]
    fn crit_orderings_differ_once_additive_bonuses_exist() {
        let mut mods = ModifierSet::new();
        mods.add_additive(0.3);
        mods.add_multiplicative(1.5);

        let before = mods.resolve_critical(100.0, 2.0, CritOrdering::BeforeModifiers);
        let with_additive = mods.resolve_critical(100.0, 2.0, CritOrdering::WithAdditive);
        assert!(approx(before, 390.0), "got {before}");
        assert!(approx(with_additive, 345.0), "got {with_additive}");
    }

    #[test]
    fn crit_orderings_agree_without_additive_bonuses() {
        let mut mods = ModifierSet::new();
        mods.add_multiplicative(1.2);
        let before = mods.resolve_critical(50.0, 1.5, CritOrdering::BeforeModifiers);
        let with_additive = mods.resolve_critical(50.0, 1.5, CritOrdering::WithAdditive);
        assert!(approx(before, with_additive));
    }

    #[test]
    fn extend_merges_all_groups() {
        let mut a = ModifierSet::new();
        a.add_flat(5.0);
        a.add_additive(0.1);
        let mut b = ModifierSet::new();
        b.add_flat(5.0);
        b.add_multiplicative(2.0);

        a.extend(&b);
        assert_eq!(a.flat(), 10.0);
        assert!(approx(a.resolve(10.0), 20.0 * 1.1 * 2.0));
    }
}
