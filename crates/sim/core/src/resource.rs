//! Resource pools.
//!
//! A unit carries at most one pool per [`ResourceKind`]. Quantities are clamped
//! to `[0, max]`. Spending is all-or-nothing: a spend that cannot be covered
//! fails before touching the pool, and callers check affordability before
//! committing any other side effect.

use std::time::Duration;

use arrayvec::ArrayVec;

use crate::config::SimConfig;

// ============================================================================
// Resource Kind
// ============================================================================

/// Kinds of tracked quantities.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::IntoStaticStr,
    strum::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ResourceKind {
    Health,
    Mana,
    /// Starts empty for most units and is generated by combat actions.
    Rage,
    Energy,
}

/// Price of an ability.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResourceCost {
    pub kind: ResourceKind,
    pub amount: f64,
}

impl ResourceCost {
    pub const fn new(kind: ResourceKind, amount: f64) -> Self {
        Self { kind, amount }
    }
}

/// Spend rejected because the pool holds less than the cost.
#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[error("insufficient {kind}: need {required}, have {available}")]
pub struct InsufficientResource {
    pub kind: ResourceKind,
    pub required: f64,
    pub available: f64,
}

// ============================================================================
// Regeneration
// ============================================================================

/// Passive regeneration, applied as a recurring low-priority event.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegenConfig {
    pub interval: Duration,
    pub amount: f64,
}

impl RegenConfig {
    pub fn is_valid(&self) -> bool {
        !self.interval.is_zero() && self.amount.is_finite() && self.amount >= 0.0
    }
}

/// Declarative description of a pool, as supplied by unit configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResourcePoolConfig {
    pub kind: ResourceKind,
    pub max: f64,
    pub start: f64,
    pub regen: Option<RegenConfig>,
}

impl ResourcePoolConfig {
    /// A pool that starts full.
    pub fn full(kind: ResourceKind, max: f64) -> Self {
        Self {
            kind,
            max,
            start: max,
            regen: None,
        }
    }

    pub fn with_start(mut self, start: f64) -> Self {
        self.start = start;
        self
    }

    pub fn with_regen(mut self, interval: Duration, amount: f64) -> Self {
        self.regen = Some(RegenConfig { interval, amount });
        self
    }

    pub fn is_valid(&self) -> bool {
        self.max.is_finite() && self.max > 0.0 && (0.0..=self.max).contains(&self.start)
    }
}

// ============================================================================
// Resource Pool
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResourcePool {
    kind: ResourceKind,
    current: f64,
    max: f64,
    regen: Option<RegenConfig>,
}

impl ResourcePool {
    pub fn from_config(config: &ResourcePoolConfig) -> Self {
        Self {
            kind: config.kind,
            current: config.start.clamp(0.0, config.max),
            max: config.max,
            regen: config.regen,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn regen(&self) -> Option<RegenConfig> {
        self.regen
    }

    pub fn is_empty(&self) -> bool {
        self.current <= 0.0
    }

    pub fn can_afford(&self, amount: f64) -> bool {
        self.current >= amount
    }

    /// Removes `amount` from the pool. Leaves the pool untouched on failure.
    pub fn spend(&mut self, amount: f64) -> Result<f64, InsufficientResource> {
        if !self.can_afford(amount) {
            return Err(InsufficientResource {
                kind: self.kind,
                required: amount,
                available: self.current,
            });
        }
        self.current = (self.current - amount).clamp(0.0, self.max);
        Ok(amount)
    }

    /// Adds `amount`, clamped at the maximum. Returns the amount actually gained.
    pub fn restore(&mut self, amount: f64) -> f64 {
        let before = self.current;
        self.current = (self.current + amount.max(0.0)).min(self.max);
        self.current - before
    }

    /// Removes up to `amount` without failing. Returns the amount actually
    /// removed. Used for incoming damage against a health pool.
    pub fn drain(&mut self, amount: f64) -> f64 {
        let before = self.current;
        self.current = (self.current - amount.max(0.0)).max(0.0);
        before - self.current
    }
}

/// All pools of one unit, one per kind.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResourcePools {
    pools: ArrayVec<ResourcePool, { SimConfig::MAX_RESOURCE_POOLS }>,
}

impl ResourcePools {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a pool. Returns `false` if a pool of that kind already exists or
    /// the unit already carries the maximum number of pools.
    pub fn insert(&mut self, pool: ResourcePool) -> bool {
        if self.get(pool.kind).is_some() || self.pools.is_full() {
            return false;
        }
        self.pools.push(pool);
        true
    }

    pub fn get(&self, kind: ResourceKind) -> Option<&ResourcePool> {
        self.pools.iter().find(|pool| pool.kind == kind)
    }

    pub fn get_mut(&mut self, kind: ResourceKind) -> Option<&mut ResourcePool> {
        self.pools.iter_mut().find(|pool| pool.kind == kind)
    }

    pub fn current(&self, kind: ResourceKind) -> Option<f64> {
        self.get(kind).map(ResourcePool::current)
    }

    /// Whether `cost` can be paid. A cost against a missing pool is never affordable.
    pub fn can_afford(&self, cost: &ResourceCost) -> bool {
        self.get(cost.kind)
            .is_some_and(|pool| pool.can_afford(cost.amount))
    }

    pub fn spend(&mut self, cost: &ResourceCost) -> Result<f64, InsufficientResource> {
        match self.get_mut(cost.kind) {
            Some(pool) => pool.spend(cost.amount),
            None => Err(InsufficientResource {
                kind: cost.kind,
                required: cost.amount,
                available: 0.0,
            }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourcePool> {
        self.pools.iter()
    }
}
