//! Per-rank numbers of the reference abilities.
//!
//! Every ability in the reference catalog exists in several ranks; a unit
//! uses the highest rank its level allows. The tables here carry the raw
//! numbers only. How a rank turns into an [`AbilityDefinition`] lives with
//! the class that owns the ability.
//!
//! [`AbilityDefinition`]: sim_core::AbilityDefinition

/// Numbers of one rank of one ability.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rank {
    pub rank: u32,
    /// Lowest unit level that can use this rank.
    pub level: u32,
    /// Direct magnitude range. Periodic spells use `base_min` per tick.
    pub base_min: f64,
    pub base_max: f64,
    /// Fraction of spell or attack power added (per tick for periodic spells).
    pub coefficient: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub cost: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub threat: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub ticks: u32,
}

impl Rank {
    pub const fn new(rank: u32, level: u32, base_min: f64, base_max: f64, coefficient: f64) -> Self {
        Self {
            rank,
            level,
            base_min,
            base_max,
            coefficient,
            cost: 0.0,
            threat: 0.0,
            ticks: 0,
        }
    }

    pub const fn costing(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    pub const fn with_threat(mut self, threat: f64) -> Self {
        self.threat = threat;
        self
    }

    pub const fn with_ticks(mut self, ticks: u32) -> Self {
        self.ticks = ticks;
        self
    }
}

/// Highest rank usable at `level`, if any.
pub fn highest_rank(ranks: &[Rank], level: u32) -> Option<&Rank> {
    ranks
        .iter()
        .filter(|rank| rank.level <= level)
        .max_by_key(|rank| rank.rank)
}

/// Rank tables of every reference ability.
///
/// `Default` yields the built-in reference numbers; a RON table file may
/// override any subset of them.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RankTables {
    pub searing_pain: Vec<Rank>,
    pub drain_life: Vec<Rank>,
    pub life_tap: Vec<Rank>,
    pub corruption: Vec<Rank>,
    pub battle_shout: Vec<Rank>,
    pub heroic_strike: Vec<Rank>,
}

impl Default for RankTables {
    fn default() -> Self {
        Self {
            searing_pain: vec![
                Rank::new(1, 18, 38.0, 47.0, 0.396).costing(45.0),
                Rank::new(2, 26, 65.0, 77.0, 0.429).costing(68.0),
                Rank::new(3, 36, 93.0, 112.0, 0.429).costing(91.0),
                Rank::new(4, 42, 131.0, 155.0, 0.429).costing(118.0),
                Rank::new(5, 50, 168.0, 199.0, 0.429).costing(141.0),
                Rank::new(6, 58, 208.0, 244.0, 0.429).costing(168.0),
            ],
            drain_life: vec![
                Rank::new(1, 14, 10.0, 10.0, 0.078).costing(55.0).with_ticks(5),
                Rank::new(2, 22, 17.0, 17.0, 0.1).costing(85.0).with_ticks(5),
                Rank::new(3, 30, 29.0, 29.0, 0.1).costing(135.0).with_ticks(5),
                Rank::new(4, 38, 41.0, 41.0, 0.1).costing(185.0).with_ticks(5),
                Rank::new(5, 46, 55.0, 55.0, 0.1).costing(240.0).with_ticks(5),
                Rank::new(6, 54, 71.0, 71.0, 0.1).costing(300.0).with_ticks(5),
            ],
            life_tap: vec![
                Rank::new(1, 6, 30.0, 30.0, 0.68),
                Rank::new(2, 16, 75.0, 75.0, 0.68),
                Rank::new(3, 26, 140.0, 140.0, 0.68),
                Rank::new(4, 36, 220.0, 220.0, 0.68),
                Rank::new(5, 46, 310.0, 310.0, 0.68),
                Rank::new(6, 56, 424.0, 424.0, 0.68),
            ],
            corruption: vec![
                Rank::new(1, 4, 10.0, 10.0, 0.15).costing(35.0).with_ticks(4),
                Rank::new(2, 14, 18.0, 18.0, 0.16).costing(55.0).with_ticks(5),
                Rank::new(3, 24, 37.0, 37.0, 0.16).costing(100.0).with_ticks(6),
                Rank::new(4, 34, 54.0, 54.0, 0.16).costing(160.0).with_ticks(6),
                Rank::new(5, 44, 81.0, 81.0, 0.16).costing(225.0).with_ticks(6),
                Rank::new(6, 54, 111.0, 111.0, 0.16).costing(290.0).with_ticks(6),
                Rank::new(7, 60, 137.0, 137.0, 0.16).costing(340.0).with_ticks(6),
            ],
            battle_shout: vec![
                Rank::new(1, 1, 15.0, 15.0, 0.0).costing(10.0).with_threat(1.0),
                Rank::new(2, 12, 35.0, 35.0, 0.0).costing(10.0).with_threat(12.0),
                Rank::new(3, 22, 55.0, 55.0, 0.0).costing(10.0).with_threat(22.0),
                Rank::new(4, 32, 85.0, 85.0, 0.0).costing(10.0).with_threat(32.0),
                Rank::new(5, 42, 130.0, 130.0, 0.0).costing(10.0).with_threat(42.0),
                Rank::new(6, 52, 185.0, 185.0, 0.0).costing(10.0).with_threat(52.0),
                Rank::new(7, 60, 232.0, 232.0, 0.0).costing(10.0).with_threat(60.0),
            ],
            heroic_strike: vec![
                Rank::new(1, 1, 11.0, 11.0, 0.2).costing(15.0).with_threat(20.0),
                Rank::new(2, 8, 21.0, 21.0, 0.2).costing(15.0).with_threat(39.0),
                Rank::new(3, 16, 32.0, 32.0, 0.2).costing(15.0).with_threat(59.0),
                Rank::new(4, 24, 44.0, 44.0, 0.2).costing(15.0).with_threat(78.0),
                Rank::new(5, 32, 58.0, 58.0, 0.2).costing(15.0).with_threat(98.0),
                Rank::new(6, 40, 80.0, 80.0, 0.2).costing(15.0).with_threat(118.0),
                Rank::new(7, 48, 111.0, 111.0, 0.2).costing(15.0).with_threat(137.0),
                Rank::new(8, 56, 138.0, 138.0, 0.2).costing(15.0).with_threat(145.0),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highest_rank_respects_the_level_limit() {
        let tables = RankTables::default();
        assert_eq!(highest_rank(&tables.searing_pain, 60).map(|r| r.rank), Some(6));
        assert_eq!(highest_rank(&tables.searing_pain, 57).map(|r| r.rank), Some(5));
        assert_eq!(highest_rank(&tables.searing_pain, 17), None);
    }

    #[test]
    fn rank_order_in_the_table_does_not_matter() {
        let mut ranks = RankTables::default().life_tap;
        ranks.reverse();
        assert_eq!(highest_rank(&ranks, 40).map(|r| r.base_min), Some(220.0));
    }
}
