//! Shared, read-only registry of ability and aura definitions.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::ability::AbilityDefinition;
use crate::aura::AuraDefinition;
use crate::error::ConfigError;
use crate::ids::{AbilityId, AuraId};

/// Ability and aura definitions shared by every trial of a batch.
///
/// Built once at setup, validated, then wrapped in an `Arc` and never
/// mutated again.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    abilities: BTreeMap<AbilityId, Arc<AbilityDefinition>>,
    auras: BTreeMap<AuraId, Arc<AuraDefinition>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_ability(&mut self, definition: AbilityDefinition) -> Result<(), ConfigError> {
        let ability = definition.id;
        if self.abilities.contains_key(&ability) {
            return Err(ConfigError::DuplicateAbility { ability });
        }
        self.abilities.insert(ability, Arc::new(definition));
        Ok(())
    }

    pub fn add_aura(&mut self, definition: AuraDefinition) -> Result<(), ConfigError> {
        let aura = definition.id;
        if self.auras.contains_key(&aura) {
            return Err(ConfigError::DuplicateAura { aura });
        }
        self.auras.insert(aura, Arc::new(definition));
        Ok(())
    }

    pub fn ability(&self, id: AbilityId) -> Option<&Arc<AbilityDefinition>> {
        self.abilities.get(&id)
    }

    pub fn aura(&self, id: AuraId) -> Option<&Arc<AuraDefinition>> {
        self.auras.get(&id)
    }

    pub fn abilities(&self) -> impl Iterator<Item = &Arc<AbilityDefinition>> {
        self.abilities.values()
    }

    pub fn auras(&self) -> impl Iterator<Item = &Arc<AuraDefinition>> {
        self.auras.values()
    }

    /// Validates every definition and every cross-reference between them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for aura in self.auras.values() {
            aura.validate()?;
        }
        for ability in self.abilities.values() {
            ability.validate()?;
            if let Some(aura) = ability.applies_aura
                && !self.auras.contains_key(&aura)
            {
                return Err(ConfigError::UnknownAura { aura });
            }
        }
        Ok(())
    }
}
