mod active_effects;
mod basic_stats;
mod character;
mod inventory;
mod position;
mod skill_list;

pub use active_effects::{ActiveEffect, ActiveEffects, EffectSource};
pub use basic_stats::{BasicStats, DerivedStats};
pub use character::{
    Character, CharacterInfo, ExperiencePoints, HealthPoints, Level, ManaPoints, StatusPoints,
};
pub use inventory::{Equipment, Inventory, ItemInstance, DEFAULT_INVENTORY_SLOTS};
pub use position::WorldPosition;
pub use skill_list::{LearnedSkill, SkillList, UNSLOTTED};
