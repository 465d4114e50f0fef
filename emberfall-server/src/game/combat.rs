use rand::Rng;

use emberfall_data::{ContentCatalog, DamageType};
use emberfall_game_common::components::Character;
use emberfall_game_common::data::Damage;

pub const CRIT_CHANCE_CAP: f32 = 0.75;
pub const CRIT_MULTIPLIER: f32 = 1.5;
pub const MIN_DEFENSE_FACTOR: f32 = 0.1;

/// Base critical chance before skill bonuses.
pub fn base_crit_chance(damage_type: DamageType, dexterity: i32, intellect: i32) -> f32 {
    match damage_type {
        DamageType::Physical => 0.01 + 0.003 * dexterity as f32,
        DamageType::Magical => 0.05 + 0.002 * intellect as f32,
        DamageType::True | DamageType::None => 0.0,
    }
}

/// The symmetric damage formula: crit roll, then defense reduction,
/// floored at 1 so no target is unhittable.
pub fn compute_damage(
    rng: &mut impl Rng,
    raw: f32,
    crit_chance: f32,
    defense: i32,
) -> Damage {
    let crit_chance = crit_chance.clamp(0.0, CRIT_CHANCE_CAP);
    let is_critical = rng.gen::<f32>() < crit_chance;
    let raw = if is_critical {
        raw * CRIT_MULTIPLIER
    } else {
        raw
    };

    let defense = defense.max(0) as f32;
    let reduction = (1.0 - defense / (defense + 100.0)).max(MIN_DEFENSE_FACTOR);
    let amount = (raw * reduction).round().max(1.0) as i32;

    Damage {
        amount,
        is_critical,
    }
}

/// A plain auto-attack from a character, physical by definition.
pub fn character_attack_damage(
    rng: &mut impl Rng,
    character: &Character,
    defense: i32,
) -> Damage {
    let crit_chance = base_crit_chance(
        DamageType::Physical,
        character.basic_stats.dexterity,
        character.basic_stats.intellect,
    );
    compute_damage(
        rng,
        character.derived_stats.attack_power as f32,
        crit_chance,
        defense,
    )
}

/// Kill XP after the catalog's level-difference scaling.
pub fn experience_reward(
    catalog: &ContentCatalog,
    player_level: i32,
    monster_level: i32,
    base_reward: i32,
) -> i64 {
    catalog
        .xp_tables
        .scaled_reward(player_level, monster_level, base_reward)
}

/// Apply earned XP, levelling up as thresholds pass. Returns the
/// number of levels gained; the caller recomputes stats and refills
/// health and mana when this is non-zero.
pub fn apply_experience(catalog: &ContentCatalog, character: &mut Character, earned: i64) -> u32 {
    if earned <= 0 {
        return 0;
    }

    character.experience.0 += earned;
    let mut levels_gained = 0;

    while let Some(needed) = catalog.xp_tables.xp_to_next_level(character.level.0) {
        if character.experience.0 < needed {
            break;
        }
        character.experience.0 -= needed;
        character.level.0 += 1;
        levels_gained += 1;

        if let Some(class) = catalog.classes.get_class(character.info.class) {
            character.status_points.0 += class.status_points_per_level;
            character.basic_stats.strength += class.growth_per_level.strength;
            character.basic_stats.intellect += class.growth_per_level.intellect;
            character.basic_stats.dexterity += class.growth_per_level.dexterity;
            character.basic_stats.vitality += class.growth_per_level.vitality;
        }
    }

    levels_gained
}

/// Seconds between attacks for an attack-speed value, as millis.
pub fn attack_interval_ms(attack_speed: f32) -> i64 {
    (1000.0 / attack_speed.max(0.1)) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn damage_floor_is_one_even_against_huge_defense() {
        let mut rng = StdRng::seed_from_u64(1);
        let damage = compute_damage(&mut rng, 5.0, 0.0, i32::MAX);
        assert_eq!(damage.amount, 1);
    }

    #[test]
    fn defense_reduction_never_drops_below_ten_percent() {
        let mut rng = StdRng::seed_from_u64(1);
        // 1000 raw against defense 10000: capped reduction keeps 10%.
        let damage = compute_damage(&mut rng, 1000.0, 0.0, 10_000);
        assert_eq!(damage.amount, 100);
    }

    #[test]
    fn crit_chance_clamps_at_seventy_five_percent() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut crits = 0;
        let rolls = 10_000;
        for _ in 0..rolls {
            if compute_damage(&mut rng, 100.0, 5.0, 0).is_critical {
                crits += 1;
            }
        }
        let rate = crits as f32 / rolls as f32;
        assert!(rate > 0.70 && rate < 0.80, "crit rate {} out of range", rate);
    }

    #[test]
    fn zero_defense_passes_damage_through() {
        let mut rng = StdRng::seed_from_u64(1);
        let damage = compute_damage(&mut rng, 20.0, 0.0, 0);
        assert_eq!(damage.amount, 20);
        assert!(!damage.is_critical);
    }

    #[test]
    fn crit_multiplies_by_one_point_five() {
        let mut rng = StdRng::seed_from_u64(1);
        let damage = compute_damage(&mut rng, 20.0, 1.0, 0);
        assert!(damage.is_critical);
        assert_eq!(damage.amount, 30);
    }

    #[test]
    fn base_crit_chances_follow_stats() {
        assert!((base_crit_chance(DamageType::Physical, 10, 0) - 0.04).abs() < 1e-6);
        assert!((base_crit_chance(DamageType::Magical, 0, 10) - 0.07).abs() < 1e-6);
        assert_eq!(base_crit_chance(DamageType::True, 50, 50), 0.0);
    }

    #[test]
    fn level_up_consumes_thresholds_and_grants_growth() {
        let catalog = crate::game::world::tests::test_catalog();
        let mut character = crate::game::world::tests::test_character(&catalog);
        let strength_before = character.basic_stats.strength;

        // Table starts at 100 xp for level 1 -> 2.
        let gained = apply_experience(&catalog, &mut character, 120);
        assert_eq!(gained, 1);
        assert_eq!(character.level.0, 2);
        assert_eq!(character.experience.0, 20);
        assert!(character.status_points.0 > 0);
        assert!(character.basic_stats.strength > strength_before);
    }

    #[test]
    fn attack_interval_from_speed() {
        assert_eq!(attack_interval_ms(1.0), 1000);
        assert_eq!(attack_interval_ms(2.0), 500);
    }
}
