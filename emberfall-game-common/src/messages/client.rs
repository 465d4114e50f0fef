use serde::{Deserialize, Serialize};

use emberfall_data::{EquipmentSlot, SkillId, SkillTargetType, StatKind};

use crate::components::WorldPosition;
use crate::ids::{CharacterId, ItemInstanceId, MonsterInstanceId};

/// Every inbound frame is a JSON object whose `type` field selects the
/// variant. The gateway decodes to `serde_json::Value` first so an
/// unknown `type` can be logged and dropped without failing the
/// session.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    Ping {
        #[serde(default)]
        time: Option<i64>,
    },
    #[serde(rename_all = "camelCase")]
    Login { username: String, password: String },
    #[serde(rename_all = "camelCase")]
    Register { username: String, password: String },
    ListCharacters,
    #[serde(rename_all = "camelCase")]
    CreateCharacter {
        name: String,
        race: String,
        class: String,
    },
    #[serde(rename_all = "camelCase")]
    SelectCharacter { character_id: CharacterId },
    #[serde(rename_all = "camelCase")]
    DeleteCharacter { character_id: CharacterId },
    #[serde(rename_all = "camelCase")]
    MoveRequest { target_position: WorldPosition },
    #[serde(rename_all = "camelCase")]
    AttackMonster { monster_id: MonsterInstanceId },
    #[serde(rename_all = "camelCase")]
    UseSkill {
        skill_id: SkillId,
        #[serde(default)]
        slot_number: Option<u8>,
        #[serde(default)]
        target_id: Option<MonsterInstanceId>,
        #[serde(default)]
        target_type: Option<SkillTargetType>,
        #[serde(default)]
        target_position: Option<WorldPosition>,
    },
    CancelCast,
    #[serde(rename_all = "camelCase")]
    LearnSkill { skill_id: SkillId, slot_number: u8 },
    #[serde(rename_all = "camelCase")]
    LevelUpSkill { skill_id: SkillId },
    GetSkills,
    GetSkillList,
    GetInventory,
    #[serde(rename_all = "camelCase")]
    UseItem { instance_id: ItemInstanceId },
    #[serde(rename_all = "camelCase")]
    EquipItem { instance_id: ItemInstanceId },
    #[serde(rename_all = "camelCase")]
    UnequipItem { slot: EquipmentSlot },
    #[serde(rename_all = "camelCase")]
    DropItem {
        instance_id: ItemInstanceId,
        quantity: u32,
    },
    Respawn,
    #[serde(rename_all = "camelCase")]
    AddStatusPoint { stat: StatKind },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_tagged_message() {
        let message: ClientMessage =
            serde_json::from_str(r#"{"type": "login", "username": "alice", "password": "hunter7"}"#)
                .unwrap();
        assert_eq!(
            message,
            ClientMessage::Login {
                username: "alice".into(),
                password: "hunter7".into(),
            }
        );
    }

    #[test]
    fn field_names_are_camel_case() {
        let message: ClientMessage = serde_json::from_str(
            r#"{"type": "moveRequest", "targetPosition": {"x": 1.0, "y": 2.0, "z": 0.0}}"#,
        )
        .unwrap();
        assert!(matches!(message, ClientMessage::MoveRequest { .. }));

        let message: ClientMessage = serde_json::from_str(
            r#"{"type": "useSkill", "skillId": 3, "targetId": 12, "targetType": "enemy"}"#,
        )
        .unwrap();
        match message {
            ClientMessage::UseSkill {
                skill_id,
                target_id,
                target_type,
                ..
            } => {
                assert_eq!(skill_id, SkillId::new(3));
                assert_eq!(target_id, Some(MonsterInstanceId(12)));
                assert_eq!(target_type, Some(SkillTargetType::Enemy));
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn unknown_type_is_an_error() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type": "teleportHome"}"#).is_err());
    }
}
