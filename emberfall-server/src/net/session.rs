use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::net::TcpStream;

use emberfall_game_common::components::Inventory;
use emberfall_game_common::ids::{AccountId, CharacterId, PlayerId};
use emberfall_game_common::messages::{ClientMessage, LoginData, ServerMessage};

use crate::game::character_creator;
use crate::game::items;
use crate::game::players::Player;
use crate::game::skills::{self, SkillRequest};
use crate::game::snapshots;
use crate::game::stats::recalculate_stats;
use crate::game::time::GameTime;
use crate::game::world::World;
use crate::net::connection::{Connection, ProtocolError};
use crate::net::registry::{SessionRegistry, SESSION_QUEUE_CAPACITY};
use crate::storage::{PersistenceStore, StorageError};

/// Sessions idle longer than this are closed; `ping` counts as
/// activity.
pub const READ_TIMEOUT: Duration = Duration::from_secs(90);

pub struct SessionContext {
    pub world: Arc<Mutex<World>>,
    pub store: Arc<dyn PersistenceStore>,
    pub registry: Arc<SessionRegistry>,
    /// Storage was unhealthy at boot: catalog traffic only, no
    /// login/register.
    pub degraded: bool,
}

#[derive(Clone, Debug)]
pub enum SessionState {
    Unauthenticated,
    CharacterSelect {
        account: AccountId,
        account_name: String,
    },
    InWorld {
        account: AccountId,
        character: CharacterId,
    },
}

/// Drive one connection to completion: socket reads, the outbound
/// queue, and the three-state message dispatch.
pub async fn run_session(ctx: Arc<SessionContext>, stream: TcpStream, peer: SocketAddr) {
    let player_id = ctx.registry.allocate_id();
    let (sender, mut receiver) = tokio::sync::mpsc::channel(SESSION_QUEUE_CAPACITY);
    ctx.registry.register(player_id, sender);
    log::info!("Session {} connected from {}", player_id, peer);

    let mut connection = Connection::new(stream);
    let mut state = SessionState::Unauthenticated;
    let mut close_reason = "peer disconnected";

    loop {
        tokio::select! {
            frame = receiver.recv() => match frame {
                Some(frame) => {
                    if connection.write_line(&frame).await.is_err() {
                        close_reason = "write failed";
                        break;
                    }
                }
                None => {
                    // The registry dropped us (queue overflow).
                    close_reason = "outbound queue overflow";
                    break;
                }
            },
            inbound = tokio::time::timeout(READ_TIMEOUT, connection.read_frame()) => {
                match inbound {
                    Err(_) => {
                        close_reason = "read timeout";
                        break;
                    }
                    Ok(Err(ProtocolError::BadJson(error))) => {
                        log::debug!("Session {} sent malformed JSON: {}", player_id, error);
                        ctx.registry.send_to(
                            player_id,
                            &ServerMessage::Error {
                                message: String::from("MALFORMED_MESSAGE"),
                            },
                        );
                    }
                    Ok(Err(ProtocolError::FrameTooLarge)) => {
                        close_reason = "oversized frame";
                        break;
                    }
                    Ok(Err(ProtocolError::Disconnect)) => {
                        break;
                    }
                    Ok(Ok(value)) => {
                        let handler_ctx = ctx.clone();
                        let handler_state = state.clone();
                        let handled = tokio::task::spawn_blocking(move || {
                            let mut state = handler_state;
                            handle_message(&handler_ctx, player_id, &mut state, value);
                            state
                        })
                        .await;
                        match handled {
                            Ok(new_state) => state = new_state,
                            Err(join_error) => {
                                log::error!(
                                    "Session {} handler panicked: {}",
                                    player_id,
                                    join_error
                                );
                                ctx.registry.send_to(
                                    player_id,
                                    &ServerMessage::Error {
                                        message: String::from("INTERNAL_ERROR"),
                                    },
                                );
                            }
                        }
                    }
                }
            }
        }
    }

    log::info!("Session {} closing: {}", player_id, close_reason);
    connection.shutdown().await;

    let cleanup_ctx = ctx.clone();
    let cleanup_state = state.clone();
    let _ = tokio::task::spawn_blocking(move || {
        cleanup_session(&cleanup_ctx, player_id, &cleanup_state);
    })
    .await;
    ctx.registry.unregister(player_id);
}

/// Persist and remove the player on disconnect, then tell the world.
fn cleanup_session(ctx: &SessionContext, player_id: PlayerId, state: &SessionState) {
    if !matches!(state, SessionState::InWorld { .. }) {
        return;
    }

    let removed = {
        let mut world = ctx.world.lock();
        world.players.remove(player_id)
    };

    if let Some(player) = removed {
        if let Err(error) = ctx.store.update_character(&player.character) {
            log::error!(
                "Failed to save character {} at disconnect: {}",
                player.character.info.name,
                error
            );
        }
        if let Err(error) = ctx.store.save_inventory(&player.inventory) {
            log::error!(
                "Failed to save inventory of {} at disconnect: {}",
                player.character.info.name,
                error
            );
        }
        log::info!(
            "Player {} ({}) left the world",
            player.character.info.name,
            player_id
        );
    }

    ctx.registry
        .broadcast_except(Some(player_id), &ServerMessage::PlayerDisconnected { player_id });
}

/// Decode and dispatch one inbound frame against the session state.
fn handle_message(
    ctx: &SessionContext,
    player_id: PlayerId,
    state: &mut SessionState,
    value: serde_json::Value,
) {
    let message: ClientMessage = match serde_json::from_value(value.clone()) {
        Ok(message) => message,
        Err(error) => {
            let kind = value
                .get("type")
                .and_then(|tag| tag.as_str())
                .unwrap_or("<missing>");
            if error.to_string().starts_with("unknown variant") {
                log::info!("Session {} sent unknown message type {:?}", player_id, kind);
            } else {
                log::debug!("Session {} sent bad {:?} payload: {}", player_id, kind, error);
                ctx.registry.send_to(
                    player_id,
                    &ServerMessage::Error {
                        message: String::from("INVALID_MESSAGE"),
                    },
                );
            }
            return;
        }
    };

    // Keepalive works in every state.
    if let ClientMessage::Ping { .. } = message {
        ctx.registry.send_to(
            player_id,
            &ServerMessage::Pong {
                time: GameTime::now().now_ms,
            },
        );
        return;
    }

    match state {
        SessionState::Unauthenticated => match message {
            ClientMessage::Login { username, password } => {
                handle_login(ctx, player_id, state, &username, &password)
            }
            ClientMessage::Register { username, password } => {
                handle_register(ctx, player_id, &username, &password)
            }
            _ => send_error(ctx, player_id, "NOT_AUTHENTICATED"),
        },
        SessionState::CharacterSelect {
            account,
            account_name,
        } => {
            let account = *account;
            let account_name = account_name.clone();
            match message {
                ClientMessage::ListCharacters => {
                    handle_list_characters(ctx, player_id, account)
                }
                ClientMessage::CreateCharacter { name, race, class } => {
                    handle_create_character(ctx, player_id, account, &name, &race, &class)
                }
                ClientMessage::SelectCharacter { character_id } => handle_select_character(
                    ctx,
                    player_id,
                    state,
                    account,
                    &account_name,
                    character_id,
                ),
                ClientMessage::DeleteCharacter { character_id } => {
                    handle_delete_character(ctx, player_id, account, character_id)
                }
                _ => send_error(ctx, player_id, "NO_CHARACTER_SELECTED"),
            }
        }
        SessionState::InWorld { .. } => handle_in_world(ctx, player_id, message),
    }
}

fn send_error(ctx: &SessionContext, player_id: PlayerId, code: &str) {
    ctx.registry.send_to(
        player_id,
        &ServerMessage::Error {
            message: code.to_string(),
        },
    );
}

fn handle_login(
    ctx: &SessionContext,
    player_id: PlayerId,
    state: &mut SessionState,
    username: &str,
    password: &str,
) {
    if ctx.degraded {
        ctx.registry.send_to(
            player_id,
            &ServerMessage::LoginResponse {
                success: false,
                data: None,
                message: Some(String::from("Service temporarily unavailable")),
            },
        );
        return;
    }

    match ctx.store.validate_login(username, password) {
        Ok(account_id) => {
            let characters = match ctx.store.list_characters(account_id) {
                Ok(characters) => characters,
                Err(error) => {
                    log::error!("Listing characters for {} failed: {}", username, error);
                    Vec::new()
                }
            };
            let catalog = ctx.world.lock().catalog.clone();
            let summaries = characters
                .iter()
                .map(|character| snapshots::character_summary(&catalog, character))
                .collect();

            *state = SessionState::CharacterSelect {
                account: account_id,
                account_name: username.to_string(),
            };
            log::info!("Session {} logged in as {}", player_id, username);
            ctx.registry.send_to(
                player_id,
                &ServerMessage::LoginResponse {
                    success: true,
                    data: Some(LoginData {
                        account_id,
                        characters: summaries,
                    }),
                    message: None,
                },
            );
        }
        Err(StorageError::AccountLocked) => {
            ctx.registry.send_to(
                player_id,
                &ServerMessage::LoginResponse {
                    success: false,
                    data: None,
                    message: Some(String::from(
                        "Account temporarily locked, try again later",
                    )),
                },
            );
        }
        Err(StorageError::InvalidCredentials) => {
            ctx.registry.send_to(
                player_id,
                &ServerMessage::LoginResponse {
                    success: false,
                    data: None,
                    message: Some(String::from("Invalid username or password")),
                },
            );
        }
        Err(error) => {
            log::error!("Login for {} failed: {}", username, error);
            send_error(ctx, player_id, "INTERNAL_ERROR");
        }
    }
}

fn handle_register(ctx: &SessionContext, player_id: PlayerId, username: &str, password: &str) {
    if ctx.degraded {
        ctx.registry.send_to(
            player_id,
            &ServerMessage::RegisterResponse {
                success: false,
                message: Some(String::from("Service temporarily unavailable")),
            },
        );
        return;
    }

    let message = match ctx.store.create_account(username, password) {
        Ok(_) => None,
        Err(StorageError::AlreadyExists) => Some(String::from("Username is already taken")),
        Err(StorageError::InvalidUsername) => Some(StorageError::InvalidUsername.to_string()),
        Err(StorageError::WeakPassword(reason)) => Some(reason.to_string()),
        Err(error) => {
            log::error!("Account creation for {} failed: {}", username, error);
            Some(String::from("Internal error"))
        }
    };

    ctx.registry.send_to(
        player_id,
        &ServerMessage::RegisterResponse {
            success: message.is_none(),
            message,
        },
    );
}

fn handle_list_characters(ctx: &SessionContext, player_id: PlayerId, account: AccountId) {
    let characters = match ctx.store.list_characters(account) {
        Ok(characters) => characters,
        Err(error) => {
            log::error!("Listing characters failed: {}", error);
            send_error(ctx, player_id, "INTERNAL_ERROR");
            return;
        }
    };
    let catalog = ctx.world.lock().catalog.clone();
    ctx.registry.send_to(
        player_id,
        &ServerMessage::CharacterListResponse {
            characters: characters
                .iter()
                .map(|character| snapshots::character_summary(&catalog, character))
                .collect(),
        },
    );
}

fn handle_create_character(
    ctx: &SessionContext,
    player_id: PlayerId,
    account: AccountId,
    name: &str,
    race: &str,
    class: &str,
) {
    let (catalog, spawn_position) = {
        let world = ctx.world.lock();
        (world.catalog.clone(), world.config.spawn_position)
    };

    let store = ctx.store.clone();
    let created = character_creator::create_character(
        &catalog,
        name,
        race,
        class,
        spawn_position,
        || Ok(store.alloc_item_instance_id()?),
    );

    let (character, inventory) = match created {
        Ok(pair) => pair,
        Err(error) => {
            ctx.registry.send_to(
                player_id,
                &ServerMessage::CreateCharacterResponse {
                    success: false,
                    character: None,
                    message: Some(error.to_string()),
                },
            );
            return;
        }
    };

    match ctx.store.create_character(account, &character, &inventory) {
        Ok(id) => {
            let mut summary_source = character;
            summary_source.id = id;
            ctx.registry.send_to(
                player_id,
                &ServerMessage::CreateCharacterResponse {
                    success: true,
                    character: Some(snapshots::character_summary(&catalog, &summary_source)),
                    message: None,
                },
            );
        }
        Err(StorageError::AlreadyExists) => {
            ctx.registry.send_to(
                player_id,
                &ServerMessage::CreateCharacterResponse {
                    success: false,
                    character: None,
                    message: Some(String::from("Character name is already taken")),
                },
            );
        }
        Err(StorageError::CharacterLimit) => {
            ctx.registry.send_to(
                player_id,
                &ServerMessage::CreateCharacterResponse {
                    success: false,
                    character: None,
                    message: Some(StorageError::CharacterLimit.to_string()),
                },
            );
        }
        Err(StorageError::InvalidCharacterName) => {
            ctx.registry.send_to(
                player_id,
                &ServerMessage::CreateCharacterResponse {
                    success: false,
                    character: None,
                    message: Some(StorageError::InvalidCharacterName.to_string()),
                },
            );
        }
        Err(error) => {
            log::error!("Character creation failed: {}", error);
            send_error(ctx, player_id, "INTERNAL_ERROR");
        }
    }
}

fn handle_delete_character(
    ctx: &SessionContext,
    player_id: PlayerId,
    account: AccountId,
    character_id: CharacterId,
) {
    let in_use = ctx.world.lock().players.character_in_use(character_id);
    if in_use {
        ctx.registry.send_to(
            player_id,
            &ServerMessage::DeleteCharacterResponse {
                success: false,
                message: Some(String::from("Character is currently in play")),
            },
        );
        return;
    }

    let message = match ctx.store.delete_character(account, character_id) {
        Ok(()) => None,
        Err(StorageError::NotFound) => Some(String::from("No such character")),
        Err(error) => {
            log::error!("Character deletion failed: {}", error);
            Some(String::from("Internal error"))
        }
    };
    ctx.registry.send_to(
        player_id,
        &ServerMessage::DeleteCharacterResponse {
            success: message.is_none(),
            message,
        },
    );
}

fn handle_select_character(
    ctx: &SessionContext,
    player_id: PlayerId,
    state: &mut SessionState,
    account: AccountId,
    account_name: &str,
    character_id: CharacterId,
) {
    let fail = |message: &str| {
        ctx.registry.send_to(
            player_id,
            &ServerMessage::SelectCharacterResponse {
                success: false,
                character: None,
                player_id: None,
                all_players: Vec::new(),
                all_monsters: Vec::new(),
                inventory: None,
                message: Some(message.to_string()),
            },
        );
    };

    let mut character = match ctx.store.load_character(character_id) {
        Ok(character) => character,
        Err(StorageError::NotFound) => return fail("No such character"),
        Err(error) => {
            log::error!("Loading character {} failed: {}", character_id, error);
            return fail("Internal error");
        }
    };
    if character.account != account_name {
        log::warn!(
            "Session {} tried to select foreign character {}",
            player_id,
            character_id
        );
        return fail("No such character");
    }

    let inventory = match ctx.store.load_inventory(character_id) {
        Ok(inventory) => inventory,
        Err(StorageError::NotFound) => Inventory::new(character_id),
        Err(error) => {
            log::error!("Loading inventory {} failed: {}", character_id, error);
            return fail("Internal error");
        }
    };

    let now = GameTime::now();
    let mut world = ctx.world.lock();
    if world.players.character_in_use(character_id) {
        drop(world);
        return fail("Character is already in play");
    }

    character.position = world
        .catalog
        .terrain
        .clamp(glam::Vec3::from(character.position))
        .into();

    let mut player = Player::new(player_id, character, inventory, now.now_ms);
    if let Err(error) = recalculate_stats(
        &mut player.character,
        &player.inventory,
        &player.effects,
        &world.catalog,
    ) {
        log::error!("Stat recompute at select failed: {:#}", error);
        drop(world);
        return fail("Internal error");
    }

    let catalog = world.catalog.clone();
    let own_snapshot = snapshots::player_snapshot(&player);
    let character_view = snapshots::character_snapshot(&catalog, &player.character);
    let inventory_view = snapshots::inventory_snapshot(&catalog, &player.inventory);
    world.players.insert(player);

    let all_players = snapshots::player_snapshots(&world);
    let all_monsters = snapshots::monster_snapshots(&world);
    drop(world);

    *state = SessionState::InWorld {
        account,
        character: character_id,
    };
    ctx.registry.set_in_world(player_id, true);

    ctx.registry.send_to(
        player_id,
        &ServerMessage::SelectCharacterResponse {
            success: true,
            character: Some(character_view),
            player_id: Some(player_id),
            all_players,
            all_monsters,
            inventory: Some(inventory_view),
            message: None,
        },
    );
    ctx.registry.broadcast_except(
        Some(player_id),
        &ServerMessage::PlayerJoined {
            player: own_snapshot,
        },
    );
    log::info!("Session {} entered the world as character {}", player_id, character_id);
}

fn handle_in_world(ctx: &SessionContext, player_id: PlayerId, message: ClientMessage) {
    use crate::game::movement;

    let now = GameTime::now();

    match message {
        ClientMessage::MoveRequest { target_position } => {
            let mut world = ctx.world.lock();
            let result = movement::apply_move_request(&mut world, player_id, target_position, now);
            let outbox = world.take_outbox();
            drop(world);
            ctx.registry.dispatch(outbox);
            match result {
                Ok(accepted) => {
                    ctx.registry.send_to(
                        player_id,
                        &ServerMessage::MoveAccepted {
                            target_position: accepted,
                        },
                    );
                }
                Err(movement::MoveRejection::Dead) => {
                    send_error(ctx, player_id, "PLAYER_DEAD");
                }
                // A speed-hack rejection is deliberately silent.
                Err(movement::MoveRejection::SpeedHack) => {}
            }
        }

        ClientMessage::AttackMonster { monster_id } => {
            let mut world = ctx.world.lock();
            let valid = world
                .monsters
                .get(monster_id)
                .map(|monster| monster.is_alive)
                .unwrap_or(false);
            if !valid {
                drop(world);
                send_error(ctx, player_id, "TARGET_NOT_FOUND");
                return;
            }
            let Some(player) = world.players.get_mut(player_id) else {
                return;
            };
            if player.character.is_dead {
                drop(world);
                send_error(ctx, player_id, "PLAYER_DEAD");
                return;
            }
            player.combat_target = Some(monster_id);
            drop(world);
            ctx.registry.broadcast(&ServerMessage::AttackStarted {
                player_id,
                monster_id,
            });
        }

        ClientMessage::UseSkill {
            skill_id,
            target_id,
            target_position,
            ..
        } => {
            let mut world = ctx.world.lock();
            let result = skills::use_skill(
                &mut world,
                player_id,
                SkillRequest {
                    skill: skill_id,
                    target: target_id,
                    target_position,
                },
                now,
            );
            let outbox = world.take_outbox();
            drop(world);
            ctx.registry.dispatch(outbox);
            if let Err(reason) = result {
                ctx.registry.send_to(
                    player_id,
                    &ServerMessage::SkillUseFailed { skill_id, reason },
                );
            }
        }

        ClientMessage::CancelCast => {
            let mut world = ctx.world.lock();
            skills::cancel_cast(&mut world, player_id);
            let outbox = world.take_outbox();
            drop(world);
            ctx.registry.dispatch(outbox);
        }

        ClientMessage::LearnSkill {
            skill_id,
            slot_number,
        } => {
            let mut world = ctx.world.lock();
            let result = skills::learn_skill(&mut world, player_id, skill_id, slot_number);
            drop(world);
            let message = match result {
                Ok((skill_id, skill_name, slot)) => ServerMessage::SkillLearned {
                    success: true,
                    skill_id: Some(skill_id),
                    skill_name: Some(skill_name),
                    slot_number: Some(slot),
                    message: None,
                },
                Err(message) => ServerMessage::SkillLearned {
                    success: false,
                    skill_id: None,
                    skill_name: None,
                    slot_number: None,
                    message: Some(message),
                },
            };
            ctx.registry.send_to(player_id, &message);
        }

        ClientMessage::LevelUpSkill { skill_id } => {
            let mut world = ctx.world.lock();
            let result = skills::level_up_skill(&mut world, player_id, skill_id);
            drop(world);
            let message = match result {
                Ok((new_level, status_points)) => ServerMessage::SkillLeveledUp {
                    success: true,
                    skill_id: Some(skill_id),
                    new_level: Some(new_level),
                    status_points: Some(status_points),
                    message: None,
                },
                Err(message) => ServerMessage::SkillLeveledUp {
                    success: false,
                    skill_id: None,
                    new_level: None,
                    status_points: None,
                    message: Some(message),
                },
            };
            ctx.registry.send_to(player_id, &message);
        }

        ClientMessage::GetSkills => {
            let world = ctx.world.lock();
            let skills = world
                .players
                .get(player_id)
                .map(|player| snapshots::learned_skill_views(&world.catalog, &player.character))
                .unwrap_or_default();
            drop(world);
            ctx.registry
                .send_to(player_id, &ServerMessage::SkillsResponse { skills });
        }

        ClientMessage::GetSkillList => {
            let world = ctx.world.lock();
            let skills = world
                .players
                .get(player_id)
                .map(|player| {
                    snapshots::class_skill_views(&world.catalog, player.character.info.class)
                })
                .unwrap_or_default();
            drop(world);
            ctx.registry
                .send_to(player_id, &ServerMessage::SkillListResponse { skills });
        }

        ClientMessage::GetInventory => {
            let world = ctx.world.lock();
            let inventory = world
                .players
                .get(player_id)
                .map(|player| snapshots::inventory_snapshot(&world.catalog, &player.inventory));
            drop(world);
            match inventory {
                Some(inventory) => ctx.registry.send_to(
                    player_id,
                    &ServerMessage::InventoryResponse {
                        success: true,
                        inventory,
                    },
                ),
                None => send_error(ctx, player_id, "INTERNAL_ERROR"),
            }
        }

        ClientMessage::UseItem { instance_id } => {
            let mut world = ctx.world.lock();
            let result = items::use_item(&mut world, player_id, instance_id, now);
            let outbox = world.take_outbox();
            drop(world);
            ctx.registry.dispatch(outbox);
            if let Err(error) = result {
                ctx.registry.send_to(
                    player_id,
                    &ServerMessage::ItemUseFailed {
                        reason: error.use_fail_reason(),
                        message: error.to_string(),
                    },
                );
            }
        }

        ClientMessage::EquipItem { instance_id } => {
            let mut world = ctx.world.lock();
            let result = items::equip_item(&mut world, player_id, instance_id);
            let outbox = world.take_outbox();
            drop(world);
            ctx.registry.dispatch(outbox);
            if let Err(error) = result {
                send_error(ctx, player_id, error.code());
            }
        }

        ClientMessage::UnequipItem { slot } => {
            let mut world = ctx.world.lock();
            let result = items::unequip_item(&mut world, player_id, slot);
            let outbox = world.take_outbox();
            drop(world);
            ctx.registry.dispatch(outbox);
            if let Err(error) = result {
                send_error(ctx, player_id, error.code());
            }
        }

        ClientMessage::DropItem {
            instance_id,
            quantity,
        } => {
            let mut world = ctx.world.lock();
            let result = items::drop_item(&mut world, player_id, instance_id, quantity);
            let outbox = world.take_outbox();
            drop(world);
            ctx.registry.dispatch(outbox);
            if let Err(error) = result {
                send_error(ctx, player_id, error.code());
            }
        }

        ClientMessage::Respawn => {
            let mut world = ctx.world.lock();
            let spawn = world.config.spawn_position;
            let Some(player) = world.players.get_mut(player_id) else {
                return;
            };
            if !player.character.is_dead {
                drop(world);
                send_error(ctx, player_id, "NOT_DEAD");
                return;
            }

            player.character.position = spawn;
            player
                .character
                .set_health(player.character.derived_stats.max_health);
            player
                .character
                .set_mana(player.character.derived_stats.max_mana);
            player.movement.commit(spawn, now.now_ms);
            player.stop_combat();
            let (health, mana) = (player.character.health.0, player.character.mana.0);
            drop(world);

            ctx.registry.send_to(
                player_id,
                &ServerMessage::RespawnResponse {
                    success: true,
                    position: spawn,
                    health,
                    mana,
                },
            );
            ctx.registry.broadcast(&ServerMessage::PlayerRespawn {
                player_id,
                position: spawn,
            });
        }

        ClientMessage::AddStatusPoint { stat } => {
            let mut world = ctx.world.lock();
            let outcome = {
                let Some(player) = world.players.get_mut(player_id) else {
                    return;
                };
                if player.character.status_points.0 <= 0 {
                    Err("NO_STATUS_POINTS")
                } else if !player.character.basic_stats.add_stat(stat) {
                    Err("INVALID_STAT")
                } else {
                    player.character.status_points.0 -= 1;
                    Ok(())
                }
            };

            match outcome {
                Err(code) => {
                    drop(world);
                    send_error(ctx, player_id, code);
                }
                Ok(()) => {
                    if let Err(error) = world.recalculate_player_stats(player_id) {
                        log::error!("Stat recompute after point spend failed: {:#}", error);
                    }
                    let reply = world.players.get(player_id).map(|player| {
                        ServerMessage::StatusPointAdded {
                            player_id,
                            stat,
                            status_points: player.character.status_points.0,
                            new_stats: snapshots::stats_snapshot(&player.character),
                        }
                    });
                    if let Some(player) = world.players.get(player_id) {
                        if let Err(error) = ctx.store.update_character(&player.character) {
                            log::error!("Persisting status point spend failed: {}", error);
                        }
                    }
                    world.emit_stats_update(player_id);
                    let outbox = world.take_outbox();
                    drop(world);
                    ctx.registry.dispatch(outbox);
                    if let Some(reply) = reply {
                        ctx.registry.send_to(player_id, &reply);
                    }
                }
            }
        }

        // Authentication traffic is meaningless once in-world.
        ClientMessage::Login { .. }
        | ClientMessage::Register { .. }
        | ClientMessage::ListCharacters
        | ClientMessage::CreateCharacter { .. }
        | ClientMessage::SelectCharacter { .. }
        | ClientMessage::DeleteCharacter { .. } => {
            send_error(ctx, player_id, "ALREADY_IN_WORLD");
        }

        ClientMessage::Ping { .. } => {}
    }
}
