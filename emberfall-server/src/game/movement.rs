use emberfall_game_common::components::WorldPosition;
use emberfall_game_common::ids::PlayerId;

use crate::game::time::GameTime;
use crate::game::world::World;

/// Hard ceiling on accepted movement speed, units per second. Roughly
/// three times the fastest legitimate movement.
pub const MAX_ALLOWED_SPEED: f32 = 15.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MoveRejection {
    Dead,
    /// Logged server-side; the client gets no explanation.
    SpeedHack,
}

pub enum MoveVerdict {
    Accepted,
    /// Position reverts to the last accepted one; the client learns
    /// nothing about why.
    Rejected { revert_to: WorldPosition },
}

/// Per-player speed-hack validation. Tracks the last accepted
/// position and when it was committed; every client move request and
/// every server-driven commit passes through here.
pub struct MovementGuard {
    last_position: WorldPosition,
    last_commit_ms: i64,
}

impl MovementGuard {
    pub fn new(position: WorldPosition, now_ms: i64) -> Self {
        Self {
            last_position: position,
            last_commit_ms: now_ms,
        }
    }

    pub fn last_position(&self) -> WorldPosition {
        self.last_position
    }

    /// Validate a client-requested position against the travel speed
    /// since the last accepted commit.
    pub fn check(&mut self, requested: WorldPosition, now_ms: i64) -> MoveVerdict {
        let dt = ((now_ms - self.last_commit_ms) as f32 / 1000.0).max(0.001);
        let distance = self.last_position.distance(&requested);
        let speed = distance / dt;

        if speed > MAX_ALLOWED_SPEED {
            MoveVerdict::Rejected {
                revert_to: self.last_position,
            }
        } else {
            self.commit(requested, now_ms);
            MoveVerdict::Accepted
        }
    }

    /// Record a server-driven position change (chase integration,
    /// respawn teleport) so later client moves are measured from it.
    pub fn commit(&mut self, position: WorldPosition, now_ms: i64) {
        self.last_position = position;
        self.last_commit_ms = now_ms;
    }
}

/// The full `moveRequest` path: terrain clamp, speed validation,
/// position commit, cast interruption. Returns the accepted position.
pub fn apply_move_request(
    world: &mut World,
    player_id: PlayerId,
    requested: WorldPosition,
    now: GameTime,
) -> Result<WorldPosition, MoveRejection> {
    let clamped: WorldPosition = world
        .catalog
        .terrain
        .clamp(glam::Vec3::from(requested))
        .into();

    let verdict = {
        let Some(player) = world.players.get_mut(player_id) else {
            return Err(MoveRejection::Dead);
        };
        if player.character.is_dead {
            return Err(MoveRejection::Dead);
        }

        match player.movement.check(clamped, now.now_ms) {
            MoveVerdict::Accepted => {
                player.character.position = clamped;
                player.target_position = None;
                player.is_moving = false;
                Ok(clamped)
            }
            MoveVerdict::Rejected { revert_to } => {
                player.character.position = revert_to;
                player.target_position = None;
                player.is_moving = false;
                Err(MoveRejection::SpeedHack)
            }
        }
    };

    match verdict {
        Ok(position) => {
            // Movement interrupts casting.
            crate::game::skills::cancel_cast(world, player_id);
            Ok(position)
        }
        Err(MoveRejection::SpeedHack) => {
            log::warn!(
                "SPEED_HACK: session {} rejected move to ({:.1}, {:.1}, {:.1})",
                player_id,
                clamped.x,
                clamped.y,
                clamped.z
            );
            Err(MoveRejection::SpeedHack)
        }
        Err(rejection) => Err(rejection),
    }
}
