//! Wire message types.
//!
//! Every line on the wire is one JSON object of the form
//! `{"payloadType": "...", "payload": {...}}`. Field names are camelCase;
//! enum values use the server's SCREAMING_SNAKE_CASE identifiers.

use serde::{Deserialize, Serialize};

use crate::board::{
    Answer, AnswerKind, Bludger, EntityId, Environment, Fan, FanKind, Phase, Player, Position,
    Snitch, Team, TeamSide, TurnKind,
};

/// Messages the server sends to the agent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "payloadType", content = "payload", rename_all = "camelCase")]
pub enum Inbound {
    MatchStart(MatchStart),
    Snapshot(Snapshot),
    Next(Next),
    MatchFinish(MatchFinish),
}

/// Messages the agent sends to the server.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "payloadType", content = "payload", rename_all = "camelCase")]
pub enum Outbound {
    DeltaRequest(DeltaRequest),
    TeamFormation(TeamFormation),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchStart {
    pub left_team_user_name: String,
    pub right_team_user_name: String,
}

/// A turn request: `turn` must act with an answer of kind `kind` within
/// `timeout` milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Next {
    pub turn: EntityId,
    #[serde(rename = "type")]
    pub kind: TurnKind,
    #[serde(default)]
    pub timeout: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchFinish {
    pub end_round: u32,
    pub left_points: u32,
    pub right_points: u32,
    pub winner_user_name: String,
    pub victory_reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhaseType {
    BallPhase,
    PlayerPhase,
    FanPhase,
    RemoveBanPhase,
    GameFinish,
}

impl From<PhaseType> for Phase {
    fn from(phase: PhaseType) -> Self {
        match phase {
            PhaseType::BallPhase => Phase::Ball,
            PhaseType::PlayerPhase => Phase::Player,
            PhaseType::FanPhase => Phase::Fan,
            PhaseType::RemoveBanPhase => Phase::Unban,
            PhaseType::GameFinish => Phase::Finished,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub x_pos: i32,
    pub y_pos: i32,
    #[serde(default)]
    pub banned: bool,
    #[serde(default)]
    pub knockout: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FanSnapshot {
    pub fan_type: FanKind,
    #[serde(default)]
    pub banned: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellSnapshot {
    pub x_pos: i32,
    pub y_pos: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSnapshot {
    #[serde(default)]
    pub points: u32,
    #[serde(default)]
    pub fans: Vec<FanSnapshot>,
    pub seeker: PlayerSnapshot,
    pub keeper: PlayerSnapshot,
    pub beater1: PlayerSnapshot,
    pub beater2: PlayerSnapshot,
    pub chaser1: PlayerSnapshot,
    pub chaser2: PlayerSnapshot,
    pub chaser3: PlayerSnapshot,
}

impl TeamSnapshot {
    fn members(&self) -> [PlayerSnapshot; 7] {
        [
            self.seeker,
            self.keeper,
            self.beater1,
            self.beater2,
            self.chaser1,
            self.chaser2,
            self.chaser3,
        ]
    }

    pub fn to_team(&self, side: TeamSide) -> Team {
        let positions = self.members().map(|m| Position::new(m.x_pos, m.y_pos));
        let mut team = Team::from_positions(side, positions);
        for (player, member) in team.players_mut().zip(self.members()) {
            player.is_fined = member.banned;
            player.knocked_out = member.knockout;
        }
        team.score = self.points;
        team.fans = self
            .fans
            .iter()
            .map(|f| Fan {
                kind: f.fan_type,
                banned: f.banned,
            })
            .collect();
        team
    }

    /// The inverse of `to_team`.
    pub fn from_team(team: &Team) -> Self {
        let member = |p: &Player| PlayerSnapshot {
            x_pos: p.position.x,
            y_pos: p.position.y,
            banned: p.is_fined,
            knockout: p.knocked_out,
        };
        TeamSnapshot {
            points: team.score,
            fans: team
                .fans
                .iter()
                .map(|f| FanSnapshot {
                    fan_type: f.kind,
                    banned: f.banned,
                })
                .collect(),
            seeker: member(&team.seeker),
            keeper: member(&team.keeper),
            beater1: member(&team.beaters[0]),
            beater2: member(&team.beaters[1]),
            chaser1: member(&team.chasers[0]),
            chaser2: member(&team.chasers[1]),
            chaser3: member(&team.chasers[2]),
        }
    }
}

/// Full match state as broadcast after every delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub phase: PhaseType,
    pub round: u32,
    #[serde(default)]
    pub goal_was_thrown_this_round: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_actor: Option<EntityId>,
    pub left_team: TeamSnapshot,
    pub right_team: TeamSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snitch_x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snitch_y: Option<i32>,
    pub quaffle_x: i32,
    pub quaffle_y: i32,
    pub bludger1_x: i32,
    pub bludger1_y: i32,
    pub bludger2_x: i32,
    pub bludger2_y: i32,
    #[serde(default)]
    pub wombat_cubes: Vec<CellSnapshot>,
}

impl Snapshot {
    /// Builds the engine's state. The result is not validated.
    pub fn to_environment(&self) -> Environment {
        let mut state = Environment::new(
            self.left_team.to_team(TeamSide::Left),
            self.right_team.to_team(TeamSide::Right),
        );
        state.quaffle = Position::new(self.quaffle_x, self.quaffle_y);
        state.bludgers = vec![
            Bludger {
                id: EntityId::Bludger1,
                position: Position::new(self.bludger1_x, self.bludger1_y),
            },
            Bludger {
                id: EntityId::Bludger2,
                position: Position::new(self.bludger2_x, self.bludger2_y),
            },
        ];
        state.snitch = match (self.snitch_x, self.snitch_y) {
            (Some(x), Some(y)) => Snitch::at(Position::new(x, y)),
            _ => Snitch::absent(),
        };
        state.wombat_cubes = self
            .wombat_cubes
            .iter()
            .map(|c| Position::new(c.x_pos, c.y_pos))
            .collect();
        state.round = self.round;
        state.phase = self.phase.into();
        state
    }

    /// Describes a state on the wire.
    pub fn from_environment(state: &Environment) -> Self {
        let bludger = |i: usize| {
            state
                .bludgers
                .get(i)
                .map_or(Position::new(-1, -1), |b| b.position)
        };
        let phase = match state.phase {
            Phase::Ball => PhaseType::BallPhase,
            Phase::Player => PhaseType::PlayerPhase,
            Phase::Fan => PhaseType::FanPhase,
            Phase::Unban => PhaseType::RemoveBanPhase,
            Phase::Finished => PhaseType::GameFinish,
        };
        Snapshot {
            phase,
            round: state.round,
            goal_was_thrown_this_round: false,
            last_actor: None,
            left_team: TeamSnapshot::from_team(&state.left),
            right_team: TeamSnapshot::from_team(&state.right),
            snitch_x: state.snitch.exists.then_some(state.snitch.position.x),
            snitch_y: state.snitch.exists.then_some(state.snitch.position.y),
            quaffle_x: state.quaffle.x,
            quaffle_y: state.quaffle.y,
            bludger1_x: bludger(0).x,
            bludger1_y: bludger(0).y,
            bludger2_x: bludger(1).x,
            bludger2_y: bludger(1).y,
            wombat_cubes: state
                .wombat_cubes
                .iter()
                .map(|p| CellSnapshot {
                    x_pos: p.x,
                    y_pos: p.y,
                })
                .collect(),
        }
    }
}

/// One decision sent back to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeltaRequest {
    pub delta_type: AnswerKind,
    pub active_entity: EntityId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passive_entity: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_pos_new: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_pos_new: Option<i32>,
}

impl From<Answer> for DeltaRequest {
    fn from(answer: Answer) -> Self {
        DeltaRequest {
            delta_type: answer.kind,
            active_entity: answer.active_entity,
            passive_entity: answer.passive_entity,
            x_pos_new: answer.target.map(|p| p.x),
            y_pos_new: answer.target.map(|p| p.y),
        }
    }
}

/// Opening positions in roster order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamFormation {
    pub seeker_x: i32,
    pub seeker_y: i32,
    pub keeper_x: i32,
    pub keeper_y: i32,
    pub beater1_x: i32,
    pub beater1_y: i32,
    pub beater2_x: i32,
    pub beater2_y: i32,
    pub chaser1_x: i32,
    pub chaser1_y: i32,
    pub chaser2_x: i32,
    pub chaser2_y: i32,
    pub chaser3_x: i32,
    pub chaser3_y: i32,
}

impl From<[Position; 7]> for TeamFormation {
    fn from(p: [Position; 7]) -> Self {
        TeamFormation {
            seeker_x: p[0].x,
            seeker_y: p[0].y,
            keeper_x: p[1].x,
            keeper_y: p[1].y,
            beater1_x: p[2].x,
            beater1_y: p[2].y,
            beater2_x: p[3].x,
            beater2_y: p[3].y,
            chaser1_x: p[4].x,
            chaser1_y: p[4].y,
            chaser2_x: p[5].x,
            chaser2_y: p[5].y,
            chaser3_x: p[6].x,
            chaser3_y: p[6].y,
        }
    }
}
