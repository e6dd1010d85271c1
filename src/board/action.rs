//! Candidate actions, their outcome distributions, and wire answers.

use serde::{Deserialize, Serialize};

use super::entity::{EntityId, FanKind};
use super::position::Position;
use super::state::Environment;

/// The ball an actor sends flying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ball {
    Quaffle,
    Bludger(EntityId),
}

/// A single legal action of one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Move {
        actor: EntityId,
        target: Position,
    },
    Throw {
        actor: EntityId,
        ball: Ball,
        target: Position,
    },
    Wrest {
        actor: EntityId,
        /// Where the quaffle currently lies.
        target: Position,
    },
}

impl Action {
    pub const fn actor(&self) -> EntityId {
        match *self {
            Action::Move { actor, .. }
            | Action::Throw { actor, .. }
            | Action::Wrest { actor, .. } => actor,
        }
    }

    pub const fn target(&self) -> Position {
        match *self {
            Action::Move { target, .. }
            | Action::Throw { target, .. }
            | Action::Wrest { target, .. } => target,
        }
    }
}

/// One possible result of an action.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub probability: f64,
    pub state: Environment,
}

/// An action together with its full outcome distribution.
///
/// Outcome probabilities sum to one.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub action: Action,
    /// Probability that the action does what the actor intends.
    pub success: f64,
    pub outcomes: Vec<Outcome>,
}

impl Candidate {
    pub fn total_probability(&self) -> f64 {
        self.outcomes.iter().map(|o| o.probability).sum()
    }
}

/// Kind of turn the server asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TurnKind {
    Move,
    Action,
    Fan,
    RemoveBan,
}

/// The closed set of answers the agent can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnswerKind {
    Move,
    QuaffleThrow,
    BludgerBeating,
    WrestQuaffle,
    Skip,
    SnitchSnatch,
    ElfTeleportation,
    GoblinShock,
    TrollRoar,
    WombatPoo,
    Unban,
}

impl AnswerKind {
    /// The answer that uses a fan of the given kind.
    pub const fn for_fan(kind: FanKind) -> AnswerKind {
        match kind {
            FanKind::Goblin => AnswerKind::GoblinShock,
            FanKind::Troll => AnswerKind::TrollRoar,
            FanKind::Elf => AnswerKind::ElfTeleportation,
            FanKind::Niffler => AnswerKind::SnitchSnatch,
            FanKind::Wombat => AnswerKind::WombatPoo,
        }
    }
}

/// A concrete decision ready to be sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Answer {
    pub kind: AnswerKind,
    pub active_entity: EntityId,
    pub passive_entity: Option<EntityId>,
    pub target: Option<Position>,
}

impl Answer {
    /// The canonical no-op naming the acting entity.
    pub const fn skip(active_entity: EntityId) -> Self {
        Answer {
            kind: AnswerKind::Skip,
            active_entity,
            passive_entity: None,
            target: None,
        }
    }

    pub const fn is_skip(&self) -> bool {
        matches!(self.kind, AnswerKind::Skip)
    }
}

impl From<Action> for Answer {
    fn from(action: Action) -> Self {
        match action {
            Action::Move { actor, target } => Answer {
                kind: AnswerKind::Move,
                active_entity: actor,
                passive_entity: None,
                target: Some(target),
            },
            Action::Throw {
                actor,
                ball: Ball::Quaffle,
                target,
            } => Answer {
                kind: AnswerKind::QuaffleThrow,
                active_entity: actor,
                passive_entity: Some(EntityId::Quaffle),
                target: Some(target),
            },
            Action::Throw {
                actor,
                ball: Ball::Bludger(id),
                target,
            } => Answer {
                kind: AnswerKind::BludgerBeating,
                active_entity: actor,
                passive_entity: Some(id),
                target: Some(target),
            },
            Action::Wrest { actor, target } => Answer {
                kind: AnswerKind::WrestQuaffle,
                active_entity: actor,
                passive_entity: Some(EntityId::Quaffle),
                target: Some(target),
            },
        }
    }
}
