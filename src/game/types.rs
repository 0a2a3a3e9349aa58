use serde::{Deserialize, Serialize};

use crate::constants::{COMMENT_WEIGHT, POST_WEIGHT};

/// A community together with its current member count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub name: String,
    pub subscribers: u64,
}

impl Entity {
    pub fn new(name: impl Into<String>, subscribers: u64) -> Self {
        Self {
            name: name.into(),
            subscribers,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    Post,
    Comment,
}

impl ActionKind {
    pub fn weight(self) -> u32 {
        match self {
            Self::Post => POST_WEIGHT,
            Self::Comment => COMMENT_WEIGHT,
        }
    }
}

/// One historical post or comment by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAction {
    pub kind: ActionKind,
    pub community: Option<String>,
}

impl UserAction {
    pub fn post(community: impl Into<String>) -> Self {
        Self {
            kind: ActionKind::Post,
            community: Some(community.into()),
        }
    }

    pub fn comment(community: impl Into<String>) -> Self {
        Self {
            kind: ActionKind::Comment,
            community: Some(community.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightedMention {
    pub entity_name: String,
    pub weight: u32,
}

/// The player's claim about the bottom entity relative to the top one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Guess {
    Higher,
    Lower,
}

impl Guess {
    /// 平局对两个方向都算猜对
    pub fn is_correct(self, top: &Entity, bottom: &Entity) -> bool {
        match self {
            Self::Higher => bottom.subscribers >= top.subscribers,
            Self::Lower => bottom.subscribers <= top.subscribers,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawOutcome {
    Found(Entity),
    Exhausted,
}

impl DrawOutcome {
    pub fn into_entity(self) -> Option<Entity> {
        match self {
            Self::Found(entity) => Some(entity),
            Self::Exhausted => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Loading,
    Playing,
    Resolving,
    GameOver,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub score: u32,
    pub top_entity: Option<Entity>,
    pub bottom_entity: Option<Entity>,
    pub show_results: bool,
    pub game_over: bool,
}

impl GameState {
    pub fn fresh(top: Entity, bottom: Entity) -> Self {
        Self {
            score: 0,
            top_entity: Some(top),
            bottom_entity: Some(bottom),
            show_results: false,
            game_over: false,
        }
    }

    /// Both entities missing: the shell renders a retry prompt.
    pub fn is_stuck(&self) -> bool {
        self.top_entity.is_none() && self.bottom_entity.is_none()
    }

    pub fn phase(&self) -> Phase {
        if self.top_entity.is_none() || self.bottom_entity.is_none() {
            Phase::Loading
        } else if self.game_over {
            Phase::GameOver
        } else if self.show_results {
            Phase::Resolving
        } else {
            Phase::Playing
        }
    }
}
