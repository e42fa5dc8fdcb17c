//! Board rules: token movement, capture detection, win detection.
//!
//! Four colors share a 52-cell circular ring; positions are color-relative,
//! with cell 0 at the color's start offset and cell 56 as home. Positions
//! 52..=55 are the final approach, reached after a full lap, and home must
//! be hit by exact count. The rules are pure transitions on [`Board`]: no
//! I/O, no clocks, and every rule violation is a typed [`MoveError`] value.

use serde::{Deserialize, Serialize};

/// Number of cells on the shared circular track.
pub const TRACK_LEN: u8 = 52;

/// Color-relative position that finishes a token. Must be reached exactly.
pub const HOME_POS: u8 = 56;

/// Tokens per color.
pub const TOKENS_PER_COLOR: u8 = 4;

/// Global track cells where tokens cannot be captured: the four start
/// cells plus the four star cells between them.
pub const SAFE_CELLS: [u8; 8] = [0, 8, 13, 21, 26, 34, 39, 47];

/// The four playable colors, in seat order.
///
/// Seat order doubles as turn order: a room assigns colors to players by
/// slot position, so `Color::ALL[i]` is the color of the player in slot
/// `i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    /// First seat, start offset 0.
    Red,
    /// Second seat, start offset 13.
    Green,
    /// Third seat, start offset 26.
    Yellow,
    /// Fourth seat, start offset 39.
    Blue,
}

impl Color {
    /// All colors in seat order.
    pub const ALL: [Self; 4] = [Self::Red, Self::Green, Self::Yellow, Self::Blue];

    /// Where this color's relative position 0 sits on the shared ring.
    #[must_use]
    pub const fn start_offset(self) -> u8 {
        match self {
            Self::Red => 0,
            Self::Green => 13,
            Self::Yellow => 26,
            Self::Blue => 39,
        }
    }

    /// Stable index of this color in [`Color::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Red => 0,
            Self::Green => 1,
            Self::Yellow => 2,
            Self::Blue => 3,
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Blue => "blue",
        };
        f.write_str(name)
    }
}

/// Ring cell occupied by a color-relative track position.
///
/// Positions past the ring (52..=55) still alias onto it with the same
/// formula; captures use this mapping for every track token.
#[must_use]
pub const fn global_index(color: Color, pos: u8) -> u8 {
    (color.start_offset() + pos) % TRACK_LEN
}

/// Whether a ring cell is immune to capture.
#[must_use]
pub fn is_safe_cell(global: u8) -> bool {
    SAFE_CELLS.contains(&global)
}

/// State of a single token.
///
/// Makes the position/status invariants unrepresentable rather than
/// checked: a token in base has no position, a finished token needs none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    /// In the yard, not yet on the track. Needs a six to enter.
    Base,
    /// On the track at a color-relative position `0..=55`.
    Track {
        /// Color-relative position.
        pos: u8,
        /// Set while the token has entered play but not yet moved; a
        /// just-spawned mover skips its capture check once.
        just_spawned: bool,
    },
    /// Reached home. Terminal.
    Finished,
}

/// Wire-facing status tag for a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStatus {
    /// In the yard.
    Base,
    /// On the track.
    Track,
    /// Reached home.
    Finished,
}

impl From<TokenState> for TokenStatus {
    fn from(state: TokenState) -> Self {
        match state {
            TokenState::Base => Self::Base,
            TokenState::Track { .. } => Self::Track,
            TokenState::Finished => Self::Finished,
        }
    }
}

/// A single token: stable id within its color plus current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// Id within the color, `0..TOKENS_PER_COLOR`. Doubles as the index
    /// into the color's token array.
    pub id: u8,
    /// Current state.
    pub state: TokenState,
}

impl Token {
    /// One-number projection of the state: `-1` in base, `0..=55` on the
    /// track, `56` finished. This is the wire representation of position.
    #[must_use]
    pub fn pos(&self) -> i8 {
        match self.state {
            TokenState::Base => -1,
            TokenState::Track { pos, .. } => pos as i8,
            TokenState::Finished => HOME_POS as i8,
        }
    }

    /// Wire-facing status tag.
    #[must_use]
    pub fn status(&self) -> TokenStatus {
        self.state.into()
    }
}

/// Descriptor of a captured token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capture {
    /// Color of the captured token.
    pub color: Color,
    /// Id of the captured token within its color.
    pub token_id: u8,
}

/// Result of a successful move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    /// The mover's new wire position (`0..=55` or `56` on finish).
    pub new_pos: i8,
    /// The mover's new status.
    pub status: TokenStatus,
    /// Captured enemy token, if the landing produced one.
    pub capture: Option<Capture>,
}

/// Rule violations for a requested move. All recoverable; the board is
/// left untouched when one is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    /// No token with that id exists for the color.
    #[error("no token {token_id} for {color}")]
    TokenNotFound {
        /// Color the id was looked up under.
        color: Color,
        /// Offending token id.
        token_id: u8,
    },

    /// A token in base can only enter play on a six.
    #[error("token in base needs a six to enter play, rolled {rolled}")]
    NeedSixToOpen {
        /// The dice value that was rolled.
        rolled: u8,
    },

    /// The move would carry the token past home; home must be exact.
    #[error("moving {dice} from {pos} would overshoot home")]
    ExceedsHomeLimit {
        /// Current track position.
        pos: u8,
        /// The dice value that was rolled.
        dice: u8,
    },

    /// The token cannot move at all (already finished).
    #[error("token is finished and cannot move")]
    InvalidMove,
}

/// The full board: four tokens for each of the four colors.
///
/// Every match gets all four colors regardless of player count; colors
/// without a player simply never move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    tokens: [[Token; TOKENS_PER_COLOR as usize]; 4],
}

impl Board {
    /// Create a board with every token in base.
    #[must_use]
    pub fn new() -> Self {
        let tokens = std::array::from_fn(|_| {
            std::array::from_fn(|id| Token { id: id as u8, state: TokenState::Base })
        });
        Self { tokens }
    }

    /// All tokens of one color, indexed by token id.
    #[must_use]
    pub fn tokens(&self, color: Color) -> &[Token; TOKENS_PER_COLOR as usize] {
        &self.tokens[color.index()]
    }

    /// A single token by color and id. `None` if the id is out of range.
    #[must_use]
    pub fn token(&self, color: Color, token_id: u8) -> Option<&Token> {
        self.tokens[color.index()].get(token_id as usize)
    }

    /// Whether every token of the color has finished.
    #[must_use]
    pub fn all_finished(&self, color: Color) -> bool {
        self.tokens(color).iter().all(|t| matches!(t.state, TokenState::Finished))
    }

    /// Validate and execute a move of one token by `dice` steps.
    ///
    /// `dice` must be the dice value in effect for the current roll; the
    /// caller (the room) is responsible for passing its own dice state and
    /// never a client-supplied claim.
    ///
    /// Rules, in order:
    /// - a token in base enters play only on a six, at relative position 0,
    ///   marked just-spawned; entry performs no capture check
    /// - a track token may not overshoot home (`pos + dice > 56` fails)
    /// - landing exactly on home finishes the token with no capture check
    /// - any other landing runs the capture scan unless the cell is safe or
    ///   the mover was just-spawned; the just-spawned mark clears either way
    ///
    /// On error the board is unchanged.
    pub fn execute_move(
        &mut self,
        color: Color,
        token_id: u8,
        dice: u8,
    ) -> Result<MoveOutcome, MoveError> {
        debug_assert!((1..=6).contains(&dice), "dice value out of range: {dice}");

        let state = self
            .token(color, token_id)
            .ok_or(MoveError::TokenNotFound { color, token_id })?
            .state;

        match state {
            TokenState::Base => {
                if dice != 6 {
                    return Err(MoveError::NeedSixToOpen { rolled: dice });
                }

                self.set_state(color, token_id, TokenState::Track { pos: 0, just_spawned: true });

                // Start cells are safe cells, so entry can never capture.
                Ok(MoveOutcome { new_pos: 0, status: TokenStatus::Track, capture: None })
            },

            TokenState::Finished => Err(MoveError::InvalidMove),

            TokenState::Track { pos, just_spawned } => {
                let target = pos + dice;
                if target > HOME_POS {
                    return Err(MoveError::ExceedsHomeLimit { pos, dice });
                }

                if target == HOME_POS {
                    self.set_state(color, token_id, TokenState::Finished);
                    return Ok(MoveOutcome {
                        new_pos: HOME_POS as i8,
                        status: TokenStatus::Finished,
                        capture: None,
                    });
                }

                // The just-spawned mark covers exactly one capture check:
                // the token's first move off its start cell.
                self.set_state(color, token_id, TokenState::Track {
                    pos: target,
                    just_spawned: false,
                });

                let capture = if just_spawned {
                    None
                } else {
                    self.apply_captures(color, global_index(color, target))
                };

                Ok(MoveOutcome { new_pos: target as i8, status: TokenStatus::Track, capture })
            },
        }
    }

    /// Enemy track tokens co-resident on a ring cell.
    ///
    /// Pure scan, no mutation: colors are visited in seat order, tokens in
    /// id order, and the mover's own color is never a victim. Safe cells
    /// yield nothing.
    fn captures_at(&self, mover: Color, global: u8) -> Vec<Capture> {
        if is_safe_cell(global) {
            return Vec::new();
        }

        let mut hits = Vec::new();
        for color in Color::ALL {
            if color == mover {
                continue;
            }
            for token in self.tokens(color) {
                if let TokenState::Track { pos, .. } = token.state {
                    if global_index(color, pos) == global {
                        hits.push(Capture { color, token_id: token.id });
                    }
                }
            }
        }
        hits
    }

    /// Run the capture scan for a landing and send every hit back to base.
    ///
    /// Returns the first hit as the reported descriptor. More than one hit
    /// is only reachable through spawn-immunity letting two colors share a
    /// cell; all of them reset regardless.
    fn apply_captures(&mut self, mover: Color, global: u8) -> Option<Capture> {
        let hits = self.captures_at(mover, global);
        for hit in &hits {
            self.set_state(hit.color, hit.token_id, TokenState::Base);
        }
        hits.first().copied()
    }

    fn set_state(&mut self, color: Color, token_id: u8, state: TokenState) {
        debug_assert!((token_id as usize) < TOKENS_PER_COLOR as usize);
        if let Some(token) = self.tokens[color.index()].get_mut(token_id as usize) {
            token.state = state;
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
