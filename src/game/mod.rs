//! 游戏核心逻辑模块（棋盘模型、规则引擎、对局状态机）。

pub mod board;
pub mod rules;
pub mod session;

pub use board::{winning_lines, Board, Cell, Mark, BOARD_DIMENSIONS, BOARD_SIZE};
pub use rules::{evaluate, winner, GameOutcome, MoveResult, RuleError};
pub use session::{GameConfig, GameSession, GameStats, IntegrityError, SessionSnapshot};
