use serde::{Deserialize, Serialize};

use super::board::{winning_lines, Board, Mark};
use super::session::IntegrityError;

/// 引擎可恢复的失败原因，全部由调用方负责处理。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum RuleError {
    InvalidMove { index: usize },
    GameNotInProgress,
    NotPlayerTurn,
    NotAiTurn,
    NoAvailableMoves,
    IntegrityViolation { error: IntegrityError },
}

/// 对局结果，仅由 `evaluate` 从棋盘推导。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GameOutcome {
    Playing,
    Won { winner: Mark },
    Draw,
}

impl GameOutcome {
    pub fn is_over(&self) -> bool {
        !matches!(self, GameOutcome::Playing)
    }
}

/// 一次成功落子返回给界面层的载荷。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MoveResult {
    pub new_board: Board,
    pub outcome: GameOutcome,
    pub is_game_over: bool,
}

impl MoveResult {
    pub fn new(new_board: Board, outcome: GameOutcome) -> Self {
        Self {
            new_board,
            outcome,
            is_game_over: outcome.is_over(),
        }
    }
}

/// 占满任一连线的一方。按连线表固定顺序（行、列、对角线）扫描，
/// 返回第一条占满的连线的棋子；双方同时占满属于非法棋局，这里只兜底。
pub fn winner(board: &Board) -> Option<Mark> {
    for line in winning_lines() {
        if let Some(mark) = board.cell(line[0]) {
            if line.iter().all(|&index| board.cell(index) == Some(mark)) {
                return Some(mark);
            }
        }
    }
    None
}

/// 终局判定的唯一入口：先看连线，再看是否下满。
pub fn evaluate(board: &Board) -> GameOutcome {
    if let Some(mark) = winner(board) {
        return GameOutcome::Won { winner: mark };
    }
    if board.is_full() {
        return GameOutcome::Draw;
    }
    GameOutcome::Playing
}
