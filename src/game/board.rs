use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::rules::RuleError;

/// 棋盘边长。
pub const BOARD_DIMENSIONS: usize = 3;
/// 格子总数。
pub const BOARD_SIZE: usize = BOARD_DIMENSIONS * BOARD_DIMENSIONS;

/// 单个格子：空或某一方的棋子。
pub type Cell = Option<Mark>;

/// 双方棋子标记。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub fn opponent(self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

/// 3×3 棋盘，按行优先存储，取值语义：每次落子产生新棋盘。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Board {
    cells: [Cell; BOARD_SIZE],
}

impl Board {
    pub fn empty() -> Self {
        Self {
            cells: [None; BOARD_SIZE],
        }
    }

    pub fn from_cells(cells: [Cell; BOARD_SIZE]) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[Cell; BOARD_SIZE] {
        &self.cells
    }

    /// 越界下标返回空，不会 panic。
    pub fn cell(&self, index: usize) -> Cell {
        self.cells.get(index).copied().flatten()
    }

    /// 合法落子：下标在界内且格子为空。只报告，不报错。
    pub fn is_valid_move(&self, index: usize) -> bool {
        index < BOARD_SIZE && self.cells[index].is_none()
    }

    /// 落子并返回新棋盘，原棋盘保持不变。
    pub fn apply_move(&self, index: usize, mark: Mark) -> Result<Board, RuleError> {
        if !self.is_valid_move(index) {
            return Err(RuleError::InvalidMove { index });
        }
        Ok(self.with_cell(index, mark))
    }

    pub(crate) fn with_cell(&self, index: usize, mark: Mark) -> Board {
        let mut cells = self.cells;
        cells[index] = Some(mark);
        Board { cells }
    }

    /// 所有空格下标，升序。
    pub fn available_moves(&self) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_none())
            .map(|(index, _)| index)
            .collect()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|cell| cell.is_some())
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::empty()
    }
}

impl From<[Cell; BOARD_SIZE]> for Board {
    fn from(cells: [Cell; BOARD_SIZE]) -> Self {
        Board::from_cells(cells)
    }
}

static WINNING_LINES: Lazy<Vec<Vec<usize>>> =
    Lazy::new(|| generate_winning_lines(BOARD_DIMENSIONS));

/// 获胜连线表：3 行、3 列、2 条对角线，启动时生成一次。
/// 顺序固定为行、列、主对角线、副对角线，`winner` 按此顺序扫描。
pub fn winning_lines() -> &'static [Vec<usize>] {
    &WINNING_LINES
}

fn generate_winning_lines(n: usize) -> Vec<Vec<usize>> {
    let mut lines = Vec::with_capacity(2 * n + 2);

    for row in 0..n {
        lines.push((0..n).map(|col| row * n + col).collect());
    }

    for col in 0..n {
        lines.push((0..n).map(|row| row * n + col).collect());
    }

    lines.push((0..n).map(|i| i * n + i).collect());
    lines.push((0..n).map(|i| i * n + (n - 1 - i)).collect());

    lines
}
