use std::str::FromStr;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::game::{evaluate, winner, Board, Mark, RuleError};

/// 终局基准分：胜利计 `BASE_SCORE - depth`，越快获胜分越高。
pub const BASE_SCORE: i32 = 100;

/// 电脑难度，决定使用最优解的概率。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// 每步采用最优解的概率。
    pub fn optimal_chance(self) -> f64 {
        match self {
            Difficulty::Easy => 0.3,
            Difficulty::Medium => 0.7,
            Difficulty::Hard => 1.0,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Difficulty::Easy => "AI makes optimal moves 30% of the time",
            Difficulty::Medium => "AI makes optimal moves 70% of the time",
            Difficulty::Hard => "AI always makes optimal moves",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Medium
    }
}

impl FromStr for Difficulty {
    type Err = ();

    /// 仅接受小写的 "easy" | "medium" | "hard"，其余一律拒绝。
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(()),
        }
    }
}

/// 宽松解析：未知输入（含大小写、空白差异）回退到 Medium。
pub fn parse_difficulty(input: &str) -> Difficulty {
    input.parse().unwrap_or_default()
}

fn minimax(
    board: &Board,
    depth: i32,
    is_maximizing: bool,
    mut alpha: i32,
    mut beta: i32,
    max_player: Mark,
    min_player: Mark,
) -> i32 {
    if let Some(mark) = winner(board) {
        return if mark == max_player {
            BASE_SCORE - depth
        } else {
            depth - BASE_SCORE
        };
    }
    if board.is_full() {
        return 0;
    }

    if is_maximizing {
        let mut max_eval = i32::MIN;
        for index in board.available_moves() {
            let next = board.with_cell(index, max_player);
            let eval = minimax(&next, depth + 1, false, alpha, beta, max_player, min_player);
            max_eval = max_eval.max(eval);
            alpha = alpha.max(eval);
            if beta <= alpha {
                break;
            }
        }
        max_eval
    } else {
        let mut min_eval = i32::MAX;
        for index in board.available_moves() {
            let next = board.with_cell(index, min_player);
            let eval = minimax(&next, depth + 1, true, alpha, beta, max_player, min_player);
            min_eval = min_eval.min(eval);
            beta = beta.min(eval);
            if beta <= alpha {
                break;
            }
        }
        min_eval
    }
}

// 同分时的固定偏好：中心 > 四角 > 边。
fn move_priority(index: usize) -> u8 {
    match index {
        4 => 3,
        0 | 2 | 6 | 8 => 2,
        _ => 1,
    }
}

/// 对 `player` 的博弈最优落子。对已分胜负或下满的棋盘返回
/// `NoAvailableMoves`；同分候选按中心、角、边的静态优先级取舍，
/// 与遍历顺序无关。
pub fn best_move(board: &Board, player: Mark, opponent: Mark) -> Result<usize, RuleError> {
    if evaluate(board).is_over() {
        return Err(RuleError::NoAvailableMoves);
    }

    let mut best: Option<(usize, i32, u8)> = None;
    for index in board.available_moves() {
        let next = board.with_cell(index, player);
        let score = minimax(&next, 0, false, i32::MIN, i32::MAX, player, opponent);
        let priority = move_priority(index);
        let better = match best {
            None => true,
            Some((_, best_score, best_priority)) => {
                score > best_score || (score == best_score && priority > best_priority)
            }
        };
        if better {
            best = Some((index, score, priority));
        }
    }

    match best {
        Some((index, _, _)) => Ok(index),
        None => Err(RuleError::NoAvailableMoves),
    }
}

/// 从空格中等概率选一个。
pub fn random_move<R: Rng>(board: &Board, rng: &mut R) -> Result<usize, RuleError> {
    board
        .available_moves()
        .choose(rng)
        .copied()
        .ok_or(RuleError::NoAvailableMoves)
}

/// 电脑棋手：持有自己的随机源，按难度在最优解与随机落子之间选择。
pub struct AiAgent {
    rng: SmallRng,
}

impl AiAgent {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// 抽样 r ∈ [0,1)，r 小于难度对应概率时走最优解，否则随机落子。
    pub fn choose_move(
        &mut self,
        board: &Board,
        difficulty: Difficulty,
        ai_mark: Mark,
        human_mark: Mark,
    ) -> Result<usize, RuleError> {
        let sample = self.rng.gen::<f64>();
        self.choose_move_with_sample(board, difficulty, ai_mark, human_mark, sample)
    }

    /// 由调用方提供样本值的变体，用于确定性测试。
    pub fn choose_move_with_sample(
        &mut self,
        board: &Board,
        difficulty: Difficulty,
        ai_mark: Mark,
        human_mark: Mark,
        sample: f64,
    ) -> Result<usize, RuleError> {
        if sample < difficulty.optimal_chance() {
            best_move(board, ai_mark, human_mark)
        } else {
            random_move(board, &mut self.rng)
        }
    }
}

impl Default for AiAgent {
    fn default() -> Self {
        AiAgent::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::board::Cell;
    use std::collections::HashSet;

    const X: Cell = Some(Mark::X);
    const O: Cell = Some(Mark::O);
    const E: Cell = None;

    #[test]
    fn best_move_on_empty_board_is_center_for_either_mark() {
        let board = Board::empty();
        assert_eq!(best_move(&board, Mark::X, Mark::O), Ok(4));
        assert_eq!(best_move(&board, Mark::O, Mark::X), Ok(4));
    }

    #[test]
    fn best_move_takes_an_immediate_win() {
        let board = Board::from_cells([X, X, E, O, O, E, E, E, E]);
        assert_eq!(best_move(&board, Mark::X, Mark::O), Ok(2));

        let board = Board::from_cells([O, O, E, X, X, E, E, E, E]);
        assert_eq!(best_move(&board, Mark::O, Mark::X), Ok(2));
    }

    #[test]
    fn best_move_blocks_an_imminent_opponent_win() {
        let board = Board::from_cells([X, X, E, O, E, E, E, E, E]);
        assert_eq!(best_move(&board, Mark::O, Mark::X), Ok(2));
    }

    #[test]
    fn best_move_rejects_decided_or_full_boards() {
        let full = Board::from_cells([X, O, X, X, O, O, O, X, X]);
        assert_eq!(best_move(&full, Mark::X, Mark::O), Err(RuleError::NoAvailableMoves));

        let won = Board::from_cells([X, X, X, O, O, E, E, E, E]);
        assert_eq!(best_move(&won, Mark::O, Mark::X), Err(RuleError::NoAvailableMoves));
    }

    fn minimax_exhaustive(
        board: &Board,
        depth: i32,
        is_maximizing: bool,
        max_player: Mark,
        min_player: Mark,
    ) -> i32 {
        if let Some(mark) = winner(board) {
            return if mark == max_player {
                BASE_SCORE - depth
            } else {
                depth - BASE_SCORE
            };
        }
        if board.is_full() {
            return 0;
        }

        let mut best = if is_maximizing { i32::MIN } else { i32::MAX };
        for index in board.available_moves() {
            let mark = if is_maximizing { max_player } else { min_player };
            let next = board.with_cell(index, mark);
            let eval = minimax_exhaustive(&next, depth + 1, !is_maximizing, max_player, min_player);
            best = if is_maximizing {
                best.max(eval)
            } else {
                best.min(eval)
            };
        }
        best
    }

    fn best_move_exhaustive(board: &Board, player: Mark, opponent: Mark) -> usize {
        let mut best: Option<(usize, i32, u8)> = None;
        for index in board.available_moves() {
            let next = board.with_cell(index, player);
            let score = minimax_exhaustive(&next, 0, false, player, opponent);
            let priority = move_priority(index);
            let better = match best {
                None => true,
                Some((_, best_score, best_priority)) => {
                    score > best_score || (score == best_score && priority > best_priority)
                }
            };
            if better {
                best = Some((index, score, priority));
            }
        }
        best.expect("non-terminal board has moves").0
    }

    fn collect_reachable(
        board: Board,
        to_move: Mark,
        seen: &mut HashSet<Board>,
        states: &mut Vec<(Board, Mark)>,
    ) {
        if !seen.insert(board) {
            return;
        }
        if evaluate(&board).is_over() {
            return;
        }
        states.push((board, to_move));
        for index in board.available_moves() {
            collect_reachable(board.with_cell(index, to_move), to_move.opponent(), seen, states);
        }
    }

    #[test]
    fn alpha_beta_matches_exhaustive_search() {
        let mut seen = HashSet::new();
        let mut states = Vec::new();
        collect_reachable(Board::empty(), Mark::X, &mut seen, &mut states);

        let mut compared = 0usize;
        for (board, to_move) in states {
            // Positions with at most seven open cells keep the unpruned
            // reference search cheap while still covering thousands of states.
            if board.available_moves().len() > 7 {
                continue;
            }
            let opponent = to_move.opponent();

            for index in board.available_moves() {
                let next = board.with_cell(index, to_move);
                let pruned = minimax(&next, 0, false, i32::MIN, i32::MAX, to_move, opponent);
                let exhaustive = minimax_exhaustive(&next, 0, false, to_move, opponent);
                assert_eq!(pruned, exhaustive, "score diverged on {:?} move {index}", board);
            }

            let pruned_choice = best_move(&board, to_move, opponent).expect("non-terminal board");
            let exhaustive_choice = best_move_exhaustive(&board, to_move, opponent);
            assert_eq!(pruned_choice, exhaustive_choice, "move diverged on {:?}", board);
            compared += 1;
        }

        assert!(compared > 1000, "expected a large state sample, got {compared}");
    }

    #[test]
    fn random_move_picks_only_open_cells() {
        let board = Board::from_cells([X, E, O, E, X, E, E, O, E]);
        let available: Vec<usize> = board.available_moves();
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..50 {
            let index = random_move(&board, &mut rng).expect("open board has moves");
            assert!(available.contains(&index));
        }
    }

    #[test]
    fn random_move_fails_on_a_full_board() {
        let board = Board::from_cells([X, O, X, X, O, O, O, X, X]);
        let mut rng = SmallRng::seed_from_u64(7);
        assert_eq!(random_move(&board, &mut rng), Err(RuleError::NoAvailableMoves));
    }

    #[test]
    fn hard_difficulty_always_plays_the_optimal_move() {
        let board = Board::from_cells([O, O, E, X, X, E, E, E, E]);
        let optimal = best_move(&board, Mark::O, Mark::X).expect("board is open");
        for seed in 0..20 {
            let mut agent = AiAgent::with_seed(seed);
            let choice = agent
                .choose_move(&board, Difficulty::Hard, Mark::O, Mark::X)
                .expect("board is open");
            assert_eq!(choice, optimal);
        }
    }

    #[test]
    fn easy_difficulty_follows_the_forced_sample() {
        let board = Board::from_cells([O, O, E, X, X, E, E, E, E]);
        let optimal = best_move(&board, Mark::O, Mark::X).expect("board is open");

        let mut agent = AiAgent::with_seed(1);
        let below = agent
            .choose_move_with_sample(&board, Difficulty::Easy, Mark::O, Mark::X, 0.2)
            .expect("board is open");
        assert_eq!(below, optimal);

        let at_threshold = agent
            .choose_move_with_sample(&board, Difficulty::Easy, Mark::O, Mark::X, 0.3)
            .expect("board is open");
        assert!(board.available_moves().contains(&at_threshold));

        let above = agent
            .choose_move_with_sample(&board, Difficulty::Easy, Mark::O, Mark::X, 0.8)
            .expect("board is open");
        assert!(board.available_moves().contains(&above));
    }

    #[test]
    fn medium_difficulty_splits_at_seventy_percent() {
        let board = Board::from_cells([O, O, E, X, X, E, E, E, E]);
        let optimal = best_move(&board, Mark::O, Mark::X).expect("board is open");

        let mut agent = AiAgent::with_seed(2);
        let below = agent
            .choose_move_with_sample(&board, Difficulty::Medium, Mark::O, Mark::X, 0.69)
            .expect("board is open");
        assert_eq!(below, optimal);

        let above = agent
            .choose_move_with_sample(&board, Difficulty::Medium, Mark::O, Mark::X, 0.7)
            .expect("board is open");
        assert!(board.available_moves().contains(&above));
    }

    #[test]
    fn optimal_chances_are_exact() {
        assert_eq!(Difficulty::Easy.optimal_chance(), 0.3);
        assert_eq!(Difficulty::Medium.optimal_chance(), 0.7);
        assert_eq!(Difficulty::Hard.optimal_chance(), 1.0);
    }

    #[test]
    fn parse_difficulty_accepts_exact_lowercase_only() {
        assert_eq!(parse_difficulty("easy"), Difficulty::Easy);
        assert_eq!(parse_difficulty("medium"), Difficulty::Medium);
        assert_eq!(parse_difficulty("hard"), Difficulty::Hard);

        assert_eq!(parse_difficulty("EASY"), Difficulty::Medium);
        assert_eq!(parse_difficulty(" easy"), Difficulty::Medium);
        assert_eq!(parse_difficulty(""), Difficulty::Medium);
        assert_eq!(parse_difficulty("nonsense"), Difficulty::Medium);
    }

    #[test]
    fn difficulty_levels_round_trip_through_as_str() {
        for difficulty in Difficulty::ALL {
            assert_eq!(parse_difficulty(difficulty.as_str()), difficulty);
        }
    }
}
