use serde::{Deserialize, Serialize};

use crate::ai::{AiAgent, Difficulty};

use super::board::{Board, Mark};
use super::rules::{evaluate, GameOutcome, MoveResult, RuleError};

/// 对局配置。`ai_mark` 恒为 `human_mark` 的对手，构造时即保证两者不同。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameConfig {
    pub difficulty: Difficulty,
    pub human_mark: Mark,
    pub ai_mark: Mark,
}

impl GameConfig {
    pub fn new(difficulty: Difficulty, human_mark: Mark) -> Self {
        Self {
            difficulty,
            human_mark,
            ai_mark: human_mark.opponent(),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::new(Difficulty::Medium, Mark::X)
    }
}

/// 会话内累计的战绩，跨 `new_game` 保留，只被 `reset_stats` 清零。
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameStats {
    pub human_wins: u32,
    pub ai_wins: u32,
    pub draws: u32,
}

impl GameStats {
    fn record(&mut self, outcome: &GameOutcome, config: &GameConfig) {
        match outcome {
            GameOutcome::Won { winner } if *winner == config.human_mark => self.human_wins += 1,
            GameOutcome::Won { .. } => self.ai_wins += 1,
            GameOutcome::Draw => self.draws += 1,
            GameOutcome::Playing => {}
        }
    }

    pub fn reset(&mut self) {
        *self = GameStats::default();
    }
}

/// 快照校验失败的原因。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum IntegrityError {
    MarksConflict { mark: Mark },
    CellCountImbalance { x_count: usize, o_count: usize },
}

/// 交给界面层的会话快照，所有字段都是独立拷贝，
/// 修改快照不会影响会话本身。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub board: Board,
    pub current_turn: Mark,
    pub outcome: GameOutcome,
    pub config: GameConfig,
    pub stats: GameStats,
}

/// 人机对局的状态机：串起棋盘、轮次、结果、配置与战绩。
/// 所有变更都经由下面的操作方法；一次操作要么完整提交，要么原样拒绝。
pub struct GameSession {
    board: Board,
    current_turn: Mark,
    outcome: GameOutcome,
    config: GameConfig,
    stats: GameStats,
    agent: AiAgent,
}

impl GameSession {
    pub fn new(config: GameConfig) -> Self {
        Self {
            board: Board::empty(),
            current_turn: config.human_mark,
            outcome: GameOutcome::Playing,
            config,
            stats: GameStats::default(),
            agent: AiAgent::new(),
        }
    }

    /// 固定随机种子的会话，电脑行为可复现。
    pub fn with_seed(config: GameConfig, seed: u64) -> Self {
        Self {
            agent: AiAgent::with_seed(seed),
            ..Self::new(config)
        }
    }

    /// 从快照恢复会话。先做完整性校验，结果一律按棋盘重新推导，
    /// 不信任快照里存的 outcome。这也是测试布置棋局的入口。
    pub fn restore(snapshot: SessionSnapshot) -> Result<Self, RuleError> {
        Self::integrity_check(&snapshot)
            .map_err(|error| RuleError::IntegrityViolation { error })?;

        Ok(Self {
            board: snapshot.board,
            current_turn: snapshot.current_turn,
            outcome: evaluate(&snapshot.board),
            config: snapshot.config,
            stats: snapshot.stats,
            agent: AiAgent::new(),
        })
    }

    fn integrity_check(snapshot: &SessionSnapshot) -> Result<(), IntegrityError> {
        if snapshot.config.human_mark == snapshot.config.ai_mark {
            return Err(IntegrityError::MarksConflict {
                mark: snapshot.config.human_mark,
            });
        }

        let x_count = snapshot
            .board
            .cells()
            .iter()
            .filter(|cell| **cell == Some(Mark::X))
            .count();
        let o_count = snapshot
            .board
            .cells()
            .iter()
            .filter(|cell| **cell == Some(Mark::O))
            .count();
        if x_count.abs_diff(o_count) > 1 {
            return Err(IntegrityError::CellCountImbalance { x_count, o_count });
        }

        Ok(())
    }

    pub fn state(&self) -> SessionSnapshot {
        SessionSnapshot {
            board: self.board,
            current_turn: self.current_turn,
            outcome: self.outcome,
            config: self.config,
            stats: self.stats,
        }
    }

    pub fn board(&self) -> Board {
        self.board
    }

    pub fn config(&self) -> GameConfig {
        self.config
    }

    pub fn stats(&self) -> GameStats {
        self.stats
    }

    pub fn outcome(&self) -> GameOutcome {
        self.outcome
    }

    pub fn current_turn(&self) -> Mark {
        self.current_turn
    }

    pub fn is_player_turn(&self) -> bool {
        !self.outcome.is_over() && self.current_turn == self.config.human_mark
    }

    pub fn is_ai_turn(&self) -> bool {
        !self.outcome.is_over() && self.current_turn == self.config.ai_mark
    }

    fn ensure_in_progress(&self) -> Result<(), RuleError> {
        if self.outcome.is_over() {
            return Err(RuleError::GameNotInProgress);
        }
        Ok(())
    }

    /// 玩家落子。校验顺序：对局进行中 → 轮到玩家 → 落子合法。
    pub fn player_move(&mut self, index: usize) -> Result<MoveResult, RuleError> {
        self.ensure_in_progress()?;
        if self.current_turn != self.config.human_mark {
            return Err(RuleError::NotPlayerTurn);
        }

        let board = self.board.apply_move(index, self.config.human_mark)?;
        Ok(self.commit(board, self.config.ai_mark))
    }

    /// 电脑落子，按会话难度委托给策略层。
    pub fn ai_move(&mut self) -> Result<MoveResult, RuleError> {
        self.ensure_in_progress()?;
        if self.current_turn != self.config.ai_mark {
            return Err(RuleError::NotAiTurn);
        }

        let index = self.agent.choose_move(
            &self.board,
            self.config.difficulty,
            self.config.ai_mark,
            self.config.human_mark,
        )?;
        let board = self.board.apply_move(index, self.config.ai_mark)?;
        Ok(self.commit(board, self.config.human_mark))
    }

    // 校验全部通过后的统一提交点：棋盘、结果、轮次、战绩一起更新。
    // 战绩只在进入终局的这一步记一次，之后的操作都会被挡在校验之前。
    fn commit(&mut self, board: Board, next_turn: Mark) -> MoveResult {
        let outcome = evaluate(&board);
        self.board = board;
        self.current_turn = next_turn;
        if outcome.is_over() {
            self.stats.record(&outcome, &self.config);
        }
        self.outcome = outcome;
        MoveResult::new(board, outcome)
    }

    /// 重开一局：棋盘、轮次、结果复位，战绩保留。
    pub fn new_game(&mut self) {
        self.board = Board::empty();
        self.current_turn = self.config.human_mark;
        self.outcome = GameOutcome::Playing;
    }

    /// 切换难度并重开一局。
    pub fn change_difficulty(&mut self, difficulty: Difficulty) {
        self.config.difficulty = difficulty;
        self.new_game();
    }

    /// 改玩家执子（电脑自动执对手子）并重开一局。
    pub fn set_human_mark(&mut self, mark: Mark) {
        self.config = GameConfig::new(self.config.difficulty, mark);
        self.new_game();
    }

    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }
}

impl Default for GameSession {
    fn default() -> Self {
        GameSession::new(GameConfig::default())
    }
}
