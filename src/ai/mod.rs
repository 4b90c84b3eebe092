//! AI 模块（极小极大搜索与难度策略）。

pub mod minimax;

pub use minimax::{
    best_move, parse_difficulty, random_move, AiAgent, Difficulty, BASE_SCORE,
};
