pub mod ai;
pub mod game;

use gloo_timers::future::TimeoutFuture;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::Promise;

pub use ai::{best_move, parse_difficulty, random_move, AiAgent, Difficulty, BASE_SCORE};
pub use game::{
    evaluate, winner, winning_lines, Board, Cell, GameConfig, GameOutcome, GameSession,
    GameStats, IntegrityError, Mark, MoveResult, RuleError, SessionSnapshot, BOARD_DIMENSIONS,
    BOARD_SIZE,
};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    set_panic_hook();
}

fn to_js_error(error: RuleError) -> JsValue {
    to_value(&error).unwrap_or_else(|serialize_err| JsValue::from_str(&serialize_err.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

/// 面向界面层的对局引擎：内部持有一个 `GameSession`，
/// 所有命令都以 JSON 字符串进出，失败时抛出序列化后的 `RuleError`。
#[wasm_bindgen]
pub struct GameEngine {
    session: GameSession,
}

#[wasm_bindgen]
impl GameEngine {
    /// 可选传入难度字符串；无法识别时回退到 medium。
    #[wasm_bindgen(constructor)]
    pub fn new(difficulty: Option<String>) -> GameEngine {
        let difficulty = difficulty
            .as_deref()
            .map(parse_difficulty)
            .unwrap_or_default();
        GameEngine {
            session: GameSession::new(GameConfig::new(difficulty, Mark::X)),
        }
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.session.state()).map_err(serde_to_js_error)
    }

    /// 用快照覆盖当前会话，快照需通过完整性校验。
    pub fn set_state_json(&mut self, json: &str) -> Result<(), JsValue> {
        let snapshot: SessionSnapshot = serde_json::from_str(json).map_err(serde_to_js_error)?;
        self.session = GameSession::restore(snapshot).map_err(to_js_error)?;
        Ok(())
    }

    pub fn player_move(&mut self, index: usize) -> Result<String, JsValue> {
        let result = self.session.player_move(index).map_err(to_js_error)?;
        serde_json::to_string(&result).map_err(serde_to_js_error)
    }

    pub fn ai_move(&mut self) -> Result<String, JsValue> {
        let result = self.session.ai_move().map_err(to_js_error)?;
        serde_json::to_string(&result).map_err(serde_to_js_error)
    }

    /// 延迟 `delay_ms` 后计算电脑的落子下标，但不落子。
    /// 界面用它做“思考中”的停顿，再调用 `ai_move` 真正执行。
    pub fn think_move(&self, delay_ms: Option<u32>) -> Promise {
        let board = self.session.board();
        let config = self.session.config();
        let delay = delay_ms.unwrap_or(0);

        future_to_promise(async move {
            if delay > 0 {
                TimeoutFuture::new(delay).await;
            }
            let mut agent = AiAgent::new();
            let index = agent
                .choose_move(&board, config.difficulty, config.ai_mark, config.human_mark)
                .map_err(to_js_error)?;
            Ok(JsValue::from_f64(index as f64))
        })
    }

    pub fn new_game(&mut self) {
        self.session.new_game();
    }

    /// 解析失败回退到 medium，再按新难度重开一局。
    pub fn set_difficulty(&mut self, difficulty: &str) {
        self.session.change_difficulty(parse_difficulty(difficulty));
    }

    pub fn set_human_mark(&mut self, mark: JsValue) -> Result<(), JsValue> {
        let mark: Mark = from_value(mark).map_err(serde_to_js_error)?;
        self.session.set_human_mark(mark);
        Ok(())
    }

    pub fn reset_stats(&mut self) {
        self.session.reset_stats();
    }

    pub fn is_player_turn(&self) -> bool {
        self.session.is_player_turn()
    }

    pub fn is_ai_turn(&self) -> bool {
        self.session.is_ai_turn()
    }

    pub fn available_moves(&self) -> Vec<u32> {
        self.session
            .board()
            .available_moves()
            .into_iter()
            .map(|index| index as u32)
            .collect()
    }
}

/// 返回一个空棋盘，方便前端初始化。
#[wasm_bindgen(js_name = "createEmptyBoard")]
pub fn create_empty_board() -> Result<JsValue, JsValue> {
    to_value(&Board::empty()).map_err(JsValue::from)
}

/// 判定棋盘当前的对局结果。
#[wasm_bindgen(js_name = "evaluateGameState")]
pub fn evaluate_game_state(board: JsValue) -> Result<JsValue, JsValue> {
    let board: Board = from_value(board).map_err(JsValue::from)?;
    to_value(&evaluate(&board)).map_err(JsValue::from)
}

/// 检查某个下标是否可以落子。
#[wasm_bindgen(js_name = "isValidMove")]
pub fn is_valid_move(board: JsValue, index: usize) -> Result<bool, JsValue> {
    let board: Board = from_value(board).map_err(JsValue::from)?;
    Ok(board.is_valid_move(index))
}

/// 对指定一方做完整极小极大搜索，返回最优落子下标。
#[wasm_bindgen(js_name = "getBestMove")]
pub fn get_best_move(board: JsValue, player: JsValue, opponent: JsValue) -> Result<usize, JsValue> {
    let board: Board = from_value(board).map_err(JsValue::from)?;
    let player: Mark = from_value(player).map_err(JsValue::from)?;
    let opponent: Mark = from_value(opponent).map_err(JsValue::from)?;
    best_move(&board, player, opponent).map_err(to_js_error)
}

/// 随机挑一个空格。
#[wasm_bindgen(js_name = "getRandomMove")]
pub fn get_random_move(board: JsValue) -> Result<usize, JsValue> {
    let board: Board = from_value(board).map_err(JsValue::from)?;
    let mut rng = SmallRng::from_entropy();
    random_move(&board, &mut rng).map_err(to_js_error)
}

/// 按难度策略选择电脑落子。
#[wasm_bindgen(js_name = "computeAiMove")]
pub fn compute_ai_move(
    board: JsValue,
    difficulty: Option<String>,
    ai_mark: JsValue,
    human_mark: JsValue,
) -> Result<usize, JsValue> {
    let board: Board = from_value(board).map_err(JsValue::from)?;
    let ai_mark: Mark = from_value(ai_mark).map_err(JsValue::from)?;
    let human_mark: Mark = from_value(human_mark).map_err(JsValue::from)?;
    let difficulty = difficulty
        .as_deref()
        .map(parse_difficulty)
        .unwrap_or_default();

    let mut agent = AiAgent::new();
    agent
        .choose_move(&board, difficulty, ai_mark, human_mark)
        .map_err(to_js_error)
}

/// 解析难度字符串，未知输入回退到 "medium"。
#[wasm_bindgen(js_name = "parseDifficulty")]
pub fn parse_difficulty_js(input: &str) -> String {
    parse_difficulty(input).as_str().to_string()
}

/// 所有可选难度，按从易到难排列。
#[wasm_bindgen(js_name = "getDifficultyLevels")]
pub fn get_difficulty_levels() -> Result<JsValue, JsValue> {
    to_value(&Difficulty::ALL).map_err(JsValue::from)
}

/// 难度的展示文案。
#[wasm_bindgen(js_name = "getDifficultyDescription")]
pub fn get_difficulty_description(difficulty: &str) -> String {
    parse_difficulty(difficulty).description().to_string()
}

#[cfg(feature = "console_error_panic_hook")]
fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
fn set_panic_hook() {}
