//! WebAssembly bindings for the Circus Maximus engine.
//!
//! Everything crosses the boundary as JSON; failures become `JsValue`
//! strings.

use wasm_bindgen::prelude::*;

use crate::actions::Action;
use crate::bot::{Bot, BotDifficulty};
use crate::engine::{Engine, Seat};
use crate::rules::Ruleset;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn js_error(context: &str, err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{context}: {err}"))
}

/// WASM-exposed engine wrapper
#[wasm_bindgen]
pub struct WasmEngine {
    engine: Engine,
}

#[wasm_bindgen]
impl WasmEngine {
    /// Start a game for a JSON array of seats (`[{"name":"Ann","is_bot":false}]`).
    /// An empty `rules_json` selects the standard rules.
    #[wasm_bindgen(constructor)]
    pub fn new(seats_json: &str, rules_json: &str, seed: Option<u64>) -> Result<WasmEngine, JsValue> {
        let seats: Vec<Seat> =
            serde_json::from_str(seats_json).map_err(|e| js_error("Invalid seats", e))?;
        let rules = if rules_json.trim().is_empty() {
            Ruleset::standard()
        } else {
            Ruleset::from_json(rules_json).map_err(|e| js_error("Invalid rules", e))?
        };

        let mut engine = Engine::new(rules, seed).map_err(|e| js_error("Invalid rules", e))?;
        engine
            .initialize(seats)
            .map_err(|e| js_error("Setup failed", e))?;
        Ok(WasmEngine { engine })
    }

    /// Restore a saved game
    #[wasm_bindgen(js_name = fromSave)]
    pub fn from_save(blob: &str) -> Result<WasmEngine, JsValue> {
        let engine = Engine::load_game(blob).map_err(|e| js_error("Load failed", e))?;
        Ok(WasmEngine { engine })
    }

    /// Full read-only view as JSON
    #[wasm_bindgen(js_name = getView)]
    pub fn get_view(&self) -> String {
        serde_json::to_string(&self.engine.view()).unwrap_or_else(|_| "{}".to_string())
    }

    #[wasm_bindgen(js_name = getCurrentPlayer)]
    pub fn get_current_player(&self) -> Option<u8> {
        self.engine.view().current_player
    }

    /// Valid actions for a participant as a JSON array
    #[wasm_bindgen(js_name = getValidActions)]
    pub fn get_valid_actions(&self, player: u8) -> String {
        let actions = self.engine.valid_actions(player);
        serde_json::to_string(&actions).unwrap_or_else(|_| "[]".to_string())
    }

    /// Apply an action from JSON, returns events JSON or error
    #[wasm_bindgen(js_name = executeAction)]
    pub fn execute_action(&mut self, player: u8, action_json: &str) -> Result<String, JsValue> {
        let action: Action =
            serde_json::from_str(action_json).map_err(|e| js_error("Invalid action JSON", e))?;
        let events = self
            .engine
            .execute_action(player, action)
            .map_err(|e| js_error("Action failed", e))?;
        Ok(serde_json::to_string(&events).unwrap_or_else(|_| "[]".to_string()))
    }

    /// End the active turn, then run any automatic phases
    #[wasm_bindgen(js_name = endTurn)]
    pub fn end_turn(&mut self) -> Result<String, JsValue> {
        let mut events = self
            .engine
            .end_turn()
            .map_err(|e| js_error("End turn failed", e))?;
        events.extend(
            self.engine
                .run_automatic_phases()
                .map_err(|e| js_error("End turn failed", e))?,
        );
        Ok(serde_json::to_string(&events).unwrap_or_else(|_| "[]".to_string()))
    }

    #[wasm_bindgen(js_name = isFinished)]
    pub fn is_finished(&self) -> bool {
        self.engine.is_finished()
    }

    #[wasm_bindgen(js_name = getWinner)]
    pub fn get_winner(&self) -> Option<u8> {
        self.engine.winner()
    }

    /// The event card this participant peeked at, as JSON (or `null`)
    #[wasm_bindgen(js_name = getPeekedEvent)]
    pub fn get_peeked_event(&self, player: u8) -> String {
        match self.engine.peeked_event(player) {
            Some(card) => serde_json::to_string(card).unwrap_or_else(|_| "null".to_string()),
            None => "null".to_string(),
        }
    }

    /// A bot's suggested action for a participant.
    /// difficulty: "Easy" or "Medium"
    #[wasm_bindgen(js_name = getBotAction)]
    pub fn get_bot_action(&self, player: u8, difficulty: &str) -> String {
        let difficulty = match difficulty {
            "Easy" => BotDifficulty::Easy,
            _ => BotDifficulty::Medium,
        };

        let mut bot = Bot::new(player, difficulty);
        match bot.choose_action(&self.engine) {
            Some(action) => serde_json::to_string(&action).unwrap_or_else(|_| "null".to_string()),
            None => "null".to_string(),
        }
    }

    #[wasm_bindgen(js_name = saveGame)]
    pub fn save_game(&self) -> Result<String, JsValue> {
        self.engine.save_game().map_err(|e| js_error("Save failed", e))
    }

    #[wasm_bindgen(js_name = loadGame)]
    pub fn load_game(&mut self, blob: &str) -> Result<(), JsValue> {
        self.engine
            .restore(blob)
            .map_err(|e| js_error("Load failed", e))
    }
}
