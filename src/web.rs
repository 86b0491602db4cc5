//! Browser binding
//!
//! The page owns the render loop and calls in with frame time and input; state
//! comes back as a JSON snapshot. Progress lives in `window.localStorage`.

use wasm_bindgen::prelude::*;

use crate::answers::{AnswerRecord, AnswerSink, NullSink, SinkResponse};
use crate::persistence::LocalStore;
use crate::quest::{QuestController, Stage, Verdict};
use crate::settings::QuestSettings;
use crate::sim::Direction;

/// Forwards answers to a page callback taking the record as a JSON string.
/// A callback that throws, or returns `false`, counts as a failed submission.
struct JsCallbackSink {
    callback: js_sys::Function,
}

impl AnswerSink for JsCallbackSink {
    fn submit(&mut self, record: AnswerRecord) -> SinkResponse {
        let json = match serde_json::to_string(&record) {
            Ok(json) => json,
            Err(e) => return SinkResponse::failed(e.to_string()),
        };
        match self.callback.call1(&JsValue::NULL, &JsValue::from_str(&json)) {
            Ok(result) if result.as_bool() == Some(false) => {
                SinkResponse::failed("rejected by endpoint")
            }
            Ok(_) => SinkResponse::ok(),
            Err(e) => SinkResponse::failed(format!("{:?}", e)),
        }
    }
}

fn verdict_str(verdict: Verdict) -> String {
    match verdict {
        Verdict::Accepted => "accepted",
        Verdict::Rejected => "rejected",
        Verdict::Ignored => "ignored",
    }
    .to_string()
}

#[wasm_bindgen]
pub struct GiftEscape {
    quest: QuestController<LocalStore>,
}

#[wasm_bindgen]
impl GiftEscape {
    /// Resume the stored quest. `on_answer` receives every logged answer.
    #[wasm_bindgen(constructor)]
    pub fn new(on_answer: Option<js_sys::Function>) -> GiftEscape {
        let store = LocalStore::new();
        let settings = QuestSettings::load(&store);
        let sink: Box<dyn AnswerSink> = match on_answer {
            Some(callback) => Box::new(JsCallbackSink { callback }),
            None => Box::new(NullSink),
        };
        let seed = js_sys::Date::now() as u64;
        GiftEscape {
            quest: QuestController::load(settings, store, sink, seed),
        }
    }

    /// Current stage name, e.g. `"catch-hearts"`
    pub fn stage(&self) -> String {
        self.quest.current_stage().as_str().to_string()
    }

    /// Full state for rendering
    pub fn snapshot(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.quest.snapshot()).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Frame time in seconds
    pub fn update(&mut self, dt: f32) {
        self.quest.update(dt);
    }

    pub fn login(&mut self, nickname: &str, secret: &str) -> String {
        verdict_str(self.quest.login(nickname, secret))
    }

    pub fn begin(&mut self) -> bool {
        self.quest.begin()
    }

    /// `"up"`, `"down"`, `"left"` or `"right"`; anything else is ignored
    pub fn steer(&mut self, direction: &str) {
        if let Some(direction) = Direction::from_str(direction) {
            self.quest.steer_snake(direction);
        }
    }

    pub fn move_catcher(&mut self, x: f32) {
        self.quest.move_catcher(x);
    }

    pub fn flip_card(&mut self, index: usize) {
        self.quest.flip_card(index);
    }

    pub fn slide_tile(&mut self, index: usize) {
        self.quest.slide_tile(index);
    }

    pub fn retry(&mut self) -> bool {
        self.quest.retry()
    }

    pub fn submit_trivia(&mut self, question_id: u32, answer: &str) -> String {
        verdict_str(self.quest.submit_trivia(question_id, answer))
    }

    pub fn submit_keyword(&mut self, answer: &str) -> String {
        verdict_str(self.quest.submit_keyword(answer))
    }

    /// Jump forward (developer shortcut); never moves backwards
    pub fn advance_to(&mut self, stage: &str) -> bool {
        Stage::from_str(stage).is_some_and(|stage| self.quest.advance_to(stage))
    }

    pub fn reset_progress(&mut self) {
        self.quest.reset_progress();
    }
}
