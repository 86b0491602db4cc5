//! Gift Escape entry point
//!
//! On the web this only installs logging; the page drives `GiftEscape`.
//! Natively it plays the whole quest headlessly with the autoplay bots.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).expect("Failed to init logger");
    log::info!("Gift Escape starting...");
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use gift_escape::answers::NullSink;
    use gift_escape::autoplay::play_through;
    use gift_escape::persistence::MemoryStore;
    use gift_escape::{QuestController, QuestSettings, Stage};

    env_logger::init();

    // gift-escape [nickname] [seed]
    let mut args = std::env::args().skip(1);
    let nickname = args.next().unwrap_or_else(|| "dev".to_string());
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(42);

    log::info!("Gift Escape (native) starting: autoplay as {} with seed {}", nickname, seed);

    let mut quest = QuestController::load(
        QuestSettings::default(),
        MemoryStore::new(),
        Box::new(NullSink),
        seed,
    );
    if !quest.settings().is_developer(&nickname) {
        log::warn!("{} is not a developer nickname; the full-size puzzle may be out of reach", nickname);
    }

    let reached = play_through(&mut quest, &nickname, 1800.0);
    let bests = quest.bests();
    println!("Reached: {}", reached);
    println!("  snake high score:   {:?}", bests.snake_high_score);
    println!("  catcher high score: {:?}", bests.catcher_high_score);
    println!("  memory best time:   {:?}", bests.memory_best_time);
    println!("  puzzle best moves:  {:?}", bests.puzzle_best_moves);

    if reached != Stage::Revelation {
        std::process::exit(1);
    }
}
