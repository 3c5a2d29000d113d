//! Physics Survivor entry point
//!
//! On wasm32 this exports a [`WasmGame`] handle that the page drives once per
//! animation frame. Natively it plays a seeded autopilot run and logs the
//! outcome, which is handy for balancing and for reproducing a seed.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use wasm_bindgen::prelude::*;

    use physics_survivor::render::FilterUniforms;
    use physics_survivor::sim::{Character, FrameInput, Joystick, PhysicsSurvivorScene, Stage};
    use physics_survivor::{DebugConfig, RecordBook, Settings};

    /// Scene handle owned by the page
    #[wasm_bindgen]
    pub struct WasmGame {
        scene: PhysicsSurvivorScene,
        input: FrameInput,
    }

    #[wasm_bindgen]
    impl WasmGame {
        #[wasm_bindgen(constructor)]
        pub fn new(seed: u32) -> WasmGame {
            let debug = DebugConfig {
                seed: seed as u64,
                ..DebugConfig::default()
            };
            log::info!("New game with seed {}", seed);
            WasmGame {
                scene: PhysicsSurvivorScene::new(Settings::load(), debug, RecordBook::load()),
                input: FrameInput::default(),
            }
        }

        /// Joystick sample; `dx`/`dy` in [-1, 1]
        pub fn set_joystick(&mut self, dx: f32, dy: f32, active: bool) {
            let dir = glam::Vec2::new(dx, dy);
            self.input.joystick = Joystick {
                dir: dir.normalize_or_zero(),
                magnitude: dir.length().min(1.0),
                active,
            };
        }

        /// Toggle pause on the next update (tab hidden, pause button)
        pub fn request_pause(&mut self) {
            self.input.pause = true;
        }

        /// Advance by `dt` seconds of wall time
        pub fn update(&mut self, dt: f32) {
            self.scene.update(dt, &self.input);
            self.input.pause = false;
        }

        pub fn select_character(&mut self, id: &str) -> bool {
            match serde_json::from_value::<Character>(serde_json::Value::String(id.to_string())) {
                Ok(character) => self.scene.select_character(character),
                Err(_) => {
                    log::warn!("Unknown character '{}'", id);
                    false
                }
            }
        }

        pub fn select_stage(&mut self, id: &str) -> bool {
            match Stage::from_str(id) {
                Some(stage) => self.scene.select_stage(stage),
                None => {
                    log::warn!("Unknown stage '{}'", id);
                    false
                }
            }
        }

        pub fn choose_skill(&mut self, index: usize) -> bool {
            self.scene.choose_skill(index)
        }

        pub fn retry(&mut self) -> bool {
            self.scene.retry()
        }

        pub fn phase(&self) -> String {
            self.scene.phase().as_str().to_string()
        }

        /// Offered skill ids as a JSON array
        pub fn skill_options(&self) -> String {
            serde_json::to_string(self.scene.skill_options()).unwrap_or_else(|_| "[]".to_string())
        }

        /// Events since the last call as a JSON array
        pub fn drain_events(&mut self) -> String {
            let events = self.scene.drain_events();
            serde_json::to_string(&events).unwrap_or_else(|e| {
                log::warn!("Dropping {} events: {}", events.len(), e);
                "[]".to_string()
            })
        }

        /// Filter uniform block bytes for this frame
        pub fn uniforms(&self, width: f32, height: f32) -> Vec<u8> {
            FilterUniforms::from_scene(&self.scene, width, height)
                .as_bytes()
                .to_vec()
        }

        pub fn destroy(&mut self) {
            self.scene.destroy();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger already initialized".into());
    }
    log::info!("Physics Survivor (wasm) ready");
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Physics Survivor (native) starting autopilot run...");
    autopilot::run(physics_survivor::DebugConfig::from_env());
}

#[cfg(not(target_arch = "wasm32"))]
mod autopilot {
    use glam::Vec2;

    use physics_survivor::consts::*;
    use physics_survivor::sim::{
        Character, FrameInput, GameEvent, Joystick, PhysicsSurvivorScene, RunState, ScenePhase,
        Stage,
    };
    use physics_survivor::{DebugConfig, RecordBook, Settings};

    /// Enemies closer than this push the autopilot away
    const THREAT_RADIUS: f32 = 260.0;
    /// Wall-clock cap, in frames, for one session
    const MAX_FRAMES: u32 = 60 * 60 * 15;

    pub fn run(debug: DebugConfig) {
        let character = Character::ALL[(debug.seed % 4) as usize];
        let stage = Stage::ALL[((debug.seed / 4) % 4) as usize];
        let mut scene = PhysicsSurvivorScene::new(Settings::default(), debug, RecordBook::new());

        scene.select_character(character);
        if scene.phase() == ScenePhase::StageSelect {
            scene.select_stage(stage);
        }

        let mut level_ups = 0;
        let mut merges = 0;
        for frame in 0..MAX_FRAMES {
            match scene.phase() {
                ScenePhase::SkillSelection => {
                    scene.choose_skill(0);
                }
                ScenePhase::Result => break,
                _ => {
                    let joystick = scene.run().map(steer).unwrap_or_default();
                    scene.update(
                        FRAME_DT,
                        &FrameInput {
                            joystick,
                            pause: false,
                        },
                    );
                }
            }

            for event in scene.drain_events() {
                match event {
                    GameEvent::LevelUp { level } => {
                        level_ups += 1;
                        log::debug!("Level {} at frame {}", level, frame);
                    }
                    GameEvent::EnemiesMerged { .. } => merges += 1,
                    GameEvent::BossSpawned { id } => log::info!("Boss #{} spawned", id),
                    GameEvent::RunEnded { summary } => log::info!(
                        "{} on {}: survived {:.1}s, level {}, {} kills, score {}, rank {}",
                        summary.character.as_str(),
                        summary.stage.as_str(),
                        summary.survived_secs,
                        summary.level,
                        summary.kills,
                        summary.score,
                        summary.rank.as_str()
                    ),
                    _ => {}
                }
            }
        }

        log::info!(
            "Autopilot finished in phase {}: {} level-ups, {} merges",
            scene.phase().as_str(),
            level_ups,
            merges
        );
    }

    /// Kite away from nearby enemies, otherwise drift toward the nearest orb
    fn steer(run: &RunState) -> Joystick {
        let player = run.player.pos;
        let mut away = Vec2::ZERO;
        for enemy in run.enemies.enemies() {
            let offset = player - enemy.pos;
            let dist = offset.length();
            if dist > 0.0 && dist < THREAT_RADIUS {
                away += offset / (dist * dist);
            }
        }
        if away != Vec2::ZERO {
            // Circle a little so the player is not pinned against a crowd
            return Joystick::toward(away.normalize() + away.normalize().perp() * 0.4);
        }

        run.orbs
            .orbs()
            .iter()
            .min_by(|a, b| {
                a.pos
                    .distance_squared(player)
                    .total_cmp(&b.pos.distance_squared(player))
            })
            .map(|orb| Joystick::toward(orb.pos - player))
            .unwrap_or_default()
    }
}
