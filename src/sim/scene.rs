//! Scene orchestrator
//!
//! Owns the phase state machine and drives one [`RunState`] through it:
//!
//! ```text
//! character-select -> stage-select -> opening -> playing <-> skill-selection
//!                                                playing <-> paused
//!                                                playing -> game-over | victory -> result
//!                                                result -> character-select
//! ```
//!
//! Only `playing` runs the simulation pipeline. Every other phase runs
//! cosmetic updates at most, so waiting for a skill pick or an unpause never
//! advances gameplay.

use super::events::{EventQueue, GameEvent};
use super::skills::{SkillEffect, SkillId};
use super::state::{RunState, RunSummary, ScenePhase};
use super::stats::Character;
use super::tick::{FrameInput, tick};
use super::timers::{ScheduledAction, TimerQueue};
use super::world::Stage;
use crate::consts::*;
use crate::records::{RecordBook, RecordSink, RunRecord, now_ms, unlocks_for};
use crate::settings::{DebugConfig, Settings};

/// Skill offers per level-up
pub const SKILL_OFFER_COUNT: usize = 3;

pub struct PhysicsSurvivorScene<S: RecordSink = RecordBook> {
    settings: Settings,
    debug: DebugConfig,
    phase: ScenePhase,
    character: Character,
    stage: Stage,
    run: Option<RunState>,
    skill_options: Vec<SkillId>,
    /// Timers on the raw clock (opening, result delay)
    timers: TimerQueue,
    events: EventQueue,
    summary: Option<RunSummary>,
    runs_started: u32,
    destroyed: bool,
    records: S,
}

impl<S: RecordSink> PhysicsSurvivorScene<S> {
    pub fn new(settings: Settings, debug: DebugConfig, records: S) -> Self {
        log::info!("Scene created (seed {:#x})", debug.seed);
        Self {
            settings,
            debug,
            phase: ScenePhase::CharacterSelect,
            character: Character::default(),
            stage: Stage::default(),
            run: None,
            skill_options: Vec::new(),
            timers: TimerQueue::new(),
            events: EventQueue::new(),
            summary: None,
            runs_started: 0,
            destroyed: false,
            records,
        }
    }

    pub fn phase(&self) -> ScenePhase {
        self.phase
    }

    pub fn character(&self) -> Character {
        self.character
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// The current run, from opening until retry
    pub fn run(&self) -> Option<&RunState> {
        self.run.as_ref()
    }

    pub fn skill_options(&self) -> &[SkillId] {
        &self.skill_options
    }

    pub fn summary(&self) -> Option<&RunSummary> {
        self.summary.as_ref()
    }

    pub fn records(&self) -> &S {
        &self.records
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn debug(&self) -> &DebugConfig {
        &self.debug
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Events since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.events.drain()
    }

    fn set_phase(&mut self, to: ScenePhase) {
        let from = self.phase;
        if from == to {
            return;
        }
        self.phase = to;
        log::info!("Phase {} -> {}", from.as_str(), to.as_str());
        self.events.push(GameEvent::PhaseChanged { from, to });
    }

    /// Rejects calls on a torn-down scene
    fn alive(&self, what: &str) -> bool {
        if self.destroyed {
            log::warn!("{} on a destroyed scene ignored", what);
        }
        !self.destroyed
    }

    pub fn select_character(&mut self, character: Character) -> bool {
        if !self.alive("select_character") || self.phase != ScenePhase::CharacterSelect {
            return false;
        }
        self.character = character;
        log::info!(
            "Character {} ({})",
            character.as_str(),
            character.passive().as_str()
        );
        self.set_phase(ScenePhase::StageSelect);
        if let Some(stage) = self.debug.forced_stage {
            self.select_stage(stage);
        }
        true
    }

    pub fn select_stage(&mut self, stage: Stage) -> bool {
        if !self.alive("select_stage") || self.phase != ScenePhase::StageSelect {
            return false;
        }
        self.stage = stage;
        self.start_run();
        true
    }

    fn start_run(&mut self) {
        let run_debug = DebugConfig {
            seed: self.debug.seed.wrapping_add(self.runs_started as u64),
            ..self.debug.clone()
        };
        self.runs_started += 1;
        self.run = Some(RunState::new(
            self.character,
            self.stage,
            &self.settings,
            &run_debug,
        ));
        self.summary = None;
        self.skill_options.clear();
        self.timers.clear();
        self.events.push(GameEvent::RunStarted { stage: self.stage });

        if self.debug.skip_opening {
            self.set_phase(ScenePhase::Playing);
        } else {
            self.set_phase(ScenePhase::Opening);
            self.timers.schedule(OPENING_SECS, ScheduledAction::EndOpening);
        }
    }

    /// Pause from playing, resume from paused. Anything else is ignored.
    pub fn toggle_pause(&mut self) -> bool {
        if !self.alive("toggle_pause") {
            return false;
        }
        match self.phase {
            ScenePhase::Playing => self.set_phase(ScenePhase::Paused),
            ScenePhase::Paused => self.set_phase(ScenePhase::Playing),
            _ => return false,
        }
        true
    }

    /// Resolve one pending level-up with the offered skill at `index`
    pub fn choose_skill(&mut self, index: usize) -> bool {
        if !self.alive("choose_skill") || self.phase != ScenePhase::SkillSelection {
            return false;
        }
        let Some(&id) = self.skill_options.get(index) else {
            return false;
        };
        let Some(run) = self.run.as_mut() else {
            return false;
        };

        let def = id.def();
        let level = match def.effect {
            SkillEffect::Heal(fraction) => {
                run.player.heal(run.player.max_health * fraction);
                0
            }
            _ => run.skills.add(id),
        };
        run.recalculate_stats();
        run.progress.resolve_level_up();
        log::debug!("Skill {} -> level {}", id.as_str(), level);
        self.events.push(GameEvent::SkillChosen { id, level });

        if run.progress.pending_level_ups() > 0 {
            self.offer_skills();
        } else {
            self.skill_options.clear();
            self.set_phase(ScenePhase::Playing);
        }
        true
    }

    fn offer_skills(&mut self) {
        let Some(run) = self.run.as_mut() else {
            return;
        };
        self.skill_options = run.skills.roll_options(SKILL_OFFER_COUNT, &mut run.rng);
        self.events.push(GameEvent::SkillOffer {
            options: self.skill_options.clone(),
        });
    }

    /// Back to character select from the result screen
    pub fn retry(&mut self) -> bool {
        if !self.alive("retry") || self.phase != ScenePhase::Result {
            return false;
        }
        self.run = None;
        self.summary = None;
        self.skill_options.clear();
        self.timers.clear();
        self.set_phase(ScenePhase::CharacterSelect);
        true
    }

    /// Tear down. Pending timers are dropped and later calls are ignored.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.timers.update(0.0, true);
        if let Some(run) = self.run.as_mut() {
            run.timers.update(0.0, true);
        }
        log::info!("Scene destroyed");
    }

    /// Advance one frame of `raw_dt` seconds
    pub fn update(&mut self, raw_dt: f32, input: &FrameInput) {
        if !self.alive("update") {
            return;
        }
        let raw = self.debug.scale_delta(raw_dt).min(MAX_FRAME_DT);
        if input.pause {
            self.toggle_pause();
        }

        if self.phase.is_simulating() {
            self.update_playing(raw, input);
            return;
        }
        // Feedback keeps fading while the run clock is held
        if self.phase.in_run() {
            if let Some(run) = self.run.as_mut() {
                run.impact.update_cosmetic(raw);
                run.damage_text.update(raw);
            }
        }
        if matches!(
            self.phase,
            ScenePhase::Opening | ScenePhase::GameOver | ScenePhase::Victory
        ) {
            if let Some(run) = self.run.as_mut() {
                run.anim_time += raw;
            }
            for action in self.timers.update(raw, self.destroyed) {
                self.run_scheduled(action);
            }
        }
    }

    fn update_playing(&mut self, raw: f32, input: &FrameInput) {
        let Some(run) = self.run.as_mut() else {
            log::warn!("Playing without a run, returning to character select");
            self.set_phase(ScenePhase::CharacterSelect);
            return;
        };
        let outcome = tick(run, input, raw, &self.debug, self.destroyed, &mut self.events);

        if outcome.player_died {
            self.end_run(false);
        } else if outcome.victory {
            self.end_run(true);
        } else if outcome.level_up {
            self.set_phase(ScenePhase::SkillSelection);
            self.offer_skills();
        }
    }

    fn run_scheduled(&mut self, action: ScheduledAction) {
        match action {
            ScheduledAction::EndOpening => {
                if self.phase == ScenePhase::Opening {
                    self.set_phase(ScenePhase::Playing);
                }
            }
            ScheduledAction::ShowResult => self.show_result(),
            ScheduledAction::SpawnBoss | ScheduledAction::ExpireExplosion(_) => {
                log::warn!("{:?} scheduled on the scene clock, ignoring", action);
            }
        }
    }

    fn end_run(&mut self, victory: bool) {
        if let Some(run) = self.run.as_mut() {
            run.impact.slow_motion(0.2, RESULT_DELAY_SECS);
            log::info!(
                "{} at {:.1}s: level {}, {} kills",
                if victory { "Victory" } else { "Game over" },
                run.game_time,
                run.progress.level,
                run.kills
            );
        }
        self.set_phase(if victory {
            ScenePhase::Victory
        } else {
            ScenePhase::GameOver
        });
        self.timers
            .schedule(RESULT_DELAY_SECS, ScheduledAction::ShowResult);
    }

    fn show_result(&mut self) {
        let victory = self.phase == ScenePhase::Victory;
        let Some(run) = self.run.as_ref() else {
            return;
        };
        let summary = run.summary(victory);

        self.records
            .record_result(&RunRecord::from_summary(&summary, now_ms()));
        for item in unlocks_for(&summary) {
            self.records.unlock(&item);
        }
        log::info!("Result: rank {} score {}", summary.rank.as_str(), summary.score);

        self.events.push(GameEvent::RunEnded {
            summary: summary.clone(),
        });
        self.summary = Some(summary);
        self.set_phase(ScenePhase::Result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::enemy::EnemyTier;
    use crate::sim::impact::ImpactKind;
    use crate::sim::progress::xp_threshold;
    use glam::Vec2;

    fn scene_with(debug: DebugConfig) -> PhysicsSurvivorScene {
        PhysicsSurvivorScene::new(Settings::default(), debug, RecordBook::new())
    }

    fn playing_scene() -> PhysicsSurvivorScene {
        let mut scene = scene_with(DebugConfig {
            skip_opening: true,
            invincible: true,
            ..DebugConfig::default()
        });
        assert!(scene.select_character(Character::Newton));
        assert!(scene.select_stage(Stage::GravityField));
        assert_eq!(scene.phase(), ScenePhase::Playing);
        scene
    }

    fn frame(scene: &mut PhysicsSurvivorScene) {
        scene.update(FRAME_DT, &FrameInput::default());
    }

    fn offers(events: &[GameEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, GameEvent::SkillOffer { .. }))
            .count()
    }

    #[test]
    fn test_menu_flow_and_opening() {
        let mut scene = scene_with(DebugConfig::default());
        assert!(!scene.select_stage(Stage::CrusherPit));
        assert!(scene.select_character(Character::Curie));
        assert!(!scene.select_character(Character::Tesla));
        assert!(scene.select_stage(Stage::CrusherPit));
        assert_eq!(scene.phase(), ScenePhase::Opening);

        let frames = (OPENING_SECS / FRAME_DT) as usize + 5;
        for _ in 0..frames {
            frame(&mut scene);
        }
        assert_eq!(scene.phase(), ScenePhase::Playing);
        assert_eq!(scene.run().map(|r| r.stage), Some(Stage::CrusherPit));
    }

    #[test]
    fn test_forced_stage_skips_stage_select() {
        let mut scene = scene_with(DebugConfig {
            forced_stage: Some(Stage::RepulsionZone),
            ..DebugConfig::default()
        });
        scene.select_character(Character::Tesla);
        assert_eq!(scene.phase(), ScenePhase::Opening);
        assert_eq!(scene.stage(), Stage::RepulsionZone);
    }

    #[test]
    fn test_each_pending_level_gets_its_own_offer() {
        let mut scene = playing_scene();
        let player = scene.run().map(|r| r.player.pos).unwrap();
        scene.run.as_mut().unwrap().orbs.spawn(player, xp_threshold(4));
        scene.drain_events();

        frame(&mut scene);
        assert_eq!(scene.phase(), ScenePhase::SkillSelection);
        assert_eq!(scene.run().unwrap().progress.pending_level_ups(), 3);

        let mut events = scene.drain_events();
        for _ in 0..3 {
            assert_eq!(scene.phase(), ScenePhase::SkillSelection);
            assert!(scene.choose_skill(0));
            events.extend(scene.drain_events());
        }
        assert_eq!(offers(&events), 3);
        assert_eq!(scene.phase(), ScenePhase::Playing);
        assert_eq!(scene.run().unwrap().progress.pending_level_ups(), 0);
        assert!(!scene.choose_skill(0));
    }

    #[test]
    fn test_skill_selection_freezes_simulation() {
        let mut scene = playing_scene();
        for _ in 0..90 {
            frame(&mut scene);
        }
        let player = scene.run().unwrap().player.pos;
        scene.run.as_mut().unwrap().orbs.spawn(player, 50);
        frame(&mut scene);
        assert_eq!(scene.phase(), ScenePhase::SkillSelection);

        let run = scene.run().unwrap();
        let time = run.game_time;
        let positions: Vec<Vec2> = run.enemies.enemies().iter().map(|e| e.pos).collect();
        let shots = run.projectiles.projectiles().len();
        for _ in 0..120 {
            frame(&mut scene);
        }
        let run = scene.run().unwrap();
        assert_eq!(run.game_time, time);
        let after: Vec<Vec2> = run.enemies.enemies().iter().map(|e| e.pos).collect();
        assert_eq!(after, positions);
        assert_eq!(run.projectiles.projectiles().len(), shots);
    }

    #[test]
    fn test_pause_only_from_playing() {
        let mut scene = playing_scene();
        let pause = FrameInput {
            pause: true,
            ..FrameInput::default()
        };
        scene.update(FRAME_DT, &pause);
        assert_eq!(scene.phase(), ScenePhase::Paused);
        let time = scene.run().unwrap().game_time;
        for _ in 0..60 {
            frame(&mut scene);
        }
        assert_eq!(scene.run().unwrap().game_time, time);

        scene.update(FRAME_DT, &pause);
        assert_eq!(scene.phase(), ScenePhase::Playing);

        let mut menu = scene_with(DebugConfig::default());
        assert!(!menu.toggle_pause());
        assert_eq!(menu.phase(), ScenePhase::CharacterSelect);
    }

    #[test]
    fn test_feedback_fades_while_paused() {
        let mut scene = playing_scene();
        frame(&mut scene);
        let pause = FrameInput {
            pause: true,
            ..FrameInput::default()
        };
        scene.update(FRAME_DT, &pause);
        assert_eq!(scene.phase(), ScenePhase::Paused);

        let run = scene.run.as_mut().unwrap();
        run.impact.trigger(ImpactKind::PlayerHurt, Vec2::ZERO);
        let time = run.game_time;
        let flash = run.impact.flash().alpha();
        let sparks = run.impact.particles().pool().active_len();
        assert!(flash > 0.0);
        assert!(sparks > 0);

        for _ in 0..120 {
            frame(&mut scene);
        }
        let run = scene.run().unwrap();
        assert_eq!(run.game_time, time);
        assert_eq!(run.impact.flash().alpha(), 0.0);
        assert!(run.impact.particles().pool().active_len() < sparks);
    }

    #[test]
    fn test_game_over_records_result_and_retry() {
        let mut scene = scene_with(DebugConfig {
            skip_opening: true,
            ..DebugConfig::default()
        });
        scene.select_character(Character::Newton);
        scene.select_stage(Stage::EventHorizon);
        scene.run.as_mut().unwrap().player.health = 0.0;
        frame(&mut scene);
        assert_eq!(scene.phase(), ScenePhase::GameOver);

        let frames = (RESULT_DELAY_SECS / FRAME_DT) as usize + 5;
        for _ in 0..frames {
            frame(&mut scene);
        }
        assert_eq!(scene.phase(), ScenePhase::Result);
        assert_eq!(scene.records().runs_played, 1);
        let summary = scene.summary().unwrap();
        assert!(!summary.victory);

        assert!(scene.retry());
        assert_eq!(scene.phase(), ScenePhase::CharacterSelect);
        assert!(scene.run().is_none());
    }

    #[test]
    fn test_victory_unlocks_skin() {
        let mut scene = playing_scene();
        scene.run.as_mut().unwrap().game_time = VICTORY_TIME;
        frame(&mut scene);
        assert_eq!(scene.phase(), ScenePhase::Victory);
        for _ in 0..((RESULT_DELAY_SECS / FRAME_DT) as usize + 5) {
            frame(&mut scene);
        }
        assert_eq!(scene.phase(), ScenePhase::Result);
        assert!(scene.records().is_unlocked("victory-skin-newton"));
    }

    #[test]
    fn test_destroyed_scene_ignores_everything() {
        let mut scene = playing_scene();
        scene
            .run
            .as_mut()
            .unwrap()
            .enemies
            .spawn_at_tier(EnemyTier::Small, Vec2::new(100.0, 0.0), 1.0);
        scene.destroy();
        let time = scene.run().unwrap().game_time;
        for _ in 0..30 {
            frame(&mut scene);
        }
        assert_eq!(scene.run().unwrap().game_time, time);
        assert!(!scene.toggle_pause());
        assert!(scene.is_destroyed());
    }

    #[test]
    fn test_empty_pool_offers_recovery() {
        let mut scene = playing_scene();
        {
            let run = scene.run.as_mut().unwrap();
            for def in crate::sim::skills::SKILLS {
                for _ in 0..def.max_level.min(20) {
                    run.skills.add(def.id);
                }
            }
            run.player.health = 10.0;
            let pos = run.player.pos;
            run.orbs.spawn(pos, 10);
        }
        frame(&mut scene);
        assert_eq!(scene.skill_options(), &[SkillId::EnergyConservation]);
        assert!(scene.choose_skill(0));
        let run = scene.run().unwrap();
        assert!(run.player.health > 10.0);
    }
}
