//! Rendering seam
//!
//! The simulation never touches drawables. A host adapter implements
//! [`Visual`] and [`VisualFactory`]; [`SceneVisuals`] keeps one handle per
//! live entity, pushing transforms each frame and destroying handles whose
//! entity is gone. Entity records own their visuals, never the reverse.
//!
//! The distortion filters get a [`FilterUniforms`] block per frame and
//! return nothing.

use std::collections::BTreeMap;

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::records::RecordSink;
use crate::sim::enemy::EnemyTier;
use crate::sim::scene::PhysicsSurvivorScene;
use crate::sim::state::{EXPLOSION_RING_SECS, RunState};
use crate::{ease_out_cubic, heading};

/// Capability interface for one drawable
pub trait Visual {
    fn set_transform(&mut self, pos: Vec2, scale: f32, rotation: f32);
    fn set_alpha(&mut self, alpha: f32);
    fn set_visible(&mut self, visible: bool);
    /// Text content, for drawables that carry a label
    fn set_text(&mut self, _text: &str) {}
    fn destroy(&mut self);
}

/// What a drawable depicts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualKind {
    Player,
    Enemy(EnemyTier),
    Projectile,
    Orb,
    Explosion,
    DamageText,
    Particle,
}

/// Host-side constructor for drawables
pub trait VisualFactory {
    type Handle: Visual;
    fn create(&mut self, kind: VisualKind) -> Self::Handle;
}

/// Drawable state for one entity this frame
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub id: u32,
    pub kind: VisualKind,
    pub pos: Vec2,
    pub scale: f32,
    pub rotation: f32,
    pub alpha: f32,
    pub text: Option<String>,
}

impl Sprite {
    fn new(id: u32, kind: VisualKind, pos: Vec2) -> Self {
        Self {
            id,
            kind,
            pos,
            scale: 1.0,
            rotation: 0.0,
            alpha: 1.0,
            text: None,
        }
    }
}

/// Handles for one entity family, keyed by entity id
#[derive(Debug)]
pub struct VisualSync<H: Visual> {
    handles: BTreeMap<u32, H>,
}

impl<H: Visual> Default for VisualSync<H> {
    fn default() -> Self {
        Self {
            handles: BTreeMap::new(),
        }
    }
}

impl<H: Visual> VisualSync<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create handles for new ids, update the rest, destroy the ones not seen.
    /// Returns how many handles were destroyed.
    pub fn sync<F>(&mut self, sprites: impl IntoIterator<Item = Sprite>, factory: &mut F) -> usize
    where
        F: VisualFactory<Handle = H>,
    {
        let mut seen = Vec::new();
        for sprite in sprites {
            let handle = self.handles.entry(sprite.id).or_insert_with(|| {
                let mut handle = factory.create(sprite.kind);
                handle.set_visible(true);
                handle
            });
            handle.set_transform(sprite.pos, sprite.scale, sprite.rotation);
            handle.set_alpha(sprite.alpha);
            if let Some(text) = &sprite.text {
                handle.set_text(text);
            }
            seen.push(sprite.id);
        }

        seen.sort_unstable();
        let stale: Vec<u32> = self
            .handles
            .keys()
            .copied()
            .filter(|id| seen.binary_search(id).is_err())
            .collect();
        for id in &stale {
            if let Some(mut handle) = self.handles.remove(id) {
                handle.destroy();
            }
        }
        stale.len()
    }

    pub fn get(&self, id: u32) -> Option<&H> {
        self.handles.get(&id)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Destroy every handle
    pub fn clear(&mut self) {
        for (_, mut handle) in std::mem::take(&mut self.handles) {
            handle.destroy();
        }
    }
}

/// All drawables for a running scene
#[derive(Debug)]
pub struct SceneVisuals<H: Visual> {
    pub player: VisualSync<H>,
    pub enemies: VisualSync<H>,
    pub projectiles: VisualSync<H>,
    pub orbs: VisualSync<H>,
    pub explosions: VisualSync<H>,
    /// Keyed by pool slot, so a recycled entry keeps its drawable
    pub damage_text: VisualSync<H>,
    pub particles: VisualSync<H>,
}

impl<H: Visual> Default for SceneVisuals<H> {
    fn default() -> Self {
        Self {
            player: VisualSync::new(),
            enemies: VisualSync::new(),
            projectiles: VisualSync::new(),
            orbs: VisualSync::new(),
            explosions: VisualSync::new(),
            damage_text: VisualSync::new(),
            particles: VisualSync::new(),
        }
    }
}

impl<H: Visual> SceneVisuals<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push this frame's state. With no run, everything is torn down.
    pub fn sync<F>(&mut self, run: Option<&RunState>, factory: &mut F)
    where
        F: VisualFactory<Handle = H>,
    {
        let Some(run) = run else {
            self.clear();
            return;
        };

        self.player.sync(std::iter::once(player_sprite(run)), factory);
        self.enemies.sync(
            run.enemies.enemies().iter().filter(|e| !e.is_dead()).map(|e| {
                let mut sprite = Sprite::new(e.id, VisualKind::Enemy(e.tier), e.pos);
                sprite.scale = 1.0 + 0.06 * e.wobble_phase.sin() + 0.15 * e.hit_flash;
                sprite
            }),
            factory,
        );
        self.projectiles.sync(
            run.projectiles
                .projectiles()
                .iter()
                .filter(|p| p.is_alive())
                .map(|p| {
                    let mut sprite = Sprite::new(p.id, VisualKind::Projectile, p.pos);
                    sprite.scale = p.radius;
                    sprite.rotation = heading(p.vel);
                    sprite
                }),
            factory,
        );
        self.orbs.sync(
            run.orbs
                .orbs()
                .iter()
                .map(|o| Sprite::new(o.id, VisualKind::Orb, o.pos)),
            factory,
        );
        self.explosions.sync(
            run.explosions.iter().map(|x| {
                let t = (x.age / EXPLOSION_RING_SECS).clamp(0.0, 1.0);
                let mut sprite = Sprite::new(x.id, VisualKind::Explosion, x.pos);
                sprite.scale = x.radius * ease_out_cubic(t);
                sprite.alpha = 1.0 - t;
                sprite
            }),
            factory,
        );
        self.damage_text.sync(
            run.damage_text.iter().map(|(handle, text)| {
                let mut sprite =
                    Sprite::new(handle.index() as u32, VisualKind::DamageText, text.position());
                sprite.scale = text.scale();
                sprite.alpha = text.alpha();
                sprite.text = Some(text.label());
                sprite
            }),
            factory,
        );
        self.particles.sync(
            run.impact.particles().iter().map(|(handle, p)| {
                let mut sprite = Sprite::new(handle.index() as u32, VisualKind::Particle, p.pos);
                sprite.scale = p.current_size();
                sprite.alpha = p.alpha();
                sprite
            }),
            factory,
        );
    }

    pub fn clear(&mut self) {
        self.player.clear();
        self.enemies.clear();
        self.projectiles.clear();
        self.orbs.clear();
        self.explosions.clear();
        self.damage_text.clear();
        self.particles.clear();
    }
}

fn player_sprite(run: &RunState) -> Sprite {
    let mut sprite = Sprite::new(0, VisualKind::Player, run.player.pos);
    sprite.scale = run.impact.punch_scale();
    sprite.rotation = heading(run.player.facing);
    // Blink while invulnerable
    if run.player.is_invulnerable() && (run.anim_time * 20.0) as i32 % 2 == 1 {
        sprite.alpha = 0.35;
    }
    sprite
}

/// Maximum gravity sources the filters accept
pub const MAX_GRAVITY_SOURCES: usize = 8;

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct GravitySourceUniform {
    pub pos: [f32; 2],
    pub mass: f32,
    pub _pad: f32,
}

/// Per-frame uniform block for the distortion filters (must match shader)
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct FilterUniforms {
    pub resolution: [f32; 2],   // offset 0
    pub time: f32,              // offset 8
    pub proximity: f32,         // offset 12
    pub camera_pos: [f32; 2],   // offset 16 (shake included)
    pub shake_offset: [f32; 2], // offset 24
    pub flash: [f32; 4],        // offset 32 - rgb + alpha
    pub source_count: u32,      // offset 48
    pub _pad: [u32; 3],         // pad sources to 16 bytes
    pub sources: [GravitySourceUniform; MAX_GRAVITY_SOURCES],
}

impl FilterUniforms {
    /// Block for the current frame of `run`
    pub fn from_run(run: &RunState, width: f32, height: f32) -> Self {
        let shake = run.impact.shake_offset();
        let flash = run.impact.flash();
        let mut uniforms = Self {
            resolution: [width, height],
            time: run.anim_time,
            proximity: run.proximity.clamp(0.0, 1.0),
            camera_pos: (run.camera + shake).to_array(),
            shake_offset: shake.to_array(),
            flash: rgb_with_alpha(flash.color, flash.alpha()),
            ..Self::default()
        };

        let sources = run.world.gravity_sources();
        if sources.len() > MAX_GRAVITY_SOURCES {
            log::debug!(
                "{} gravity sources, filters take the first {}",
                sources.len(),
                MAX_GRAVITY_SOURCES
            );
        }
        for (slot, source) in uniforms.sources.iter_mut().zip(&sources) {
            *slot = GravitySourceUniform {
                pos: source.pos.to_array(),
                mass: source.mass,
                _pad: 0.0,
            };
        }
        uniforms.source_count = sources.len().min(MAX_GRAVITY_SOURCES) as u32;
        uniforms
    }

    /// Block for a scene; menus get an idle block with only the resolution set
    pub fn from_scene<S: RecordSink>(
        scene: &PhysicsSurvivorScene<S>,
        width: f32,
        height: f32,
    ) -> Self {
        match scene.run() {
            Some(run) => Self::from_run(run, width, height),
            None => Self {
                resolution: [width, height],
                ..Self::default()
            },
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

fn rgb_with_alpha(color: u32, alpha: f32) -> [f32; 4] {
    [
        ((color >> 16) & 0xff) as f32 / 255.0,
        ((color >> 8) & 0xff) as f32 / 255.0,
        (color & 0xff) as f32 / 255.0,
        alpha,
    ]
}
