//! XP orbs dropped by dead enemies

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XpOrb {
    pub id: u32,
    pub pos: Vec2,
    pub value: u32,
    /// Once inside the magnet radius an orb homes in until collected
    pub attracted: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrbField {
    orbs: Vec<XpOrb>,
    next_id: u32,
}

impl OrbField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, pos: Vec2, value: u32) {
        self.next_id += 1;
        self.orbs.push(XpOrb {
            id: self.next_id,
            pos,
            value,
            attracted: false,
        });
    }

    /// Pull orbs in and collect those touching the player. Returns raw XP collected.
    pub fn update(&mut self, dt: f32, player_pos: Vec2, magnet_radius: f32) -> u32 {
        let pickup_dist = PLAYER_RADIUS + ORB_RADIUS;
        let mut collected = 0;

        for orb in &mut self.orbs {
            let to_player = player_pos - orb.pos;
            let dist = to_player.length();
            if dist <= magnet_radius {
                orb.attracted = true;
            }
            if orb.attracted && dist > 0.0 {
                let step = (ORB_ATTRACT_SPEED * dt).min(dist);
                orb.pos += to_player / dist * step;
            }
        }

        self.orbs.retain(|orb| {
            if orb.pos.distance(player_pos) <= pickup_dist {
                collected += orb.value;
                false
            } else {
                true
            }
        });

        collected
    }

    pub fn shift(&mut self, offset: Vec2) {
        for orb in &mut self.orbs {
            orb.pos += offset;
        }
    }

    /// Drop orbs the player left far behind. Returns how many were removed.
    pub fn cleanup_off_screen(&mut self, camera_pos: Vec2) -> usize {
        let before = self.orbs.len();
        self.orbs
            .retain(|orb| orb.pos.distance(camera_pos) <= DESPAWN_RADIUS);
        before - self.orbs.len()
    }

    pub fn orbs(&self) -> &[XpOrb] {
        &self.orbs
    }

    pub fn clear(&mut self) {
        self.orbs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orb_outside_magnet_stays_put() {
        let mut field = OrbField::new();
        field.spawn(Vec2::new(500.0, 0.0), 3);
        assert_eq!(field.update(0.1, Vec2::ZERO, ORB_BASE_MAGNET_RADIUS), 0);
        assert_eq!(field.orbs()[0].pos, Vec2::new(500.0, 0.0));
    }

    #[test]
    fn test_attracted_orb_is_collected() {
        let mut field = OrbField::new();
        field.spawn(Vec2::new(60.0, 0.0), 3);
        let mut total = 0;
        for _ in 0..30 {
            total += field.update(1.0 / 60.0, Vec2::ZERO, ORB_BASE_MAGNET_RADIUS);
        }
        assert_eq!(total, 3);
        assert!(field.orbs().is_empty());
    }

    #[test]
    fn test_attraction_persists_outside_radius() {
        let mut field = OrbField::new();
        field.spawn(Vec2::new(70.0, 0.0), 1);
        field.update(0.01, Vec2::ZERO, ORB_BASE_MAGNET_RADIUS);
        // Player runs away; orb keeps chasing
        field.update(0.01, Vec2::new(-400.0, 0.0), ORB_BASE_MAGNET_RADIUS);
        assert!(field.orbs()[0].attracted);
        assert!(field.orbs()[0].pos.x < 70.0);
    }

    #[test]
    fn test_far_orbs_are_cleaned_up() {
        let mut field = OrbField::new();
        field.spawn(Vec2::new(DESPAWN_RADIUS + 10.0, 0.0), 5);
        field.spawn(Vec2::new(0.0, DESPAWN_RADIUS - 10.0), 2);
        field.spawn(Vec2::new(3000.0, 3000.0), 1);

        assert_eq!(field.cleanup_off_screen(Vec2::ZERO), 2);
        assert_eq!(field.orbs().len(), 1);
        assert_eq!(field.orbs()[0].value, 2);
    }
}
