//! Spawn decisions: which lane, how tall, and whether the lane has room.

use rand::Rng;

use crate::config::GameConfig;
use crate::lane::Lane;
use crate::note::{NoteId, NoteRegistry};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SpawnOutcome {
    Spawned { id: NoteId, lane: Lane, height: f64 },
    /// The chosen lane still has a note too close to the top.
    Blocked { lane: Lane },
}

#[derive(Clone, Debug)]
pub struct SpawnPolicy {
    min_spacing: f64,
    height_min: u32,
    height_max: u32,
    delay_min: f64,
    delay_max: f64,
}

impl SpawnPolicy {
    pub fn new(cfg: &GameConfig) -> Self {
        Self {
            min_spacing: cfg.min_spawn_spacing_px,
            height_min: cfg.note_height_min_px,
            height_max: cfg.note_height_max_px,
            delay_min: cfg.spawn_delay_min_ms,
            delay_max: cfg.spawn_delay_max_ms,
        }
    }

    pub fn roll_lane<R: Rng>(&self, rng: &mut R) -> Lane {
        Lane::ALL[rng.gen_range(0..Lane::ALL.len())]
    }

    /// Whole-pixel height in `[height_min, height_max)`.
    pub fn roll_height<R: Rng>(&self, rng: &mut R) -> f64 {
        rng.gen_range(self.height_min..self.height_max) as f64
    }

    /// Delay before the next spawn attempt, in `[delay_min, delay_max)` ms.
    pub fn roll_delay<R: Rng>(&self, rng: &mut R) -> f64 {
        rng.gen_range(self.delay_min..self.delay_max)
    }

    /// A lane has room when none of its notes sits above the spacing line.
    pub fn lane_has_room(&self, registry: &NoteRegistry, lane: Lane) -> bool {
        registry.in_lane(lane).all(|n| n.y >= self.min_spacing)
    }

    /// One spawn opportunity. A blocked attempt leaves the registry untouched.
    pub fn attempt<R: Rng>(
        &self,
        registry: &mut NoteRegistry,
        rng: &mut R,
        now: f64,
    ) -> SpawnOutcome {
        let lane = self.roll_lane(rng);
        let height = self.roll_height(rng);
        if !self.lane_has_room(registry, lane) {
            return SpawnOutcome::Blocked { lane };
        }
        let id = registry.spawn(lane, height, now);
        SpawnOutcome::Spawned { id, lane, height }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn policy() -> SpawnPolicy {
        SpawnPolicy::new(&GameConfig::default())
    }

    #[test]
    fn rolls_stay_in_range() {
        let p = policy();
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..2_000 {
            let h = p.roll_height(&mut rng);
            assert!((10.0..70.0).contains(&h));
            assert_eq!(h.fract(), 0.0);
            let d = p.roll_delay(&mut rng);
            assert!((500.0..1500.0).contains(&d));
        }
    }

    #[test]
    fn every_lane_gets_picked() {
        let p = policy();
        let mut rng = SmallRng::seed_from_u64(11);
        let mut seen = [false; 4];
        for _ in 0..200 {
            seen[p.roll_lane(&mut rng).index()] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn lane_room_respects_spacing() {
        let p = policy();
        let mut reg = NoteRegistry::new();
        assert!(p.lane_has_room(&reg, Lane::S));
        let id = reg.spawn(Lane::S, 20.0, 0.0);
        assert!(!p.lane_has_room(&reg, Lane::S));
        assert!(p.lane_has_room(&reg, Lane::D));
        for n in reg.iter_mut() {
            if n.id == id {
                n.y = 100.0;
            }
        }
        assert!(p.lane_has_room(&reg, Lane::S));
    }

    #[test]
    fn attempts_never_stack_two_fresh_notes_in_a_lane() {
        let p = policy();
        let mut rng = SmallRng::seed_from_u64(3);
        let mut reg = NoteRegistry::new();
        let mut blocked = 0;
        for _ in 0..100 {
            if let SpawnOutcome::Blocked { .. } = p.attempt(&mut reg, &mut rng, 0.0) {
                blocked += 1;
            }
            for lane in Lane::ALL {
                assert!(reg.in_lane(lane).filter(|n| n.y < 100.0).count() <= 1);
            }
        }
        // Nothing moves, so at most one note per lane ever gets in.
        assert!(reg.len() <= 4);
        assert_eq!(blocked, 100 - reg.len());
    }
}
