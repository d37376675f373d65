//! Neighbor lookup used by flocking.
//!
//! The brute force scan is O(n²) per tick and is the reference behavior.
//! [`GridNeighbors`] buckets creatures by cell and returns the same set, as
//! long as the engine reports every position it writes back through
//! [`NeighborQuery::moved`].

use bevy::math::{IVec3, Vec3};
use std::collections::HashMap;

use super::entity::Creature;

pub trait NeighborQuery {
    /// Called once at the start of every tick with the current population.
    fn refresh(&mut self, _creatures: &[Creature]) {}

    /// Called when creature `index` is written back at a new position during
    /// the tick.
    fn moved(&mut self, _index: usize, _from: Vec3, _to: Vec3) {}

    /// Pushes into `out` the indices of creatures within `radius` of creature
    /// `index`, excluding itself. Distances use current positions.
    fn neighbors_within(
        &self,
        creatures: &[Creature],
        index: usize,
        radius: f32,
        out: &mut Vec<usize>,
    );
}

impl<Q: NeighborQuery + ?Sized> NeighborQuery for Box<Q> {
    fn refresh(&mut self, creatures: &[Creature]) {
        (**self).refresh(creatures)
    }

    fn moved(&mut self, index: usize, from: Vec3, to: Vec3) {
        (**self).moved(index, from, to)
    }

    fn neighbors_within(
        &self,
        creatures: &[Creature],
        index: usize,
        radius: f32,
        out: &mut Vec<usize>,
    ) {
        (**self).neighbors_within(creatures, index, radius, out)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BruteForceNeighbors;

impl NeighborQuery for BruteForceNeighbors {
    fn neighbors_within(
        &self,
        creatures: &[Creature],
        index: usize,
        radius: f32,
        out: &mut Vec<usize>,
    ) {
        let origin = creatures[index].position;
        let radius_sq = radius * radius;
        out.extend(
            creatures
                .iter()
                .enumerate()
                .filter(|(i, other)| {
                    *i != index && other.position.distance_squared(origin) < radius_sq
                })
                .map(|(i, _)| i),
        );
    }
}

/// Uniform grid bucketed by perception radius.
#[derive(Debug, Clone)]
pub struct GridNeighbors {
    cell_size: f32,
    cells: HashMap<IVec3, Vec<usize>>,
}

impl GridNeighbors {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(f32::EPSILON),
            cells: HashMap::new(),
        }
    }

    fn cell_of(&self, position: Vec3) -> IVec3 {
        (position / self.cell_size).floor().as_ivec3()
    }
}

impl NeighborQuery for GridNeighbors {
    fn refresh(&mut self, creatures: &[Creature]) {
        self.cells.clear();
        for (i, creature) in creatures.iter().enumerate() {
            let cell = self.cell_of(creature.position);
            self.cells.entry(cell).or_default().push(i);
        }
    }

    fn moved(&mut self, index: usize, from: Vec3, to: Vec3) {
        let (old, new) = (self.cell_of(from), self.cell_of(to));
        if old == new {
            return;
        }
        if let Some(bucket) = self.cells.get_mut(&old) {
            bucket.retain(|&i| i != index);
            if bucket.is_empty() {
                self.cells.remove(&old);
            }
        }
        self.cells.entry(new).or_default().push(index);
    }

    fn neighbors_within(
        &self,
        creatures: &[Creature],
        index: usize,
        radius: f32,
        out: &mut Vec<usize>,
    ) {
        let origin = creatures[index].position;
        let radius_sq = radius * radius;
        let reach = (radius / self.cell_size).ceil() as i32 + 1;
        let center = self.cell_of(origin);

        for dx in -reach..=reach {
            for dy in -reach..=reach {
                for dz in -reach..=reach {
                    let Some(bucket) = self.cells.get(&(center + IVec3::new(dx, dy, dz))) else {
                        continue;
                    };
                    out.extend(bucket.iter().copied().filter(|&i| {
                        i != index
                            && creatures
                                .get(i)
                                .is_some_and(|c| c.position.distance_squared(origin) < radius_sq)
                    }));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creatures::entity::{BehaviorState, SpeciesId};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn creature_at(position: Vec3) -> Creature {
        Creature {
            species: SpeciesId(0),
            position,
            velocity: Vec3::ZERO,
            yaw: 0.0,
            state: BehaviorState::Schooling,
            cluster: None,
        }
    }

    #[test]
    fn brute_force_excludes_self_and_far() {
        let creatures = vec![
            creature_at(Vec3::ZERO),
            creature_at(Vec3::new(3.0, 0.0, 0.0)),
            creature_at(Vec3::new(30.0, 0.0, 0.0)),
        ];
        let mut out = Vec::new();
        BruteForceNeighbors.neighbors_within(&creatures, 0, 10.0, &mut out);
        assert_eq!(out, vec![1]);
    }

    #[test]
    fn grid_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(9);
        let creatures: Vec<Creature> = (0..200)
            .map(|_| {
                creature_at(Vec3::new(
                    rng.gen_range(-40.0..40.0),
                    rng.gen_range(0.0..20.0),
                    rng.gen_range(-40.0..40.0),
                ))
            })
            .collect();

        let mut grid = GridNeighbors::new(8.0);
        grid.refresh(&creatures);

        for index in 0..creatures.len() {
            let mut expected = Vec::new();
            BruteForceNeighbors.neighbors_within(&creatures, index, 8.0, &mut expected);
            let mut actual = Vec::new();
            grid.neighbors_within(&creatures, index, 8.0, &mut actual);
            expected.sort_unstable();
            actual.sort_unstable();
            assert_eq!(expected, actual);
        }
    }

    #[test]
    fn grid_follows_moved_creatures_across_the_seam() {
        let mut creatures = vec![
            creature_at(Vec3::new(249.0, 5.0, 0.0)),
            creature_at(Vec3::new(-249.0, 5.0, 0.0)),
        ];
        let mut grid = GridNeighbors::new(10.0);
        grid.refresh(&creatures);

        let from = creatures[0].position;
        creatures[0].position = Vec3::new(-250.0, 5.0, 0.0);
        grid.moved(0, from, creatures[0].position);

        let mut out = Vec::new();
        grid.neighbors_within(&creatures, 1, 10.0, &mut out);
        assert_eq!(out, vec![0]);

        let mut wrapped = Vec::new();
        grid.neighbors_within(&creatures, 0, 10.0, &mut wrapped);
        let mut expected = Vec::new();
        BruteForceNeighbors.neighbors_within(&creatures, 0, 10.0, &mut expected);
        assert_eq!(wrapped, expected);
    }
}
