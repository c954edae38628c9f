//! Particle belief attached to a tree node.

use rand::{Rng, prelude::IndexedRandom};

/// Bounded multiset of particles.
///
/// Particles are only ever added or drawn with replacement; nothing mutates a
/// stored particle in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Belief<S> {
    particles: Vec<S>,
    capacity: usize,
}

impl<S> Belief<S> {
    pub fn new(capacity: usize) -> Self {
        Self {
            particles: Vec::new(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.particles.len() >= self.capacity
    }

    /// Add a particle unless the belief is full. Returns whether it was kept.
    pub fn push(&mut self, particle: S) -> bool {
        if self.is_full() {
            return false;
        }
        self.particles.push(particle);
        true
    }

    /// Draw one particle uniformly with replacement.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&S> {
        self.particles.choose(rng)
    }

    pub fn iter(&self) -> impl Iterator<Item = &S> {
        self.particles.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn test_push_respects_capacity() {
        let mut belief = Belief::new(3);
        for i in 0..10 {
            belief.push(i);
        }
        assert_eq!(belief.len(), 3);
        assert!(belief.is_full());
        assert!(!belief.push(99));
        assert_eq!(belief.iter().copied().collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_sample_draws_members() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut belief = Belief::new(4);
        assert!(belief.sample(&mut rng).is_none());
        belief.push(7);
        belief.push(9);
        for _ in 0..20 {
            let drawn = *belief.sample(&mut rng).unwrap();
            assert!(drawn == 7 || drawn == 9);
        }
    }
}
