//! Named random streams for deterministic, replayable encounters
//!
//! Each subsystem draws from its own stream so draw sequences never
//! interleave: a fixed master seed reproduces an identical encounter no
//! matter how the other subsystems consume randomness.

use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// The fixed set of independent draw sequences
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    /// Hit rolls during tick resolution
    Combat,
    /// Starting-deck assembly
    DeckBuilder,
    /// Draw-pile shuffles
    Shuffler,
    /// Incidental card effects
    Effects,
}

// Per-stream salts keep the derived seeds distinct; the values are
// arbitrary but frozen, since changing them breaks replay compatibility.
const SALT_COMBAT: u64 = 0x434f_4d42_4154_0001;
const SALT_DECK_BUILDER: u64 = 0x4445_434b_0000_0002;
const SALT_SHUFFLER: u64 = 0x5348_5546_0000_0003;
const SALT_EFFECTS: u64 = 0x4546_4643_0000_0004;

/// Independently seeded ChaCha streams derived from one master seed
pub struct RngStreams {
    seed: u64,
    combat: ChaCha8Rng,
    deck_builder: ChaCha8Rng,
    shuffler: ChaCha8Rng,
    effects: ChaCha8Rng,
}

impl RngStreams {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            seed,
            combat: ChaCha8Rng::seed_from_u64(seed ^ SALT_COMBAT),
            deck_builder: ChaCha8Rng::seed_from_u64(seed ^ SALT_DECK_BUILDER),
            shuffler: ChaCha8Rng::seed_from_u64(seed ^ SALT_SHUFFLER),
            effects: ChaCha8Rng::seed_from_u64(seed ^ SALT_EFFECTS),
        }
    }

    /// The master seed this set was derived from
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn stream(&mut self, stream: Stream) -> &mut ChaCha8Rng {
        match stream {
            Stream::Combat => &mut self.combat,
            Stream::DeckBuilder => &mut self.deck_builder,
            Stream::Shuffler => &mut self.shuffler,
            Stream::Effects => &mut self.effects,
        }
    }

    pub fn combat(&mut self) -> &mut ChaCha8Rng {
        &mut self.combat
    }

    pub fn deck_builder(&mut self) -> &mut ChaCha8Rng {
        &mut self.deck_builder
    }

    pub fn shuffler(&mut self) -> &mut ChaCha8Rng {
        &mut self.shuffler
    }

    pub fn effects(&mut self) -> &mut ChaCha8Rng {
        &mut self.effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = RngStreams::from_seed(42);
        let mut b = RngStreams::from_seed(42);

        for _ in 0..16 {
            let x: f32 = a.combat().gen();
            let y: f32 = b.combat().gen();
            assert_eq!(x, y);
        }
    }

    #[test]
    fn test_streams_are_independent() {
        let mut plain = RngStreams::from_seed(7);
        let mut noisy = RngStreams::from_seed(7);

        // Draining the effects stream must not perturb combat draws
        for _ in 0..100 {
            let _: f32 = noisy.effects().gen();
        }

        for _ in 0..16 {
            let x: f32 = plain.combat().gen();
            let y: f32 = noisy.combat().gen();
            assert_eq!(x, y);
        }
    }

    #[test]
    fn test_streams_differ_from_each_other() {
        let mut streams = RngStreams::from_seed(7);
        let a: u64 = streams.combat().gen();
        let b: u64 = streams.shuffler().gen();
        assert_ne!(a, b);
    }
}
