use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Lowercase keeps generated names safe for SQL literals and shells.
const CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const NAME_LENGTH: usize = 16;

/// Generates collision-resistant names for savepoints and test data.
///
/// The generator is seeded explicitly so a run can be reproduced; there is no
/// shared global generator state.
pub struct NameGenerator {
    rng: StdRng,
}

impl NameGenerator {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn next_name(&mut self) -> String {
        (0..NAME_LENGTH)
            .map(|_| CHARS[self.rng.gen_range(0..CHARS.len())] as char)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_have_the_expected_shape() {
        let mut names = NameGenerator::from_entropy();
        let name = names.next_name();

        assert_eq!(name.len(), 16);
        assert!(name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn same_seed_gives_the_same_sequence() {
        let mut a = NameGenerator::from_seed(42);
        let mut b = NameGenerator::from_seed(42);

        assert_eq!(a.next_name(), b.next_name());
        assert_eq!(a.next_name(), b.next_name());
    }

    #[test]
    fn consecutive_names_differ() {
        let mut names = NameGenerator::from_seed(42);
        assert_ne!(names.next_name(), names.next_name());
    }
}
