use rand::{rngs::StdRng, SeedableRng};

/// Create a [`StdRng`] from an explicit seed, falling back to the `SEED`
/// environment variable and finally to `0`.
///
/// Weight initialisation draws every parameter from a single generator in
/// construction order, so the same seed always yields the same model.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    let base = seed.unwrap_or_else(|| {
        std::env::var("SEED")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    });
    StdRng::seed_from_u64(base)
}
