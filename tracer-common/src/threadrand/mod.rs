use rand::rngs::OsRng;
use rand::{CryptoRng, Rng, RngCore};
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::cell::UnsafeCell;

thread_local! {
    static RNG: UnsafeCell<ChaCha20Rng> = UnsafeCell::new(ChaCha20Rng::from_seed(OsRng.gen()));
}

/// Thread-local CSPRNG. Each thread gets its own ChaCha20 generator seeded
/// from the OS, so no locking is needed to draw from it.
pub struct SecureRng;

impl RngCore for SecureRng {
    fn next_u32(&mut self) -> u32 {
        RNG.with(|rng| unsafe { rand_chacha::rand_core::RngCore::next_u32(&mut *rng.get()) })
    }

    fn next_u64(&mut self) -> u64 {
        RNG.with(|rng| unsafe { rand_chacha::rand_core::RngCore::next_u64(&mut *rng.get()) })
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        RNG.with(|rng| unsafe {
            rand_chacha::rand_core::RngCore::fill_bytes(&mut *rng.get(), dest)
        })
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        // Infallible for ChaCha20Rng
        self.fill_bytes(dest);
        Ok(())
    }
}

impl CryptoRng for SecureRng {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_u64_is_not_constant() {
        let a = SecureRng.next_u64();
        let b = SecureRng.next_u64();
        assert_ne!(a, b);
    }

    #[test]
    fn test_fill_bytes() {
        let mut buf = [0u8; 32];
        SecureRng.fill_bytes(&mut buf);
        assert_ne!(buf, [0u8; 32]);
    }
}
