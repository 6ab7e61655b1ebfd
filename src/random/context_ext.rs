use std::any::TypeId;
use std::cell::RefMut;

use log::trace;

use crate::context::Context;
use crate::hashing::hash_str;
use crate::rand::distr::uniform::{SampleRange, SampleUniform};
use crate::rand::{Rng, SeedableRng};
use crate::random::sampling_algorithms::sample_multiple_from_known_length;
use crate::random::{RngHolder, RngId, RngPlugin};

const UNSEEDED: &str = "You must initialize the random number generator with a base seed";

/// The generator of stream `R`, created on first use from the base seed plus a hash of the
/// stream name.
fn get_rng<R: RngId + 'static>(context: &Context) -> RefMut<R::RngType> {
    let data = context.get_data_container(RngPlugin).expect(UNSEEDED);
    let base_seed = data.base_seed.expect(UNSEEDED);
    let streams = data
        .rng_holders
        .try_borrow_mut()
        .expect("random streams are not reentrant");

    RefMut::map(streams, |streams| {
        let holder = streams.entry(TypeId::of::<R>()).or_insert_with(|| {
            let seed = base_seed.wrapping_add(hash_str(R::get_name()));
            trace!("seeding stream {} with {seed}", R::get_name());
            RngHolder {
                rng: Box::new(R::RngType::seed_from_u64(seed)),
            }
        });
        holder
            .rng
            .downcast_mut::<R::RngType>()
            .expect("stream holds the generator type of its id")
    })
}

/// Random number generation on a `Context`. All methods panic if `init_random` was not called.
pub trait ContextRandomExt {
    /// Sets the base seed of every stream of this context. Existing streams are dropped so they
    /// get re-seeded on next use.
    fn init_random(&mut self, base_seed: u64);

    /// Applies `sampler` to the generator of stream `R`.
    fn sample<R: RngId + 'static, T>(
        &self,
        rng_id: R,
        sampler: impl FnOnce(&mut R::RngType) -> T,
    ) -> T;

    /// Draws a value uniformly from `range` using stream `R`.
    fn sample_range<R: RngId + 'static, S, T>(&self, rng_id: R, range: S) -> T
    where
        R::RngType: Rng,
        S: SampleRange<T>,
        T: SampleUniform;

    /// One Bernoulli trial: `true` with probability `p`. `p = 0` is never true and `p = 1` is
    /// always true.
    fn sample_bool<R: RngId + 'static>(&self, rng_id: R, p: f64) -> bool
    where
        R::RngType: Rng;

    /// Draws `requested` items uniformly without replacement, keeping their original order.
    /// Requests larger than `items` return all of them.
    fn sample_multiple<R: RngId + 'static, T: Clone>(
        &self,
        rng_id: R,
        items: &[T],
        requested: usize,
    ) -> Vec<T>
    where
        R::RngType: Rng;
}

impl ContextRandomExt for Context {
    fn init_random(&mut self, base_seed: u64) {
        trace!("base seed {base_seed}");
        let data = self.get_data_container_mut(RngPlugin);
        data.base_seed = Some(base_seed);
        data.rng_holders.get_mut().clear();
    }

    fn sample<R: RngId + 'static, T>(
        &self,
        _rng_id: R,
        sampler: impl FnOnce(&mut R::RngType) -> T,
    ) -> T {
        sampler(&mut get_rng::<R>(self))
    }

    fn sample_range<R: RngId + 'static, S, T>(&self, rng_id: R, range: S) -> T
    where
        R::RngType: Rng,
        S: SampleRange<T>,
        T: SampleUniform,
    {
        self.sample(rng_id, |rng| rng.random_range(range))
    }

    fn sample_bool<R: RngId + 'static>(&self, rng_id: R, p: f64) -> bool
    where
        R::RngType: Rng,
    {
        self.sample(rng_id, |rng| rng.random_bool(p))
    }

    fn sample_multiple<R: RngId + 'static, T: Clone>(
        &self,
        rng_id: R,
        items: &[T],
        requested: usize,
    ) -> Vec<T>
    where
        R::RngType: Rng,
    {
        self.sample(rng_id, |rng| {
            sample_multiple_from_known_length(rng, items.iter().cloned(), requested)
        })
    }
}
