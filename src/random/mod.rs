//! Named, independently seeded random number streams owned by a `Context`.
//!
//! Every consumer of randomness declares its own stream with `define_rng!`. All streams of a
//! `Context` derive from one base seed set with `ContextRandomExt::init_random`, offset by a
//! hash of the stream's name, so adding draws to one stream never perturbs another. A run is
//! reproducible given its base seed; separate trials use separate contexts and seeds.
mod context_ext;
mod macros;
mod sampling_algorithms;

use std::any::{Any, TypeId};
use std::cell::RefCell;

pub use context_ext::ContextRandomExt;
pub use macros::define_rng;
pub use sampling_algorithms::sample_multiple_from_known_length;

use crate::rand::SeedableRng;
use crate::{define_data_plugin, HashMap, HashMapExt};

pub trait RngId: Copy + Clone {
    type RngType: SeedableRng;
    fn get_name() -> &'static str;
}

// Allows for different kinds of generators behind one map.
struct RngHolder {
    rng: Box<dyn Any>,
}

struct RngData {
    base_seed: Option<u64>,
    // `RefCell` so that sampling only needs `&Context`.
    rng_holders: RefCell<HashMap<TypeId, RngHolder>>,
}

define_data_plugin!(
    RngPlugin,
    RngData,
    RngData {
        base_seed: None,
        rng_holders: RefCell::new(HashMap::new()),
    }
);
