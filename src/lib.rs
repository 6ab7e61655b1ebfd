//! A simulator for comparing vaccination strategies against an infection that spreads
//! between friends who meet at concerts.
//!
//! The population is a friendship graph whose members like some music genres. Every day each
//! genre may have a concert; the infected people at a concert can pass the infection on to
//! their susceptible friends who are there too. After the incubation period an infection ends
//! in death or immunity. Before the first day a vaccination strategy picks people to protect,
//! and repeated trials show how many deaths each strategy avoids.
//!
//! As in any discrete event simulation, the central object is the `Context`, which owns one
//! run: the population, its random number streams, its reports and the plans scheduled for
//! each day. The crate is organised in modules that extend the `Context`:
//! * `people` and `network`: individuals, their preferences and their friendships.
//! * `catalog`: the genres, their daily concert probability and the transmission table.
//! * `health`: the susceptible, vaccinated, infected, dead and immune states.
//! * `transmission`: the daily concerts and transmission trials.
//! * `outcomes`: the daily tallies.
//! * `vaccination`: candidate selection strategies and their application.
//! * `epidemic`: the engine that ties these together, and repeated trials.
//! * `loader`: the friendship, preference and candidate files.
pub mod catalog;
pub mod context;
pub mod epidemic;
pub mod error;
pub mod global_properties;
pub mod hashing;
pub mod health;
pub mod loader;
pub mod log;
pub mod network;
pub mod outcomes;
pub mod parameters;
pub mod people;
pub mod plan;
pub mod prelude;
pub mod random;
pub mod report;
pub mod runner;
pub mod transmission;
pub mod vaccination;

pub use context::Context;
pub use error::VaxError;
pub use hashing::{HashMap, HashMapExt, HashSet, HashSetExt};

// Re-exports for the macros of this crate
pub use csv;
pub use paste;
pub use rand;
