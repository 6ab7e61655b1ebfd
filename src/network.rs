//! Friendships between people. The graph is undirected: every friendship is stored in the
//! neighbor list of both ends. Neighbor lists are kept sorted so that the daily process visits
//! friends in ascending id order.
use log::debug;

use crate::context::Context;
use crate::define_data_plugin;
use crate::people::{ContextPeopleExt, PersonId};

#[derive(Default)]
struct NetworkData {
    // Indexed by person; grown lazily up to the largest id with a friend.
    neighbors: Vec<Vec<PersonId>>,
    edge_count: usize,
}

impl NetworkData {
    fn add_edge(&mut self, person: PersonId, neighbor: PersonId) -> bool {
        let needed = person.0.max(neighbor.0) + 1;
        if self.neighbors.len() < needed {
            self.neighbors.resize_with(needed, Vec::new);
        }

        let edges = &mut self.neighbors[person.0];
        let Err(position) = edges.binary_search(&neighbor) else {
            return false;
        };
        edges.insert(position, neighbor);

        let reverse = &mut self.neighbors[neighbor.0];
        if let Err(position) = reverse.binary_search(&person) {
            reverse.insert(position, person);
        }
        self.edge_count += 1;
        true
    }

    fn get_neighbors(&self, person: PersonId) -> &[PersonId] {
        self.neighbors
            .get(person.0)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

define_data_plugin!(NetworkPlugin, NetworkData, NetworkData::default());

pub trait ContextNetworkExt {
    /// Makes `person` and `friend` friends of each other. Self friendships, repeated
    /// friendships and ids outside the population are ignored; the return value says whether
    /// a new friendship was recorded.
    fn add_friendship(&mut self, person: PersonId, friend: PersonId) -> bool;

    /// Friends of `person`, ascending.
    fn get_friends(&self, person: PersonId) -> &[PersonId];

    fn are_friends(&self, person: PersonId, other: PersonId) -> bool;

    /// Number of friends of `person`.
    fn get_degree(&self, person: PersonId) -> usize;

    /// Number of distinct friendships.
    fn get_friendship_count(&self) -> usize;
}

impl ContextNetworkExt for Context {
    fn add_friendship(&mut self, person: PersonId, friend: PersonId) -> bool {
        if person == friend {
            debug!("ignoring friendship of {person} with itself");
            return false;
        }
        let population = self.get_current_population();
        if person.0 >= population || friend.0 >= population {
            debug!("ignoring friendship {person}-{friend}: unknown person");
            return false;
        }
        self.get_data_container_mut(NetworkPlugin)
            .add_edge(person, friend)
    }

    fn get_friends(&self, person: PersonId) -> &[PersonId] {
        self.get_data_container(NetworkPlugin)
            .map(|data| data.get_neighbors(person))
            .unwrap_or_default()
    }

    fn are_friends(&self, person: PersonId, other: PersonId) -> bool {
        self.get_friends(person).binary_search(&other).is_ok()
    }

    fn get_degree(&self, person: PersonId) -> usize {
        self.get_friends(person).len()
    }

    fn get_friendship_count(&self) -> usize {
        self.get_data_container(NetworkPlugin)
            .map_or(0, |data| data.edge_count)
    }
}
