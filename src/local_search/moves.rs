//! The nine neighborhood operators over route sets. Every operator treats
//! the depot ends as immovable and silently skips routes too short for the
//! move to be well-defined.

use std::collections::HashSet;

use rand::Rng;

use crate::instance::Instance;
use crate::schedule::Route;

/// Swap two random interior stops within each route.
pub fn swap_two_nodes<R: Rng>(routes: &mut [Route], rng: &mut R) {
    for route in routes.iter_mut() {
        if route.len() > 3 {
            let index1 = rng.gen_range(1..route.len() - 1);
            let mut index2 = rng.gen_range(1..route.len() - 1);
            while index1 == index2 {
                index2 = rng.gen_range(1..route.len() - 1);
            }
            route.swap(index1, index2);
        }
    }
}

/// Exchange two disjoint subtours within each route. Four interior indices
/// are drawn and sorted; the middle pair is redrawn until the subtours are
/// disjoint.
pub fn swap_two_subtours<R: Rng>(routes: &mut [Route], rng: &mut R) {
    for route in routes.iter_mut() {
        if route.len() > 4 {
            let mut indices = [
                rng.gen_range(1..route.len() - 1),
                rng.gen_range(1..route.len() - 1),
                rng.gen_range(1..route.len() - 1),
                rng.gen_range(1..route.len() - 1),
            ];
            indices.sort_unstable();
            while indices[1] == indices[2] {
                indices[1] = rng.gen_range(1..route.len() - 1);
                indices.sort_unstable();
            }
            let [i1, i2, i3, i4] = indices;

            let mut rebuilt = Vec::with_capacity(route.len());
            rebuilt.extend_from_slice(&route[..i1]);
            rebuilt.extend_from_slice(&route[i3..=i4]);
            rebuilt.extend_from_slice(&route[i2 + 1..i3]);
            rebuilt.extend_from_slice(&route[i1..=i2]);
            rebuilt.extend_from_slice(&route[i4 + 1..]);
            *route = rebuilt;
        }
    }
}

/// Move one interior stop of each route to another position.
pub fn relocate_one_node<R: Rng>(routes: &mut [Route], rng: &mut R) {
    for route in routes.iter_mut() {
        if route.len() > 3 {
            let index1 = rng.gen_range(1..route.len() - 1);
            let node = route.remove(index1);

            let index2 = if route.len() == 2 {
                1
            } else {
                let mut index2 = rng.gen_range(1..route.len());
                while index2 == index1 && route.len() > 3 {
                    index2 = rng.gen_range(1..route.len());
                }
                index2
            };
            route.insert(index2, node);
        }
    }
}

/// Move one subtour of each route to another position.
pub fn relocate_one_subtour<R: Rng>(routes: &mut [Route], rng: &mut R) {
    for route in routes.iter_mut() {
        if route.len() > 4 {
            let mut index1 = rng.gen_range(1..route.len() - 2);
            let mut index2 = rng.gen_range(1..route.len() - 2);
            while index1 == index2 {
                index2 = rng.gen_range(1..route.len() - 2);
            }
            if index1 > index2 {
                std::mem::swap(&mut index1, &mut index2);
            }
            let subtour: Vec<usize> = route.drain(index1..=index2).collect();

            let index3 = if route.len() > 2 {
                rng.gen_range(1..route.len() - 1)
            } else {
                1
            };
            route.splice(index3..index3, subtour);
        }
    }
}

/// Reverse one subtour of each route (2-opt style).
pub fn reverse_one_subtour<R: Rng>(routes: &mut [Route], rng: &mut R) {
    for route in routes.iter_mut() {
        if route.len() > 3 {
            let mut index1 = rng.gen_range(1..route.len() - 1);
            let mut index2 = rng.gen_range(1..route.len() - 1);
            while index1 == index2 {
                index2 = rng.gen_range(1..route.len() - 1);
            }
            if index1 > index2 {
                std::mem::swap(&mut index1, &mut index2);
            }
            route[index1..=index2].reverse();
        }
    }
}

/// Insert one station into each route at a random interior position. A
/// repairman insertion requires a station with broken stock that the route
/// does not visit yet; a truck insertion requires an imbalanced station.
pub fn insert_one_node<R: Rng>(
    routes: &mut [Route],
    is_rpm: bool,
    instance: &Instance,
    nb_clients: usize,
    rng: &mut R,
) {
    for route in routes.iter_mut() {
        let distinct: HashSet<usize> = route.iter().copied().filter(|&s| s != 0).collect();
        if is_rpm && distinct.len() == nb_clients {
            continue;
        }
        if route.len() > 3 {
            let index = rng.gen_range(1..route.len() - 1);
            if is_rpm {
                let mut node = rng.gen_range(1..=nb_clients);
                while route.contains(&node) {
                    node = rng.gen_range(1..=nb_clients);
                }
                if instance.stations[node].broken_bike != 0 {
                    route.insert(index, node);
                }
            } else {
                let node = rng.gen_range(0..=nb_clients);
                if instance.stations[node].usable_bike != instance.stations[node].target_usable {
                    route.insert(index, node);
                }
            }
        }
    }
}

/// Repeat the single-node insertion a random number of times per route.
pub fn insert_multiple_nodes<R: Rng>(
    routes: &mut [Route],
    is_rpm: bool,
    instance: &Instance,
    nb_clients: usize,
    rng: &mut R,
) {
    for i in 0..routes.len() {
        if routes[i].len() >= 3 {
            let repeats = rng.gen_range(1..=routes[i].len() - 2);
            for _ in 0..repeats {
                insert_one_node(routes, is_rpm, instance, nb_clients, rng);
            }
        }
    }
}

/// Delete one random interior stop from each route.
pub fn delete_one_node<R: Rng>(routes: &mut [Route], rng: &mut R) {
    for route in routes.iter_mut() {
        if route.len() > 3 {
            let index = rng.gen_range(1..route.len() - 1);
            route.remove(index);
        }
    }
}

/// Repeat the single-node deletion a random number of times per route.
pub fn delete_multiple_nodes<R: Rng>(routes: &mut [Route], rng: &mut R) {
    for i in 0..routes.len() {
        if routes[i].len() >= 3 {
            let repeats = rng.gen_range(1..=routes[i].len() - 2);
            for _ in 0..repeats {
                delete_one_node(routes, rng);
            }
        }
    }
}
