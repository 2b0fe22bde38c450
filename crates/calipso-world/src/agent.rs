//! Agent contract and the ordered agent registry.
//!
//! Agents are updated once per pass in insertion order. Each update sees the
//! grid, its siblings (read and write) and the simulation's shared parameters,
//! and may spawn new agents. Spawned agents join the registry at the end of the
//! pass, so they are observable by later siblings but never updated in the pass
//! that created them.

use crate::grid::Grid;
use crate::simulation::SimRng;
use calipso_core::{AgentId, CellCode};
use std::convert::Infallible;
use std::marker::PhantomData;
use tracing::trace;

/// A simulation-defined agent
pub trait Agent: Sized {
    /// Shared mutable simulation context handed to every update
    type Sim;

    /// Position in grid coordinates
    fn position(&self) -> (f64, f64);

    /// Inactive agents are skipped by updates and rendering
    fn is_active(&self) -> bool {
        true
    }

    /// Kind used to pick a marker color
    fn kind(&self) -> CellCode {
        0
    }

    /// Full update with access to the grid, siblings and shared parameters.
    ///
    /// Agents that need none of these only implement [`Agent::advance`].
    fn update(&mut self, ctx: &mut AgentContext<'_, Self>) {
        let _ = ctx;
        self.advance();
    }

    /// Context-free update
    fn advance(&mut self) {}
}

/// Everything an agent update may read or write
pub struct AgentContext<'a, A: Agent> {
    pub id: AgentId,
    pub step: u64,
    pub grid: &'a mut Grid,
    pub peers: Peers<'a, A>,
    pub sim: &'a mut A::Sim,
    pub rng: &'a mut SimRng,
}

struct Slot<A> {
    id: AgentId,
    agent: A,
}

/// The other agents of the registry during one update
pub struct Peers<'a, A> {
    before: &'a mut [Slot<A>],
    after: &'a mut [Slot<A>],
    spawned: &'a mut Vec<A>,
}

impl<'a, A> Peers<'a, A> {
    /// Siblings in registry order, followed by agents spawned earlier in this pass
    pub fn iter(&self) -> impl Iterator<Item = &A> + '_ {
        self.before
            .iter()
            .chain(self.after.iter())
            .map(|slot| &slot.agent)
            .chain(self.spawned.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut A> + '_ {
        self.before
            .iter_mut()
            .chain(self.after.iter_mut())
            .map(|slot| &mut slot.agent)
            .chain(self.spawned.iter_mut())
    }

    /// Queue a new agent; it is appended once the pass ends
    pub fn spawn(&mut self, agent: A) {
        self.spawned.push(agent);
    }

    pub fn len(&self) -> usize {
        self.before.len() + self.after.len() + self.spawned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Outcome of one update pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    pub updated: usize,
    pub spawned: usize,
}

/// Ordered, growable collection of agents
pub struct AgentRegistry<A> {
    slots: Vec<Slot<A>>,
    next_id: u64,
}

impl<A> Default for AgentRegistry<A> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            next_id: 0,
        }
    }
}

impl<A> AgentRegistry<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_agents(agents: impl IntoIterator<Item = A>) -> Self {
        let mut registry = Self::new();
        for agent in agents {
            registry.push(agent);
        }
        registry
    }

    /// Append an agent and return its identity
    pub fn push(&mut self, agent: A) -> AgentId {
        let id = AgentId(self.next_id);
        self.next_id += 1;
        self.slots.push(Slot { id, agent });
        id
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, id: AgentId) -> Option<&A> {
        self.slots
            .iter()
            .find(|slot| slot.id == id)
            .map(|slot| &slot.agent)
    }

    /// Agents with their identities, in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (AgentId, &A)> + '_ {
        self.slots.iter().map(|slot| (slot.id, &slot.agent))
    }

    pub fn agents(&self) -> impl Iterator<Item = &A> + '_ {
        self.slots.iter().map(|slot| &slot.agent)
    }

    /// Drop every agent; identities keep counting up
    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

impl<A: Agent> AgentRegistry<A> {
    pub fn active_count(&self) -> usize {
        self.agents().filter(|agent| agent.is_active()).count()
    }

    /// Physically remove inactive agents, keeping the order of the rest
    pub fn compact(&mut self) -> usize {
        let before = self.slots.len();
        self.slots.retain(|slot| slot.agent.is_active());
        let removed = before - self.slots.len();
        if removed > 0 {
            trace!(removed, remaining = self.slots.len(), "Compacted agent registry");
        }
        removed
    }

    /// Update every active agent once, in registry order
    pub fn update_all(
        &mut self,
        grid: &mut Grid,
        sim: &mut A::Sim,
        rng: &mut SimRng,
        step: u64,
    ) -> PassStats {
        let pass_len = self.slots.len();
        let mut spawned = Vec::new();
        let mut stats = PassStats::default();

        for index in 0..pass_len {
            let (before, rest) = self.slots.split_at_mut(index);
            let Some((slot, after)) = rest.split_first_mut() else {
                break;
            };

            if !slot.agent.is_active() {
                continue;
            }

            let mut ctx = AgentContext {
                id: slot.id,
                step,
                grid: &mut *grid,
                peers: Peers {
                    before,
                    after,
                    spawned: &mut spawned,
                },
                sim: &mut *sim,
                rng: &mut *rng,
            };
            slot.agent.update(&mut ctx);
            stats.updated += 1;
        }

        stats.spawned = spawned.len();
        for agent in spawned {
            self.push(agent);
        }

        stats
    }
}

/// Agent type for simulations without agents
pub struct NoAgent<S> {
    never: Infallible,
    _sim: PhantomData<fn() -> S>,
}

impl<S> Agent for NoAgent<S> {
    type Sim = S;

    fn position(&self) -> (f64, f64) {
        match self.never {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[derive(Default)]
    struct Shared {
        visits: Vec<u32>,
    }

    struct Walker {
        tag: u32,
        x: i64,
        active: bool,
        breeds: bool,
    }

    impl Walker {
        fn new(tag: u32) -> Self {
            Self {
                tag,
                x: 0,
                active: true,
                breeds: false,
            }
        }
    }

    impl Agent for Walker {
        type Sim = Shared;

        fn position(&self) -> (f64, f64) {
            (self.x as f64, 0.0)
        }

        fn is_active(&self) -> bool {
            self.active
        }

        fn update(&mut self, ctx: &mut AgentContext<'_, Self>) {
            ctx.sim.visits.push(self.tag);
            self.x = (self.x + 1).rem_euclid(ctx.grid.width() as i64);
            ctx.grid.put(self.x as usize, 0, 1);

            if self.breeds {
                ctx.peers.spawn(Walker::new(self.tag * 10));
            }
        }
    }

    struct Sleeper {
        ticks: u32,
    }

    impl Agent for Sleeper {
        type Sim = ();

        fn position(&self) -> (f64, f64) {
            (0.0, 0.0)
        }

        fn advance(&mut self) {
            self.ticks += 1;
        }
    }

    fn rng() -> SimRng {
        ChaCha8Rng::seed_from_u64(7)
    }

    #[test]
    fn test_ids_follow_insertion_order() {
        let mut registry = AgentRegistry::from_agents([Walker::new(1), Walker::new(2)]);
        let id = registry.push(Walker::new(3));
        assert_eq!(id, AgentId(2));
        let ids: Vec<_> = registry.iter().map(|(id, _)| id.0).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(registry.get(AgentId(1)).map(|w| w.tag), Some(2));
    }

    #[test]
    fn test_update_visits_in_order_and_skips_inactive() {
        let mut grid = Grid::new(5, 1);
        let mut shared = Shared::default();
        let mut registry = AgentRegistry::new();
        registry.push(Walker::new(1));
        let mut idle = Walker::new(2);
        idle.active = false;
        registry.push(idle);
        registry.push(Walker::new(3));

        let stats = registry.update_all(&mut grid, &mut shared, &mut rng(), 0);

        assert_eq!(shared.visits, vec![1, 3]);
        assert_eq!(stats.updated, 2);
        assert_eq!(grid.at(1, 0), 1);
    }

    #[test]
    fn test_spawned_agents_wait_for_next_pass() {
        let mut grid = Grid::new(5, 1);
        let mut shared = Shared::default();
        let mut parent = Walker::new(1);
        parent.breeds = true;
        let mut registry = AgentRegistry::from_agents([parent, Walker::new(2)]);

        let stats = registry.update_all(&mut grid, &mut shared, &mut rng(), 0);
        assert_eq!(shared.visits, vec![1, 2]);
        assert_eq!(stats.spawned, 1);
        assert_eq!(registry.len(), 3);

        shared.visits.clear();
        registry.update_all(&mut grid, &mut shared, &mut rng(), 1);
        assert_eq!(shared.visits, vec![1, 2, 10]);
    }

    #[test]
    fn test_peers_exclude_self() {
        struct Counter {
            seen: usize,
        }

        impl Agent for Counter {
            type Sim = ();

            fn position(&self) -> (f64, f64) {
                (0.0, 0.0)
            }

            fn update(&mut self, ctx: &mut AgentContext<'_, Self>) {
                self.seen = ctx.peers.len();
                for peer in ctx.peers.iter_mut() {
                    peer.seen += 100;
                }
            }
        }

        let mut grid = Grid::new(1, 1);
        let mut registry =
            AgentRegistry::from_agents([Counter { seen: 0 }, Counter { seen: 0 }, Counter { seen: 0 }]);
        registry.update_all(&mut grid, &mut (), &mut rng(), 0);

        let seen: Vec<_> = registry.agents().map(|c| c.seen).collect();
        // Each agent overwrites its own count, then bumps every sibling
        assert_eq!(seen, vec![202, 102, 2]);
    }

    #[test]
    fn test_context_free_agents_are_updated() {
        let mut grid = Grid::new(1, 1);
        let mut registry = AgentRegistry::from_agents([Sleeper { ticks: 0 }]);
        registry.update_all(&mut grid, &mut (), &mut rng(), 0);
        registry.update_all(&mut grid, &mut (), &mut rng(), 1);
        assert_eq!(registry.agents().next().map(|s| s.ticks), Some(2));
    }

    #[test]
    fn test_compact_preserves_order() {
        let mut registry = AgentRegistry::new();
        for tag in 1..=5 {
            let mut walker = Walker::new(tag);
            walker.active = tag % 2 == 1;
            registry.push(walker);
        }

        assert_eq!(registry.active_count(), 3);
        assert_eq!(registry.compact(), 2);

        let tags: Vec<_> = registry.agents().map(|w| w.tag).collect();
        assert_eq!(tags, vec![1, 3, 5]);
        let ids: Vec<_> = registry.iter().map(|(id, _)| id.0).collect();
        assert_eq!(ids, vec![0, 2, 4]);
    }
}
