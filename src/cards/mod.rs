//! Per-agent card zones, pool clones, and cooldowns
//!
//! Zone lists hold card ids; the instances themselves live in the
//! encounter's arena. Invariant: a deck card is in exactly one zone of its
//! owner. Pool masters sit outside the five zones in the pool list;
//! playing one creates an ephemeral clone that occupies `in_play` while
//! the master stays available. Cooldowns are keyed by the master's id,
//! never a clone's.

use ahash::AHashMap;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use crate::content::template::TemplateId;
use crate::core::arena::{AgentId, Arena, CardId};

/// One card in existence: identity plus a reference to immutable content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardInstance {
    pub template: TemplateId,
    pub owner: AgentId,
    /// Set on pool clones; points back at the master
    pub master: Option<CardId>,
}

impl CardInstance {
    pub fn is_clone(&self) -> bool {
        self.master.is_some()
    }
}

/// The five exclusive locations a deck card can occupy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Draw,
    Hand,
    Discard,
    InPlay,
    Exhaust,
}

/// Card location truth for one agent
#[derive(Debug, Default)]
pub struct CardZones {
    pub draw: Vec<CardId>,
    pub hand: Vec<CardId>,
    pub discard: Vec<CardId>,
    pub in_play: Vec<CardId>,
    pub exhaust: Vec<CardId>,
    /// Master ids of always-available techniques
    pub pool: Vec<CardId>,
    cooldowns: AHashMap<CardId, u32>,
}

impl CardZones {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create deck instances into the draw pile, in template order
    pub fn build_deck(
        &mut self,
        instances: &mut Arena<CardInstance>,
        owner: AgentId,
        templates: &[TemplateId],
    ) {
        for &template in templates {
            let id = CardId(instances.insert(CardInstance {
                template,
                owner,
                master: None,
            }));
            self.draw.push(id);
        }
    }

    /// Register a pool master for this agent
    pub fn add_pool_master(
        &mut self,
        instances: &mut Arena<CardInstance>,
        owner: AgentId,
        template: TemplateId,
    ) -> CardId {
        let id = CardId(instances.insert(CardInstance {
            template,
            owner,
            master: None,
        }));
        self.pool.push(id);
        id
    }

    fn list(&self, zone: Zone) -> &Vec<CardId> {
        match zone {
            Zone::Draw => &self.draw,
            Zone::Hand => &self.hand,
            Zone::Discard => &self.discard,
            Zone::InPlay => &self.in_play,
            Zone::Exhaust => &self.exhaust,
        }
    }

    fn list_mut(&mut self, zone: Zone) -> &mut Vec<CardId> {
        match zone {
            Zone::Draw => &mut self.draw,
            Zone::Hand => &mut self.hand,
            Zone::Discard => &mut self.discard,
            Zone::InPlay => &mut self.in_play,
            Zone::Exhaust => &mut self.exhaust,
        }
    }

    pub fn zone_of(&self, card: CardId) -> Option<Zone> {
        for zone in [
            Zone::Draw,
            Zone::Hand,
            Zone::Discard,
            Zone::InPlay,
            Zone::Exhaust,
        ] {
            if self.list(zone).contains(&card) {
                return Some(zone);
            }
        }
        None
    }

    pub fn in_pool(&self, card: CardId) -> bool {
        self.pool.contains(&card)
    }

    /// Detach a card from whatever zone holds it
    fn remove_from_zones(&mut self, card: CardId) -> Option<Zone> {
        let zone = self.zone_of(card)?;
        self.list_mut(zone).retain(|&c| c != card);
        Some(zone)
    }

    /// Move a card between zones; false if it was nowhere
    pub fn move_to(&mut self, card: CardId, zone: Zone) -> bool {
        if self.remove_from_zones(card).is_none() {
            return false;
        }
        self.list_mut(zone).push(card);
        true
    }

    pub fn shuffle_draw(&mut self, rng: &mut ChaCha8Rng) {
        self.draw.shuffle(rng);
    }

    /// Draw until the hand holds `n` cards, reshuffling the discard pile
    /// into the draw pile when it runs dry
    pub fn draw_up_to(&mut self, n: usize, rng: &mut ChaCha8Rng) {
        while self.hand.len() < n {
            if self.draw.is_empty() {
                if self.discard.is_empty() {
                    break;
                }
                self.draw.append(&mut self.discard);
                self.shuffle_draw(rng);
            }
            if let Some(card) = self.draw.pop() {
                self.hand.push(card);
            }
        }
    }

    /// Clone a pool master into `in_play`; the master stays in the pool
    pub fn clone_pool_card(
        &mut self,
        instances: &mut Arena<CardInstance>,
        master: CardId,
    ) -> Option<CardId> {
        let source = *instances.get(master.handle())?;
        let clone = CardId(instances.insert(CardInstance {
            template: source.template,
            owner: source.owner,
            master: Some(master),
        }));
        self.in_play.push(clone);
        Some(clone)
    }

    /// Destroy a clone on removal from `in_play`; returns the master id
    /// so the caller can settle the cooldown against it
    pub fn destroy_clone(
        &mut self,
        instances: &mut Arena<CardInstance>,
        clone: CardId,
    ) -> Option<CardId> {
        let master = instances.get(clone.handle())?.master?;
        self.in_play.retain(|&c| c != clone);
        instances.remove(clone.handle());
        Some(master)
    }

    pub fn apply_cooldown(&mut self, master: CardId, turns: u32) {
        if turns > 0 {
            self.cooldowns.insert(master, turns);
        }
    }

    pub fn clear_cooldown(&mut self, master: CardId) {
        self.cooldowns.remove(&master);
    }

    pub fn on_cooldown(&self, master: CardId) -> bool {
        self.cooldowns.get(&master).copied().unwrap_or(0) > 0
    }

    /// Count down once per turn, dropping expired entries
    pub fn tick_cooldowns(&mut self) {
        self.cooldowns.retain(|_, turns| {
            *turns -= 1;
            *turns > 0
        });
    }
}
