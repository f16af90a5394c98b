//! The encounter aggregate: agents, zones, engagements, phase state
//!
//! An encounter owns every mutable piece of one fight. All external
//! intent flows through the command handler (`commands`), and the tick
//! driver advances the lifecycle: `begin_turn` -> selection commands ->
//! `lock_selection` -> commit commands -> `resolve_tick` -> `end_turn`.

pub mod commands;
pub mod fsm;
pub mod validation;

use ahash::AHashMap;

use crate::cards::{CardInstance, CardZones, Zone};
use crate::content::registry::CardRegistry;
use crate::content::template::WeaponProfile;
use crate::core::arena::{AgentId, Arena, CardId};
use crate::core::config::EngineConfig;
use crate::core::error::{CommandError, ContentError, EngineError, Result};
use crate::core::rng::RngStreams;
use crate::core::types::{AgentStats, Tick, TurnPhase};
use crate::engagement::EngagementMap;
use crate::event::{EventKind, EventQueue};
use crate::resolve::damage::{BodyModel, NullBodyModel};
use crate::schedule::turn::AgentTurn;

use self::fsm::TurnFsm;

/// One fighter in the encounter
pub struct Agent {
    pub name: String,
    pub is_player: bool,
    pub stats: AgentStats,
    pub weapon: WeaponProfile,
    /// Footing in [0, 1], 0.5 neutral; intrinsic, unlike engagement
    pub balance: f32,
    pub resources: crate::resource::AgentResources,
    pub zones: CardZones,
    pub turn: AgentTurn,
    /// Set by resolution, consumed into the turn summary
    pub(crate) landed_hit_this_turn: bool,
}

/// Everything needed to seat an agent at the table
pub struct AgentSpec {
    pub name: String,
    pub is_player: bool,
    pub stats: AgentStats,
    pub weapon: WeaponProfile,
    /// Template names of the deck cards
    pub deck: Vec<String>,
    /// Template names of always-available pool techniques
    pub pool: Vec<String>,
    pub stamina_max: f32,
    pub stamina_regen: f32,
    pub focus_max: f32,
    pub focus_regen: f32,
}

impl AgentSpec {
    pub fn new(name: &str, weapon: WeaponProfile) -> Self {
        Self {
            name: name.into(),
            is_player: false,
            stats: AgentStats::default(),
            weapon,
            deck: Vec::new(),
            pool: Vec::new(),
            stamina_max: 10.0,
            stamina_regen: 3.0,
            focus_max: 3.0,
            focus_regen: 2.0,
        }
    }
}

pub struct Encounter {
    pub(crate) config: EngineConfig,
    pub(crate) registry: CardRegistry,
    pub(crate) agents: Arena<Agent>,
    pub(crate) agent_order: Vec<AgentId>,
    pub(crate) cards: Arena<CardInstance>,
    pub(crate) engagements: EngagementMap,
    pub(crate) fsm: TurnFsm,
    pub(crate) events: EventQueue,
    pub(crate) rng: RngStreams,
    pub(crate) body: Box<dyn BodyModel>,
    /// Targets chosen at selection time, keyed by card id; decoupled from
    /// the play record until selection locks
    pub(crate) pending_targets: AHashMap<CardId, AgentId>,
    pub(crate) turn: Tick,
}

impl Encounter {
    pub fn new(registry: CardRegistry, config: EngineConfig, seed: u64) -> Self {
        tracing::info!(seed, "encounter created");
        Self {
            config,
            registry,
            agents: Arena::new(),
            agent_order: Vec::new(),
            cards: Arena::new(),
            engagements: EngagementMap::new(),
            fsm: TurnFsm::new(),
            events: EventQueue::new(),
            rng: RngStreams::from_seed(seed),
            body: Box::new(NullBodyModel),
            pending_targets: AHashMap::new(),
            turn: 0,
        }
    }

    /// Swap in a real body/armor collaborator
    pub fn set_body_model(&mut self, body: Box<dyn BodyModel>) {
        self.body = body;
    }

    /// Seat an agent: build their deck (shuffled once from the
    /// deck-builder stream) and register their pool masters
    pub fn add_agent(&mut self, spec: AgentSpec) -> Result<AgentId> {
        let deck = self.resolve_names(&spec.deck)?;
        let pool = self.resolve_names(&spec.pool)?;

        let agent = Agent {
            name: spec.name,
            is_player: spec.is_player,
            stats: spec.stats,
            weapon: spec.weapon,
            balance: 0.5,
            resources: crate::resource::AgentResources::new(
                spec.stamina_max,
                spec.stamina_regen,
                spec.focus_max,
                spec.focus_regen,
            ),
            zones: CardZones::new(),
            turn: AgentTurn::new(),
            landed_hit_this_turn: false,
        };
        let id = AgentId(self.agents.insert(agent));
        self.agent_order.push(id);

        let zones = &mut self
            .agents
            .get_mut(id.handle())
            .expect("freshly inserted agent")
            .zones;
        zones.build_deck(&mut self.cards, id, &deck);
        zones.shuffle_draw(self.rng.deck_builder());
        for template in pool {
            zones.add_pool_master(&mut self.cards, id, template);
        }

        Ok(id)
    }

    fn resolve_names(
        &self,
        names: &[String],
    ) -> Result<Vec<crate::content::template::TemplateId>> {
        names
            .iter()
            .map(|name| {
                self.registry.id_of(name).ok_or_else(|| {
                    EngineError::Content(ContentError::Malformed(format!(
                        "unknown template '{}'",
                        name
                    )))
                })
            })
            .collect()
    }

    // === Accessors ===

    pub fn phase(&self) -> TurnPhase {
        self.fsm.phase()
    }

    pub fn turn_number(&self) -> Tick {
        self.turn
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &CardRegistry {
        &self.registry
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id.handle())
    }

    pub fn agent_ids(&self) -> &[AgentId] {
        &self.agent_order
    }

    pub fn engagements(&self) -> &EngagementMap {
        &self.engagements
    }

    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    /// The tick driver owns buffer swapping; once per tick
    pub fn swap_event_buffers(&mut self) {
        self.events.swap_buffers();
    }

    pub fn card(&self, id: CardId) -> Option<&CardInstance> {
        self.cards.get(id.handle())
    }

    // === Lifecycle ===

    pub(crate) fn transition_turn_to(
        &mut self,
        target: TurnPhase,
    ) -> std::result::Result<(), CommandError> {
        let from = self.fsm.phase();
        self.fsm.transition_to(target)?;
        self.events
            .push(self.turn, EventKind::TurnPhaseChanged { from, to: target });
        Ok(())
    }

    /// Start a turn: regenerate resources, tick cooldowns, draw hands
    pub fn begin_turn(&mut self) -> std::result::Result<(), CommandError> {
        self.require_phase(TurnPhase::DrawHand)?;
        self.turn += 1;

        let hand_size = self.config.hand_size;
        for &id in &self.agent_order {
            let agent = self
                .agents
                .get_mut(id.handle())
                .ok_or_else(|| CommandError::BadInvariant("agent order out of sync".into()))?;
            agent.resources.tick();
            agent.zones.tick_cooldowns();
            agent.zones.draw_up_to(hand_size, self.rng.shuffler());
        }

        self.events.push(self.turn, EventKind::TurnStarted);
        self.transition_turn_to(TurnPhase::PlayerCardSelection)
    }

    /// End of selection: pending targets land on their plays, holds
    /// become real expenditure
    pub fn lock_selection(&mut self) -> std::result::Result<(), CommandError> {
        self.require_phase(TurnPhase::PlayerCardSelection)?;

        for &id in &self.agent_order {
            let agent = self
                .agents
                .get_mut(id.handle())
                .ok_or_else(|| CommandError::BadInvariant("agent order out of sync".into()))?;
            for slot_index in 0..agent.turn.current.timeline.len() {
                let card = agent.turn.current.timeline.slots()[slot_index].play.card;
                if let Some(&target) = self.pending_targets.get(&card) {
                    if let Some(play) = agent.turn.current.timeline.find_play_mut(card) {
                        play.target = Some(target);
                    }
                }
            }
            agent.resources.finalize();
        }

        self.transition_turn_to(TurnPhase::CommitPhase)
    }

    /// Walk the merged timeline and resolve every offensive play
    pub fn resolve_tick(&mut self) -> std::result::Result<(), CommandError> {
        self.require_phase(TurnPhase::CommitPhase)?;
        self.transition_turn_to(TurnPhase::TickResolution)?;
        crate::resolve::resolve_tick(self)?;
        self.transition_turn_to(TurnPhase::Animating)
    }

    /// Close the turn: summarize into history, dispose of played cards
    pub fn end_turn(&mut self) -> std::result::Result<(), CommandError> {
        self.require_phase(TurnPhase::Animating)?;

        for &id in &self.agent_order {
            let agent = self
                .agents
                .get_mut(id.handle())
                .ok_or_else(|| CommandError::BadInvariant("agent order out of sync".into()))?;
            let landed = agent.landed_hit_this_turn;
            agent.landed_hit_this_turn = false;
            let finished = agent.turn.end_turn(landed);

            // Clones die with the turn; deck cards (leads and stacked
            // modifiers alike) go to discard
            for slot in finished.timeline.slots() {
                let mut played = vec![slot.play.card];
                played.extend(slot.play.modifiers().iter().map(|m| m.card));
                for card in played {
                    let is_clone = self
                        .cards
                        .get(card.handle())
                        .map(|c| c.is_clone())
                        .unwrap_or(false);
                    if is_clone {
                        agent.zones.destroy_clone(&mut self.cards, card);
                    } else {
                        agent.zones.move_to(card, Zone::Discard);
                    }
                }
            }
        }

        self.pending_targets.clear();
        self.events.push(self.turn, EventKind::TurnEnded);
        self.transition_turn_to(TurnPhase::DrawHand)
    }

    pub(crate) fn require_phase(
        &self,
        expected: TurnPhase,
    ) -> std::result::Result<(), CommandError> {
        let actual = self.fsm.phase();
        if actual != expected {
            return Err(CommandError::WrongPhase { expected, actual });
        }
        Ok(())
    }
}
