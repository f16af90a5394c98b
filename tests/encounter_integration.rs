//! End-to-end turn cycle, command pipeline, and determinism tests

use riposte::content::registry::CardRegistry;
use riposte::content::template::WeaponProfile;
use riposte::core::arena::{AgentId, CardId};
use riposte::core::config::EngineConfig;
use riposte::core::error::CommandError;
use riposte::core::types::TurnPhase;
use riposte::director::Director;
use riposte::encounter::{AgentSpec, Encounter};
use riposte::event::{Event, EventKind};
use riposte::resolve::damage::ThresholdBodyModel;

fn duel(seed: u64) -> (Encounter, AgentId, AgentId) {
    let mut encounter = Encounter::new(CardRegistry::test_catalog(), EngineConfig::default(), seed);
    encounter.set_body_model(Box::new(ThresholdBodyModel::default()));

    let mut left = AgentSpec::new("left", WeaponProfile::arming_sword());
    left.is_player = true;
    left.deck = ["cut", "cut", "feint", "power_through", "high_line"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    left.pool = vec!["overhead_strike".into()];

    let mut right = AgentSpec::new("right", WeaponProfile::spear());
    right.deck = ["thrust", "parry", "sidestep", "high_block", "thrust"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let a = encounter.add_agent(left).unwrap();
    let b = encounter.add_agent(right).unwrap();
    (encounter, a, b)
}

fn card_in_hand(encounter: &Encounter, agent: AgentId, name: &str) -> CardId {
    let wanted = encounter.registry().id_of(name).unwrap();
    encounter
        .agent(agent)
        .unwrap()
        .zones
        .hand
        .iter()
        .copied()
        .find(|&card| encounter.card(card).unwrap().template == wanted)
        .unwrap_or_else(|| panic!("{} not in hand", name))
}

#[test]
fn test_full_turn_cycle() {
    let (mut encounter, a, b) = duel(3);

    encounter.begin_turn().unwrap();
    assert_eq!(encounter.phase(), TurnPhase::PlayerCardSelection);
    assert_eq!(encounter.agent(a).unwrap().zones.hand.len(), 5);

    let cut = card_in_hand(&encounter, a, "cut");
    encounter.play_action_card(a, cut, Some(b)).unwrap();
    let parry = card_in_hand(&encounter, b, "parry");
    encounter.play_action_card(b, parry, None).unwrap();

    encounter.lock_selection().unwrap();
    assert_eq!(encounter.phase(), TurnPhase::CommitPhase);

    encounter.resolve_tick().unwrap();
    assert_eq!(encounter.phase(), TurnPhase::Animating);

    encounter.end_turn().unwrap();
    assert_eq!(encounter.phase(), TurnPhase::DrawHand);

    encounter.swap_event_buffers();
    let events = encounter.events().current();
    assert!(events
        .iter()
        .any(|e| matches!(e.kind, EventKind::PlayedActionCard { .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e.kind, EventKind::TechniqueResolved { .. })));

    // The turn summary recorded the plays
    assert_eq!(encounter.agent(a).unwrap().turn.history.len(), 1);
}

#[test]
fn test_commands_are_phase_gated() {
    let (mut encounter, a, b) = duel(3);

    // Still in DrawHand: no selection command is legal yet
    let card = encounter.agent(a).unwrap().zones.draw[0];
    let err = encounter.play_action_card(a, card, Some(b)).unwrap_err();
    assert!(matches!(
        err,
        CommandError::WrongPhase {
            expected: TurnPhase::PlayerCardSelection,
            actual: TurnPhase::DrawHand,
        }
    ));
}

#[test]
fn test_resource_hold_scenario() {
    let (mut encounter, a, b) = duel(3);
    encounter.begin_turn().unwrap();

    // stamina 10/10, two cards costing 3 each
    let first = card_in_hand(&encounter, a, "cut");
    encounter.play_action_card(a, first, Some(b)).unwrap();
    let second = card_in_hand(&encounter, a, "cut");
    encounter.play_action_card(a, second, Some(b)).unwrap();

    let stamina = encounter.agent(a).unwrap().resources.stamina;
    assert_eq!(stamina.available, 4.0);
    assert_eq!(stamina.current, 10.0);

    encounter.lock_selection().unwrap();
    let stamina = encounter.agent(a).unwrap().resources.stamina;
    assert_eq!(stamina.current, 4.0);
}

#[test]
fn test_cancel_restores_everything() {
    let (mut encounter, a, b) = duel(3);
    encounter.begin_turn().unwrap();

    let cut = card_in_hand(&encounter, a, "cut");
    encounter.play_action_card(a, cut, Some(b)).unwrap();
    assert_eq!(encounter.agent(a).unwrap().zones.hand.len(), 4);

    encounter.cancel_action_card(a, cut).unwrap();

    let agent = encounter.agent(a).unwrap();
    assert_eq!(agent.resources.stamina.available, 10.0);
    assert_eq!(agent.resources.time.available, 1.0);
    assert_eq!(agent.zones.hand.len(), 5);
    assert!(agent.turn.current.timeline.is_empty());
}

#[test]
fn test_pool_clone_isolation_and_cooldown() {
    let (mut encounter, a, b) = duel(3);
    encounter.begin_turn().unwrap();

    let master = encounter.agent(a).unwrap().zones.pool[0];
    encounter.play_action_card(a, master, Some(b)).unwrap();

    let agent = encounter.agent(a).unwrap();
    let clone = agent.zones.in_play[0];
    assert_ne!(clone, master);
    assert!(agent.zones.in_pool(master));
    assert!(agent.zones.on_cooldown(master));
    assert!(encounter.card(clone).unwrap().is_clone());

    // Replaying the master while the clone occupies the timeline fails:
    // the cooldown was already applied
    let err = encounter.play_action_card(a, master, Some(b)).unwrap_err();
    assert!(matches!(err, CommandError::CardOnCooldown(_)));

    // Cancelling destroys exactly the clone and clears the cooldown
    encounter.cancel_action_card(a, clone).unwrap();
    let agent = encounter.agent(a).unwrap();
    assert!(!agent.zones.on_cooldown(master));
    assert!(agent.zones.in_pool(master));
    assert!(encounter.card(clone).is_none());
    assert!(encounter.card(master).is_some());
}

#[test]
fn test_commit_stack_focus_accounting() {
    let (mut encounter, a, b) = duel(3);
    encounter.begin_turn().unwrap();

    let cut = card_in_hand(&encounter, a, "cut");
    let feint = card_in_hand(&encounter, a, "feint");
    let power = card_in_hand(&encounter, a, "power_through");
    encounter.play_action_card(a, cut, Some(b)).unwrap();
    encounter.lock_selection().unwrap();

    assert!(!encounter.agent(a).unwrap().turn.current.stack_focus_paid);

    // First stack: flat fee 1.0 + feint's own focus cost 1.0
    encounter.commit_stack(a, feint, cut).unwrap();
    let agent = encounter.agent(a).unwrap();
    assert!(agent.turn.current.stack_focus_paid);
    assert_eq!(agent.resources.focus.current, 1.0);
    assert_eq!(agent.turn.current.focus_spent, 2.0);

    // Second stack: only the card's own focus cost
    encounter.commit_stack(a, power, cut).unwrap();
    let agent = encounter.agent(a).unwrap();
    assert!(agent.turn.current.stack_focus_paid);
    assert_eq!(agent.resources.focus.current, 0.0);
    assert_eq!(agent.turn.current.focus_spent, 3.0);

    // Stakes escalated with the stack
    let play = agent.turn.current.timeline.find_play(cut).unwrap();
    assert_eq!(play.modifier_count(), 2);
}

#[test]
fn test_conflicting_height_modifiers_rejected_without_spend() {
    let mut left = AgentSpec::new("left", WeaponProfile::arming_sword());
    left.deck = ["cut", "high_line", "low_line", "feint", "parry"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let mut right = AgentSpec::new("right", WeaponProfile::spear());
    right.deck = vec!["thrust".into()];

    let mut encounter = Encounter::new(CardRegistry::test_catalog(), EngineConfig::default(), 5);
    let a = encounter.add_agent(left).unwrap();
    let b = encounter.add_agent(right).unwrap();
    encounter.begin_turn().unwrap();

    let cut = card_in_hand(&encounter, a, "cut");
    let high = card_in_hand(&encounter, a, "high_line");
    encounter.play_action_card(a, cut, Some(b)).unwrap();
    encounter.lock_selection().unwrap();

    encounter.commit_stack(a, high, cut).unwrap();
    let focus_before = encounter.agent(a).unwrap().resources.focus.current;

    // low_line disagrees with the attached high_line override
    let low = card_in_hand(&encounter, a, "low_line");
    let err = encounter.commit_stack(a, low, cut).unwrap_err();
    assert_eq!(err, CommandError::ModifierConflict);

    // Rejected before any spend
    let agent = encounter.agent(a).unwrap();
    assert_eq!(agent.resources.focus.current, focus_before);
    assert_eq!(
        agent
            .turn
            .current
            .timeline
            .find_play(cut)
            .unwrap()
            .modifier_count(),
        1
    );
}

#[test]
fn test_stack_that_no_longer_fits_refunds_focus() {
    let (mut encounter, a, b) = duel(3);
    encounter.begin_turn().unwrap();

    // Two cuts tile [0.0, 0.2) and [0.2, 0.4)
    let first = card_in_hand(&encounter, a, "cut");
    encounter.play_action_card(a, first, Some(b)).unwrap();
    let second = card_in_hand(&encounter, a, "cut");
    encounter.play_action_card(a, second, Some(b)).unwrap();
    encounter.lock_selection().unwrap();

    // power_through stretches the first play to 0.3, colliding with the
    // second; the spent focus must come back atomically
    let power = card_in_hand(&encounter, a, "power_through");
    let err = encounter.commit_stack(a, power, first).unwrap_err();
    assert!(matches!(err, CommandError::Schedule(_)));

    let agent = encounter.agent(a).unwrap();
    assert_eq!(agent.resources.focus.current, 3.0);
    assert!(!agent.turn.current.stack_focus_paid);
    assert_eq!(
        agent
            .turn
            .current
            .timeline
            .find_play(first)
            .unwrap()
            .modifier_count(),
        0
    );
    // The modifier card went back to hand
    assert!(agent.zones.hand.contains(&power));
}

#[test]
fn test_commit_withdraw_refunds_and_returns_card() {
    let (mut encounter, a, b) = duel(3);
    encounter.begin_turn().unwrap();

    let cut = card_in_hand(&encounter, a, "cut");
    encounter.play_action_card(a, cut, Some(b)).unwrap();
    encounter.lock_selection().unwrap();

    encounter.commit_withdraw(a, cut).unwrap();

    let agent = encounter.agent(a).unwrap();
    assert_eq!(agent.resources.stamina.current, 10.0);
    assert_eq!(agent.resources.focus.current, 2.0);
    assert!(agent.turn.current.timeline.is_empty());
    assert!(agent.zones.hand.contains(&cut));
}

#[test]
fn test_withdraw_refused_once_modified() {
    let (mut encounter, a, b) = duel(3);
    encounter.begin_turn().unwrap();

    let cut = card_in_hand(&encounter, a, "cut");
    let feint = card_in_hand(&encounter, a, "feint");
    encounter.play_action_card(a, cut, Some(b)).unwrap();
    encounter.lock_selection().unwrap();
    encounter.commit_stack(a, feint, cut).unwrap();

    let err = encounter.commit_withdraw(a, cut).unwrap_err();
    assert!(matches!(err, CommandError::PredicateFailed(_)));
}

#[test]
fn test_commit_added_play_is_frozen() {
    let (mut encounter, a, b) = duel(3);
    encounter.begin_turn().unwrap();
    encounter.lock_selection().unwrap();

    let cut = card_in_hand(&encounter, a, "cut");
    encounter.commit_add(a, cut, Some(b)).unwrap();

    let feint = card_in_hand(&encounter, a, "feint");
    let err = encounter.commit_stack(a, feint, cut).unwrap_err();
    assert!(matches!(err, CommandError::PredicateFailed(_)));
}

#[test]
fn test_offensive_play_requires_target() {
    let (mut encounter, a, _) = duel(3);
    encounter.begin_turn().unwrap();

    let cut = card_in_hand(&encounter, a, "cut");
    let err = encounter.play_action_card(a, cut, None).unwrap_err();
    assert!(matches!(err, CommandError::PredicateFailed(_)));
}

#[test]
fn test_weapon_predicate_rejects_spear_cut() {
    // A spear cannot swing, so a cut in hand is unplayable
    let mut spec = AgentSpec::new("spearman", WeaponProfile::spear());
    spec.deck = vec!["cut".into()];
    let mut encounter = Encounter::new(CardRegistry::test_catalog(), EngineConfig::default(), 9);
    let c = encounter.add_agent(spec).unwrap();
    let mut foe = AgentSpec::new("foe", WeaponProfile::arming_sword());
    foe.deck = vec!["parry".into()];
    let d = encounter.add_agent(foe).unwrap();

    encounter.begin_turn().unwrap();
    let cut = card_in_hand(&encounter, c, "cut");
    let err = encounter.play_action_card(c, cut, Some(d)).unwrap_err();
    assert!(matches!(err, CommandError::PredicateFailed(_)));
}

#[test]
fn test_resolution_always_emits_technique_resolved() {
    let (mut encounter, a, b) = duel(17);
    encounter.begin_turn().unwrap();

    let cut = card_in_hand(&encounter, a, "cut");
    encounter.play_action_card(a, cut, Some(b)).unwrap();
    encounter.lock_selection().unwrap();
    encounter.resolve_tick().unwrap();
    encounter.end_turn().unwrap();
    encounter.swap_event_buffers();

    let resolved: Vec<&Event> = encounter
        .events()
        .current()
        .iter()
        .filter(|e| matches!(e.kind, EventKind::TechniqueResolved { .. }))
        .collect();
    assert_eq!(resolved.len(), 1);

    if let EventKind::TechniqueResolved {
        hit_chance, roll, ..
    } = &resolved[0].kind
    {
        assert!((0.05..=0.95).contains(hit_chance));
        assert!((0.0..=1.0).contains(roll));
    }
}

#[test]
fn test_end_turn_discards_deck_cards_and_destroys_clones() {
    let (mut encounter, a, b) = duel(3);
    encounter.begin_turn().unwrap();

    let cut = card_in_hand(&encounter, a, "cut");
    encounter.play_action_card(a, cut, Some(b)).unwrap();
    let master = encounter.agent(a).unwrap().zones.pool[0];
    encounter.play_action_card(a, master, Some(b)).unwrap();
    let clone = encounter
        .agent(a)
        .unwrap()
        .zones
        .in_play
        .iter()
        .copied()
        .find(|&c| c != cut)
        .unwrap();

    encounter.lock_selection().unwrap();
    encounter.resolve_tick().unwrap();
    encounter.end_turn().unwrap();

    let agent = encounter.agent(a).unwrap();
    assert!(agent.zones.discard.contains(&cut));
    assert!(agent.zones.in_play.is_empty());
    assert!(encounter.card(clone).is_none());
    // The master keeps its cooldown into the next turn
    assert!(agent.zones.on_cooldown(master));
}

#[test]
fn test_fixed_seed_reproduces_identical_event_log() {
    let script_left = vec![vec!["cut".to_string()]; 3];
    let script_right = vec![vec!["thrust".to_string()]; 3];

    let run = |seed: u64| -> Vec<Event> {
        let (mut encounter, a, b) = duel(seed);
        let mut left = Director::scripted(script_left.clone());
        let mut right = Director::scripted(script_right.clone());

        let mut log = Vec::new();
        for _ in 0..3 {
            encounter.begin_turn().unwrap();
            left.play_cards(a, &mut encounter);
            right.play_cards(b, &mut encounter);
            encounter.lock_selection().unwrap();
            encounter.resolve_tick().unwrap();
            encounter.end_turn().unwrap();
            encounter.swap_event_buffers();
            log.extend(encounter.events().current().iter().cloned());
        }
        log
    };

    let first = run(42);
    let second = run(42);
    assert_eq!(first, second);
    assert!(first
        .iter()
        .any(|e| matches!(e.kind, EventKind::TechniqueResolved { .. })));
}
