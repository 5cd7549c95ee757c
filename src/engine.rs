use crate::board::{MatchBoard, SlotOrigin};
use crate::error::BracketError;
use crate::flow::{FlowGraph, Outcome, SlotIndex};
use crate::registry::{Team, TeamRegistry};
use crate::results::ResultsMap;
use crate::seeding::{seed_initial_teams, validate_seeding, SeedPlacement, PLAYOFF12_SEEDING};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngineOptions {
  /// Whether interactive toggles are accepted.
  pub can_edit: bool,
}

/// Owns the board and keeps it consistent with the flow graph: every decision
/// pushes its winner and loser downstream, and every change first wipes
/// whatever the previous decision produced.
#[derive(Clone, Debug)]
pub struct BracketEngine {
  flow: FlowGraph,
  seeding: Vec<SeedPlacement>,
  registry: TeamRegistry,
  board: MatchBoard,
  options: EngineOptions,
}

impl BracketEngine {
  pub fn new(
    flow: FlowGraph,
    seeding: &[SeedPlacement],
    registry: TeamRegistry,
    options: EngineOptions,
  ) -> Result<Self, BracketError> {
    validate_seeding(&flow, seeding)?;
    let board = MatchBoard::new(flow.order().iter().map(String::as_str));
    let mut engine = BracketEngine {
      flow,
      seeding: seeding.to_vec(),
      registry,
      board,
      options,
    };
    engine.seed();
    Ok(engine)
  }

  pub fn playoff12(registry: TeamRegistry, options: EngineOptions) -> Result<Self, BracketError> {
    BracketEngine::new(FlowGraph::playoff12()?, &PLAYOFF12_SEEDING, registry, options)
  }

  pub fn board(&self) -> &MatchBoard {
    &self.board
  }

  pub fn flow(&self) -> &FlowGraph {
    &self.flow
  }

  pub fn registry(&self) -> &TeamRegistry {
    &self.registry
  }

  pub fn can_edit(&self) -> bool {
    self.options.can_edit
  }

  /// Drops every decision and returns to the seeded-only board.
  pub fn reset(&mut self) {
    self.board = MatchBoard::new(self.flow.order().iter().map(String::as_str));
    self.seed();
  }

  fn seed(&mut self) {
    seed_initial_teams(&mut self.board, &self.registry, &self.seeding);
  }

  /// Declares `winner` the winner of `match_id` (or clears it with `None`) and
  /// re-derives everything downstream. Returns false, leaving the board as it
  /// was, for an unknown match or a winner slot that holds no team.
  pub fn set_winner(&mut self, match_id: &str, winner: Option<SlotIndex>) -> bool {
    let Some(entry) = self.board.get(match_id) else {
      debug!("Ignoring result for unknown match {match_id}");
      return false;
    };
    if let Some(slot) = winner {
      if entry.slot(slot).is_empty() {
        debug!("Ignoring result for {match_id}: slot {} has no team", slot.number());
        return false;
      }
    }

    self.board.decide(match_id, winner);
    self.invalidate_downstream(match_id);
    if let Some(slot) = winner {
      self.advance(match_id, slot);
    }
    true
  }

  /// Click handler: picks `slot` as winner, or clears the match when `slot`
  /// already won. Empty slots and unknown matches are a no-op.
  pub fn toggle(&mut self, match_id: &str, slot: SlotIndex) -> Result<bool, String> {
    if !self.options.can_edit {
      return Err("Editing is disabled.".to_string());
    }
    let Some(entry) = self.board.get(match_id) else {
      return Ok(false);
    };
    if entry.slot(slot).is_empty() {
      return Ok(false);
    }
    let next = if entry.winner() == Some(slot) { None } else { Some(slot) };
    Ok(self.set_winner(match_id, next))
  }

  /// Replays `results` in bracket order. Matches missing from the map keep
  /// their current state. Returns how many entries were applied.
  pub fn apply_results(&mut self, results: &ResultsMap) -> usize {
    for (match_id, _) in results.iter() {
      if !self.flow.contains(match_id) {
        warn!("Ignoring result for unknown match {match_id}");
      }
    }

    let order = self.flow.order().to_vec();
    let mut applied = 0usize;
    for match_id in &order {
      let Some(winner) = results.get(match_id) else {
        continue;
      };
      if self.set_winner(match_id, winner) {
        applied += 1;
      } else {
        warn!("Result for {match_id} could not be applied; slot has no team");
      }
    }
    applied
  }

  /// Current decisions as a results map; replaying it on a freshly seeded
  /// board reproduces this board.
  pub fn results(&self) -> ResultsMap {
    let mut results = ResultsMap::new();
    for entry in self.board.matches() {
      if let Some(winner) = entry.winner() {
        results.insert(entry.id(), Some(winner));
      }
    }
    results
  }

  /// Empties every slot fed by `root`, transitively. A decided match loses its
  /// decision as soon as either of its slots is emptied.
  fn invalidate_downstream(&mut self, root: &str) {
    let mut pending = vec![root.to_string()];
    while let Some(source) = pending.pop() {
      for (match_id, slot) in self.board.slots_fed_by(&source) {
        self.board.place_team(&match_id, slot, None, SlotOrigin::Empty);
        if self.board.winner(&match_id).is_some() {
          debug!("Clearing {match_id}: slot {} lost its team", slot.number());
          self.board.decide(&match_id, None);
        }
        pending.push(match_id);
      }
    }
  }

  fn advance(&mut self, match_id: &str, winner: SlotIndex) {
    let (winning_team, losing_team) = match self.board.get(match_id) {
      Some(entry) => (
        entry.slot(winner).team().cloned(),
        entry.slot(winner.other()).team().cloned(),
      ),
      None => return,
    };
    self.feed(match_id, Outcome::Win, winning_team);
    self.feed(match_id, Outcome::Lose, losing_team);
  }

  fn feed(&mut self, source: &str, outcome: Outcome, team: Option<Arc<Team>>) {
    let Some(target) = self
      .flow
      .successors(source)
      .and_then(|edge| edge.target(outcome))
      .cloned()
    else {
      return;
    };
    // The slot was emptied by the cascade; a decided target only goes stale if
    // a team actually lands in it.
    if team.is_some() && self.board.winner(&target.match_id).is_some() {
      debug!("Clearing {}: a new team arrives in slot {}", target.match_id, target.slot.number());
      self.board.decide(&target.match_id, None);
      self.invalidate_downstream(&target.match_id);
    }
    self.board.place_team(
      &target.match_id,
      target.slot,
      team,
      SlotOrigin::from_match(source, outcome),
    );
  }
}
