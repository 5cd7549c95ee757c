use thiserror::Error;

/// Errors raised while building a bracket layout or loading its input document.
///
/// Board operations never produce these; they ignore bad input instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BracketError {
  #[error("Match '{0}' is listed more than once in the bracket order")]
  DuplicateMatch(String),

  #[error("Flow edge references match '{missing}' (from '{source_match}'), which is not in the bracket order")]
  UnknownMatch { missing: String, source_match: String },

  #[error("Match '{source_match}' feeds '{target}', which does not come after it in the bracket order")]
  BackEdge { source_match: String, target: String },

  #[error("Slot {slot} of match '{match_id}' is fed by more than one source")]
  SlotConflict { match_id: String, slot: u8 },

  #[error("Seed {seed} is placed into slot {slot} of '{match_id}': {message}")]
  InvalidSeeding {
    seed: u32,
    match_id: String,
    slot: u8,
    message: String,
  },

  #[error("read {path}: {message}")]
  Read { path: String, message: String },

  #[error("fetch {url}: {message}")]
  Fetch { url: String, message: String },

  #[error("parse {source_label}: {message}")]
  Parse { source_label: String, message: String },
}
