pub mod config;
pub mod finding;
pub mod pattern;
pub mod rewrite;
pub mod rule;
pub mod rules;
pub mod runner;
pub mod source;
pub mod testutil;
pub mod tree;

pub use config::{RuleConfig, Settings};
pub use finding::{Finding, Location, Severity};
pub use pattern::{CaptureSet, Pattern, PatternError};
pub use rewrite::{Edit, EditSet, OverlappingEditsError};
pub use rule::registry::RuleRegistry;
pub use rule::{Rule, RuleContext};
pub use runner::{UnitOutcome, analyze, check_unit, check_units, correct};
pub use source::SourceBuffer;
pub use tree::render::{RenderError, render_text};
pub use tree::{NodeId, ParseError, Parser, SourceRange, Tag, Tree, TreeBuilder, Value};
