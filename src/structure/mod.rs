// Structure Editing Module
// Constraint lifecycle, naming and the command queue that commits edits

pub mod command;
pub mod dialect;
pub mod manager;
pub mod naming;
pub mod workflow;

pub use command::{
    CommandAction, CommandContext, CommandExecutor, CommandId, CommitFailure,
    CommitReport, StructureCommand,
};
pub use dialect::DialectProfile;
pub use manager::{ConstraintManager, CreateOutcome, ForeignKeyDraft, PopulateOutcome};
pub use naming::ConstraintNamer;
pub use workflow::{
    ColumnPair, EditOutcome, EditPrototype, EditRequest, EditWorkflow, ForeignKeyDescriptor,
};
