pub mod box_select;
pub mod events;
pub mod graph;
pub mod input;
pub mod interaction;
pub mod sync;

pub use box_select::BoxSelectController;
pub use events::{GraphEvent, Target};
pub use graph::{NetworkGraph, NetworkGraphBuilder};
pub use input::{InputEvent, Modifiers, PointerButton};
pub use interaction::{Cursor, InteractionController, PickContext, Reaction};
pub use sync::{GraphMutation, SyncEngine};
