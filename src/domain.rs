//! Domain module - NPC records and the harvest database
//!
//! Each module is its own file in the domain/ directory; public exports are
//! defined here for convenience.

pub mod npc;
pub mod npc_database;

pub use npc::NpcRecord;
pub use npc_database::NpcDatabase;
