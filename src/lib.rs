#![doc = include_str!("../README.md")]
// No warnings
//#![deny(warnings)]
// for now we don't need any new feature but we might remove this in the future
#![deny(unstable_features)]
// no dead code
//#![deny(dead_code)]
#![deny(trivial_casts)]
#![deny(unconditional_recursion)]
#![deny(clippy::empty_loop)]
#![deny(unreachable_code)]
#![deny(unreachable_pub)]
#![deny(unreachable_patterns)]
#![deny(unused_macro_rules)]
//#![deny(unused_results)]

// the code must be documented and everything should have a debug print implementation
#![deny(unused_doc_comments)]
//#![deny(missing_docs)]
//#![deny(clippy::missing_docs_in_private_items)]
//#![deny(clippy::missing_errors_doc)]
//#![deny(clippy::missing_panics_doc)]
//#![deny(clippy::missing_safety_doc)]
//#![deny(clippy::missing_doc_code_examples)]
//#![deny(clippy::missing_crate_level_docs)]
//#![deny(missing_debug_implementations)]

pub mod collision;
pub mod config;
pub mod driver;
pub mod equilibration;
pub mod error;
pub mod events;
pub mod geometry;
pub mod heap;
pub mod io;
pub mod neighbors;
pub mod particle;
pub mod processors;
pub mod providers;
pub mod scheduler;
pub mod state;
pub mod strategies;
pub mod utils;
pub mod velocity;
pub mod voronoi;

/// Prelude module to import everything from this crate
pub mod prelude {
    pub use crate::collision::*;
    pub use crate::config::*;
    pub use crate::driver::*;
    pub use crate::equilibration::*;
    pub use crate::error::*;
    pub use crate::events::*;
    pub use crate::geometry::*;
    pub use crate::heap::*;
    pub use crate::io::*;
    pub use crate::neighbors::*;
    pub use crate::particle::*;
    pub use crate::processors::*;
    pub use crate::providers::*;
    pub use crate::scheduler::*;
    pub use crate::strategies::*;
    pub use crate::velocity::*;
    pub use crate::voronoi::*;
}
