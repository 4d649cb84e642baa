//! faultline-report: the render half of the pipeline.
//!
//! - Store: YAML template registry with namespacing, versions, and a
//!   cycle-checked dependency graph
//! - Cache: two-level (resolved / compiled) TTL cache with dependents
//!   invalidation
//! - Render: inheritance-resolving resolver, minijinja compiler, pure
//!   renderer with a built-in general fallback
//! - Watch: debounced change intake driving template reloads
//! - Engine: the owned facade exposing the external call contracts

pub mod cache;
pub mod engine;
pub mod render;
pub mod store;
pub mod watch;

pub use cache::TemplateCache;
pub use engine::Engine;
pub use render::{compile, describe_error_code, resolve, CompiledReport, ResolvedTemplate};
pub use store::{Template, TemplateMeta, TemplateStore, TemplateSummary};
pub use watch::{spawn_reload_loop, ChangeEvent, ChangeKind, Debouncer};
