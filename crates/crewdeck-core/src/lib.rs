#![forbid(unsafe_code)]
//! crewdeck-core library.
//!
//! Shared state and the consistency cascade for the Crewdeck work tracker:
//! a single-writer entity store ([`store`]), the mutation path that keeps
//! it consistent ([`coordinator`]), point-in-time views ([`snapshot`]), a
//! payload-free refresh channel ([`signal`]), and the backend seam
//! ([`persist`]).
//!
//! Conventions: fallible config loading uses `anyhow::Result`; domain
//! failures use the typed errors in [`error`]; logging goes through
//! `tracing` macros.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod model;
pub mod persist;
pub mod signal;
pub mod snapshot;
pub mod store;

pub use config::{AppConfig, load_app_config, load_user_config, resolve_config};
pub use coordinator::{Cascade, Coordinator, HydrateReport, Liveness, Outcome, Receipt};
pub use error::{ErrorCode, MutationError, TransportError};
pub use model::{
    Department, DepartmentDraft, DepartmentId, EntityKind, MemberDraft, MemberId, Priority,
    Project, ProjectDraft, ProjectId, ProjectStatus, Role, RoleDraft, RoleId, Tags, Task,
    TaskDraft, TaskId, TaskStats, TaskStatus, TeamMember,
};
pub use persist::{LogNotices, MemoryBackend, NoticeSink, Persistence, SilentNotices};
pub use signal::{RefreshBus, Subscription};
pub use snapshot::{Snapshot, UNKNOWN_LABEL};
pub use store::{EntityStore, StoreHandle};
