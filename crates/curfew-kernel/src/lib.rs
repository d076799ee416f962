//! # curfew-kernel: Functional core of `curfew`
//!
//! The kernel receives commands and produces state changes plus effects to
//! execute. It never touches disk or clocks; it only drives the
//! confidential engine, whose operations are synchronous compute.
//!
//! ## Architecture
//!
//! - [`command`]: Commands (`AssignRole`, `SetSchedule`, `ClearSchedule`, `QueryDecision`)
//! - [`effects`]: Effects for the runtime to execute (`SlotWrite`, `AuditLogAppend`)
//! - [`state`]: Roles and per-(party, weekday) schedule handles
//! - [`authorize`]: Role checks run before any mutation
//! - [`calendar`]: UTC timestamp to (weekday, hour)
//! - [`evaluator`]: Constant-shape homomorphic intersection
//! - [`disclosure`]: The single path that makes a value public
//! - [`kernel`]: The `apply_committed` function that ties it all together
//!
//! ## Example
//!
//! ```ignore
//! use curfew_kernel::{Command, State, apply_committed};
//!
//! let state = State::new(policy_id, owner);
//! let cmd = Command::query_decision(requester, timestamp);
//!
//! match apply_committed(state, cmd, &mut engine, &verifier) {
//!     Ok((new_state, effects)) => {
//!         // Execute effects via runtime...
//!     }
//!     Err(e) => {
//!         // Handle error...
//!     }
//! }
//! ```

pub mod authorize;
pub mod calendar;
pub mod command;
pub mod disclosure;
pub mod effects;
pub mod evaluator;
pub mod kernel;
pub mod state;
pub mod state_hash;


pub use authorize::{Role, RoleAssignments, authorize};
pub use command::Command;
pub use effects::Effect;
pub use kernel::{KernelError, apply_committed, parse_day};
pub use state::{DayHandles, State};
