//! Object states
//!
//! States are computed asynchronously from state requests. Any decision that
//! mutates an object must take the object's state-request lock, then read the
//! states, then act:
//!
//! ```text
//! LockObjectStateRequestLock → GetObjectStates → ObjectStatesInfo → decide
//! ```

pub mod error;
pub mod info;
pub mod request;
pub mod state;

pub use error::ObjectStateError;
pub use info::ObjectStatesInfo;
pub use request::{
    CreateObjectStateRequestId, GetObjectStates, LockObjectStateRequestLock, ObjectStateRow,
    PerformObjectStateRequest, get_locked_object_states,
};
pub use state::ObjectState;
