//! reconx-actions
//!
//! The post-match action dispatcher (C7): outcome categorization, the
//! default action policy with the escalation additive, the eight action
//! handlers (HTTP, notification-style, storage-backed, and the
//! ticket+email escalation composite), and the dispatcher that executes
//! a match's action list against the audit trail with retries for
//! critical actions.

pub mod dispatcher;
pub mod escalate_handler;
pub mod handlers;
pub mod http_handler;
pub mod notification_handler;
pub mod outcome;
pub mod storage_handler;

pub use dispatcher::{ActionDispatcher, ActionResult, IntegrationConfig};
pub use handlers::{ActionContext, ActionHandler, HandlerOutcome};
pub use outcome::{categorize, compute_action_list, default_actions};
