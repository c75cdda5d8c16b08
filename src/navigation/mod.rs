//! Shell navigation: the target/tab/breadcrumb state machine and the
//! prioritized back-button chain.

mod back;
mod effects;
mod fault;
mod shell;

pub use back::{back_priority, shell_back_handler, BackDispatcher, BackHandlerGuard, BackOutcome};
pub use effects::NavEffects;
pub use fault::NavigationFault;
pub use shell::{Breadcrumb, NavigationState, ShellNavigator};
