//! Onboarding wizards: account sign-up and KYC.
//!
//! A wizard walks the user through a fixed list of steps. Each step is
//! validated before the user may move on; the last step verifies a one-time
//! code sent to the user's phone and then hands the collected fields to a
//! completion handler. Running wizards live in a `WizardRegistry` and are
//! driven either over HTTP (`wizard_routes`) or from the console.

pub mod completion;
pub mod model;
pub mod registry;
pub mod routes;
pub mod state;
pub mod wizard;

pub use completion::{Completion, CompletionHandler, SimulatedCompletion, Submission};
pub use model::{Flow, Page, WizardKind};
pub use registry::{SharedWizard, WizardRegistry, spawn_sweep_task};
pub use routes::{WizardRouteState, wizard_routes};
pub use state::{WizardState, WizardStatus};
pub use wizard::{Advance, FieldView, StepWizard, WizardDeps, WizardView};
