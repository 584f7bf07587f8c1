pub mod action;
pub mod plugin;
pub mod section;
pub mod snapshot;
pub mod widget;

pub use action::{ActionError, ActionRequest, ActionResult};
pub use plugin::{Interpreter, OrderKey, Plugin, PluginId};
pub use section::{ProbeFailure, Section};
pub use snapshot::DashboardSnapshot;
pub use widget::{Widget, WidgetSchemaError};
