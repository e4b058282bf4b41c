use std::sync::Arc;

use renderflow_registry::WorkflowModule;

mod channel_report;
mod greeting;
mod series_summary;

pub use channel_report::ChannelReport;
pub use greeting::Greeting;
pub use series_summary::SeriesSummary;

/// Every workflow module of the provider, in no particular order.
pub fn all() -> Vec<Arc<dyn WorkflowModule>> {
    vec![Arc::new(SeriesSummary), Arc::new(Greeting), Arc::new(ChannelReport)]
}
