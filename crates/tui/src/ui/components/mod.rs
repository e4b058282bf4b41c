pub mod component;
pub mod export;
pub mod hint_bar;
pub mod params;
pub mod progress;
pub mod results;
pub mod workflows;

pub use export::ExportComponent;
pub use hint_bar::HintBarComponent;
pub use params::{FormTarget, ParamsComponent};
pub use progress::ProgressComponent;
pub use results::ResultsComponent;
pub use workflows::WorkflowsComponent;
