pub use crate::catalog::{ContextCatalogExt, EventCatalog, GenreEvent, TransmissionTable};
pub use crate::context::{Context, SimEvent};
pub use crate::epidemic::{
    compare_strategies, init_epidemic, run_trial, run_trials, simulate_epidemic, EpidemicInputs,
};
pub use crate::error::VaxError;
pub use crate::global_properties::ContextGlobalPropertiesExt;
pub use crate::health::{ContextHealthExt, HealthStatus, HealthStatusChangeEvent};
pub use crate::log::{debug, error, info, trace, warn};
pub use crate::network::ContextNetworkExt;
pub use crate::outcomes::{ContextOutcomesExt, DailyTally, MeanTally};
pub use crate::parameters::{Parameters, ParametersValues};
pub use crate::people::{ContextPeopleExt, PersonId, Preferences};
pub use crate::random::ContextRandomExt;
pub use crate::report::ContextReportExt;
pub use crate::transmission::{ContextTransmissionExt, TransmissionEvent};
pub use crate::vaccination::{select_candidates, ContextVaccinationExt, VaccinationStrategy};
pub use crate::{create_report_trait, define_data_plugin, define_global_property, define_rng};
