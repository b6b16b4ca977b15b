pub mod calendar;
pub mod dataset;
pub mod record;

pub use calendar::{CalendarEntry, CalendarVariant, FixedDateCalendar};
pub use dataset::Dataset;
pub use record::{TemperatureField, TemperatureRecord};
