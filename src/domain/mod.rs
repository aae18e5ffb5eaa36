pub mod buffer;
pub mod forecast;
pub mod sample;

pub use buffer::SampleBuffer;
pub use forecast::{format_duration, Forecast, Outlook};
pub use sample::Sample;
