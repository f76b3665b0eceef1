mod cache;
mod credentials;
mod pipeline;
mod rate_gate;
mod upstream;

pub use cache::ResponseCache;
pub use credentials::select_credential;
pub use pipeline::RequestPipeline;
pub use rate_gate::RateGate;
pub use upstream::UpstreamClient;
