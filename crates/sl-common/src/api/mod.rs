pub mod match_request;
pub mod match_response;

pub use match_request::{
    FindMatchesRequest, JobLocation, RequestValidationError, UpdateMatchStatusRequest,
};
pub use match_response::{FindMatchesResponse, SuggestedWorker};
