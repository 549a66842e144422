// newstopic: topic prediction for news headlines
//
// This is the library root. Each module corresponds to one stage of the
// prediction pipeline or to the plumbing around it.

pub mod artifacts;
pub mod cluster;
pub mod config;
pub mod encoder;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod reduction;
pub mod topics;
