//! Integration test modules

mod test_utils;

mod cli_route;
mod pipeline_e2e;
mod provider_http;
