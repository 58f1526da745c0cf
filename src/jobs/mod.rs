//! Background Jobs Module
//!
//! Jobs scheduled and executed by the job scheduler service. Each run is
//! recorded in the `job_runs` table with its item counts and duration.
//!
//! # Available Jobs
//!
//! - `price_refresh_job` - Pulls fresh quotes for every held asset and updates cached prices

pub mod price_refresh_job;
