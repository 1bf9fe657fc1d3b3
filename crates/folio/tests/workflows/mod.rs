use super::*;

mod batch;
mod ingest;
