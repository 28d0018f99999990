#[path = "../fixtures/mod.rs"]
mod fixtures;

// The number indicates the preferred running order for these cases.

mod t10_elect;
mod t11_higher_term;
mod t20_replication_retry;
mod t30_join;
mod t31_leave;
mod t40_close;
