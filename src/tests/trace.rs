use super::*;

#[test]
fn logging_macros_accept_fields() {
    let lists = 3;
    trace!("expanding");
    debug!(lists, "tries built");
    info!(found = 7usize, "run finished");
    let _ = lists;
}

#[test]
fn init_subscriber_is_idempotent() {
    init_subscriber();
    init_subscriber();
}
