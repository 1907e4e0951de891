// Testable property: port-based pid lookup finds the process bound to a
// listening socket, and finds nothing on a port nobody is listening on.

use std::net::TcpListener;

use launchdeck::supervisor::port::pids_listening_on;

#[test]
fn finds_own_process_on_bound_port() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let pids = pids_listening_on(port);
    assert!(pids.contains(&(std::process::id() as i32)), "{pids:?}");

    drop(listener);
}

#[test]
fn finds_nothing_on_an_unbound_port() {
    // Bind then immediately drop to get a port very unlikely to be in use,
    // then check nobody is listening on it anymore.
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let pids = pids_listening_on(port);
    assert!(pids.is_empty());
}
