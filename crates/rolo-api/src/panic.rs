//! Handler for `GET /panic`.
//!
//! Always panics. Exists so the server's panic recovery can be observed
//! end to end.

pub async fn handler() {
  panic!("panic argument");
}
