//! The two webhook endpoints. Each request gets a fresh correlation id that
//! follows it through every log line and into the error response log.

pub mod inbound;
pub mod outbound;

use uuid::Uuid;

fn correlation_id() -> String {
    Uuid::new_v4().to_string()
}
