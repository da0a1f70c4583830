//! Compiled patterns for Postfix queue and delivery log lines.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// `postfix/qmgr[123]: ABC123: ...` -> `ABC123`
    pub static ref QUEUE_ID: Regex = Regex::new(r"\]:\s([A-Z0-9]+):").unwrap();

    /// Full delivery record. Groups: 1 local timestamp, 2 queue id, 3 to,
    /// 4 relay, 5 delay, 6 delays, 7 dsn, 8 status word.
    pub static ref DELIVERY_RECORD: Regex = Regex::new(
        r"^([A-Za-z]{3}\s+\d+ [0-9:]{8}) .*? .*?: ([A-Z0-9]+): to=<(.*?)>, relay=(.*?), delay=(.*?), delays=(.*?), dsn=(.*?), status=(.*?) "
    )
    .unwrap();

    pub static ref SENDER: Regex = Regex::new(r"from=<(.*?)>").unwrap();

    // The remote reply sits inside the parenthesised status text; the closing
    // paren belongs to that text, not to the reply.
    pub static ref REMOTE_REPLY: Regex = Regex::new(r"said:(.*?)\)?$").unwrap();
    pub static ref DEFERRED_TEXT: Regex = Regex::new(r"status=deferred \((.*)\)$").unwrap();
    pub static ref BOUNCED_TEXT: Regex = Regex::new(r"status=bounced \((.*)\)$").unwrap();
}

pub const STATUS_DEFERRED: &str = "status=deferred";
pub const STATUS_BOUNCED: &str = "status=bounced";
