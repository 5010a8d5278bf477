use lazy_static::lazy_static;
use regex::Regex;

pub const DEFAULT_CURRENCY: &str = "ZAR";
pub const DEFAULT_COMMISSION_RATE: u32 = 8;
pub const WEBHOOK_SIGNATURE_TOLERANCE_SECS: i64 = 300;
pub const USER_ID_HEADER: &str = "x-user-id";
pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const DEVICE_ID_HEADER: &str = "x-device-id";

lazy_static! {
    pub static ref TIME_SLOT_PATTERN: Regex =
        Regex::new(r"^([01][0-9]|2[0-3]):[0-5][0-9]$").expect("Failed to compile regex pattern");
}
