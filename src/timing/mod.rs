pub mod jst_datetime_now;
pub mod time_label;
