mod allowed_hosts;
mod chart_data;
pub mod helper;
mod records;
