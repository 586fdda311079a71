// Domain layer - Alert data and Suricata event mapping
pub mod alert;
pub mod dashboard;
pub mod eve;
